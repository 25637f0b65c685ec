mod json;
mod query;
mod restxml;

mod retry;
mod stages;

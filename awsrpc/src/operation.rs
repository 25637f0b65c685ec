use http::Method;
use std::collections::BTreeMap;

/// Where a parameter member is placed in the outgoing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// An HTTP header with the given name.
    Header(String),
    /// A `{name}` or `{name+}` placeholder in the path template.
    Uri(String),
    /// A query string parameter with the given name.
    Querystring(String),
}

/// How the payload member becomes the request body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    /// Raw bytes, serialized as base64 by [`crate::protocol::blob`].
    Blob,
    /// A string used as the body verbatim.
    String,
    /// A structure serialized as XML.
    Structure,
}

/// The member that forms the request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    /// Serialized name of the member.
    pub member: String,
    /// Kind of the member.
    pub kind: PayloadKind,
}

/// Static description of one API operation.
///
/// Members are referred to by their serialized (serde) names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationDescriptor {
    /// Operation name, for example `ListUsers`.
    pub name: String,
    /// HTTP method, `POST` unless set.
    pub http_method: Method,
    /// Path template, may carry `{name}` placeholders and a literal query.
    pub http_path: String,
    /// Wire location of members placed outside the body.
    pub locations: BTreeMap<String, Location>,
    /// Payload member, if the body is formed by a single member.
    pub payload: Option<Payload>,
}

impl OperationDescriptor {
    /// Create a descriptor with method `POST` and path `/`.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            http_method: Method::POST,
            http_path: "/".to_string(),
            locations: BTreeMap::new(),
            payload: None,
        }
    }

    /// Set the HTTP method.
    pub fn with_method(mut self, method: Method) -> Self {
        self.http_method = method;
        self
    }

    /// Set the path template. An empty template means `/`.
    pub fn with_path(mut self, path: &str) -> Self {
        self.http_path = if path.is_empty() {
            "/".to_string()
        } else {
            path.to_string()
        };
        self
    }

    /// Place `member` at `location`.
    pub fn with_location(mut self, member: &str, location: Location) -> Self {
        self.locations.insert(member.to_string(), location);
        self
    }

    /// Use `member` as the request body.
    pub fn with_payload(mut self, member: &str, kind: PayloadKind) -> Self {
        self.payload = Some(Payload {
            member: member.to_string(),
            kind,
        });
        self
    }

    /// Split the path template into its path and literal query parts.
    pub(crate) fn split_path(&self) -> (&str, &str) {
        match self.http_path.split_once('?') {
            Some((path, query)) => (path, query),
            None => (self.http_path.as_str(), ""),
        }
    }
}

use crate::Result;
use bytes::Bytes;
use std::fmt;
use std::io::Read;

/// Body of an outgoing request.
///
/// A body is either fully buffered bytes or a single-read stream. Signing
/// needs the payload hash, so streams are read once through [`Body::buffer`]
/// and replaced by the bytes they produced; the transport then observes the
/// same full payload.
#[derive(Default)]
pub enum Body {
    /// Buffered bytes, possibly empty.
    #[default]
    Empty,
    /// Buffered bytes.
    Bytes(Bytes),
    /// A single-read stream that has not been consumed yet.
    Reader(Box<dyn Read + Send + Sync>),
}

impl Body {
    /// Create an empty body.
    pub fn empty() -> Self {
        Body::Empty
    }

    /// Create a body from a single-read stream.
    pub fn from_reader(r: impl Read + Send + Sync + 'static) -> Self {
        Body::Reader(Box::new(r))
    }

    /// Returns true when the body is known to hold no bytes.
    ///
    /// Unread streams are never reported as empty.
    pub fn is_empty(&self) -> bool {
        match self {
            Body::Empty => true,
            Body::Bytes(bs) => bs.is_empty(),
            Body::Reader(_) => false,
        }
    }

    /// Length of the buffered content, `None` for an unread stream.
    pub fn len(&self) -> Option<usize> {
        match self {
            Body::Empty => Some(0),
            Body::Bytes(bs) => Some(bs.len()),
            Body::Reader(_) => None,
        }
    }

    /// Buffer the body and return its bytes.
    ///
    /// A stream is read to the end and replaced by the resulting bytes, so
    /// calling this repeatedly never reads the stream twice. Read failures
    /// are returned as errors and leave the body empty.
    pub fn buffer(&mut self) -> Result<Bytes> {
        match self {
            Body::Empty => Ok(Bytes::new()),
            Body::Bytes(bs) => Ok(bs.clone()),
            Body::Reader(r) => {
                let mut buf = Vec::new();
                if let Err(err) = r.read_to_end(&mut buf) {
                    *self = Body::Empty;
                    return Err(err.into());
                }
                let bs = Bytes::from(buf);
                *self = Body::Bytes(bs.clone());
                Ok(bs)
            }
        }
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Body::Empty => f.write_str("Body::Empty"),
            Body::Bytes(bs) => write!(f, "Body::Bytes({} bytes)", bs.len()),
            Body::Reader(_) => f.write_str("Body::Reader"),
        }
    }
}

impl From<Bytes> for Body {
    fn from(bs: Bytes) -> Self {
        Body::Bytes(bs)
    }
}

impl From<Vec<u8>> for Body {
    fn from(bs: Vec<u8>) -> Self {
        Body::Bytes(Bytes::from(bs))
    }
}

impl From<String> for Body {
    fn from(s: String) -> Self {
        Body::Bytes(Bytes::from(s))
    }
}

impl From<&'static str> for Body {
    fn from(s: &'static str) -> Self {
        Body::Bytes(Bytes::from_static(s.as_bytes()))
    }
}

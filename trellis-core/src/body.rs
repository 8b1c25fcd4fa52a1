//! Request and response body representation.
//!
//! A [`Body`] is either empty, a fully buffered byte chunk, or a stream of
//! chunks. The streaming shape is what lets both adapters forward large
//! responses without buffering them; the buffered shape is what handler
//! return values convert into.

use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use futures::stream::{self, BoxStream, Stream};
use sync_wrapper::SyncWrapper;

use crate::error::BoxError;

/// A boxed stream of byte chunks, the streaming body shape.
pub type ByteStream = BoxStream<'static, Result<Bytes, BoxError>>;

/// A request or response payload.
///
/// The stream variant is wrapped so the body (and anything carrying it) is
/// `Sync` even though boxed streams are not; the wrapper is unwrapped at the
/// single point of consumption.
#[derive(Default)]
pub enum Body {
    /// No payload.
    #[default]
    Empty,
    /// A fully buffered payload.
    Full(Bytes),
    /// A lazily produced sequence of chunks.
    Stream(SyncWrapper<ByteStream>),
}

impl Body {
    /// Wrap an arbitrary chunk stream.
    pub fn stream<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<Bytes, BoxError>> + Send + 'static,
    {
        Self::Stream(SyncWrapper::new(stream.boxed()))
    }

    /// Build a streaming body from an iterator of ready chunks.
    pub fn from_chunks<I>(chunks: I) -> Self
    where
        I: IntoIterator<Item = Bytes>,
        I::IntoIter: Send + 'static,
    {
        Self::stream(stream::iter(chunks.into_iter().map(Ok)))
    }

    /// Whether the body is known to carry no bytes.
    ///
    /// A streaming body reports `false`: its length is unknown until drained.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Full(bytes) => bytes.is_empty(),
            Self::Stream(_) => false,
        }
    }

    /// Unwrap a streaming body into its chunk stream, or `None` for the
    /// buffered shapes.
    pub fn into_stream(self) -> Option<ByteStream> {
        match self {
            Self::Stream(stream) => Some(stream.into_inner()),
            _ => None,
        }
    }

    /// Drain the body into a single buffer.
    pub async fn collect(self) -> Result<Bytes, BoxError> {
        match self {
            Self::Empty => Ok(Bytes::new()),
            Self::Full(bytes) => Ok(bytes),
            Self::Stream(stream) => {
                let mut stream = stream.into_inner();
                let mut buffer = BytesMut::new();
                while let Some(chunk) = stream.next().await {
                    buffer.extend_from_slice(&chunk?);
                }
                Ok(buffer.freeze())
            }
        }
    }
}

impl std::fmt::Debug for Body {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => f.write_str("Body::Empty"),
            Self::Full(bytes) => write!(f, "Body::Full({} bytes)", bytes.len()),
            Self::Stream(_) => f.write_str("Body::Stream"),
        }
    }
}

impl From<Bytes> for Body {
    fn from(bytes: Bytes) -> Self {
        if bytes.is_empty() {
            Self::Empty
        } else {
            Self::Full(bytes)
        }
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Bytes::from(bytes).into()
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Bytes::from(text).into()
    }
}

impl From<&'static str> for Body {
    fn from(text: &'static str) -> Self {
        Bytes::from_static(text.as_bytes()).into()
    }
}

use crate::TransportError;

use terrain_tiles_storage::{Payload, PayloadKind};

use auto_impl::auto_impl;
use futures::future::BoxFuture;

/// How a fetch settled.
#[derive(Clone, Debug)]
pub enum Response {
    Ready(Payload),
    Error(TransportError),
    /// The request was cancelled before it produced a payload. Nothing should be cached for it.
    Abort,
}

impl Response {
    #[inline]
    pub fn is_ready(&self) -> bool {
        matches!(self, Response::Ready(_))
    }

    #[inline]
    pub fn is_abort(&self) -> bool {
        matches!(self, Response::Abort)
    }
}

/// The primitive that actually talks to the network (or disk, or a test script).
///
/// Implementations report failures as `Response::Error` rather than panicking. The returned future must not borrow from
/// `self` so it can be spawned.
#[auto_impl(&, Box, Arc)]
pub trait Transport: Send + Sync {
    fn fetch(&self, url: &str, kind: PayloadKind) -> BoxFuture<'static, Response>;
}

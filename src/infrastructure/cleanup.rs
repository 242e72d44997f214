//! Teardown closures returned by the store initializers.

use std::fmt;
use std::future::Future;

use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::{Instrument, Span};

use crate::error::DataError;

/// Releases the resources behind a handle.
///
/// Consuming `run` means the close operation is invoked at most once. Close
/// errors are logged at error level inside the cleanup span and never
/// returned: shutdown keeps going regardless.
pub struct Cleanup {
    span: Span,
    close: Box<dyn FnOnce() -> BoxFuture<'static, Result<(), DataError>> + Send>,
}

impl Cleanup {
    /// Build a cleanup that logs under `parent` with `op = "cleanup"`.
    pub fn new<F, Fut>(parent: &Span, close: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), DataError>> + Send + 'static,
    {
        Self {
            span: tracing::info_span!(parent: parent, "cleanup", op = "cleanup"),
            close: Box::new(move || close().boxed()),
        }
    }

    pub async fn run(self) {
        let Cleanup { span, close } = self;
        async move {
            tracing::info!("starting");
            if let Err(e) = close().await {
                tracing::error!(error = %e, "close failed");
            }
        }
        .instrument(span)
        .await
    }
}

impl fmt::Debug for Cleanup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cleanup").finish_non_exhaustive()
    }
}

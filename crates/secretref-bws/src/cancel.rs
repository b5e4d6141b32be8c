use crate::error::{Error, Result};
use std::future::Future;
use tokio_util::sync::CancellationToken;

/// Run a network-bound step unless the caller has cancelled
///
/// The token is checked before the step starts and raced against it while it
/// runs, so a cancelled caller never waits on the backend.
pub(crate) async fn run_cancellable<T, F>(cancel: &CancellationToken, step: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }

    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Error::Cancelled),
        result = step => result,
    }
}

//! Isolated handler invocation: each call runs in its own task so a panic
//! or a timeout never takes the session down with it.

use std::any::Any;
use std::time::Duration;

use crate::handler::{BoxFuture, HandlerResult};

/// Why a handler did not produce a value.
#[derive(Debug, thiserror::Error)]
pub enum InvokeError {
    #[error("{0:#}")]
    Failed(anyhow::Error),

    #[error("handler panicked: {0}")]
    Panicked(String),

    #[error("handler timed out after {}ms", .0.as_millis())]
    TimedOut(Duration),

    #[error("handler was cancelled")]
    Cancelled,
}

/// Run a handler future to completion on a fresh task.
///
/// With a timeout, the task is aborted on expiry; cancellation takes effect
/// at the handler's next await point.
pub async fn run_handler<T>(
    future: BoxFuture<HandlerResult<T>>,
    timeout: Option<Duration>,
) -> Result<T, InvokeError>
where
    T: Send + 'static,
{
    let mut handle = tokio::spawn(future);

    let joined = match timeout {
        Some(limit) => match tokio::time::timeout(limit, &mut handle).await {
            Ok(joined) => joined,
            Err(_) => {
                handle.abort();
                return Err(InvokeError::TimedOut(limit));
            }
        },
        None => handle.await,
    };

    match joined {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(InvokeError::Failed(e)),
        Err(e) if e.is_panic() => Err(InvokeError::Panicked(panic_message(e.into_panic()))),
        Err(_) => Err(InvokeError::Cancelled),
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

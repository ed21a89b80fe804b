//! Handle returned by [`CommandEngine::queue`](super::CommandEngine::queue).

use crate::command::CommandKey;
use crate::error::{CommandError, CommandResult};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::task::JoinHandle;

/// A command running on the async runtime.
///
/// Awaiting it suspends only the awaiting caller. Dropping it does not stop
/// the command; once started, primary and fallback run to completion.
#[derive(Debug)]
pub struct QueuedCommand<T> {
    command_key: CommandKey,
    join: JoinHandle<CommandResult<T>>,
}

impl<T> QueuedCommand<T> {
    pub(crate) fn new(command_key: CommandKey, join: JoinHandle<CommandResult<T>>) -> Self {
        Self { command_key, join }
    }

    pub fn command_key(&self) -> &CommandKey {
        &self.command_key
    }

    /// Whether the outcome is ready, without waiting for it
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }
}

impl<T> Future for QueuedCommand<T> {
    type Output = CommandResult<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.join).poll(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(join_error)) => {
                let reason = if join_error.is_cancelled() {
                    "task cancelled".to_string()
                } else {
                    format!("task failed: {join_error}")
                };
                Poll::Ready(Err(CommandError::Interrupted {
                    command_key: self.command_key.clone(),
                    reason,
                }))
            }
        }
    }
}

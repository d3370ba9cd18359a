use anyhow::{Context, Result};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// A running, cancelable series of timed narrations (e.g. a checklist walkthrough).
///
/// The narration service cancels it when any other narration starts; owners
/// cancel it when the user navigates away.
pub struct NarrationSequence {
    token: CancellationToken,
    handle: JoinHandle<()>,
    len: usize,
}

impl NarrationSequence {
    pub(super) fn new(token: CancellationToken, handle: JoinHandle<()>, len: usize) -> Self {
        Self { token, handle, len }
    }

    /// Number of items scheduled.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits until the last item was handed to the synthesizer or the sequence was canceled.
    pub async fn finished(self) -> Result<()> {
        self.handle
            .await
            .context("narration sequence task failed to join")
    }
}

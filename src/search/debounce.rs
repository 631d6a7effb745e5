//! Debouncing over a `tokio::sync::watch` channel.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Quiet period used by the member picker.
pub const DEFAULT_WINDOW: Duration = Duration::from_millis(300);

/// The delayed side of a debounced value.
///
/// Updates only after the input has stayed unchanged for the whole window.
/// Dropping it cancels any pending update.
pub struct Debounced<T> {
    output: watch::Receiver<T>,
    task: JoinHandle<()>,
}

impl<T> Debounced<T> {
    /// Wait for the next settled value. Errors once the input side is gone.
    pub async fn changed(&mut self) -> Result<(), watch::error::RecvError> {
        self.output.changed().await
    }

    #[cfg(test)]
    fn borrow(&self) -> watch::Ref<'_, T> {
        self.output.borrow()
    }

    pub fn borrow_and_update(&mut self) -> watch::Ref<'_, T> {
        self.output.borrow_and_update()
    }
}

impl<T> Drop for Debounced<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Debounce `input` by `window`.
///
/// The output starts at the input's current value. Every change restarts the
/// window; a value is forwarded once no further change arrives in time.
pub fn debounce<T>(mut input: watch::Receiver<T>, window: Duration) -> Debounced<T>
where
    T: Clone + Send + Sync + 'static,
{
    let initial = input.borrow_and_update().clone();
    let (tx, output) = watch::channel(initial);

    let task = tokio::spawn(async move {
        while input.changed().await.is_ok() {
            loop {
                match tokio::time::timeout(window, input.changed()).await {
                    Ok(Ok(())) => continue,
                    Ok(Err(_)) => return,
                    Err(_) => break,
                }
            }

            let settled = input.borrow_and_update().clone();
            if tx.send(settled).is_err() {
                return;
            }
        }
    });

    Debounced { output, task }
}

use futures::prelude::*;
use kube::runtime::watcher;
use std::pin::Pin;
use tokio::time;
use tracing::info;

/// Wraps a watch event stream that never terminates.
pub struct Watch<T> {
    rx: Pin<Box<dyn Stream<Item = Result<watcher::Event<T>, watcher::Error>> + Send + 'static>>,
}

// === impl Watch ===

impl<T, W> From<W> for Watch<T>
where
    W: Stream<Item = Result<watcher::Event<T>, watcher::Error>> + Send + 'static,
{
    fn from(watch: W) -> Self {
        Watch { rx: watch.boxed() }
    }
}

impl<T> Watch<T> {
    /// Receive the next event in the stream.
    ///
    /// If the stream fails, log the error and sleep for 1s before polling for a reset event.
    pub async fn recv(&mut self) -> watcher::Event<T> {
        loop {
            match self
                .rx
                .next()
                .await
                .expect("watch stream must not terminate")
            {
                Ok(ev) => return ev,
                Err(error) => {
                    info!(%error, "Disconnected");
                    time::sleep(time::Duration::from_secs(1)).await;
                }
            }
        }
    }
}

use std::time::Duration;
use tokio::sync::watch;

/// Cooperative cancellation shared by the runner and every instruction.
/// Instructions check it between poll iterations; the runner trips it on
/// Ctrl-C.
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

#[derive(Debug)]
pub struct CancelSource {
    tx: watch::Sender<bool>,
}

pub fn channel() -> (CancelSource, CancelToken) {
    let (tx, rx) = watch::channel(false);
    (CancelSource { tx }, CancelToken { rx })
}

impl CancelSource {
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

impl CancelToken {
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancellation is requested. Pends forever if the
    /// source is dropped without cancelling, so it is safe to race
    /// against a sleep in `select!`.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        loop {
            if *rx.borrow() {
                return;
            }
            if rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }

    /// Sleeps for `dur`, returning true if cancellation arrived first.
    pub async fn sleep(&self, dur: Duration) -> bool {
        tokio::select! {
            _ = tokio::time::sleep(dur) => false,
            _ = self.cancelled() => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sleep_returns_false_when_not_cancelled() {
        let (_src, token) = channel();
        assert!(!token.sleep(Duration::from_millis(1)).await);
    }

    #[tokio::test]
    async fn sleep_is_interrupted_by_cancel() {
        let (src, token) = channel();
        src.cancel();
        assert!(token.sleep(Duration::from_secs(60)).await);
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn dropped_source_does_not_spuriously_cancel() {
        let (src, token) = channel();
        drop(src);
        assert!(!token.sleep(Duration::from_millis(1)).await);
    }
}

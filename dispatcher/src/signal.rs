//! Shutdown signal handling.
//!
//! [`Shutdown`] turns SIGTERM/SIGINT (Ctrl+C on Windows) into a
//! [`CancellationToken`] so the dispatcher can stop bootstrapping or serving
//! from one place.

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

/// Cancels a token on the first shutdown signal.
#[derive(Debug)]
pub struct Shutdown {
    listener: TaskTracker,
    token: CancellationToken,
}

impl Shutdown {
    /// Registers the signal handlers and spawns the listener task.
    ///
    /// # Errors
    ///
    /// Returns an [`std::io::Error`] if signal registration fails.
    #[allow(clippy::unnecessary_wraps)]
    pub fn listen() -> Result<Self, std::io::Error> {
        let token = CancellationToken::new();
        let listener = TaskTracker::new();

        #[cfg(unix)]
        {
            let mut sigterm = signal(SignalKind::terminate())?;
            let mut sigint = signal(SignalKind::interrupt())?;
            let token = token.clone();
            listener.spawn(async move {
                let name = tokio::select! {
                    _ = sigterm.recv() => "SIGTERM",
                    _ = sigint.recv() => "SIGINT",
                    () = token.cancelled() => return,
                };
                tracing::info!("received {name}, shutting down");
                token.cancel();
            });
        }

        #[cfg(windows)]
        {
            let token = token.clone();
            listener.spawn(async move {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {
                        tracing::info!("received Ctrl+C, shutting down");
                        token.cancel();
                    }
                    () = token.cancelled() => {}
                }
            });
        }

        listener.close();
        Ok(Self { listener, token })
    }

    /// Token cancelled once a shutdown signal arrives.
    #[must_use]
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Waits for a shutdown signal and for the listener task to finish.
    pub async fn wait(&self) {
        self.token.cancelled().await;
        self.listener.wait().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn manual_cancellation_releases_waiters() {
        let shutdown = Shutdown::listen().expect("signal handlers registered");
        shutdown.token().cancel();
        shutdown.wait().await;
        assert!(shutdown.token().is_cancelled());
    }
}

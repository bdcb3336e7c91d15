//! Runtime control for [`Server`].

mod accept;
mod backoff;
#[cfg(test)]
mod tests;

use std::sync::Arc;

pub(super) use accept::{AcceptLoopOptions, accept_loop};
pub use backoff::BackoffConfig;
use futures::Future;
use log::{info, warn};
use tokio::{select, signal};
use tokio_util::{sync::CancellationToken, task::TaskTracker};

use super::{Bound, Server, ServerError, connection::SessionContext};
use crate::transform::TransformDispatcher;

impl Server<Bound> {
    /// Run the server until a shutdown signal is received.
    ///
    /// Spawns the configured number of worker tasks and awaits Ctrl+C for shutdown.
    ///
    /// ```no_run
    /// use chunkframe::{server::Server, transform::Passthrough};
    ///
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), chunkframe::server::ServerError> {
    /// let server = Server::new(Passthrough).bind(([127, 0, 0, 1], 8080).into())?;
    /// server.run().await?;
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// Attempting to run a server without binding fails to compile:
    ///
    /// ```compile_fail
    /// use chunkframe::{server::Server, transform::Passthrough};
    ///
    /// async fn try_run() {
    ///     Server::new(Passthrough)
    ///         .run()
    ///         .await
    ///         .expect("unbound servers do not expose run()");
    /// }
    /// ```
    ///
    /// # Errors
    ///
    /// Accept failures are retried with exponential back-off and do not
    /// surface as errors.
    pub async fn run(self) -> Result<(), ServerError> {
        self.run_with_shutdown(async {
            let _ = signal::ctrl_c().await;
        })
        .await
    }

    /// Run the server until the `shutdown` future resolves.
    ///
    /// On shutdown the workers stop accepting, every live session is
    /// cancelled, and the call returns once all session tasks have finished.
    ///
    /// ```
    /// use chunkframe::{server::Server, transform::Passthrough};
    /// use tokio::sync::oneshot;
    ///
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), chunkframe::server::ServerError> {
    /// let server = Server::new(Passthrough).bind(([127, 0, 0, 1], 0).into())?;
    ///
    /// let (tx, rx) = oneshot::channel::<()>();
    /// let handle = tokio::spawn(async move {
    ///     server
    ///         .run_with_shutdown(async {
    ///             let _ = rx.await;
    ///         })
    ///         .await
    /// });
    ///
    /// let _ = tx.send(());
    /// handle
    ///     .await
    ///     .expect("join server task")
    ///     .expect("server run failed");
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    ///
    /// Accept failures are retried with exponential back-off and do not
    /// surface as errors.
    #[expect(
        clippy::integer_division_remainder_used,
        reason = "tokio::select! expands to modulus internally"
    )]
    pub async fn run_with_shutdown<S>(self, shutdown: S) -> Result<(), ServerError>
    where
        S: Future<Output = ()> + Send,
    {
        let Server {
            transform,
            session_config,
            workers,
            max_frame_length,
            backoff_config,
            registry,
            next_session_id,
            ready_tx,
            state: Bound { listener },
        } = self;
        let shutdown_token = CancellationToken::new();
        let tracker = TaskTracker::new();
        let context = SessionContext {
            dispatcher: TransformDispatcher::new(transform),
            config: session_config,
            max_frame_length,
            registry,
            next_id: next_session_id,
        };

        for _ in 0..workers {
            tracker.spawn(accept_loop(
                Arc::clone(&listener),
                AcceptLoopOptions {
                    context: context.clone(),
                    shutdown: shutdown_token.clone(),
                    tracker: tracker.clone(),
                    backoff: backoff_config,
                },
            ));
        }

        if let Ok(addr) = listener.local_addr() {
            info!("server listening: addr={addr}, workers={workers}");
        }

        // Signal readiness after all workers have been spawned.
        if let Some(tx) = ready_tx
            && tx.send(()).is_err()
        {
            warn!("Failed to send readiness signal: receiver dropped");
        }

        select! {
            () = shutdown => shutdown_token.cancel(),
            () = tracker.wait() => {},
        }

        tracker.close();
        tracker.wait().await;
        info!("server stopped");
        Ok(())
    }
}

//! Boundary to the external payload transform.
//!
//! The core never inspects what a [`Transform`] does. [`TransformDispatcher`]
//! only guarantees that each completed stream is dispatched at most once, that
//! the result is observed before any output for that stream is sent, and that
//! a dispatch outliving its session has its result dropped.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::{error::TransformError, panic::format_panic, payload::ReconstructedPayload};

/// A synchronous payload transform.
///
/// Implementations receive the format tag and decoded bytes of a completed
/// stream and return the replacement payload.
pub trait Transform: Send + Sync + 'static {
    /// Transform one payload.
    ///
    /// # Errors
    ///
    /// Returns a [`TransformError`] if the payload cannot be transformed.
    fn apply(&self, payload: ReconstructedPayload) -> Result<ReconstructedPayload, TransformError>;
}

/// Returns every payload unchanged.
#[derive(Clone, Copy, Debug, Default)]
pub struct Passthrough;

impl Transform for Passthrough {
    fn apply(&self, payload: ReconstructedPayload) -> Result<ReconstructedPayload, TransformError> {
        Ok(payload)
    }
}

/// Adapts a closure into a [`Transform`].
///
/// ```
/// use chunkframe::{
///     payload::ReconstructedPayload,
///     transform::{FnTransform, Transform},
/// };
///
/// let upper = FnTransform::new(|payload: ReconstructedPayload| {
///     let (tag, body) = payload.into_parts();
///     Ok(ReconstructedPayload::new(tag, body.to_ascii_uppercase()))
/// });
/// let out = upper
///     .apply(ReconstructedPayload::new("txt", b"abc".to_vec()))
///     .expect("transform");
/// assert_eq!(out.body(), b"ABC");
/// ```
pub struct FnTransform<F>(F);

impl<F> FnTransform<F>
where
    F: Fn(ReconstructedPayload) -> Result<ReconstructedPayload, TransformError>
        + Send
        + Sync
        + 'static,
{
    pub fn new(f: F) -> Self { Self(f) }
}

impl<F> Transform for FnTransform<F>
where
    F: Fn(ReconstructedPayload) -> Result<ReconstructedPayload, TransformError>
        + Send
        + Sync
        + 'static,
{
    fn apply(&self, payload: ReconstructedPayload) -> Result<ReconstructedPayload, TransformError> {
        (self.0)(payload)
    }
}

impl<F> std::fmt::Debug for FnTransform<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("FnTransform(<closure>)")
    }
}

/// Outcome of a dispatch that was not cancelled.
#[derive(Debug)]
pub enum Dispatch {
    /// The transform finished and produced a payload.
    Completed(ReconstructedPayload),
    /// The session was cancelled first; any late result is discarded.
    Cancelled,
}

/// Runs a shared [`Transform`] off the async executor.
#[derive(Clone)]
pub struct TransformDispatcher {
    transform: Arc<dyn Transform>,
}

impl TransformDispatcher {
    #[must_use]
    pub fn new(transform: Arc<dyn Transform>) -> Self { Self { transform } }

    /// Apply the transform to `payload` on the blocking pool.
    ///
    /// If `cancel` fires first the join handle is dropped, detaching the
    /// blocking task so its result is freed without being observed.
    ///
    /// # Errors
    ///
    /// Returns the transform's own [`TransformError`], or
    /// [`TransformError::Panicked`] if it panicked.
    pub async fn dispatch(
        &self,
        payload: ReconstructedPayload,
        cancel: &CancellationToken,
    ) -> Result<Dispatch, TransformError> {
        let transform = Arc::clone(&self.transform);
        let handle = tokio::task::spawn_blocking(move || transform.apply(payload));

        tokio::select! {
            biased;

            () = cancel.cancelled() => Ok(Dispatch::Cancelled),
            joined = handle => match joined {
                Ok(result) => result.map(Dispatch::Completed),
                Err(error) if error.is_panic() => {
                    Err(TransformError::Panicked(format_panic(error.into_panic()).to_string()))
                }
                Err(error) => Err(TransformError::failed(error)),
            },
        }
    }
}

impl std::fmt::Debug for TransformDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformDispatcher").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use tokio_util::sync::CancellationToken;

    use super::*;

    fn payload() -> ReconstructedPayload { ReconstructedPayload::new("img", vec![1, 2, 3]) }

    #[tokio::test]
    async fn passthrough_returns_the_payload() {
        let dispatcher = TransformDispatcher::new(Arc::new(Passthrough));
        let outcome = dispatcher
            .dispatch(payload(), &CancellationToken::new())
            .await
            .expect("dispatch");
        assert!(matches!(outcome, Dispatch::Completed(out) if out == payload()));
    }

    #[tokio::test]
    async fn transform_errors_are_propagated() {
        let dispatcher = TransformDispatcher::new(Arc::new(FnTransform::new(|_| {
            Err(TransformError::failed("unsupported image"))
        })));
        let err = dispatcher
            .dispatch(payload(), &CancellationToken::new())
            .await
            .expect_err("transform should fail");
        assert_eq!(err.to_string(), "transform failed: unsupported image");
    }

    #[tokio::test]
    async fn panics_become_transform_errors() {
        let dispatcher =
            TransformDispatcher::new(Arc::new(FnTransform::new(|_| panic!("decoder exploded"))));
        let err = dispatcher
            .dispatch(payload(), &CancellationToken::new())
            .await
            .expect_err("transform should fail");
        assert!(matches!(err, TransformError::Panicked(msg) if msg == "decoder exploded"));
    }

    #[tokio::test]
    async fn cancelled_dispatch_discards_the_result() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let dispatcher = TransformDispatcher::new(Arc::new(FnTransform::new(move |payload| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(payload)
        })));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let outcome = dispatcher.dispatch(payload(), &cancel).await.expect("dispatch");
        assert!(matches!(outcome, Dispatch::Cancelled));
        assert!(calls.load(Ordering::SeqCst) <= 1);
    }
}

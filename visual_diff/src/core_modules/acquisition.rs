// THEORY:
// Image acquisition turns a reference (file path or `data:` URL) into a decoded
// `PixelBuffer` without blocking the caller. `load` returns a `LoadableImage` handle
// immediately, in the `Pending` state, and a spawned task performs the decode.
//
// Key architectural principles:
// 1.  **One Transition**: A handle moves from `Pending` to exactly one of `Loaded` or
//     `Failed`, once. The state lives in a `watch` channel written by the loading task
//     alone; everybody else only reads it.
// 2.  **Publish After Decode**: The pixel buffer becomes visible only as part of the
//     terminal transition, behind an `Arc`, so readers can never observe a half-filled
//     buffer and never need a lock.
// 3.  **Poll Or Await**: `state()` is a cheap snapshot for bounded poll loops;
//     `outcome()` awaits the tagged result for callers that would rather suspend.
// 4.  **Pluggable Decoder**: The actual decode sits behind `ImageLoader`. The default
//     `FsImageLoader` uses the `image` crate; tests substitute loaders that resolve on
//     command or never resolve at all.
// 5.  **Cancellable**: Loading tasks are never left to run on their own. Whoever gives
//     up on a handle calls `cancel`, which aborts the task and drops the loader future.

pub mod acquisition {
    use crate::core_modules::pixel_buffer::pixel_buffer::PixelBuffer;
    use crate::core_modules::utils::data_url::data_url;
    use crate::core_modules::utils::image_helper::image_helper;
    use crate::error::{DiffError, Result, shorten_reference};
    use futures::future::BoxFuture;
    use log::{debug, warn};
    use std::sync::Arc;
    use tokio::sync::{oneshot, watch};
    use tokio::task::AbortHandle;

    /// Snapshot of a handle's progress.
    #[derive(Debug, Clone)]
    pub enum LoadState {
        Pending,
        Loaded(Arc<PixelBuffer>),
        Failed(DiffError),
    }

    /// Terminal result of an acquisition.
    #[derive(Debug, Clone)]
    pub enum LoadOutcome {
        Loaded(Arc<PixelBuffer>),
        Failed(DiffError),
    }

    impl LoadOutcome {
        pub fn into_result(self) -> Result<Arc<PixelBuffer>> {
            match self {
                LoadOutcome::Loaded(buffer) => Ok(buffer),
                LoadOutcome::Failed(err) => Err(err),
            }
        }
    }

    /// The external decoding primitive: start a load, eventually get pixels or an error.
    pub trait ImageLoader: Send + Sync {
        fn start_load(&self, reference: &str) -> BoxFuture<'static, Result<PixelBuffer>>;
    }

    /// Decodes `data:` URLs and filesystem paths with the `image` crate.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct FsImageLoader;

    impl FsImageLoader {
        fn decode_reference(reference: &str) -> Result<PixelBuffer> {
            let decoded = if data_url::is_data_url(reference) {
                let bytes = data_url::decode_data_url(reference)?;
                image_helper::decode(&bytes)
            } else {
                image_helper::open(reference)
            };
            decoded.map_err(|reason| DiffError::decode(reference, reason))
        }
    }

    impl ImageLoader for FsImageLoader {
        fn start_load(&self, reference: &str) -> BoxFuture<'static, Result<PixelBuffer>> {
            let reference = reference.to_string();
            Box::pin(async move {
                let blocking_reference = reference.clone();
                match tokio::task::spawn_blocking(move || Self::decode_reference(&blocking_reference)).await {
                    Ok(decoded) => decoded,
                    Err(join_err) => Err(DiffError::decode(&reference, join_err)),
                }
            })
        }
    }

    pub type SuccessHook = Box<dyn FnOnce(&LoadableImage) + Send>;
    pub type FailureHook = Box<dyn FnOnce(&DiffError) + Send>;

    /// Optional one-shot notifications. At most one of them ever runs.
    #[derive(Default)]
    pub struct LoadHooks {
        pub on_success: Option<SuccessHook>,
        pub on_failure: Option<FailureHook>,
    }

    /// Handle to an in-flight or finished acquisition.
    #[derive(Debug, Clone)]
    pub struct LoadableImage {
        reference: Arc<str>,
        state: watch::Receiver<LoadState>,
        task: AbortHandle,
    }

    impl LoadableImage {
        pub fn reference(&self) -> &str {
            &self.reference
        }

        pub fn state(&self) -> LoadState {
            self.state.borrow().clone()
        }

        pub fn is_pending(&self) -> bool {
            matches!(*self.state.borrow(), LoadState::Pending)
        }

        pub fn is_loaded(&self) -> bool {
            matches!(*self.state.borrow(), LoadState::Loaded(_))
        }

        pub fn loaded(&self) -> Option<Arc<PixelBuffer>> {
            match &*self.state.borrow() {
                LoadState::Loaded(buffer) => Some(Arc::clone(buffer)),
                _ => None,
            }
        }

        pub fn failure(&self) -> Option<DiffError> {
            match &*self.state.borrow() {
                LoadState::Failed(err) => Some(err.clone()),
                _ => None,
            }
        }

        /// Aborts the loading task if it is still running. A handle cancelled while
        /// pending stays `Pending`, and `outcome()` then reports a decode failure.
        pub fn cancel(&self) {
            if !self.task.is_finished() {
                debug!("image load cancelled: {}", shorten_reference(&self.reference));
                self.task.abort();
            }
        }

        /// Waits for the terminal transition.
        pub async fn outcome(&self) -> LoadOutcome {
            let mut state = self.state.clone();
            let terminal = state
                .wait_for(|s| !matches!(s, LoadState::Pending))
                .await
                .map(|s| (*s).clone());
            match terminal {
                Ok(LoadState::Loaded(buffer)) => LoadOutcome::Loaded(buffer),
                Ok(LoadState::Failed(err)) => LoadOutcome::Failed(err),
                // Sender gone while still pending: the loading task died.
                Ok(LoadState::Pending) | Err(_) => LoadOutcome::Failed(DiffError::decode(
                    &self.reference,
                    "loader stopped before producing an image",
                )),
            }
        }
    }

    /// Rejects empty and whitespace-only references.
    pub fn validate_reference(reference: &str) -> Result<()> {
        if reference.trim().is_empty() {
            return Err(DiffError::invalid(
                "image reference should be a non-empty string",
            ));
        }
        Ok(())
    }

    /// Starts acquiring `reference`. Must be called from within a tokio runtime.
    pub fn load(reference: &str, loader: &dyn ImageLoader) -> Result<LoadableImage> {
        load_with_hooks(reference, loader, LoadHooks::default())
    }

    pub fn load_with_hooks(
        reference: &str,
        loader: &dyn ImageLoader,
        hooks: LoadHooks,
    ) -> Result<LoadableImage> {
        validate_reference(reference)?;
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|_| DiffError::invalid("image acquisition needs a tokio runtime"))?;

        let (state_tx, state_rx) = watch::channel(LoadState::Pending);
        let reference: Arc<str> = Arc::from(reference);
        let pending = loader.start_load(&reference);
        debug!("image load started: {}", shorten_reference(&reference));

        // The observer carries the task's own abort handle, so it is sent in after spawning.
        let (observer_tx, observer_rx) = oneshot::channel::<LoadableImage>();
        let task = runtime.spawn(async move {
            let Ok(observer) = observer_rx.await else {
                return;
            };
            match pending.await {
                Ok(buffer) => {
                    debug!(
                        "image loaded ({}x{}): {}",
                        buffer.width(),
                        buffer.height(),
                        shorten_reference(observer.reference())
                    );
                    state_tx.send_replace(LoadState::Loaded(Arc::new(buffer)));
                    if let Some(on_success) = hooks.on_success {
                        on_success(&observer);
                    }
                }
                Err(err) => {
                    warn!("image load failed: {err}");
                    state_tx.send_replace(LoadState::Failed(err.clone()));
                    if let Some(on_failure) = hooks.on_failure {
                        on_failure(&err);
                    }
                }
            }
        });

        let handle = LoadableImage {
            reference,
            state: state_rx,
            task: task.abort_handle(),
        };
        let _ = observer_tx.send(handle.clone());
        Ok(handle)
    }
}

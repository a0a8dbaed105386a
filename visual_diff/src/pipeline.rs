// THEORY:
// The `pipeline` module is the top-level API of the comparison engine. It wraps the full
// stack (acquisition, polling, dimension check, diff, report) into a single call:
// give it two image references and get back a verdict plus a highlighted diff.
//
// A comparison walks a small state machine:
//
//   Acquiring -> WaitingBoth -> DimensionChecked -> Diffed -> Done
//                  \-> TimedOut     \-> DimensionMismatchFailed
//
// The failure states are terminal; nothing after them runs and no partial result is
// returned. A decode failure on either image also ends the comparison at once. However
// a comparison ends, any load still in flight is cancelled.

use crate::core_modules::acquisition::acquisition::{
    self, FsImageLoader, ImageLoader, LoadState, LoadableImage,
};
use crate::core_modules::diff_engine::diff_engine::{self, format_result_message};
use crate::core_modules::pixel_buffer::pixel_buffer::PixelBuffer;
use crate::core_modules::poll_policy::poll_policy::{PollClock, PollPolicy};
use crate::core_modules::smart_pixel::smart_pixel::Threshold;
use crate::error::{DiffError, Result};
use log::{debug, info, trace, warn};
use std::sync::Arc;

// Re-export key data structures for the public API.
pub use crate::core_modules::diff_engine::diff_engine::DiffResult;

pub const DEFAULT_AMOUNT_DIFF_THRESHOLD: f64 = 0.05;
pub const DEFAULT_PIXEL_DIST_THRESHOLD: f64 = 0.1;

/// Configuration for a comparison. Every field has a documented default.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompareConfig {
    /// Fraction of all pixels that may differ before the comparison fails.
    pub amount_diff_threshold: f64,
    /// Fraction of each HSL channel's range two pixels may drift and still match.
    pub pixel_dist_threshold: f64,
    pub poll_policy: PollPolicy,
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            amount_diff_threshold: DEFAULT_AMOUNT_DIFF_THRESHOLD,
            pixel_dist_threshold: DEFAULT_PIXEL_DIST_THRESHOLD,
            poll_policy: PollPolicy::default(),
        }
    }
}

impl CompareConfig {
    /// Checks every field, returning the thresholds as (amount, pixel distance).
    pub fn validate(&self) -> Result<(Threshold, Threshold)> {
        let amount = Threshold::new(self.amount_diff_threshold)?;
        let pixel_dist = Threshold::new(self.pixel_dist_threshold)?;
        self.poll_policy.validate()?;
        Ok((amount, pixel_dist))
    }
}

/// Stages of a single comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonStage {
    Acquiring,
    WaitingBoth,
    TimedOut,
    DimensionChecked,
    DimensionMismatchFailed,
    Diffed,
    Done,
}

/// The final output of a comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonReport {
    pub result: DiffResult,
    pub message: String,
    /// Every stage the comparison passed through, in order.
    pub stages: Vec<ComparisonStage>,
}

impl ComparisonReport {
    /// True when the images are similar enough for the comparison to pass.
    pub fn passed(&self) -> bool {
        !self.result.threshold_reached
    }
}

#[derive(Debug, Default)]
struct StageTrail(Vec<ComparisonStage>);

impl StageTrail {
    fn enter(&mut self, stage: ComparisonStage) {
        debug!("comparison stage: {stage:?}");
        self.0.push(stage);
    }
}

/// Cancels every tracked load when dropped.
#[derive(Default)]
struct InFlightLoads(Vec<LoadableImage>);

impl InFlightLoads {
    fn track(&mut self, image: LoadableImage) -> LoadableImage {
        self.0.push(image.clone());
        image
    }
}

impl Drop for InFlightLoads {
    fn drop(&mut self) {
        for image in &self.0 {
            image.cancel();
        }
    }
}

/// The main entry point for comparing two images.
pub struct ComparisonPipeline {
    config: CompareConfig,
    loader: Arc<dyn ImageLoader>,
}

impl ComparisonPipeline {
    pub fn new(config: CompareConfig, loader: Arc<dyn ImageLoader>) -> Self {
        Self { config, loader }
    }

    /// A pipeline that decodes file paths and `data:` URLs with the `image` crate.
    pub fn with_fs_loader(config: CompareConfig) -> Self {
        Self::new(config, Arc::new(FsImageLoader))
    }

    pub fn config(&self) -> &CompareConfig {
        &self.config
    }

    /// Compares two images, polling on a tokio interval per the configured policy.
    pub async fn compare_images(&self, base_ref: &str, current_ref: &str) -> Result<ComparisonReport> {
        self.config.validate()?;
        let mut clock = self.config.poll_policy.clock()?;
        self.compare_images_with_clock(base_ref, current_ref, &mut clock)
            .await
    }

    /// Compares two images, drawing poll ticks from `clock`.
    pub async fn compare_images_with_clock(
        &self,
        base_ref: &str,
        current_ref: &str,
        clock: &mut dyn PollClock,
    ) -> Result<ComparisonReport> {
        let (amount_threshold, pixel_threshold) = self.config.validate()?;
        acquisition::validate_reference(base_ref)?;
        acquisition::validate_reference(current_ref)?;

        let mut trail = StageTrail::default();
        trail.enter(ComparisonStage::Acquiring);
        let mut loads = InFlightLoads::default();
        let base = loads.track(acquisition::load(base_ref, self.loader.as_ref())?);
        let current = loads.track(acquisition::load(current_ref, self.loader.as_ref())?);

        let (base_buffer, current_buffer) =
            self.wait_for_both(&base, &current, clock, &mut trail).await?;

        if base_buffer.dimensions() != current_buffer.dimensions() {
            trail.enter(ComparisonStage::DimensionMismatchFailed);
            return Err(DiffError::DimensionMismatch {
                base: base_buffer.dimensions(),
                current: current_buffer.dimensions(),
            });
        }
        trail.enter(ComparisonStage::DimensionChecked);

        let result = diff_engine::compute_diff(
            &base_buffer,
            &current_buffer,
            amount_threshold,
            pixel_threshold,
        )?;
        trail.enter(ComparisonStage::Diffed);

        let message = format_result_message(
            result.diff_pixel_count,
            result.total_pixels,
            amount_threshold.value(),
        );
        info!(
            "compared {}x{} images: {} differing pixels, threshold reached: {}",
            base_buffer.width(),
            base_buffer.height(),
            result.diff_pixel_count,
            result.threshold_reached
        );
        trail.enter(ComparisonStage::Done);

        Ok(ComparisonReport {
            result,
            message,
            stages: trail.0,
        })
    }

    /// Polls both handles once per tick until both are loaded or the budget runs out.
    async fn wait_for_both(
        &self,
        base: &LoadableImage,
        current: &LoadableImage,
        clock: &mut dyn PollClock,
        trail: &mut StageTrail,
    ) -> Result<(Arc<PixelBuffer>, Arc<PixelBuffer>)> {
        let max_attempts = self.config.poll_policy.max_attempts;
        trail.enter(ComparisonStage::WaitingBoth);

        for attempt in 1..=max_attempts {
            clock.tick().await;
            match (base.state(), current.state()) {
                (LoadState::Loaded(base_buffer), LoadState::Loaded(current_buffer)) => {
                    debug!("both images loaded after {attempt} attempt(s)");
                    return Ok((base_buffer, current_buffer));
                }
                (LoadState::Failed(err), _) | (_, LoadState::Failed(err)) => {
                    warn!("aborting comparison: {err}");
                    return Err(err);
                }
                _ => trace!("attempt {attempt}/{max_attempts}: still waiting for images"),
            }
        }

        trail.enter(ComparisonStage::TimedOut);
        warn!("images not loaded after {max_attempts} attempts");
        Err(DiffError::Timeout {
            attempts: max_attempts,
        })
    }
}

/// Compares two image references (file paths or `data:` URLs) with the given config.
pub async fn compare_images(
    base_ref: &str,
    current_ref: &str,
    config: CompareConfig,
) -> Result<ComparisonReport> {
    ComparisonPipeline::with_fs_loader(config)
        .compare_images(base_ref, current_ref)
        .await
}

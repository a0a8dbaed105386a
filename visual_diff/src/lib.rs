// THEORY:
// This file is the main entry point for the `visual_diff` library crate. It defines the
// public API exposed to external consumers (a test-runner command, the bundled CLI).
//
// The primary export is the `pipeline` module: `compare_images` and the
// `ComparisonPipeline` that backs it, with `CompareConfig` and `ComparisonReport`. The
// building blocks in `core_modules` stay public as well, because each one (colour
// conversion, the similarity predicate, the diff scan, image acquisition) is useful and
// testable on its own.

pub mod core_modules;
pub mod error;
pub mod pipeline;

pub use core_modules::acquisition::acquisition::{
    FsImageLoader, ImageLoader, LoadHooks, LoadOutcome, LoadState, LoadableImage, load,
    load_with_hooks,
};
pub use core_modules::diff_engine::diff_engine::{
    DiffResult, compute_diff, compute_diff_bytes, format_result_message,
};
pub use core_modules::pixel::pixel::{HslVector, RgbVector, convert, convert_components};
pub use core_modules::pixel_buffer::pixel_buffer::PixelBuffer;
pub use core_modules::poll_policy::poll_policy::{IntervalClock, PollClock, PollPolicy};
pub use core_modules::smart_pixel::smart_pixel::{
    Threshold, are_similar, are_similar_components, highlight_pixel,
};
pub use core_modules::utils::data_url::data_url::img_base64_to_data_url;
pub use error::{DiffError, Result};
pub use pipeline::{
    CompareConfig, ComparisonPipeline, ComparisonReport, ComparisonStage, compare_images,
};

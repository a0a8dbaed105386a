// THEORY:
// The `diff_engine` is the scanning layer of the comparison engine. It walks two
// equal-sized pixel buffers in lockstep, asks `SmartPixel` for a verdict on every pair,
// keeps the aggregate count, and paints a third buffer that shows where the images
// agree (blue tint, mostly transparent) and where they do not (red, opaque).
//
// Key architectural principles:
// 1.  **Single Deterministic Pass**: Pixels are visited once, in row-major order. The
//     counting rule below depends on visiting order, so the order is part of the
//     contract and test fixtures rely on it.
// 2.  **Freeze On Reach**: As soon as the ratio of differing pixels reaches the
//     aggregate threshold, the verdict is known. The flag is set and the count stops
//     growing, which is why the report says "at least N". Highlighting continues for
//     every pixel so the diff buffer is always complete.
// 3.  **Presentation Apart**: `format_result_message` only formats numbers it is given.

pub mod diff_engine {
    use crate::core_modules::pixel::pixel::{Channel, RgbVector};
    use crate::core_modules::pixel_buffer::pixel_buffer::PixelBuffer;
    use crate::core_modules::smart_pixel::smart_pixel::{SmartPixel, Threshold};
    use crate::error::{DiffError, Result};

    /// Outcome of a full-image comparison. Built once, never mutated.
    #[derive(Debug, Clone, PartialEq)]
    pub struct DiffResult {
        /// Whether the share of differing pixels reached the aggregate threshold.
        pub threshold_reached: bool,
        pub total_pixels: usize,
        /// Differing pixels counted before the threshold was reached (frozen afterwards).
        pub diff_pixel_count: usize,
        /// Highlighted diff, same dimensions as the inputs.
        pub diff_buffer: PixelBuffer,
    }

    impl DiffResult {
        pub fn diff_ratio(&self) -> f64 {
            ratio(self.diff_pixel_count, self.total_pixels)
        }
    }

    fn ratio(count: usize, total: usize) -> f64 {
        if total == 0 {
            0.0
        } else {
            count as f64 / total as f64
        }
    }

    /// Scans both buffers and produces the diff buffer plus aggregate statistics.
    pub fn compute_diff(
        base: &PixelBuffer,
        current: &PixelBuffer,
        amount_diff_threshold: Threshold,
        pixel_dist_threshold: Threshold,
    ) -> Result<DiffResult> {
        if base.dimensions() != current.dimensions() {
            return Err(DiffError::DimensionMismatch {
                base: base.dimensions(),
                current: current.dimensions(),
            });
        }

        let total_pixels = base.pixel_count();
        let mut diff_buffer = PixelBuffer::blank(base.width(), base.height())?;
        let mut diff_pixel_count = 0usize;
        let mut threshold_reached = false;

        let pairs = base.pixels().zip(current.pixels());
        for ((base_bytes, current_bytes), output) in pairs.zip(diff_buffer.pixels_mut()) {
            let base_pixel = SmartPixel::new(RgbVector::from_rgba(base_bytes)?);
            let current_pixel = SmartPixel::new(RgbVector::from_rgba(current_bytes)?);

            if !threshold_reached && !base_pixel.is_similar(&current_pixel, pixel_dist_threshold) {
                diff_pixel_count += 1;
            }

            output.copy_from_slice(&base_pixel.highlight(&current_pixel, pixel_dist_threshold));

            if !threshold_reached
                && ratio(diff_pixel_count, total_pixels) >= amount_diff_threshold.value()
            {
                threshold_reached = true;
            }
        }

        Ok(DiffResult {
            threshold_reached,
            total_pixels,
            diff_pixel_count,
            diff_buffer,
        })
    }

    /// Raw-buffer form of `compute_diff`. Thresholds and buffer lengths are validated first.
    pub fn compute_diff_bytes(
        buffer_a: &[Channel],
        buffer_b: &[Channel],
        width: u32,
        height: u32,
        amount_diff_threshold: f64,
        pixel_dist_threshold: f64,
    ) -> Result<DiffResult> {
        let amount_diff_threshold = Threshold::new(amount_diff_threshold)?;
        let pixel_dist_threshold = Threshold::new(pixel_dist_threshold)?;
        let base = PixelBuffer::new(width, height, buffer_a.to_vec())?;
        let current = PixelBuffer::new(width, height, buffer_b.to_vec())?;
        compute_diff(&base, &current, amount_diff_threshold, pixel_dist_threshold)
    }

    /// Human-readable summary of a diff.
    pub fn format_result_message(diff_pixel_count: usize, total_pixels: usize, threshold: f64) -> String {
        let observed = ratio(diff_pixel_count, total_pixels);
        let is_bigger_or_equal = total_pixels > 0 && observed >= threshold;

        format!(
            "different pixels: {}{} out of {} ({:.2}%).\n\n\
             the difference between images is {} the {}% threshold.",
            if is_bigger_or_equal { "at least " } else { "" },
            diff_pixel_count,
            total_pixels,
            observed * 100.0,
            if is_bigger_or_equal {
                "bigger than or equal"
            } else {
                "smaller than"
            },
            trimmed_percentage(threshold),
        )
    }

    /// `0.05` renders as `5`, `0.125` as `12.5`.
    fn trimmed_percentage(threshold: f64) -> String {
        let percentage = (threshold * 100.0 * 1e6).round() / 1e6;
        format!("{percentage}")
    }
}

#[cfg(test)]
mod tests {
    use super::diff_engine::*;
    use crate::core_modules::pixel_buffer::pixel_buffer::PixelBuffer;
    use crate::core_modules::smart_pixel::smart_pixel::Threshold;
    use crate::error::DiffError;

    const RED: [u8; 4] = [255, 0, 0, 255];
    const BLUE: [u8; 4] = [0, 0, 255, 255];

    fn threshold(value: f64) -> Threshold {
        Threshold::new(value).unwrap()
    }

    #[test]
    fn identical_buffers_have_no_differences() {
        let image = PixelBuffer::filled(4, 3, [120, 60, 30, 255]).unwrap();
        let result = compute_diff(&image, &image, threshold(0.05), threshold(0.1)).unwrap();

        assert_eq!(result.total_pixels, 12);
        assert_eq!(result.diff_pixel_count, 0);
        assert!(!result.threshold_reached);
        assert_eq!(result.diff_buffer.dimensions(), (4, 3));
        assert!(result.diff_buffer.pixels().all(|p| p == [120, 60, 255, 64]));
    }

    #[test]
    fn count_freezes_once_threshold_is_reached() {
        let base = PixelBuffer::filled(10, 10, RED).unwrap();
        let current = PixelBuffer::filled(10, 10, BLUE).unwrap();

        let result = compute_diff(&base, &current, threshold(0.05), threshold(0.1)).unwrap();

        assert!(result.threshold_reached);
        assert_eq!(result.diff_pixel_count, 5);
        // Highlighting is not frozen.
        assert!(result.diff_buffer.pixels().all(|p| p == [255, 0, 255, 255]));
    }

    #[test]
    fn differences_after_the_flag_do_not_change_the_outcome() {
        let base = PixelBuffer::filled(10, 10, RED).unwrap();
        let mut few = base.clone();
        for x in 0..5 {
            few.set_pixel(x, 0, BLUE).unwrap();
        }
        let all = PixelBuffer::filled(10, 10, BLUE).unwrap();

        let few_result = compute_diff(&base, &few, threshold(0.05), threshold(0.1)).unwrap();
        let all_result = compute_diff(&base, &all, threshold(0.05), threshold(0.1)).unwrap();

        assert!(few_result.threshold_reached);
        assert_eq!(few_result.diff_pixel_count, all_result.diff_pixel_count);
        assert_eq!(few_result.threshold_reached, all_result.threshold_reached);
    }

    #[test]
    fn below_threshold_counts_every_difference() {
        let base = PixelBuffer::filled(10, 10, RED).unwrap();
        let mut current = base.clone();
        for x in 0..4 {
            current.set_pixel(x, 9, BLUE).unwrap();
        }

        let result = compute_diff(&base, &current, threshold(0.05), threshold(0.1)).unwrap();

        assert!(!result.threshold_reached);
        assert_eq!(result.diff_pixel_count, 4);
        assert_eq!(result.diff_buffer.pixel(0, 9), Some([255, 0, 255, 255]));
        assert_eq!(result.diff_buffer.pixel(5, 9), Some([255, 0, 255, 64]));
    }

    #[test]
    fn mismatched_dimensions_are_rejected() {
        let base = PixelBuffer::blank(2, 2).unwrap();
        let current = PixelBuffer::blank(2, 3).unwrap();
        let err = compute_diff(&base, &current, threshold(0.05), threshold(0.1)).unwrap_err();
        assert_eq!(
            err,
            DiffError::DimensionMismatch {
                base: (2, 2),
                current: (2, 3)
            }
        );
    }

    #[test]
    fn raw_entry_point_validates_thresholds_and_lengths() {
        let bytes = vec![0u8; 16];
        assert!(compute_diff_bytes(&bytes, &bytes, 2, 2, 0.0, 0.1).is_err());
        assert!(compute_diff_bytes(&bytes, &bytes, 2, 2, 0.05, 1.0).is_err());
        assert!(compute_diff_bytes(&bytes, &bytes[..12], 2, 2, 0.05, 0.1).is_err());

        let result = compute_diff_bytes(&bytes, &bytes, 2, 2, 0.05, 0.1).unwrap();
        assert_eq!(result.diff_pixel_count, 0);
    }

    #[test]
    fn zero_area_images_never_reach_the_threshold() {
        let empty = PixelBuffer::blank(0, 0).unwrap();
        let result = compute_diff(&empty, &empty, threshold(0.05), threshold(0.1)).unwrap();
        assert_eq!(result.total_pixels, 0);
        assert!(!result.threshold_reached);
    }

    #[test]
    fn message_below_threshold() {
        assert_eq!(
            format_result_message(3, 100, 0.05),
            "different pixels: 3 out of 100 (3.00%).\n\n\
             the difference between images is smaller than the 5% threshold."
        );
    }

    #[test]
    fn message_at_or_above_threshold() {
        assert_eq!(
            format_result_message(5, 100, 0.05),
            "different pixels: at least 5 out of 100 (5.00%).\n\n\
             the difference between images is bigger than or equal the 5% threshold."
        );
    }

    #[test]
    fn message_rounds_to_two_decimals() {
        let message = format_result_message(1, 30, 0.125);
        assert!(message.starts_with("different pixels: 1 out of 30 (3.33%)."));
        assert!(message.ends_with("smaller than the 12.5% threshold."));
    }

    #[test]
    fn message_for_empty_images() {
        assert!(format_result_message(0, 0, 0.05).contains("0 out of 0 (0.00%)"));
    }
}

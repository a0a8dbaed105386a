// THEORY:
// The `SmartPixel` module provides the comparative half of the colour model. It wraps a
// "dumb" `RgbVector` and answers one question about a pair of pixels: are they close
// enough that a human would not notice the difference?
//
// Key architectural principles:
// 1.  **Comparative Analysis**: Every method takes another pixel. A `SmartPixel` is
//     meaningless on its own; its value is in the relationship.
// 2.  **Per-Channel Tolerance**: Similarity is judged independently on hue, saturation
//     and lightness, each against the threshold scaled by that channel's full range
//     (360 for hue, 100 for the other two). One channel drifting too far is enough to
//     call the pair different.
// 3.  **Optimization**: The HSL conversion is cached in the constructor. The diff engine
//     converts each pixel of a pair exactly once even though both the counting step and
//     the highlighting step need the verdict.

pub mod smart_pixel {
    use crate::core_modules::pixel::pixel::{Channel, HslVector, RgbVector, convert};
    use crate::error::{DiffError, Result};

    pub type RgbaPixel = [Channel; 4];

    const HUE_RANGE: f64 = 360.0;
    const PERCENT_RANGE: f64 = 100.0;
    /// Alpha used for pixels that matched: a quarter of full opacity.
    const MATCH_ALPHA: Channel = 64;
    const INVALID_THRESHOLD_MESSAGE: &str =
        "value should only be a number bigger than 0 and smaller than 1";

    /// A tolerance strictly inside (0, 1).
    ///
    /// Used both as a pixel-distance threshold (fraction of each HSL channel's range) and
    /// as an aggregate threshold (fraction of all pixels allowed to differ).
    #[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
    pub struct Threshold(f64);

    impl Threshold {
        pub fn new(value: f64) -> Result<Self> {
            if value.is_finite() && value > 0.0 && value < 1.0 {
                Ok(Self(value))
            } else {
                Err(DiffError::invalid(format!(
                    "{INVALID_THRESHOLD_MESSAGE} (got {value})"
                )))
            }
        }

        pub fn value(&self) -> f64 {
            self.0
        }
    }

    impl TryFrom<f64> for Threshold {
        type Error = DiffError;

        fn try_from(value: f64) -> Result<Self> {
            Self::new(value)
        }
    }

    /// An analytical tool that wraps an `RgbVector` to provide comparison methods.
    pub struct SmartPixel {
        /// The raw sample this `SmartPixel` is analyzing.
        pub rgb: RgbVector,
        /// The pre-calculated HSL form, cached for performance.
        hsl: HslVector,
    }

    impl SmartPixel {
        pub fn new(rgb: RgbVector) -> Self {
            Self {
                hsl: convert(rgb),
                rgb,
            }
        }

        pub fn hsl(&self) -> HslVector {
            self.hsl
        }

        pub fn hue_difference(&self, other: &SmartPixel) -> f64 {
            (self.hsl.hue as f64 - other.hsl.hue as f64).abs()
        }

        pub fn saturation_difference(&self, other: &SmartPixel) -> f64 {
            (self.hsl.saturation as f64 - other.hsl.saturation as f64).abs()
        }

        pub fn lightness_difference(&self, other: &SmartPixel) -> f64 {
            (self.hsl.lightness as f64 - other.hsl.lightness as f64).abs()
        }

        /// True when every HSL channel difference is within the threshold scaled to that channel.
        pub fn is_similar(&self, other: &SmartPixel, threshold: Threshold) -> bool {
            let tolerance = threshold.value();
            self.hue_difference(other) <= tolerance * HUE_RANGE
                && self.saturation_difference(other) <= tolerance * PERCENT_RANGE
                && self.lightness_difference(other) <= tolerance * PERCENT_RANGE
        }

        /// The diff-buffer pixel for this (base) pixel against `current`.
        pub fn highlight(&self, current: &SmartPixel, threshold: Threshold) -> RgbaPixel {
            if self.is_similar(current, threshold) {
                match_tint(self.rgb)
            } else {
                mismatch_tint(current.rgb)
            }
        }
    }

    /// Base pixel with blue maxed and alpha at a quarter.
    fn match_tint(base: RgbVector) -> RgbaPixel {
        [base.red, base.green, Channel::MAX, MATCH_ALPHA]
    }

    /// Current pixel with red maxed and full alpha.
    fn mismatch_tint(current: RgbVector) -> RgbaPixel {
        [Channel::MAX, current.green, current.blue, Channel::MAX]
    }

    /// Perceptual similarity of two pixels.
    ///
    /// Fails with `InvalidInput` when `threshold` is not strictly between 0 and 1.
    pub fn are_similar(rgb_a: RgbVector, rgb_b: RgbVector, threshold: f64) -> Result<bool> {
        let threshold = Threshold::new(threshold)?;
        Ok(SmartPixel::new(rgb_a).is_similar(&SmartPixel::new(rgb_b), threshold))
    }

    /// Validating variant of `are_similar` for untyped components.
    pub fn are_similar_components(
        components_a: &[i64],
        components_b: &[i64],
        threshold: f64,
    ) -> Result<bool> {
        let rgb_a = RgbVector::try_from_components(components_a)?;
        let rgb_b = RgbVector::try_from_components(components_b)?;
        are_similar(rgb_a, rgb_b, threshold)
    }

    pub fn highlight_pixel(base: RgbVector, current: RgbVector, threshold: Threshold) -> RgbaPixel {
        SmartPixel::new(base).highlight(&SmartPixel::new(current), threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::smart_pixel::*;
    use crate::core_modules::pixel::pixel::RgbVector;
    use crate::error::DiffError;
    use rstest::rstest;

    #[rstest]
    #[case([0, 0, 0], [64, 181, 162], 0.5)]
    #[case([127, 127, 127], [161, 222, 217], 0.5)]
    #[case([255, 255, 255], [84, 196, 168], 0.5)]
    #[case([255, 0, 0], [188, 238, 119], 0.25)]
    #[case([0, 255, 0], [138, 97, 15], 0.25)]
    #[case([0, 0, 255], [243, 114, 200], 0.25)]
    #[case([178, 34, 34], [196, 122, 49], 0.1)]
    #[case([85, 107, 47], [92, 83, 35], 0.1)]
    #[case([100, 149, 237], [173, 152, 236], 0.1)]
    fn pixels_within_every_channel_tolerance_are_similar(
        #[case] a: [u8; 3],
        #[case] b: [u8; 3],
        #[case] threshold: f64,
    ) {
        assert!(are_similar(a.into(), b.into(), threshold).unwrap());
        assert!(are_similar(b.into(), a.into(), threshold).unwrap());
    }

    #[rstest]
    #[case([0, 0, 0], [64, 162, 181], 0.5)]
    #[case([127, 127, 127], [158, 224, 219], 0.5)]
    #[case([255, 255, 255], [59, 171, 143], 0.5)]
    #[case([255, 0, 0], [211, 244, 164], 0.25)]
    #[case([0, 255, 0], [130, 94, 23], 0.25)]
    #[case([0, 0, 255], [243, 114, 157], 0.25)]
    #[case([178, 34, 34], [191, 122, 54], 0.1)]
    #[case([85, 107, 47], [92, 75, 35], 0.1)]
    #[case([100, 149, 237], [176, 156, 237], 0.1)]
    fn one_channel_out_of_tolerance_makes_pixels_different(
        #[case] a: [u8; 3],
        #[case] b: [u8; 3],
        #[case] threshold: f64,
    ) {
        assert!(!are_similar(a.into(), b.into(), threshold).unwrap());
        assert!(!are_similar(b.into(), a.into(), threshold).unwrap());
    }

    #[test]
    fn every_pixel_is_similar_to_itself() {
        for threshold in [0.001, 0.1, 0.5, 0.999] {
            for value in (0..=255u8).step_by(17) {
                let rgb = RgbVector::new(value, 255 - value, value / 2);
                assert!(are_similar(rgb, rgb, threshold).unwrap());
            }
        }
    }

    #[rstest]
    #[case(0.0)]
    #[case(1.0)]
    #[case(1.25)]
    #[case(-0.75)]
    #[case(f64::NAN)]
    #[case(f64::INFINITY)]
    fn rejects_thresholds_outside_the_open_unit_interval(#[case] threshold: f64) {
        let result = are_similar(RgbVector::new(0, 0, 0), RgbVector::new(255, 255, 255), threshold);
        assert!(matches!(result, Err(DiffError::InvalidInput(_))));
    }

    #[test]
    fn rejects_invalid_components_on_either_side() {
        let valid = [0i64, 0, 0];
        for invalid in [vec![-64, 64, 64], vec![255, 255, 512], vec![0, 0]] {
            assert!(are_similar_components(&valid, &invalid, 0.5).is_err());
            assert!(are_similar_components(&invalid, &valid, 0.5).is_err());
        }
    }

    #[test]
    fn highlight_tints_matches_blue_and_mismatches_red() {
        let threshold = Threshold::new(0.1).unwrap();
        let base = RgbVector::new(10, 20, 30);
        assert_eq!(highlight_pixel(base, base, threshold), [10, 20, 255, 64]);

        let current = RgbVector::new(0, 200, 40);
        assert_eq!(
            highlight_pixel(RgbVector::new(200, 0, 0), current, threshold),
            [255, 200, 40, 255]
        );
    }
}

// THEORY (Color Model):
// The `pixel` module is the most fundamental unit of the comparison engine. It knows
// how to describe a single colour and nothing else: an `RgbVector` is the raw sample
// read out of a pixel buffer (alpha is ignored for comparison), and an `HslVector` is
// the perceptual description of that same sample.
//
// Why HSL?
// - Screenshots are noisy in ways RGB distance exaggerates: anti-aliasing, JPEG/PNG
//   re-encoding and font hinting shift all three RGB channels a little at once.
// - In HSL those shifts mostly land in lightness, while the changes a human notices
//   (a button turning from blue to red) land in hue. Comparing channel by channel in
//   HSL lets each axis carry its own tolerance.
//
// Key principles:
// 1) Single-pixel scope: conversion never reads neighbours. Pairwise logic lives in
//    `SmartPixel`.
// 2) Validation at the edge: components coming from untyped sources (`i64`, `f64`)
//    are checked once when an `RgbVector` is built; everything downstream works on
//    `u8` channels that cannot be out of range.
// 3) Integer output: every HSL channel is rounded independently, so two conversions
//    of the same colour always compare exactly.

pub mod pixel {
    use crate::error::{DiffError, Result};

    pub type Channel = u8;
    pub type NormalizedChannel = f64;
    pub type Hue = u16;
    pub type SaturationHSL = u8;
    pub type LightnessHSL = u8;

    const CHANNEL_MAX: f64 = 255.0;
    const RGB_COMPONENTS: usize = 3;
    const INVALID_RGB_MESSAGE: &str =
        "value should only be a RGB vector (array of 3 integers ranging from 0 to 255)";

    /// An immutable RGB sample. Channels are bytes, so a constructed value is always valid.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct RgbVector {
        pub red: Channel,
        pub green: Channel,
        pub blue: Channel,
    }

    /// Perceptual description of an `RgbVector`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct HslVector {
        /// Angle on the colour wheel, in [0, 360).
        pub hue: Hue,
        /// Saturation percentage, in [0, 100].
        pub saturation: SaturationHSL,
        /// Lightness percentage, in [0, 100].
        pub lightness: LightnessHSL,
    }

    impl RgbVector {
        pub const fn new(red: Channel, green: Channel, blue: Channel) -> Self {
            Self { red, green, blue }
        }

        /// Builds a vector from untyped integer components.
        ///
        /// Fails with `InvalidInput` unless there are exactly three components, each in 0..=255.
        pub fn try_from_components(components: &[i64]) -> Result<Self> {
            if components.len() != RGB_COMPONENTS {
                return Err(DiffError::invalid(INVALID_RGB_MESSAGE));
            }
            let mut channels = [0 as Channel; RGB_COMPONENTS];
            for (slot, &component) in channels.iter_mut().zip(components) {
                *slot = Channel::try_from(component)
                    .map_err(|_| DiffError::invalid(INVALID_RGB_MESSAGE))?;
            }
            Ok(Self::from(channels))
        }

        /// Builds a vector from floating point components, rejecting any with a fractional part.
        pub fn from_f64s(components: &[f64]) -> Result<Self> {
            let mut integers = Vec::with_capacity(components.len());
            for &component in components {
                if !component.is_finite() || component.fract() != 0.0 {
                    return Err(DiffError::invalid(INVALID_RGB_MESSAGE));
                }
                integers.push(component as i64);
            }
            Self::try_from_components(&integers)
        }

        /// Reads the first three channels of an RGBA (or RGB) pixel slice, dropping alpha.
        pub fn from_rgba(bytes: &[Channel]) -> Result<Self> {
            match bytes {
                [red, green, blue, ..] => Ok(Self::new(*red, *green, *blue)),
                _ => Err(DiffError::invalid(format!(
                    "a pixel needs at least 3 channels, got {}",
                    bytes.len()
                ))),
            }
        }

        fn normalized(&self) -> (NormalizedChannel, NormalizedChannel, NormalizedChannel) {
            (
                self.red as NormalizedChannel / CHANNEL_MAX,
                self.green as NormalizedChannel / CHANNEL_MAX,
                self.blue as NormalizedChannel / CHANNEL_MAX,
            )
        }

        /// Hue angle in degrees, unrounded, wrapped into [0, 360).
        pub fn hue_degrees(&self) -> f64 {
            let (red, green, blue) = self.normalized();
            let maximum_channel = red.max(green.max(blue));
            let minimum_channel = red.min(green.min(blue));
            let delta = maximum_channel - minimum_channel;

            if delta == 0.0 {
                return 0.0;
            }

            let sector = if maximum_channel == red {
                ((green - blue) / delta) % 6.0
            } else if maximum_channel == green {
                (blue - red) / delta + 2.0
            } else {
                (red - green) / delta + 4.0
            };

            let mut hue_degrees = sector * 60.0;
            if hue_degrees < 0.0 {
                hue_degrees += 360.0;
            }
            hue_degrees
        }

        /// HSL lightness (midpoint of max and min channel), in [0, 1].
        pub fn lightness(&self) -> f64 {
            let (red, green, blue) = self.normalized();
            (red.max(green.max(blue)) + red.min(green.min(blue))) * 0.5
        }

        /// HSL saturation: chroma / (1 - |2L - 1|), in [0, 1].
        pub fn saturation(&self) -> f64 {
            let (red, green, blue) = self.normalized();
            let delta = red.max(green.max(blue)) - red.min(green.min(blue));
            if delta == 0.0 {
                return 0.0;
            }
            delta / (1.0 - (2.0 * self.lightness() - 1.0).abs())
        }

        pub fn to_hsl(&self) -> HslVector {
            convert(*self)
        }
    }

    impl From<[Channel; 3]> for RgbVector {
        fn from(channels: [Channel; 3]) -> Self {
            Self::new(channels[0], channels[1], channels[2])
        }
    }

    impl From<RgbVector> for [Channel; 3] {
        fn from(rgb: RgbVector) -> Self {
            [rgb.red, rgb.green, rgb.blue]
        }
    }

    impl TryFrom<&[i64]> for RgbVector {
        type Error = DiffError;

        fn try_from(components: &[i64]) -> Result<Self> {
            Self::try_from_components(components)
        }
    }

    /// Converts an RGB sample into rounded HSL.
    pub fn convert(rgb: RgbVector) -> HslVector {
        // Values just below 360 can round up onto the wheel's origin.
        let hue = match rgb.hue_degrees().round() as Hue {
            360 => 0,
            hue => hue,
        };
        HslVector {
            hue,
            saturation: (rgb.saturation() * 100.0).round() as SaturationHSL,
            lightness: (rgb.lightness() * 100.0).round() as LightnessHSL,
        }
    }

    /// Validating entry point for callers holding untyped components.
    pub fn convert_components(components: &[i64]) -> Result<HslVector> {
        RgbVector::try_from_components(components).map(convert)
    }
}

#[cfg(test)]
mod tests {
    use super::pixel::*;
    use crate::error::DiffError;
    use rstest::rstest;

    #[rstest]
    #[case([255, 0, 0], [0, 100, 50])]
    #[case([0, 255, 0], [120, 100, 50])]
    #[case([0, 0, 255], [240, 100, 50])]
    #[case([0, 0, 0], [0, 0, 0])]
    #[case([255, 255, 255], [0, 0, 100])]
    #[case([255, 0, 128], [330, 100, 50])]
    #[case([128, 0, 255], [270, 100, 50])]
    #[case([200, 100, 50], [20, 60, 49])]
    #[case([64, 181, 162], [170, 48, 48])]
    #[case([243, 114, 200], [320, 84, 70])]
    fn converts_known_colours(#[case] rgb: [u8; 3], #[case] expected: [u16; 3]) {
        let hsl = convert(RgbVector::from(rgb));
        assert_eq!(
            [hsl.hue, hsl.saturation as u16, hsl.lightness as u16],
            expected
        );
    }

    #[test]
    fn negative_hue_wraps_around_the_wheel() {
        // Red-dominant with blue > green lands in the negative sector.
        let hsl = convert(RgbVector::new(243, 114, 157));
        assert_eq!(hsl.hue, 340);
    }

    #[test]
    fn hue_rounding_up_to_360_becomes_zero() {
        let rgb = RgbVector::new(255, 0, 1);
        assert!(rgb.hue_degrees() > 359.5);
        assert_eq!(convert(rgb).hue, 0);
    }

    #[test]
    fn greys_have_no_hue_or_saturation() {
        for value in 0..=255u8 {
            let hsl = convert(RgbVector::new(value, value, value));
            assert_eq!(hsl.hue, 0);
            assert_eq!(hsl.saturation, 0);
            let expected = (value as f64 / 255.0 * 100.0).round() as u8;
            assert_eq!(hsl.lightness, expected, "grey {value}");
        }
    }

    #[test]
    fn hue_stays_on_the_wheel() {
        for red in (0..=255u8).step_by(15) {
            for green in (0..=255u8).step_by(15) {
                for blue in (0..=255u8).step_by(15) {
                    let hsl = convert(RgbVector::new(red, green, blue));
                    assert!(hsl.hue < 360);
                    assert!(hsl.saturation <= 100);
                    assert!(hsl.lightness <= 100);
                }
            }
        }
    }

    #[rstest]
    #[case(vec![-64, 64, 64])]
    #[case(vec![255, 255, 512])]
    #[case(vec![0, 0])]
    #[case(vec![0, 0, 0, 0])]
    #[case(vec![])]
    fn rejects_malformed_components(#[case] components: Vec<i64>) {
        assert!(matches!(
            convert_components(&components),
            Err(DiffError::InvalidInput(_))
        ));
    }

    #[test]
    fn rejects_fractional_components() {
        assert!(RgbVector::from_f64s(&[127.0, 127.5, 127.0]).is_err());
        assert!(RgbVector::from_f64s(&[f64::NAN, 0.0, 0.0]).is_err());
        assert_eq!(
            RgbVector::from_f64s(&[127.0, 64.0, 0.0]).unwrap(),
            RgbVector::new(127, 64, 0)
        );
    }

    #[test]
    fn from_rgba_drops_alpha_and_rejects_short_slices() {
        assert_eq!(
            RgbVector::from_rgba(&[10, 20, 30, 40]).unwrap(),
            RgbVector::new(10, 20, 30)
        );
        assert_eq!(
            RgbVector::from_rgba(&[10, 20, 30]).unwrap(),
            RgbVector::new(10, 20, 30)
        );
        assert!(matches!(
            RgbVector::from_rgba(&[10, 20]),
            Err(DiffError::InvalidInput(_))
        ));
        assert!(RgbVector::from_rgba(&[]).is_err());
    }

    #[test]
    fn accepts_components_at_the_bounds() {
        let hsl = convert_components(&[0, 255, 0]).unwrap();
        assert_eq!(hsl.hue, 120);
    }
}

// -----------------------------------------------------------------------------
// Glossary: Colour Terms
//
// - Hue: Angle on the colour wheel (0°–360°) describing the colour family. Red sits
//   at 0°, green at 120°, blue at 240°.
//
// - Saturation (HSL): Chroma divided by (1 − |2L − 1|). Zero for greys, 100 for fully
//   vivid colours at any lightness.
//
// - Lightness (HSL): Midpoint of the maximum and minimum channels. 0 is black, 100 is
//   white.
//
// - Chroma: max(R,G,B) − min(R,G,B). Called `delta` in the conversion.

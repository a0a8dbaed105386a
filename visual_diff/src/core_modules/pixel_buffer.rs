// THEORY:
// `PixelBuffer` is the "dumb" data container of the comparison engine: a rectangular
// grid of RGBA pixels stored as a flat, row-major byte vector, four bytes per pixel.
// It is the shape every image takes once it has been decoded, and the shape of the
// diff the engine writes back out.
//
// A buffer is validated once, on construction (`data.len() == width * height * 4`),
// so the diff loop can index it without bounds bookkeeping.

pub mod pixel_buffer {
    use crate::core_modules::pixel::pixel::{Channel, RgbVector};
    use crate::error::{DiffError, Result};

    pub const CHANNELS: usize = 4;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct PixelBuffer {
        width: u32,
        height: u32,
        data: Vec<Channel>,
    }

    impl PixelBuffer {
        pub fn new(width: u32, height: u32, data: Vec<Channel>) -> Result<Self> {
            let expected = Self::byte_len(width, height)?;
            if data.len() != expected {
                return Err(DiffError::invalid(format!(
                    "pixel buffer for {width}x{height} needs {expected} bytes, got {}",
                    data.len()
                )));
            }
            Ok(Self {
                width,
                height,
                data,
            })
        }

        /// A zeroed (transparent black) buffer, used as the output surface of a diff.
        pub fn blank(width: u32, height: u32) -> Result<Self> {
            let len = Self::byte_len(width, height)?;
            Ok(Self {
                width,
                height,
                data: vec![0; len],
            })
        }

        /// Every pixel set to the same RGBA value.
        pub fn filled(width: u32, height: u32, rgba: [Channel; CHANNELS]) -> Result<Self> {
            let mut buffer = Self::blank(width, height)?;
            for pixel in buffer.data.chunks_exact_mut(CHANNELS) {
                pixel.copy_from_slice(&rgba);
            }
            Ok(buffer)
        }

        fn byte_len(width: u32, height: u32) -> Result<usize> {
            (width as usize)
                .checked_mul(height as usize)
                .and_then(|pixels| pixels.checked_mul(CHANNELS))
                .ok_or_else(|| DiffError::invalid(format!("image {width}x{height} is too large")))
        }

        pub fn width(&self) -> u32 {
            self.width
        }

        pub fn height(&self) -> u32 {
            self.height
        }

        pub fn dimensions(&self) -> (u32, u32) {
            (self.width, self.height)
        }

        pub fn pixel_count(&self) -> usize {
            self.data.len() / CHANNELS
        }

        pub fn as_bytes(&self) -> &[Channel] {
            &self.data
        }

        pub fn into_bytes(self) -> Vec<Channel> {
            self.data
        }

        /// Row-major iterator over RGBA pixels.
        pub fn pixels(&self) -> std::slice::ChunksExact<'_, Channel> {
            self.data.chunks_exact(CHANNELS)
        }

        pub(crate) fn pixels_mut(&mut self) -> std::slice::ChunksExactMut<'_, Channel> {
            self.data.chunks_exact_mut(CHANNELS)
        }

        pub fn pixel(&self, x: u32, y: u32) -> Option<[Channel; CHANNELS]> {
            if x >= self.width || y >= self.height {
                return None;
            }
            let offset = (y as usize * self.width as usize + x as usize) * CHANNELS;
            let mut rgba = [0; CHANNELS];
            rgba.copy_from_slice(&self.data[offset..offset + CHANNELS]);
            Some(rgba)
        }

        pub fn rgb(&self, x: u32, y: u32) -> Option<RgbVector> {
            let [red, green, blue, _] = self.pixel(x, y)?;
            Some(RgbVector::new(red, green, blue))
        }

        pub fn set_pixel(&mut self, x: u32, y: u32, rgba: [Channel; CHANNELS]) -> Result<()> {
            if x >= self.width || y >= self.height {
                return Err(DiffError::invalid(format!(
                    "pixel ({x}, {y}) is outside a {}x{} buffer",
                    self.width, self.height
                )));
            }
            let offset = (y as usize * self.width as usize + x as usize) * CHANNELS;
            self.data[offset..offset + CHANNELS].copy_from_slice(&rgba);
            Ok(())
        }
    }
}

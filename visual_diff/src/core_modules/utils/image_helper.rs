pub mod image_helper {
    use crate::core_modules::pixel_buffer::pixel_buffer::PixelBuffer;
    use image::error::{ImageError, ImageResult, ParameterError, ParameterErrorKind};
    use image::ImageEncoder;
    use std::path::Path;

    /// Writes an RGBA buffer (typically a diff) as a PNG file.
    pub fn save(path: impl AsRef<Path>, buffer: &PixelBuffer) -> ImageResult<()> {
        let output = std::fs::File::create(path)?;
        let encoder = image::codecs::png::PngEncoder::new(output);

        encoder.write_image(
            buffer.as_bytes(),
            buffer.width(),
            buffer.height(),
            image::ExtendedColorType::Rgba8,
        )?;

        Ok(())
    }

    /// Decodes an encoded image held in memory into RGBA8.
    pub fn decode(bytes: &[u8]) -> ImageResult<PixelBuffer> {
        into_pixel_buffer(image::load_from_memory(bytes)?)
    }

    /// Opens and decodes an image file into RGBA8.
    pub fn open(path: impl AsRef<Path>) -> ImageResult<PixelBuffer> {
        into_pixel_buffer(image::open(path)?)
    }

    fn into_pixel_buffer(image: image::DynamicImage) -> ImageResult<PixelBuffer> {
        let rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();
        PixelBuffer::new(width, height, rgba.into_raw()).map_err(|_| {
            ImageError::Parameter(ParameterError::from_kind(ParameterErrorKind::DimensionMismatch))
        })
    }
}

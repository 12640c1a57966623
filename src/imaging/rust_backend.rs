//! Pure Rust image backend built on the `image` crate.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Probe | `image::image_dimensions` (header only, no full decode) |
//! | Decode | `image::ImageReader` with format guessed from content |
//! | Resize | `DynamicImage::resize_exact` (aspect ratio ignored) |
//! | Encode | `DynamicImage::write_to`, format from the destination extension |
//!
//! DDS can be read (so DDS templates probe fine) but not written; pairing a
//! DDS template with this backend fails the conversion. Use the ImageMagick
//! backend for those trees.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::params::ConvertParams;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::io::BufWriter;
use std::path::Path;

/// Pure Rust backend using the `image` crate ecosystem.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Load and decode an image, sniffing the format from content rather than
/// trusting the extension.
fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    ImageReader::open(path)?
        .with_guessed_format()?
        .decode()
        .map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to decode {}: {}", path.display(), e))
        })
}

/// Pick the output format from the destination extension.
fn output_format(path: &Path) -> Result<ImageFormat, BackendError> {
    let format = ImageFormat::from_path(path).map_err(|_| {
        BackendError::ProcessingFailed(format!(
            "Unsupported output format: {}",
            path.display()
        ))
    })?;
    if !format.writing_enabled() {
        return Err(BackendError::ProcessingFailed(format!(
            "Cannot encode {:?} (destination {})",
            format,
            path.display()
        )));
    }
    Ok(format)
}

/// Adapt the colour mode to what the destination format can hold.
fn fit_color_mode(img: DynamicImage, format: ImageFormat) -> DynamicImage {
    match format {
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(img.to_rgb8()),
        ImageFormat::Bmp | ImageFormat::Tga if img.color().has_alpha() => {
            DynamicImage::ImageRgba8(img.to_rgba8())
        }
        ImageFormat::Bmp | ImageFormat::Tga => DynamicImage::ImageRgb8(img.to_rgb8()),
        ImageFormat::WebP | ImageFormat::Gif => DynamicImage::ImageRgba8(img.to_rgba8()),
        _ => img,
    }
}

fn save_image(img: &DynamicImage, path: &Path, format: ImageFormat) -> Result<(), BackendError> {
    let file = std::fs::File::create(path)?;
    let mut writer = BufWriter::new(file);
    img.write_to(&mut writer, format).map_err(|e| {
        BackendError::ProcessingFailed(format!("Failed to encode {}: {}", path.display(), e))
    })
}

impl ImageBackend for RustBackend {
    fn probe(&self, path: &Path) -> Result<Dimensions, BackendError> {
        let (width, height) = image::image_dimensions(path).map_err(|e| BackendError::Probe {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Ok(Dimensions { width, height })
    }

    fn convert(&self, params: &ConvertParams) -> Result<(), BackendError> {
        // Fail on an unwritable destination before paying for the decode.
        let format = output_format(&params.output)?;
        let img = load_image(&params.source)?;
        let resized = img.resize_exact(params.width, params.height, params.filter.to_image_filter());
        save_image(&fit_color_mode(resized, format), &params.output, format)
    }
}

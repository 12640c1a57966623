//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the batch (which decides which input lands on which
//! template) and the [`backend`](super::backend) (which does the pixel work).
//!
//! - [`ResizeFilter`]: resampling kernel, shared by both backends.
//! - [`ConvertParams`]: source, destination and exact target size for one conversion.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Resampling filter used when stretching an input onto a template's size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ResizeFilter {
    Nearest,
    Triangle,
    CatmullRom,
    Gaussian,
    #[default]
    Lanczos3,
}

impl ResizeFilter {
    pub fn to_image_filter(self) -> image::imageops::FilterType {
        use image::imageops::FilterType;
        match self {
            Self::Nearest => FilterType::Nearest,
            Self::Triangle => FilterType::Triangle,
            Self::CatmullRom => FilterType::CatmullRom,
            Self::Gaussian => FilterType::Gaussian,
            Self::Lanczos3 => FilterType::Lanczos3,
        }
    }

    /// Name understood by ImageMagick's `-filter` option.
    pub fn magick_name(self) -> &'static str {
        match self {
            Self::Nearest => "Point",
            Self::Triangle => "Triangle",
            Self::CatmullRom => "Catrom",
            Self::Gaussian => "Gaussian",
            Self::Lanczos3 => "Lanczos",
        }
    }
}

/// Parameters for one exact-size conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertParams {
    pub source: PathBuf,
    pub output: PathBuf,
    /// Target dimensions. The input's aspect ratio is not preserved.
    pub width: u32,
    pub height: u32,
    pub filter: ResizeFilter,
}

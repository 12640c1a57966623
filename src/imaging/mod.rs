//! Image backends.
//!
//! | Operation | [`RustBackend`] | [`MagickBackend`] |
//! |---|---|---|
//! | **Probe** | `image::image_dimensions` | `magick identify -format %wx%h` |
//! | **Convert** | `resize_exact` + encode by extension | `magick -resize WxH!` |
//!
//! The module is split into:
//! - **Parameters**: data describing a conversion
//! - **Backend**: the [`ImageBackend`] trait plus its two implementations

pub mod backend;
pub mod magick_backend;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use magick_backend::MagickBackend;
pub use params::{ConvertParams, ResizeFilter};
pub use rust_backend::RustBackend;

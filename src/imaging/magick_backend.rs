//! ImageMagick backend: shells out to `magick` (or the ImageMagick 6
//! `identify` / `convert` pair).
//!
//! | Operation | Command |
//! |---|---|
//! | Probe | `<identify> -format "%wx%h\n" <path>` |
//! | Convert | `<convert> <src> -filter <F> -resize WxH! <dst>` |
//!
//! The `!` geometry flag forces the exact size. The destination extension
//! picks the output format, so this backend can write DDS textures, which the
//! `image` crate cannot.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::params::ConvertParams;
use std::ffi::OsString;
use std::path::Path;
use std::process::Command;

/// Backend driving the ImageMagick command line.
#[derive(Debug, Clone)]
pub struct MagickBackend {
    identify: Vec<String>,
    convert: Vec<String>,
}

impl MagickBackend {
    /// ImageMagick 7 defaults: `magick identify` and `magick`.
    pub fn new() -> Self {
        Self::with_commands(
            vec!["magick".into(), "identify".into()],
            vec!["magick".into()],
        )
    }

    /// Use custom command prefixes, e.g. `["identify"]` / `["convert"]` for
    /// ImageMagick 6. Both prefixes must be non-empty; config validation
    /// guarantees this.
    pub fn with_commands(identify: Vec<String>, convert: Vec<String>) -> Self {
        Self { identify, convert }
    }

    fn run(&self, prefix: &[String], args: Vec<OsString>) -> Result<String, BackendError> {
        let (program, fixed) = prefix.split_first().ok_or_else(|| {
            BackendError::ProcessingFailed("empty ImageMagick command".to_string())
        })?;
        let out = Command::new(program).args(fixed).args(args).output()?;
        if !out.status.success() {
            return Err(BackendError::ToolFailed {
                program: prefix.join(" "),
                status: out.status.to_string(),
                stderr: String::from_utf8_lossy(&out.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&out.stdout).into_owned())
    }
}

impl Default for MagickBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse `identify` output, which must contain exactly one `<width>x<height>`
/// token. Multi-frame files print one token per frame and are rejected.
pub fn parse_geometry(output: &str) -> Result<Dimensions, String> {
    let mut tokens = output.split_whitespace();
    let token = tokens
        .next()
        .ok_or_else(|| "identify printed nothing".to_string())?;
    if tokens.next().is_some() {
        return Err(format!(
            "expected a single WxH token, got {:?}",
            output.trim()
        ));
    }

    let (w, h) = token
        .split_once('x')
        .ok_or_else(|| format!("not a WxH token: {token:?}"))?;
    let width: u32 = w
        .parse()
        .map_err(|_| format!("bad width in {token:?}"))?;
    let height: u32 = h
        .parse()
        .map_err(|_| format!("bad height in {token:?}"))?;
    if width == 0 || height == 0 {
        return Err(format!("zero-sized image: {token}"));
    }
    Ok(Dimensions { width, height })
}

impl ImageBackend for MagickBackend {
    fn probe(&self, path: &Path) -> Result<Dimensions, BackendError> {
        let probe_err = |reason: String| BackendError::Probe {
            path: path.display().to_string(),
            reason,
        };
        let stdout = self
            .run(
                &self.identify,
                vec!["-format".into(), "%wx%h\n".into(), path.into()],
            )
            .map_err(|e| probe_err(e.to_string()))?;
        parse_geometry(&stdout).map_err(probe_err)
    }

    fn convert(&self, params: &ConvertParams) -> Result<(), BackendError> {
        let geometry = format!("{}x{}!", params.width, params.height);
        self.run(
            &self.convert,
            vec![
                params.source.as_os_str().to_owned(),
                "-filter".into(),
                params.filter.magick_name().into(),
                "-resize".into(),
                geometry.into(),
                params.output.as_os_str().to_owned(),
            ],
        )?;
        Ok(())
    }
}

//! Image backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the two operations the batch needs from
//! an image tool: probe (read pixel dimensions) and convert (exact resize plus
//! format conversion).
//!
//! Two implementations ship:
//! - [`RustBackend`](super::rust_backend::RustBackend): the `image` crate,
//!   in-process, statically linked.
//! - [`MagickBackend`](super::magick_backend::MagickBackend): shells out to
//!   ImageMagick for formats the `image` crate cannot write (DDS and friends).

use super::params::ConvertParams;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
    #[error("Could not read dimensions of {path}: {reason}")]
    Probe { path: String, reason: String },
    #[error("{program} exited with {status}: {stderr}")]
    ToolFailed {
        program: String,
        status: String,
        stderr: String,
    },
}

/// Pixel dimensions reported by a probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl std::fmt::Display for Dimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Trait for image backends.
///
/// `Sync` because conversions fan out over rayon workers that share one
/// backend reference.
pub trait ImageBackend: Sync {
    /// Read an image's pixel dimensions without converting it.
    fn probe(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Resize `params.source` to exactly `params.width` x `params.height` and
    /// write it to `params.output` in the format its extension names.
    fn convert(&self, params: &ConvertParams) -> Result<(), BackendError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    /// Mock backend that answers probes from a table keyed by file name and
    /// records every call. Uses Mutex so it is Sync and works under rayon.
    ///
    /// Files missing from the table fail to probe, which is how tests model a
    /// corrupted template.
    #[derive(Default)]
    pub struct MockBackend {
        pub dimensions: HashMap<String, Dimensions>,
        pub failing_sources: HashSet<String>,
        pub operations: Mutex<Vec<RecordedOp>>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Probe(String),
        Convert {
            source: String,
            output: String,
            width: u32,
            height: u32,
        },
    }

    fn file_name(path: &Path) -> String {
        path.file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    impl MockBackend {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_dimensions(entries: &[(&str, u32, u32)]) -> Self {
            Self {
                dimensions: entries
                    .iter()
                    .map(|(name, width, height)| {
                        (
                            name.to_string(),
                            Dimensions {
                                width: *width,
                                height: *height,
                            },
                        )
                    })
                    .collect(),
                ..Self::default()
            }
        }

        /// Make conversions of the named source file fail.
        pub fn failing_for(mut self, source_name: &str) -> Self {
            self.failing_sources.insert(source_name.to_string());
            self
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }

        pub fn probe_count(&self, name: &str) -> usize {
            self.get_operations()
                .iter()
                .filter(|op| matches!(op, RecordedOp::Probe(p) if p.ends_with(name)))
                .count()
        }

        pub fn converts(&self) -> Vec<RecordedOp> {
            self.get_operations()
                .into_iter()
                .filter(|op| matches!(op, RecordedOp::Convert { .. }))
                .collect()
        }
    }

    impl ImageBackend for MockBackend {
        fn probe(&self, path: &Path) -> Result<Dimensions, BackendError> {
            self.operations
                .lock()
                .unwrap()
                .push(RecordedOp::Probe(path.to_string_lossy().to_string()));

            self.dimensions
                .get(&file_name(path))
                .copied()
                .ok_or_else(|| BackendError::Probe {
                    path: path.display().to_string(),
                    reason: "no mock dimensions".to_string(),
                })
        }

        fn convert(&self, params: &ConvertParams) -> Result<(), BackendError> {
            self.operations.lock().unwrap().push(RecordedOp::Convert {
                source: params.source.to_string_lossy().to_string(),
                output: params.output.to_string_lossy().to_string(),
                width: params.width,
                height: params.height,
            });
            if self.failing_sources.contains(&file_name(&params.source)) {
                return Err(BackendError::ProcessingFailed(format!(
                    "mock failure for {}",
                    params.source.display()
                )));
            }
            Ok(())
        }
    }

    #[test]
    fn mock_probes_known_files() {
        let backend = MockBackend::with_dimensions(&[("wall.dds", 64, 32)]);

        let dims = backend.probe(Path::new("/templates/wall.dds")).unwrap();
        assert_eq!(dims, Dimensions { width: 64, height: 32 });

        let ops = backend.get_operations();
        assert_eq!(ops.len(), 1);
        assert!(matches!(&ops[0], RecordedOp::Probe(p) if p == "/templates/wall.dds"));
    }

    #[test]
    fn mock_rejects_unknown_files() {
        let backend = MockBackend::new();
        let result = backend.probe(Path::new("/templates/broken.dds"));
        assert!(matches!(result, Err(BackendError::Probe { .. })));
    }

    #[test]
    fn mock_records_convert_and_fails_on_request() {
        let backend = MockBackend::new().failing_for("bad.jpg");
        let params = |src: &str| ConvertParams {
            source: src.into(),
            output: "/out/wall.png".into(),
            width: 128,
            height: 64,
            filter: Default::default(),
        };

        backend.convert(&params("/in/good.jpg")).unwrap();
        assert!(backend.convert(&params("/in/bad.jpg")).is_err());

        let converts = backend.converts();
        assert_eq!(converts.len(), 2);
        assert!(matches!(
            &converts[0],
            RecordedOp::Convert {
                width: 128,
                height: 64,
                ..
            }
        ));
    }

    #[test]
    fn dimensions_display_as_geometry() {
        let dims = Dimensions {
            width: 640,
            height: 480,
        };
        assert_eq!(dims.to_string(), "640x480");
    }
}

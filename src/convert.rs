//! Conversion invoker: one backend call per pair.

use crate::imaging::{BackendError, ConvertParams, ImageBackend, ResizeFilter};
use crate::pairing::Pair;

/// Resize `pair.input` onto its template's exact dimensions at `pair.output`,
/// creating missing destination directories first.
pub fn convert_pair(
    backend: &impl ImageBackend,
    pair: &Pair,
    filter: ResizeFilter,
) -> Result<(), BackendError> {
    if let Some(parent) = pair.output.parent() {
        std::fs::create_dir_all(parent)?;
    }
    backend.convert(&ConvertParams {
        source: pair.input.clone(),
        output: pair.output.clone(),
        width: pair.template.width,
        height: pair.template.height,
        filter,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::RustBackend;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use crate::matcher::TemplateDescriptor;
    use crate::test_helpers::write_test_jpeg;
    use std::path::Path;
    use tempfile::TempDir;

    fn pair(input: &Path, output: &Path, width: u32, height: u32) -> Pair {
        Pair {
            index: 1,
            input: input.to_path_buf(),
            template: TemplateDescriptor {
                path: "/templates/t.png".into(),
                width,
                height,
            },
            output: output.to_path_buf(),
        }
    }

    #[test]
    fn creates_missing_destination_directories() {
        let tmp = TempDir::new().unwrap();
        let output = tmp.path().join("deep/nested/dir/t.png");
        let backend = MockBackend::new();

        convert_pair(
            &backend,
            &pair(Path::new("/in/a.jpg"), &output, 32, 16),
            ResizeFilter::default(),
        )
        .unwrap();

        assert!(tmp.path().join("deep/nested/dir").is_dir());
        assert_eq!(
            backend.converts(),
            vec![RecordedOp::Convert {
                source: "/in/a.jpg".into(),
                output: output.to_string_lossy().to_string(),
                width: 32,
                height: 16,
            }]
        );
    }

    #[test]
    fn backend_failure_is_returned() {
        let tmp = TempDir::new().unwrap();
        let backend = MockBackend::new().failing_for("a.jpg");
        let result = convert_pair(
            &backend,
            &pair(Path::new("/in/a.jpg"), &tmp.path().join("t.png"), 8, 8),
            ResizeFilter::default(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn output_matches_template_dimensions_regardless_of_aspect() {
        let tmp = TempDir::new().unwrap();
        let backend = RustBackend::new();

        for (i, (w, h)) in [(400, 100), (100, 400), (333, 333)].into_iter().enumerate() {
            let input = tmp.path().join(format!("in-{i}.jpg"));
            write_test_jpeg(&input, w, h);
            let output = tmp.path().join(format!("out/{i}.png"));

            convert_pair(&backend, &pair(&input, &output, 96, 48), ResizeFilter::Triangle)
                .unwrap();
            assert_eq!(image::image_dimensions(&output).unwrap(), (96, 48));
        }
    }
}

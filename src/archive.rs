use crate::{error::Result, models::GenerationResult};
use std::io::{Cursor, Write};
use zip::{write::SimpleFileOptions, CompressionMethod, ZipWriter};

/// Download name offered to the presentation layer.
pub const ARCHIVE_FILE_NAME: &str = "jewelbench_variations.zip";
pub const ARCHIVE_MIME: &str = "application/zip";

/// Name of the `index`-th (0-based) entry in an archive of `total` images.
pub fn entry_name(index: usize, total: usize, extension: &str) -> String {
    let width = total.to_string().len().max(3);
    format!("variation_{:0width$}.{}", index + 1, extension, width = width)
}

/// Package accepted images into a zip, in order, one entry per image.
///
/// Images are stored without recompression. An empty slice yields a valid empty archive.
pub fn build(results: &[GenerationResult]) -> Result<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

    for (index, result) in results.iter().enumerate() {
        let name = entry_name(index, results.len(), result.extension());
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        writer.start_file(name, options)?;
        writer.write_all(&result.image_bytes)?;
    }

    let bytes = writer.finish()?.into_inner();
    log::info!(
        "Built archive with {} images ({} bytes)",
        results.len(),
        bytes.len()
    );
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GenerationRequest;
    use std::collections::HashSet;
    use std::io::Read;
    use std::sync::Arc;
    use zip::ZipArchive;

    fn results(count: usize) -> Vec<GenerationResult> {
        let request = Arc::new(GenerationRequest::new(Some("ring".into()), None, None).unwrap());
        (0..count)
            .map(|i| {
                let mime = if i % 2 == 0 { "image/jpeg" } else { "image/png" };
                GenerationResult::from_bytes(format!("image-{}", i).into_bytes(), mime, request.clone())
                    .unwrap()
            })
            .collect()
    }

    #[test]
    fn test_entry_names() {
        assert_eq!(entry_name(0, 25, "jpg"), "variation_001.jpg");
        assert_eq!(entry_name(99, 100, "png"), "variation_100.png");
        assert_eq!(entry_name(0, 1000, "jpg"), "variation_0001.jpg");
    }

    #[test]
    fn test_empty_archive_is_valid() {
        let bytes = build(&[]).unwrap();
        let archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 0);
    }

    #[test]
    fn test_archive_has_one_named_entry_per_result() {
        let results = results(25);
        let bytes = build(&results).unwrap();
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 25);

        let mut names = HashSet::new();
        for i in 0..archive.len() {
            let mut entry = archive.by_index(i).unwrap();
            names.insert(entry.name().to_string());

            let mut content = Vec::new();
            entry.read_to_end(&mut content).unwrap();
            assert_eq!(content, results[i].image_bytes);
        }
        assert_eq!(names.len(), 25);
        assert!(names.contains("variation_001.jpg"));
        assert!(names.contains("variation_002.png"));
    }
}

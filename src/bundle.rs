//! Packaging of exported scenario files.

use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use flate2::Compression;
use flate2::write::GzEncoder;
use tracing::{debug, info};

/// Gzip-compresses every CSV in `src_dir` into `package_dir`, keeping the
/// original file name with a `.gz` suffix. Returns the number of files
/// packaged.
pub fn bundle_dir(src_dir: &Path, package_dir: &Path) -> Result<usize> {
    fs::create_dir_all(package_dir)
        .with_context(|| format!("failed creating {}", package_dir.display()))?;

    let mut packaged = 0;
    for entry in
        fs::read_dir(src_dir).with_context(|| format!("failed reading {}", src_dir.display()))?
    {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("csv") {
            continue;
        }

        let contents = fs::read(&path)?;
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&contents)?;
        let compressed = encoder.finish()?;

        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("assignment.csv");
        let target = package_dir.join(format!("{file_name}.gz"));
        fs::write(&target, compressed)?;
        debug!(file = %target.display(), "Packaged scenario file");
        packaged += 1;
    }

    info!(packaged, dir = %package_dir.display(), "Packaging complete");
    Ok(packaged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use std::io::Read;

    #[test]
    fn test_bundle_compresses_only_csvs() {
        let src = std::env::temp_dir().join("grade_curver_test_bundle_src");
        let dst = std::env::temp_dir().join("grade_curver_test_bundle_dst");
        let _ = fs::remove_dir_all(&src);
        let _ = fs::remove_dir_all(&dst);
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("scenario_1.csv"), "Raw Score,Letter Grade,GPA Value\n97,A+,4.333\n")
            .unwrap();
        fs::write(src.join("notes.txt"), "ignored").unwrap();

        let packaged = bundle_dir(&src, &dst).unwrap();
        assert_eq!(packaged, 1);

        let compressed = fs::read(dst.join("scenario_1.csv.gz")).unwrap();
        let mut decoder = GzDecoder::new(&compressed[..]);
        let mut restored = String::new();
        decoder.read_to_string(&mut restored).unwrap();
        assert!(restored.contains("97,A+,4.333"));

        fs::remove_dir_all(&src).unwrap();
        fs::remove_dir_all(&dst).unwrap();
    }

    #[test]
    fn test_missing_source_dir_is_an_error() {
        let src = std::env::temp_dir().join("grade_curver_test_bundle_missing");
        let dst = std::env::temp_dir().join("grade_curver_test_bundle_missing_dst");
        let _ = fs::remove_dir_all(&src);
        let result = bundle_dir(&src, &dst);
        assert!(result.is_err());
        let _ = fs::remove_dir_all(&dst);
    }
}

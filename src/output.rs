//! Output formatting and persistence for grade assignments.
//!
//! Supports CSV export/import of assignment rows and JSON serialization of
//! reports.

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::assign::ScoreRow;
use serde::Serialize;
use std::fs::File;
use std::path::Path;

/// Column order shared by the writer and every downstream consumer.
const HEADER: [&str; 3] = ["Raw Score", "Letter Grade", "GPA Value"];

/// Writes assignment rows as CSV, one row per student, GPA fixed to three
/// decimals.
pub fn write_assignment(path: &Path, rows: &[ScoreRow]) -> Result<()> {
    debug!(path = %path.display(), rows = rows.len(), "Writing assignment CSV");

    let file =
        File::create(path).with_context(|| format!("failed creating {}", path.display()))?;
    let mut writer = csv::Writer::from_writer(file);

    writer.write_record(HEADER)?;
    for row in rows {
        writer.write_record([
            row.score.to_string(),
            row.grade.clone(),
            format!("{:.3}", row.gpa),
        ])?;
    }
    writer.flush()?;

    Ok(())
}

/// Reads assignment rows back from a CSV produced by [`write_assignment`] (or
/// any file with the same header).
pub fn read_assignment(path: &Path) -> Result<Vec<ScoreRow>> {
    let file = File::open(path).with_context(|| format!("failed opening {}", path.display()))?;
    let mut reader = csv::Reader::from_reader(file);

    let mut rows = Vec::new();
    for result in reader.deserialize() {
        let row: ScoreRow = result?;
        rows.push(row);
    }
    Ok(rows)
}

/// Logs a value as pretty-printed JSON.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Writes a value as pretty-printed JSON to a file.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("failed creating {}", path.display()))?;
    serde_json::to_writer_pretty(file, value)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs;
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        env::temp_dir().join(name)
    }

    fn sample_rows() -> Vec<ScoreRow> {
        vec![
            ScoreRow { score: 97, grade: "A+".to_string(), gpa: 4.333 },
            ScoreRow { score: 90, grade: "A".to_string(), gpa: 4.0 },
            ScoreRow { score: 51, grade: "F".to_string(), gpa: 0.0 },
        ]
    }

    #[test]
    fn test_roundtrip_preserves_rows() {
        let path = temp_path("grade_curver_test_roundtrip.csv");
        let rows = sample_rows();
        write_assignment(&path, &rows).unwrap();

        let loaded = read_assignment(&path).unwrap();
        assert_eq!(loaded, rows);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_gpa_is_three_decimals() {
        let path = temp_path("grade_curver_test_decimals.csv");
        write_assignment(&path, &sample_rows()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("90,A,4.000"));
        assert!(content.contains("51,F,0.000"));

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_header_written_once() {
        let path = temp_path("grade_curver_test_header.csv");
        write_assignment(&path, &sample_rows()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let header_count = content.lines().filter(|l| l.contains("Raw Score")).count();
        assert_eq!(header_count, 1);
        // 1 header + 3 data rows
        assert_eq!(content.lines().count(), 4);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_print_json_does_not_panic() {
        print_json(&sample_rows().len()).unwrap();
    }

    #[test]
    fn test_write_json_creates_file() {
        let path = temp_path("grade_curver_test_report.json");
        write_json(&path, &vec![1, 2, 3]).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains('1'));
        fs::remove_file(&path).unwrap();
    }
}

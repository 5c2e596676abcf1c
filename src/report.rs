use crate::bench::BenchRecord;
use itertools::Itertools;
use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};
use tracing::info;

pub const CSV_HEADER: &str = "ring_dim,size,variant,time_ms,passed";

#[derive(thiserror::Error, Debug)]
pub enum ReportError {
    #[error("cannot write report {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub fn write_records<W: Write>(writer: &mut W, records: &[BenchRecord]) -> io::Result<()> {
    writeln!(writer, "{CSV_HEADER}")?;
    for record in records {
        writeln!(
            writer,
            "{},{},{},{:.3},{}",
            record.ring_dim, record.size, record.variant, record.elapsed_ms, record.passed
        )?;
    }
    writer.flush()
}

/// Writes `records` to `path`, replacing any existing file.
pub fn write_csv(path: &Path, records: &[BenchRecord]) -> Result<(), ReportError> {
    let to_error = |source: io::Error| ReportError::Io { path: path.to_path_buf(), source };
    let file = File::create(path).map_err(to_error)?;
    write_records(&mut BufWriter::new(file), records).map_err(to_error)?;
    info!("{} records written to {:?}", records.len(), path);
    Ok(())
}

fn render_rows(rows: &[Vec<f64>]) -> String {
    let cells: Vec<Vec<String>> =
        rows.iter().map(|row| row.iter().map(|v| format!("{v:.4}")).collect()).collect();
    let width = cells.iter().flatten().map(String::len).max().unwrap_or(0);
    let columns = cells.iter().map(Vec::len).max().unwrap_or(0);
    let border = format!("+{}+", vec!["-".repeat(width + 2); columns].join("+"));
    let mut out = border.clone();
    for row in &cells {
        let line = row.iter().map(|cell| format!(" {cell:>width$} ")).join("|");
        out.push_str(&format!("\n|{line}|\n{border}"));
    }
    out
}

/// Boxed table of a matrix, one row per line.
pub fn render_matrix(matrix: &[Vec<f64>]) -> String {
    render_rows(matrix)
}

pub fn render_vector(vector: &[f64]) -> String {
    render_rows(&[vector.to_vec()])
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn records() -> Vec<BenchRecord> {
        vec![
            BenchRecord {
                ring_dim: 8192,
                size: 4,
                variant: "sequential".to_string(),
                elapsed_ms: 1.23456,
                passed: true,
            },
            BenchRecord {
                ring_dim: 8192,
                size: 4,
                variant: "parallel".to_string(),
                elapsed_ms: 0.5,
                passed: false,
            },
        ]
    }

    #[test]
    fn test_write_records() {
        let mut buf = Vec::new();
        write_records(&mut buf, &records()).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(
            text,
            "ring_dim,size,variant,time_ms,passed\n\
             8192,4,sequential,1.235,true\n\
             8192,4,parallel,0.500,false\n"
        );
    }

    #[test]
    fn test_write_csv_to_file() {
        let tmp_dir = tempdir().unwrap();
        let path = tmp_dir.path().join("matvec.csv");
        write_csv(&path, &records()).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 3);
        assert!(text.starts_with(CSV_HEADER));
    }

    #[test]
    fn test_write_csv_missing_dir() {
        let tmp_dir = tempdir().unwrap();
        let path = tmp_dir.path().join("missing").join("out.csv");
        assert!(matches!(write_csv(&path, &records()), Err(ReportError::Io { .. })));
    }

    #[test]
    fn test_render_matrix() {
        let rendered = render_matrix(&[vec![1.0, -2.0], vec![3.5, 4.0]]);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], "+---------+---------+");
        assert_eq!(lines[1], "|  1.0000 | -2.0000 |");
        assert_eq!(render_vector(&[0.25]).lines().nth(1), Some("| 0.2500 |"));
    }
}

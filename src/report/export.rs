//! Append-only credential export.
//!
//! Two rows per accepted record: the personal identity/password pair,
//! then the work pair. The header is written exactly once — when the
//! export file does not exist yet or is empty — so restarts keep
//! appending to the same table.

use crate::models::{CredforgeError, PersonaRecord, Result};
use csv::{QuoteStyle, WriterBuilder};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

const PLAIN_HEADER: &[&str] = &["user_id", "password"];
const EXTENDED_HEADER: &[&str] = &["user_id", "password", "sector", "behavior"];

/// CSV exporter for accepted credential pairs.
pub struct CredentialExporter {
    path: PathBuf,
    extended: bool,
}

impl CredentialExporter {
    /// `extended` adds sector and behavior columns to every row.
    pub fn new(path: &Path, extended: bool) -> Self {
        Self {
            path: path.to_path_buf(),
            extended,
        }
    }

    fn needs_header(&self) -> Result<bool> {
        match std::fs::metadata(&self.path) {
            Ok(meta) => Ok(meta.len() == 0),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(true),
            Err(e) => Err(CredforgeError::io("inspecting export file", e)),
        }
    }

    /// Append the given records to the export.
    pub fn append(&self, records: &[PersonaRecord]) -> Result<()> {
        let write_header = self.needs_header()?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| CredforgeError::io("opening export file", e))?;

        let mut writer = WriterBuilder::new()
            .quote_style(QuoteStyle::Always)
            .has_headers(false)
            .from_writer(file);

        if write_header {
            let header = if self.extended {
                EXTENDED_HEADER
            } else {
                PLAIN_HEADER
            };
            writer.write_record(header)?;
        }

        for record in records {
            self.write_pair(&mut writer, record, &record.personal_email, &record.personal_password)?;
            self.write_pair(&mut writer, record, &record.work_lanid, &record.work_password)?;
        }

        writer.flush().map_err(|e| CredforgeError::io("flushing export", e))?;
        Ok(())
    }

    fn write_pair<W: std::io::Write>(
        &self,
        writer: &mut csv::Writer<W>,
        record: &PersonaRecord,
        user_id: &str,
        password: &str,
    ) -> Result<()> {
        if self.extended {
            writer.write_record([user_id, password, &record.sector, &record.behavior_tag])?;
        } else {
            writer.write_record([user_id, password])?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(i: usize) -> PersonaRecord {
        PersonaRecord {
            name: format!("Person {i}"),
            occupation: "Nurse".to_string(),
            personal_email: format!("p{i}@mail.test"),
            personal_password: "root_pw".to_string(),
            work_lanid: format!("lan{i:03}"),
            work_password: "Work#Password1".to_string(),
            behavior_tag: "reuser".to_string(),
            sector: "Healthcare".to_string(),
        }
    }

    #[test]
    fn test_header_once_two_rows_per_record() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("credentials.csv");
        let exporter = CredentialExporter::new(&path, false);

        exporter.append(&[record(0)]).unwrap();
        exporter.append(&[record(1), record(2)]).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        // 1 header + 2 rows per record
        assert_eq!(lines.len(), 1 + 2 * 3);
        assert_eq!(lines[0], r#""user_id","password""#);
        assert_eq!(lines[1], r#""p0@mail.test","root_pw""#);
        assert_eq!(lines[2], r#""lan000","Work#Password1""#);
        assert_eq!(content.matches("user_id").count(), 1);
    }

    #[test]
    fn test_extended_columns() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("credentials.csv");
        let exporter = CredentialExporter::new(&path, true);

        exporter.append(&[record(0)]).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], r#""user_id","password","sector","behavior""#);
        assert_eq!(lines[1], r#""p0@mail.test","root_pw","Healthcare","reuser""#);
    }

    #[test]
    fn test_append_resumes_without_second_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("credentials.csv");

        CredentialExporter::new(&path, false)
            .append(&[record(0)])
            .unwrap();
        // fresh exporter instance, as after a process restart
        CredentialExporter::new(&path, false)
            .append(&[record(1)])
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.matches("user_id").count(), 1);
        assert_eq!(content.lines().count(), 5);
    }
}

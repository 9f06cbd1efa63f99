use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};

const FILE_PREFIX: &str = "FlashPrint_Orders_";
const FILE_EXT: &str = ".xlsx";

/// Directory holding one workbook per calendar day.
#[derive(Debug, Clone)]
pub struct ExportsDir {
    root: PathBuf,
}

impl ExportsDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn ensure(&self) -> Result<()> {
        fs::create_dir_all(&self.root)
            .with_context(|| format!("create exports dir failed: {}", self.root.display()))
    }

    /// `FlashPrint_Orders_2025-03-14.xlsx`
    pub fn file_name_for(date: NaiveDate) -> String {
        format!("{FILE_PREFIX}{}{FILE_EXT}", date.format("%Y-%m-%d"))
    }

    /// Inverse of [`ExportsDir::file_name_for`].
    pub fn date_of(file_name: &str) -> Option<NaiveDate> {
        let stem = file_name.strip_prefix(FILE_PREFIX)?.strip_suffix(FILE_EXT)?;
        NaiveDate::parse_from_str(stem, "%Y-%m-%d").ok()
    }

    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.root.join(Self::file_name_for(date))
    }

    pub fn existing_path(&self, date: NaiveDate) -> Option<PathBuf> {
        let p = self.path_for(date);
        p.is_file().then_some(p)
    }

    /// Workbook file names, newest day first. A missing directory is empty.
    pub fn list_available(&self) -> Result<Vec<String>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(e) => e,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("read exports dir failed: {}", self.root.display()))
            }
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.context("read exports dir entry failed")?;
            if let Some(name) = entry.file_name().to_str() {
                if Self::date_of(name).is_some() {
                    names.push(name.to_string());
                }
            }
        }
        // ISO dates sort lexically.
        names.sort();
        names.reverse();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names_round_trip_dates() {
        let d = NaiveDate::from_ymd_opt(2025, 1, 7).unwrap();
        let name = ExportsDir::file_name_for(d);
        assert_eq!(name, "FlashPrint_Orders_2025-01-07.xlsx");
        assert_eq!(ExportsDir::date_of(&name), Some(d));
        assert_eq!(ExportsDir::date_of("FlashPrint_Orders_2025-01-07.xlsx.tmp"), None);
        assert_eq!(ExportsDir::date_of("notes.xlsx"), None);
    }
}

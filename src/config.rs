// src/config.rs

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Options controlling how the input CSV is read.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InputConfig {
    /// A file, a directory of `*.csv` files, or a glob pattern.
    pub path: String,
    pub delimiter: char,
    /// First row holds column names.
    pub header: bool,
    /// When false every column is read as a string.
    pub infer_schema: bool,
    pub batch_size: usize,
    /// Rows with fewer fields than the header are padded with NULLs.
    pub allow_truncated_rows: bool,
    /// Fields past the header's width are dropped instead of failing the load.
    pub allow_extra_fields: bool,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            path: "data/employee_earnings_report_2016-6.csv".into(),
            delimiter: ',',
            header: true,
            infer_schema: false,
            batch_size: 8192,
            allow_truncated_rows: true,
            allow_extra_fields: true,
        }
    }
}

/// Dataset column backing each logical field used by the queries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ColumnNames {
    pub title: String,
    pub department: String,
    pub gender: String,
    pub postal: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            title: "title".into(),
            department: "department_name".into(),
            gender: "gender".into(),
            postal: "postal".into(),
        }
    }
}

impl ColumnNames {
    pub fn all(&self) -> [&str; 4] {
        [&self.title, &self.department, &self.gender, &self.postal]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    /// Where the full dataset is written back as CSV.
    pub csv_path: PathBuf,
    /// One `<query>.csv` per query result.
    pub results_dir: Option<PathBuf>,
    /// Parquet copy of the dataset.
    pub parquet_path: Option<PathBuf>,
    /// JSON summary of the run.
    pub manifest_path: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            csv_path: PathBuf::from("data/employee_earnings_report-2021_.csv"),
            results_dir: None,
            parquet_path: None,
            manifest_path: None,
        }
    }
}

/// Top-level report configuration. Every field has a default, so an empty
/// YAML document is a valid config.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReportConfig {
    pub input: InputConfig,
    pub view_name: String,
    pub columns: ColumnNames,
    pub top_n: usize,
    pub preview_rows: usize,
    pub print_results: bool,
    /// Restrict the run to these query names.
    pub queries: Option<Vec<String>>,
    /// Fail when the SQL and dataframe forms of a query disagree.
    pub strict: bool,
    pub output: OutputConfig,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            input: InputConfig::default(),
            view_name: "employee_earnings_report".into(),
            columns: ColumnNames::default(),
            top_n: 3,
            preview_rows: 20,
            print_results: true,
            queries: None,
            strict: true,
            output: OutputConfig::default(),
        }
    }
}

impl ReportConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_yaml(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        // serde_yaml rejects an empty document, treat it as "all defaults"
        let cfg: ReportConfig = if text.trim().is_empty() {
            ReportConfig::default()
        } else {
            serde_yaml::from_str(text)?
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.top_n == 0 {
            bail!("top_n must be at least 1");
        }
        if self.view_name.trim().is_empty() {
            bail!("view_name must not be empty");
        }
        if !self.input.delimiter.is_ascii() {
            bail!(
                "delimiter {:?} is not a single-byte character",
                self.input.delimiter
            );
        }
        if self.input.batch_size == 0 {
            bail!("input.batch_size must be at least 1");
        }
        Ok(())
    }

    /// Delimiter as the byte the CSV readers and writers expect.
    pub fn delimiter_byte(&self) -> u8 {
        self.input.delimiter as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn empty_document_is_default() {
        let cfg = ReportConfig::from_yaml("").unwrap();
        assert_eq!(cfg, ReportConfig::default());
        assert_eq!(cfg.view_name, "employee_earnings_report");
        assert_eq!(cfg.top_n, 3);
        assert!(!cfg.input.infer_schema);
        assert!(cfg.input.allow_extra_fields);
    }

    #[test]
    fn partial_document_keeps_other_defaults() {
        let yaml = r#"
top_n: 5
input:
  path: "in/*.csv"
  delimiter: ";"
columns:
  postal: zip
output:
  csv_path: out/report.csv
  results_dir: out/results
"#;
        let cfg = ReportConfig::from_yaml(yaml).unwrap();
        assert_eq!(cfg.top_n, 5);
        assert_eq!(cfg.input.path, "in/*.csv");
        assert_eq!(cfg.delimiter_byte(), b';');
        assert!(cfg.input.header);
        assert_eq!(cfg.columns.postal, "zip");
        assert_eq!(cfg.columns.title, "title");
        assert_eq!(cfg.output.csv_path, PathBuf::from("out/report.csv"));
        assert_eq!(cfg.output.results_dir, Some(PathBuf::from("out/results")));
        assert!(cfg.output.parquet_path.is_none());
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(ReportConfig::from_yaml("top_n: 0").is_err());
        assert!(ReportConfig::from_yaml("view_name: '  '").is_err());
        assert!(ReportConfig::from_yaml("input:\n  delimiter: 'é'").is_err());
        assert!(ReportConfig::from_yaml("top_n: [1, 2]").is_err());
    }

    #[test]
    fn load_from_file() {
        let mut tmp = NamedTempFile::new().unwrap();
        writeln!(tmp, "view_name: earnings\nstrict: false").unwrap();
        let cfg = ReportConfig::load(tmp.path()).unwrap();
        assert_eq!(cfg.view_name, "earnings");
        assert!(!cfg.strict);

        let missing = tmp.path().with_extension("missing");
        assert!(ReportConfig::load(&missing).is_err());
    }
}

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuerySummary {
    pub name: String,
    pub rows: usize,
    pub agreed: bool,
    pub elapsed_ms: u64,
}

/// What a report run read, computed and wrote.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunManifest {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub view_name: String,
    pub input_files: Vec<PathBuf>,
    pub rows_loaded: usize,
    pub columns: Vec<String>,
    pub queries: Vec<QuerySummary>,
    pub outputs: Vec<PathBuf>,
}

impl RunManifest {
    /// Pretty JSON with a trailing newline, written via a temp file + rename.
    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating directory {}", parent.display()))?;
        }

        let tmp_path = path.with_extension("json.tmp");
        let mut tmp = fs::File::create(&tmp_path)
            .with_context(|| format!("creating {}", tmp_path.display()))?;
        serde_json::to_writer_pretty(&mut tmp, self).context("serializing manifest")?;
        tmp.write_all(b"\n")?;

        fs::rename(&tmp_path, path).with_context(|| {
            format!("renaming {} -> {}", tmp_path.display(), path.display())
        })?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let f = fs::File::open(path).with_context(|| format!("opening {}", path.display()))?;
        serde_json::from_reader(f).with_context(|| format!("parsing {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn write_then_load() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("runs/manifest.json");
        let now = Utc::now();
        let manifest = RunManifest {
            started_at: now,
            finished_at: now,
            view_name: "employee_earnings_report".into(),
            input_files: vec![PathBuf::from("in.csv")],
            rows_loaded: 14,
            columns: vec!["title".into(), "postal".into()],
            queries: vec![QuerySummary {
                name: "top_postal_codes".into(),
                rows: 3,
                agreed: true,
                elapsed_ms: 4,
            }],
            outputs: vec![PathBuf::from("out.csv")],
        };

        manifest.write(&path).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.ends_with("}\n"));
        assert_eq!(RunManifest::load(&path).unwrap(), manifest);
    }
}

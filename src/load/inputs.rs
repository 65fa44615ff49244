use anyhow::{bail, Context, Result};
use glob::glob;
use std::path::{Path, PathBuf};

/// Expand an input location into the CSV files it names.
///
/// - an existing file is returned as-is
/// - a directory yields every `*.csv` directly inside it
/// - anything else is treated as a glob pattern
///
/// Results are sorted so partitions load in a stable order.
pub fn resolve_inputs(location: &str) -> Result<Vec<PathBuf>> {
    let path = Path::new(location);

    let mut files: Vec<PathBuf> = if path.is_file() {
        vec![path.to_path_buf()]
    } else if path.is_dir() {
        let pattern = format!("{}/*.csv", path.display());
        expand(&pattern)?
    } else {
        expand(location)?
    };

    if files.is_empty() {
        bail!("no CSV input found at `{}`", location);
    }
    files.sort();
    Ok(files)
}

fn expand(pattern: &str) -> Result<Vec<PathBuf>> {
    let paths = glob(pattern).with_context(|| format!("invalid input pattern `{}`", pattern))?;
    Ok(paths
        .filter_map(Result::ok)
        .filter(|p| p.is_file())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn resolves_file_dir_and_glob() {
        let tmp = tempdir().unwrap();
        let b = tmp.path().join("b.csv");
        let a = tmp.path().join("a.csv");
        fs::write(&b, "x\n1\n").unwrap();
        fs::write(&a, "x\n2\n").unwrap();
        fs::write(tmp.path().join("notes.txt"), "ignore").unwrap();

        let single = resolve_inputs(b.to_str().unwrap()).unwrap();
        assert_eq!(single, vec![b.clone()]);

        let dir = resolve_inputs(tmp.path().to_str().unwrap()).unwrap();
        assert_eq!(dir, vec![a.clone(), b.clone()]);

        let pattern = format!("{}/?.csv", tmp.path().display());
        assert_eq!(resolve_inputs(&pattern).unwrap(), vec![a, b]);
    }

    #[test]
    fn nothing_matched_is_an_error() {
        let tmp = tempdir().unwrap();
        assert!(resolve_inputs(tmp.path().to_str().unwrap()).is_err());
        let missing = tmp.path().join("missing.csv");
        assert!(resolve_inputs(missing.to_str().unwrap()).is_err());
    }
}

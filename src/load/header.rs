use anyhow::{anyhow, Context, Result};
use csv::ReaderBuilder;
use once_cell::sync::Lazy;
use regex::Regex;
use std::{collections::HashMap, path::Path};

static NON_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^0-9a-z]+").expect("static regex is valid"));

/// Trim whitespace, a leading BOM and outer quotes.
pub fn clean_str(raw: &str) -> &str {
    let trimmed = raw.trim_start_matches('\u{feff}').trim();
    if trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"') {
        &trimmed[1..trimmed.len() - 1]
    } else {
        trimmed
    }
}

/// Turn a raw header cell into a lower-case identifier usable unquoted in SQL.
///
/// `"Department_Name"` → `department_name`, `TOTAL EARNINGS` → `total_earnings`,
/// `QUINN/EDUCATION INCENTIVE` → `quinn_education_incentive`.
/// Returns an empty string when nothing alphanumeric is left.
pub fn normalize_column_name(raw: &str) -> String {
    let lower = clean_str(raw).to_lowercase();
    NON_WORD.replace_all(&lower, "_").trim_matches('_').to_string()
}

/// Normalize a full header row: blanks become `_c{index}` and repeated names
/// get a numeric suffix (`postal`, `postal_2`, ...).
pub fn normalize_headers<S: AsRef<str>>(raw: &[S]) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut out = Vec::with_capacity(raw.len());

    for (idx, cell) in raw.iter().enumerate() {
        let mut name = normalize_column_name(cell.as_ref());
        if name.is_empty() {
            name = positional_name(idx);
        }

        let count = seen.entry(name.clone()).or_insert(0);
        *count += 1;
        if *count > 1 {
            name = format!("{}_{}", name, count);
        }
        out.push(name);
    }
    out
}

/// Name given to column `idx` when the file has no header.
pub fn positional_name(idx: usize) -> String {
    format!("_c{}", idx)
}

/// Read the first record of `path`. With `has_header` the cells are returned
/// verbatim, otherwise positional names sized to the first row.
pub fn read_header(path: &Path, delimiter: u8, has_header: bool) -> Result<Vec<String>> {
    let mut rdr = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;

    let first = rdr
        .records()
        .next()
        .ok_or_else(|| anyhow!("{} is empty", path.display()))?
        .with_context(|| format!("reading first row of {}", path.display()))?;

    if has_header {
        Ok(first.iter().map(|s| s.to_string()).collect())
    } else {
        Ok((0..first.len()).map(positional_name).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn normalizes_notebook_style_names() {
        assert_eq!(normalize_column_name("Title"), "title");
        assert_eq!(normalize_column_name("Department_Name"), "department_name");
        assert_eq!(normalize_column_name(" TOTAL EARNINGS "), "total_earnings");
        assert_eq!(
            normalize_column_name("QUINN/EDUCATION INCENTIVE"),
            "quinn_education_incentive"
        );
        assert_eq!(normalize_column_name("\u{feff}\"NAME\""), "name");
        assert_eq!(normalize_column_name("--"), "");
    }

    #[test]
    fn fills_blanks_and_dedupes() {
        let headers = normalize_headers(&["Postal", "", "POSTAL", "postal ", "#"]);
        assert_eq!(
            headers,
            vec!["postal", "_c1", "postal_2", "postal_3", "_c4"]
        );
    }

    #[test]
    fn reads_header_or_positional_names() {
        let mut tmp = NamedTempFile::new().unwrap();
        writeln!(tmp, "NAME;\"TITLE\";POSTAL").unwrap();
        writeln!(tmp, "a;b;c").unwrap();

        let raw = read_header(tmp.path(), b';', true).unwrap();
        assert_eq!(raw, vec!["NAME", "TITLE", "POSTAL"]);

        let positional = read_header(tmp.path(), b';', false).unwrap();
        assert_eq!(positional, vec!["_c0", "_c1", "_c2"]);
    }

    #[test]
    fn empty_file_is_an_error() {
        let tmp = NamedTempFile::new().unwrap();
        assert!(read_header(tmp.path(), b',', true).is_err());
    }
}

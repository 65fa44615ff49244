// src/queries/compare.rs

use anyhow::Result;
use arrow::{array::Array, record_batch::RecordBatch, util::display::array_value_to_string};

const NULL: &str = "NULL";

/// Outcome of checking two result sets against each other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Agreement {
    Same,
    Different(String),
}

impl Agreement {
    pub fn is_same(&self) -> bool {
        matches!(self, Agreement::Same)
    }
}

fn column_names(batches: &[RecordBatch]) -> Option<Vec<String>> {
    batches.first().map(|b| {
        b.schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect()
    })
}

/// Render every cell as text, row by row, NULL as `NULL`.
pub fn rows_as_strings(batches: &[RecordBatch]) -> Result<Vec<Vec<String>>> {
    let mut rows = Vec::new();
    for batch in batches {
        for row in 0..batch.num_rows() {
            let mut cells = Vec::with_capacity(batch.num_columns());
            for column in batch.columns() {
                if column.is_null(row) {
                    cells.push(NULL.to_string());
                } else {
                    cells.push(array_value_to_string(column, row)?);
                }
            }
            rows.push(cells);
        }
    }
    Ok(rows)
}

/// Compare column names, row count and every row in order.
pub fn compare_results(left: &[RecordBatch], right: &[RecordBatch]) -> Result<Agreement> {
    let (l_cols, r_cols) = (column_names(left), column_names(right));
    if let (Some(l), Some(r)) = (&l_cols, &r_cols) {
        if l != r {
            return Ok(Agreement::Different(format!(
                "columns differ: {:?} vs {:?}",
                l, r
            )));
        }
    }

    let l_rows = rows_as_strings(left)?;
    let r_rows = rows_as_strings(right)?;
    if l_rows.len() != r_rows.len() {
        return Ok(Agreement::Different(format!(
            "row counts differ: {} vs {}",
            l_rows.len(),
            r_rows.len()
        )));
    }

    for (idx, (l, r)) in l_rows.iter().zip(&r_rows).enumerate() {
        if l != r {
            return Ok(Agreement::Different(format!(
                "row {} differs: {:?} vs {:?}",
                idx, l, r
            )));
        }
    }
    Ok(Agreement::Same)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::{
        array::{ArrayRef, Int64Array, StringArray},
        datatypes::{DataType, Field, Schema},
    };
    use std::sync::Arc;

    fn batch(names: (&str, &str), keys: Vec<Option<&str>>, counts: Vec<i64>) -> RecordBatch {
        let schema = Arc::new(Schema::new(vec![
            Field::new(names.0, DataType::Utf8, true),
            Field::new(names.1, DataType::Int64, false),
        ]));
        let cols: Vec<ArrayRef> = vec![
            Arc::new(StringArray::from(keys)),
            Arc::new(Int64Array::from(counts)),
        ];
        RecordBatch::try_new(schema, cols).unwrap()
    }

    #[test]
    fn renders_nulls() {
        let b = batch(("postal", "n"), vec![Some("02124"), None], vec![5, 0]);
        let rows = rows_as_strings(&[b]).unwrap();
        assert_eq!(rows, vec![vec!["02124", "5"], vec!["NULL", "0"]]);
    }

    #[test]
    fn same_rows_split_across_batches_agree() {
        let whole = batch(("postal", "n"), vec![Some("a"), Some("b")], vec![2, 1]);
        let first = batch(("postal", "n"), vec![Some("a")], vec![2]);
        let second = batch(("postal", "n"), vec![Some("b")], vec![1]);
        assert_eq!(
            compare_results(&[whole], &[first, second]).unwrap(),
            Agreement::Same
        );
    }

    #[test]
    fn detects_differences() {
        let base = batch(("postal", "n"), vec![Some("a"), Some("b")], vec![2, 1]);

        let renamed = batch(("zip", "n"), vec![Some("a"), Some("b")], vec![2, 1]);
        let agreement = compare_results(&[base.clone()], &[renamed]).unwrap();
        assert!(matches!(agreement, Agreement::Different(ref m) if m.contains("columns")));

        let shorter = batch(("postal", "n"), vec![Some("a")], vec![2]);
        let agreement = compare_results(&[base.clone()], &[shorter]).unwrap();
        assert!(matches!(agreement, Agreement::Different(ref m) if m.contains("row counts")));

        let swapped = batch(("postal", "n"), vec![Some("b"), Some("a")], vec![1, 2]);
        let agreement = compare_results(&[base], &[swapped]).unwrap();
        assert!(!agreement.is_same());
    }

    #[test]
    fn empty_results_agree() {
        assert!(compare_results(&[], &[]).unwrap().is_same());
    }
}

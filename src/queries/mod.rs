// src/queries/mod.rs
//! Aggregation queries over the earnings view.
//!
//! Every [`Query`] is defined once and rendered two ways: as SQL text against
//! a named view ([`Query::sql`]) and as dataframe operations
//! ([`Query::frame`]). Both renderings order their output totally, so running
//! them must yield the same rows in the same order.

pub mod catalog;
pub mod compare;
pub mod frame;
pub mod sql;

pub use catalog::{select_queries, standard_queries, Gender};
pub use compare::{compare_results, rows_as_strings, Agreement};

use anyhow::Result;
use datafusion::prelude::DataFrame;

/// Name of the row-number column produced by ranked queries.
pub const RANK_COLUMN: &str = "rank";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ordering {
    /// Group columns ascending, NULLs last.
    ByGroups,
    /// Count descending, then group columns ascending.
    ByCountDesc,
}

/// Keep only rows where `column = value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub column: String,
    pub value: String,
}

/// `COUNT(count_column) AS alias` grouped by `group_by`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupCount {
    pub group_by: Vec<String>,
    pub count_column: String,
    pub alias: String,
    /// Applied before grouping.
    pub filter: Option<Filter>,
    pub order: Ordering,
    pub limit: Option<usize>,
}

/// Top `n` values of `rank_column` inside each `partition_by` group, by how
/// often they occur.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedCount {
    pub partition_by: Vec<String>,
    pub rank_column: String,
    pub alias: String,
    pub n: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryKind {
    GroupCount(GroupCount),
    Ranked(RankedCount),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub name: String,
    pub description: String,
    pub kind: QueryKind,
}

impl Query {
    pub fn new(name: &str, description: &str, kind: QueryKind) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            kind,
        }
    }

    pub fn sql(&self, view: &str) -> String {
        match &self.kind {
            QueryKind::GroupCount(g) => sql::group_count(g, view),
            QueryKind::Ranked(r) => sql::ranked_count(r, view),
        }
    }

    pub fn frame(&self, df: DataFrame) -> Result<DataFrame> {
        match &self.kind {
            QueryKind::GroupCount(g) => frame::group_count(g, df),
            QueryKind::Ranked(r) => frame::ranked_count(r, df),
        }
    }

    /// Dataset columns the query reads.
    pub fn input_columns(&self) -> Vec<&str> {
        let mut cols: Vec<&str> = match &self.kind {
            QueryKind::GroupCount(g) => {
                let mut c: Vec<&str> = g.group_by.iter().map(String::as_str).collect();
                c.push(&g.count_column);
                if let Some(f) = &g.filter {
                    c.push(&f.column);
                }
                c
            }
            QueryKind::Ranked(r) => {
                let mut c: Vec<&str> = r.partition_by.iter().map(String::as_str).collect();
                c.push(&r.rank_column);
                c
            }
        };
        cols.sort_unstable();
        cols.dedup();
        cols
    }
}

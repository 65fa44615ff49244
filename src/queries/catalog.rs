// src/queries/catalog.rs

use anyhow::{bail, Result};

use super::{Filter, GroupCount, Ordering, Query, QueryKind, RankedCount};
use crate::config::ColumnNames;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    /// Value stored in the gender column.
    pub fn code(&self) -> &'static str {
        match self {
            Gender::Male => "M",
            Gender::Female => "F",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }
}

fn gender_by_title_department(cols: &ColumnNames, gender: Gender) -> Query {
    Query::new(
        &format!("{}_by_title_department", gender.label()),
        &format!(
            "employees with gender '{}' per title and department",
            gender.code()
        ),
        QueryKind::GroupCount(GroupCount {
            group_by: vec![cols.title.clone(), cols.department.clone()],
            count_column: cols.title.clone(),
            alias: gender.label().to_string(),
            filter: Some(Filter {
                column: cols.gender.clone(),
                value: gender.code().to_string(),
            }),
            order: Ordering::ByGroups,
            limit: None,
        }),
    )
}

/// The standard earnings report, in run order.
pub fn standard_queries(cols: &ColumnNames, top_n: usize) -> Vec<Query> {
    vec![
        Query::new(
            "headcount_by_gender",
            "employees per gender",
            QueryKind::GroupCount(GroupCount {
                group_by: vec![cols.gender.clone()],
                count_column: cols.gender.clone(),
                alias: "headcount".into(),
                filter: None,
                order: Ordering::ByGroups,
                limit: None,
            }),
        ),
        Query::new(
            "headcount_by_department",
            "employees per department",
            QueryKind::GroupCount(GroupCount {
                group_by: vec![cols.department.clone()],
                count_column: cols.title.clone(),
                alias: "headcount".into(),
                filter: None,
                order: Ordering::ByGroups,
                limit: None,
            }),
        ),
        gender_by_title_department(cols, Gender::Male),
        gender_by_title_department(cols, Gender::Female),
        Query::new(
            "top_postal_codes",
            "most common postal codes",
            QueryKind::GroupCount(GroupCount {
                group_by: vec![cols.postal.clone()],
                count_column: cols.postal.clone(),
                alias: "postal_count".into(),
                filter: None,
                order: Ordering::ByCountDesc,
                limit: Some(top_n),
            }),
        ),
        Query::new(
            "top_title_department_by_postal_count",
            "title and department pairs with the most postal entries",
            QueryKind::GroupCount(GroupCount {
                group_by: vec![cols.title.clone(), cols.department.clone()],
                count_column: cols.postal.clone(),
                alias: "postal_count".into(),
                filter: None,
                order: Ordering::ByCountDesc,
                limit: Some(top_n),
            }),
        ),
        Query::new(
            "top_postal_codes_per_title_department",
            "most common postal codes within each title and department",
            QueryKind::Ranked(RankedCount {
                partition_by: vec![cols.title.clone(), cols.department.clone()],
                rank_column: cols.postal.clone(),
                alias: "postal_count".into(),
                n: top_n,
            }),
        ),
    ]
}

/// Keep the queries named in `names`, in catalog order. Unknown names are an
/// error.
pub fn select_queries(queries: Vec<Query>, names: Option<&[String]>) -> Result<Vec<Query>> {
    let Some(names) = names else {
        return Ok(queries);
    };

    let unknown: Vec<&String> = names
        .iter()
        .filter(|n| !queries.iter().any(|q| &q.name == *n))
        .collect();
    if !unknown.is_empty() {
        let known: Vec<&str> = queries.iter().map(|q| q.name.as_str()).collect();
        bail!("unknown queries {:?}; known: {:?}", unknown, known);
    }

    Ok(queries
        .into_iter()
        .filter(|q| names.contains(&q.name))
        .collect())
}

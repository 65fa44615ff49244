// src/queries/sql.rs
//! SQL renderings. Identifiers are always double-quoted so configured column
//! names are matched exactly.

use super::{GroupCount, Ordering, RankedCount, RANK_COLUMN};

pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn ident_list(names: &[String]) -> String {
    names
        .iter()
        .map(|n| quote_ident(n))
        .collect::<Vec<_>>()
        .join(", ")
}

fn ascending(names: &[String]) -> Vec<String> {
    names
        .iter()
        .map(|n| format!("{} ASC NULLS LAST", quote_ident(n)))
        .collect()
}

pub fn group_count(g: &GroupCount, view: &str) -> String {
    let groups = ident_list(&g.group_by);
    let mut sql = format!(
        "SELECT {}, COUNT({}) AS {}\nFROM {}",
        groups,
        quote_ident(&g.count_column),
        quote_ident(&g.alias),
        quote_ident(view)
    );

    if let Some(f) = &g.filter {
        sql.push_str(&format!(
            "\nWHERE {} = {}",
            quote_ident(&f.column),
            quote_literal(&f.value)
        ));
    }
    sql.push_str(&format!("\nGROUP BY {}", groups));

    let mut order = Vec::new();
    if g.order == Ordering::ByCountDesc {
        order.push(format!("{} DESC NULLS FIRST", quote_ident(&g.alias)));
    }
    order.extend(ascending(&g.group_by));
    sql.push_str(&format!("\nORDER BY {}", order.join(", ")));

    if let Some(n) = g.limit {
        sql.push_str(&format!("\nLIMIT {}", n));
    }
    sql
}

pub fn ranked_count(r: &RankedCount, view: &str) -> String {
    let mut keys = r.partition_by.clone();
    keys.push(r.rank_column.clone());
    let keys = ident_list(&keys);

    let partition = if r.partition_by.is_empty() {
        String::new()
    } else {
        format!("PARTITION BY {} ", ident_list(&r.partition_by))
    };

    let mut order = ascending(&r.partition_by);
    order.push(format!("{} ASC NULLS LAST", quote_ident(RANK_COLUMN)));

    format!(
        "SELECT * FROM (\n\
         \x20 SELECT *, ROW_NUMBER() OVER ({partition}ORDER BY {alias} DESC NULLS FIRST, {rank_col} ASC NULLS LAST) AS {rank}\n\
         \x20 FROM (\n\
         \x20   SELECT {keys}, COUNT({rank_col}) AS {alias}\n\
         \x20   FROM {view}\n\
         \x20   GROUP BY {keys}\n\
         \x20 ) AS grouped\n\
         ) AS ranked\n\
         WHERE {rank} <= {n}\n\
         ORDER BY {order}",
        partition = partition,
        alias = quote_ident(&r.alias),
        rank_col = quote_ident(&r.rank_column),
        rank = quote_ident(RANK_COLUMN),
        keys = keys,
        view = quote_ident(view),
        n = r.n,
        order = order.join(", "),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::Filter;

    #[test]
    fn quoting_escapes() {
        assert_eq!(quote_ident("title"), "\"title\"");
        assert_eq!(quote_ident("a\"b"), "\"a\"\"b\"");
        assert_eq!(quote_literal("O'Neil"), "'O''Neil'");
    }

    #[test]
    fn filtered_group_count() {
        let g = GroupCount {
            group_by: vec!["title".into(), "department_name".into()],
            count_column: "title".into(),
            alias: "male".into(),
            filter: Some(Filter {
                column: "gender".into(),
                value: "M".into(),
            }),
            order: Ordering::ByGroups,
            limit: None,
        };
        assert_eq!(
            group_count(&g, "employee_earnings_report"),
            "SELECT \"title\", \"department_name\", COUNT(\"title\") AS \"male\"\n\
             FROM \"employee_earnings_report\"\n\
             WHERE \"gender\" = 'M'\n\
             GROUP BY \"title\", \"department_name\"\n\
             ORDER BY \"title\" ASC NULLS LAST, \"department_name\" ASC NULLS LAST"
        );
    }

    #[test]
    fn top_n_orders_by_count_then_groups() {
        let g = GroupCount {
            group_by: vec!["postal".into()],
            count_column: "postal".into(),
            alias: "postal_count".into(),
            filter: None,
            order: Ordering::ByCountDesc,
            limit: Some(3),
        };
        let sql = group_count(&g, "v");
        assert!(sql.contains(
            "ORDER BY \"postal_count\" DESC NULLS FIRST, \"postal\" ASC NULLS LAST\nLIMIT 3"
        ));
        assert!(!sql.contains("WHERE"));
    }

    #[test]
    fn ranked_without_partition_omits_clause() {
        let r = RankedCount {
            partition_by: vec![],
            rank_column: "postal".into(),
            alias: "postal_count".into(),
            n: 2,
        };
        let sql = ranked_count(&r, "v");
        assert!(!sql.contains("PARTITION BY"));
        assert!(sql.contains("OVER (ORDER BY \"postal_count\" DESC NULLS FIRST"));
        assert!(sql.contains("WHERE \"rank\" <= 2"));
        assert!(sql.ends_with("ORDER BY \"rank\" ASC NULLS LAST"));
    }
}

// src/queries/frame.rs
//! Dataframe renderings, mirroring `sql.rs` operation for operation.

use anyhow::Result;
use datafusion::{
    functions_aggregate::expr_fn::count,
    functions_window::expr_fn::row_number,
    logical_expr::{ExprFunctionExt, SortExpr},
    prelude::{ident, lit, DataFrame, Expr},
};

use super::{GroupCount, Ordering, RankedCount, RANK_COLUMN};

fn idents(names: &[String]) -> Vec<Expr> {
    names.iter().map(ident).collect()
}

fn ascending(names: &[String]) -> Vec<SortExpr> {
    names.iter().map(|n| ident(n).sort(true, false)).collect()
}

pub fn group_count(g: &GroupCount, df: DataFrame) -> Result<DataFrame> {
    let mut df = df;
    if let Some(f) = &g.filter {
        df = df.filter(ident(&f.column).eq(lit(f.value.as_str())))?;
    }

    df = df.aggregate(
        idents(&g.group_by),
        vec![count(ident(&g.count_column)).alias(&g.alias)],
    )?;

    let mut order = Vec::new();
    if g.order == Ordering::ByCountDesc {
        order.push(ident(&g.alias).sort(false, true));
    }
    order.extend(ascending(&g.group_by));
    df = df.sort(order)?;

    if let Some(n) = g.limit {
        df = df.limit(0, Some(n))?;
    }
    Ok(df)
}

pub fn ranked_count(r: &RankedCount, df: DataFrame) -> Result<DataFrame> {
    let mut keys = r.partition_by.clone();
    keys.push(r.rank_column.clone());

    let grouped = df.aggregate(
        idents(&keys),
        vec![count(ident(&r.rank_column)).alias(&r.alias)],
    )?;

    let row_no = row_number()
        .partition_by(idents(&r.partition_by))
        .order_by(vec![
            ident(&r.alias).sort(false, true),
            ident(&r.rank_column).sort(true, false),
        ])
        .build()?
        .alias(RANK_COLUMN);

    let mut order = ascending(&r.partition_by);
    order.push(ident(RANK_COLUMN).sort(true, false));

    let ranked = grouped
        .window(vec![row_no])?
        .filter(ident(RANK_COLUMN).lt_eq(lit(r.n as u64)))?
        .sort(order)?;
    Ok(ranked)
}

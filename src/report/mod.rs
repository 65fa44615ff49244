// src/report/mod.rs
//! The earnings report pipeline: load → register view → preview → run every
//! query in SQL and dataframe form → write outputs.

pub mod manifest;

pub use manifest::{QuerySummary, RunManifest};

use anyhow::{bail, Context, Result};
use arrow::{datatypes::SchemaRef, record_batch::RecordBatch, util::pretty::pretty_format_batches};
use chrono::Utc;
use std::{path::PathBuf, sync::Arc, time::Duration};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::{
    config::ReportConfig,
    load::{load_csv, Dataset},
    queries::{compare_results, select_queries, sql::quote_ident, standard_queries, Agreement, Query},
    session::Session,
    write::{write_csv, write_parquet, write_stream_csv},
};

/// Result of one query, run both ways.
#[derive(Debug, Clone)]
pub struct QueryOutcome {
    pub name: String,
    pub description: String,
    pub sql: String,
    pub schema: SchemaRef,
    /// Rows from the SQL form.
    pub batches: Vec<RecordBatch>,
    pub agreement: Agreement,
    pub elapsed: Duration,
}

impl QueryOutcome {
    pub fn num_rows(&self) -> usize {
        self.batches.iter().map(|b| b.num_rows()).sum()
    }

    fn summary(&self) -> QuerySummary {
        QuerySummary {
            name: self.name.clone(),
            rows: self.num_rows(),
            agreed: self.agreement.is_same(),
            elapsed_ms: self.elapsed.as_millis() as u64,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub preview: Vec<RecordBatch>,
    pub outcomes: Vec<QueryOutcome>,
    pub manifest: RunManifest,
}

/// Format batches as a text table.
pub fn render(batches: &[RecordBatch]) -> Result<String> {
    Ok(pretty_format_batches(batches)?.to_string())
}

/// Run `query` as SQL and as a dataframe against `view` and compare the two.
#[tracing::instrument(level = "info", skip(session, query), fields(query = %query.name))]
pub async fn run_query(session: &Session, view: &str, query: &Query) -> Result<QueryOutcome> {
    let start = Instant::now();

    let sql = query.sql(view);
    debug!(sql = %sql, "sql form");
    let sql_df = session.sql(&sql).await?;
    let schema: SchemaRef = Arc::new(sql_df.schema().as_arrow().clone());
    let sql_batches = Session::collect(sql_df)
        .await
        .with_context(|| format!("running `{}` as SQL", query.name))?;

    let frame_df = query
        .frame(session.table(view).await?)
        .with_context(|| format!("building `{}` as a dataframe", query.name))?;
    let frame_batches = Session::collect(frame_df)
        .await
        .with_context(|| format!("running `{}` as a dataframe", query.name))?;

    let agreement = compare_results(&sql_batches, &frame_batches)?;
    let elapsed = start.elapsed();
    let outcome = QueryOutcome {
        name: query.name.clone(),
        description: query.description.clone(),
        sql,
        schema,
        batches: sql_batches,
        agreement,
        elapsed,
    };
    info!(
        rows = outcome.num_rows(),
        agreed = outcome.agreement.is_same(),
        elapsed = ?elapsed,
        "query done"
    );
    Ok(outcome)
}

/// A disagreement fails the run in strict mode and is only logged otherwise.
fn check_agreement(name: &str, agreement: &Agreement, strict: bool) -> Result<()> {
    if let Agreement::Different(reason) = agreement {
        if strict {
            bail!("query `{}`: SQL and dataframe results differ: {}", name, reason);
        }
        warn!(query = %name, reason = %reason, "SQL and dataframe results differ");
    }
    Ok(())
}

async fn load_dataset(config: &ReportConfig) -> Result<Dataset> {
    // CSV parsing is blocking work
    let input = config.input.clone();
    tokio::task::spawn_blocking(move || load_csv(&input))
        .await
        .context("loader task panicked")?
}

/// Execute the whole report described by `config`.
#[tracing::instrument(level = "info", skip_all, fields(view = %config.view_name))]
pub async fn run(config: &ReportConfig) -> Result<RunReport> {
    let started_at = Utc::now();
    config.validate()?;
    let view = config.view_name.as_str();
    let delimiter = config.delimiter_byte();

    // ─── 1) load + register ──────────────────────────────────────────
    let dataset = load_dataset(config).await?;
    info!(
        files = dataset.source_files().len(),
        rows = dataset.num_rows(),
        "dataset loaded"
    );
    let session = Session::new();
    session.create_or_replace_temp_view(view, &dataset)?;

    let queries = select_queries(
        standard_queries(&config.columns, config.top_n),
        config.queries.as_deref(),
    )?;
    let mut needed: Vec<&str> = queries.iter().flat_map(|q| q.input_columns()).collect();
    needed.sort_unstable();
    needed.dedup();
    dataset.require_columns(&needed)?;

    // ─── 2) preview ──────────────────────────────────────────────────
    let preview_sql = format!(
        "SELECT * FROM {} LIMIT {}",
        quote_ident(view),
        config.preview_rows
    );
    let preview = Session::collect(session.sql(&preview_sql).await?).await?;
    if config.print_results {
        println!("{}", render(&preview)?);
    }

    // ─── 3) queries ──────────────────────────────────────────────────
    let mut outputs: Vec<PathBuf> = Vec::new();
    let mut outcomes = Vec::with_capacity(queries.len());
    for query in &queries {
        let outcome = run_query(&session, view, query).await?;

        check_agreement(&outcome.name, &outcome.agreement, config.strict)?;

        if config.print_results {
            println!("── {} ({})", outcome.name, outcome.description);
            println!("{}", render(&outcome.batches)?);
        }

        if let Some(dir) = &config.output.results_dir {
            let path = dir.join(format!("{}.csv", outcome.name));
            write_csv(&path, outcome.schema.clone(), &outcome.batches, delimiter)?;
            outputs.push(path);
        }
        outcomes.push(outcome);
    }

    // ─── 4) write the dataset back out ───────────────────────────────
    let stream = session.table(view).await?.execute_stream().await?;
    let csv_path = &config.output.csv_path;
    write_stream_csv(csv_path, stream, delimiter)
        .await
        .with_context(|| format!("writing {}", csv_path.display()))?;
    outputs.push(csv_path.clone());

    if let Some(path) = &config.output.parquet_path {
        let batches: Vec<RecordBatch> = dataset.batches().cloned().collect();
        write_parquet(path, dataset.schema(), &batches)
            .with_context(|| format!("writing {}", path.display()))?;
        outputs.push(path.clone());
    }

    // ─── 5) manifest ─────────────────────────────────────────────────
    let manifest = RunManifest {
        started_at,
        finished_at: Utc::now(),
        view_name: view.to_string(),
        input_files: dataset.source_files().to_vec(),
        rows_loaded: dataset.num_rows(),
        columns: dataset.column_names().iter().map(|c| c.to_string()).collect(),
        queries: outcomes.iter().map(QueryOutcome::summary).collect(),
        outputs,
    };
    if let Some(path) = &config.output.manifest_path {
        manifest.write(path)?;
        info!(path = %path.display(), "wrote manifest");
    }

    Ok(RunReport {
        preview,
        outcomes,
        manifest,
    })
}

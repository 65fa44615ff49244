// src/session/mod.rs

use anyhow::{Context, Result};
use arrow::record_batch::RecordBatch;
use datafusion::{
    common::TableReference,
    datasource::MemTable,
    prelude::{DataFrame, SessionContext},
};
use std::sync::Arc;
use tracing::{debug, info};

use crate::load::Dataset;

/// A query session holding named views over in-memory datasets.
/// Views live as long as the session. View names are kept verbatim, so SQL
/// must quote any name that is not already lower-case.
#[derive(Clone, Default)]
pub struct Session {
    ctx: SessionContext,
}

impl Session {
    pub fn new() -> Self {
        Self {
            ctx: SessionContext::new(),
        }
    }

    /// Register `dataset` under `name`, replacing whatever was there.
    pub fn create_or_replace_temp_view(&self, name: &str, dataset: &Dataset) -> Result<()> {
        let table = MemTable::try_new(dataset.schema(), dataset.partitions().to_vec())
            .with_context(|| format!("building table for view `{}`", name))?;

        if self.drop_view(name)? {
            debug!(view = name, "replacing existing view");
        }
        self.ctx
            .register_table(TableReference::bare(name), Arc::new(table))
            .with_context(|| format!("registering view `{}`", name))?;

        info!(
            view = name,
            rows = dataset.num_rows(),
            columns = dataset.schema().fields().len(),
            "registered view"
        );
        Ok(())
    }

    /// Returns true when a view was removed.
    pub fn drop_view(&self, name: &str) -> Result<bool> {
        let previous = self
            .ctx
            .deregister_table(TableReference::bare(name))
            .with_context(|| format!("dropping view `{}`", name))?;
        Ok(previous.is_some())
    }

    pub async fn sql(&self, query: &str) -> Result<DataFrame> {
        debug!(sql = query, "planning");
        self.ctx
            .sql(query)
            .await
            .with_context(|| format!("planning query: {}", query))
    }

    pub async fn table(&self, name: &str) -> Result<DataFrame> {
        self.ctx
            .table(TableReference::bare(name))
            .await
            .with_context(|| format!("opening view `{}`", name))
    }

    pub async fn collect(df: DataFrame) -> Result<Vec<RecordBatch>> {
        df.collect().await.context("executing query")
    }
}

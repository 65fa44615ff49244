use anyhow::Result;
use earnings::{config::ReportConfig, report};
use std::env;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    // logs go to stderr, result tables to stdout
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .with_writer(std::io::stderr)
        .init();
    info!("startup");

    // ─── 2) configure ────────────────────────────────────────────────
    let config = match env::args().nth(1) {
        Some(path) => {
            info!(config = %path, "loading config");
            ReportConfig::load(&path)?
        }
        None => ReportConfig::default(),
    };
    info!(
        input = %config.input.path,
        output = %config.output.csv_path.display(),
        "configured"
    );

    // ─── 3) run the report ───────────────────────────────────────────
    let report = match report::run(&config).await {
        Ok(r) => r,
        Err(e) => {
            error!("report failed: {:#}", e);
            return Err(e);
        }
    };

    let disagreements = report
        .outcomes
        .iter()
        .filter(|o| !o.agreement.is_same())
        .count();
    info!(
        queries = report.outcomes.len(),
        disagreements,
        rows = report.manifest.rows_loaded,
        "all done"
    );
    Ok(())
}

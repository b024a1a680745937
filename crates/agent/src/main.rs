//! `ikd-agent` -- headless driver for one unit's IKD page.
//!
//! Opens the unit page against the backend, keeps the evidence map in
//! sync and logs every page event as JSON. On Ctrl-C it writes the
//! report (xlsx + PDF) into the export directory and shuts down.
//!
//! # Environment variables
//!
//! | Variable                   | Required | Default     | Description                        |
//! |----------------------------|----------|-------------|------------------------------------|
//! | `IKD_API_URL`              | yes      | --          | Backend base URL                   |
//! | `IKD_API_TOKEN`            | yes      | --          | Bearer token                       |
//! | `IKD_UNIT_KERJA`           | yes      | --          | Unit slug or label, e.g. `akademik`|
//! | `IKD_POLL_INTERVAL_SECS`   | no       | `5`         | Evidence poll period (2..=30)      |
//! | `IKD_SCORE_DEBOUNCE_MS`    | no       | `500`       | Score edit debounce                |
//! | `IKD_REQUEST_TIMEOUT_SECS` | no       | `30`        | HTTP timeout                       |
//! | `IKD_PAGE_SIZE`            | no       | `10`        | Roster rows per page               |
//! | `IKD_CONTENT_RULE`         | no       | `positive`  | `positive` or `nonzero`            |
//! | `IKD_EXPORT_DIR`           | no       | `./exports` | Report output directory            |

use std::sync::Arc;

use anyhow::Context;
use tokio::sync::broadcast;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ikd_client::{ClientConfig, IkdApi, PageEvent, UnitPage};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ikd_agent=info,ikd_client=info,ikd_export=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ClientConfig::from_env().context("invalid configuration")?;

    tracing::info!(
        api_url = %config.api_url,
        unit = %config.page.unit,
        poll_interval_secs = config.page.poll_interval.as_secs(),
        "Starting ikd-agent",
    );

    let api = IkdApi::new(&config.api_url, &config.api_token, config.request_timeout)
        .context("failed to build HTTP client")?;
    let page = UnitPage::open(Arc::new(api), config.page.clone())
        .await
        .context("failed to open unit page")?;

    let roster = page.roster_view();
    tracing::info!(
        lecturers = roster.total,
        pages = roster.total_pages,
        evidence = page.evidence_snapshot().len(),
        "Unit page ready",
    );

    let mut events = page.subscribe();
    let logged_out = tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown requested");
            false
        }
        _ = log_events(&mut events) => true,
    };

    if !logged_out {
        let report = page.report();
        let (xlsx, pdf) = ikd_export::write_exports(&config.export_dir, &report)
            .context("failed to write report")?;
        tracing::info!(xlsx = %xlsx.display(), pdf = %pdf.display(), "Report written");
    }

    page.shutdown().await;

    if logged_out {
        anyhow::bail!("session expired, obtain a new IKD_API_TOKEN");
    }
    Ok(())
}

/// Log page events until the session is logged out.
async fn log_events(events: &mut broadcast::Receiver<PageEvent>) {
    loop {
        match events.recv().await {
            Ok(PageEvent::LoggedOut) => {
                tracing::error!("Backend rejected the token");
                return;
            }
            Ok(PageEvent::Alert { message }) => {
                tracing::warn!(%message, "Page alert");
            }
            Ok(event) => {
                let json = serde_json::to_string(&event).unwrap_or_default();
                tracing::debug!(event = %json, "Page event");
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Event log lagging");
            }
            Err(broadcast::error::RecvError::Closed) => {
                // The page lives until shutdown; wait for Ctrl-C instead.
                std::future::pending::<()>().await;
            }
        }
    }
}

use std::collections::HashSet;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use crate::browser::{Session, SessionOptions};
use crate::config::AppConfig;
use crate::db::AppRepo;
use crate::detect::{self, Eligibility};
use crate::model::{AppRecord, RunSummary};
use crate::notify::Notifier;
use crate::page;

const RETRY_PAUSE: Duration = Duration::from_secs(2);

/// One full detection pass: load config, read the candidate list, walk
/// every app through the remote browser and report what was found.
/// Per-record failures are logged and counted, never fatal; only a
/// failure to acquire config, database or browser aborts the run.
pub async fn run() -> Result<()> {
    let config = AppConfig::load().await?;
    info!(
        chrome_remote = %config.chrome_remote,
        mysql_host = %config.db.mysql.host,
        mysql_database = %config.db.mysql.database,
        blacklist = config.app.blacklist.len(),
        webhook_set = !config.notify.webhook_url.is_empty(),
        debug = config.debug,
        "config loaded"
    );

    let notifier = if config.notify.webhook_url.is_empty() {
        warn!("notify.webhook-url is empty, detections will be logged only");
        None
    } else {
        Some(Notifier::new(config.notify.webhook_url.clone())?)
    };

    let repo = AppRepo::connect(&config.db.mysql).await?;
    if let Err(err) = repo.ping().await {
        repo.close().await;
        return Err(err);
    }
    let records = match repo.fetch_candidates().await {
        Ok(records) => records,
        Err(err) => {
            repo.close().await;
            return Err(err);
        }
    };
    info!(candidates = records.len(), "loaded candidate apps");

    let options = SessionOptions {
        headless: !config.debug,
        page_load_timeout: Duration::from_secs(config.app.page_load_timeout_seconds),
    };
    let session = match Session::open(&config.chrome_remote, &options).await {
        Ok(session) => session,
        Err(err) => {
            repo.close().await;
            return Err(anyhow::Error::new(err).context("open webdriver session"));
        }
    };

    let summary = scan_records(&config, &session, notifier.as_ref(), &records).await;

    if let Err(err) = session.quit().await {
        warn!("webdriver session teardown failed: {}", err);
    }
    repo.close().await;

    info!(
        scanned = summary.scanned,
        skipped = summary.skipped,
        flagged = summary.flagged,
        failed = summary.failed,
        "detection run complete"
    );
    Ok(())
}

async fn scan_records(
    config: &AppConfig,
    session: &Session,
    notifier: Option<&Notifier>,
    records: &[AppRecord],
) -> RunSummary {
    let blacklist: HashSet<&str> = config.app.blacklist.iter().map(String::as_str).collect();
    let mut summary = RunSummary::default();
    for record in records {
        match detect::check_record(record, &blacklist) {
            Eligibility::InvalidId => {
                warn!(uuid = %record.uuid, name = %record.name, "not a scannable app id, skipping");
                summary.record_skipped();
                continue;
            }
            Eligibility::Blacklisted => {
                warn!(uuid = %record.uuid, name = %record.name, "blacklisted, skipping");
                summary.record_skipped();
                continue;
            }
            Eligibility::Eligible => {}
        }
        match scan_one(config, session, notifier, record).await {
            Ok(flagged) => {
                summary.record_scanned();
                if flagged {
                    summary.record_flagged();
                }
            }
            Err(err) => {
                summary.record_failed();
                error!(uuid = %record.uuid, name = %record.name, "detection failed: {:#}", err);
            }
        }
    }
    summary
}

/// Scans a single app and returns whether it was flagged.
async fn scan_one(
    config: &AppConfig,
    session: &Session,
    notifier: Option<&Notifier>,
    record: &AppRecord,
) -> Result<bool> {
    let url = detect::detect_url(&config.app.detect_api, &record.uuid);
    navigate_with_retry(session, &url, config.app.navigation_retries).await?;
    let html = session.page_source().await.context("fetch page source")?;
    let notice = page::extract_notice(&html);
    info!(
        uuid = %record.uuid,
        name = %record.name,
        title = %notice.title,
        description = %notice.description,
        "page notice"
    );

    let Some(token) = detect::matched_token(&notice.title) else {
        return Ok(false);
    };
    info!(uuid = %record.uuid, name = %record.name, token = %token, "warning phrase detected");
    if let Some(notifier) = notifier {
        if let Err(err) = notifier.send(record, &notice).await {
            warn!(uuid = %record.uuid, "alert webhook failed: {:#}", err);
        }
    }
    Ok(true)
}

async fn navigate_with_retry(session: &Session, url: &str, retries: u32) -> Result<()> {
    let mut attempt = 0;
    loop {
        match session.navigate(url).await {
            Ok(()) => return Ok(()),
            Err(err) if attempt < retries => {
                attempt += 1;
                warn!(url = %url, attempt, "navigation failed, retrying: {}", err);
                tokio::time::sleep(RETRY_PAUSE).await;
            }
            Err(err) => {
                return Err(anyhow::Error::new(err).context(format!("navigate to {url}")));
            }
        }
    }
}

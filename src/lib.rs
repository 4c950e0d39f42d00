//! Batch watcher that checks released WeChat mini-programs against their
//! public verification pages and pushes an alert when one has been
//! suspended or banned.

mod app;
mod browser;
mod config;
mod db;
mod detect;
mod error;
mod model;
mod notify;
mod page;

pub use config::AppConfig;

pub async fn run() -> anyhow::Result<()> {
    app::run().await
}

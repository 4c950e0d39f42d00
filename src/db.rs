use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions};
use sqlx::MySqlPool;

use crate::config::MysqlConfig;
use crate::model::AppRecord;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Candidate rows: released WeChat mini-programs only.
const CANDIDATE_QUERY: &str =
    "SELECT uuid, name FROM mapps WHERE platform_type = 2 AND status = 1";

#[derive(Clone)]
pub struct AppRepo {
    pool: MySqlPool,
}

impl AppRepo {
    pub async fn connect(config: &MysqlConfig) -> Result<Self> {
        let options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.username)
            .password(&config.password)
            .database(&config.database)
            .charset("utf8");
        let pool = MySqlPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(CONNECT_TIMEOUT)
            .connect_with(options)
            .await
            .with_context(|| format!("connect to mysql at {}:{}", config.host, config.port))?;
        Ok(Self { pool })
    }

    pub async fn ping(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("mysql ping")?;
        Ok(())
    }

    pub async fn fetch_candidates(&self) -> Result<Vec<AppRecord>> {
        let rows: Vec<(Option<String>, Option<String>)> = sqlx::query_as(CANDIDATE_QUERY)
            .fetch_all(&self.pool)
            .await
            .context("query candidate apps")?;
        Ok(rows
            .into_iter()
            .map(|(uuid, name)| AppRecord {
                uuid: uuid.unwrap_or_default(),
                name: name.unwrap_or_default(),
            })
            .collect())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

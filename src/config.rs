use std::env;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use tokio::fs;

const DEFAULT_CONFIG_PATH: &str = "./cfg.yaml";
const DEFAULT_CHROME_REMOTE: &str = "http://127.0.0.1:4444/wd/hub";

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    pub debug: bool,
    #[serde(rename = "chrome-remote")]
    pub chrome_remote: String,
    pub app: AppSection,
    pub db: DbSection,
    pub notify: NotifySection,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            debug: false,
            chrome_remote: DEFAULT_CHROME_REMOTE.to_string(),
            app: AppSection::default(),
            db: DbSection::default(),
            notify: NotifySection::default(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AppSection {
    pub blacklist: Vec<String>,
    #[serde(rename = "detect-api")]
    pub detect_api: String,
    #[serde(rename = "page-load-timeout-seconds")]
    pub page_load_timeout_seconds: u64,
    #[serde(rename = "navigation-retries")]
    pub navigation_retries: u32,
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            blacklist: Vec::new(),
            detect_api: String::new(),
            page_load_timeout_seconds: 30,
            navigation_retries: 1,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct DbSection {
    pub mysql: MysqlConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MysqlConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    pub password: String,
}

impl Default for MysqlConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3306,
            database: "mysql".to_string(),
            username: String::new(),
            password: String::new(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct NotifySection {
    #[serde(rename = "webhook-url")]
    pub webhook_url: String,
}

impl AppConfig {
    /// Reads the config file named by `MPWATCH_CONFIG` (default `./cfg.yaml`).
    /// A missing or malformed file is an error, not a silent fallback.
    pub async fn load() -> Result<Self> {
        let path = env::var("MPWATCH_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let file_path = Path::new(&path);
        let content = fs::read_to_string(file_path)
            .await
            .with_context(|| format!("read config file {}", file_path.display()))?;
        Self::from_yaml_str(&content)
            .with_context(|| format!("load config file {}", file_path.display()))
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let mut config: AppConfig = serde_yaml::from_str(content)?;
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    pub fn normalize(&mut self) {
        self.chrome_remote = self.chrome_remote.trim().to_string();
        self.app.detect_api = self.app.detect_api.trim().to_string();
        self.notify.webhook_url = self.notify.webhook_url.trim().to_string();
        self.db.mysql.host = self.db.mysql.host.trim().to_string();
        self.db.mysql.database = self.db.mysql.database.trim().to_string();
        self.db.mysql.username = self.db.mysql.username.trim().to_string();
        if self.db.mysql.port == 0 {
            self.db.mysql.port = 3306;
        }
        self.app.blacklist = normalize_id_list(&self.app.blacklist);
    }

    pub fn validate(&self) -> Result<()> {
        if self.chrome_remote.is_empty() {
            return Err(anyhow!("chrome-remote must not be empty"));
        }
        if self.app.detect_api.is_empty() {
            return Err(anyhow!("app.detect-api must not be empty"));
        }
        if !self.app.detect_api.contains("{}") {
            return Err(anyhow!("app.detect-api must contain a {{}} placeholder"));
        }
        if self.app.page_load_timeout_seconds == 0 {
            return Err(anyhow!("app.page-load-timeout-seconds must be greater than 0"));
        }
        if self.db.mysql.host.is_empty() {
            return Err(anyhow!("db.mysql.host must not be empty"));
        }
        if self.db.mysql.database.is_empty() {
            return Err(anyhow!("db.mysql.database must not be empty"));
        }
        if self.db.mysql.username.is_empty() {
            return Err(anyhow!("db.mysql.username must not be empty"));
        }
        Ok(())
    }
}

fn normalize_id_list(values: &[String]) -> Vec<String> {
    let mut normalized: Vec<String> = values
        .iter()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .collect();
    normalized.sort();
    normalized.dedup();
    normalized
}

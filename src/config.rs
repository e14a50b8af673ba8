use std::{env, path::PathBuf, str::FromStr, time::Duration};

use anyhow::Result;
use config::{Config as config_config, File as config_file};
use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::{indicator::GrowthBasis, insight::InsightThresholds, logging};

const CONFIG_PATH: &str = "app.json";
const APP_DIR_NAME: &str = "financial_analyzer";

#[derive(Serialize, Deserialize, Default, Debug, Clone)]
pub struct App {
    #[serde(default)]
    pub cache: Cache,
    #[serde(default)]
    pub api: Api,
    #[serde(default)]
    pub insight: InsightThresholds,
    #[serde(default)]
    pub analysis: Analysis,
    #[serde(default)]
    pub server: Server,
}

const CACHE_DIR: &str = "CACHE_DIR";

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Cache {
    /// 快取目錄，預設為使用者層級的快取目錄
    #[serde(default = "default_cache_dir")]
    pub dir: String,
}

impl Default for Cache {
    fn default() -> Self {
        Cache {
            dir: default_cache_dir(),
        }
    }
}

const API_TWSE_BASE_URL: &str = "API_TWSE_BASE_URL";
const API_TPEX_BASE_URL: &str = "API_TPEX_BASE_URL";
const API_TIMEOUT_SECS: &str = "API_TIMEOUT_SECS";
const API_MAX_RETRIES: &str = "API_MAX_RETRIES";
const API_RETRY_DELAY_MS: &str = "API_RETRY_DELAY_MS";

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Api {
    #[serde(default = "default_twse_base_url")]
    pub twse_base_url: String,
    #[serde(default = "default_tpex_base_url")]
    pub tpex_base_url: String,
    /// 單次請求逾時
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// 第一次失敗後最多再重試幾次
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,
    /// 退避的起始間隔，之後每次加倍
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl Default for Api {
    fn default() -> Self {
        Api {
            twse_base_url: default_twse_base_url(),
            tpex_base_url: default_tpex_base_url(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

impl Api {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

const ANALYSIS_GROWTH_BASIS: &str = "ANALYSIS_GROWTH_BASIS";

#[derive(Serialize, Deserialize, Default, Debug, Clone)]
pub struct Analysis {
    #[serde(default)]
    pub growth_basis: GrowthBasis,
}

const SERVER_PORT: &str = "SERVER_PORT";

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Server {
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for Server {
    fn default() -> Self {
        Server {
            port: default_port(),
        }
    }
}

const INSIGHT_ROE_HIGH: &str = "INSIGHT_ROE_HIGH";
const INSIGHT_ROE_LOW: &str = "INSIGHT_ROE_LOW";
const INSIGHT_GROWTH_HIGHLIGHT: &str = "INSIGHT_GROWTH_HIGHLIGHT";
const INSIGHT_GROWTH_RISK: &str = "INSIGHT_GROWTH_RISK";
const INSIGHT_DEBT_RATIO_HIGH: &str = "INSIGHT_DEBT_RATIO_HIGH";

pub static SETTINGS: Lazy<App> = Lazy::new(|| {
    App::get().unwrap_or_else(|why| {
        logging::error_console(format!(
            "I can't read the config context because {:?}, falling back to defaults",
            why
        ));
        App::default().override_with_env()
    })
});

impl App {
    fn get() -> Result<Self> {
        let config_path = config_path();
        if config_path.exists() {
            let config: App = config_config::builder()
                .add_source(config_file::from(config_path))
                .build()?
                .try_deserialize()?;
            return Ok(config.override_with_env());
        }

        Ok(App::default().override_with_env())
    }

    /// 將來至於 env 的設定值覆蓋掉 json 上的設定值
    fn override_with_env(mut self) -> Self {
        if let Ok(dir) = env::var(CACHE_DIR) {
            self.cache.dir = dir;
        }

        if let Ok(url) = env::var(API_TWSE_BASE_URL) {
            self.api.twse_base_url = url;
        }

        if let Ok(url) = env::var(API_TPEX_BASE_URL) {
            self.api.tpex_base_url = url;
        }

        override_parsed(API_TIMEOUT_SECS, &mut self.api.timeout_secs);
        override_parsed(API_MAX_RETRIES, &mut self.api.max_retries);
        override_parsed(API_RETRY_DELAY_MS, &mut self.api.retry_delay_ms);
        override_parsed(SERVER_PORT, &mut self.server.port);

        override_parsed::<Decimal>(INSIGHT_ROE_HIGH, &mut self.insight.roe_high);
        override_parsed::<Decimal>(INSIGHT_ROE_LOW, &mut self.insight.roe_low);
        override_parsed::<Decimal>(INSIGHT_GROWTH_HIGHLIGHT, &mut self.insight.growth_highlight);
        override_parsed::<Decimal>(INSIGHT_GROWTH_RISK, &mut self.insight.growth_risk);
        override_parsed::<Decimal>(INSIGHT_DEBT_RATIO_HIGH, &mut self.insight.debt_ratio_high);

        if let Ok(basis) = env::var(ANALYSIS_GROWTH_BASIS) {
            match basis.parse::<GrowthBasis>() {
                Ok(basis) => self.analysis.growth_basis = basis,
                Err(why) => logging::error_file_async(format!(
                    "Failed to parse {}={} because {:?}",
                    ANALYSIS_GROWTH_BASIS, basis, why
                )),
            }
        }

        self
    }

    pub fn cache_dir(&self) -> PathBuf {
        PathBuf::from(&self.cache.dir)
    }
}

/// 環境變數存在且可解析時覆寫，解析失敗則記錄後保留原值
fn override_parsed<T>(key: &str, target: &mut T)
where
    T: FromStr,
    T::Err: std::fmt::Debug,
{
    if let Ok(raw) = env::var(key) {
        match raw.trim().parse::<T>() {
            Ok(value) => *target = value,
            Err(why) => logging::error_file_async(format!(
                "Failed to parse {}={} because {:?}",
                key, raw, why
            )),
        }
    }
}

/// 回傳設定檔的路徑
fn config_path() -> PathBuf {
    PathBuf::from(CONFIG_PATH)
}

/// 使用者的快取目錄，例如 Linux 的 `~/.cache/financial_analyzer`、macOS 的 `~/Library/Caches/financial_analyzer`
fn default_cache_dir() -> String {
    dirs::cache_dir()
        .unwrap_or_else(env::temp_dir)
        .join(APP_DIR_NAME)
        .to_string_lossy()
        .to_string()
}

fn default_twse_base_url() -> String {
    "https://openapi.twse.com.tw/v1".to_string()
}

fn default_tpex_base_url() -> String {
    "https://www.tpex.org.tw/openapi/v1".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> usize {
    2
}

fn default_retry_delay_ms() -> u64 {
    2000
}

fn default_port() -> u16 {
    8501
}

/// 預設的判讀門檻，詳見 DESIGN.md
pub(crate) fn default_roe_high() -> Decimal {
    dec!(0.15)
}

pub(crate) fn default_roe_low() -> Decimal {
    dec!(0.05)
}

pub(crate) fn default_growth_highlight() -> Decimal {
    dec!(0.10)
}

pub(crate) fn default_growth_risk() -> Decimal {
    dec!(0)
}

pub(crate) fn default_debt_ratio_high() -> Decimal {
    dec!(0.60)
}

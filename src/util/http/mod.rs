use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use once_cell::sync::{Lazy, OnceCell};
use reqwest::{header, Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;

use crate::logging::Logger;

/// A singleton instance of the reqwest client.
static CLIENT: OnceCell<Client> = OnceCell::new();

static LOGGER: Lazy<Logger> = Lazy::new(|| Logger::new("http"));

const USER_AGENT: &str = concat!(
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) ",
    "AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36"
);

/// 預設的請求逾時秒數，未呼叫 [`init_client`] 時使用
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// 以指定的逾時設定建立 client，只有第一次呼叫有效。
///
/// 之後呼叫時回傳既有的 client。
pub fn init_client(timeout: Duration) -> Result<&'static Client> {
    CLIENT.get_or_try_init(|| build_client(timeout))
}

/// Returns the reqwest client singleton instance or creates one if it doesn't exist.
fn get_client() -> Result<&'static Client> {
    init_client(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
}

fn build_client(timeout: Duration) -> Result<Client> {
    // reqwest 使用 rustls-no-provider，需要先安裝加密實作；重複安裝會回傳 Err，可忽略
    let _ = rustls::crypto::ring::default_provider().install_default();

    Client::builder()
        // ===== 壓縮 =====
        .brotli(true)
        .gzip(true)
        .zstd(true)
        // ===== 超時設置 =====
        .connect_timeout(Duration::from_secs(8))
        .timeout(timeout)
        // ===== 連接池 =====
        .pool_max_idle_per_host(4)
        .pool_idle_timeout(Duration::from_secs(90))
        .redirect(reqwest::redirect::Policy::limited(5))
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| anyhow!("Failed to create reqwest client: {:?}", e))
}

/// Performs an HTTP GET request and deserializes the JSON response into the specified type.
///
/// Non-2xx responses and bodies that fail to deserialize are both returned as errors.
pub async fn get_json<RES: DeserializeOwned>(url: &str) -> Result<RES> {
    let body = get(url, None).await?;

    serde_json::from_str::<RES>(&body).map_err(|e| {
        let preview: String = body.chars().take(120).collect();
        anyhow!("Error parsing response JSON({}): {:?}", preview, e)
    })
}

/// Performs an HTTP GET request and returns the response as text.
pub async fn get(url: &str, headers: Option<header::HeaderMap>) -> Result<String> {
    send(Method::GET, url, headers)
        .await?
        .text()
        .await
        .map_err(|e| anyhow!("Error parsing response text: {:?}", e))
}

/// Sends a single HTTP request and rejects non-success status codes.
///
/// 重試由呼叫端以 `tokio-retry` 的退避策略處理，這裡只負責一次往返與記錄耗時。
async fn send(method: Method, url: &str, headers: Option<header::HeaderMap>) -> Result<Response> {
    let visit_log = format!("{method}:{url}");
    let client = get_client()?;
    let mut rb: RequestBuilder = client.request(method, url);

    if let Some(h) = headers {
        rb = rb.headers(h);
    }

    let start = Instant::now();
    let res = rb.send().await;
    let elapsed = start.elapsed().as_millis();

    match res {
        Ok(response) => {
            let status = response.status();
            if !status.is_success() {
                LOGGER.error(format!("{} returned {} in {} ms", visit_log, status, elapsed));
                return Err(anyhow!("{} returned status {}", visit_log, status));
            }

            LOGGER.info(format!("{} {} ms", visit_log, elapsed));
            Ok(response)
        }
        Err(why) => {
            LOGGER.error(format!("{} failed because {:?}. {} ms", visit_log, why, elapsed));
            Err(anyhow!("Failed to send request to {}: {:?}", url, why))
        }
    }
}

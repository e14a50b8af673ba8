use std::{sync::Arc, time::Duration};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use hashbrown::HashMap;
use serde_json::{Map, Value};
use tokio_retry::{
    strategy::{jitter, ExponentialBackoff},
    Retry,
};

use crate::{
    cache::{CacheStore, RawTable},
    company,
    config,
    declare::{FiscalPeriod, Quarter, StockExchange, Unit},
    error::FinanceError,
    logging,
    util::{self, datetime, text},
};

/// 台灣證券櫃檯買賣中心
pub mod tpex;
/// 台灣證券交易所
pub mod twse;

/// 退避間隔的上限
const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

/// 對遠端發出單次請求，回傳原始的回應內容
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get_text(&self, url: &str) -> Result<String>;
}

/// 以共用的 reqwest client 發出請求
#[derive(Debug, Default, Clone, Copy)]
pub struct HttpTransport;

#[async_trait]
impl Transport for HttpTransport {
    async fn get_text(&self, url: &str) -> Result<String> {
        util::http::get(url, None).await
    }
}

/// 紀年方式
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Calendar {
    /// 民國紀年
    Roc,
    Gregorian,
}

/// 原始欄名對應到的標準欄位
#[derive(Debug)]
pub struct Columns {
    /// 出表日期
    pub published: &'static str,
    pub code: &'static str,
    pub year: &'static str,
    /// 季別，空白或 0 代表年度財報
    pub season: &'static str,
    pub revenue: &'static str,
    pub operating_income: &'static str,
    pub net_income: &'static str,
    pub total_assets: &'static str,
    pub total_liabilities: &'static str,
    pub equity: &'static str,
}

/// 各交易所的資料格式描述
#[derive(Debug)]
pub struct SourceSchema {
    pub exchange: StockExchange,
    pub income_statement_path: &'static str,
    pub balance_sheet_path: &'static str,
    pub calendar: Calendar,
    pub unit: Unit,
    pub columns: Columns,
}

impl SourceSchema {
    pub fn of(exchange: StockExchange) -> &'static SourceSchema {
        match exchange {
            StockExchange::TWSE => &twse::SCHEMA,
            StockExchange::TPEx => &tpex::SCHEMA,
        }
    }

    /// 將年度與季別欄位轉成西元的期別
    pub fn period(&self, year: &str, season: &str) -> Option<FiscalPeriod> {
        let year = text::parse_i32(year, None).ok()?;
        let year = match self.calendar {
            Calendar::Roc => datetime::roc_year_to_gregorian_year(year),
            Calendar::Gregorian => year,
        };

        let season = season.trim();
        if season.is_empty() {
            return Some(FiscalPeriod::annual(year));
        }

        match text::parse_i32(season, None).ok()? {
            0 => Some(FiscalPeriod::annual(year)),
            s => Quarter::from_serial(u32::try_from(s).ok()?)
                .map(|quarter| FiscalPeriod::quarterly(year, quarter)),
        }
    }

    /// 損益表與資產負債表以 (公司, 年度, 季別) 對應的鍵
    fn join_key(&self, table: &RawTable, row: &[String]) -> (String, String, String) {
        let value = |column: &str| table.value(row, column).unwrap_or("").trim().to_string();
        (
            value(self.columns.code),
            value(self.columns.year),
            value(self.columns.season),
        )
    }

    fn entry(
        &self,
        table: &RawTable,
        row: &[String],
        snapshot_date: NaiveDate,
    ) -> Option<RawStatementEntry> {
        let value = |column: &str| table.value(row, column).unwrap_or("").trim().to_string();
        let company_code = value(self.columns.code);
        let year = value(self.columns.year);
        let season = value(self.columns.season);

        let period = match self.period(&year, &season) {
            Some(period) => period,
            None => {
                logging::warn_file_async(format!(
                    "Skip {} row of {} in snapshot {}: invalid period year='{}' season='{}'",
                    self.exchange, company_code, snapshot_date, year, season
                ));
                return None;
            }
        };

        Some(RawStatementEntry {
            exchange: self.exchange,
            published_on: published_date(&value(self.columns.published)),
            company_code,
            period,
            revenue: value(self.columns.revenue),
            operating_income: value(self.columns.operating_income),
            net_income: value(self.columns.net_income),
            total_assets: value(self.columns.total_assets),
            total_liabilities: value(self.columns.total_liabilities),
            equity: value(self.columns.equity),
            unit: self.unit,
            snapshot_date,
        })
    }
}

/// 已對應到標準欄位、尚未轉換型別的單筆財報
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawStatementEntry {
    pub exchange: StockExchange,
    pub company_code: String,
    pub period: FiscalPeriod,
    pub revenue: String,
    pub operating_income: String,
    pub net_income: String,
    pub total_assets: String,
    pub total_liabilities: String,
    pub equity: String,
    /// 金額單位
    pub unit: Unit,
    /// 出表日期
    pub published_on: Option<NaiveDate>,
    /// 來源快照的日期
    pub snapshot_date: NaiveDate,
}

/// 重試策略：第一次失敗後最多再試 `max_retries` 次，間隔由 `delay` 起逐次加倍
#[derive(Debug, Copy, Clone)]
pub struct RetryPolicy {
    pub max_retries: usize,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        let api = config::Api::default();
        RetryPolicy {
            max_retries: api.max_retries,
            delay: Duration::from_millis(api.retry_delay_ms),
        }
    }
}

impl RetryPolicy {
    fn strategy(&self) -> impl Iterator<Item = Duration> {
        // from_millis(2) 每次乘 2，factor 讓第一次的間隔等於 delay
        let factor = u64::try_from(self.delay.as_millis() / 2).unwrap_or(u64::MAX);
        ExponentialBackoff::from_millis(2)
            .factor(factor)
            .max_delay(MAX_RETRY_DELAY)
            .map(jitter)
            .take(self.max_retries)
    }
}

type Clock = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

/// 取得財報的入口：先查當天快取，未命中才向交易所抓取並寫回快取
pub struct StatementClient {
    transport: Arc<dyn Transport>,
    cache: CacheStore,
    twse_base_url: String,
    tpex_base_url: String,
    retry: RetryPolicy,
    clock: Clock,
}

impl StatementClient {
    pub fn new(transport: Arc<dyn Transport>, cache: CacheStore) -> Self {
        let api = config::Api::default();
        StatementClient {
            transport,
            cache,
            twse_base_url: api.twse_base_url,
            tpex_base_url: api.tpex_base_url,
            retry: RetryPolicy::default(),
            clock: Arc::new(datetime::today),
        }
    }

    /// 依設定檔的 api 區段建立
    pub fn from_config(transport: Arc<dyn Transport>, cache: CacheStore, api: &config::Api) -> Self {
        Self::new(transport, cache)
            .with_base_urls(&api.twse_base_url, &api.tpex_base_url)
            .with_retry(RetryPolicy {
                max_retries: api.max_retries,
                delay: Duration::from_millis(api.retry_delay_ms),
            })
    }

    pub fn with_base_urls(mut self, twse: &str, tpex: &str) -> Self {
        self.twse_base_url = twse.trim_end_matches('/').to_string();
        self.tpex_base_url = tpex.trim_end_matches('/').to_string();
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// 替換取得「今天」的方式
    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> NaiveDate + Send + Sync + 'static,
    {
        self.clock = Arc::new(clock);
        self
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    /// 取得公司所有可用期別的原始財報，依期別遞增排序。
    ///
    /// 股號不在清單內或交易所不符時，在任何 I/O 之前回傳查詢錯誤。
    /// 遠端重試後仍失敗時，改用既有的歷史快照；連快照都沒有才回傳 `DataUnavailable`。
    pub async fn fetch_statements(
        &self,
        exchange: StockExchange,
        company_code: &str,
    ) -> crate::error::Result<Vec<RawStatementEntry>> {
        let company = company::resolve(exchange, company_code)?;
        let schema = SourceSchema::of(exchange);
        let today = (self.clock)();

        let mut snapshots: Vec<(NaiveDate, RawTable)> = Vec::new();
        for date in self.cache.snapshot_dates(exchange) {
            if date >= today {
                continue;
            }
            if let Some(table) = self.cache.get(exchange, date) {
                snapshots.push((date, table));
            }
        }

        let today_table = match self.cache.get(exchange, today) {
            Some(table) => Some(table),
            None => match self.fetch_remote(schema).await {
                Ok(table) => {
                    if let Err(why) = self.cache.put(exchange, today, &table, today) {
                        logging::warn_file_async(format!(
                            "Failed to write {} snapshot through to cache because {}",
                            exchange, why
                        ));
                    }
                    Some(table)
                }
                Err(why) => {
                    if snapshots.is_empty() {
                        return Err(FinanceError::DataUnavailable(format!(
                            "{} statements could not be fetched and no snapshot is cached",
                            exchange.name()
                        )));
                    }

                    logging::warn_file_async(format!(
                        "Using {} cached {} snapshots for {} because {}",
                        snapshots.len(),
                        exchange,
                        company.code,
                        why
                    ));
                    None
                }
            },
        };

        if let Some(table) = today_table {
            snapshots.push((today, table));
        }

        Ok(merge_snapshots(schema, company.code, &snapshots))
    }

    /// 抓取損益表與資產負債表後合併成一張表
    async fn fetch_remote(&self, schema: &SourceSchema) -> Result<RawTable> {
        let base_url = match schema.exchange {
            StockExchange::TWSE => &self.twse_base_url,
            StockExchange::TPEx => &self.tpex_base_url,
        };

        let income_url = format!("{}{}", base_url, schema.income_statement_path);
        let balance_url = format!("{}{}", base_url, schema.balance_sheet_path);

        let income = self.fetch_table_with_retry(&income_url).await?;
        let balance = self.fetch_table_with_retry(&balance_url).await?;

        Ok(join_tables(schema, &income, &balance))
    }

    async fn fetch_table_with_retry(&self, url: &str) -> Result<RawTable> {
        let retry_future = Retry::start(self.retry.strategy(), || self.fetch_table(url));
        retry_future
            .await
            .map_err(|why| anyhow!("Failed to fetch {} after retries because {:?}", url, why))
    }

    async fn fetch_table(&self, url: &str) -> Result<RawTable> {
        let body = self.transport.get_text(url).await?;
        table_from_json(&body)
    }
}

/// 出表日期兩家交易所都可能用民國年，依年份位數判斷
fn published_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let year_digits = raw.chars().take_while(|c| c.is_ascii_digit()).count();

    if year_digits == 8 || (year_digits == 4 && raw.len() > 4) {
        datetime::parse_gregorian_date(raw)
    } else {
        datetime::parse_taiwan_date(raw)
    }
}

/// 將 JSON 陣列轉成表格，欄位為所有物件鍵的聯集
fn table_from_json(body: &str) -> Result<RawTable> {
    let objects = serde_json::from_str::<Vec<Map<String, Value>>>(body).map_err(|why| {
        let preview: String = body.chars().take(120).collect();
        anyhow!("Error parsing response JSON({}): {:?}", preview, why)
    })?;

    let mut columns: Vec<String> = Vec::new();
    for object in &objects {
        for key in object.keys() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
    }

    let mut table = RawTable::new(columns);
    for object in &objects {
        let row = table
            .columns
            .iter()
            .map(|column| match object.get(column) {
                Some(Value::String(s)) => s.clone(),
                Some(Value::Null) | None => String::new(),
                Some(other) => other.to_string(),
            })
            .collect();
        table.push_row(row);
    }

    Ok(table)
}

/// 以 (公司, 年度, 季別) 合併兩張表；相同欄名以損益表為準
fn join_tables(schema: &SourceSchema, income: &RawTable, balance: &RawTable) -> RawTable {
    let mut columns = income.columns.clone();
    for column in &balance.columns {
        if !columns.contains(column) {
            columns.push(column.clone());
        }
    }

    let mut balance_rows: HashMap<(String, String, String), &Vec<String>> = balance
        .rows
        .iter()
        .map(|row| (schema.join_key(balance, row), row))
        .collect();

    let mut joined = RawTable::new(columns);
    let mut rows = Vec::with_capacity(income.len() + balance.len());

    for row in &income.rows {
        let matched = balance_rows.remove(&schema.join_key(income, row));
        rows.push(
            joined
                .columns
                .iter()
                .map(|column| {
                    income
                        .value(row, column)
                        .or_else(|| matched.and_then(|b| balance.value(b, column)))
                        .unwrap_or("")
                        .to_string()
                })
                .collect::<Vec<String>>(),
        );
    }

    // 只出現在資產負債表的公司仍保留，正規化時會因缺少營收而略過
    for row in &balance.rows {
        if balance_rows.remove(&schema.join_key(balance, row)).is_some() {
            rows.push(
                joined
                    .columns
                    .iter()
                    .map(|column| balance.value(row, column).unwrap_or("").to_string())
                    .collect(),
            );
        }
    }

    for row in rows {
        joined.push_row(row);
    }

    joined
}

/// 由舊到新走過每份快照，相同期別以較新的快照為準
fn merge_snapshots(
    schema: &SourceSchema,
    company_code: &str,
    snapshots: &[(NaiveDate, RawTable)],
) -> Vec<RawStatementEntry> {
    let mut by_period: HashMap<FiscalPeriod, RawStatementEntry> = HashMap::new();

    for (date, table) in snapshots {
        for row in &table.rows {
            if table.value(row, schema.columns.code).map(str::trim) != Some(company_code) {
                continue;
            }

            if let Some(entry) = schema.entry(table, row, *date) {
                by_period.insert(entry.period, entry);
            }
        }
    }

    let mut entries: Vec<RawStatementEntry> = by_period.into_values().collect();
    entries.sort_by_key(|e| e.period);
    entries
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use rust_decimal_macros::dec;

    use crate::{error::ErrorKind, processor};

    use super::*;

    const TWSE_BASE: &str = "http://mock/twse";
    const TPEX_BASE: &str = "http://mock/tpex";

    #[derive(Default)]
    struct MockTransport {
        calls: AtomicUsize,
        offline: AtomicBool,
        responses: std::collections::HashMap<String, String>,
    }

    impl MockTransport {
        fn with(mut self, url: String, body: &str) -> Self {
            self.responses.insert(url, body.to_string());
            self
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn get_text(&self, url: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.offline.load(Ordering::SeqCst) {
                return Err(anyhow!("connection refused: {}", url));
            }
            self.responses
                .get(url)
                .cloned()
                .ok_or_else(|| anyhow!("{} returned status 404 Not Found", url))
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn twse_url(path: &str) -> String {
        format!("{}{}", TWSE_BASE, path)
    }

    fn twse_income(season: &str, revenue: &str) -> String {
        format!(
            r#"[{{"出表日期":"1131018","年度":"113","季別":"{season}","公司代號":"2727","公司名稱":"王品","營業收入":"{revenue}","營業利益（損失）":"115000","本期淨利（淨損）":"90000"}},
               {{"出表日期":"1131018","年度":"113","季別":"{season}","公司代號":"2330","公司名稱":"台積電","營業收入":"1","營業利益（損失）":"1","本期淨利（淨損）":"1"}}]"#
        )
    }

    fn twse_balance(season: &str) -> String {
        format!(
            r#"[{{"出表日期":"1131018","年度":"113","季別":"{season}","公司代號":"2727","公司名稱":"王品","資產總額":"1000000","負債總額":"400000","權益總額":"600000"}}]"#
        )
    }

    fn twse_mock(season: &str, revenue: &str) -> MockTransport {
        MockTransport::default()
            .with(twse_url(twse::SCHEMA.income_statement_path), &twse_income(season, revenue))
            .with(twse_url(twse::SCHEMA.balance_sheet_path), &twse_balance(season))
    }

    fn client(transport: Arc<MockTransport>, dir: &std::path::Path, today: NaiveDate) -> StatementClient {
        StatementClient::new(transport, CacheStore::new(dir))
            .with_base_urls(TWSE_BASE, TPEX_BASE)
            .with_retry(RetryPolicy {
                max_retries: 2,
                delay: Duration::from_millis(0),
            })
            .with_clock(move || today)
    }

    #[tokio::test]
    async fn test_unknown_company_makes_no_calls() {
        let dir = tempfile::tempdir().unwrap();
        let transport = Arc::new(twse_mock("2", "1150000"));
        let client = client(transport.clone(), dir.path(), date(2024, 10, 18));

        let err = client
            .fetch_statements(StockExchange::TWSE, "9999")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Lookup);

        let err = client
            .fetch_statements(StockExchange::TWSE, "2729")
            .await
            .unwrap_err();
        assert!(matches!(err, FinanceError::UnsupportedExchange { .. }));

        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_second_fetch_is_served_from_cache() {
        let dir = tempfile::tempdir().unwrap();
        let today = date(2024, 10, 18);
        let transport = Arc::new(twse_mock("2", "1,150,000"));
        let client = client(transport.clone(), dir.path(), today);

        let first = client
            .fetch_statements(StockExchange::TWSE, "2727")
            .await
            .unwrap();
        assert_eq!(transport.calls(), 2);
        assert!(client.cache().contains(StockExchange::TWSE, today));

        let second = client
            .fetch_statements(StockExchange::TWSE, "2727")
            .await
            .unwrap();
        assert_eq!(transport.calls(), 2);
        assert_eq!(first, second);

        assert_eq!(first.len(), 1);
        let entry = &first[0];
        assert_eq!(entry.period, FiscalPeriod::quarterly(2024, Quarter::Q2));
        assert_eq!(entry.revenue, "1,150,000");
        assert_eq!(entry.equity, "600000");
        assert_eq!(entry.total_liabilities, "400000");
        assert_eq!(entry.unit, Unit::ThousandNtd);
        assert_eq!(entry.published_on, Some(date(2024, 10, 18)));
    }

    #[tokio::test]
    async fn test_retries_exhausted() {
        let dir = tempfile::tempdir().unwrap();
        let transport = Arc::new(MockTransport::default());
        transport.offline.store(true, Ordering::SeqCst);
        let client = client(transport.clone(), dir.path(), date(2024, 10, 18));

        let err = client
            .fetch_statements(StockExchange::TWSE, "2727")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataUnavailable);
        assert_eq!(transport.calls(), 3);
    }

    #[tokio::test]
    async fn test_malformed_body_is_retried() {
        let dir = tempfile::tempdir().unwrap();
        let transport = Arc::new(
            MockTransport::default()
                .with(twse_url(twse::SCHEMA.income_statement_path), "<html>busy</html>"),
        );
        let client = client(transport.clone(), dir.path(), date(2024, 10, 18));

        let err = client
            .fetch_statements(StockExchange::TWSE, "2727")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataUnavailable);
        assert_eq!(transport.calls(), 3);
    }

    #[tokio::test]
    async fn test_falls_back_to_past_snapshots() {
        let dir = tempfile::tempdir().unwrap();
        let yesterday = date(2024, 10, 17);

        // 前一天的快照
        let seed = client(Arc::new(twse_mock("1", "900000")), dir.path(), yesterday);
        seed.fetch_statements(StockExchange::TWSE, "2727")
            .await
            .unwrap();

        let transport = Arc::new(MockTransport::default());
        transport.offline.store(true, Ordering::SeqCst);
        let client = client(transport.clone(), dir.path(), date(2024, 10, 18));

        let entries = client
            .fetch_statements(StockExchange::TWSE, "2727")
            .await
            .unwrap();
        assert_eq!(transport.calls(), 3);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].period, FiscalPeriod::quarterly(2024, Quarter::Q1));
        assert_eq!(entries[0].snapshot_date, yesterday);
    }

    #[tokio::test]
    async fn test_snapshots_merge_into_series() {
        let dir = tempfile::tempdir().unwrap();

        for (day, season, revenue) in [(16, "1", "800000"), (17, "2", "900000"), (18, "2", "950000")] {
            let c = client(Arc::new(twse_mock(season, revenue)), dir.path(), date(2024, 10, day));
            c.fetch_statements(StockExchange::TWSE, "2727").await.unwrap();
        }

        let transport = Arc::new(MockTransport::default());
        let client = client(transport.clone(), dir.path(), date(2024, 10, 18));
        let entries = client
            .fetch_statements(StockExchange::TWSE, "2727")
            .await
            .unwrap();

        assert_eq!(transport.calls(), 0);
        let periods: Vec<FiscalPeriod> = entries.iter().map(|e| e.period).collect();
        assert_eq!(
            periods,
            vec![
                FiscalPeriod::quarterly(2024, Quarter::Q1),
                FiscalPeriod::quarterly(2024, Quarter::Q2)
            ]
        );
        // 同一期別取較新的快照
        assert_eq!(entries[1].revenue, "950000");
        assert_eq!(entries[1].snapshot_date, date(2024, 10, 18));
    }

    #[tokio::test]
    async fn test_tpex_schema_is_normalized() {
        let dir = tempfile::tempdir().unwrap();
        let income = r#"[{"Date":"1131018","SecuritiesCompanyCode":"2729","CompanyName":"瓦城","Year":"2024","Season":"3","OperatingRevenue":"3,000,000,000","OperatingIncome":"300000000","NetIncome":"240000000"}]"#;
        let balance = r#"[{"Date":"1131018","SecuritiesCompanyCode":"2729","CompanyName":"瓦城","Year":"2024","Season":"3","TotalAssets":"8000000000","TotalLiabilities":"5000000000","TotalEquity":"3000000000"}]"#;
        let transport = Arc::new(
            MockTransport::default()
                .with(format!("{}{}", TPEX_BASE, tpex::SCHEMA.income_statement_path), income)
                .with(format!("{}{}", TPEX_BASE, tpex::SCHEMA.balance_sheet_path), balance),
        );
        let client = client(transport, dir.path(), date(2024, 10, 18));

        let entries = client
            .fetch_statements(StockExchange::TPEx, "2729")
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].unit, Unit::Ntd);
        assert_eq!(entries[0].published_on, Some(date(2024, 10, 18)));

        let statements = processor::normalize(&entries);
        let statement = &statements[0];
        assert_eq!(statement.period, FiscalPeriod::quarterly(2024, Quarter::Q3));
        assert_eq!(statement.revenue, dec!(3000000));
        assert_eq!(statement.net_income, dec!(240000));
        assert_eq!(statement.equity, dec!(3000000));
        assert_eq!(statement.total_assets, Some(dec!(8000000)));
    }

    #[test]
    fn test_join_tables_keeps_unmatched_rows() {
        let income = table_from_json(&twse_income("2", "1")).unwrap();
        let balance = table_from_json(
            r#"[{"公司代號":"2753","年度":"113","季別":"2","權益總額":"5"},
                {"公司代號":"2727","年度":"113","季別":"2","權益總額":"6"}]"#,
        )
        .unwrap();

        let joined = join_tables(&twse::SCHEMA, &income, &balance);
        assert_eq!(joined.len(), 3);
        let equity: Vec<&str> = joined
            .rows
            .iter()
            .map(|row| joined.value(row, "權益總額").unwrap())
            .collect();
        assert_eq!(equity, vec!["6", "", "5"]);
    }

    #[test]
    fn test_published_date() {
        assert_eq!(published_date("1131018"), Some(date(2024, 10, 18)));
        assert_eq!(published_date("113/10/18"), Some(date(2024, 10, 18)));
        assert_eq!(published_date("20241018"), Some(date(2024, 10, 18)));
        assert_eq!(published_date("2024-10-18"), Some(date(2024, 10, 18)));
        assert_eq!(published_date(""), None);
    }

    #[test]
    fn test_table_from_json_values() {
        let table = table_from_json(r#"[{"a":"x","b":1.5},{"a":null,"c":true}]"#).unwrap();
        assert_eq!(table.columns, vec!["a", "b", "c"]);
        assert_eq!(table.rows[0], vec!["x", "1.5", ""]);
        assert_eq!(table.rows[1], vec!["", "", "true"]);
        assert!(table_from_json("not json").is_err());
    }
}

//! 原始財報快取。
//!
//! 每個交易所每天一份 CSV 快照，檔名為 `{exchange}_is_{YYYYMMDD}.csv`，
//! 欄位維持來源 API 的原始欄名（尚未正規化）。
//!
//! - 當天的快照視為最新資料，直接重用、不再發出請求。
//! - 過去日期的快照視為永久有效，寫入後不再覆蓋。
//! - 寫入時先寫到同目錄下的暫存檔，完成後再 rename，讀者不會看到寫到一半的檔案。
//! - 無法讀取或格式錯誤的檔案視同未命中，只記錄不中斷流程。

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use chrono::NaiveDate;
use serde::Serialize;

use crate::{
    declare::StockExchange,
    error::{FinanceError, Result},
    logging,
};

const FILE_EXTENSION: &str = "csv";
const STATEMENT_SEGMENT: &str = "is";

/// 表格型態的原始回應：一列欄名加上多列字串資料
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(columns: Vec<String>) -> Self {
        RawTable {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// 以欄名取值，欄位不存在時回傳 `None`
    pub fn value<'a>(&self, row: &'a [String], column: &str) -> Option<&'a str> {
        self.column_index(column)
            .and_then(|i| row.get(i))
            .map(String::as_str)
    }

    /// 補齊不足欄位的資料列後加入
    pub fn push_row(&mut self, mut row: Vec<String>) {
        row.resize(self.columns.len(), String::new());
        self.rows.push(row);
    }

    fn to_csv(&self) -> Result<Vec<u8>, csv::Error> {
        let mut wtr = csv::Writer::from_writer(Vec::with_capacity(4096));
        wtr.write_record(&self.columns)?;
        for row in &self.rows {
            wtr.write_record(row)?;
        }

        wtr.into_inner()
            .map_err(|why| csv::Error::from(io::Error::other(why.to_string())))
    }

    fn from_csv(bytes: &[u8]) -> Result<Self, csv::Error> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .from_reader(bytes);

        let columns: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
        if columns.iter().all(|c| c.trim().is_empty()) {
            return Err(csv::Error::from(io::Error::new(
                io::ErrorKind::InvalidData,
                "missing header row",
            )));
        }

        let mut rows = Vec::new();
        for record in rdr.records() {
            rows.push(record?.iter().map(str::to_string).collect());
        }

        Ok(RawTable { columns, rows })
    }
}

/// 以 (交易所, 日期) 為鍵的快照儲存
#[derive(Debug, Clone)]
pub struct CacheStore {
    dir: PathBuf,
}

impl CacheStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        CacheStore { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `twse_is_20241018`
    pub fn key(exchange: StockExchange, date: NaiveDate) -> String {
        format!(
            "{}_{}_{}",
            exchange.as_ref(),
            STATEMENT_SEGMENT,
            date.format("%Y%m%d")
        )
    }

    pub fn path(&self, exchange: StockExchange, date: NaiveDate) -> PathBuf {
        self.dir
            .join(format!("{}.{}", Self::key(exchange, date), FILE_EXTENSION))
    }

    /// 當天的快照才算新鮮；過去的快照永久有效
    pub fn is_fresh(date: NaiveDate, today: NaiveDate) -> bool {
        date == today
    }

    pub fn contains(&self, exchange: StockExchange, date: NaiveDate) -> bool {
        self.path(exchange, date).is_file()
    }

    /// 讀取快照。檔案不存在、無法讀取或內容損壞都回傳 `None`。
    pub fn get(&self, exchange: StockExchange, date: NaiveDate) -> Option<RawTable> {
        let path = self.path(exchange, date);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(why) if why.kind() == io::ErrorKind::NotFound => return None,
            Err(why) => {
                logging::warn_file_async(format!(
                    "{}",
                    FinanceError::cache_io(&path, why)
                ));
                return None;
            }
        };

        match RawTable::from_csv(&bytes) {
            Ok(table) => Some(table),
            Err(why) => {
                logging::warn_file_async(format!(
                    "Cache file {} is corrupt, treating as a miss because {:?}",
                    path.display(),
                    why
                ));
                None
            }
        }
    }

    /// 寫入快照。
    ///
    /// 過去日期的快照若已存在則不覆蓋，直接回傳 `Ok(false)`；實際寫入回傳 `Ok(true)`。
    pub fn put(
        &self,
        exchange: StockExchange,
        date: NaiveDate,
        payload: &RawTable,
        today: NaiveDate,
    ) -> Result<bool> {
        let path = self.path(exchange, date);

        if !Self::is_fresh(date, today) && path.is_file() {
            logging::info_file_async(format!(
                "Snapshot {} already exists and is immutable",
                path.display()
            ));
            return Ok(false);
        }

        fs::create_dir_all(&self.dir).map_err(|why| FinanceError::cache_io(&self.dir, why))?;

        let body = payload.to_csv().map_err(|why| {
            FinanceError::cache_io(&path, io::Error::new(io::ErrorKind::InvalidData, why))
        })?;

        // 每次寫入各自一個暫存檔，同時寫同一個 key 時後 rename 者勝出
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)
            .map_err(|why| FinanceError::cache_io(&self.dir, why))?;
        tmp.write_all(&body)
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|why| FinanceError::cache_io(tmp.path(), why))?;
        tmp.persist(&path)
            .map_err(|why| FinanceError::cache_io(&path, why.error))?;

        logging::info_file_async(format!(
            "Cached {} rows into {}",
            payload.len(),
            path.display()
        ));

        Ok(true)
    }

    /// 某交易所所有快照的日期，由舊到新
    pub fn snapshot_dates(&self, exchange: StockExchange) -> Vec<NaiveDate> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(why) => {
                if why.kind() != io::ErrorKind::NotFound {
                    logging::warn_file_async(format!("{}", FinanceError::cache_io(&self.dir, why)));
                }
                return Vec::new();
            }
        };

        let prefix = format!("{}_{}_", exchange.as_ref(), STATEMENT_SEGMENT);
        let mut dates: Vec<NaiveDate> = entries
            .flatten()
            .filter_map(|entry| {
                let name = entry.file_name().to_string_lossy().to_string();
                let stem = name.strip_suffix(&format!(".{}", FILE_EXTENSION))?;
                let date = stem.strip_prefix(&prefix)?;
                NaiveDate::parse_from_str(date, "%Y%m%d").ok()
            })
            .collect();

        dates.sort();
        dates
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample_table() -> RawTable {
        let mut table = RawTable::new(vec![
            "公司代號".to_string(),
            "營業收入".to_string(),
            "備註".to_string(),
        ]);
        table.push_row(vec![
            "2727".to_string(),
            "1,150,000".to_string(),
            "含\"引號\",與逗號".to_string(),
        ]);
        table.push_row(vec!["2753".to_string()]);
        table
    }

    #[test]
    fn test_key_format() {
        assert_eq!(
            CacheStore::key(StockExchange::TWSE, date(2024, 10, 18)),
            "twse_is_20241018"
        );
        let store = CacheStore::new("/tmp/cache");
        assert_eq!(
            store.path(StockExchange::TPEx, date(2024, 1, 2)),
            PathBuf::from("/tmp/cache/tpex_is_20240102.csv")
        );
    }

    #[test]
    fn test_put_then_get() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path().join("nested"));
        let today = date(2024, 10, 18);
        let table = sample_table();

        assert!(store.get(StockExchange::TWSE, today).is_none());
        assert!(store.put(StockExchange::TWSE, today, &table, today).unwrap());

        let loaded = store.get(StockExchange::TWSE, today).unwrap();
        assert_eq!(loaded, table);
        assert_eq!(loaded.rows[1], vec!["2753", "", ""]);
        assert!(store.get(StockExchange::TPEx, today).is_none());
    }

    #[test]
    fn test_no_temp_file_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path());
        let today = date(2024, 10, 18);
        store
            .put(StockExchange::TWSE, today, &sample_table(), today)
            .unwrap();

        let names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .flatten()
            .map(|e| e.file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["twse_is_20241018.csv".to_string()]);
    }

    #[test]
    fn test_past_snapshot_is_immutable() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path());
        let past = date(2024, 10, 17);
        let today = date(2024, 10, 18);
        let original = sample_table();

        assert!(store.put(StockExchange::TWSE, past, &original, past).unwrap());

        let replacement = RawTable::new(vec!["公司代號".to_string()]);
        assert!(!store.put(StockExchange::TWSE, past, &replacement, today).unwrap());
        assert_eq!(store.get(StockExchange::TWSE, past).unwrap(), original);

        // 當天的快照允許覆寫，仍然只有一份
        assert!(store.put(StockExchange::TWSE, today, &original, today).unwrap());
        assert!(store.put(StockExchange::TWSE, today, &replacement, today).unwrap());
        assert_eq!(store.get(StockExchange::TWSE, today).unwrap(), replacement);
    }

    #[test]
    fn test_corrupt_file_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path());
        let today = date(2024, 10, 18);

        fs::write(
            store.path(StockExchange::TWSE, today),
            "公司代號,營業收入\n2727,1,2,3\n",
        )
        .unwrap();
        assert!(store.get(StockExchange::TWSE, today).is_none());

        fs::write(store.path(StockExchange::TPEx, today), "").unwrap();
        assert!(store.get(StockExchange::TPEx, today).is_none());
    }

    #[test]
    fn test_snapshot_dates() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path());
        let table = sample_table();

        for d in [date(2024, 10, 18), date(2024, 5, 20), date(2024, 8, 14)] {
            store.put(StockExchange::TWSE, d, &table, d).unwrap();
        }
        store
            .put(StockExchange::TPEx, date(2024, 1, 1), &table, date(2024, 1, 1))
            .unwrap();
        fs::write(dir.path().join("twse_is_garbage.csv"), "x").unwrap();

        assert_eq!(
            store.snapshot_dates(StockExchange::TWSE),
            vec![date(2024, 5, 20), date(2024, 8, 14), date(2024, 10, 18)]
        );
        assert_eq!(store.snapshot_dates(StockExchange::TPEx), vec![date(2024, 1, 1)]);
        assert!(CacheStore::new(dir.path().join("missing"))
            .snapshot_dates(StockExchange::TWSE)
            .is_empty());
    }

    #[test]
    fn test_concurrent_put_same_key() {
        use std::sync::{Arc, Barrier};

        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(CacheStore::new(dir.path()));
        let today = date(2024, 10, 18);

        let mut table = RawTable::new(vec!["公司代號".to_string(), "營業收入".to_string()]);
        for i in 0..2000 {
            table.push_row(vec![format!("{:04}", i), "1,000".to_string()]);
        }
        let table = Arc::new(table);

        for _ in 0..5 {
            let barrier = Arc::new(Barrier::new(4));
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    let store = store.clone();
                    let table = table.clone();
                    let barrier = barrier.clone();
                    std::thread::spawn(move || {
                        barrier.wait();
                        store.put(StockExchange::TWSE, today, &table, today)
                    })
                })
                .collect();

            for handle in handles {
                assert!(handle.join().unwrap().unwrap());
            }

            assert_eq!(store.get(StockExchange::TWSE, today).unwrap().len(), 2000);
        }

        assert_eq!(store.snapshot_dates(StockExchange::TWSE), vec![today]);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_is_fresh() {
        let today = date(2024, 10, 18);
        assert!(CacheStore::is_fresh(today, today));
        assert!(!CacheStore::is_fresh(date(2024, 10, 17), today));
    }
}

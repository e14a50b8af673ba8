use std::path::PathBuf;

use thiserror::Error;

use crate::declare::{FiscalPeriod, StockExchange};

/// 對外公開的錯誤分類
///
/// - `Lookup`：呼叫端給了不在清單內的股號或錯誤的交易所，不重試
/// - `DataUnavailable`：遠端重試後仍失敗，且沒有可用的快取
/// - `MalformedData`：單筆財報必要欄位無法解析，該筆略過
/// - `CacheIo`：快取檔讀寫失敗，降級為直接抓取
#[derive(Debug, Error)]
pub enum FinanceError {
    #[error("unknown company code '{code}'")]
    UnknownCompany { code: String },

    #[error("company '{code}' is listed on {listed}, not {requested}")]
    UnsupportedExchange {
        code: String,
        listed: StockExchange,
        requested: StockExchange,
    },

    #[error("data temporarily unavailable: {0}")]
    DataUnavailable(String),

    #[error("malformed statement row for {company_code} {period}: field '{field}' has value '{value}'")]
    MalformedData {
        company_code: String,
        period: FiscalPeriod,
        field: &'static str,
        value: String,
    },

    #[error("cache io error on {}: {source}", path.display())]
    CacheIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// 錯誤種類，供呈現層決定顯示方式
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    Lookup,
    DataUnavailable,
    MalformedData,
    CacheIo,
}

impl FinanceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FinanceError::UnknownCompany { .. } | FinanceError::UnsupportedExchange { .. } => {
                ErrorKind::Lookup
            }
            FinanceError::DataUnavailable(_) => ErrorKind::DataUnavailable,
            FinanceError::MalformedData { .. } => ErrorKind::MalformedData,
            FinanceError::CacheIo { .. } => ErrorKind::CacheIo,
        }
    }

    pub fn cache_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        FinanceError::CacheIo {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T, E = FinanceError> = std::result::Result<T, E>;

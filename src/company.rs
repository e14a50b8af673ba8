//! 追蹤的公司清單（餐飲類股）。
//!
//! 清單在編譯期固定，執行期間不可變動；不在清單內的股號一律視為查詢錯誤。

use serde::Serialize;

use crate::{
    declare::StockExchange,
    error::{FinanceError, Result},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CompanyRecord {
    /// 股號
    pub code: &'static str,
    /// 公司簡稱
    pub name: &'static str,
    pub exchange: StockExchange,
}

pub static COMPANIES: &[CompanyRecord] = &[
    CompanyRecord {
        code: "2723",
        name: "美食-KY",
        exchange: StockExchange::TWSE,
    },
    CompanyRecord {
        code: "2727",
        name: "王品",
        exchange: StockExchange::TWSE,
    },
    CompanyRecord {
        code: "2753",
        name: "八方雲集",
        exchange: StockExchange::TWSE,
    },
    CompanyRecord {
        code: "2729",
        name: "瓦城",
        exchange: StockExchange::TPEx,
    },
    CompanyRecord {
        code: "2732",
        name: "六角",
        exchange: StockExchange::TPEx,
    },
    CompanyRecord {
        code: "1268",
        name: "漢來美食",
        exchange: StockExchange::TPEx,
    },
    CompanyRecord {
        code: "1259",
        name: "安心",
        exchange: StockExchange::TPEx,
    },
];

pub fn all() -> &'static [CompanyRecord] {
    COMPANIES
}

/// 依股號查詢公司，前後空白會被忽略
pub fn find(code: &str) -> Option<&'static CompanyRecord> {
    let code = code.trim();
    COMPANIES.iter().find(|c| c.code == code)
}

/// 確認股號在清單內且掛牌於指定的交易所
pub fn resolve(exchange: StockExchange, code: &str) -> Result<&'static CompanyRecord> {
    let company = find(code).ok_or_else(|| FinanceError::UnknownCompany {
        code: code.to_string(),
    })?;

    if company.exchange != exchange {
        return Err(FinanceError::UnsupportedExchange {
            code: company.code.to_string(),
            listed: company.exchange,
            requested: exchange,
        });
    }

    Ok(company)
}

pub fn listed_on(exchange: StockExchange) -> impl Iterator<Item = &'static CompanyRecord> {
    COMPANIES.iter().filter(move |c| c.exchange == exchange)
}

//! 將各交易所的原始財報轉成統一格式。
//!
//! 金額一律換算為新台幣仟元；營收、稅後淨利、權益總額為必要欄位，
//! 缺值或無法解析的資料列直接略過並回報，不會以 0 補值。

use hashbrown::HashMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    crawler::RawStatementEntry,
    declare::{FiscalPeriod, Unit},
    error::FinanceError,
    logging,
    util::text,
};

/// 正規化後的財報，金額單位為新台幣仟元
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedStatement {
    pub company_code: String,
    pub period: FiscalPeriod,
    /// 營業收入
    pub revenue: Decimal,
    /// 本期淨利（淨損）
    pub net_income: Decimal,
    /// 權益總額
    pub equity: Decimal,
    /// 營業利益（損失）
    pub operating_income: Option<Decimal>,
    /// 負債總額
    pub total_liabilities: Option<Decimal>,
    /// 資產總額
    pub total_assets: Option<Decimal>,
}

/// 正規化結果與被略過的資料列
#[derive(Debug, Default)]
pub struct Normalized {
    pub statements: Vec<NormalizedStatement>,
    pub skipped: Vec<FinanceError>,
}

/// 轉換並依 (公司, 期別) 排序，略過的資料列只寫入日誌
pub fn normalize(raw_entries: &[RawStatementEntry]) -> Vec<NormalizedStatement> {
    normalize_detailed(raw_entries).statements
}

/// 同 [`normalize`]，另外回傳每一筆被略過的原因
pub fn normalize_detailed(raw_entries: &[RawStatementEntry]) -> Normalized {
    let mut skipped = Vec::new();
    let mut latest: HashMap<(String, FiscalPeriod), NormalizedStatement> =
        HashMap::with_capacity(raw_entries.len());

    for entry in raw_entries {
        match normalize_entry(entry) {
            // 重複的 (公司, 期別) 以後出現者為準
            Ok(statement) => {
                latest.insert(
                    (statement.company_code.clone(), statement.period),
                    statement,
                );
            }
            Err(why) => {
                logging::warn_file_async(format!(
                    "Skip {} statement of {} from snapshot {} because {}",
                    entry.exchange, entry.company_code, entry.snapshot_date, why
                ));
                skipped.push(why);
            }
        }
    }

    let mut statements: Vec<NormalizedStatement> = latest.into_values().collect();
    statements.sort_by(|a, b| {
        a.company_code
            .cmp(&b.company_code)
            .then_with(|| a.period.cmp(&b.period))
    });

    Normalized {
        statements,
        skipped,
    }
}

/// 依公司分組，組內依期別遞增，組與組之間依股號排序
pub fn group_by_company(
    statements: &[NormalizedStatement],
) -> Vec<(String, Vec<NormalizedStatement>)> {
    let mut sorted = statements.to_vec();
    sorted.sort_by(|a, b| {
        a.company_code
            .cmp(&b.company_code)
            .then_with(|| a.period.cmp(&b.period))
    });

    let mut groups: Vec<(String, Vec<NormalizedStatement>)> = Vec::new();
    for statement in sorted {
        match groups.last_mut() {
            Some((code, series)) if *code == statement.company_code => series.push(statement),
            _ => groups.push((statement.company_code.clone(), vec![statement])),
        }
    }

    groups
}

fn normalize_entry(entry: &RawStatementEntry) -> Result<NormalizedStatement, FinanceError> {
    let mandatory = |field: &'static str, raw: &str| -> Result<Decimal, FinanceError> {
        match text::parse_amount(raw) {
            Ok(Some(amount)) => scale(amount, entry.unit).ok_or_else(|| malformed(entry, field, raw)),
            _ => Err(malformed(entry, field, raw)),
        }
    };

    let optional = |field: &'static str, raw: &str| -> Option<Decimal> {
        match text::parse_amount(raw) {
            Ok(amount) => amount.and_then(|a| scale(a, entry.unit)),
            Err(why) => {
                logging::debug_file_async(format!(
                    "Ignore {} of {} {} ({}) because {:?}",
                    field, entry.company_code, entry.period, raw, why
                ));
                None
            }
        }
    };

    Ok(NormalizedStatement {
        company_code: entry.company_code.clone(),
        period: entry.period,
        revenue: mandatory("revenue", &entry.revenue)?,
        net_income: mandatory("net_income", &entry.net_income)?,
        equity: mandatory("equity", &entry.equity)?,
        operating_income: optional("operating_income", &entry.operating_income),
        total_liabilities: optional("total_liabilities", &entry.total_liabilities),
        total_assets: optional("total_assets", &entry.total_assets),
    })
}

/// 換算成仟元
fn scale(amount: Decimal, unit: Unit) -> Option<Decimal> {
    amount.checked_div(Decimal::from(unit.per_thousand()))
}

fn malformed(entry: &RawStatementEntry, field: &'static str, raw: &str) -> FinanceError {
    FinanceError::MalformedData {
        company_code: entry.company_code.clone(),
        period: entry.period,
        field,
        value: raw.to_string(),
    }
}

//! 財務比率計算。
//!
//! 所有比率都以小數表示（0.15 即 15%），分母為零或缺值時回傳 [`Ratio::Undefined`]，
//! 不會以 0 代替，也不會 panic。

use std::fmt;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::{declare::FiscalPeriod, processor::NormalizedStatement};

/// 比率值，無法計算時為 `Undefined`，序列化為數字或 `null`
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<Decimal>", into = "Option<Decimal>")]
pub enum Ratio {
    Value(Decimal),
    Undefined,
}

impl Ratio {
    /// numerator / denominator，分母為零或溢位時為 `Undefined`
    pub fn divide(numerator: Decimal, denominator: Decimal) -> Self {
        if denominator.is_zero() {
            return Ratio::Undefined;
        }

        numerator
            .checked_div(denominator)
            .map(Ratio::Value)
            .unwrap_or(Ratio::Undefined)
    }

    pub fn divide_opt(numerator: Option<Decimal>, denominator: Option<Decimal>) -> Self {
        match (numerator, denominator) {
            (Some(n), Some(d)) => Self::divide(n, d),
            _ => Ratio::Undefined,
        }
    }

    /// (current - prior) / prior
    pub fn growth(current: Self, prior: Self) -> Self {
        match (current, prior) {
            (Ratio::Value(c), Ratio::Value(p)) => match c.checked_sub(p) {
                Some(diff) => Self::divide(diff, p),
                None => Ratio::Undefined,
            },
            _ => Ratio::Undefined,
        }
    }

    pub fn value(&self) -> Option<Decimal> {
        match self {
            Ratio::Value(v) => Some(*v),
            Ratio::Undefined => None,
        }
    }

    /// 百分比，小數兩位，例如 `15.00%`
    pub fn to_percent(&self) -> String {
        match self {
            Ratio::Value(v) => format_percent(*v),
            Ratio::Undefined => "N/A".to_string(),
        }
    }
}

impl From<Option<Decimal>> for Ratio {
    fn from(value: Option<Decimal>) -> Self {
        value.map(Ratio::Value).unwrap_or(Ratio::Undefined)
    }
}

impl From<Ratio> for Option<Decimal> {
    fn from(value: Ratio) -> Self {
        value.value()
    }
}

impl fmt::Display for Ratio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_percent())
    }
}

pub(crate) fn format_percent(fraction: Decimal) -> String {
    let percent = fraction
        .checked_mul(dec!(100))
        .map(|p| p.round_dp(2))
        .unwrap_or(fraction);
    format!("{:.2}%", percent)
}

/// 成長率的比較基準
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
pub enum GrowthBasis {
    /// 與序列中的前一期比較
    #[default]
    #[strum(serialize = "sequential", ascii_case_insensitive)]
    Sequential,
    /// 與去年同期比較
    #[strum(to_string = "year_over_year", serialize = "yoy", ascii_case_insensitive)]
    YearOverYear,
}

/// 單一期別的各項比率
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorPoint {
    pub period: FiscalPeriod,
    /// 股東權益報酬率 = 稅後淨利 / 權益總額
    pub roe: Ratio,
    /// 營收成長率
    pub revenue_growth: Ratio,
    /// 營業利益率 = 營業利益 / 營收
    pub operating_margin: Ratio,
    /// 營業利益率成長率
    pub operating_margin_growth: Ratio,
    /// 資產報酬率 = 稅後淨利 / 資產總額
    pub roa: Ratio,
    /// 負債比率 = 負債總額 / 資產總額
    pub debt_ratio: Ratio,
    /// 淨利率 = 稅後淨利 / 營收
    pub net_margin: Ratio,
}

/// 單一公司依期別遞增排序的比率序列
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorSeries {
    pub company_code: String,
    /// 成長率所用的比較基準
    #[serde(default)]
    pub basis: GrowthBasis,
    pub points: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn point(&self, period: FiscalPeriod) -> Option<&IndicatorPoint> {
        self.position(period).map(|i| &self.points[i])
    }

    /// 成長率計算時與 `period` 比較的資料點，規則與 [`compute_with`] 相同
    pub fn prior(&self, period: FiscalPeriod) -> Option<&IndicatorPoint> {
        let i = self.position(period)?;
        prior_index(&self.points, i, self.basis, |p| p.period).map(|p| &self.points[p])
    }

    pub fn latest(&self) -> Option<&IndicatorPoint> {
        self.points.last()
    }

    pub fn periods(&self) -> impl Iterator<Item = FiscalPeriod> + '_ {
        self.points.iter().map(|p| p.period)
    }

    fn position(&self, period: FiscalPeriod) -> Option<usize> {
        self.points
            .binary_search_by(|p| p.period.cmp(&period))
            .ok()
    }
}

/// 以前一期為基準計算比率序列
pub fn compute(series: &[NormalizedStatement]) -> IndicatorSeries {
    compute_with(series, GrowthBasis::Sequential)
}

/// 計算單一公司的比率序列。
///
/// 輸入應為同一家公司的財報，會先依期別排序；相同輸入必得相同輸出。
pub fn compute_with(series: &[NormalizedStatement], basis: GrowthBasis) -> IndicatorSeries {
    let mut statements: Vec<&NormalizedStatement> = series.iter().collect();
    statements.sort_by_key(|s| s.period);

    let company_code = statements
        .first()
        .map(|s| s.company_code.clone())
        .unwrap_or_default();

    let points = statements
        .iter()
        .enumerate()
        .map(|(i, current)| {
            let prior = prior_index(&statements, i, basis, |s| s.period).map(|p| statements[p]);
            compute_point(current, prior)
        })
        .collect();

    IndicatorSeries {
        company_code,
        basis,
        points,
    }
}

/// 在依期別遞增的 `items` 中找出第 `i` 筆的比較對象。
///
/// 逐期比較時取最近一筆同粒度的期別（年度對年度、季度對季度），
/// 年增比較時取去年同期。
fn prior_index<T>(
    items: &[T],
    i: usize,
    basis: GrowthBasis,
    period_of: impl Fn(&T) -> FiscalPeriod,
) -> Option<usize> {
    let current = period_of(items.get(i)?);
    let earlier = &items[..i];

    match basis {
        GrowthBasis::Sequential => earlier
            .iter()
            .rposition(|item| period_of(item).is_annual() == current.is_annual()),
        GrowthBasis::YearOverYear => {
            let target = current.same_period_last_year();
            earlier.iter().rposition(|item| period_of(item) == target)
        }
    }
}

/// 混合多家公司的財報，依公司分組後各自計算
pub fn compute_all(statements: &[NormalizedStatement], basis: GrowthBasis) -> Vec<IndicatorSeries> {
    crate::processor::group_by_company(statements)
        .into_iter()
        .map(|(_, series)| compute_with(&series, basis))
        .collect()
}

fn compute_point(
    current: &NormalizedStatement,
    prior: Option<&NormalizedStatement>,
) -> IndicatorPoint {
    let margin = operating_margin(current);

    let (revenue_growth, operating_margin_growth) = match prior {
        Some(prior) => (
            Ratio::growth(Ratio::Value(current.revenue), Ratio::Value(prior.revenue)),
            Ratio::growth(margin, operating_margin(prior)),
        ),
        None => (Ratio::Undefined, Ratio::Undefined),
    };

    IndicatorPoint {
        period: current.period,
        roe: Ratio::divide(current.net_income, current.equity),
        revenue_growth,
        operating_margin: margin,
        operating_margin_growth,
        roa: Ratio::divide_opt(Some(current.net_income), current.total_assets),
        debt_ratio: Ratio::divide_opt(current.total_liabilities, current.total_assets),
        net_margin: Ratio::divide(current.net_income, current.revenue),
    }
}

fn operating_margin(statement: &NormalizedStatement) -> Ratio {
    Ratio::divide_opt(statement.operating_income, Some(statement.revenue))
}

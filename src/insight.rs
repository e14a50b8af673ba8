//! 依門檻規則產生的財報判讀。
//!
//! 只比較指定期別與前期（依序列的成長率基準決定），等於門檻或與前期持平時不產生任何訊息，
//! 無法計算的比率也一律略過。

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter};

use crate::{
    config,
    declare::FiscalPeriod,
    indicator::{format_percent, IndicatorPoint, IndicatorSeries, Ratio},
};

/// 判讀門檻，數值皆為小數（0.15 即 15%）
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct InsightThresholds {
    /// ROE 高於此值視為亮點
    #[serde(default = "config::default_roe_high")]
    pub roe_high: Decimal,
    /// ROE 低於此值視為風險
    #[serde(default = "config::default_roe_low")]
    pub roe_low: Decimal,
    /// 營收、營業利益率成長高於此值視為亮點
    #[serde(default = "config::default_growth_highlight")]
    pub growth_highlight: Decimal,
    /// 營收、營業利益率成長低於此值視為風險
    #[serde(default = "config::default_growth_risk")]
    pub growth_risk: Decimal,
    #[serde(default = "config::default_debt_ratio_high")]
    pub debt_ratio_high: Decimal,
}

impl Default for InsightThresholds {
    fn default() -> Self {
        InsightThresholds {
            roe_high: config::default_roe_high(),
            roe_low: config::default_roe_low(),
            growth_highlight: config::default_growth_highlight(),
            growth_risk: config::default_growth_risk(),
            debt_ratio_high: config::default_debt_ratio_high(),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, AsRefStr, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum InsightCategory {
    Highlight,
    Risk,
}

/// 判讀所依據的指標
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, AsRefStr, Display, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Metric {
    Roe,
    RevenueGrowth,
    OperatingMarginGrowth,
    DebtRatio,
}

impl Metric {
    pub fn label(&self) -> &'static str {
        match self {
            Metric::Roe => "ROE",
            Metric::RevenueGrowth => "營收成長率",
            Metric::OperatingMarginGrowth => "營業利益率成長率",
            Metric::DebtRatio => "負債比率",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insight {
    pub company_code: String,
    pub period: FiscalPeriod,
    pub category: InsightCategory,
    pub metric: Metric,
    pub text: String,
}

/// 產生指定期別的判讀，期別不在序列中時回傳空集合
pub fn generate(
    series: &IndicatorSeries,
    period: FiscalPeriod,
    thresholds: &InsightThresholds,
) -> Vec<Insight> {
    let current = match series.point(period) {
        Some(point) => point,
        None => return Vec::new(),
    };
    let prior = series.prior(period);

    let mut insights = Vec::with_capacity(6);
    let mut emit = |category: InsightCategory, metric: Metric, text: String| {
        insights.push(Insight {
            company_code: series.company_code.clone(),
            period,
            category,
            metric,
            text,
        });
    };

    if let Ratio::Value(roe) = current.roe {
        if roe > thresholds.roe_high {
            emit(
                InsightCategory::Highlight,
                Metric::Roe,
                format!(
                    "ROE 達 {}，高於 {} 的水準，獲利能力良好",
                    format_percent(roe),
                    format_percent(thresholds.roe_high)
                ),
            );
        } else if roe < thresholds.roe_low {
            emit(
                InsightCategory::Risk,
                Metric::Roe,
                format!(
                    "ROE 僅 {}，低於 {}，股東權益報酬偏弱",
                    format_percent(roe),
                    format_percent(thresholds.roe_low)
                ),
            );
        }

        if let Some(Ratio::Value(prior_roe)) = prior.map(|p| p.roe) {
            let prior_period = prior.map(|p| p.period).unwrap_or(period);
            if roe > prior_roe {
                emit(
                    InsightCategory::Highlight,
                    Metric::Roe,
                    format!(
                        "ROE 由 {} 的 {} 上升至 {}",
                        prior_period,
                        format_percent(prior_roe),
                        format_percent(roe)
                    ),
                );
            } else if roe < prior_roe {
                emit(
                    InsightCategory::Risk,
                    Metric::Roe,
                    format!(
                        "ROE 由 {} 的 {} 下滑至 {}",
                        prior_period,
                        format_percent(prior_roe),
                        format_percent(roe)
                    ),
                );
            }
        }
    }

    for (metric, value) in growth_metrics(current) {
        if let Ratio::Value(growth) = value {
            if growth > thresholds.growth_highlight {
                emit(
                    InsightCategory::Highlight,
                    metric,
                    format!(
                        "{}為 {}，成長動能強勁",
                        metric.label(),
                        format_percent(growth)
                    ),
                );
            } else if growth < thresholds.growth_risk {
                emit(
                    InsightCategory::Risk,
                    metric,
                    format!("{}為 {}，呈現衰退", metric.label(), format_percent(growth)),
                );
            }
        }
    }

    if let Ratio::Value(debt_ratio) = current.debt_ratio {
        if debt_ratio > thresholds.debt_ratio_high {
            emit(
                InsightCategory::Risk,
                Metric::DebtRatio,
                format!(
                    "負債比率達 {}，高於 {}，財務槓桿偏高",
                    format_percent(debt_ratio),
                    format_percent(thresholds.debt_ratio_high)
                ),
            );
        }
    }

    insights
}

fn growth_metrics(point: &IndicatorPoint) -> [(Metric, Ratio); 2] {
    [
        (Metric::RevenueGrowth, point.revenue_growth),
        (Metric::OperatingMarginGrowth, point.operating_margin_growth),
    ]
}

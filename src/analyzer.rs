//! 查詢流程：股號 → 快取／遠端 → 正規化 → 比率 → 判讀。
//!
//! 每個請求依序跑完一次，不在背景預先抓取。

use std::time::Instant;

use serde::Serialize;

use crate::{
    company::{self, CompanyRecord},
    crawler::StatementClient,
    declare::FiscalPeriod,
    error::{FinanceError, Result},
    indicator::{self, GrowthBasis, IndicatorSeries},
    insight::{self, Insight, InsightThresholds},
    logging,
    processor::{self, NormalizedStatement},
};

/// 提供給呈現層的完整報告
#[derive(Debug, Clone, Serialize)]
pub struct CompanyReport {
    pub company: CompanyRecord,
    /// 判讀所依據的期別，沒有任何財報時為 `None`
    pub period: Option<FiscalPeriod>,
    pub statements: Vec<NormalizedStatement>,
    pub indicators: IndicatorSeries,
    pub insights: Vec<Insight>,
}

pub struct Analyzer {
    client: StatementClient,
    thresholds: InsightThresholds,
    growth_basis: GrowthBasis,
}

impl Analyzer {
    pub fn new(client: StatementClient) -> Self {
        Analyzer {
            client,
            thresholds: InsightThresholds::default(),
            growth_basis: GrowthBasis::default(),
        }
    }

    pub fn with_thresholds(mut self, thresholds: InsightThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn with_growth_basis(mut self, growth_basis: GrowthBasis) -> Self {
        self.growth_basis = growth_basis;
        self
    }

    pub fn companies(&self) -> &'static [CompanyRecord] {
        company::all()
    }

    /// 正規化後的財報，依期別遞增
    pub async fn statements(&self, company_code: &str) -> Result<Vec<NormalizedStatement>> {
        let company = lookup(company_code)?;
        self.load(company).await
    }

    pub async fn indicators(&self, company_code: &str) -> Result<IndicatorSeries> {
        let company = lookup(company_code)?;
        let statements = self.load(company).await?;
        Ok(indicator::compute_with(&statements, self.growth_basis))
    }

    /// 指定期別的判讀，期別不存在時回傳空集合
    pub async fn insights(&self, company_code: &str, period: FiscalPeriod) -> Result<Vec<Insight>> {
        let series = self.indicators(company_code).await?;
        Ok(insight::generate(&series, period, &self.thresholds))
    }

    /// 未指定期別時以最新一期為準
    pub async fn report(
        &self,
        company_code: &str,
        period: Option<FiscalPeriod>,
    ) -> Result<CompanyReport> {
        let company = lookup(company_code)?;
        let statements = self.load(company).await?;
        let indicators = indicator::compute_with(&statements, self.growth_basis);

        let period = period.or_else(|| indicators.latest().map(|p| p.period));
        let insights = period
            .map(|p| insight::generate(&indicators, p, &self.thresholds))
            .unwrap_or_default();

        Ok(CompanyReport {
            company: *company,
            period,
            statements,
            indicators,
            insights,
        })
    }

    async fn load(&self, company: &CompanyRecord) -> Result<Vec<NormalizedStatement>> {
        let start = Instant::now();
        let raw = self
            .client
            .fetch_statements(company.exchange, company.code)
            .await?;
        let statements = processor::normalize(&raw);

        logging::info_file_async(format!(
            "{} {} loaded {} statements from {} rows in {} ms",
            company.code,
            company.name,
            statements.len(),
            raw.len(),
            start.elapsed().as_millis()
        ));

        Ok(statements)
    }
}

fn lookup(company_code: &str) -> Result<&'static CompanyRecord> {
    company::find(company_code).ok_or_else(|| FinanceError::UnknownCompany {
        code: company_code.trim().to_string(),
    })
}

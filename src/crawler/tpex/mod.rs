use crate::{
    crawler::{Calendar, Columns, SourceSchema},
    declare::{StockExchange, Unit},
};

/// 上櫃公司綜合損益表（一般業）
const INCOME_STATEMENT_PATH: &str = "/mopsfin_t187ap06_O_ci";
/// 上櫃公司資產負債表（一般業）
const BALANCE_SHEET_PATH: &str = "/mopsfin_t187ap07_O_ci";

/// 櫃買中心 OpenAPI：英文欄名、西元年、金額單位為元
pub static SCHEMA: SourceSchema = SourceSchema {
    exchange: StockExchange::TPEx,
    income_statement_path: INCOME_STATEMENT_PATH,
    balance_sheet_path: BALANCE_SHEET_PATH,
    calendar: Calendar::Gregorian,
    unit: Unit::Ntd,
    columns: Columns {
        published: "Date",
        code: "SecuritiesCompanyCode",
        year: "Year",
        season: "Season",
        revenue: "OperatingRevenue",
        operating_income: "OperatingIncome",
        net_income: "NetIncome",
        total_assets: "TotalAssets",
        total_liabilities: "TotalLiabilities",
        equity: "TotalEquity",
    },
};

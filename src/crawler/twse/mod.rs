use crate::{
    crawler::{Calendar, Columns, SourceSchema},
    declare::{StockExchange, Unit},
};

/// 上市公司綜合損益表（一般業）
const INCOME_STATEMENT_PATH: &str = "/opendata/t187ap06_L_ci";
/// 上市公司資產負債表（一般業）
const BALANCE_SHEET_PATH: &str = "/opendata/t187ap07_L_ci";

/// 證交所 OpenAPI：中文欄名、民國年、金額單位為仟元
pub static SCHEMA: SourceSchema = SourceSchema {
    exchange: StockExchange::TWSE,
    income_statement_path: INCOME_STATEMENT_PATH,
    balance_sheet_path: BALANCE_SHEET_PATH,
    calendar: Calendar::Roc,
    unit: Unit::ThousandNtd,
    columns: Columns {
        published: "出表日期",
        code: "公司代號",
        year: "年度",
        season: "季別",
        revenue: "營業收入",
        operating_income: "營業利益（損失）",
        net_income: "本期淨利（淨損）",
        total_assets: "資產總額",
        total_liabilities: "負債總額",
        equity: "權益總額",
    },
};

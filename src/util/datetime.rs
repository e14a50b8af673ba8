use chrono::{Local, NaiveDate};

/// 民國紀年與西元紀年的差距
const ROC_OFFSET: i32 = 1911;

/// Convert ROC year to Gregorian year.
pub fn roc_year_to_gregorian_year(year: i32) -> i32 {
    year + ROC_OFFSET
}

/// Parse a date string in the format of ROC calendar
/// and return it as a NaiveDate in the Gregorian calendar.
///
/// 支援 `113/10/18`、`113-10-18` 與開放資料常見的 `1131018`。
pub fn parse_taiwan_date(date_str: &str) -> Option<NaiveDate> {
    let date_str = date_str.trim();
    let split_date: Vec<&str> = date_str.split(['/', '-']).collect();

    let (year, month, day) = if split_date.len() == 3 {
        (
            parse_date_part::<i32>(split_date[0])?,
            parse_date_part::<u32>(split_date[1])?,
            parse_date_part::<u32>(split_date[2])?,
        )
    } else if date_str.len() >= 6 && date_str.chars().all(|c| c.is_ascii_digit()) {
        let (y, md) = date_str.split_at(date_str.len() - 4);
        (
            parse_date_part::<i32>(y)?,
            parse_date_part::<u32>(&md[..2])?,
            parse_date_part::<u32>(&md[2..])?,
        )
    } else {
        return None;
    };

    NaiveDate::from_ymd_opt(roc_year_to_gregorian_year(year), month, day)
}

/// 解析西元 `20241018` 或 `2024-10-18`、`2024/10/18`
pub fn parse_gregorian_date(date_str: &str) -> Option<NaiveDate> {
    let date_str = date_str.trim();
    ["%Y%m%d", "%Y-%m-%d", "%Y/%m/%d"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date_str, fmt).ok())
}

/// 今天的日期（本地時區）
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Try to parse a string as a date part and return it as an Option.
fn parse_date_part<T: std::str::FromStr>(date_part_str: &str) -> Option<T> {
    date_part_str.trim().parse::<T>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roc_year() {
        assert_eq!(roc_year_to_gregorian_year(113), 2024);
    }

    #[test]
    fn test_parse_taiwan_date() {
        let expected = NaiveDate::from_ymd_opt(2024, 10, 18);
        assert_eq!(parse_taiwan_date("113/10/18"), expected);
        assert_eq!(parse_taiwan_date("113-10-18"), expected);
        assert_eq!(parse_taiwan_date("1131018"), expected);
        assert_eq!(parse_taiwan_date("991231"), NaiveDate::from_ymd_opt(2010, 12, 31));
        assert_eq!(parse_taiwan_date("113/13/01"), None);
        assert_eq!(parse_taiwan_date("abc"), None);
    }

    #[test]
    fn test_parse_gregorian_date() {
        let expected = NaiveDate::from_ymd_opt(2024, 10, 18);
        assert_eq!(parse_gregorian_date("20241018"), expected);
        assert_eq!(parse_gregorian_date("2024-10-18"), expected);
        assert_eq!(parse_gregorian_date("2024/10/18"), expected);
        assert_eq!(parse_gregorian_date("18/10/2024"), None);
    }
}

use std::{collections::HashSet, str::FromStr};

use anyhow::{anyhow, Result};
use rust_decimal::Decimal;

const NUMBER_ESCAPE_CHAR: &[char] = &['元', '%', ',', '，', ' ', '"', '\n', '\r', '\t', '$'];

/// 財報中代表「無資料」的寫法
const MISSING_MARKERS: &[&str] = &["", "-", "--", "---", "N/A", "NA", "null", "None"];

/// 已經標示為負數後不應再出現的符號
const SIGN_MARKERS: &[char] = &['-', '−', '－', '+', '＋', '(', '（'];

/// Parses a decimal value from a given string.
///
/// This function accepts a string representation of a decimal number,
/// potentially containing commas as thousands separators and other escape characters,
/// and attempts to convert it into a `Decimal`. If the conversion fails, an error is returned.
///
/// # Arguments
///
/// * `s`: A string slice containing the representation of a decimal number
///         that may include commas as thousands separators and other escape characters.
/// * `escape_chars`: Optional characters to be escaped from the input string.
///
/// # Example
///
/// ```
/// use financial_analyzer::util::text::parse_decimal;
///
/// let value = parse_decimal("1,234.56", None).unwrap();
/// assert_eq!(value.to_string(), "1234.56");
/// ```
pub fn parse_decimal(s: &str, escape_chars: Option<Vec<char>>) -> Result<Decimal> {
    let cleaned = clean_escape_chars(s, escape_chars);
    Decimal::from_str(&cleaned)
        .map_err(|why| anyhow!("Failed to parse '{}' as Decimal because {:?}", cleaned, why))
}

/// Parses an `i32` value from a given string, removing the default escape characters first.
pub fn parse_i32(s: &str, escape_chars: Option<Vec<char>>) -> Result<i32> {
    let cleaned = clean_escape_chars(s, escape_chars);
    i32::from_str(&cleaned)
        .map_err(|why| anyhow!("Failed to parse '{}' as i32 because: {:?}", cleaned, why))
}

/// 解析財報金額。
///
/// 支援千分位、括號表示的負數 `(1,234)`、前置的 `-` 或全形負號 `−`。
/// 空字串與 `-`、`--`、`N/A` 等佔位字元回傳 `Ok(None)`，
/// 其餘無法解析的內容回傳錯誤，由呼叫端決定要略過或標記。
/// `(-5)`、`--5` 這類重複的負號視為格式錯誤。
pub fn parse_amount(s: &str) -> Result<Option<Decimal>> {
    let trimmed = s.trim();
    if MISSING_MARKERS
        .iter()
        .any(|m| m.eq_ignore_ascii_case(trimmed))
    {
        return Ok(None);
    }

    let (negative, body) = strip_negative(trimmed);
    if negative && body.starts_with(SIGN_MARKERS) {
        return Err(anyhow!("Failed to parse '{}' as amount because of a nested sign", trimmed));
    }
    let value = parse_decimal(body, None)?;

    Ok(Some(if negative { -value } else { value }))
}

/// 拆掉負號標記，回傳 (是否為負數, 剩下的字串)
fn strip_negative(s: &str) -> (bool, &str) {
    if let Some(inner) = s
        .strip_prefix('(')
        .and_then(|rest| rest.strip_suffix(')'))
        .or_else(|| s.strip_prefix('（').and_then(|rest| rest.strip_suffix('）')))
    {
        return (true, inner.trim());
    }

    for minus in ['-', '−', '－'] {
        if let Some(rest) = s.strip_prefix(minus) {
            return (true, rest.trim());
        }
    }

    (false, s)
}

/// Removes a set of escape characters from a given string.
///
/// # Example
///
/// ```
/// use financial_analyzer::util::text::clean_escape_chars;
///
/// let cleaned = clean_escape_chars("1,000元", Some(vec!['#']));
/// assert_eq!(cleaned, "1000");
/// ```
pub fn clean_escape_chars(s: &str, escape_chars: Option<Vec<char>>) -> String {
    let mut combined: Vec<char> = NUMBER_ESCAPE_CHAR.to_vec();
    if let Some(ec) = escape_chars {
        combined.extend(ec);
    }

    let filters = combined.iter().collect::<HashSet<_>>();
    s.chars().filter(|c| !filters.contains(c)).collect()
}

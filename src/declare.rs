use std::{cmp::Ordering, fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// 交易所
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, AsRefStr, Display, EnumIter, EnumString,
)]
pub enum StockExchange {
    /// 臺灣證券交易所
    #[strum(serialize = "twse", ascii_case_insensitive)]
    TWSE,
    /// 證券櫃檯買賣中心
    #[strum(serialize = "tpex", ascii_case_insensitive)]
    TPEx,
}

impl StockExchange {
    pub fn name(&self) -> &'static str {
        match self {
            StockExchange::TWSE => "臺灣證券交易所",
            StockExchange::TPEx => "證券櫃檯買賣中心",
        }
    }
}

impl Serialize for StockExchange {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_ref())
    }
}

impl<'de> Deserialize<'de> for StockExchange {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        StockExchange::from_str(&s).map_err(serde::de::Error::custom)
    }
}

/// 季度
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumIter)]
pub enum Quarter {
    Q1,
    Q2,
    Q3,
    Q4,
}

impl Quarter {
    pub fn serial(&self) -> u32 {
        match self {
            Quarter::Q1 => 1,
            Quarter::Q2 => 2,
            Quarter::Q3 => 3,
            Quarter::Q4 => 4,
        }
    }

    pub fn from_serial(serial: u32) -> Option<Self> {
        match serial {
            1 => Some(Quarter::Q1),
            2 => Some(Quarter::Q2),
            3 => Some(Quarter::Q3),
            4 => Some(Quarter::Q4),
            _ => None,
        }
    }
}

/// 財報期別，`quarter` 為 `None` 時代表年度財報
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct FiscalPeriod {
    /// 西元年
    pub year: i32,
    pub quarter: Option<Quarter>,
}

impl FiscalPeriod {
    pub fn quarterly(year: i32, quarter: Quarter) -> Self {
        Self {
            year,
            quarter: Some(quarter),
        }
    }

    pub fn annual(year: i32) -> Self {
        Self {
            year,
            quarter: None,
        }
    }

    pub fn is_annual(&self) -> bool {
        self.quarter.is_none()
    }

    /// 前一年度的同一期別
    pub fn same_period_last_year(&self) -> Self {
        Self {
            year: self.year - 1,
            quarter: self.quarter,
        }
    }

    /// 年度財報排在同年 Q4 之後
    fn sort_key(&self) -> (i32, u32) {
        (self.year, self.quarter.map(|q| q.serial()).unwrap_or(5))
    }
}

impl Ord for FiscalPeriod {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl PartialOrd for FiscalPeriod {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for FiscalPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.quarter {
            Some(q) => write!(f, "{}{}", self.year, q),
            None => write!(f, "{}", self.year),
        }
    }
}

impl FromStr for FiscalPeriod {
    type Err = String;

    /// 接受 `2024Q4`、`2024q4`、`2024-Q4` 與 `2024`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        let (year_part, quarter_part) = match upper.split_once('Q') {
            Some((y, q)) => (y.trim_end_matches('-'), Some(q)),
            None => (upper.as_str(), None),
        };

        let year = year_part
            .parse::<i32>()
            .map_err(|_| format!("invalid fiscal year in '{}'", s))?;

        match quarter_part {
            None => Ok(FiscalPeriod::annual(year)),
            Some(q) => q
                .parse::<u32>()
                .ok()
                .and_then(Quarter::from_serial)
                .map(|quarter| FiscalPeriod::quarterly(year, quarter))
                .ok_or_else(|| format!("invalid quarter in '{}'", s)),
        }
    }
}

impl Serialize for FiscalPeriod {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FiscalPeriod {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        FiscalPeriod::from_str(&s).map_err(serde::de::Error::custom)
    }
}

/// 金額單位
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Unit {
    /// 新台幣元
    Ntd,
    /// 新台幣仟元
    ThousandNtd,
}

impl Unit {
    /// 換算成仟元時要除以的倍數
    pub fn per_thousand(&self) -> i64 {
        match self {
            Unit::Ntd => 1000,
            Unit::ThousandNtd => 1,
        }
    }
}

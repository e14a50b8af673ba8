/// 查詢流程
pub mod analyzer;
/// 原始財報快取
pub mod cache;
/// 追蹤的公司清單
pub mod company;
pub mod config;
/// 證交所、櫃買中心的財報來源
pub mod crawler;
pub mod declare;
pub mod error;
/// 財務比率
pub mod indicator;
/// 財報判讀
pub mod insight;
pub mod logging;
/// 財報正規化
pub mod processor;
pub mod util;
/// 儀表板使用的 JSON API
pub mod web;

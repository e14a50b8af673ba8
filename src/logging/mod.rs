use std::{fmt::Write as _, path::PathBuf, thread};

use chrono::{format::DelayedFormat, DateTime, Local};
use crossbeam_channel::{unbounded, Sender};
use once_cell::sync::Lazy;

use crate::logging::rotate::Rotate;

pub mod rotate;

/// 日誌目錄，可用環境變數 `LOG_DIR` 覆寫
const DEFAULT_LOG_DIR: &str = "log";

static LOGGER: Lazy<Logger> = Lazy::new(|| Logger::new("default"));

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Level {
    Info,
    Warn,
    Error,
    Debug,
}

impl Level {
    fn as_str(&self) -> &'static str {
        match self {
            Level::Info => "Info",
            Level::Warn => "Warn",
            Level::Error => "Error",
            Level::Debug => "Debug",
        }
    }
}

pub struct LogMessage {
    pub level: Level,
    pub msg: String,
    pub created_at: DateTime<Local>,
}

impl LogMessage {
    pub fn new(level: Level, msg: String) -> Self {
        LogMessage {
            level,
            msg,
            created_at: Local::now(),
        }
    }
}

pub struct Logger {
    writer: Sender<LogMessage>,
}

impl Logger {
    pub fn new(log_name: &str) -> Self {
        let (tx, rx) = unbounded::<LogMessage>();
        let fn_pattern = Self::fn_pattern(log_name);

        // 寫入檔案的操作使用另一個線程處理
        thread::spawn(move || {
            let mut rotate = Rotate::new(fn_pattern);
            let mut line = String::with_capacity(4096);
            let mut last_at = Local::now();

            for received in &rx {
                if writeln!(
                    &mut line,
                    "{} {} {}",
                    received.created_at.format("%F %X%.6f"),
                    received.level.as_str(),
                    received.msg
                )
                .is_err()
                {
                    continue;
                }
                last_at = received.created_at;

                if rx.is_empty() || line.len() >= 4096 {
                    if let Err(why) = rotate.write_msg(last_at, line.as_bytes()) {
                        error_console(format!("Failed to write log because {:?}", why));
                        info_console(line.clone());
                    }
                    rotate.flush();
                    line.clear();
                }
            }

            if !line.is_empty() {
                let _ = rotate.write_msg(last_at, line.as_bytes());
                rotate.flush();
            }
        });

        Logger { writer: tx }
    }

    pub fn info(&self, log: String) {
        self.send(Level::Info, log);
    }

    pub fn warn(&self, log: String) {
        self.send(Level::Warn, log);
    }

    pub fn error(&self, log: String) {
        self.send(Level::Error, log);
    }

    pub fn debug(&self, log: String) {
        self.send(Level::Debug, log);
    }

    fn send(&self, level: Level, msg: String) {
        if let Err(why) = self.writer.send(LogMessage::new(level, msg)) {
            error_console(why.to_string());
        }
    }

    /// 例如 `log/%Y-%m-%d-http.log`
    fn fn_pattern(name: &str) -> String {
        let dir = std::env::var("LOG_DIR").unwrap_or_else(|_| DEFAULT_LOG_DIR.to_string());
        PathBuf::from(dir)
            .join(format!("%Y-%m-%d-{}.log", name))
            .to_string_lossy()
            .to_string()
    }
}

pub fn info_file_async(log: String) {
    LOGGER.info(log);
}

pub fn warn_file_async(log: String) {
    LOGGER.warn(log);
}

pub fn error_file_async(log: String) {
    LOGGER.error(log);
}

pub fn debug_file_async(log: String) {
    LOGGER.debug(log);
}

pub fn info_console(log: String) {
    println!(
        "{} Info {}",
        Local::now().format("%Y-%m-%d %H:%M:%S.%3f"),
        log
    );
}

pub fn error_console(log: String) {
    println!(
        "{} Error {}",
        DelayedFormat::to_string(&Local::now().format("%Y-%m-%d %H:%M:%S.%3f")),
        log
    );
}

use std::{
    fs::{self, File, OpenOptions},
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
    time::UNIX_EPOCH,
};

use anyhow::{anyhow, Result};
use chrono::{DateTime, Local, TimeDelta};
use rayon::prelude::*;

use crate::logging;

/// 預設單檔最大大小：10 MB
const DEFAULT_MAX_SIZE: u64 = 10 * 1024 * 1024;
/// 預設保留天數：7 天
const DEFAULT_MAX_AGE_DAYS: i64 = 7;

/// 依日期切換檔案，單日超過大小上限時以世代編號續寫。
pub struct Rotate {
    /// 檔名模式，例如 "log/%Y-%m-%d-name.log"
    fn_pattern: String,
    /// 當前完整檔名（含 generation）
    cur_fn: String,
    /// 當前基礎檔名（不含 generation，由日期決定）
    cur_base_fn: String,
    out_fh: Option<BufWriter<File>>,
    /// 當前世代編號 (0, 1, 2, ...)，只增不減
    generation: u32,
    /// 單檔最大大小 (bytes)
    max_size: u64,
    /// 當前檔案已寫入大小
    current_size: u64,
    /// 日誌保留時間
    max_age: TimeDelta,
}

impl Rotate {
    /// 使用預設設定建立 Rotate 實例
    ///
    /// 預設值：
    /// - max_size: 10 MB
    /// - max_age: 7 天
    pub fn new(fn_pattern: String) -> Self {
        Self::with_options(fn_pattern, DEFAULT_MAX_SIZE, DEFAULT_MAX_AGE_DAYS)
    }

    /// 使用自訂設定建立 Rotate 實例
    ///
    /// # Arguments
    /// * `fn_pattern` - 檔名模式，例如 "log/%Y-%m-%d-app.log"
    /// * `max_size` - 單檔最大大小 (bytes)
    /// * `max_age_days` - 日誌保留天數
    pub fn with_options(fn_pattern: String, max_size: u64, max_age_days: i64) -> Self {
        Rotate {
            fn_pattern,
            cur_fn: String::new(),
            cur_base_fn: String::new(),
            out_fh: None,
            generation: 0,
            max_size,
            current_size: 0,
            max_age: TimeDelta::try_days(max_age_days).unwrap_or(TimeDelta::days(7)),
        }
    }

    /// 寫入日誌訊息，自動處理日期切換、大小檢查和世代輪轉
    pub fn write_msg(&mut self, now: DateTime<Local>, msg: &[u8]) -> Result<()> {
        let base_fn = self.generate_base_fn(now);

        // 日期變更：重設 generation
        if base_fn != self.cur_base_fn {
            self.generation = 0;
            self.current_size = 0;
            self.cur_base_fn = base_fn;
            self.open_new_file()?;
            self.cleanup_old_files(now);
        }

        if self.current_size > 0 && self.should_rotate_by_size(msg.len()) {
            self.rotate_generation()?;
        }

        let writer = self
            .out_fh
            .as_mut()
            .ok_or_else(|| anyhow!("log file {} is not open", self.cur_fn))?;
        writer.write_all(msg)?;
        self.current_size += msg.len() as u64;

        Ok(())
    }

    pub fn flush(&mut self) {
        if let Some(writer) = self.out_fh.as_mut() {
            let _ = writer.flush();
        }
    }

    pub fn current_file(&self) -> &str {
        &self.cur_fn
    }

    /// 產生基礎檔名（根據日期，不含 generation）
    fn generate_base_fn(&self, now: DateTime<Local>) -> String {
        now.format(&self.fn_pattern).to_string()
    }

    /// 產生完整檔名（含 generation）
    ///
    /// generation = 0: "log/2025-02-03-app.log"
    /// generation = 1: "log/2025-02-03-app.1.log"
    fn generate_full_fn(base_fn: &str, generation: u32) -> String {
        if generation == 0 {
            return base_fn.to_string();
        }

        let path = Path::new(base_fn);
        let parent = path.parent().unwrap_or(Path::new(""));
        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("log");
        let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("log");

        parent
            .join(format!("{}.{}.{}", stem, generation, ext))
            .to_string_lossy()
            .to_string()
    }

    fn should_rotate_by_size(&self, additional_bytes: usize) -> bool {
        self.current_size + additional_bytes as u64 > self.max_size
    }

    fn open_new_file(&mut self) -> Result<()> {
        self.flush();

        let filename = Self::generate_full_fn(&self.cur_base_fn, self.generation);

        if let Some(parent) = Path::new(&filename).parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&filename)?;

        self.current_size = file.metadata().map(|m| m.len()).unwrap_or(0);
        self.out_fh = Some(BufWriter::with_capacity(4096, file));
        self.cur_fn = filename;

        Ok(())
    }

    /// 執行世代輪轉（因大小超限），不覆蓋舊檔案
    fn rotate_generation(&mut self) -> Result<()> {
        self.generation += 1;
        self.current_size = 0;
        self.open_new_file()
    }

    /// 清理舊檔案（超過 max_age 的檔案）
    fn cleanup_old_files(&self, now: DateTime<Local>) {
        let files = match Self::files_in_directory(&self.cur_fn) {
            Ok(files) => files,
            Err(why) => {
                logging::error_console(format!(
                    "Failed to list_files_in_directory because {:?}",
                    why
                ));
                return;
            }
        };

        let cut_off = (now - self.max_age).timestamp().max(0) as u64;
        let to_unlink: Vec<PathBuf> = files
            .into_iter()
            .filter(|file| file.extension().and_then(|e| e.to_str()) == Some("log"))
            .filter(|file| {
                fs::metadata(file)
                    .and_then(|metadata| metadata.modified())
                    .ok()
                    .and_then(|modified| modified.duration_since(UNIX_EPOCH).ok())
                    .map(|duration| duration.as_secs() <= cut_off)
                    .unwrap_or(false)
            })
            .collect();

        to_unlink
            .par_iter()
            .with_min_len(num_cpus::get())
            .for_each(|unlink| {
                if let Err(why) = fs::remove_file(unlink) {
                    logging::error_console(format!(
                        "couldn't remove the file({}). because {:?}",
                        unlink.display(),
                        why
                    ));
                }
            });
    }

    fn files_in_directory<P: AsRef<Path>>(file_path: P) -> Result<Vec<PathBuf>, io::Error> {
        let parent_dir = file_path
            .as_ref()
            .parent()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "Parent directory not found"))?;

        let mut files = Vec::new();
        for entry in fs::read_dir(parent_dir)? {
            files.push(entry?.path());
        }

        Ok(files)
    }
}

impl Drop for Rotate {
    fn drop(&mut self) {
        self.flush();
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn pattern_in(dir: &Path, name: &str) -> String {
        dir.join(format!("%Y-%m-%d-{}.log", name))
            .to_string_lossy()
            .to_string()
    }

    #[test]
    fn test_generation_filename() {
        let base = "log/2025-02-03-app.log";
        assert_eq!(Rotate::generate_full_fn(base, 0), "log/2025-02-03-app.log");
        assert_eq!(Rotate::generate_full_fn(base, 1), "log/2025-02-03-app.1.log");
        assert_eq!(Rotate::generate_full_fn(base, 2), "log/2025-02-03-app.2.log");
    }

    #[test]
    fn test_date_rotation() {
        let dir = tempfile::tempdir().unwrap();
        let mut r = Rotate::new(pattern_in(dir.path(), "date"));
        let mut now = Local::now();

        r.write_msg(now, b"Day 1\r\n").unwrap();
        let first = r.current_file().to_string();

        now += TimeDelta::try_days(1).unwrap();
        r.write_msg(now, b"Day 2\r\n").unwrap();
        r.flush();

        assert_ne!(first, r.current_file());
        assert!(Path::new(&first).exists());
        assert!(Path::new(r.current_file()).exists());
    }

    /// generation 只增不減，且不會覆蓋舊檔案
    #[test]
    fn test_no_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let mut r = Rotate::with_options(pattern_in(dir.path(), "size"), 512, 7);
        let now = Local::now();

        for i in 0..50 {
            let msg = format!("Line {:03} - {}\r\n", i, "X".repeat(50));
            r.write_msg(now, msg.as_bytes()).unwrap();
        }
        r.flush();

        assert!(r.generation >= 3, "generation: {}", r.generation);

        let files: HashSet<String> = fs::read_dir(dir.path())
            .unwrap()
            .flatten()
            .map(|e| e.file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(files.len() as u32, r.generation + 1, "files: {:?}", files);
    }
}

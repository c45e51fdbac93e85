// 日志初始化
// `log` 门面 + `fern` 后端，同时输出到终端与日志文件

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// 日志文件名
pub const LOG_FILE_NAME: &str = "edusolve.log";

/// 日志级别环境变量
pub const LOG_LEVEL_ENV: &str = "EDUSOLVE_LOG";

pub fn level_from_env() -> log::LevelFilter {
    std::env::var(LOG_LEVEL_ENV)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(log::LevelFilter::Info)
}

pub fn init_logging(log_dir: &Path) -> Result<()> {
    fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create log dir {}", log_dir.display()))?;

    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{}][{}][{}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level_from_env())
        // 依赖库的请求日志过于冗长
        .level_for("hyper", log::LevelFilter::Warn)
        .level_for("reqwest", log::LevelFilter::Warn)
        .chain(std::io::stdout())
        .chain(fern::log_file(log_dir.join(LOG_FILE_NAME))?)
        .apply()
        .context("Logger already initialized")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_parsing() {
        std::env::set_var(LOG_LEVEL_ENV, "debug");
        assert_eq!(level_from_env(), log::LevelFilter::Debug);
        std::env::set_var(LOG_LEVEL_ENV, "nonsense");
        assert_eq!(level_from_env(), log::LevelFilter::Info);
        std::env::remove_var(LOG_LEVEL_ENV);
    }
}

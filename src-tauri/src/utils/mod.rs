pub mod logging;

use std::path::PathBuf;
use tauri::{AppHandle, Manager};

/// 数据目录名（无法取得应用目录时使用）
const FALLBACK_DATA_DIR: &str = "data";

/// 应用数据目录
pub fn get_app_data_dir(app: &AppHandle) -> PathBuf {
    app.path().app_data_dir().unwrap_or_else(|e| {
        log::warn!("Failed to resolve app data dir, using ./{}: {}", FALLBACK_DATA_DIR, e);
        PathBuf::from(FALLBACK_DATA_DIR)
    })
}

/// 日志目录
pub fn get_log_dir(app: &AppHandle) -> PathBuf {
    app.path()
        .app_log_dir()
        .unwrap_or_else(|_| get_app_data_dir(app).join("logs"))
}

pub fn get_platform() -> &'static str {
    std::env::consts::OS
}

// 界面偏好设置：夜间模式与主题色

use crate::models::AppTheme;
use crate::services::storage::KeyValueStore;
use anyhow::{Context, Result};
use std::sync::Arc;

/// 夜间模式存储键，取值 `"dark"` / `"light"`
pub const THEME_MODE_KEY: &str = "theme";

/// 主题色存储键
pub const ACCENT_KEY: &str = "edusolve_accent";

pub struct Preferences {
    store: Arc<dyn KeyValueStore>,
}

impl Preferences {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// 只有明确存为 `"dark"` 时才是夜间模式
    pub fn load_dark_mode(&self) -> bool {
        match self.store.get(THEME_MODE_KEY) {
            Ok(value) => value.as_deref() == Some("dark"),
            Err(e) => {
                log::warn!("Failed to read theme mode: {:#}", e);
                false
            }
        }
    }

    pub fn save_dark_mode(&self, is_dark: bool) -> Result<()> {
        let value = if is_dark { "dark" } else { "light" };
        self.store
            .set(THEME_MODE_KEY, value)
            .context("Failed to persist theme mode")
    }

    pub fn load_theme(&self) -> AppTheme {
        match self.store.get(ACCENT_KEY) {
            Ok(Some(name)) => AppTheme::by_name(&name).unwrap_or_default(),
            Ok(None) => AppTheme::default(),
            Err(e) => {
                log::warn!("Failed to read accent theme: {:#}", e);
                AppTheme::default()
            }
        }
    }

    pub fn save_theme(&self, theme: &AppTheme) -> Result<()> {
        self.store
            .set(ACCENT_KEY, theme.name)
            .context("Failed to persist accent theme")
    }
}

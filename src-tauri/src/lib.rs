pub mod commands;
pub mod models;
pub mod services;
pub mod shell;
pub mod utils;

use commands::{ShellState, TauriDocument};
use services::gemini::{GeminiClient, GeminiConfig};
use services::storage::{KeyValueStore, MemoryStore, SqliteStore};
use shell::AppShell;
use std::sync::Arc;
use tauri::ipc::Invoke;
use tauri::{Manager, Runtime};

#[tauri::command]
fn get_app_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

#[tauri::command]
fn get_platform() -> String {
    utils::get_platform().to_string()
}

/// 打开持久化存储，失败时退回内存存储（本次会话内有效）
fn open_store(app: &tauri::AppHandle) -> Arc<dyn KeyValueStore> {
    let data_dir = utils::get_app_data_dir(app);
    match SqliteStore::open_in(&data_dir) {
        Ok(store) => {
            log::info!("Storage opened at {}", store.db_path().display());
            Arc::new(store)
        }
        Err(e) => {
            log::error!("Failed to open storage, falling back to memory: {:#}", e);
            Arc::new(MemoryStore::new())
        }
    }
}

/// 前端可调用的全部命令
fn invoke_handler<R: Runtime>() -> impl Fn(Invoke<R>) -> bool + Send + Sync + 'static {
    tauri::generate_handler![
        get_app_version,
        get_platform,
        // 外壳命令
        commands::shell::get_view_state,
        commands::shell::solve_image,
        commands::shell::solve_image_file,
        commands::shell::explain_concept,
        commands::shell::set_concept_text,
        commands::shell::open_concept_input,
        commands::shell::close_concept_input,
        commands::shell::navigate,
        commands::shell::new_exercise,
        commands::shell::select_history,
        commands::shell::toggle_dark_mode,
        commands::shell::select_theme,
        commands::shell::set_solve_mode,
        commands::shell::dismiss_error,
        commands::shell::list_themes,
        // 渲染命令
        commands::render::render_math_text,
        commands::render::render_math_segments,
        commands::render::solution_coverage,
    ]
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    tauri::Builder::default()
        .setup(|app| {
            let handle = app.handle().clone();

            if let Err(e) = utils::logging::init_logging(&utils::get_log_dir(&handle)) {
                eprintln!("Failed to initialize logging: {:#}", e);
            }
            log::info!(
                "EduSolve {} starting on {}",
                env!("CARGO_PKG_VERSION"),
                utils::get_platform()
            );

            let config = GeminiConfig::from_env();
            let store = open_store(&handle);
            let gateway = Arc::new(GeminiClient::new(config));
            let document = Arc::new(TauriDocument::new(handle));
            let shell = AppShell::new(store, gateway, document);
            if let Ok(count) = shell.history_len() {
                log::info!("Loaded {} history items", count);
            }

            app.manage(ShellState::new(shell));
            Ok(())
        })
        .invoke_handler(invoke_handler())
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}

// Tauri 命令模块
// 提供供前端调用的命令接口
// 注册命令时需使用定义所在模块的完整路径（如 `commands::shell::navigate`）

pub mod render;
pub mod shell;

pub use shell::{ShellState, TauriDocument, DOCUMENT_EVENT, VIEW_STATE_EVENT};

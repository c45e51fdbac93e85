// 应用外壳 Tauri 命令
// 前端的每个操作都转成一个动作，返回最新视图

use crate::models::{AppTheme, SolveMode, THEMES};
use crate::services::image::read_image_as_data_uri;
use crate::services::math_text::KatexMarkup;
use crate::shell::{Action, AppShell, AppState, DocumentAttribute, DocumentSink, Tab, ViewState};
use std::path::PathBuf;
use tauri::{AppHandle, Emitter, State};

/// 文档属性事件名
pub const DOCUMENT_EVENT: &str = "document-attributes";

/// 请求进行中推送的视图事件名
pub const VIEW_STATE_EVENT: &str = "view-state";

/// 外壳状态
pub struct ShellState {
    pub shell: AppShell,
    pub typesetter: KatexMarkup,
}

impl ShellState {
    pub fn new(shell: AppShell) -> Self {
        Self {
            shell,
            typesetter: KatexMarkup,
        }
    }

    fn view(&self, state: &AppState) -> ViewState {
        ViewState::build(state, &self.typesetter)
    }
}

/// 通过事件把文档属性推送给 WebView
pub struct TauriDocument {
    app: AppHandle,
}

impl TauriDocument {
    pub fn new(app: AppHandle) -> Self {
        Self { app }
    }
}

impl DocumentSink for TauriDocument {
    fn apply(&self, attribute: DocumentAttribute) {
        if let Err(e) = self.app.emit(DOCUMENT_EVENT, attribute) {
            log::warn!("Failed to emit document attribute: {}", e);
        }
    }

    fn state_changed(&self, state: &AppState) {
        let view = ViewState::build(state, &KatexMarkup);
        if let Err(e) = self.app.emit(VIEW_STATE_EVENT, view) {
            log::warn!("Failed to emit view state: {}", e);
        }
    }
}

fn dispatch(state: &ShellState, action: Action) -> Result<ViewState, String> {
    let next = state.shell.dispatch(action).map_err(|e| e.to_string())?;
    Ok(state.view(&next))
}

/// 获取当前视图
#[tauri::command]
pub fn get_view_state(state: State<'_, ShellState>) -> Result<ViewState, String> {
    let current = state.shell.snapshot().map_err(|e| e.to_string())?;
    Ok(state.view(&current))
}

/// 解析 data URI 形式的题目图片
#[tauri::command]
pub async fn solve_image(
    data_uri: String,
    state: State<'_, ShellState>,
) -> Result<ViewState, String> {
    let next = state
        .shell
        .solve_image(data_uri)
        .await
        .map_err(|e| e.to_string())?;
    Ok(state.view(&next))
}

/// 读取本地图片文件并解析
#[tauri::command]
pub async fn solve_image_file(
    path: String,
    state: State<'_, ShellState>,
) -> Result<ViewState, String> {
    let data_uri = read_image_as_data_uri(&PathBuf::from(path))
        .await
        .map_err(|e| e.to_string())?;
    solve_image(data_uri, state).await
}

/// 讲解概念输入框中的内容
#[tauri::command]
pub async fn explain_concept(state: State<'_, ShellState>) -> Result<ViewState, String> {
    let next = state
        .shell
        .explain_concept()
        .await
        .map_err(|e| e.to_string())?;
    Ok(state.view(&next))
}

#[tauri::command]
pub fn set_concept_text(text: String, state: State<'_, ShellState>) -> Result<ViewState, String> {
    dispatch(&state, Action::SetConceptText(text))
}

#[tauri::command]
pub fn open_concept_input(state: State<'_, ShellState>) -> Result<ViewState, String> {
    dispatch(&state, Action::OpenConceptInput)
}

#[tauri::command]
pub fn close_concept_input(state: State<'_, ShellState>) -> Result<ViewState, String> {
    dispatch(&state, Action::CloseConceptInput)
}

/// 切换标签页
#[tauri::command]
pub fn navigate(tab: Tab, state: State<'_, ShellState>) -> Result<ViewState, String> {
    dispatch(&state, Action::Navigate(tab))
}

#[tauri::command]
pub fn new_exercise(state: State<'_, ShellState>) -> Result<ViewState, String> {
    dispatch(&state, Action::NewExercise)
}

/// 打开一条历史记录，不重新请求模型
#[tauri::command]
pub fn select_history(id: String, state: State<'_, ShellState>) -> Result<ViewState, String> {
    dispatch(&state, Action::SelectHistory(id))
}

#[tauri::command]
pub fn toggle_dark_mode(state: State<'_, ShellState>) -> Result<ViewState, String> {
    dispatch(&state, Action::ToggleDarkMode)
}

#[tauri::command]
pub fn select_theme(name: String, state: State<'_, ShellState>) -> Result<ViewState, String> {
    dispatch(&state, Action::SelectTheme(name))
}

#[tauri::command]
pub fn set_solve_mode(mode: SolveMode, state: State<'_, ShellState>) -> Result<ViewState, String> {
    dispatch(&state, Action::SetMode(mode))
}

#[tauri::command]
pub fn dismiss_error(state: State<'_, ShellState>) -> Result<ViewState, String> {
    dispatch(&state, Action::DismissError)
}

#[tauri::command]
pub fn list_themes() -> Vec<AppTheme> {
    THEMES.to_vec()
}

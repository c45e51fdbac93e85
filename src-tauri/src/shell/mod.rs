// 应用外壳模块
// 状态机、编排与视图模型

pub mod app;
pub mod state;
pub mod view;

pub use app::{AppShell, DocumentAttribute, DocumentSink};
pub use state::{Action, AppState, Effect, RequestOrigin, Tab};
pub use view::{HistoryEntryView, QuestionView, SolutionView, ViewState};

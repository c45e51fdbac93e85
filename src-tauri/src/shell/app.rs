// 应用外壳编排
// 持有状态、历史、偏好与模型网关；等待网关期间不持有状态锁

use crate::services::gemini::SolutionGateway;
use crate::services::history::HistoryStore;
use crate::services::preferences::Preferences;
use crate::services::storage::KeyValueStore;
use crate::shell::state::{Action, AppState, Effect, RequestOrigin};
use anyhow::{anyhow, Result};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};

/// 需要同步到页面文档上的属性
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "attribute", content = "value", rename_all = "camelCase")]
pub enum DocumentAttribute {
    /// 根元素上的 `dark` class
    DarkClass(bool),
    /// `--m3-primary` 自定义属性
    AccentColor(String),
}

/// 文档属性接收端
pub trait DocumentSink: Send + Sync {
    fn apply(&self, attribute: DocumentAttribute);

    /// 等待网关前推送的中间状态（加载中）
    fn state_changed(&self, _state: &AppState) {}
}

pub struct AppShell {
    state: Mutex<AppState>,
    history: Mutex<HistoryStore>,
    preferences: Preferences,
    gateway: Arc<dyn SolutionGateway>,
    document: Arc<dyn DocumentSink>,
}

impl AppShell {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        gateway: Arc<dyn SolutionGateway>,
        document: Arc<dyn DocumentSink>,
    ) -> Self {
        let preferences = Preferences::new(store.clone());
        let history = HistoryStore::load(store);

        let mut state = AppState::new(preferences.load_dark_mode(), preferences.load_theme());
        state.apply(Action::HistoryLoaded(history.items().to_vec()));
        for effect in state.initial_effects() {
            match effect {
                Effect::SetDarkClass(dark) => document.apply(DocumentAttribute::DarkClass(dark)),
                Effect::SetAccentColor(color) => document.apply(DocumentAttribute::AccentColor(color)),
                _ => {}
            }
        }

        Self {
            state: Mutex::new(state),
            history: Mutex::new(history),
            preferences,
            gateway,
            document,
        }
    }

    fn lock_state(&self) -> Result<MutexGuard<'_, AppState>> {
        self.state.lock().map_err(|_| anyhow!("app state lock poisoned"))
    }

    pub fn snapshot(&self) -> Result<AppState> {
        Ok(self.lock_state()?.clone())
    }

    /// 应用动作并执行其副作用，返回最新状态
    pub fn dispatch(&self, action: Action) -> Result<AppState> {
        let effects = self.lock_state()?.apply(action);
        self.run_effects(effects)?;
        self.snapshot()
    }

    fn run_effects(&self, effects: Vec<Effect>) -> Result<()> {
        for effect in effects {
            match effect {
                Effect::AppendHistory { image, solution } => {
                    let items = {
                        let mut history = self
                            .history
                            .lock()
                            .map_err(|_| anyhow!("history lock poisoned"))?;
                        if let Err(e) = history.append(image, solution) {
                            log::error!("Failed to save history: {:#}", e);
                        }
                        history.items().to_vec()
                    };
                    self.lock_state()?.apply(Action::HistoryLoaded(items));
                }
                Effect::PersistDarkMode(dark) => {
                    if let Err(e) = self.preferences.save_dark_mode(dark) {
                        log::error!("{:#}", e);
                    }
                }
                Effect::PersistTheme(theme) => {
                    if let Err(e) = self.preferences.save_theme(&theme) {
                        log::error!("{:#}", e);
                    }
                }
                Effect::SetDarkClass(dark) => self.document.apply(DocumentAttribute::DarkClass(dark)),
                Effect::SetAccentColor(color) => {
                    self.document.apply(DocumentAttribute::AccentColor(color))
                }
            }
        }
        Ok(())
    }

    /// 拍题解析
    pub async fn solve_image(&self, data_uri: String) -> Result<AppState> {
        let started = self.dispatch(Action::StartImageSolve(data_uri.clone()))?;
        self.document.state_changed(&started);
        let mode = started.mode;

        let action = match self.gateway.solve_exercise(&data_uri, mode).await {
            Ok(solution) => Action::SolveSucceeded {
                solution,
                origin: RequestOrigin::Image(data_uri),
            },
            Err(e) => Action::SolveFailed(e.to_string()),
        };
        self.dispatch(action)
    }

    /// 讲解输入框中的概念
    ///
    /// 输入为空时不调用网关，状态保持不变。
    pub async fn explain_concept(&self) -> Result<AppState> {
        let (term, started) = {
            let mut state = self.lock_state()?;
            if state.concept_is_blank() {
                return Ok(state.clone());
            }
            let term = state.concept_text.clone();
            state.apply(Action::StartConceptExplain);
            (term, state.clone())
        };
        self.document.state_changed(&started);

        let action = match self.gateway.explain_concept(&term).await {
            Ok(Some(solution)) => Action::SolveSucceeded {
                solution,
                origin: RequestOrigin::Concept,
            },
            Ok(None) => Action::RequestSkipped,
            Err(e) => Action::SolveFailed(e.to_string()),
        };
        self.dispatch(action)
    }

    pub fn history_len(&self) -> Result<usize> {
        Ok(self
            .history
            .lock()
            .map_err(|_| anyhow!("history lock poisoned"))?
            .len())
    }
}

// 应用外壳状态机
// 单一状态记录 + 纯状态转换，副作用以 `Effect` 形式交给调用方执行

use crate::models::{AppTheme, ExerciseSolution, HistoryItem, SolveMode};
use serde::{Deserialize, Serialize};

/// 底部导航标签
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tab {
    #[default]
    Solve,
    History,
    Settings,
}

/// 解题请求来源，图片请求携带提交时的 data URI
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOrigin {
    Image(String),
    Concept,
}

/// 界面动作
#[derive(Debug, Clone)]
pub enum Action {
    HistoryLoaded(Vec<HistoryItem>),
    StartImageSolve(String),
    StartConceptExplain,
    SolveSucceeded {
        solution: ExerciseSolution,
        origin: RequestOrigin,
    },
    SolveFailed(String),
    /// 网关未发起请求，退出加载状态
    RequestSkipped,
    NewExercise,
    Navigate(Tab),
    SelectHistory(String),
    ToggleDarkMode,
    SelectTheme(String),
    SetMode(SolveMode),
    DismissError,
    OpenConceptInput,
    CloseConceptInput,
    SetConceptText(String),
}

/// 状态转换产生的副作用
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    AppendHistory {
        image: Option<String>,
        solution: ExerciseSolution,
    },
    PersistDarkMode(bool),
    SetDarkClass(bool),
    PersistTheme(AppTheme),
    SetAccentColor(String),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    pub active_tab: Tab,
    pub loading: bool,
    pub image: Option<String>,
    pub solution: Option<ExerciseSolution>,
    pub error: Option<String>,
    pub mode: SolveMode,
    pub history: Vec<HistoryItem>,
    pub theme: AppTheme,
    pub is_dark_mode: bool,
    pub show_concept_input: bool,
    pub concept_text: String,
}

impl AppState {
    pub fn new(is_dark_mode: bool, theme: AppTheme) -> Self {
        Self {
            active_tab: Tab::Solve,
            loading: false,
            image: None,
            solution: None,
            error: None,
            mode: SolveMode::default(),
            history: Vec::new(),
            theme,
            is_dark_mode,
            show_concept_input: false,
            concept_text: String::new(),
        }
    }

    /// 首次渲染时需要同步到文档的属性
    pub fn initial_effects(&self) -> Vec<Effect> {
        vec![
            Effect::SetDarkClass(self.is_dark_mode),
            Effect::SetAccentColor(self.theme.primary.to_string()),
        ]
    }

    /// 概念输入框内容去空白后是否为空
    pub fn concept_is_blank(&self) -> bool {
        self.concept_text.trim().is_empty()
    }

    pub fn apply(&mut self, action: Action) -> Vec<Effect> {
        match action {
            Action::HistoryLoaded(items) => {
                self.history = items;
                Vec::new()
            }
            Action::StartImageSolve(data_uri) => {
                self.loading = true;
                self.error = None;
                self.image = Some(data_uri);
                self.solution = None;
                Vec::new()
            }
            Action::StartConceptExplain => {
                if self.concept_is_blank() {
                    return Vec::new();
                }
                self.loading = true;
                self.show_concept_input = false;
                self.solution = None;
                self.error = None;
                Vec::new()
            }
            Action::SolveSucceeded { solution, origin } => {
                self.loading = false;
                self.solution = Some(solution.clone());
                let image = match origin {
                    RequestOrigin::Image(data_uri) => Some(data_uri),
                    RequestOrigin::Concept => {
                        self.concept_text.clear();
                        None
                    }
                };
                vec![Effect::AppendHistory { image, solution }]
            }
            Action::SolveFailed(message) => {
                self.loading = false;
                self.error = Some(message);
                Vec::new()
            }
            Action::RequestSkipped => {
                self.loading = false;
                Vec::new()
            }
            Action::NewExercise => {
                self.reset();
                Vec::new()
            }
            Action::Navigate(tab) => {
                if tab == Tab::Solve && self.solution.is_some() {
                    self.reset();
                } else {
                    self.active_tab = tab;
                }
                Vec::new()
            }
            Action::SelectHistory(id) => {
                if let Some(item) = self.history.iter().find(|h| h.id == id) {
                    self.solution = Some(item.solution.clone());
                    self.image = Some(item.image.clone());
                    self.active_tab = Tab::Solve;
                }
                Vec::new()
            }
            Action::ToggleDarkMode => {
                self.is_dark_mode = !self.is_dark_mode;
                vec![
                    Effect::SetDarkClass(self.is_dark_mode),
                    Effect::PersistDarkMode(self.is_dark_mode),
                ]
            }
            Action::SelectTheme(name) => match AppTheme::by_name(&name) {
                Some(theme) => {
                    self.theme = theme;
                    vec![
                        Effect::SetAccentColor(theme.primary.to_string()),
                        Effect::PersistTheme(theme),
                    ]
                }
                None => Vec::new(),
            },
            Action::SetMode(mode) => {
                self.mode = mode;
                Vec::new()
            }
            Action::DismissError => {
                self.error = None;
                Vec::new()
            }
            Action::OpenConceptInput => {
                self.show_concept_input = true;
                Vec::new()
            }
            Action::CloseConceptInput => {
                self.show_concept_input = false;
                Vec::new()
            }
            Action::SetConceptText(text) => {
                self.concept_text = text;
                Vec::new()
            }
        }
    }

    fn reset(&mut self) {
        self.solution = None;
        self.image = None;
        self.error = None;
        self.active_tab = Tab::Solve;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::sample_solution;
    use crate::models::THEMES;

    fn state() -> AppState {
        AppState::new(false, AppTheme::default())
    }

    #[test]
    fn test_image_solve_lifecycle() {
        let mut s = state();
        s.error = Some("old".to_string());

        assert!(s.apply(Action::StartImageSolve("data:image/png;base64,AA".into())).is_empty());
        assert!(s.loading);
        assert!(s.error.is_none());
        assert!(s.solution.is_none());

        let effects = s.apply(Action::SolveSucceeded {
            solution: sample_solution(1, 1),
            origin: RequestOrigin::Image("data:image/png;base64,AA".into()),
        });
        assert!(!s.loading);
        assert_eq!(s.solution, Some(sample_solution(1, 1)));
        assert_eq!(
            effects,
            vec![Effect::AppendHistory {
                image: Some("data:image/png;base64,AA".to_string()),
                solution: sample_solution(1, 1),
            }]
        );
    }

    #[test]
    fn test_failure_sets_error_and_leaves_solution_unset() {
        let mut s = state();
        s.apply(Action::StartImageSolve("AA".into()));
        s.apply(Action::SolveFailed("boom".into()));
        assert!(!s.loading);
        assert!(s.solution.is_none());
        assert_eq!(s.error.as_deref(), Some("boom"));

        s.apply(Action::DismissError);
        assert!(s.error.is_none());
    }

    #[test]
    fn test_blank_concept_is_a_no_op() {
        let mut s = state();
        s.show_concept_input = true;
        s.concept_text = "   ".to_string();
        let before = format!("{:?}", s);

        assert!(s.apply(Action::StartConceptExplain).is_empty());
        assert_eq!(format!("{:?}", s), before);
    }

    #[test]
    fn test_concept_success_clears_input() {
        let mut s = state();
        s.apply(Action::OpenConceptInput);
        s.apply(Action::SetConceptText("Théorème de Thalès".into()));
        s.apply(Action::StartConceptExplain);
        assert!(s.loading);
        assert!(!s.show_concept_input);

        let effects = s.apply(Action::SolveSucceeded {
            solution: sample_solution(1, 1),
            origin: RequestOrigin::Concept,
        });
        assert!(s.concept_text.is_empty());
        assert!(matches!(&effects[0], Effect::AppendHistory { image: None, .. }));
    }

    #[test]
    fn test_new_exercise_resets_result() {
        let mut s = state();
        s.active_tab = Tab::History;
        s.image = Some("img".into());
        s.solution = Some(sample_solution(1, 1));
        s.error = Some("err".into());

        s.apply(Action::NewExercise);
        assert_eq!(s.active_tab, Tab::Solve);
        assert!(s.image.is_none() && s.solution.is_none() && s.error.is_none());
    }

    #[test]
    fn test_navigation_keeps_in_flight_state() {
        let mut s = state();
        s.apply(Action::StartImageSolve("img".into()));
        s.apply(Action::Navigate(Tab::Settings));
        assert_eq!(s.active_tab, Tab::Settings);
        assert!(s.loading);
        assert_eq!(s.image.as_deref(), Some("img"));
    }

    #[test]
    fn test_navigate_to_solve_with_result_starts_new_exercise() {
        let mut s = state();
        s.solution = Some(sample_solution(1, 1));
        s.active_tab = Tab::History;
        s.apply(Action::Navigate(Tab::Solve));
        assert_eq!(s.active_tab, Tab::Solve);
        assert!(s.solution.is_none());
    }

    #[test]
    fn test_select_history_loads_result() {
        let mut s = state();
        let item = HistoryItem {
            id: "h1".to_string(),
            timestamp: 1,
            image: "data:image/jpeg;base64,BB".to_string(),
            solution: sample_solution(2, 2),
        };
        s.apply(Action::HistoryLoaded(vec![item.clone()]));
        s.active_tab = Tab::History;

        s.apply(Action::SelectHistory("h1".into()));
        assert_eq!(s.active_tab, Tab::Solve);
        assert_eq!(s.solution, Some(item.solution));
        assert_eq!(s.image.as_deref(), Some("data:image/jpeg;base64,BB"));

        s.apply(Action::SelectHistory("missing".into()));
        assert_eq!(s.image.as_deref(), Some("data:image/jpeg;base64,BB"));
    }

    #[test]
    fn test_toggle_dark_mode_twice_restores() {
        let mut s = state();
        let first = s.apply(Action::ToggleDarkMode);
        assert!(s.is_dark_mode);
        assert!(first.contains(&Effect::PersistDarkMode(true)));
        assert!(first.contains(&Effect::SetDarkClass(true)));

        let second = s.apply(Action::ToggleDarkMode);
        assert!(!s.is_dark_mode);
        assert!(second.contains(&Effect::PersistDarkMode(false)));
    }

    #[test]
    fn test_select_theme() {
        let mut s = state();
        let effects = s.apply(Action::SelectTheme(THEMES[1].name.to_string()));
        assert_eq!(s.theme, THEMES[1]);
        assert_eq!(
            effects,
            vec![
                Effect::SetAccentColor("#0284c7".to_string()),
                Effect::PersistTheme(THEMES[1]),
            ]
        );

        assert!(s.apply(Action::SelectTheme("nope".into())).is_empty());
        assert_eq!(s.theme, THEMES[1]);
    }
}

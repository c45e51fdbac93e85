// 前端视图模型
// 把状态整理成页面直接可用的结构，答案预先渲染为 HTML

use crate::models::{AppTheme, ExerciseSolution, HistoryItem, QuestionStatus, SolveMode, THEMES};
use crate::services::math_text::{MathTextRenderer, MathTypesetter};
use crate::shell::state::{AppState, Tab};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionView {
    pub number: String,
    pub text: String,
    pub status: QuestionStatus,
    pub answer_html: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SolutionView {
    pub subject: String,
    pub level: String,
    pub direction: &'static str,
    pub main_idea: String,
    pub coverage_label: String,
    pub coverage_ratio: Option<f64>,
    pub coverage_consistent: bool,
    pub all_solved: bool,
    pub verification_status: String,
    pub questions: Vec<QuestionView>,
}

impl SolutionView {
    pub fn build<T: MathTypesetter + ?Sized>(solution: &ExerciseSolution, typesetter: &T) -> Self {
        let coverage = solution.coverage();
        Self {
            subject: solution.subject.to_string(),
            level: solution.level.to_string(),
            direction: solution.language.direction(),
            main_idea: solution.main_idea.clone(),
            coverage_label: coverage.label(),
            coverage_ratio: coverage.ratio(),
            coverage_consistent: coverage.is_consistent(),
            all_solved: solution.all_solved,
            verification_status: solution.verification_status.clone(),
            questions: solution
                .questions
                .iter()
                .map(|q| QuestionView {
                    number: q.number.clone(),
                    text: q.text.clone(),
                    status: q.status,
                    answer_html: MathTextRenderer::new(Some(q.exam_answer.as_str()), typesetter)
                        .to_html(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntryView {
    pub id: String,
    pub timestamp: i64,
    pub main_idea: String,
    pub subject: String,
    pub has_image: bool,
}

impl From<&HistoryItem> for HistoryEntryView {
    fn from(item: &HistoryItem) -> Self {
        Self {
            id: item.id.clone(),
            timestamp: item.timestamp,
            main_idea: item.solution.main_idea.clone(),
            subject: item.solution.subject.to_string(),
            has_image: !item.image.is_empty(),
        }
    }
}

/// 返回给前端的完整视图
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    pub active_tab: Tab,
    pub loading: bool,
    pub error: Option<String>,
    pub mode: SolveMode,
    pub image: Option<String>,
    pub solution: Option<SolutionView>,
    pub history: Vec<HistoryEntryView>,
    pub theme: AppTheme,
    pub themes: Vec<AppTheme>,
    pub is_dark_mode: bool,
    pub show_concept_input: bool,
    pub concept_text: String,
}

impl ViewState {
    pub fn build<T: MathTypesetter + ?Sized>(state: &AppState, typesetter: &T) -> Self {
        Self {
            active_tab: state.active_tab,
            loading: state.loading,
            error: state.error.clone(),
            mode: state.mode,
            image: state.image.clone().filter(|i| !i.is_empty()),
            solution: state
                .solution
                .as_ref()
                .map(|s| SolutionView::build(s, typesetter)),
            history: state.history.iter().map(HistoryEntryView::from).collect(),
            theme: state.theme,
            themes: THEMES.to_vec(),
            is_dark_mode: state.is_dark_mode,
            show_concept_input: state.show_concept_input,
            concept_text: state.concept_text.clone(),
        }
    }
}

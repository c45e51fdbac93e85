// 解析结果数据契约
// 模型网关、历史记录与渲染共用的数据结构

use serde::{Deserialize, Serialize};
use std::fmt;

/// 学科标签
///
/// 模型可能返回列表之外的标签（例如概念讲解时的 `Explication de Concept`），
/// 这类标签原样保留在 `Other` 中。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Subject {
    Math,
    Physics,
    Chemistry,
    Svt,
    Philosophy,
    Autre,
    Other(String),
}

impl Subject {
    pub fn label(&self) -> &str {
        match self {
            Subject::Math => "Mathématiques",
            Subject::Physics => "Physique",
            Subject::Chemistry => "Chimie",
            Subject::Svt => "SVT",
            Subject::Philosophy => "Philosophie",
            Subject::Autre => "Autre",
            Subject::Other(label) => label,
        }
    }
}

impl From<String> for Subject {
    fn from(label: String) -> Self {
        match label.as_str() {
            "Mathématiques" => Subject::Math,
            "Physique" => Subject::Physics,
            "Chimie" => Subject::Chemistry,
            "SVT" => Subject::Svt,
            "Philosophie" => Subject::Philosophy,
            "Autre" => Subject::Autre,
            _ => Subject::Other(label),
        }
    }
}

impl From<Subject> for String {
    fn from(subject: Subject) -> Self {
        match subject {
            Subject::Other(label) => label,
            known => known.label().to_string(),
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// 年级标签
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EducationLevel {
    CommonCore,
    FirstBac,
    SecondBac,
    Other(String),
}

impl EducationLevel {
    pub fn label(&self) -> &str {
        match self {
            EducationLevel::CommonCore => "Tronc Commun",
            EducationLevel::FirstBac => "1ère Bac",
            EducationLevel::SecondBac => "2ème Bac",
            EducationLevel::Other(label) => label,
        }
    }
}

impl From<String> for EducationLevel {
    fn from(label: String) -> Self {
        match label.as_str() {
            "Tronc Commun" => EducationLevel::CommonCore,
            "1ère Bac" => EducationLevel::FirstBac,
            "2ème Bac" => EducationLevel::SecondBac,
            _ => EducationLevel::Other(label),
        }
    }
}

impl From<EducationLevel> for String {
    fn from(level: EducationLevel) -> Self {
        match level {
            EducationLevel::Other(label) => label,
            known => known.label().to_string(),
        }
    }
}

impl fmt::Display for EducationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// 解析语言，决定文字方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Ar,
    Fr,
}

impl Language {
    pub fn direction(&self) -> &'static str {
        match self {
            Language::Ar => "rtl",
            Language::Fr => "ltr",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionStatus {
    Solved,
    Unreadable,
    Partial,
}

/// 解题模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SolveMode {
    #[default]
    FastExam,
    DetailedStudy,
}

/// 单道题目的解答
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionAnswer {
    pub number: String,
    pub text: String,
    pub status: QuestionStatus,
    pub exam_answer: String,
}

/// 模型返回的完整解析结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseSolution {
    pub original_text: String,
    pub subject: Subject,
    pub level: EducationLevel,
    pub language: Language,
    pub main_idea: String,
    pub questions: Vec<QuestionAnswer>,
    pub verification_status: String,
    pub total_questions_found: u32,
    pub all_solved: bool,
}

impl ExerciseSolution {
    pub fn coverage(&self) -> Coverage {
        Coverage {
            answered: self.questions.len(),
            total: self.total_questions_found as usize,
        }
    }
}

/// 题目覆盖率：已解答数 / 识别到的题目总数
///
/// 两者不一致时只展示，不做修正。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coverage {
    pub answered: usize,
    pub total: usize,
}

impl Coverage {
    /// 总数为 0 时返回 `None`
    pub fn ratio(&self) -> Option<f64> {
        if self.total == 0 {
            None
        } else {
            Some(self.answered as f64 / self.total as f64)
        }
    }

    pub fn is_consistent(&self) -> bool {
        self.answered <= self.total
    }

    pub fn label(&self) -> String {
        format!("{}/{}", self.answered, self.total)
    }
}

/// 历史记录条目，创建后不可修改
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryItem {
    pub id: String,
    /// 毫秒时间戳
    pub timestamp: i64,
    /// 图片 data URI，概念讲解时为空
    pub image: String,
    pub solution: ExerciseSolution,
}

/// 主题配色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AppTheme {
    pub name: &'static str,
    pub primary: &'static str,
    pub surface: &'static str,
    pub container: &'static str,
}

pub const THEMES: [AppTheme; 4] = [
    AppTheme {
        name: "البنفسجي الملكي",
        primary: "#4f46e5",
        surface: "#fdfbff",
        container: "#f3f0f9",
    },
    AppTheme {
        name: "الأزرق الأطلسي",
        primary: "#0284c7",
        surface: "#f0f9ff",
        container: "#e0f2fe",
    },
    AppTheme {
        name: "الأخضر الغابوي",
        primary: "#059669",
        surface: "#f0fdf4",
        container: "#dcfce7",
    },
    AppTheme {
        name: "الأسود الأنيق",
        primary: "#18181b",
        surface: "#fafafa",
        container: "#f4f4f5",
    },
];

impl AppTheme {
    pub fn default_theme() -> AppTheme {
        THEMES[0]
    }

    pub fn by_name(name: &str) -> Option<AppTheme> {
        THEMES.iter().copied().find(|t| t.name == name)
    }
}

impl Default for AppTheme {
    fn default() -> Self {
        Self::default_theme()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn sample_solution(answered: usize, total: u32) -> ExerciseSolution {
        ExerciseSolution {
            original_text: "Soit f(x) = x^2".to_string(),
            subject: Subject::Math,
            level: EducationLevel::SecondBac,
            language: Language::Fr,
            main_idea: "Étude de fonction".to_string(),
            questions: (0..answered)
                .map(|i| QuestionAnswer {
                    number: format!("{}", i + 1),
                    text: format!("Question {}", i + 1),
                    status: QuestionStatus::Solved,
                    exam_answer: "$f'(x) = 2x$".to_string(),
                })
                .collect(),
            verification_status: "ok".to_string(),
            total_questions_found: total,
            all_solved: answered as u32 == total,
        }
    }
}

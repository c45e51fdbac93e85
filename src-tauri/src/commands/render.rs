// 渲染相关 Tauri 命令

use crate::models::{Coverage, ExerciseSolution};
use crate::services::math_text::{render_to_html, KatexMarkup, MathTextRenderer, Segment};

/// 渲染含公式的文本为 HTML
#[tauri::command]
pub fn render_math_text(text: Option<String>) -> Result<String, String> {
    Ok(render_to_html(text.as_deref()))
}

/// 渲染为片段列表，供前端自行排版
#[tauri::command]
pub fn render_math_segments(text: Option<String>) -> Result<Vec<Segment>, String> {
    Ok(MathTextRenderer::new(text.as_deref(), &KatexMarkup)
        .segments()
        .collect())
}

#[tauri::command]
pub fn solution_coverage(solution: ExerciseSolution) -> Result<Coverage, String> {
    Ok(solution.coverage())
}

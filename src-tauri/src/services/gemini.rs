// Gemini 模型网关
// 负责构建提示词与结构化输出约束、调用 generateContent 接口并解析解题结果

use crate::models::{ExerciseSolution, SolveMode};
use crate::services::image::DataUri;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// 默认模型
pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";

/// 默认接口地址
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// 图片解析失败时展示给用户的提示
pub const IMAGE_ANALYSIS_MESSAGE: &str = "حدث خطأ في قراءة الصورة. يرجى محاولة التقاط صورة أوضح.";

/// 概念讲解失败时展示给用户的提示
pub const CONCEPT_EXPLANATION_MESSAGE: &str = "فشل في شرح المفهوم. حاول صياغة السؤال بشكل أوضح.";

/// 网关错误
///
/// 只对外展示固定文案，底层原因保留在 source 中用于日志。
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("{}", IMAGE_ANALYSIS_MESSAGE)]
    ImageAnalysis(#[source] anyhow::Error),
    #[error("{}", CONCEPT_EXPLANATION_MESSAGE)]
    ConceptExplanation(#[source] anyhow::Error),
}

/// 解题网关接口
#[async_trait]
pub trait SolutionGateway: Send + Sync {
    async fn solve_exercise(
        &self,
        image_data_uri: &str,
        mode: SolveMode,
    ) -> Result<ExerciseSolution, GatewayError>;

    /// 输入去空白后为空时直接返回 `Ok(None)`，不发起请求
    async fn explain_concept(&self, term: &str) -> Result<Option<ExerciseSolution>, GatewayError>;
}

/// Gemini 配置
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl GeminiConfig {
    /// 从环境变量（含 `.env`）读取配置
    pub fn from_env() -> Self {
        let _ = dotenv::dotenv();

        let api_key = dotenv::var("GEMINI_API_KEY")
            .or_else(|_| dotenv::var("API_KEY"))
            .unwrap_or_default();
        if api_key.is_empty() {
            log::warn!("GEMINI_API_KEY is not set; model requests will fail");
        }

        Self {
            api_key,
            model: dotenv::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            base_url: dotenv::var("GEMINI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
    Text {
        text: String,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

/// 解题结果的结构化输出约束
pub fn solution_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "originalText": { "type": "STRING" },
            "subject": { "type": "STRING" },
            "level": { "type": "STRING" },
            "language": { "type": "STRING", "enum": ["ar", "fr"] },
            "mainIdea": { "type": "STRING" },
            "questions": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "number": { "type": "STRING" },
                        "text": { "type": "STRING" },
                        "status": { "type": "STRING", "enum": ["solved", "unreadable", "partial"] },
                        "examAnswer": { "type": "STRING" }
                    },
                    "required": ["number", "text", "status", "examAnswer"]
                }
            },
            "verificationStatus": { "type": "STRING" },
            "totalQuestionsFound": { "type": "INTEGER" },
            "allSolved": { "type": "BOOLEAN" }
        },
        "required": [
            "originalText", "subject", "level", "language", "mainIdea",
            "questions", "verificationStatus", "totalQuestionsFound", "allSolved"
        ]
    })
}

/// 提示词模板
pub struct SolvePrompt;

impl SolvePrompt {
    /// 拍题解析提示词
    pub fn exercise() -> &'static str {
        r#"Act as a high-precision Moroccan High School Teacher.
TASK: Analyze the image, detect EVERY question, and provide a formal exam-style solution.
MATH RULES: Wrap ALL math in $...$ or $$...$$. Never use raw LaTeX like \boxed outside delimiters.
OUTPUT JSON: Ensure valid JSON structure as requested."#
    }

    /// 概念讲解提示词
    pub fn concept(term: &str) -> String {
        format!(
            r#"Act as a Moroccan High School Teacher.
TASK: Explain the following concept: "{term}".
STRUCTURE: Provide a definition, key formulas (if any), and a practical example.
MATH RULES: Wrap ALL math/formulas in $...$ or $$...$$.
JSON FORMAT:
{{
  "originalText": "{term}",
  "subject": "Explication de Concept",
  "level": "Tous les niveaux",
  "language": "ar",
  "mainIdea": "شرح مفهوم: {term}",
  "questions": [
    {{
      "number": "الشرح",
      "text": "ما هو {term}؟",
      "status": "solved",
      "examAnswer": "Detailed pedagogical explanation with LaTeX."
    }}
  ],
  "verificationStatus": "Concept explained successfully",
  "totalQuestionsFound": 1,
  "allSolved": true
}}"#
        )
    }
}

/// Gemini HTTP 客户端
pub struct GeminiClient {
    config: GeminiConfig,
    http_client: reqwest::Client,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }

    async fn generate(&self, request: &GenerateContentRequest) -> Result<ExerciseSolution> {
        let response = self
            .http_client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.config.api_key)
            .json(request)
            .send()
            .await
            .context("Gemini request failed")?
            .error_for_status()
            .context("Gemini returned an error status")?
            .json::<GenerateContentResponse>()
            .await
            .context("Failed to decode Gemini response")?;

        let text = response_text(&response)?;
        parse_solution(&text)
    }
}

#[async_trait]
impl SolutionGateway for GeminiClient {
    async fn solve_exercise(
        &self,
        image_data_uri: &str,
        mode: SolveMode,
    ) -> Result<ExerciseSolution, GatewayError> {
        let image = DataUri::parse(image_data_uri);
        log::info!(
            "Solving exercise image ({}, {} base64 chars, mode {:?})",
            image.mime_type,
            image.payload.len(),
            mode
        );

        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: image.mime_type.to_string(),
                            data: image.payload.to_string(),
                        },
                    },
                    Part::Text {
                        text: SolvePrompt::exercise().to_string(),
                    },
                ],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: Some(solution_schema()),
            },
        };

        self.generate(&request).await.map_err(|e| {
            log::error!("Exercise analysis failed: {:#}", e);
            GatewayError::ImageAnalysis(e)
        })
    }

    async fn explain_concept(&self, term: &str) -> Result<Option<ExerciseSolution>, GatewayError> {
        let term = term.trim();
        if term.is_empty() {
            return Ok(None);
        }
        log::info!("Explaining concept ({} chars)", term.chars().count());

        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part::Text {
                    text: SolvePrompt::concept(term),
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: Some(solution_schema()),
            },
        };

        self.generate(&request).await.map(Some).map_err(|e| {
            log::error!("Concept explanation failed: {:#}", e);
            GatewayError::ConceptExplanation(e)
        })
    }
}

fn response_text(response: &GenerateContentResponse) -> Result<String> {
    let candidate = response
        .candidates
        .first()
        .ok_or_else(|| anyhow::anyhow!("Gemini response has no candidates"))?;

    let text: String = candidate
        .content
        .as_ref()
        .map(|c| c.parts.iter().filter_map(|p| p.text.as_deref()).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        anyhow::bail!("Gemini response has no text");
    }
    Ok(text)
}

/// 解析模型输出的 JSON，容忍 ```json 代码块包裹
pub fn parse_solution(text: &str) -> Result<ExerciseSolution> {
    let trimmed = text.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.trim_end().strip_suffix("```"))
        .unwrap_or(trimmed)
        .trim();

    serde_json::from_str(body).context("Model output does not match the solution schema")
}

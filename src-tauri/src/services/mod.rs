// 服务模块
// 提供核心业务逻辑服务

pub mod gemini;
pub mod history;
pub mod image;
pub mod math_text;
pub mod preferences;
pub mod storage;

pub use gemini::{
    GatewayError,
    GeminiClient,
    GeminiConfig,
    SolutionGateway,
    SolvePrompt,
    CONCEPT_EXPLANATION_MESSAGE,
    IMAGE_ANALYSIS_MESSAGE,
};

pub use history::{HistoryStore, HISTORY_CAPACITY, HISTORY_KEY};

pub use image::{read_image_as_data_uri, DataUri};

pub use math_text::{
    render_to_html,
    KatexMarkup,
    MathTextRenderer,
    MathTypesetter,
    Segment,
    TypesetError,
};

pub use preferences::Preferences;

pub use storage::{KeyValueStore, MemoryStore, SqliteStore};

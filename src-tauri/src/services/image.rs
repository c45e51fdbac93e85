// 图片输入处理
// 选中的图片文件转换为 data URI，发送前再拆出 MIME 类型与 base64 载荷

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::path::Path;

/// 无法识别时的默认 MIME 类型
pub const DEFAULT_IMAGE_MIME: &str = "image/jpeg";

/// 解析后的 data URI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri<'a> {
    pub mime_type: &'a str,
    pub payload: &'a str,
}

impl<'a> DataUri<'a> {
    /// 拆分 `data:<mime>;base64,<payload>`
    ///
    /// 没有逗号时整体视为已是 base64 载荷。
    pub fn parse(uri: &'a str) -> Self {
        match uri.split_once(',') {
            Some((header, payload)) => {
                let mime_type = header
                    .strip_prefix("data:")
                    .and_then(|rest| rest.split(';').next())
                    .filter(|mime| !mime.is_empty())
                    .unwrap_or(DEFAULT_IMAGE_MIME);
                Self { mime_type, payload }
            }
            None => Self {
                mime_type: DEFAULT_IMAGE_MIME,
                payload: uri,
            },
        }
    }
}

/// 根据扩展名推断 MIME 类型
pub fn mime_from_extension(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("heic") => "image/heic",
        _ => DEFAULT_IMAGE_MIME,
    }
}

pub fn encode_data_uri(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime_type, STANDARD.encode(bytes))
}

/// 读取图片文件并编码为 data URI
pub async fn read_image_as_data_uri(path: &Path) -> Result<String> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read image {}", path.display()))?;

    Ok(encode_data_uri(mime_from_extension(path), &bytes))
}

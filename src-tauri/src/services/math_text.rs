// 数学文本渲染
// 按 `$$...$$`（块级）与 `$...$`（行内）切分文本，公式交给排版器，其余原样输出

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

/// 文本缺失时展示的占位内容
pub const UNAVAILABLE_PLACEHOLDER: &str = "بيانات غير متوفرة";

/// 排版失败时展示的标记
pub const MATH_ERROR_MARKER: &str = "Math Error";

static MATH_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\$\$[\s\S]*?\$\$|\$[\s\S]*?\$)").expect("math token pattern")
});

/// 排版错误
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("typeset failed: {0}")]
pub struct TypesetError(pub String);

/// 公式排版接口
pub trait MathTypesetter {
    fn render_inline(&self, tex: &str) -> Result<String, TypesetError>;
    fn render_block(&self, tex: &str) -> Result<String, TypesetError>;
}

/// 切分后的原始片段
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    Text(&'a str),
    InlineMath(&'a str),
    BlockMath(&'a str),
}

/// 渲染后的片段
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Segment {
    Placeholder { text: String },
    Text { text: String },
    Math { source: String, markup: String, display: bool },
    MathError { source: String },
}

impl Segment {
    pub fn is_math(&self) -> bool {
        matches!(self, Segment::Math { .. })
    }

    pub fn to_html(&self) -> String {
        match self {
            Segment::Placeholder { text } => {
                format!("<span class=\"unavailable\">{}</span>", escape_html(text))
            }
            Segment::Text { text } => format!("<span class=\"text\">{}</span>", escape_html(text)),
            Segment::Math { markup, .. } => markup.clone(),
            Segment::MathError { source } => format!(
                "<code class=\"math-error\" title=\"{}\">{}</code>",
                escape_html(source),
                MATH_ERROR_MARKER
            ),
        }
    }
}

/// 惰性切分器，顺序与原文从左到右一致
pub struct Tokens<'a> {
    text: &'a str,
    cursor: usize,
    matches: regex::Matches<'static, 'a>,
    pending: Option<regex::Match<'a>>,
}

impl<'a> Iterator for Tokens<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(m) = self.pending.take() {
                self.cursor = m.end();
                return Some(classify(m.as_str()));
            }

            match self.matches.next() {
                Some(m) => {
                    let literal = &self.text[self.cursor..m.start()];
                    self.pending = Some(m);
                    if !literal.is_empty() {
                        return Some(Token::Text(literal));
                    }
                }
                None => {
                    if self.cursor >= self.text.len() {
                        return None;
                    }
                    let rest = &self.text[self.cursor..];
                    self.cursor = self.text.len();
                    return Some(Token::Text(rest));
                }
            }
        }
    }
}

/// 切分文本
pub fn tokenize(text: &str) -> Tokens<'_> {
    Tokens {
        text,
        cursor: 0,
        matches: MATH_TOKEN.find_iter(text),
        pending: None,
    }
}

fn classify(token: &str) -> Token<'_> {
    if token.len() >= 2 && token.starts_with("$$") && token.ends_with("$$") {
        let inner = if token.len() >= 4 { &token[2..token.len() - 2] } else { "" };
        Token::BlockMath(inner.trim())
    } else if token.len() >= 2 && token.starts_with('$') && token.ends_with('$') {
        Token::InlineMath(token[1..token.len() - 1].trim())
    } else {
        Token::Text(token)
    }
}

/// 数学文本渲染器
///
/// 每次调用 [`MathTextRenderer::segments`] 都会重新切分，不做缓存。
pub struct MathTextRenderer<'a, T: MathTypesetter + ?Sized + 'a> {
    text: Option<&'a str>,
    typesetter: &'a T,
}

impl<'a, T: MathTypesetter + ?Sized + 'a> MathTextRenderer<'a, T> {
    pub fn new(text: Option<&'a str>, typesetter: &'a T) -> Self {
        Self { text, typesetter }
    }

    pub fn segments(&self) -> Box<dyn Iterator<Item = Segment> + 'a> {
        let typesetter = self.typesetter;
        match self.text {
            None | Some("") | Some("null") => Box::new(std::iter::once(Segment::Placeholder {
                text: UNAVAILABLE_PLACEHOLDER.to_string(),
            })),
            Some(text) => Box::new(tokenize(text).map(move |token| render_token(token, typesetter))),
        }
    }

    pub fn to_html(&self) -> String {
        self.segments().map(|s| s.to_html()).collect()
    }
}

fn render_token<T: MathTypesetter + ?Sized>(token: Token<'_>, typesetter: &T) -> Segment {
    match token {
        Token::Text(text) => Segment::Text {
            text: text.to_string(),
        },
        Token::BlockMath(tex) => match typesetter.render_block(tex) {
            Ok(markup) => Segment::Math {
                source: tex.to_string(),
                markup,
                display: true,
            },
            Err(e) => {
                log::debug!("block math fell back to error marker: {}", e);
                Segment::MathError {
                    source: tex.to_string(),
                }
            }
        },
        Token::InlineMath(tex) => match typesetter.render_inline(tex) {
            Ok(markup) => Segment::Math {
                source: tex.to_string(),
                markup,
                display: false,
            },
            Err(e) => {
                log::debug!("inline math fell back to error marker: {}", e);
                Segment::MathError {
                    source: tex.to_string(),
                }
            }
        },
    }
}

/// 生成交给前端 KaTeX 排版的占位标记
///
/// 元素内先放转义后的 TeX 原文，页面加载 KaTeX 后按 `data-tex` 就地排版，
/// `math-block` 以块级模式排版。
#[derive(Debug, Default, Clone, Copy)]
pub struct KatexMarkup;

impl KatexMarkup {
    fn check(tex: &str) -> Result<(), TypesetError> {
        let mut depth: i32 = 0;
        let mut chars = tex.chars();
        while let Some(c) = chars.next() {
            match c {
                '\\' => {
                    if chars.next().is_none() {
                        return Err(TypesetError("dangling backslash".to_string()));
                    }
                }
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth < 0 {
                        return Err(TypesetError("unexpected '}'".to_string()));
                    }
                }
                _ => {}
            }
        }
        if depth != 0 {
            return Err(TypesetError("unbalanced braces".to_string()));
        }
        Ok(())
    }
}

impl MathTypesetter for KatexMarkup {
    fn render_inline(&self, tex: &str) -> Result<String, TypesetError> {
        Self::check(tex)?;
        Ok(format!(
            "<span class=\"math-inline\" data-tex=\"{}\">{}</span>",
            escape_html(tex),
            escape_html(tex)
        ))
    }

    fn render_block(&self, tex: &str) -> Result<String, TypesetError> {
        Self::check(tex)?;
        Ok(format!(
            "<div class=\"math-block\" data-tex=\"{}\">{}</div>",
            escape_html(tex),
            escape_html(tex)
        ))
    }
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// 使用默认排版器渲染为 HTML
pub fn render_to_html(text: Option<&str>) -> String {
    MathTextRenderer::new(text, &KatexMarkup).to_html()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingTypesetter;

    impl MathTypesetter for FailingTypesetter {
        fn render_inline(&self, _tex: &str) -> Result<String, TypesetError> {
            Err(TypesetError("boom".to_string()))
        }

        fn render_block(&self, tex: &str) -> Result<String, TypesetError> {
            Ok(format!("[{}]", tex))
        }
    }

    fn segments(text: &str) -> Vec<Segment> {
        MathTextRenderer::new(Some(text), &KatexMarkup).segments().collect()
    }

    #[test]
    fn test_plain_text_is_single_literal() {
        let text = "لا توجد معادلات هنا\n  سطر ثان";
        let result = segments(text);
        assert_eq!(
            result,
            vec![Segment::Text {
                text: text.to_string()
            }]
        );
    }

    #[test]
    fn test_single_inline_formula() {
        let result = segments("$x^2$");
        assert_eq!(result.len(), 1);
        match &result[0] {
            Segment::Math { source, display, .. } => {
                assert_eq!(source, "x^2");
                assert!(!display);
            }
            other => panic!("unexpected segment: {:?}", other),
        }
    }

    #[test]
    fn test_block_and_inline_keep_order() {
        let result = segments("A $$a$$ puis $b$ fin");
        let math: Vec<&Segment> = result.iter().filter(|s| s.is_math()).collect();
        assert_eq!(math.len(), 2);
        assert!(matches!(math[0], Segment::Math { source, display: true, .. } if source == "a"));
        assert!(matches!(math[1], Segment::Math { source, display: false, .. } if source == "b"));

        let kinds: Vec<bool> = result.iter().map(Segment::is_math).collect();
        assert_eq!(kinds, vec![false, true, false, true, false]);
    }

    #[test]
    fn test_multiline_block_is_trimmed() {
        let tokens: Vec<Token> = tokenize("$$\n\\int_0^1 x\\,dx\n$$").collect();
        assert_eq!(tokens, vec![Token::BlockMath("\\int_0^1 x\\,dx")]);
    }

    #[test]
    fn test_unclosed_dollar_stays_literal() {
        let tokens: Vec<Token> = tokenize("prix: 5$ seulement").collect();
        assert_eq!(tokens, vec![Token::Text("prix: 5$ seulement")]);
    }

    #[test]
    fn test_missing_text_renders_placeholder() {
        let missing: Vec<Segment> = MathTextRenderer::new(None, &KatexMarkup).segments().collect();
        let null: Vec<Segment> = MathTextRenderer::new(Some("null"), &KatexMarkup)
            .segments()
            .collect();
        let expected = vec![Segment::Placeholder {
            text: UNAVAILABLE_PLACEHOLDER.to_string(),
        }];
        assert_eq!(missing, expected);
        assert_eq!(null, expected);
    }

    #[test]
    fn test_typeset_failure_degrades_to_marker() {
        let renderer = MathTextRenderer::new(Some("$x$ et $$y$$"), &FailingTypesetter);
        let result: Vec<Segment> = renderer.segments().collect();
        assert_eq!(
            result[0],
            Segment::MathError {
                source: "x".to_string()
            }
        );
        assert!(matches!(&result[2], Segment::Math { markup, .. } if markup == "[y]"));
        assert!(renderer
            .to_html()
            .contains("<code class=\"math-error\" title=\"x\">Math Error</code>"));
    }

    #[test]
    fn test_unbalanced_braces_are_rejected() {
        assert!(KatexMarkup.render_inline("\\frac{1}{2").is_err());
        assert!(KatexMarkup.render_block("x\\").is_err());
        assert!(KatexMarkup.render_inline("\\frac{1}{2}").is_ok());
    }

    #[test]
    fn test_segments_are_restartable() {
        let renderer = MathTextRenderer::new(Some("a $b$ c"), &KatexMarkup);
        let first: Vec<Segment> = renderer.segments().collect();
        let second: Vec<Segment> = renderer.segments().collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
    }

    #[test]
    fn test_html_marks_formulas_for_katex() {
        let html = render_to_html(Some("Ligne 1\nLigne 2 $\\frac{1}{2}$ et $$x^2$$"));
        assert_eq!(
            html,
            concat!(
                "<span class=\"text\">Ligne 1\nLigne 2 </span>",
                "<span class=\"math-inline\" data-tex=\"\\frac{1}{2}\">\\frac{1}{2}</span>",
                "<span class=\"text\"> et </span>",
                "<div class=\"math-block\" data-tex=\"x^2\">x^2</div>",
            )
        );
    }

    #[test]
    fn test_html_escapes_literal_text() {
        let html = render_to_html(Some("a < b et $x<y$"));
        assert!(html.contains("a &lt; b et "));
        assert!(html.contains("data-tex=\"x&lt;y\""));
    }
}

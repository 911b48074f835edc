//! 模型返回文本的字段提取
//!
//! 先尝试严格解析文本中内嵌的第一个 JSON 对象；失败后退回关键词
//! 锚定的自由文本提取。对返回内容的所有防御性处理都收敛在这一层。

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

/// 分析彻底失败时返回给前端的占位值
pub const FAILURE_PLACEHOLDER: &str = "分析失败";
/// 自由文本提取不到某个字段时的占位值
pub const UNRECOGNIZED: &str = "未识别";

const NAME_KEYWORDS: &[&str] = &["产品名称", "名称", "name"];
const BRAND_KEYWORDS: &[&str] = &["品牌", "brand"];
const PRICE_KEYWORDS: &[&str] = &["价格", "price"];
const BARCODE_KEYWORDS: &[&str] = &["条形码", "barcode"];

/// 识别出的四个产品字段
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductFields {
    pub name: String,
    pub brand: String,
    pub price: String,
    pub barcode: String,
}

impl ProductFields {
    /// 全部字段置为失败占位值
    pub fn failure() -> Self {
        Self {
            name: FAILURE_PLACEHOLDER.to_string(),
            brand: FAILURE_PLACEHOLDER.to_string(),
            price: FAILURE_PLACEHOLDER.to_string(),
            barcode: FAILURE_PLACEHOLDER.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("模型返回内容为空")]
    EmptyContent,
}

/// 唯一的解析边界：从模型返回文本中提取产品字段
///
/// JSON 提取成功时缺失字段保持空串；自由文本提取不到的字段
/// 填 `未识别`。部分成功也算成功。
pub fn parse_product_fields(content: &str) -> Result<ProductFields, ExtractError> {
    let content = content.trim();
    if content.is_empty() {
        return Err(ExtractError::EmptyContent);
    }

    if let Some(fields) = parse_json_fields(content) {
        return Ok(fields);
    }

    Ok(parse_keyword_fields(content))
}

fn parse_json_fields(content: &str) -> Option<ProductFields> {
    let json_text = first_json_object(content)?;
    let value: serde_json::Value = serde_json::from_str(json_text).ok()?;

    let field =
        |key: &str| clean_field(value.get(key).and_then(|v| v.as_str()).unwrap_or_default());

    let fields = ProductFields {
        name: field("name"),
        brand: field("brand"),
        price: field("price"),
        barcode: field("barcode"),
    };

    // 条形码格式只做日志信号，不合规的值照样保留
    if !fields.barcode.is_empty() && !is_plausible_barcode(&fields.barcode) {
        info!("条形码格式可能有问题，保持原样: {}", fields.barcode);
    }

    Some(fields)
}

/// 花括号配对找出文本中第一个完整的 JSON 对象
fn first_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }

    None
}

fn parse_keyword_fields(content: &str) -> ProductFields {
    let field = |keywords: &[&str]| {
        extract_keyword(content, keywords).unwrap_or_else(|| UNRECOGNIZED.to_string())
    };

    ProductFields {
        name: field(NAME_KEYWORDS),
        brand: field(BRAND_KEYWORDS),
        price: field(PRICE_KEYWORDS),
        barcode: field(BARCODE_KEYWORDS),
    }
}

/// 扫描 `关键词：值` 形式的片段，捕获到断句符为止
fn extract_keyword(text: &str, keywords: &[&str]) -> Option<String> {
    for keyword in keywords {
        let pattern = format!(r"(?i){}[：:]+\s*([^\n,，。]+)", regex::escape(keyword));
        let re = Regex::new(&pattern).unwrap();

        if let Some(caps) = re.captures(text) {
            let value = clean_field(caps.get(1).map(|m| m.as_str()).unwrap_or_default());
            if !value.is_empty() {
                return Some(value);
            }
        }
    }

    None
}

/// 去掉中英文引号和首尾空白
fn clean_field(raw: &str) -> String {
    raw.chars()
        .filter(|c| !matches!(c, '"' | '“' | '”'))
        .collect::<String>()
        .trim()
        .to_string()
}

fn barcode_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{8,18}$").unwrap())
}

/// 条形码是否是 8-18 位纯数字（忽略空白）
pub fn is_plausible_barcode(barcode: &str) -> bool {
    let digits: String = barcode.split_whitespace().collect();
    barcode_regex().is_match(&digits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strict_json_extraction() {
        let content = r#"识别结果如下：
{"name": "旺仔牛奶", "brand": "旺旺", "price": "￥4.50", "barcode": "6901234567892"}
以上就是分析结果。"#;

        let fields = parse_product_fields(content).unwrap();
        assert_eq!(fields.name, "旺仔牛奶");
        assert_eq!(fields.brand, "旺旺");
        assert_eq!(fields.price, "￥4.50");
        assert_eq!(fields.barcode, "6901234567892");
    }

    #[test]
    fn test_json_extraction_missing_fields_default_empty() {
        let fields = parse_product_fields(r#"{"name": "矿泉水"}"#).unwrap();
        assert_eq!(fields.name, "矿泉水");
        assert_eq!(fields.brand, "");
        assert_eq!(fields.barcode, "");
    }

    #[test]
    fn test_json_extraction_strips_quotes() {
        let fields = parse_product_fields(r#"{"name": "“脉动” ", "brand": ""}"#).unwrap();
        assert_eq!(fields.name, "脉动");
    }

    #[test]
    fn test_keyword_fallback() {
        let content = "产品名称：康师傅冰红茶，品牌：康师傅\n价格: 3.5元。条形码：6920000000000";

        let fields = parse_product_fields(content).unwrap();
        assert_eq!(fields.name, "康师傅冰红茶");
        assert_eq!(fields.brand, "康师傅");
        assert_eq!(fields.price, "3.5元");
        assert_eq!(fields.barcode, "6920000000000");
    }

    #[test]
    fn test_keyword_fallback_unrecognized() {
        let fields = parse_product_fields("图片太模糊，无法识别任何信息").unwrap();
        assert_eq!(fields.name, UNRECOGNIZED);
        assert_eq!(fields.brand, UNRECOGNIZED);
        assert_eq!(fields.price, UNRECOGNIZED);
        assert_eq!(fields.barcode, UNRECOGNIZED);
    }

    #[test]
    fn test_empty_content_is_error() {
        assert!(parse_product_fields("   \n ").is_err());
    }

    #[test]
    fn test_first_json_object_nested() {
        let text = r#"前缀 {"a": {"b": 1}, "c": "x}y"} 后缀 {"d": 2}"#;
        assert_eq!(first_json_object(text), Some(r#"{"a": {"b": 1}, "c": "x}y"}"#));
    }

    #[test]
    fn test_invalid_json_falls_back_to_keywords() {
        let content = "{name: 没有引号的假JSON} 品牌：农夫山泉";
        let fields = parse_product_fields(content).unwrap();
        assert_eq!(fields.brand, "农夫山泉");
    }

    #[test]
    fn test_barcode_plausibility() {
        assert!(is_plausible_barcode("6901234567892"));
        assert!(is_plausible_barcode("690 1234 567892"));
        assert!(!is_plausible_barcode("1234567"));
        assert!(!is_plausible_barcode("abc123456789"));
        assert!(!is_plausible_barcode("1234567890123456789"));
    }
}

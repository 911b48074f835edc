//! DashScope 多模态接口客户端

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::debug;

use crate::analysis::extract::ExtractError;
use crate::analysis::{AnalysisRequest, ModelBackend};

pub const DEFAULT_API_URL: &str =
    "https://dashscope.aliyuncs.com/api/v1/services/aigc/multimodal-generation/generation";

/// 单次模型调用的超时
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const SYSTEM_PROMPT: &str =
    "你是一个专业的条形码和产品信息识别专家。你必须极其仔细地分析图片中的每个细节，专门寻找条形码数字和产品信息。";

/// 构造固定的识别指令
pub fn build_analysis_prompt(photo_count: usize) -> String {
    format!(
        r#"🎯 **专业条形码和产品识别任务**

我需要你极其仔细地检查这{photo_count}张产品图片中的每一个细节，识别产品信息和条形码。

**🔍 条形码识别策略**：
1. 重点检查产品包装底部、背面、侧面、标签贴纸和包装接缝处
2. 条形码特征：黑白相间的垂直条纹，下方有12-13位数字，可能分组显示
3. 寻找任何6位以上的连续数字、产品编号、序列号；即使数字模糊或只能看到部分也要记录
4. 宁可记录可疑的数字序列也不要遗漏，真的找不到任何数字才说"未识别"

**📝 产品信息识别**（次要）：
- 产品名称：包装正面的主要文字
- 品牌名称：logo或品牌标识
- 价格信息：价格标签、标价

**严格按JSON格式返回**：
{{"name": "产品名称", "brand": "品牌", "price": "价格", "barcode": "条形码数字或任何数字序列"}}

现在开始极其仔细地分析这些图片！"#
    )
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("没有可用的图片数据")]
    NoImages,
    #[error("请求模型接口失败: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API响应格式异常: {0}")]
    BadResponse(String),
    #[error(transparent)]
    Extract(#[from] ExtractError),
}

/// 千问 API 客户端
pub struct QwenClient {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl QwenClient {
    pub fn new(api_url: String, api_key: String) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            api_url,
            api_key,
        })
    }
}

#[async_trait]
impl ModelBackend for QwenClient {
    async fn invoke(&self, model: &str, request: &AnalysisRequest) -> Result<String, BackendError> {
        let mut content = vec![json!({ "text": request.prompt })];
        for image in &request.image_data_urls {
            content.push(json!({ "image": image }));
        }

        let payload = json!({
            "model": model,
            "input": {
                "messages": [
                    { "role": "system", "content": [{ "text": SYSTEM_PROMPT }] },
                    { "role": "user", "content": content },
                ]
            },
            "parameters": { "result_format": "message" }
        });

        debug!("发送请求到Qwen API ({})...", model);

        let response = self
            .http
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        debug!("Qwen API响应状态 ({}): {}", model, status);

        let body: Value = response.json().await?;
        if !status.is_success() {
            return Err(BackendError::BadResponse(format!(
                "HTTP {}: {}",
                status, body
            )));
        }

        extract_message_content(&body)
            .ok_or_else(|| BackendError::BadResponse(format!("无法取出文本内容 ({})", model)))
    }
}

/// 取出 `output.choices[0].message.content` 的文本
///
/// content 可能直接是字符串，也可能是需要拼接的片段数组
/// （数组元素是字符串或 `{"text": ...}` 对象）。
pub(crate) fn extract_message_content(body: &Value) -> Option<String> {
    let content = body
        .get("output")?
        .get("choices")?
        .get(0)?
        .get("message")?
        .get("content")?;

    match content {
        Value::String(text) => Some(text.clone()),
        Value::Array(items) => {
            let mut text = String::new();
            for item in items {
                match item {
                    Value::String(s) => text.push_str(s),
                    Value::Object(map) => {
                        if let Some(Value::String(s)) = map.get("text") {
                            text.push_str(s);
                        }
                    }
                    _ => {}
                }
            }
            Some(text)
        }
        _ => None,
    }
}

//! 多模型回退分析调度
//!
//! 给定一组已上传的图片，按固定优先级顺序逐个调用候选模型，
//! 任何失败（网络、超时、响应格式异常、内容为空）都不致命，
//! 继续尝试下一个模型；第一个能提取出内容的模型即为最终结果，
//! 全部失败时返回带占位字段的聚合错误。模型之间严格串行，
//! 不并行竞速。

pub mod client;
pub mod extract;
pub mod image;

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::{debug, error, info};

pub use client::{BackendError, QwenClient};
pub use extract::ProductFields;

/// 按优先级排列的候选模型
pub const MODEL_CANDIDATES: [&str; 6] = [
    "qwen-vl-plus",
    "qwen-vl-max",
    "qwen-vl-v1",
    "qwen-plus",
    "qwen-turbo",
    "qwen-max",
];

/// 一次分析的请求载荷：固定指令 + 编码好的图片
pub struct AnalysisRequest {
    pub prompt: String,
    pub image_data_urls: Vec<String>,
}

/// 单个模型后端的调用抽象，返回模型的原始文本内容
#[async_trait]
pub trait ModelBackend: Send + Sync {
    async fn invoke(&self, model: &str, request: &AnalysisRequest) -> Result<String, BackendError>;
}

/// 分析结果
#[derive(Debug, Clone)]
pub enum AnalysisOutcome {
    Success(ProductFields),
    Failure { error: String },
}

/// 多模型回退调度器
pub struct AnalysisDispatcher<B: ModelBackend> {
    backend: B,
    models: Vec<String>,
    base_dir: PathBuf,
}

impl<B: ModelBackend> AnalysisDispatcher<B> {
    pub fn new(backend: B, base_dir: PathBuf) -> Self {
        Self::with_models(
            backend,
            base_dir,
            MODEL_CANDIDATES.iter().map(|m| m.to_string()).collect(),
        )
    }

    /// 指定候选模型列表（测试用）
    pub fn with_models(backend: B, base_dir: PathBuf, models: Vec<String>) -> Self {
        Self {
            backend,
            models,
            base_dir,
        }
    }

    /// 按顺序尝试每个候选模型，返回第一个成功的结果
    pub async fn analyze(&self, image_paths: &[String], photo_count: usize) -> AnalysisOutcome {
        let mut image_data_urls = Vec::new();
        for path in image_paths {
            // 无法读取的图片跳过，不让整个请求失败
            if let Some(data_url) = image::load_image_data_url(&self.base_dir, path).await {
                image_data_urls.push(data_url);
            }
        }

        let request = AnalysisRequest {
            prompt: client::build_analysis_prompt(photo_count),
            image_data_urls,
        };

        info!("🚀 开始AI分析，尝试 {} 个模型...", self.models.len());

        let mut errors = Vec::new();
        for (index, model) in self.models.iter().enumerate() {
            info!("📡 尝试模型 {}/{}: {}", index + 1, self.models.len(), model);

            match self.try_model(model, &request).await {
                Ok(fields) => {
                    info!("✅ 模型 {} 分析成功", model);
                    return AnalysisOutcome::Success(fields);
                }
                Err(err) => {
                    error!("❌ 模型 {} 分析失败: {}", model, err);
                    errors.push(format!("{}: {}", model, err));
                }
            }
        }

        error!("所有模型都分析失败");
        AnalysisOutcome::Failure {
            error: format!("所有可用模型都分析失败 ({})", errors.join("; ")),
        }
    }

    /// 单个模型的一次完整尝试：调用 + 内容提取
    async fn try_model(
        &self,
        model: &str,
        request: &AnalysisRequest,
    ) -> Result<ProductFields, BackendError> {
        if request.image_data_urls.is_empty() {
            return Err(BackendError::NoImages);
        }

        let content = self.backend.invoke(model, request).await?;
        debug!("AI分析结果 ({}): {}", model, content);

        Ok(extract::parse_product_fields(&content)?)
    }
}

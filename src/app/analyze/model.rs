//! 上传与分析接口的请求/响应结构

use serde::{Deserialize, Serialize};

use crate::analysis::ProductFields;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    pub image_path: String,
    pub filename: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    pub image_paths: Option<Vec<String>>,
    pub photo_count: Option<usize>,
}

/// 分析彻底失败时的响应：带占位字段，前端据此显示失败状态
/// 而不是因为字段缺失而崩溃
#[derive(Serialize)]
pub struct AnalyzeFailureResponse {
    pub success: bool,
    pub error: String,
    pub data: ProductFields,
}

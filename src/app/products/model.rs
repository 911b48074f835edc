//! 产品数据模型
//!
//! 对外的 JSON 字段统一使用 camelCase，与既有数据文件和前端保持一致。

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 一条产品记录
///
/// `serial_number` 是人读的日序列号（`YYYYMMDDNNN`），当天内唯一
/// 且单调递增；`id` 是程序用的唯一标识。记录创建后不做原地更新，
/// 删除时连同引用的图片文件一起移除。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRecord {
    pub id: Uuid,
    pub serial_number: String,
    pub name: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub barcode: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_paths: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// 保存产品请求
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveProductRequest {
    pub name: String,
    pub brand: Option<String>,
    pub price: Option<String>,
    pub barcode: Option<String>,
    pub description: Option<String>,
    pub image_paths: Option<Vec<String>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveProductResponse {
    pub success: bool,
    pub serial_number: String,
    pub product_id: Uuid,
}

#[derive(Serialize)]
pub struct ProductListResponse {
    pub success: bool,
    pub products: Vec<ProductRecord>,
    pub total: usize,
}

#[derive(Serialize)]
pub struct DeleteProductResponse {
    pub success: bool,
}

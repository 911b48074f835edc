//! 产品接口处理器

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tracing::info;
use uuid::Uuid;

use crate::app::products::excel;
use crate::app::products::model::{
    DeleteProductResponse, ProductListResponse, SaveProductRequest, SaveProductResponse,
};
use crate::app::AppState;
use crate::core::error::AppError;

/// 保存产品
pub async fn save_product(
    State(state): State<AppState>,
    Json(payload): Json<SaveProductRequest>,
) -> Result<Json<SaveProductResponse>, AppError> {
    info!("收到保存产品请求");

    if payload.name.trim().is_empty() {
        return Err(AppError::BadRequest("产品名称不能为空".to_string()));
    }

    let record = state.products.save(payload).await?;

    Ok(Json(SaveProductResponse {
        success: true,
        serial_number: record.serial_number,
        product_id: record.id,
    }))
}

/// 获取产品列表，按创建时间倒序
pub async fn list_products(
    State(state): State<AppState>,
) -> Result<Json<ProductListResponse>, AppError> {
    info!("收到获取产品列表请求");

    let products = state.products.list().await?;
    let total = products.len();

    Ok(Json(ProductListResponse {
        success: true,
        products,
        total,
    }))
}

/// 删除产品及其图片文件
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeleteProductResponse>, AppError> {
    info!("收到删除产品请求: {}", id);

    match state.products.delete(id).await? {
        Some(_) => Ok(Json(DeleteProductResponse { success: true })),
        None => Err(AppError::NotFound("产品不存在".to_string())),
    }
}

/// 导出全部产品为 Excel 下载
pub async fn export_excel(State(state): State<AppState>) -> Result<Response, AppError> {
    info!("收到Excel导出请求");

    let products = state.products.list().await?;
    if products.is_empty() {
        return Err(AppError::NotFound("没有产品数据可导出".to_string()));
    }

    let buffer = excel::build_workbook(&products)
        .map_err(|err| AppError::InternalServerError(format!("Excel导出失败: {}", err)))?;

    let disposition = format!(
        "attachment; filename=\"{}\"",
        excel::percent_encode(&excel::export_filename())
    );

    info!("Excel导出成功");

    Ok((
        StatusCode::OK,
        [
            (
                header::CONTENT_TYPE,
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet".to_string(),
            ),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        buffer,
    )
        .into_response())
}

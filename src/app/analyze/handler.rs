//! 上传与分析接口处理器

use std::path::Path;

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{error, info};
use uuid::Uuid;

use crate::analysis::{AnalysisOutcome, ProductFields};
use crate::app::analyze::model::{AnalyzeFailureResponse, AnalyzeRequest, UploadResponse};
use crate::app::AppState;
use crate::core::error::AppError;
use crate::core::response::ApiResponse;

/// 接收单张图片，保存为 uuid + 原扩展名
pub async fn upload_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    info!("收到图片上传请求");

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::BadRequest(format!("解析上传内容失败: {}", err)))?
    {
        if field.name() != Some("image") {
            continue;
        }

        let original_name = field.file_name().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|err| AppError::BadRequest(format!("读取上传内容失败: {}", err)))?;

        let extension = Path::new(&original_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e))
            .unwrap_or_default();
        let filename = format!("{}{}", Uuid::new_v4(), extension);

        let dest = state.config.uploads_dir.join(&filename);
        tokio::fs::write(&dest, &data)
            .await
            .map_err(|err| AppError::InternalServerError(format!("保存图片失败: {}", err)))?;

        info!("图片上传成功: {}", filename);

        return Ok(Json(UploadResponse {
            success: true,
            image_path: format!("/uploads/{}", filename),
            filename,
        }));
    }

    error!("未收到图片文件");
    Err(AppError::BadRequest("未收到图片文件".to_string()))
}

/// AI 分析一组已上传的图片
pub async fn analyze(
    State(state): State<AppState>,
    Json(payload): Json<AnalyzeRequest>,
) -> Response {
    info!("收到AI分析请求");

    let image_paths = payload.image_paths.unwrap_or_default();
    if image_paths.is_empty() {
        return AppError::BadRequest("缺少图片路径或图片路径格式错误".to_string()).into_response();
    }

    info!("开始分析 {} 张图片", image_paths.len());
    let photo_count = payload.photo_count.unwrap_or(image_paths.len());

    match state.dispatcher.analyze(&image_paths, photo_count).await {
        AnalysisOutcome::Success(fields) => Json(ApiResponse::success(fields)).into_response(),
        AnalysisOutcome::Failure { error } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(AnalyzeFailureResponse {
                success: false,
                error,
                data: ProductFields::failure(),
            }),
        )
            .into_response(),
    }
}

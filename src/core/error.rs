//! 核心错误处理模块

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::core::response::ErrorResponse;
use crate::infrastructure::lock::LockError;
use crate::infrastructure::store::StoreError;

/// 应用级错误，统一映射为 `{success:false, error}` 的 JSON 响应
#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    NotFound(String),
    RateLimited,
    LockTimeout,
    InternalServerError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                "请求过于频繁，请稍后再试".to_string(),
            ),
            AppError::LockTimeout => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "文件锁获取超时，请稍后重试".to_string(),
            ),
            AppError::InternalServerError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, Json(ErrorResponse::new(&message))).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Lock(LockError::Timeout) => AppError::LockTimeout,
            other => AppError::InternalServerError(other.to_string()),
        }
    }
}

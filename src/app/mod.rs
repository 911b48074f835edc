//! 应用层：共享状态、路由和各业务模块

pub mod analyze;
pub mod products;
pub mod system;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::analysis::{AnalysisDispatcher, QwenClient};
use crate::app::products::service::ProductService;
use crate::config::AppConfig;
use crate::core::middleware::{rate_limiting_middleware, request_logging_middleware};
use crate::core::rate_limit::RateLimiter;

/// 应用共享状态，构造一次后在各处理器间克隆
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub products: ProductService,
    pub dispatcher: Arc<AnalysisDispatcher<QwenClient>>,
    pub rate_limiter: Arc<RateLimiter>,
    pub started_at: Instant,
}

/// 组装全部路由和中间件层
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/upload-image", post(analyze::handler::upload_image))
        .route("/analyze", post(analyze::handler::analyze))
        .route("/save-product", post(products::handler::save_product))
        .route("/products", get(products::handler::list_products))
        .route("/products/:id", delete(products::handler::delete_product))
        .route("/export-excel", get(products::handler::export_excel))
        .route("/system-status", get(system::system_status))
        .nest_service("/uploads", ServeDir::new(&state.config.uploads_dir))
        .layer(middleware::from_fn(request_logging_middleware))
        .layer(middleware::from_fn_with_state(
            state.rate_limiter.clone(),
            rate_limiting_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes))
        .with_state(state)
}

/// 监听地址由配置端口决定，绑定所有网卡
pub fn bind_addr(config: &AppConfig) -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], config.port))
}

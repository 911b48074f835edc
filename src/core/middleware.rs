//! 核心中间件模块

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use tracing::{info, warn};

use crate::core::error::AppError;
use crate::core::rate_limit::RateLimiter;

/// 请求日志中间件
pub async fn request_logging_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let uri = req.uri().clone();
    let client_ip = client_ip(&req);

    let response = next.run(req).await;
    let status = response.status();
    let duration = start.elapsed();

    info!(
        "{} {} - {} - {}ms - {}",
        method,
        uri,
        status,
        duration.as_millis(),
        client_ip
    );

    response
}

/// 限流中间件：按客户端 IP 统计
pub async fn rate_limiting_middleware(
    State(limiter): State<Arc<RateLimiter>>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let client_ip = client_ip(&req);

    if !limiter.is_allowed(&client_ip) {
        warn!("客户端 {} 触发限流", client_ip);
        return Err(AppError::RateLimited);
    }

    Ok(next.run(req).await)
}

/// 优先取 X-Forwarded-For（部署在反向代理后面时），否则取连接地址
fn client_ip(req: &Request) -> String {
    if let Some(forwarded) = req
        .headers()
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
    {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }

    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

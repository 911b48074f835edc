//! 系统状态接口

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::utils::SystemInfo;

/// 存活状态、版本号和进程资源占用
pub async fn system_status(State(state): State<AppState>) -> Json<Value> {
    let info = SystemInfo::new();
    let (used, total) = info.memory_usage();

    Json(json!({
        "success": true,
        "status": "running",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "memory_usage": {
            "process_rss": info.process_memory(),
            "system_used": used,
            "system_total": total,
        },
        "active_rate_limit_clients": state.rate_limiter.active_clients(),
        "uptime": state.started_at.elapsed().as_secs_f64(),
    }))
}

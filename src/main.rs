//! 智能产品收集系统服务端
//!
//! 拍照 → AI 识别产品信息 → JSON 文件存储 → Excel 导出。

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::net::TcpListener;
use tracing::{info, warn};

use product_collector::analysis::{AnalysisDispatcher, QwenClient};
use product_collector::app::products::service::ProductService;
use product_collector::app::{bind_addr, router, AppState};
use product_collector::config::AppConfig;
use product_collector::core::rate_limit::RateLimiter;
use product_collector::infrastructure::lock::FileLockManager;
use product_collector::infrastructure::logger::Logger;
use product_collector::infrastructure::store::ProductStore;

#[tokio::main]
async fn main() {
    Logger::init();

    let config = Arc::new(AppConfig::from_env());

    std::fs::create_dir_all(&config.uploads_dir).expect("无法创建 uploads 目录");

    if config.qwen_api_key.is_empty() {
        warn!("未配置 QWEN_API_KEY，AI 分析请求将全部失败");
    }

    let lock_manager = Arc::new(FileLockManager::new());
    let store = Arc::new(ProductStore::new(
        config.data_file.clone(),
        lock_manager,
        Duration::from_millis(config.lock_timeout_ms),
    ));
    let products = ProductService::new(store, config.base_dir.clone());

    let client = QwenClient::new(config.qwen_api_url.clone(), config.qwen_api_key.clone())
        .expect("初始化 HTTP 客户端失败");
    let dispatcher = Arc::new(AnalysisDispatcher::new(client, config.base_dir.clone()));

    let rate_limiter = Arc::new(RateLimiter::new(
        config.rate_limit_max_requests,
        Duration::from_secs(config.rate_limit_window_secs),
    ));

    let state = AppState {
        config: config.clone(),
        products,
        dispatcher,
        rate_limiter,
        started_at: Instant::now(),
    };

    let app = router(state);

    let addr = bind_addr(&config);
    let listener = TcpListener::bind(addr).await.expect("无法绑定端口");

    info!("🚀 智能产品收集系统启动成功！");
    info!("📊 系统信息:");
    info!("   端口: {}", config.port);
    info!("   数据文件: {}", config.data_file.display());
    info!("   上传目录: {}", config.uploads_dir.display());
    info!("   文件锁: 已启用");
    info!(
        "   限流保护: 每 {} 秒最多 {} 个请求",
        config.rate_limit_window_secs, config.rate_limit_max_requests
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("服务器启动失败");

    info!("服务器已关闭");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("无法监听 Ctrl+C 信号");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("无法监听 SIGTERM 信号")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("收到退出信号，正在优雅关闭服务器...");
}

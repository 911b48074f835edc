//! 运行配置
//!
//! 全部配置来自环境变量，未设置时使用内置默认值。

use std::env;
use std::path::PathBuf;

use crate::analysis::client::DEFAULT_API_URL;

/// 应用配置，进程启动时读取一次
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    /// 数据文件和 uploads 目录的基准目录
    pub base_dir: PathBuf,
    pub data_file: PathBuf,
    pub uploads_dir: PathBuf,
    pub qwen_api_url: String,
    pub qwen_api_key: String,
    /// 文件锁获取超时（毫秒）
    pub lock_timeout_ms: u64,
    /// 限流窗口内允许的最大请求数
    pub rate_limit_max_requests: usize,
    /// 限流窗口长度（秒）
    pub rate_limit_window_secs: u64,
    /// 上传请求体上限（字节）
    pub max_upload_bytes: usize,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let base_dir = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

        let port = env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3443);

        let data_file = env::var("DATA_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| base_dir.join("products-concurrent.json"));

        let uploads_dir = env::var("UPLOADS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| base_dir.join("uploads"));

        Self {
            port,
            base_dir,
            data_file,
            uploads_dir,
            qwen_api_url: env::var("QWEN_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            qwen_api_key: env::var("QWEN_API_KEY").unwrap_or_default(),
            lock_timeout_ms: 5000,
            rate_limit_max_requests: 20,
            rate_limit_window_secs: 60,
            max_upload_bytes: 50 * 1024 * 1024,
        }
    }
}

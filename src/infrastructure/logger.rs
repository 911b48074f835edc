//! 日志基础设施

use tracing_subscriber::EnvFilter;

pub struct Logger;

impl Logger {
    /// 初始化全局日志订阅者，级别可用 RUST_LOG 覆盖
    pub fn init() {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

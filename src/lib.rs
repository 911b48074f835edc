//! # 智能产品收集系统
//!
//! 拍摄产品照片，调用远程多模态模型识别产品名称/品牌/价格/条形码，
//! 结果持久化在单个 JSON 数据文件中，支持导出 Excel。核心组件：
//! - 按键文件锁管理器：进程内对共享数据文件的串行化访问（FIFO 等待队列 + 超时）
//! - 多模型回退分析调度器：按固定优先级逐个尝试模型，首个成功即返回

pub mod analysis;
pub mod app;
pub mod config;
pub mod core;
pub mod infrastructure;
pub mod utils;

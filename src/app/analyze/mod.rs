//! 图片上传与 AI 分析接口

pub mod handler;
pub mod model;

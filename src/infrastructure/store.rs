//! 产品数据存储基础设施
//!
//! 全部产品记录保存在单个 JSON 文件里，读写都先经过 `FileLockManager`
//! 串行化。写入采用"临时文件 + 原子重命名"，崩溃时不会留下半截的
//! 数据文件。损坏的数据文件不致命：隔离备份后按空集合继续。

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::app::products::model::ProductRecord;
use crate::infrastructure::lock::{FileLockManager, LockError};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Lock(#[from] LockError),
    #[error("读写产品数据失败: {0}")]
    Io(#[from] std::io::Error),
    #[error("序列化产品数据失败: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// 产品集合的文件存储
pub struct ProductStore {
    path: PathBuf,
    locks: Arc<FileLockManager>,
    lock_timeout: Duration,
}

impl ProductStore {
    pub fn new(path: PathBuf, locks: Arc<FileLockManager>, lock_timeout: Duration) -> Self {
        Self {
            path,
            locks,
            lock_timeout,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_key(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }

    /// 读取全部记录
    ///
    /// 文件不存在视为空集合；旧版 `{products: [...]}` 格式就地迁移；
    /// 无法解析或者形状不对的内容整体隔离备份，然后返回空集合。
    pub async fn read_all(&self) -> Result<Vec<ProductRecord>, StoreError> {
        let _guard = self.locks.acquire(&self.lock_key(), self.lock_timeout).await?;

        let data = match tokio::fs::read_to_string(&self.path).await {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        match serde_json::from_str::<Value>(&data) {
            Ok(value) if value.is_array() => match serde_json::from_value(value) {
                Ok(records) => Ok(records),
                Err(err) => {
                    warn!("产品数据文件记录格式错误: {}", err);
                    self.quarantine().await?;
                    Ok(Vec::new())
                }
            },
            Ok(Value::Object(mut map)) if map.get("products").is_some_and(Value::is_array) => {
                info!("检测到旧格式数据，正在转换...");
                let products = map.remove("products").unwrap_or(Value::Null);
                match serde_json::from_value::<Vec<ProductRecord>>(products) {
                    Ok(records) => {
                        self.write_unlocked(&records).await?;
                        Ok(records)
                    }
                    Err(err) => {
                        warn!("旧格式数据无法转换: {}", err);
                        self.quarantine().await?;
                        Ok(Vec::new())
                    }
                }
            }
            Ok(other) => {
                let kind = match other {
                    Value::Object(_) => "object",
                    Value::String(_) => "string",
                    Value::Number(_) => "number",
                    Value::Bool(_) => "bool",
                    Value::Null => "null",
                    Value::Array(_) => "array",
                };
                warn!("产品数据文件格式错误，不是数组类型: {}", kind);
                self.quarantine().await?;
                Ok(Vec::new())
            }
            Err(err) => {
                warn!("产品数据文件无法解析: {}", err);
                self.quarantine().await?;
                Ok(Vec::new())
            }
        }
    }

    /// 写入全部记录，所有错误都向调用方传播
    pub async fn write_all(&self, records: &[ProductRecord]) -> Result<(), StoreError> {
        let _guard = self.locks.acquire(&self.lock_key(), self.lock_timeout).await?;
        self.write_unlocked(records).await
    }

    /// 持有锁的前提下执行原子写入：先写临时文件再重命名
    async fn write_unlocked(&self, records: &[ProductRecord]) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(records)?;

        let mut tmp_path = self.path.as_os_str().to_owned();
        tmp_path.push(".tmp");
        let tmp_path = PathBuf::from(tmp_path);

        tokio::fs::write(&tmp_path, json).await?;
        tokio::fs::rename(&tmp_path, &self.path).await?;
        Ok(())
    }

    /// 把损坏的数据文件改名隔离，带时间戳后缀
    async fn quarantine(&self) -> Result<(), StoreError> {
        let mut backup_path = self.path.as_os_str().to_owned();
        backup_path.push(format!(".backup.{}", chrono::Utc::now().timestamp_millis()));
        let backup_path = PathBuf::from(backup_path);

        tokio::fs::rename(&self.path, &backup_path).await?;
        warn!("已备份损坏的数据文件到: {}", backup_path.display());
        Ok(())
    }
}

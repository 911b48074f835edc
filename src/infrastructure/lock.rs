//! 文件锁基础设施
//!
//! 进程内的按键互斥锁：同一个资源键同一时刻最多只有一个持有者，
//! 等待者按 FIFO 顺序排队，超时后从队列中移除并返回错误。
//! 这只是一个协作式的进程内闸门，不涉及操作系统级文件锁，
//! 多个进程实例共享同一数据文件时不提供任何保护。

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::oneshot;

#[derive(Debug, Error)]
pub enum LockError {
    #[error("文件锁获取超时")]
    Timeout,
    #[error("锁管理器已关闭")]
    Closed,
}

struct Waiter {
    id: u64,
    tx: oneshot::Sender<()>,
}

#[derive(Default)]
struct LockState {
    held: bool,
    queue: VecDeque<Waiter>,
}

struct LockTable {
    locks: HashMap<String, LockState>,
    next_waiter_id: u64,
}

/// 按键文件锁管理器
///
/// 每个进程构造一个实例并通过 Arc 共享，测试可以各自实例化，
/// 互不干扰。
pub struct FileLockManager {
    table: Mutex<LockTable>,
}

impl FileLockManager {
    pub fn new() -> Self {
        Self {
            table: Mutex::new(LockTable {
                locks: HashMap::new(),
                next_waiter_id: 0,
            }),
        }
    }

    /// 获取指定键的排他锁
    ///
    /// 键未被持有时立即授予；否则进入 FIFO 等待队列，直到前面的
    /// 持有者释放或超时。返回的守卫在析构时自动释放，保证每次
    /// 成功获取都恰好对应一次释放。
    pub async fn acquire(
        &self,
        key: &str,
        timeout: Duration,
    ) -> Result<LockGuard<'_>, LockError> {
        let (waiter_id, mut rx) = {
            let mut table = self.table.lock().unwrap();
            table.next_waiter_id += 1;
            let waiter_id = table.next_waiter_id;

            let entry = table.locks.entry(key.to_string()).or_default();
            if !entry.held {
                entry.held = true;
                return Ok(LockGuard {
                    manager: self,
                    key: key.to_string(),
                });
            }

            let (tx, rx) = oneshot::channel();
            entry.queue.push_back(Waiter { id: waiter_id, tx });
            (waiter_id, rx)
        };

        match tokio::time::timeout(timeout, &mut rx).await {
            Ok(Ok(())) => Ok(LockGuard {
                manager: self,
                key: key.to_string(),
            }),
            Ok(Err(_)) => Err(LockError::Closed),
            Err(_) => {
                // 超时：把自己从队列里摘掉
                {
                    let mut table = self.table.lock().unwrap();
                    if let Some(entry) = table.locks.get_mut(key) {
                        if let Some(pos) = entry.queue.iter().position(|w| w.id == waiter_id) {
                            entry.queue.remove(pos);
                            return Err(LockError::Timeout);
                        }
                    }
                }
                // 不在队列中说明释放方已经把锁转交给我们，以转交为准
                match rx.try_recv() {
                    Ok(()) => Ok(LockGuard {
                        manager: self,
                        key: key.to_string(),
                    }),
                    Err(_) => Err(LockError::Timeout),
                }
            }
        }
    }

    /// 释放锁并转交给队首仍然存活的等待者
    ///
    /// send 失败说明等待者已超时或其请求被取消，跳过继续找下一个。
    /// 转交时 held 保持为 true，所有权直接移交。
    fn release(&self, key: &str) {
        let mut table = self.table.lock().unwrap();

        let empty = {
            let Some(entry) = table.locks.get_mut(key) else {
                return;
            };

            loop {
                match entry.queue.pop_front() {
                    Some(waiter) => {
                        if waiter.tx.send(()).is_ok() {
                            return;
                        }
                    }
                    None => break,
                }
            }

            entry.held = false;
            entry.queue.is_empty()
        };

        if empty {
            table.locks.remove(key);
        }
    }

    /// 指定键当前是否被持有
    pub fn is_held(&self, key: &str) -> bool {
        let table = self.table.lock().unwrap();
        table.locks.get(key).map(|e| e.held).unwrap_or(false)
    }

    /// 指定键的等待队列长度
    pub fn queue_len(&self, key: &str) -> usize {
        let table = self.table.lock().unwrap();
        table.locks.get(key).map(|e| e.queue.len()).unwrap_or(0)
    }
}

impl Default for FileLockManager {
    fn default() -> Self {
        Self::new()
    }
}

/// 锁守卫，析构时释放对应的键
pub struct LockGuard<'a> {
    manager: &'a FileLockManager,
    key: String,
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        self.manager.release(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_acquire_and_release() {
        let manager = FileLockManager::new();

        let guard = manager
            .acquire("data.json", Duration::from_millis(100))
            .await
            .unwrap();
        assert!(manager.is_held("data.json"));

        drop(guard);
        assert!(!manager.is_held("data.json"));
    }

    #[tokio::test]
    async fn test_acquire_timeout() {
        let manager = FileLockManager::new();

        let _guard = manager
            .acquire("data.json", Duration::from_millis(100))
            .await
            .unwrap();

        let result = manager
            .acquire("data.json", Duration::from_millis(50))
            .await;
        assert!(matches!(result, Err(LockError::Timeout)));

        // 超时的等待者已从队列移除
        assert_eq!(manager.queue_len("data.json"), 0);
    }

    #[tokio::test]
    async fn test_independent_keys() {
        let manager = FileLockManager::new();

        let _a = manager
            .acquire("a.json", Duration::from_millis(100))
            .await
            .unwrap();
        // 不同的键互不阻塞
        let _b = manager
            .acquire("b.json", Duration::from_millis(100))
            .await
            .unwrap();
    }
}

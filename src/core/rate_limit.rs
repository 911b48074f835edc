//! 滑动窗口限流器
//!
//! 按调用方标识统计窗口内的请求次数，超出容量的请求在进入存储层
//! 和分析调度之前就被拒绝。状态只存在本进程内存里。

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};

pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    requests: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl RateLimiter {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            requests: Mutex::new(HashMap::new()),
        }
    }

    /// 记录一次请求；窗口内已达容量时返回 false 且不计入
    pub fn is_allowed(&self, client_id: &str) -> bool {
        let now = Instant::now();
        let mut requests = self.requests.lock().unwrap();

        let timestamps = requests.entry(client_id.to_string()).or_default();

        // 清理滑出窗口的记录
        while timestamps
            .front()
            .is_some_and(|t| now.duration_since(*t) >= self.window)
        {
            timestamps.pop_front();
        }

        if timestamps.len() >= self.max_requests {
            return false;
        }

        timestamps.push_back(now);
        true
    }

    /// 当前有统计记录的客户端数量
    pub fn active_clients(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_capacity_limit() {
        let limiter = RateLimiter::new(3, Duration::from_secs(60));

        assert!(limiter.is_allowed("client-a"));
        assert!(limiter.is_allowed("client-a"));
        assert!(limiter.is_allowed("client-a"));
        assert!(!limiter.is_allowed("client-a"));

        // 其他客户端不受影响
        assert!(limiter.is_allowed("client-b"));
    }

    #[test]
    fn test_window_expiry() {
        let limiter = RateLimiter::new(1, Duration::from_millis(50));

        assert!(limiter.is_allowed("client"));
        assert!(!limiter.is_allowed("client"));

        thread::sleep(Duration::from_millis(60));
        assert!(limiter.is_allowed("client"));
    }
}

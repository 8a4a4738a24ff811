use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::debug;

/// 滑动窗口长度
pub const RATE_LIMIT_WINDOW: Duration = Duration::from_secs(60);

/// 按 client_id 划分的滑动窗口限流器
///
/// 每个 client 保存窗口内已放行请求的时间戳，每次检查时惰性淘汰过期条目。
/// 检查与记录在同一个临界区内完成，锁不会跨越 await。
/// 不同 client 的桶不会被回收，内存随 client 数量增长。
#[derive(Debug)]
pub struct RateLimiter {
    limit: usize,
    window: Duration,
    buckets: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl RateLimiter {
    /// `limit_per_minute <= 0` 关闭限流
    pub fn new(limit_per_minute: i64) -> Self {
        Self::with_window(limit_per_minute, RATE_LIMIT_WINDOW)
    }

    pub fn with_window(limit: i64, window: Duration) -> Self {
        Self {
            limit: usize::try_from(limit).unwrap_or(0),
            window,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.limit > 0
    }

    /// 请求是否可以继续
    pub fn admit(&self, client_id: &str) -> bool {
        self.admit_at(client_id, Instant::now())
    }

    pub fn admit_at(&self, client_id: &str, now: Instant) -> bool {
        if !self.is_enabled() {
            return true;
        }

        let mut buckets = self
            .buckets
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let bucket = buckets.entry(client_id.to_string()).or_default();

        while let Some(oldest) = bucket.front() {
            if now.saturating_duration_since(*oldest) >= self.window {
                bucket.pop_front();
            } else {
                break;
            }
        }

        if bucket.len() >= self.limit {
            debug!(client_id, limit = self.limit, "rate limit window full");
            return false;
        }

        bucket.push_back(now);
        true
    }

    /// 当前持有窗口状态的 client 数量
    pub fn tracked_clients(&self) -> usize {
        self.buckets
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

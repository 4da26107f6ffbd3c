//! チャット送信のトークンバケット
//!
//! (room, user) ごとにバケットを持ち、`burst` 件までの連投と
//! 毎秒 `per_second` 件の補充を許可します。

use std::{collections::HashMap, sync::Arc, time::Duration};

use async_trait::async_trait;
use tokio::sync::Mutex;
use watchparty_shared::time::Clock;

use crate::domain::{ChatThrottle, RoomCode, UserId};

struct TokenBucket {
    tokens: f64,
    last_refill_millis: i64,
}

/// (room, user) 単位の ChatThrottle 実装
pub struct ChatRateLimiter {
    buckets: Mutex<HashMap<(RoomCode, UserId), TokenBucket>>,
    max_tokens: f64,
    /// tokens per second
    refill_rate: f64,
    clock: Arc<dyn Clock>,
}

impl ChatRateLimiter {
    pub fn new(burst: u32, per_second: f64, clock: Arc<dyn Clock>) -> Self {
        Self {
            buckets: Mutex::new(HashMap::new()),
            max_tokens: f64::from(burst),
            refill_rate: per_second,
            clock,
        }
    }

    /// `max_age` 以上使われていないバケットを削除し、削除した数を返す
    pub async fn cleanup(&self, max_age: Duration) -> usize {
        let now = self.clock.now_millis();
        let max_age_millis = i64::try_from(max_age.as_millis()).unwrap_or(i64::MAX);
        let mut buckets = self.buckets.lock().await;
        let before = buckets.len();
        buckets.retain(|_, bucket| now - bucket.last_refill_millis < max_age_millis);
        before - buckets.len()
    }

    pub async fn count_buckets(&self) -> usize {
        self.buckets.lock().await.len()
    }
}

#[async_trait]
impl ChatThrottle for ChatRateLimiter {
    async fn try_acquire(&self, room_code: &RoomCode, user_id: &UserId) -> bool {
        let now = self.clock.now_millis();
        let mut buckets = self.buckets.lock().await;
        let bucket = buckets
            .entry((room_code.clone(), user_id.clone()))
            .or_insert_with(|| TokenBucket {
                tokens: self.max_tokens,
                last_refill_millis: now,
            });

        // Refill
        let elapsed_secs = (now - bucket.last_refill_millis).max(0) as f64 / 1000.0;
        bucket.tokens = (bucket.tokens + elapsed_secs * self.refill_rate).min(self.max_tokens);
        bucket.last_refill_millis = now;

        // Consume
        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

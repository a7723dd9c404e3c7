use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::debug;
use parking_lot::Mutex;

use super::session::*;
use crate::descriptor::Weights;

/// 反馈会话存储
///
/// 每个方法都是一次完整的临界区操作，不会出现读改写交错。
pub trait SessionStore: Send + Sync {
    /// 开始一轮搜索
    ///
    /// 会话不存在、已过期或指纹不同时，创建新的空会话；否则原样返回当前权重。
    fn begin_round(&self, session: &str, fingerprint: &str) -> RoundStart;

    /// 合并一次反馈，返回合并后的快照
    ///
    /// 会话不存在时以空指纹新建。
    fn merge_feedback(&self, session: &str, relevant: &[i64], irrelevant: &[i64])
    -> FeedbackSnapshot;

    /// 写回根据 `snapshot` 计算出的权重
    ///
    /// 只有会话仍然存活、指纹与代数都未变化时才会写入，返回是否写入成功。
    fn commit_weights(&self, session: &str, snapshot: &FeedbackSnapshot, weights: Weights) -> bool;

    /// 读取会话当前状态
    fn get(&self, session: &str) -> Option<FeedbackSession>;
}

struct Inner {
    sessions: HashMap<String, FeedbackSession>,
    generation: u64,
}

impl Inner {
    fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    /// 清理所有已过期的会话
    fn evict_expired(&mut self, now: Instant) {
        self.sessions.retain(|_, s| !s.is_expired(now));
    }

    fn live_mut(&mut self, session: &str, now: Instant) -> Option<&mut FeedbackSession> {
        self.sessions.get_mut(session).filter(|s| !s.is_expired(now))
    }
}

/// 基于内存的会话存储，过期检查在访问时进行
pub struct MemorySessionStore {
    inner: Mutex<Inner>,
    ttl: Duration,
}

impl MemorySessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self { inner: Mutex::new(Inner { sessions: HashMap::new(), generation: 0 }), ttl }
    }

    pub fn shared(ttl: Duration) -> Arc<dyn SessionStore> {
        Arc::new(Self::new(ttl))
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_TTL)
    }
}

impl SessionStore for MemorySessionStore {
    fn begin_round(&self, session: &str, fingerprint: &str) -> RoundStart {
        let now = Instant::now();
        let mut inner = self.inner.lock();

        if let Some(s) = inner.live_mut(session, now) {
            if s.fingerprint == fingerprint {
                return RoundStart { weights: s.weights.clone(), reset: false };
            }
        }

        inner.evict_expired(now);
        let fresh = FeedbackSession::new(fingerprint, self.ttl);
        let weights = fresh.weights.clone();
        inner.sessions.insert(session.to_owned(), fresh);
        debug!("会话 {session} 已重置，当前会话数 {}", inner.sessions.len());
        RoundStart { weights, reset: true }
    }

    fn merge_feedback(
        &self,
        session: &str,
        relevant: &[i64],
        irrelevant: &[i64],
    ) -> FeedbackSnapshot {
        let now = Instant::now();
        let mut inner = self.inner.lock();
        let generation = inner.next_generation();

        if inner.live_mut(session, now).is_none() {
            inner.evict_expired(now);
        }
        let ttl = self.ttl;
        let s = inner
            .sessions
            .entry(session.to_owned())
            .or_insert_with(|| FeedbackSession::new("", ttl));
        s.merge(relevant, irrelevant, generation);
        s.touch(ttl);
        s.snapshot()
    }

    fn commit_weights(&self, session: &str, snapshot: &FeedbackSnapshot, weights: Weights) -> bool {
        let now = Instant::now();
        let mut inner = self.inner.lock();
        match inner.live_mut(session, now) {
            Some(s) if s.generation == snapshot.generation && s.fingerprint == snapshot.fingerprint => {
                s.weights = Arc::new(weights);
                s.touch(self.ttl);
                true
            }
            _ => false,
        }
    }

    fn get(&self, session: &str) -> Option<FeedbackSession> {
        let now = Instant::now();
        let inner = self.inner.lock();
        inner.sessions.get(session).filter(|s| !s.is_expired(now)).cloned()
    }
}

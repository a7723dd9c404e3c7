use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::descriptor::Weights;

/// 会话默认有效期：最后一次写入后 300 秒
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(300);

/// 一个相关反馈会话
#[derive(Debug, Clone)]
pub struct FeedbackSession {
    /// 当前查询图片的内容哈希，为空表示尚未关联查询
    pub fingerprint: String,
    /// 当前生效的权重，初始为空（不加权）
    pub weights: Arc<Weights>,
    /// 累积的相关图片 ID
    pub relevant: BTreeSet<i64>,
    /// 累积的不相关图片 ID
    pub irrelevant: BTreeSet<i64>,
    /// 每次合并反馈都会分配新的代数，用于判断权重是否已过期
    pub generation: u64,
    /// 过期时间
    pub expires_at: Instant,
}

impl FeedbackSession {
    pub fn new(fingerprint: impl Into<String>, ttl: Duration) -> Self {
        Self {
            fingerprint: fingerprint.into(),
            weights: Arc::default(),
            relevant: BTreeSet::new(),
            irrelevant: BTreeSet::new(),
            generation: 0,
            expires_at: Instant::now() + ttl,
        }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now > self.expires_at
    }

    /// 重新计算过期时间
    pub fn touch(&mut self, ttl: Duration) {
        self.expires_at = Instant::now() + ttl;
    }

    /// 以集合并集的方式合并新的反馈
    pub fn merge(&mut self, relevant: &[i64], irrelevant: &[i64], generation: u64) {
        self.relevant.extend(relevant);
        self.irrelevant.extend(irrelevant);
        self.generation = generation;
    }

    pub fn snapshot(&self) -> FeedbackSnapshot {
        FeedbackSnapshot {
            fingerprint: self.fingerprint.clone(),
            generation: self.generation,
            relevant: self.relevant.iter().copied().collect(),
            irrelevant: self.irrelevant.iter().copied().collect(),
        }
    }
}

/// 一轮搜索开始时的会话状态
#[derive(Debug, Clone)]
pub struct RoundStart {
    /// 本轮使用的权重
    pub weights: Arc<Weights>,
    /// 是否因为新的查询图片（或会话过期）而重置
    pub reset: bool,
}

/// 合并反馈之后的会话快照，权重更新基于它计算
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackSnapshot {
    pub fingerprint: String,
    pub generation: u64,
    pub relevant: Vec<i64>,
    pub irrelevant: Vec<i64>,
}

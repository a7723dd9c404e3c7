use std::sync::Arc;
use std::time::Instant;

use log::{debug, info, warn};
use serde::Serialize;
use tokio::task::block_in_place;
use utoipa::ToSchema;

use crate::catalog::DescriptorStore;
use crate::descriptor::{DescriptorKind, DescriptorSet};
use crate::error::Result;
use crate::feedback::{FeedbackSession, SessionStore, update_weights};
use crate::metrics;
use crate::ranking::rank;

/// 一条搜索结果
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SearchHit {
    /// 图片 ID
    pub id: i64,
    /// 相似度，只在同一次查询内可比
    pub score: f32,
    /// 图片分类
    pub category: String,
    /// 图片路径
    pub path: String,
}

/// 一次反馈的处理结果
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct FeedbackAck {
    /// 累积的相关图片数量
    pub relevant: usize,
    /// 累积的不相关图片数量
    pub irrelevant: usize,
    /// 新权重覆盖的描述符类型
    pub weighted: Vec<DescriptorKind>,
    /// 权重是否已写回会话，为 false 表示已被更新的反馈取代
    pub committed: bool,
}

/// 检索核心：打分、排序与相关反馈
pub struct Retriever<S> {
    store: S,
    sessions: Arc<dyn SessionStore>,
}

impl<S: DescriptorStore> Retriever<S> {
    pub fn new(store: S, sessions: Arc<dyn SessionStore>) -> Self {
        Self { store, sessions }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// 读取会话当前状态
    pub fn session(&self, session: &str) -> Option<FeedbackSession> {
        self.sessions.get(session)
    }

    /// 使用会话当前的权重对整个图库打分，返回前 `top_k` 个结果
    ///
    /// `fingerprint` 与会话中记录的不同时，会话先被重置。
    /// 查询描述符的长度与图库不一致时直接返回错误，会话保持不变。
    pub async fn score_query(
        &self,
        session: &str,
        query: &DescriptorSet,
        fingerprint: &str,
        top_k: usize,
    ) -> Result<Vec<SearchHit>> {
        let start = Instant::now();
        let catalog = self.store.all().await?;
        // 入库时已保证图库内长度一致，与任意一张比较即可
        if let Some(reference) = catalog.first() {
            query.check_lengths(&reference.descriptors)?;
        }

        let round = self.sessions.begin_round(session, fingerprint);
        if round.reset {
            info!("会话 {session} 检测到新的查询图片，已重置反馈状态");
        } else {
            debug!("会话 {session} 继续上一轮查询，权重: {:?}", round.weights.kinds());
        }
        metrics::inc_search_count(round.reset);

        let ranked = block_in_place(|| {
            rank(query, catalog.iter().map(|e| (e.id, &e.descriptors)), &round.weights, top_k)
        });

        let hits = ranked
            .into_iter()
            .filter_map(|(id, score)| {
                catalog.iter().find(|e| e.id == id).map(|e| SearchHit {
                    id,
                    score,
                    category: e.category.clone(),
                    path: e.path.clone(),
                })
            })
            .collect::<Vec<_>>();

        let elapsed = start.elapsed().as_secs_f32();
        metrics::observe_search(elapsed, catalog.len(), hits.first().map(|h| h.score));
        debug!("搜索耗时 {:.2}ms", elapsed * 1000.0);

        Ok(hits)
    }

    /// 合并一次相关反馈，并根据累积的全部反馈重新计算权重
    pub async fn submit_feedback(
        &self,
        session: &str,
        relevant: &[i64],
        irrelevant: &[i64],
    ) -> Result<FeedbackAck> {
        let snapshot = self.sessions.merge_feedback(session, relevant, irrelevant);
        debug!(
            "会话 {session} 累积反馈: 相关 {:?}，不相关 {:?}",
            snapshot.relevant, snapshot.irrelevant
        );

        let relevant_set = self.store.get_many(&snapshot.relevant).await?;
        let irrelevant_set = self.store.get_many(&snapshot.irrelevant).await?;
        let missing = snapshot.relevant.len() + snapshot.irrelevant.len()
            - relevant_set.len()
            - irrelevant_set.len();
        if missing > 0 {
            warn!("会话 {session} 的反馈中有 {missing} 张图片不在图库中，已忽略");
        }

        let weights = update_weights(&relevant_set, &irrelevant_set);
        let weighted = weights.kinds();
        let committed = self.sessions.commit_weights(session, &snapshot, weights);
        metrics::inc_feedback_count(committed);
        if committed {
            info!("会话 {session} 权重已更新: {weighted:?}");
        } else {
            debug!("会话 {session} 的权重计算已被更新的反馈取代");
        }

        Ok(FeedbackAck {
            relevant: snapshot.relevant.len(),
            irrelevant: snapshot.irrelevant.len(),
            weighted,
            committed,
        })
    }
}

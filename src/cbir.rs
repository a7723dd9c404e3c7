use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};
use serde::Serialize;
use utoipa::ToSchema;

use crate::catalog::{DescriptorStore, SqliteCatalog};
use crate::config::ConfDir;
use crate::db::{Database, ImageRecord, crud, init_db};
use crate::descriptor::DescriptorSet;
use crate::error::{Error, Result};
use crate::extract::{FeatureExtractor, HttpExtractor};
use crate::feedback::{DEFAULT_SESSION_TTL, FeedbackSession, MemorySessionStore, SessionStore};
use crate::retriever::{FeedbackAck, Retriever, SearchHit};
use crate::utils;

/// 图库中一张图片的基本信息
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ImageInfo {
    /// 图片 ID
    pub id: i64,
    /// 图片路径
    pub path: String,
    /// 图片分类
    pub category: String,
    /// 添加时间，unix 时间戳
    pub created_at: i64,
}

impl From<ImageRecord> for ImageInfo {
    fn from(record: ImageRecord) -> Self {
        Self {
            id: record.id,
            path: record.path,
            category: record.category,
            created_at: record.created_at,
        }
    }
}

/// 添加图片的结果
#[derive(Debug, Clone, PartialEq)]
pub enum AddOutcome {
    Added(ImageInfo),
    /// 相同哈希的图片已存在
    Exists(ImageInfo),
}

pub struct CBIRBuilder<X = HttpExtractor> {
    conf_dir: ConfDir,
    extractor: X,
    cache: bool,
    session_ttl: Duration,
    sessions: Option<Arc<dyn SessionStore>>,
}

impl<X: FeatureExtractor> CBIRBuilder<X> {
    pub fn new(conf_dir: ConfDir, extractor: X) -> Self {
        Self { conf_dir, extractor, cache: false, session_ttl: DEFAULT_SESSION_TTL, sessions: None }
    }

    /// 是否在内存中缓存解码后的图库
    pub fn cache(mut self, cache: bool) -> Self {
        self.cache = cache;
        self
    }

    /// 反馈会话的过期时间
    pub fn session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    /// 使用自定义的会话存储，设置后 `session_ttl` 不再生效
    pub fn sessions(mut self, sessions: Arc<dyn SessionStore>) -> Self {
        self.sessions = Some(sessions);
        self
    }

    pub async fn open(self) -> Result<CBIR<X>> {
        let db = init_db(self.conf_dir.database()).await?;
        let catalog = SqliteCatalog::new(db.clone(), self.cache);
        let sessions =
            self.sessions.unwrap_or_else(|| MemorySessionStore::shared(self.session_ttl));
        info!("图库共 {} 张图片", crud::count_images(&db).await?);

        Ok(CBIR { db, extractor: self.extractor, retriever: Retriever::new(catalog, sessions) })
    }
}

/// 基于内容的图片检索引擎
pub struct CBIR<X = HttpExtractor> {
    db: Database,
    extractor: X,
    retriever: Retriever<SqliteCatalog>,
}

impl<X: FeatureExtractor> CBIR<X> {
    /// 添加图片到图库
    ///
    /// # Arguments
    ///
    /// * `path` - 记录到数据库中的图片路径
    /// * `category` - 图片分类
    /// * `data` - 图片原始数据
    pub async fn add_image(&self, path: &str, category: &str, data: Vec<u8>) -> Result<AddOutcome> {
        let hash = utils::hash_bytes(&data);
        if let Some(record) = crud::get_image_by_hash(&self.db, &hash).await? {
            debug!("图片已存在: {path} -> {}", record.id);
            return Ok(AddOutcome::Exists(record.into()));
        }

        let descriptors = self.extractor.extract(data, path).await?;
        if let Some(reference) = crud::get_reference_descriptors(&self.db).await? {
            let reference = serde_json::from_str::<DescriptorSet>(&reference)?;
            descriptors.check_lengths(&reference)?;
        }

        let json = serde_json::to_string(&descriptors)?;
        let id = match crud::add_image(&self.db, &hash, path, category, &json).await {
            Ok(id) => id,
            // 并发添加同一张图片时，只有一次插入能成功
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                let record = crud::get_image_by_hash(&self.db, &hash)
                    .await?
                    .ok_or(Error::Database(sqlx::Error::RowNotFound))?;
                debug!("图片已被并发添加: {path} -> {}", record.id);
                return Ok(AddOutcome::Exists(record.into()));
            }
            Err(e) => return Err(e.into()),
        };
        self.retriever.store().invalidate();
        info!("添加图片 {id}: {path} ({category})");

        let record = crud::get_image(&self.db, id).await?.ok_or(Error::ImageNotFound(id))?;
        Ok(AddOutcome::Added(record.into()))
    }

    /// 搜索一张图片
    ///
    /// 同一会话中连续提交同一张图片时，会沿用之前反馈得到的权重。
    pub async fn search(
        &self,
        session: &str,
        file_name: &str,
        data: Vec<u8>,
        top_k: usize,
    ) -> Result<Vec<SearchHit>> {
        let fingerprint = utils::fingerprint(&data);
        let query = self.extractor.extract(data, file_name).await?;
        self.retriever.score_query(session, &query, &fingerprint, top_k).await
    }

    /// 提交一次相关反馈
    pub async fn feedback(
        &self,
        session: &str,
        relevant: &[i64],
        irrelevant: &[i64],
    ) -> Result<FeedbackAck> {
        self.retriever.submit_feedback(session, relevant, irrelevant).await
    }

    /// 获取图片信息
    pub async fn get_image(&self, id: i64) -> Result<ImageInfo> {
        let record = crud::get_image(&self.db, id).await?.ok_or(Error::ImageNotFound(id))?;
        Ok(record.into())
    }

    /// 获取图片的描述符
    pub async fn get_descriptors(&self, id: i64) -> Result<DescriptorSet> {
        self.retriever.store().get(id).await?.ok_or(Error::ImageNotFound(id))
    }

    /// 读取会话当前状态
    pub fn session(&self, session: &str) -> Option<FeedbackSession> {
        self.retriever.session(session)
    }

    pub async fn count_images(&self) -> Result<i64> {
        Ok(crud::count_images(&self.db).await?)
    }
}

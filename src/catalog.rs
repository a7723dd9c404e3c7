//! 图库：图片 ID 到描述符的只读访问

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use log::{debug, warn};
use parking_lot::RwLock;

use crate::db::{Database, DescriptorRecord, crud};
use crate::descriptor::DescriptorSet;
use crate::error::Result;

/// 图库中的一张图片
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub id: i64,
    pub category: String,
    pub path: String,
    pub descriptors: DescriptorSet,
}

impl CatalogEntry {
    fn decode(record: DescriptorRecord) -> Option<Self> {
        match serde_json::from_str(&record.descriptors) {
            Ok(descriptors) => Some(Self {
                id: record.id,
                category: record.category,
                path: record.path,
                descriptors,
            }),
            Err(e) => {
                warn!("图片 {} 的描述符无法解析，已跳过: {e}", record.id);
                None
            }
        }
    }
}

/// 描述符存储
pub trait DescriptorStore: Send + Sync {
    /// 获取单张图片的描述符
    fn get(&self, id: i64) -> impl Future<Output = Result<Option<DescriptorSet>>> + Send;

    /// 批量获取描述符，不存在的 ID 不会出现在结果中
    fn get_many(
        &self,
        ids: &[i64],
    ) -> impl Future<Output = Result<BTreeMap<i64, DescriptorSet>>> + Send;

    /// 获取全部图片，按 ID 升序
    fn all(&self) -> impl Future<Output = Result<Arc<Vec<CatalogEntry>>>> + Send;
}

/// 解码后的全部图片
///
/// 每次失效都会递增版本号，读取数据库前记录的版本号与写回时不一致，说明期间图库发生过变化，
/// 读到的结果不能写入缓存。
#[derive(Default)]
struct CatalogCache {
    version: u64,
    entries: Option<Arc<Vec<CatalogEntry>>>,
}

impl CatalogCache {
    fn invalidate(&mut self) {
        self.version += 1;
        self.entries = None;
    }

    /// 只有版本号未变化时才写入，返回是否写入
    fn store(&mut self, version: u64, entries: Arc<Vec<CatalogEntry>>) -> bool {
        if self.version != version {
            return false;
        }
        self.entries = Some(entries);
        true
    }
}

/// 基于 sqlite 的图库
#[derive(Clone)]
pub struct SqliteCatalog {
    db: Database,
    /// 为 `None` 表示不缓存
    cache: Option<Arc<RwLock<CatalogCache>>>,
}

impl SqliteCatalog {
    pub fn new(db: Database, cache: bool) -> Self {
        Self { db, cache: cache.then(Arc::default) }
    }

    /// 图库发生变化后清除缓存
    pub fn invalidate(&self) {
        if let Some(cache) = &self.cache {
            cache.write().invalidate();
        }
    }
}

impl DescriptorStore for SqliteCatalog {
    async fn get(&self, id: i64) -> Result<Option<DescriptorSet>> {
        let Some(record) = crud::get_image(&self.db, id).await? else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_str(&record.descriptors)?))
    }

    async fn get_many(&self, ids: &[i64]) -> Result<BTreeMap<i64, DescriptorSet>> {
        let records = crud::get_descriptors_by_ids(&self.db, ids).await?;
        Ok(records
            .into_iter()
            .filter_map(CatalogEntry::decode)
            .map(|entry| (entry.id, entry.descriptors))
            .collect())
    }

    async fn all(&self) -> Result<Arc<Vec<CatalogEntry>>> {
        let version = match &self.cache {
            Some(cache) => {
                let cache = cache.read();
                if let Some(entries) = &cache.entries {
                    return Ok(entries.clone());
                }
                Some(cache.version)
            }
            None => None,
        };

        let records = crud::get_all_descriptors(&self.db).await?;
        let entries = Arc::new(records.into_iter().filter_map(CatalogEntry::decode).collect::<Vec<_>>());
        debug!("从数据库读取 {} 张图片", entries.len());

        if let (Some(cache), Some(version)) = (&self.cache, version) {
            if !cache.write().store(version, entries.clone()) {
                debug!("读取期间图库发生变化，本次结果不写入缓存");
            }
        }
        Ok(entries)
    }
}

/// 完全位于内存中的图库
#[derive(Clone, Default)]
pub struct MemoryCatalog {
    entries: Arc<Vec<CatalogEntry>>,
}

impl MemoryCatalog {
    pub fn new(mut entries: Vec<CatalogEntry>) -> Self {
        entries.sort_by_key(|e| e.id);
        Self { entries: Arc::new(entries) }
    }

    fn find(&self, id: i64) -> Option<&CatalogEntry> {
        self.entries.binary_search_by_key(&id, |e| e.id).ok().map(|i| &self.entries[i])
    }
}

impl DescriptorStore for MemoryCatalog {
    async fn get(&self, id: i64) -> Result<Option<DescriptorSet>> {
        Ok(self.find(id).map(|e| e.descriptors.clone()))
    }

    async fn get_many(&self, ids: &[i64]) -> Result<BTreeMap<i64, DescriptorSet>> {
        Ok(ids
            .iter()
            .filter_map(|&id| self.find(id))
            .map(|e| (e.id, e.descriptors.clone()))
            .collect())
    }

    async fn all(&self) -> Result<Arc<Vec<CatalogEntry>>> {
        Ok(self.entries.clone())
    }
}

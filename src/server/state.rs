use std::sync::Arc;

use crate::CBIR;
use crate::config::SearchOptions;

/// 应用状态
pub struct AppState {
    /// 检索引擎
    pub cbir: CBIR,
    /// 搜索配置选项
    pub search: SearchOptions,
}

impl AppState {
    /// 创建新的应用状态
    pub fn new(cbir: CBIR, search: SearchOptions) -> Arc<Self> {
        Arc::new(AppState { cbir, search })
    }
}

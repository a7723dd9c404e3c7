use thiserror::Error;

use crate::descriptor::DescriptorKind;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("特征提取请求失败: {0}")]
    ExtractionFailed(#[from] reqwest::Error),

    #[error("特征提取服务返回错误状态: {0}")]
    ExtractorStatus(u16),

    #[error("图片不存在: {0}")]
    ImageNotFound(i64),

    #[error("描述符 {kind} 长度不一致: 期望 {expected}，实际 {actual}")]
    DescriptorLength { kind: DescriptorKind, expected: usize, actual: usize },

    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),

    #[error("数据库迁移失败: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("描述符序列化失败: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// 是否为特征提取失败
    pub fn is_extraction(&self) -> bool {
        matches!(self, Self::ExtractionFailed(_) | Self::ExtractorStatus(_))
    }
}

use sqlx::FromRow;

/// 图片记录
#[derive(Debug, Clone, FromRow)]
pub struct ImageRecord {
    /// 图片 ID
    pub id: i64,
    /// 图片 blake3 哈希
    pub hash: Vec<u8>,
    /// 图片路径
    pub path: String,
    /// 图片分类
    pub category: String,
    /// 描述符，JSON 格式
    pub descriptors: String,
    /// 添加时间，unix 时间戳
    pub created_at: i64,
}

/// 打分时读取的图片信息
#[derive(Debug, Clone, FromRow)]
pub struct DescriptorRecord {
    pub id: i64,
    pub path: String,
    pub category: String,
    pub descriptors: String,
}

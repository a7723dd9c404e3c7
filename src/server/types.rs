use axum::body::Bytes;
use axum_typed_multipart::{FieldData, TryFromMultipart};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::retriever::SearchHit;

/// 搜索请求参数
#[derive(TryFromMultipart)]
pub struct SearchRequest {
    pub file: FieldData<Bytes>,
    pub session: Option<String>,
    pub count: Option<usize>,
}

/// 搜索表单（用于API文档）
#[derive(Debug, ToSchema)]
#[allow(unused)]
pub struct SearchForm {
    /// 查询图片
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub file: String,
    /// 会话 ID，默认为 `default`，同一会话内的反馈会影响后续搜索
    pub session: Option<String>,
    /// 返回的结果数量
    pub count: Option<usize>,
}

/// 搜索响应
#[derive(Debug, Serialize, ToSchema)]
pub struct SearchResponse {
    /// 搜索耗时，单位为毫秒
    pub time: u64,
    /// 按相似度降序排列的结果
    pub result: Vec<SearchHit>,
}

/// 相关反馈请求
#[derive(Debug, Deserialize, ToSchema)]
pub struct FeedbackRequest {
    /// 会话 ID，默认为 `default`
    pub session: Option<String>,
    /// 用户标记为相关的图片 ID
    #[serde(default)]
    pub relevant_ids: Vec<i64>,
    /// 用户标记为不相关的图片 ID
    #[serde(default)]
    pub irrelevant_ids: Vec<i64>,
}

/// 相关反馈响应
#[derive(Debug, Serialize, ToSchema)]
pub struct FeedbackResponse {
    pub message: String,
    /// 会话累积的相关图片数量
    pub relevant: usize,
    /// 会话累积的不相关图片数量
    pub irrelevant: usize,
}

/// 添加图片请求参数
#[derive(TryFromMultipart)]
pub struct AddImageRequest {
    pub file: FieldData<Bytes>,
    pub category: String,
}

/// 添加图片表单（用于API文档）
#[derive(Debug, ToSchema)]
#[allow(unused)]
pub struct AddImageForm {
    /// 图片文件
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub file: String,
    /// 图片分类
    pub category: String,
}

/// 仅包含提示信息的响应
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

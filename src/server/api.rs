use std::sync::Arc;
use std::time::Instant;

use axum::Json;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum_typed_multipart::TypedMultipart;
use log::info;

use super::error::{AppError, Result};
use super::state::AppState;
use super::types::*;
use crate::cbir::{AddOutcome, ImageInfo};

const DEFAULT_SESSION: &str = "default";

/// 搜索一张图片
///
/// 同一会话内重复提交同一张图片时，会使用该会话的反馈权重重新排序。
#[utoipa::path(
    post,
    path = "/search",
    request_body(content = SearchForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, body = SearchResponse),
    )
)]
pub async fn search_handler(
    State(state): State<Arc<AppState>>,
    TypedMultipart(data): TypedMultipart<SearchRequest>,
) -> Result<Json<SearchResponse>> {
    let session = data.session.as_deref().unwrap_or(DEFAULT_SESSION);
    let count = data.count.unwrap_or(state.search.count);
    let file_name = data.file.metadata.file_name.unwrap_or_default();

    info!("会话 {session} 正在搜索上传图片: {file_name}");

    let start = Instant::now();
    let result =
        state.cbir.search(session, &file_name, data.file.contents.to_vec(), count).await?;

    Ok(Json(SearchResponse { time: start.elapsed().as_millis() as u64, result }))
}

/// 提交相关反馈
#[utoipa::path(
    post,
    path = "/feedback",
    request_body = FeedbackRequest,
    responses(
        (status = 200, body = FeedbackResponse),
    )
)]
pub async fn feedback_handler(
    State(state): State<Arc<AppState>>,
    Json(data): Json<FeedbackRequest>,
) -> Result<Json<FeedbackResponse>> {
    let session = data.session.as_deref().unwrap_or(DEFAULT_SESSION);
    let ack = state.cbir.feedback(session, &data.relevant_ids, &data.irrelevant_ids).await?;

    Ok(Json(FeedbackResponse {
        message: "Relevance feedback processed successfully".to_string(),
        relevant: ack.relevant,
        irrelevant: ack.irrelevant,
    }))
}

/// 添加图片到图库
#[utoipa::path(
    post,
    path = "/add",
    request_body(content = AddImageForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "新添加的图片，或图片已存在时的提示信息"),
    )
)]
pub async fn add_image_handler(
    State(state): State<Arc<AppState>>,
    TypedMultipart(data): TypedMultipart<AddImageRequest>,
) -> Result<Response> {
    let Some(file_name) = data.file.metadata.file_name else {
        return Err(AppError::bad_request("文件名不能为空"));
    };
    if data.category.is_empty() {
        return Err(AppError::bad_request("分类不能为空"));
    }

    let outcome =
        state.cbir.add_image(&file_name, &data.category, data.file.contents.to_vec()).await?;
    Ok(match outcome {
        AddOutcome::Added(info) => Json(info).into_response(),
        AddOutcome::Exists(_) => {
            Json(MessageResponse { message: "Image already exists".to_string() }).into_response()
        }
    })
}

/// 获取图片信息
#[utoipa::path(
    get,
    path = "/images/{id}",
    params(("id" = i64, Path, description = "图片 ID")),
    responses(
        (status = 200, body = ImageInfo),
        (status = 404, description = "图片不存在"),
    )
)]
pub async fn get_image_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<ImageInfo>> {
    Ok(Json(state.cbir.get_image(id).await?))
}

#![allow(dead_code)]

use std::path::Path;

use axum::Router;
use axum::extract::Multipart;
use axum::http::StatusCode;
use axum::routing::post;
use axum::Json;
use imcbir::DescriptorSet;
use imcbir::config::ConfDir;
use tokio::net::TcpListener;

/// 让测试用的特征提取服务返回 `broken` 时的状态码
pub const BROKEN: &[u8] = b"broken";

/// 测试用的特征提取服务：上传的“图片”本身就是描述符的 JSON
async fn features(mut multipart: Multipart) -> Result<Json<DescriptorSet>, StatusCode> {
    while let Some(field) = multipart.next_field().await.map_err(|_| StatusCode::BAD_REQUEST)? {
        if field.name() != Some("image") {
            continue;
        }
        let data = field.bytes().await.map_err(|_| StatusCode::BAD_REQUEST)?;
        if data.as_ref() == BROKEN {
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
        return serde_json::from_slice(&data)
            .map(Json)
            .map_err(|_| StatusCode::UNPROCESSABLE_ENTITY);
    }
    Err(StatusCode::BAD_REQUEST)
}

/// 在独立线程中启动特征提取服务，返回 API 地址
pub fn spawn_extractor() -> String {
    let (tx, rx) = std::sync::mpsc::channel();
    std::thread::spawn(move || {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async move {
            let app = Router::new().route("/api/features", post(features));
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            tx.send(format!("http://{}/api", listener.local_addr().unwrap())).unwrap();
            axum::serve(listener, app).await.unwrap();
        });
    });
    rx.recv().unwrap()
}

pub fn conf_dir(path: &Path) -> ConfDir {
    path.to_str().unwrap().parse().unwrap()
}

pub fn histogram(hist: &[f32]) -> Vec<u8> {
    let set = DescriptorSet { color_histogram: Some(hist.to_vec()), ..Default::default() };
    serde_json::to_vec(&set).unwrap()
}

pub fn full(colors: &[[f32; 3]], hist: &[f32], gabor: &[f32], hu: &[f32]) -> Vec<u8> {
    let set = DescriptorSet {
        dominant_colors: Some(colors.to_vec()),
        color_histogram: Some(hist.to_vec()),
        gabor_features: Some(gabor.to_vec()),
        hu_moments: Some(hu.to_vec()),
    };
    serde_json::to_vec(&set).unwrap()
}

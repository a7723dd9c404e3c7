//! 外部特征提取服务

use std::future::Future;
use std::time::Duration;

use log::{debug, error};
use reqwest::multipart::{Form, Part};

use crate::config::ExtractorOptions;
use crate::descriptor::DescriptorSet;
use crate::error::{Error, Result};

/// 从图片原始字节中提取描述符
pub trait FeatureExtractor: Send + Sync {
    fn extract(
        &self,
        image: Vec<u8>,
        file_name: &str,
    ) -> impl Future<Output = Result<DescriptorSet>> + Send;
}

/// 通过 HTTP 调用特征提取服务
///
/// 图片以 multipart 字段 `image` 上传到 `{url}/features`，返回四种描述符组成的 JSON。
#[derive(Clone)]
pub struct HttpExtractor {
    client: reqwest::Client,
    url: String,
}

impl HttpExtractor {
    pub fn new(opts: &ExtractorOptions) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(opts.extractor_timeout))
            .build()?;
        Ok(Self { client, url: opts.extractor_url.trim_end_matches('/').to_owned() })
    }
}

impl FeatureExtractor for HttpExtractor {
    async fn extract(&self, image: Vec<u8>, file_name: &str) -> Result<DescriptorSet> {
        let url = format!("{}/features", self.url);
        debug!("请求特征提取: {url} ({} 字节)", image.len());

        let part = Part::bytes(image).file_name(file_name.to_owned());
        let form = Form::new().part("image", part);
        let response = self.client.post(&url).multipart(form).send().await?;

        let status = response.status();
        if !status.is_success() {
            error!("特征提取失败: {status}");
            return Err(Error::ExtractorStatus(status.as_u16()));
        }

        Ok(response.json::<DescriptorSet>().await?)
    }
}

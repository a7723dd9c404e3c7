use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Result, anyhow};
use clap::Parser;
use futures::StreamExt;
use futures::stream;
use indicatif::ProgressBar;
use log::info;
use regex::Regex;
use tokio::sync::mpsc::{Receiver, channel};
use tokio::task::{JoinHandle, spawn_blocking};
use walkdir::WalkDir;

use crate::cbir::AddOutcome;
use crate::cli::SubCommandExtend;
use crate::config::{ExtractorOptions, Opts};
use crate::extract::HttpExtractor;
use crate::utils::pb_style;
use crate::{CBIR, CBIRBuilder};

#[derive(Parser, Debug, Clone)]
pub struct AddCommand {
    #[command(flatten)]
    pub extractor: ExtractorOptions,
    /// 图片所在目录
    pub path: PathBuf,
    /// 扫描的文件后缀名，多个后缀用逗号分隔
    #[arg(short, long, default_value = "jpg,jpeg,png,webp")]
    pub suffix: String,
    /// 图片分类，不填则使用图片所在目录的名称
    #[arg(long)]
    pub category: Option<String>,
    /// 同时请求特征提取服务的数量
    #[arg(short = 'j', long, default_value_t = num_cpus::get())]
    pub jobs: usize,
}

impl SubCommandExtend for AddCommand {
    async fn run(&self, opts: &Opts) -> anyhow::Result<()> {
        let re_suf = format!("(?i)^({})$", self.suffix.replace(',', "|"));
        let re_suf = Regex::new(&re_suf)?;

        let extractor = HttpExtractor::new(&self.extractor)?;
        let cbir = Arc::new(CBIRBuilder::new(opts.conf_dir.clone(), extractor).open().await?);

        let pb = ProgressBar::no_length().with_style(pb_style());

        let (t1, rx) = task_scan(self.path.clone(), re_suf, pb.clone());
        let t2 = task_add(rx, cbir, self.category.clone(), self.jobs.max(1), pb.clone());

        let (scanned, ()) = tokio::try_join!(t1, t2)?;
        scanned?;

        pb.finish_with_message("图片添加完成");

        Ok(())
    }
}

/// 扫描目录，将符合后缀的图片路径发送到下游
fn task_scan(
    path: PathBuf,
    re_suf: Regex,
    pb: ProgressBar,
) -> (JoinHandle<Result<()>>, Receiver<PathBuf>) {
    let (tx, rx) = channel(num_cpus::get() * 2);
    let t = spawn_blocking(move || {
        info!("开始扫描目录: {}", path.display());
        let mut count = 0;
        for entry in WalkDir::new(&path).into_iter().filter_map(|entry| entry.ok()) {
            let path = entry.into_path();
            if !path.is_file() || !has_suffix(&path, &re_suf) {
                continue;
            }
            count += 1;
            pb.inc_length(1);
            tx.blocking_send(path).map_err(|_| anyhow!("图片添加任务已退出"))?;
        }
        info!("扫描完成，共 {count} 张图片");
        Ok(())
    });
    (t, rx)
}

/// 读取图片并添加到图库，已存在的图片会被跳过
fn task_add(
    rx: Receiver<PathBuf>,
    cbir: Arc<CBIR>,
    category: Option<String>,
    jobs: usize,
    pb: ProgressBar,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let paths = stream::unfold(rx, |mut rx| async move { rx.recv().await.map(|p| (p, rx)) });
        paths
            .map(|path| {
                let cbir = cbir.clone();
                let category = category.clone().or_else(|| dir_category(&path));
                async move {
                    let result = add_one(&cbir, &path, category.as_deref()).await;
                    (path, result)
                }
            })
            .buffer_unordered(jobs)
            .for_each(|(path, result)| {
                match result {
                    Ok(AddOutcome::Added(info)) => pb.set_message(format!("{}: {}", info.id, info.path)),
                    Ok(AddOutcome::Exists(_)) => {
                        pb.set_message(format!("跳过图片: {}", path.display()))
                    }
                    Err(e) => pb.println(format!("添加图片失败: {}: {e:#}", path.display())),
                }
                pb.inc(1);
                futures::future::ready(())
            })
            .await;
    })
}

async fn add_one(cbir: &CBIR, path: &Path, category: Option<&str>) -> Result<AddOutcome> {
    let category = category.ok_or_else(|| anyhow!("无法确定图片分类"))?;
    let data = tokio::fs::read(path).await?;
    Ok(cbir.add_image(&path.to_string_lossy(), category, data).await?)
}

fn has_suffix(path: &Path, re_suf: &Regex) -> bool {
    path.extension().is_some_and(|ext| re_suf.is_match(&ext.to_string_lossy()))
}

/// 以图片所在目录的名称作为分类
fn dir_category(path: &Path) -> Option<String> {
    path.parent()?.file_name().map(|name| name.to_string_lossy().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dir_category() {
        assert_eq!(dir_category(Path::new("data/Forest/1.jpg")).as_deref(), Some("Forest"));
        assert_eq!(dir_category(Path::new("1.jpg")), None);
    }

    #[test]
    fn test_has_suffix() {
        let re = Regex::new("(?i)^(jpg|png)$").unwrap();
        assert!(has_suffix(Path::new("a/b.JPG"), &re));
        assert!(has_suffix(Path::new("a/b.png"), &re));
        assert!(!has_suffix(Path::new("a/b.jpgx"), &re));
        assert!(!has_suffix(Path::new("a/b"), &re));
    }
}

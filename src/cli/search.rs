use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, ValueEnum};

use crate::CBIRBuilder;
use crate::cli::SubCommandExtend;
use crate::config::{ExtractorOptions, Opts, SearchOptions};
use crate::extract::HttpExtractor;
use crate::retriever::SearchHit;

#[derive(Parser, Debug, Clone)]
pub struct SearchCommand {
    #[command(flatten)]
    pub extractor: ExtractorOptions,
    #[command(flatten)]
    pub search: SearchOptions,
    /// 被搜索的图片路径
    pub image: PathBuf,
    /// 输出格式
    #[arg(long, value_name = "FORMAT", value_enum, default_value_t = OutputFormat::Table)]
    pub output_format: OutputFormat,
}

impl SubCommandExtend for SearchCommand {
    async fn run(&self, opts: &Opts) -> anyhow::Result<()> {
        let data = tokio::fs::read(&self.image).await?;
        let file_name = self.image.file_name().map(|s| s.to_string_lossy().to_string());

        let extractor = HttpExtractor::new(&self.extractor)?;
        let cbir = CBIRBuilder::new(opts.conf_dir.clone(), extractor).open().await?;

        // 命令行搜索只有一轮，不存在反馈
        let result =
            cbir.search("cli", file_name.as_deref().unwrap_or_default(), data, self.search.count)
                .await?;

        print_result(&result, self)
    }
}

fn print_result(result: &[SearchHit], opts: &SearchCommand) -> Result<()> {
    match opts.output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(result)?)
        }
        OutputFormat::Table => {
            for hit in result {
                println!("{:.4}\t{}\t{}\t{}", hit.score, hit.id, hit.category, hit.path);
            }
        }
    }
    Ok(())
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum OutputFormat {
    Json,
    Table,
}

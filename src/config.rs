use std::convert::Infallible;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::LazyLock;
use std::time::Duration;

use clap::{Parser, Subcommand};
use directories::ProjectDirs;

use crate::cli::*;

static CONF_DIR: LazyLock<String> = LazyLock::new(|| {
    ProjectDirs::from("", "aloxaf", "imcbir")
        .map(|dirs| dirs.config_dir().to_string_lossy().to_string())
        .unwrap_or_else(|| ".imcbir".to_string())
});

fn default_config_dir() -> &'static str {
    CONF_DIR.as_str()
}

#[derive(Parser, Debug, Clone)]
pub struct ExtractorOptions {
    /// 特征提取服务地址，图片会被上传到 `{URL}/features`
    #[arg(long, value_name = "URL", default_value = "http://127.0.0.1:5000/api")]
    pub extractor_url: String,
    /// 特征提取请求超时时间，单位为秒
    #[arg(long, value_name = "SECONDS", default_value_t = 30)]
    pub extractor_timeout: u64,
}

#[derive(Parser, Debug, Clone)]
pub struct SearchOptions {
    /// 显示的结果数量
    #[arg(long, value_name = "COUNT", default_value_t = 10)]
    pub count: usize,
    /// 反馈会话的过期时间，单位为秒
    #[arg(long, value_name = "SECONDS", default_value_t = 300)]
    pub session_ttl: u64,
}

impl SearchOptions {
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl)
    }
}

#[derive(Parser, Debug, Clone)]
#[command(name = "imcbir", version)]
pub struct Opts {
    #[command(subcommand)]
    pub subcmd: SubCommand,
    /// imcbir 配置文件目录
    #[arg(short, long, default_value = default_config_dir())]
    pub conf_dir: ConfDir,
}

#[derive(Subcommand, Debug, Clone)]
pub enum SubCommand {
    /// 提取目录中图片的描述符并添加到图库
    Add(AddCommand),
    /// 从图库中搜索相似图片
    Search(SearchCommand),
    /// 启动 HTTP 检索与反馈服务
    Server(ServerCommand),
}

#[derive(Debug, Clone)]
pub struct ConfDir {
    path: PathBuf,
}

impl ConfDir {
    /// 返回数据库文件的路径
    pub fn database(&self) -> PathBuf {
        self.path.join("imcbir.db")
    }
}

impl FromStr for ConfDir {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self { path: PathBuf::from(s) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_opts() {
        let opts = Opts::try_parse_from(["imcbir", "-c", "/tmp/cbir", "search", "a.jpg"]).unwrap();
        assert_eq!(opts.conf_dir.database(), PathBuf::from("/tmp/cbir/imcbir.db"));
        let SubCommand::Search(search) = opts.subcmd else {
            panic!("expected search subcommand");
        };
        assert_eq!(search.search.count, 10);
        assert_eq!(search.extractor.extractor_url, "http://127.0.0.1:5000/api");
    }

    #[test]
    fn test_server_defaults() {
        let opts = Opts::try_parse_from(["imcbir", "server"]).unwrap();
        let SubCommand::Server(server) = opts.subcmd else {
            panic!("expected server subcommand");
        };
        assert_eq!(server.search.session_ttl(), Duration::from_secs(300));
        assert_eq!(server.extractor.extractor_timeout, 30);
    }
}

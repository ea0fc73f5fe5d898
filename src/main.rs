//! rsuaparser 命令行：按行解析 User-Agent，输出 JSON
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use rsuaparser::{Classifier, ConfigManager, IdentityRecord};

#[derive(Debug, Parser)]
#[command(name = "rsuaparser", version, about = "Parse user-agent strings with a uap-core rule database")]
struct Cli {
    /// 规则库文件（regexes.yaml 或 JSON）
    #[arg(short, long, value_name = "FILE")]
    rules: PathBuf,

    /// 编译产物缓存文件
    #[arg(short, long, value_name = "FILE")]
    cache: Option<PathBuf>,

    /// 关闭位置默认：无模板的字段保持缺失
    #[arg(long)]
    strict: bool,

    /// 只输出某个检测域
    #[arg(short, long, value_enum, default_value_t = DomainArg::All)]
    domain: DomainArg,

    /// 格式化输出 JSON
    #[arg(long)]
    pretty: bool,

    /// 输出调试日志
    #[arg(short, long)]
    verbose: bool,

    /// 待解析的 User-Agent，缺省时从标准输入逐行读取
    user_agents: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum DomainArg {
    All,
    Ua,
    Os,
    Device,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "rsuaparser=debug" } else { "rsuaparser=warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut builder = ConfigManager::custom()
        .rules_path(&cli.rules)
        .positional_defaults(!cli.strict)
        .verbose(cli.verbose);
    if let Some(cache) = &cli.cache {
        builder = builder.cache_path(cache);
    }
    let config = builder.build();

    let classifier = Classifier::from_config(&config)
        .await
        .with_context(|| format!("failed to load rules from {}", cli.rules.display()))?;

    if !cli.user_agents.is_empty() {
        for user_agent in &cli.user_agents {
            print_record(&render(classifier.classify(user_agent), cli.domain)?, cli.pretty)?;
        }
        return Ok(());
    }

    let mut reader = BufReader::new(tokio::io::stdin());
    let mut line = Vec::new();
    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line).await? == 0 {
            break;
        }
        let raw = trim_line_end(&line);
        if raw.is_empty() {
            continue;
        }

        match classifier.try_classify_bytes(raw) {
            Ok(record) => print_record(&render(record, cli.domain)?, cli.pretty)?,
            Err(e) => warn!("skipping line: {}", e),
        }
    }

    Ok(())
}

fn render(record: IdentityRecord, domain: DomainArg) -> serde_json::Result<Value> {
    match domain {
        DomainArg::All => serde_json::to_value(record),
        DomainArg::Ua => serde_json::to_value(record.user_agent),
        DomainArg::Os => serde_json::to_value(record.os),
        DomainArg::Device => serde_json::to_value(record.device),
    }
}

fn print_record(value: &Value, pretty: bool) -> serde_json::Result<()> {
    let output = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", output);
    Ok(())
}

fn trim_line_end(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

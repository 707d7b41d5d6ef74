//! 日志初始化：控制台与文件输出同一份可读格式（时间、级别、target、消息、字段）。

use std::fs::{self, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Arc;

use tracing_subscriber::{
    fmt::format::{FmtSpan, Writer},
    fmt::time::FormatTime,
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Registry,
};

// 本地时间 YYYY-MM-DD HH:MM:SS
struct ChronoLocal;

impl FormatTime for ChronoLocal {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        let t = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        write!(w, "{} ", t)
    }
}

/// 初始化全局 tracing 订阅者，每个进程只调用一次。
/// 通过 Tee 将同一份输出同时写入 stdout 与日志文件（无 ANSI 颜色），日志目录不存在时自动创建。
/// 从环境变量 RUST_LOG 读取日志级别，未设置则默认为 info；需先加载 .env。
pub fn init_tracing(log_file_path: &str) -> anyhow::Result<()> {
    if let Some(parent) = Path::new(log_file_path).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file_path)?;
    let file = Arc::new(file);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    use tracing_subscriber::fmt::writer::MakeWriterExt;
    let writer = io::stdout.and(file);

    let event_format = tracing_subscriber::fmt::format()
        .with_timer(ChronoLocal)
        .with_level(true)
        .with_target(true)
        .with_thread_ids(false);

    // 控制台与文件共用一个 fmt layer，格式一致
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .event_format(event_format)
        .with_span_events(FmtSpan::NONE)
        .with_ansi(false);

    Registry::default()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to set global subscriber: {}", e))?;

    Ok(())
}

/// Masks a secret for debug output, keeping the first four characters.
pub fn mask_secret(value: &str) -> String {
    if value.chars().count() <= 4 {
        return "****".to_string();
    }
    let head: String = value.chars().take(4).collect();
    format!("{}****", head)
}

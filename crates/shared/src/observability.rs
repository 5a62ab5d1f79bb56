//! 日志初始化
//!
//! 所有嵌入规则引擎的程序通过单一入口点配置 tracing 日志输出。

use crate::config::ObservabilityConfig;
use anyhow::Result;
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer, fmt, fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt,
};

/// 初始化 tracing 日志
///
/// 过滤级别优先取 `RUST_LOG`，其次取配置的 `log_level`。
/// 全局 subscriber 已存在时返回错误。
pub fn init(config: &ObservabilityConfig) -> Result<()> {
    let env_filter = build_filter(&config.log_level);

    let fmt_layer = if config.json_logs {
        fmt::layer()
            .json()
            .with_span_events(FmtSpan::CLOSE)
            .with_target(true)
            .with_thread_ids(true)
            .boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_ansi(true)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    info!(
        log_level = %config.log_level,
        json_logs = config.json_logs,
        "日志初始化完成"
    );

    Ok(())
}

fn build_filter(log_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

//! 配置管理模块
//!
//! 支持分层配置文件加载，环境变量覆盖，以及类型安全的配置访问。

use config::{Config, ConfigError, Environment, File, Map};
use serde::Deserialize;
use std::path::Path;

/// 环境变量前缀
const ENV_PREFIX: &str = "RULE";
/// 选择配置环境的变量，不参与配置项覆盖
const ENV_SELECTOR: &str = "RULE_ENV";

/// 规则引擎配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// 执行时记录评估追踪
    pub trace_enabled: bool,
    /// 规则树最大深度
    pub max_depth: usize,
    /// 保存前校验树结构
    pub validate_on_save: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            trace_enabled: false,
            max_depth: 64,
            validate_on_save: true,
        }
    }
}

/// 可观测性配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// 日志级别（如 "info", "debug"），RUST_LOG 优先
    pub log_level: String,
    /// 是否启用 JSON 格式日志
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

/// 应用配置
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub service_name: String,
    pub environment: String,
    pub engine: EngineConfig,
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    /// 从配置文件和环境变量加载配置
    ///
    /// 环境名取自 `RULE_ENV`（默认 development），配置目录取自 `CONFIG_DIR`（默认 config）。
    pub fn load(service_name: &str) -> Result<Self, ConfigError> {
        let env = std::env::var(ENV_SELECTOR).unwrap_or_else(|_| "development".to_string());
        let config_dir = std::env::var("CONFIG_DIR").unwrap_or_else(|_| "config".to_string());

        Self::load_from(Path::new(&config_dir), &env, service_name)
    }

    /// 从指定目录加载配置
    ///
    /// 加载顺序（后加载的会覆盖先加载的同名配置项）：
    /// 1. {config_dir}/default.toml（默认配置）
    /// 2. {config_dir}/{environment}.toml（环境特定配置）
    /// 3. {config_dir}/{service_name}.toml（服务特定配置）
    /// 4. 环境变量（RULE_ 前缀，双下划线分隔层级，如 RULE_ENGINE__MAX_DEPTH -> engine.max_depth）
    ///
    /// 所有配置文件都是可选的。`RULE_ENV` 只用于选择环境，不会映射为配置项。
    pub fn load_from(
        config_dir: &Path,
        environment: &str,
        service_name: &str,
    ) -> Result<Self, ConfigError> {
        Self::load_with_env(config_dir, environment, service_name, override_vars(std::env::vars()))
    }

    fn load_with_env(
        config_dir: &Path,
        environment: &str,
        service_name: &str,
        env_vars: Map<String, String>,
    ) -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .set_default("service_name", service_name)?
            .set_default("environment", environment)?
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            .add_source(
                File::from(config_dir.join(format!("{}.toml", environment))).required(false),
            )
            .add_source(
                File::from(config_dir.join(format!("{}.toml", service_name))).required(false),
            )
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .source(Some(env_vars)),
            );

        builder.build()?.try_deserialize()
    }

    /// 是否为生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

/// 筛选参与配置覆盖的环境变量
fn override_vars(vars: impl Iterator<Item = (String, String)>) -> Map<String, String> {
    let prefix = format!("{}_", ENV_PREFIX);
    vars.filter(|(key, _)| key.starts_with(&prefix) && key != ENV_SELECTOR)
        .collect()
}

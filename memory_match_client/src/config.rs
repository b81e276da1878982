use std::path::PathBuf;

pub const DEFAULT_DATA_DIR: &str = ".memory_match";
pub const DEFAULT_LOG_FILTER: &str = "warn";

type ConfigError = Box<dyn std::error::Error + Send + Sync>;
type ConfigResult<T> = Result<T, ConfigError>;

/// 客户端配置，来自环境变量 (或 `.env` 文件)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// 排行榜文件所在目录
    pub data_dir: PathBuf,
    /// 未设置 `RUST_LOG` 时使用的日志过滤
    pub log_filter: String,
}

impl ClientConfig {
    pub fn from_env() -> ConfigResult<Self> {
        let defaults = ClientConfig::default();
        Ok(ClientConfig {
            data_dir: optional_var("MEMORY_MATCH_DATA_DIR")?
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            log_filter: optional_var("MEMORY_MATCH_LOG")?.unwrap_or(defaults.log_filter),
        })
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

/// 变量不存在或为空时返回 None，其他错误 (比如不是合法 UTF-8) 向上抛
fn optional_var(key: &str) -> ConfigResult<Option<String>> {
    match dotenvy::var(key) {
        Ok(value) if value.trim().is_empty() => Ok(None),
        Ok(value) => Ok(Some(value.trim().to_string())),
        Err(dotenvy::Error::EnvVar(std::env::VarError::NotPresent)) => Ok(None),
        Err(e) => Err(Box::new(e) as ConfigError),
    }
}

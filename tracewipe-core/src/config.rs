use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// 引擎配置，从 `config.toml` 加载
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// 展开 `~` 所用的主目录，默认为当前用户的主目录
    pub home_dir: Option<PathBuf>,
    /// 删除前遍历目标，统计释放的文件数和字节数
    pub measure: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            home_dir: None,
            measure: true,
        }
    }
}

impl EngineConfig {
    /// 获取配置文件路径
    pub fn config_file_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("tracewipe").join("config.toml"))
    }

    /// 从默认位置加载，文件不存在时使用默认配置
    pub fn load_default() -> Result<Self> {
        match Self::config_file_path() {
            Some(path) if path.exists() => Self::load_from_file(&path),
            _ => {
                debug!("未找到配置文件，使用默认配置");
                Ok(Self::default())
            }
        }
    }

    /// 从指定文件加载。与 [`load_default`](Self::load_default) 不同，文件不存在时返回错误
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        info!("已加载配置文件: {:?}", path);
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// 本次运行中 `~` 展开的主目录
    pub fn resolve_home(&self) -> Option<PathBuf> {
        self.home_dir.clone().or_else(dirs::home_dir)
    }
}

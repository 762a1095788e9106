use serde::Serialize;
use std::path::{Path, PathBuf};

/// 展开为当前用户主目录的占位符
pub const HOME_PLACEHOLDER: &str = "~";

/// 目标类别（按执行顺序）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    BrowserCache,
    AnonymityNetwork,
    TempFiles,
}

impl Category {
    pub const ALL: [Category; 3] = [
        Category::BrowserCache,
        Category::AnonymityNetwork,
        Category::TempFiles,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Category::BrowserCache => "Browser caches",
            Category::AnonymityNetwork => "Anonymity network state",
            Category::TempFiles => "Temporary files",
        }
    }
}

/// 需要清除的单个文件系统位置
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErasureTarget {
    pub id: &'static str,
    pub label: &'static str,
    /// 绝对路径，或以 `~` 开头表示主目录
    pub path_template: &'static str,
    pub category: Category,
    /// 清除该目标后报告的进度值
    pub milestone: u8,
}

impl ErasureTarget {
    pub const fn new(
        id: &'static str,
        label: &'static str,
        path_template: &'static str,
        category: Category,
        milestone: u8,
    ) -> Self {
        Self {
            id,
            label,
            path_template,
            category,
            milestone,
        }
    }

    /// 路径模板是否依赖主目录
    pub fn is_home_relative(&self) -> bool {
        self.path_template == HOME_PLACEHOLDER
            || self
                .path_template
                .strip_prefix(HOME_PLACEHOLDER)
                .is_some_and(|rest| rest.starts_with('/'))
    }

    /// 根据 `home` 展开路径模板
    ///
    /// 模板依赖主目录但主目录未知时返回 `None`。末尾的斜杠会被去掉，
    /// 因此 `~/.cache/chromium/` 与 `~/.cache/chromium` 解析结果相同。
    pub fn resolve(&self, home: Option<&Path>) -> Option<PathBuf> {
        if !self.is_home_relative() {
            return Some(PathBuf::from(self.path_template));
        }

        let home = home?;
        let rest = self.path_template[HOME_PLACEHOLDER.len()..].trim_start_matches('/');
        if rest.is_empty() {
            Some(home.to_path_buf())
        } else {
            Some(home.join(rest.trim_end_matches('/')))
        }
    }
}

static REGISTRY: [ErasureTarget; 5] = [
    ErasureTarget::new(
        "chromium-cache",
        "Chromium browser cache",
        "~/.cache/chromium/",
        Category::BrowserCache,
        33,
    ),
    ErasureTarget::new(
        "brave-cache",
        "Brave browser cache",
        "~/.cache/brave-browser/",
        Category::BrowserCache,
        66,
    ),
    ErasureTarget::new(
        "tor-data",
        "Tor client data",
        "~/.tor",
        Category::AnonymityNetwork,
        50,
    ),
    ErasureTarget::new(
        "tor-browser-data",
        "Tor Browser data",
        "~/.local/share/torbrowser",
        Category::AnonymityNetwork,
        75,
    ),
    ErasureTarget::new(
        "system-temp",
        "System temporary directory",
        "/tmp",
        Category::TempFiles,
        100,
    ),
];

/// 固定的清除目标列表，按类别和执行顺序排列
pub fn list() -> &'static [ErasureTarget] {
    &REGISTRY
}

/// 按 id 查找目标
pub fn find(id: &str) -> Option<&'static ErasureTarget> {
    REGISTRY.iter().find(|target| target.id == id)
}

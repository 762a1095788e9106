use serde::{Deserialize, Serialize};

pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod remover;
pub mod target;

pub use config::EngineConfig;
pub use engine::{EngineHandle, ErasureEngine, RunPhase};
pub use error::EraseError;
pub use event::{EngineEvent, EventSink};
pub use remover::{Footprint, FsRemover, Remover};
pub use target::{Category, ErasureTarget};

/// 运行中清除失败的目标
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedTarget {
    pub id: String,
    pub error: String,
}

/// 清除结果统计
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErasureReport {
    pub cleared: Vec<String>,
    pub skipped: Vec<String>,
    pub failed: Vec<FailedTarget>,
    pub files_removed: u64,
    pub bytes_freed: u64,
    pub duration_ms: u64,
}

impl ErasureReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_cleared(&mut self, id: &str, footprint: Footprint) {
        self.cleared.push(id.to_string());
        self.files_removed = self.files_removed.saturating_add(footprint.files);
        self.bytes_freed = self.bytes_freed.saturating_add(footprint.bytes);
    }

    pub fn add_skipped(&mut self, id: &str) {
        self.skipped.push(id.to_string());
    }

    pub fn add_failure(&mut self, id: &str, error: String) {
        self.failed.push(FailedTarget {
            id: id.to_string(),
            error,
        });
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }

    pub fn format_size(&self) -> String {
        format_bytes(self.bytes_freed)
    }
}

/// 格式化字节大小为人类可读格式
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.2} {}", size, UNITS[unit_index])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(1023), "1023 B");
        assert_eq!(format_bytes(1024), "1.00 KB");
        assert_eq!(format_bytes(1536), "1.50 KB");
        assert_eq!(format_bytes(1048576), "1.00 MB");
        assert_eq!(format_bytes(1073741824), "1.00 GB");
    }

    #[test]
    fn test_erasure_report() {
        let mut report = ErasureReport::new();
        assert!(report.cleared.is_empty());
        assert!(!report.has_failures());

        report.add_cleared("tor-data", Footprint { files: 2, bytes: 2048 });
        report.add_skipped("brave-cache");
        report.add_failure("system-temp", "failed to remove /tmp: Permission denied".to_string());

        assert_eq!(report.cleared, vec!["tor-data"]);
        assert_eq!(report.skipped, vec!["brave-cache"]);
        assert_eq!(report.files_removed, 2);
        assert_eq!(report.format_size(), "2.00 KB");
        assert!(report.has_failures());
        assert_eq!(report.failed[0].id, "system-temp");
    }

    #[test]
    fn test_erasure_report_totals_saturate() {
        let mut report = ErasureReport::new();
        report.add_cleared("a", Footprint { files: u64::MAX - 1, bytes: u64::MAX - 1 });
        report.add_cleared("b", Footprint { files: 5, bytes: 5 });

        assert_eq!(report.files_removed, u64::MAX);
        assert_eq!(report.bytes_freed, u64::MAX);
        assert_eq!(report.cleared.len(), 2);
    }
}

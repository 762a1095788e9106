use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

/// 删除前目标下的文件数和字节数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Footprint {
    pub files: u64,
    pub bytes: u64,
}

/// 引擎对目标路径执行的文件系统操作
///
/// 所有调用都是阻塞的，并在引擎线程上执行。
pub trait Remover: Send + Sync {
    /// 路径是否存在（悬空的符号链接视为不存在）
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    /// 统计 `path` 下的普通文件数量和大小，跳过无法读取的条目
    fn measure(&self, path: &Path) -> Footprint {
        WalkDir::new(path)
            .follow_links(false)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .fold(Footprint::default(), |mut footprint, entry| {
                footprint.files += 1;
                let len = entry.metadata().map(|m| m.len()).unwrap_or(0);
                footprint.bytes = footprint.bytes.saturating_add(len);
                footprint
            })
    }

    /// 删除路径及其下的所有内容
    fn remove(&self, path: &Path) -> io::Result<()>;
}

/// 使用 `std::fs` 直接递归删除
#[derive(Debug, Clone, Copy, Default)]
pub struct FsRemover;

impl Remover for FsRemover {
    fn remove(&self, path: &Path) -> io::Result<()> {
        let metadata = std::fs::symlink_metadata(path)?;
        if metadata.is_dir() {
            debug!("删除目录: {:?}", path);
            std::fs::remove_dir_all(path)
        } else {
            // 普通文件和符号链接；指向目录的符号链接只删除链接本身
            debug!("删除文件: {:?}", path);
            std::fs::remove_file(path)
        }
    }
}

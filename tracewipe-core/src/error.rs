use std::any::Any;
use std::io;
use std::path::PathBuf;

/// 单个目标清除失败的原因
#[derive(Debug, thiserror::Error)]
pub enum EraseError {
    #[error("failed to remove {}: {source}", path.display())]
    Remove {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unexpected failure while removing {}: {message}", path.display())]
    Panicked { path: PathBuf, message: String },
}

impl EraseError {
    pub fn remove(path: impl Into<PathBuf>, source: io::Error) -> Self {
        EraseError::Remove {
            path: path.into(),
            source,
        }
    }

    /// 根据捕获的 panic 负载构造错误
    pub fn panicked(path: impl Into<PathBuf>, payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(message) = payload.downcast_ref::<&str>() {
            (*message).to_string()
        } else if let Some(message) = payload.downcast_ref::<String>() {
            message.clone()
        } else {
            "unknown panic".to_string()
        };

        EraseError::Panicked {
            path: path.into(),
            message,
        }
    }

    /// 文件系统错误的类型（仅 I/O 失败时存在）
    pub fn io_kind(&self) -> Option<io::ErrorKind> {
        match self {
            EraseError::Remove { source, .. } => Some(source.kind()),
            EraseError::Panicked { .. } => None,
        }
    }
}

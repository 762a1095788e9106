use anyhow::{Context, Result};
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::ErasureReport;
use crate::config::EngineConfig;
use crate::error::EraseError;
use crate::event::{COMPLETION_MESSAGE, EngineEvent, EventSink};
use crate::remover::{Footprint, FsRemover, Remover};
use crate::target::{self, Category, ErasureTarget};

/// 单次运行的生命周期
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RunPhase {
    Idle = 0,
    Running = 1,
    Completed = 2,
}

impl RunPhase {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => RunPhase::Idle,
            1 => RunPhase::Running,
            _ => RunPhase::Completed,
        }
    }
}

/// 单个目标的处理结果
#[derive(Debug)]
enum TargetOutcome {
    Absent,
    Cleared(Footprint),
    Failed(EraseError),
}

/// 里程碑按目标固定，发出的进度保持单调不减
#[derive(Debug, Default)]
struct ProgressTracker {
    high_water: u8,
}

impl ProgressTracker {
    fn advance(&mut self, milestone: u8) -> u8 {
        self.high_water = self.high_water.max(milestone.min(100));
        self.high_water
    }
}

/// 逐个删除注册的目标，并通过 [`EventSink`] 报告进度
pub struct ErasureEngine<R = FsRemover> {
    config: EngineConfig,
    targets: Vec<ErasureTarget>,
    remover: R,
}

impl ErasureEngine<FsRemover> {
    /// 使用固定目标列表创建引擎
    pub fn new(config: EngineConfig) -> Self {
        Self::with_targets(config, target::list().to_vec())
    }

    /// 使用自定义目标列表创建引擎（按类别分组执行，类别内保持原有顺序）
    pub fn with_targets(config: EngineConfig, mut targets: Vec<ErasureTarget>) -> Self {
        targets.sort_by_key(|target| target.category);
        Self {
            config,
            targets,
            remover: FsRemover,
        }
    }
}

impl Default for ErasureEngine<FsRemover> {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl<R: Remover> ErasureEngine<R> {
    /// 替换文件系统后端
    pub fn with_remover<R2: Remover>(self, remover: R2) -> ErasureEngine<R2> {
        ErasureEngine {
            config: self.config,
            targets: self.targets,
            remover,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn targets(&self) -> &[ErasureTarget] {
        &self.targets
    }

    /// 在当前线程上依次清除所有目标
    ///
    /// 不会失败：单个目标的错误以 `Log` 事件报告并记录在返回的结果中，
    /// 最后一个事件总是 `Completed`。
    pub fn run<S: EventSink + ?Sized>(&self, sink: &S) -> ErasureReport {
        let home = self.config.resolve_home();
        self.run_with_home(sink, home.as_deref())
    }

    fn run_with_home<S: EventSink + ?Sized>(&self, sink: &S, home: Option<&Path>) -> ErasureReport {
        let start_time = Instant::now();
        let mut report = ErasureReport::new();
        let mut progress = ProgressTracker::default();

        info!("开始清除 {} 个目标", self.targets.len());

        for category in Category::ALL {
            debug!("清除类别: {}", category.label());

            for target in self.targets.iter().filter(|t| t.category == category) {
                match self.erase_target(target, home) {
                    TargetOutcome::Absent => {
                        debug!("目标 {} 不存在，跳过", target.id);
                        report.add_skipped(target.id);
                    }
                    TargetOutcome::Cleared(footprint) => {
                        info!(
                            "已清除 {} ({} 个文件, {})",
                            target.id,
                            footprint.files,
                            crate::format_bytes(footprint.bytes)
                        );
                        sink.accept(EngineEvent::log(format!("{} cleared.", target.label)));
                        sink.accept(EngineEvent::progress(progress.advance(target.milestone)));
                        report.add_cleared(target.id, footprint);
                    }
                    TargetOutcome::Failed(err) => {
                        warn!("清除目标失败 {}: {}", target.id, err);
                        sink.accept(EngineEvent::log(format!(
                            "{} could not be cleared: {}",
                            target.label, err
                        )));
                        report.add_failure(target.id, err.to_string());
                    }
                }
            }
        }

        report.duration_ms = start_time.elapsed().as_millis() as u64;

        info!(
            "清除完成: 成功 {} 个，跳过 {} 个，失败 {} 个，释放空间 {}，耗时 {}ms",
            report.cleared.len(),
            report.skipped.len(),
            report.failed.len(),
            report.format_size(),
            report.duration_ms
        );

        sink.accept(EngineEvent::log(COMPLETION_MESSAGE));
        sink.accept(EngineEvent::progress(progress.advance(100)));
        sink.accept(EngineEvent::completed(COMPLETION_MESSAGE));

        report
    }

    /// 单个目标的边界：任何错误（包括 panic）都不会传出
    fn erase_target(&self, target: &ErasureTarget, home: Option<&Path>) -> TargetOutcome {
        let Some(path) = target.resolve(home) else {
            warn!("无法确定用户主目录，跳过 {}", target.id);
            return TargetOutcome::Absent;
        };

        match panic::catch_unwind(AssertUnwindSafe(|| self.erase_path(&path))) {
            Ok(Ok(Some(footprint))) => TargetOutcome::Cleared(footprint),
            Ok(Ok(None)) => TargetOutcome::Absent,
            Ok(Err(err)) => TargetOutcome::Failed(err),
            Err(payload) => TargetOutcome::Failed(EraseError::panicked(path, payload)),
        }
    }

    fn erase_path(&self, path: &Path) -> Result<Option<Footprint>, EraseError> {
        if !self.remover.exists(path) {
            return Ok(None);
        }

        let footprint = if self.config.measure {
            self.remover.measure(path)
        } else {
            Footprint::default()
        };

        debug!("删除: {:?}", path);
        self.remover
            .remove(path)
            .map_err(|source| EraseError::remove(path, source))?;

        Ok(Some(footprint))
    }
}

impl<R: Remover + 'static> ErasureEngine<R> {
    /// 在独立的工作线程上启动清除并立即返回
    ///
    /// 事件产生后立即送达 `sink`，调用方不会被阻塞。
    pub fn spawn<S>(self, sink: S) -> Result<EngineHandle>
    where
        S: EventSink + Send + 'static,
    {
        let phase = Arc::new(AtomicU8::new(RunPhase::Idle as u8));
        let worker_phase = Arc::clone(&phase);

        let thread = thread::Builder::new()
            .name("tracewipe-engine".to_string())
            .spawn(move || {
                worker_phase.store(RunPhase::Running as u8, Ordering::SeqCst);
                let report = self.run(&sink);
                worker_phase.store(RunPhase::Completed as u8, Ordering::SeqCst);
                report
            })
            .context("启动清除线程失败")?;

        Ok(EngineHandle { phase, thread })
    }
}

/// [`ErasureEngine::spawn`] 启动的运行句柄
pub struct EngineHandle {
    phase: Arc<AtomicU8>,
    thread: JoinHandle<ErasureReport>,
}

impl EngineHandle {
    pub fn phase(&self) -> RunPhase {
        RunPhase::from_u8(self.phase.load(Ordering::SeqCst))
    }

    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// 等待运行结束并返回结果
    pub fn join(self) -> Result<ErasureReport> {
        self.thread
            .join()
            .map_err(|_| anyhow::anyhow!("清除线程异常"))
    }
}

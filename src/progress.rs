//! Observer hooks for a pack encryption run
//!
//! The encryptor reports through injected callbacks and polls a shared
//! cancellation flag; it never touches UI or global state.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Log line callback
pub type LogFn = Box<dyn Fn(&str) + Send + Sync>;

/// Progress callback
pub type ProgressFn = Box<dyn Fn(&Progress) + Send + Sync>;

/// Stage of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Initializing,
    ClassifyingArchive,
    EncryptingRootFiles,
    WritingRootIndex,
    /// Subpack number (0-based, discovery order)
    EncryptingSubpack(usize),
    WritingSubpackIndex(usize),
    FinalizingOutputs,
    Done,
}

impl Phase {
    /// Coarse label shown to users
    pub fn label(&self) -> &'static str {
        match self {
            Phase::Initializing => "initializing",
            Phase::ClassifyingArchive => "reading archive",
            Phase::EncryptingRootFiles => "processing root files",
            Phase::WritingRootIndex => "writing metadata",
            Phase::EncryptingSubpack(_) => "processing subpack",
            Phase::WritingSubpackIndex(_) => "writing subpack metadata",
            Phase::FinalizingOutputs => "writing key files",
            Phase::Done => "done",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::EncryptingSubpack(i) | Phase::WritingSubpackIndex(i) => {
                write!(f, "{} #{}", self.label(), i + 1)
            }
            _ => f.write_str(self.label()),
        }
    }
}

/// One progress event: `completed` of `total` units done
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
    pub phase: Phase,
}

impl Progress {
    pub fn label(&self) -> &'static str {
        self.phase.label()
    }
}

/// Cooperative cancellation flag shared between a run and its caller
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; the run stops at its next checkpoint
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

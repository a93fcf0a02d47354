//! Per-cycle cancellation.
//!
//! Each navigation cycle takes a token from the shared tracker; beginning
//! the next cycle cancels every token issued before it.
//!
//! Work fenced by a token runs under a shared gate that `begin` takes
//! exclusively, so once `begin` returns no fenced work from an earlier
//! cycle is still running and none can start.

use std::sync::{Arc, RwLock};

use tokio::sync::watch;

/// Issues cycle tokens. Clones share the same generation counter.
#[derive(Debug, Clone)]
pub struct CycleTracker {
    tx: Arc<watch::Sender<u64>>,
    gate: Arc<RwLock<()>>,
}

impl CycleTracker {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(0);
        Self {
            tx: Arc::new(tx),
            gate: Arc::new(RwLock::new(())),
        }
    }

    /// Start a new cycle, cancelling all earlier ones.
    ///
    /// Blocks until fenced work already in progress has finished.
    pub fn begin(&self) -> CycleToken {
        let _exclusive = self.gate.write().expect("cycle gate poisoned");
        let mut generation = 0;
        self.tx.send_modify(|current| {
            *current += 1;
            generation = *current;
        });
        CycleToken {
            generation,
            rx: self.tx.subscribe(),
            gate: self.gate.clone(),
        }
    }

    /// Generation of the most recent cycle.
    pub fn current(&self) -> u64 {
        *self.tx.borrow()
    }
}

impl Default for CycleTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle passed to page work started by one cycle.
#[derive(Debug, Clone)]
pub struct CycleToken {
    generation: u64,
    rx: watch::Receiver<u64>,
    gate: Arc<RwLock<()>>,
}

impl CycleToken {
    /// A token no tracker will ever cancel.
    pub fn detached() -> Self {
        let (_tx, rx) = watch::channel(0);
        Self {
            generation: 0,
            rx,
            gate: Arc::new(RwLock::new(())),
        }
    }

    /// Run `f` only while this cycle is current. No later cycle can
    /// begin until `f` returns.
    pub fn fenced<T>(&self, f: impl FnOnce() -> T) -> Option<T> {
        let _shared = self.gate.read().expect("cycle gate poisoned");
        if self.is_cancelled() {
            None
        } else {
            Some(f())
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// True once a later cycle has begun.
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow() != self.generation
    }

    /// Resolves when a later cycle begins. Never resolves for a token
    /// whose tracker is gone without having cancelled it.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        loop {
            if *rx.borrow_and_update() != self.generation {
                return;
            }
            if rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

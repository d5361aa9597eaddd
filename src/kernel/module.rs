// CLASSIFICATION: COMMUNITY
// Filename: module.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-19

//! Loadable module lifecycle.
//!
//! A module is a value: `init` builds it from the kernel services it needs
//! and dropping it is module exit. The caller that loaded it owns it.

use std::sync::Arc;

use log::{error, info};

use crate::kernel::errno::KResult;
use crate::kernel::fs::debugfs::DebugFs;
use crate::kernel::proc_mgr::TaskRegistry;

/// Kernel services handed to modules at init time.
#[derive(Clone, Default)]
pub struct Kernel {
    tasks: Arc<TaskRegistry>,
    debugfs: Arc<DebugFs>,
}

impl Kernel {
    /// Fresh kernel with only the idle task and an empty debugfs.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parts(tasks: Arc<TaskRegistry>, debugfs: Arc<DebugFs>) -> Self {
        Kernel { tasks, debugfs }
    }

    pub fn tasks(&self) -> &Arc<TaskRegistry> {
        &self.tasks
    }

    pub fn debugfs(&self) -> &Arc<DebugFs> {
        &self.debugfs
    }

    /// Load module `M`. The returned value unloads it when dropped.
    pub fn load<M: KernelModule>(&self, params: M::Params) -> KResult<M> {
        match M::init(self, params) {
            Ok(m) => {
                info!("{} initialized", M::NAME);
                Ok(m)
            }
            Err(e) => {
                error!("{}: init failed: {}", M::NAME, e);
                Err(e)
            }
        }
    }
}

pub trait KernelModule: Sized {
    const NAME: &'static str;
    type Params;

    fn init(kernel: &Kernel, params: Self::Params) -> KResult<Self>;
}

// CLASSIFICATION: COMMUNITY
// Filename: lib.rs v1.1
// Date Modified: 2026-10-19
// Author: Lukas Bower

//! Kernel programming samples on a small hosted kernel surface.

/// Hosted kernel services: tasks, debugfs, errno, user copies, klib
pub mod kernel;

/// Loadable sample modules
pub mod modules;

/// Library wrappers behind the `lkdc` and `rdwr_test` binaries
pub mod binlib;

pub use kernel::errno::{KResult, KernelError};
pub use kernel::module::{Kernel, KernelModule};

// CLASSIFICATION: COMMUNITY
// Filename: errno.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-19

//! Kernel error type shared by the task registry, debugfs and klib.
//!
//! Every variant maps onto a classic errno value so read handlers can hand
//! the caller the negative `ssize_t` convention.

use thiserror::Error;

pub const EPERM: i32 = 1;
pub const ENOENT: i32 = 2;
pub const ESRCH: i32 = 3;
pub const EIO: i32 = 5;
pub const ENOMEM: i32 = 12;
pub const EFAULT: i32 = 14;
pub const EEXIST: i32 = 17;
pub const ENODEV: i32 = 19;
pub const EINVAL: i32 = 22;
pub const ERANGE: i32 = 34;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KernelError {
    #[error("out of memory")]
    OutOfMemory,
    #[error("no such file or directory: {0}")]
    NotFound(String),
    #[error("no such process: {0}")]
    NoSuchProcess(u32),
    #[error("already exists: {0}")]
    AlreadyExists(String),
    #[error("no such device")]
    NoDevice,
    #[error("bad address 0x{0:x}")]
    BadAddress(u64),
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
    #[error("operation not permitted")]
    NotPermitted,
    #[error("result out of range")]
    Overflow,
    #[error("{0} lock poisoned")]
    LockPoisoned(&'static str),
}

pub type KResult<T> = Result<T, KernelError>;

impl KernelError {
    /// Positive errno value for this error.
    pub fn errno(&self) -> i32 {
        match self {
            KernelError::OutOfMemory => ENOMEM,
            KernelError::NotFound(_) => ENOENT,
            KernelError::NoSuchProcess(_) => ESRCH,
            KernelError::AlreadyExists(_) => EEXIST,
            KernelError::NoDevice => ENODEV,
            KernelError::BadAddress(_) => EFAULT,
            KernelError::InvalidArgument(_) => EINVAL,
            KernelError::NotPermitted => EPERM,
            KernelError::Overflow => ERANGE,
            KernelError::LockPoisoned(_) => EIO,
        }
    }

    /// Negative errno, as a read or write handler returns it.
    pub fn to_errno(&self) -> i32 {
        -self.errno()
    }
}

/// Collapse a handler result into the `ssize_t` convention: byte count on
/// success, negative errno on failure.
pub fn ssize(res: KResult<usize>) -> isize {
    match res {
        Ok(n) => n as isize,
        Err(e) => e.to_errno() as isize,
    }
}

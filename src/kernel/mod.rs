// CLASSIFICATION: COMMUNITY
// Filename: mod.rs v0.4
// Author: Lukas Bower
// Date Modified: 2026-10-19

pub mod fs {
    pub mod debugfs;
}

pub mod config;
pub mod errno;
pub mod klib;
pub mod module;
pub mod proc_mgr;
pub mod uaccess;

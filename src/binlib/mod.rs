// CLASSIFICATION: COMMUNITY
// Filename: mod.rs v0.2
// Author: Lukas Bower
// Date Modified: 2026-10-19

//! Library wrappers for the lkdc binaries.

pub mod lkdc_main;
pub mod rdwr_main;

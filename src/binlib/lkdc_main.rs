// CLASSIFICATION: COMMUNITY
// Filename: lkdc_main.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-19

//! `lkdc`: drive the kernel samples from the command line.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use log::info;

use crate::kernel::config::{load_config, ShowallConfig};
use crate::kernel::klib::{self, LinearMap, PageMap, PAGE_SIZE};
use crate::kernel::module::Kernel;
use crate::kernel::proc_mgr::TaskRegistry;
use crate::modules::showall_threads::ShowallThreads;

/// Start of the simulated direct map.
const DIRECT_MAP_BASE: u64 = 0xffff_8880_0000_0000;
const DIRECT_MAP_LEN: u64 = 256 * 1024 * 1024;
/// Start of the simulated vmalloc area used by `--scatter`.
const VMALLOC_BASE: u64 = 0xffff_c900_1000_0000;
/// Pages backed in the simulated vmalloc area.
const VMALLOC_PAGES: u64 = 1024;

#[derive(Parser)]
#[command(name = "lkdc", about = "Kernel programming samples", version = "0.1")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load the thread dump module on a demo kernel and print its file
    Threads {
        /// TOML file with module settings
        #[arg(long)]
        config: Option<PathBuf>,
        /// Bytes requested per read
        #[arg(long, default_value_t = 4096)]
        chunk: usize,
    },
    /// Compute BASE to the power of EXPONENT
    Powerof {
        #[arg(allow_negative_numbers = true)]
        base: i32,
        #[arg(allow_negative_numbers = true)]
        exponent: i32,
    },
    /// Walk a kernel virtual range page by page
    PhysPages {
        /// Start address (hex, 0x prefix optional)
        #[arg(long, value_parser = parse_hex)]
        kaddr: Option<u64>,
        /// Length in bytes
        #[arg(long, default_value_t = 4 * PAGE_SIZE as usize)]
        len: usize,
        /// Flag frames that are not physically contiguous
        #[arg(long)]
        check: bool,
        /// Walk a vmalloc-style range with scattered frames instead of the
        /// direct map
        #[arg(long)]
        scatter: bool,
    },
}

fn parse_hex(s: &str) -> Result<u64, String> {
    let digits = s.trim_start_matches("0x").trim_start_matches("0X");
    u64::from_str_radix(digits, 16).map_err(|e| format!("{s}: {e}"))
}

/// Populate a registry with a handful of kernel threads and processes.
pub fn demo_tasks(tasks: &TaskRegistry) -> anyhow::Result<()> {
    let init = tasks.spawn_process("systemd")?;
    tasks.spawn_kthread("kthreadd")?;
    tasks.spawn_kthread("rcu_gp")?;
    tasks.spawn_kthread("ksoftirqd/0")?;
    tasks.spawn_kthread("kworker/0:1H")?;
    tasks.spawn_process("systemd-journal")?;
    let browser = tasks.spawn_process("firefox")?;
    tasks.spawn_thread(browser, "Renderer")?;
    tasks.spawn_thread(browser, "IPC I/O Parent")?;
    tasks.spawn_thread(browser, "Timer")?;
    tasks.spawn_process("bash")?;
    info!("demo kernel: init is pid {}", init);
    Ok(())
}

fn cmd_threads(config: Option<PathBuf>, chunk: usize) -> anyhow::Result<()> {
    let cfg = match config {
        Some(path) => load_config(&path)?,
        None => ShowallConfig::default().with_env()?,
    };
    let kernel = Kernel::new();
    demo_tasks(kernel.tasks())?;

    let module = kernel.load::<ShowallThreads>(cfg)?;
    let mut file = kernel
        .debugfs()
        .open(module.path())
        .with_context(|| format!("open {}", module.path()))?;
    let data = file.read_to_end(chunk)?;
    io::stdout().write_all(&data)?;
    Ok(())
}

fn cmd_phys_pages(kaddr: Option<u64>, len: usize, check: bool, scatter: bool) -> anyhow::Result<()> {
    let rows = if scatter {
        let pages = (len as u64).div_ceil(PAGE_SIZE).clamp(1, VMALLOC_PAGES);
        let mut map = PageMap::new();
        for i in 0..pages {
            // Every other page comes from a distant frame.
            let frame = if i % 2 == 0 { 0x20_000 + i } else { 0x80_000 + i };
            map.map(VMALLOC_BASE + i * PAGE_SIZE, frame * PAGE_SIZE)?;
        }
        klib::show_phy_pages(&map, kaddr.unwrap_or(VMALLOC_BASE), len, check)?
    } else {
        let map = LinearMap::new(DIRECT_MAP_BASE, 0, DIRECT_MAP_LEN);
        klib::show_phy_pages(&map, kaddr.unwrap_or(DIRECT_MAP_BASE), len, check)?
    };
    for row in rows {
        let mark = if row.noncontiguous { "  *" } else { "" };
        println!("{:05}  0x{:016x}   0x{:x}   {}{}", row.index, row.va, row.pa, row.pfn, mark);
    }
    Ok(())
}

/// Execute a parsed command line.
pub fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Threads { config, chunk } => cmd_threads(config, chunk),
        Commands::Powerof { base, exponent } => {
            let res = klib::powerof(base, exponent)?;
            println!("{}^{} = {}", base, exponent, res);
            Ok(())
        }
        Commands::PhysPages {
            kaddr,
            len,
            check,
            scatter,
        } => cmd_phys_pages(kaddr, len, check, scatter),
    }
}

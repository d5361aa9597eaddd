// CLASSIFICATION: COMMUNITY
// Filename: showall_threads.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-19

//! debugfs module that dumps every live thread as CSV.
//!
//! Reading `<debugfs>/dbgfs_showall_threads/dbgfs_showall_threads` yields
//!
//! ```text
//! TGID,PID,taskaddr,stackaddr,name[,#threads]
//! ```
//!
//! one row per thread, the idle thread first. Kernel thread names are shown
//! in square brackets; `#threads` is present only on the leader of a
//! multithreaded process.

use std::fmt::{self, Write as _};
use std::str::FromStr;
use std::sync::Arc;

use log::{debug, error, info};

use crate::kernel::config::ShowallConfig;
use crate::kernel::errno::{KResult, KernelError};
use crate::kernel::fs::debugfs::{DebugFs, Dentry, FileOps};
use crate::kernel::module::{Kernel, KernelModule};
use crate::kernel::proc_mgr::{Task, TaskFields, TaskRegistry};
use crate::kernel::uaccess::simple_read_from_buffer;

pub const MODNAME: &str = "dbgfs_showall_threads";

/// One report row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ThreadRecord {
    pub tgid: u32,
    pub pid: u32,
    pub task_addr: u64,
    pub stack_addr: u64,
    pub name: String,
    pub kernel_thread: bool,
    pub nr_threads: Option<usize>,
}

impl ThreadRecord {
    /// Build a record from a task whose lock the caller holds.
    fn from_locked(task: &Task, fields: &TaskFields, group_size: usize) -> Self {
        let kernel_thread = fields.mm.is_none();
        let leads_group = !kernel_thread && task.is_group_leader() && group_size > 1;
        ThreadRecord {
            tgid: task.tgid(),
            pid: task.pid(),
            task_addr: task.task_addr(),
            stack_addr: task.stack_addr(),
            name: fields.comm.clone(),
            kernel_thread,
            nr_threads: leads_group.then_some(group_size),
        }
    }
}

impl fmt::Display for ThreadRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},0x{:016x},0x{:016x},",
            self.tgid, self.pid, self.task_addr, self.stack_addr
        )?;
        if self.kernel_thread {
            write!(f, "[{}]", self.name)?;
        } else {
            f.write_str(&self.name)?;
        }
        if let Some(n) = self.nr_threads {
            write!(f, ",{}", n)?;
        }
        Ok(())
    }
}

/// Parse a report row.
///
/// The format cannot tell a thread count from a name ending in
/// `,<digits>`. Only a group leader's row (`tgid == pid`) is read as carrying
/// a count, so the ambiguity remains for leaders alone.
impl FromStr for ThreadRecord {
    type Err = KernelError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let bad = || KernelError::InvalidArgument("malformed thread row");
        let hex = |s: &str| {
            s.strip_prefix("0x")
                .and_then(|h| u64::from_str_radix(h, 16).ok())
                .ok_or_else(bad)
        };
        let mut parts = line.trim_end_matches('\n').splitn(5, ',');
        let tgid = parts.next().and_then(|s| s.parse::<u32>().ok()).ok_or_else(bad)?;
        let pid = parts.next().and_then(|s| s.parse::<u32>().ok()).ok_or_else(bad)?;
        let task_addr = hex(parts.next().ok_or_else(bad)?)?;
        let stack_addr = hex(parts.next().ok_or_else(bad)?)?;
        let rest = parts.next().ok_or_else(bad)?;

        // Task names may contain commas; a trailing numeric field on a
        // leader is the thread count.
        let (name, nr_threads) = match rest.rsplit_once(',') {
            Some((name, n))
                if tgid == pid && !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()) =>
            {
                (name, Some(n.parse().map_err(|_| bad())?))
            }
            _ => (rest, None),
        };
        let (name, kernel_thread) = match name.strip_prefix('[').and_then(|n| n.strip_suffix(']')) {
            Some(inner) => (inner, true),
            None => (name, false),
        };
        Ok(ThreadRecord {
            tgid,
            pid,
            task_addr,
            stack_addr,
            name: name.to_string(),
            kernel_thread,
            nr_threads,
        })
    }
}

/// Read handler: regenerates the report on every call and copies the part
/// at the caller's offset.
pub struct ThreadDump {
    tasks: Arc<TaskRegistry>,
    per_record_budget: usize,
}

impl ThreadDump {
    pub fn new(tasks: Arc<TaskRegistry>, per_record_budget: usize) -> Self {
        ThreadDump {
            tasks,
            per_record_budget,
        }
    }

    /// Format the full report.
    ///
    /// The task list stays read-locked for the whole pass, so the rows
    /// written always match the count used to size the buffer.
    pub fn render(&self) -> KResult<String> {
        let list = self.tasks.read()?;
        let nr = list.count();
        debug!("# threads alive: {}", nr);

        // One extra record for the idle thread.
        let want = nr
            .checked_add(1)
            .and_then(|n| n.checked_mul(self.per_record_budget))
            .ok_or(KernelError::OutOfMemory)?;
        let mut data = String::new();
        if data.try_reserve(want).is_err() {
            error!("{}: report buffer allocation of {} bytes failed", MODNAME, want);
            return Err(KernelError::OutOfMemory);
        }

        append_row(&mut data, list.idle(), 1)?;
        for task in list.threads() {
            append_row(&mut data, task, list.nr_threads(task.tgid()))?;
        }
        Ok(data)
    }
}

fn append_row(data: &mut String, task: &Task, group_size: usize) -> KResult<()> {
    let fields = task.lock()?;
    let record = ThreadRecord::from_locked(task, &fields, group_size);
    writeln!(data, "{}", record).map_err(|_| KernelError::OutOfMemory)
}

impl FileOps for ThreadDump {
    fn read(&self, buf: &mut [u8], ppos: &mut u64) -> KResult<usize> {
        let data = self.render()?;
        simple_read_from_buffer(buf, ppos, data.as_bytes())
    }
}

/// The loaded module. Owns its debugfs directory and removes it on drop.
pub struct ShowallThreads {
    debugfs: Arc<DebugFs>,
    dir: Dentry,
    file: Dentry,
}

impl ShowallThreads {
    /// Path of the dump file, relative to the debugfs mount point.
    pub fn path(&self) -> &str {
        self.file.path()
    }
}

fn create_failed(what: &str, err: &KernelError) {
    info!("{}: failed.", what);
    if *err == KernelError::NoDevice {
        info!("{}: debugfs support not available?", MODNAME);
    }
}

impl KernelModule for ShowallThreads {
    const NAME: &'static str = MODNAME;
    type Params = ShowallConfig;

    fn init(kernel: &Kernel, cfg: ShowallConfig) -> KResult<Self> {
        let debugfs = Arc::clone(kernel.debugfs());
        let dir = debugfs.create_dir(&cfg.dir_name, None).map_err(|e| {
            create_failed("debugfs_create_dir", &e);
            e
        })?;

        let ops = Arc::new(ThreadDump::new(
            Arc::clone(kernel.tasks()),
            cfg.per_record_budget,
        ));
        let file = match debugfs.create_file(&cfg.file_name, cfg.mode, Some(&dir), ops) {
            Ok(f) => f,
            Err(e) => {
                create_failed("debugfs_create_file", &e);
                debugfs.remove_recursive(&dir)?;
                return Err(e);
            }
        };
        info!("Debugfs entry setup successfully (under {})", file);
        Ok(ShowallThreads { debugfs, dir, file })
    }
}

impl Drop for ShowallThreads {
    fn drop(&mut self) {
        if let Err(e) = self.debugfs.remove_recursive(&self.dir) {
            error!("{}: removing {} failed: {}", MODNAME, self.dir, e);
        }
        info!("{} removed", MODNAME);
    }
}

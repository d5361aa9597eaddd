// CLASSIFICATION: COMMUNITY
// Filename: proc_mgr.rs v0.3
// Author: Lukas Bower
// Date Modified: 2026-10-19

//! Task registry for the hosted kernel.
//!
//! Holds the idle task plus every live thread in creation order, grouped by
//! thread group. The registry-wide `RwLock` plays the part of the tasklist
//! lock; each task carries its own `Mutex` for the fields that can change
//! while it is alive (`comm` and `mm`).

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use log::debug;

use crate::kernel::errno::{KResult, KernelError};

/// Bytes available for a task name, including the terminating NUL.
pub const TASK_COMM_LEN: usize = 16;
/// Kernel stack size; also the spacing of simulated stack addresses.
pub const THREAD_SIZE: u64 = 0x4000;

const TASK_STRUCT_BASE: u64 = 0xffff_8880_0100_0000;
const TASK_STRUCT_STRIDE: u64 = 0x2000;
const STACK_BASE: u64 = 0xffff_c900_0000_0000;

const IDLE_COMM: &str = "swapper/0";

/// Memory-management context of a user process. Shared by every thread in
/// the group; kernel threads have none.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MmContext {
    pub owner: u32,
}

/// Task fields guarded by the per-task lock.
#[derive(Debug)]
pub struct TaskFields {
    pub comm: String,
    pub mm: Option<MmContext>,
}

#[derive(Debug)]
pub struct Task {
    pid: u32,
    tgid: u32,
    task_addr: u64,
    stack_addr: u64,
    fields: Mutex<TaskFields>,
}

impl Task {
    fn new(pid: u32, tgid: u32, comm: &str, mm: Option<MmContext>) -> Self {
        Task {
            pid,
            tgid,
            task_addr: TASK_STRUCT_BASE + u64::from(pid) * TASK_STRUCT_STRIDE,
            stack_addr: STACK_BASE + u64::from(pid) * THREAD_SIZE,
            fields: Mutex::new(TaskFields {
                comm: truncate_comm(comm),
                mm,
            }),
        }
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn tgid(&self) -> u32 {
        self.tgid
    }

    /// Address of the task's control block.
    pub fn task_addr(&self) -> u64 {
        self.task_addr
    }

    /// Base of the task's kernel-mode stack.
    pub fn stack_addr(&self) -> u64 {
        self.stack_addr
    }

    pub fn is_group_leader(&self) -> bool {
        self.pid == self.tgid
    }

    /// Take the per-task lock (`task_lock`). Released when the guard drops.
    pub fn lock(&self) -> KResult<MutexGuard<'_, TaskFields>> {
        self.fields
            .lock()
            .map_err(|_| KernelError::LockPoisoned("task"))
    }
}

fn truncate_comm(name: &str) -> String {
    let mut end = name.len().min(TASK_COMM_LEN - 1);
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    name[..end].to_string()
}

#[derive(Debug)]
struct TaskList {
    idle: Arc<Task>,
    threads: Vec<Arc<Task>>,
    group_sizes: HashMap<u32, usize>,
    next_pid: u32,
}

impl TaskList {
    fn position(&self, pid: u32) -> Option<usize> {
        self.threads.iter().position(|t| t.pid == pid)
    }

    fn alloc_pid(&mut self) -> KResult<u32> {
        let pid = self.next_pid;
        self.next_pid = pid.checked_add(1).ok_or(KernelError::Overflow)?;
        Ok(pid)
    }
}

/// Read-side view of the task list. Holding it keeps the set of threads
/// stable for the lifetime of the guard.
pub struct TaskListGuard<'a> {
    list: RwLockReadGuard<'a, TaskList>,
}

impl<'a> TaskListGuard<'a> {
    /// The primordial idle thread. Never part of [`Self::threads`].
    pub fn idle(&self) -> &Arc<Task> {
        &self.list.idle
    }

    /// Every live thread, each process's threads following its leader.
    pub fn threads(&self) -> impl Iterator<Item = &Arc<Task>> + '_ {
        self.list.threads.iter()
    }

    pub fn count(&self) -> usize {
        self.list.threads.len()
    }

    /// Number of threads in the group `tgid`; 0 if there is no such group.
    pub fn nr_threads(&self, tgid: u32) -> usize {
        self.list.group_sizes.get(&tgid).copied().unwrap_or(0)
    }
}

/// Registry of every task in the system.
#[derive(Debug)]
pub struct TaskRegistry {
    list: RwLock<TaskList>,
}

impl Default for TaskRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskRegistry {
    /// Create a registry holding only the idle task.
    pub fn new() -> Self {
        TaskRegistry {
            list: RwLock::new(TaskList {
                idle: Arc::new(Task::new(0, 0, IDLE_COMM, None)),
                threads: Vec::new(),
                group_sizes: HashMap::new(),
                next_pid: 1,
            }),
        }
    }

    /// Take the registry-wide read lock.
    pub fn read(&self) -> KResult<TaskListGuard<'_>> {
        let list = self
            .list
            .read()
            .map_err(|_| KernelError::LockPoisoned("tasklist"))?;
        Ok(TaskListGuard { list })
    }

    fn write(&self) -> KResult<RwLockWriteGuard<'_, TaskList>> {
        self.list
            .write()
            .map_err(|_| KernelError::LockPoisoned("tasklist"))
    }

    /// Start a kernel thread. Returns its pid.
    pub fn spawn_kthread(&self, name: &str) -> KResult<u32> {
        let mut list = self.write()?;
        let pid = list.alloc_pid()?;
        list.threads.push(Arc::new(Task::new(pid, pid, name, None)));
        list.group_sizes.insert(pid, 1);
        debug!("kthread {} [{}] started", pid, name);
        Ok(pid)
    }

    /// Start a single-threaded user process. Returns its pid (== tgid).
    pub fn spawn_process(&self, name: &str) -> KResult<u32> {
        let mut list = self.write()?;
        let pid = list.alloc_pid()?;
        let mm = MmContext { owner: pid };
        list.threads.push(Arc::new(Task::new(pid, pid, name, Some(mm))));
        list.group_sizes.insert(pid, 1);
        debug!("process {} {} started", pid, name);
        Ok(pid)
    }

    /// Add a thread to the user process `tgid`. Returns the new pid.
    pub fn spawn_thread(&self, tgid: u32, name: &str) -> KResult<u32> {
        let mut list = self.write()?;
        let leader_idx = list.position(tgid).ok_or(KernelError::NoSuchProcess(tgid))?;
        let leader = Arc::clone(&list.threads[leader_idx]);
        if !leader.is_group_leader() {
            return Err(KernelError::InvalidArgument("not a thread group leader"));
        }
        let mm = leader.lock()?.mm;
        if mm.is_none() {
            return Err(KernelError::InvalidArgument("kernel threads have no thread group"));
        }
        let pid = list.alloc_pid()?;
        let last_member = list
            .threads
            .iter()
            .rposition(|t| t.tgid == tgid)
            .unwrap_or(leader_idx);
        list.threads
            .insert(last_member + 1, Arc::new(Task::new(pid, tgid, name, mm)));
        *list.group_sizes.entry(tgid).or_insert(0) += 1;
        debug!("thread {} joined group {}", pid, tgid);
        Ok(pid)
    }

    /// Exit a task. A group leader takes its whole thread group with it.
    pub fn exit(&self, pid: u32) -> KResult<()> {
        if pid == 0 {
            return Err(KernelError::NotPermitted);
        }
        let mut list = self.write()?;
        let idx = list.position(pid).ok_or(KernelError::NoSuchProcess(pid))?;
        let task = Arc::clone(&list.threads[idx]);
        if task.is_group_leader() {
            let tgid = task.tgid;
            list.threads.retain(|t| t.tgid != tgid);
            list.group_sizes.remove(&tgid);
            debug!("group {} exited", tgid);
        } else {
            list.threads.remove(idx);
            if let Some(n) = list.group_sizes.get_mut(&task.tgid) {
                *n -= 1;
            }
            debug!("thread {} of group {} exited", pid, task.tgid);
        }
        Ok(())
    }

    /// Rename a task, truncating to `TASK_COMM_LEN - 1` bytes.
    pub fn set_comm(&self, pid: u32, name: &str) -> KResult<()> {
        let task = self.find(pid)?;
        task.lock()?.comm = truncate_comm(name);
        Ok(())
    }

    pub fn find(&self, pid: u32) -> KResult<Arc<Task>> {
        let list = self.read()?;
        if pid == 0 {
            return Ok(Arc::clone(list.idle()));
        }
        let task = list.threads().find(|t| t.pid == pid).cloned();
        task.ok_or(KernelError::NoSuchProcess(pid))
    }

    pub fn count_threads(&self) -> KResult<usize> {
        Ok(self.read()?.count())
    }

    pub fn nr_threads(&self, tgid: u32) -> KResult<usize> {
        Ok(self.read()?.nr_threads(tgid))
    }
}

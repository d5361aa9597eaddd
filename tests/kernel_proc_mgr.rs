// CLASSIFICATION: COMMUNITY
// Filename: kernel_proc_mgr.rs v0.2
// Author: Lukas Bower
// Date Modified: 2026-10-19

use lkdc::kernel::proc_mgr::TaskRegistry;
use lkdc::KernelError;

#[test]
fn spawn_and_list_tasks() {
    let reg = TaskRegistry::new();
    let init = reg.spawn_process("init").unwrap();
    let kthreadd = reg.spawn_kthread("kthreadd").unwrap();
    let names: Vec<String> = reg
        .read()
        .unwrap()
        .threads()
        .map(|t| format!("{}:{}", t.pid(), t.lock().unwrap().comm))
        .collect();
    assert!(names.contains(&format!("{}:init", init)));
    assert!(names.contains(&format!("{}:kthreadd", kthreadd)));
    assert_eq!(reg.count_threads().unwrap(), 2);
    reg.exit(init).unwrap();
    reg.exit(kthreadd).unwrap();
    assert_eq!(reg.count_threads().unwrap(), 0);
}

#[test]
fn idle_task_is_not_a_listed_thread() {
    let reg = TaskRegistry::new();
    let list = reg.read().unwrap();
    assert_eq!(list.count(), 0);
    assert_eq!(list.idle().pid(), 0);
    assert_eq!(list.idle().lock().unwrap().comm, "swapper/0");
    assert!(list.idle().lock().unwrap().mm.is_none());
}

#[test]
fn leader_exit_reaps_group() {
    let reg = TaskRegistry::new();
    let app = reg.spawn_process("app").unwrap();
    let t1 = reg.spawn_thread(app, "worker-1").unwrap();
    reg.spawn_thread(app, "worker-2").unwrap();
    let other = reg.spawn_process("other").unwrap();
    assert_eq!(reg.nr_threads(app).unwrap(), 3);

    reg.exit(t1).unwrap();
    assert_eq!(reg.nr_threads(app).unwrap(), 2);

    reg.exit(app).unwrap();
    assert_eq!(reg.nr_threads(app).unwrap(), 0);
    assert_eq!(reg.count_threads().unwrap(), 1);
    assert_eq!(reg.find(other).unwrap().pid(), other);
}

#[test]
fn threads_share_the_leader_mm() {
    let reg = TaskRegistry::new();
    let app = reg.spawn_process("app").unwrap();
    let t = reg.spawn_thread(app, "worker").unwrap();
    let leader_mm = reg.find(app).unwrap().lock().unwrap().mm;
    let thread_mm = reg.find(t).unwrap().lock().unwrap().mm;
    assert!(leader_mm.is_some());
    assert_eq!(leader_mm, thread_mm);
    assert_eq!(reg.find(t).unwrap().tgid(), app);
}

#[test]
fn invalid_operations() {
    let reg = TaskRegistry::new();
    let kt = reg.spawn_kthread("kswapd0").unwrap();
    assert!(matches!(reg.spawn_thread(kt, "x"), Err(KernelError::InvalidArgument(_))));
    assert_eq!(reg.spawn_thread(999, "x"), Err(KernelError::NoSuchProcess(999)));
    assert_eq!(reg.exit(0), Err(KernelError::NotPermitted));
    assert_eq!(reg.exit(999), Err(KernelError::NoSuchProcess(999)));

    let app = reg.spawn_process("app").unwrap();
    let t = reg.spawn_thread(app, "w").unwrap();
    assert!(matches!(reg.spawn_thread(t, "x"), Err(KernelError::InvalidArgument(_))));
}

#[test]
fn rename_takes_effect() {
    let reg = TaskRegistry::new();
    let pid = reg.spawn_process("a.out").unwrap();
    reg.set_comm(pid, "server").unwrap();
    assert_eq!(reg.find(pid).unwrap().lock().unwrap().comm, "server");
    assert_eq!(reg.set_comm(4242, "x"), Err(KernelError::NoSuchProcess(4242)));
}

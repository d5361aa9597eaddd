// CLASSIFICATION: COMMUNITY
// Filename: test_showall_threads.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-19

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use lkdc::kernel::config::ShowallConfig;
use lkdc::kernel::fs::debugfs::DebugFs;
use lkdc::kernel::proc_mgr::TaskRegistry;
use lkdc::modules::showall_threads::{ShowallThreads, ThreadDump, ThreadRecord};
use lkdc::{Kernel, KernelError};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn records(report: &str) -> Vec<ThreadRecord> {
    report.lines().map(|l| l.parse().unwrap()).collect()
}

fn read_report(kernel: &Kernel, module: &ShowallThreads, chunk: usize) -> String {
    let mut file = kernel.debugfs().open(module.path()).unwrap();
    String::from_utf8(file.read_to_end(chunk).unwrap()).unwrap()
}

#[test]
fn one_row_per_thread_plus_idle() {
    init_logging();
    let kernel = Kernel::new();
    let module = kernel.load::<ShowallThreads>(ShowallConfig::default()).unwrap();

    for n in 1..=6 {
        kernel.tasks().spawn_process(&format!("proc{}", n)).unwrap();
        let report = read_report(&kernel, &module, 4096);
        assert!(report.ends_with('\n'));
        assert_eq!(report.lines().count(), n + 1);
        assert_eq!(records(&report)[0].name, "swapper/0");
    }
}

#[test]
fn only_idle_row_on_an_empty_system() {
    let kernel = Kernel::new();
    let module = kernel.load::<ShowallThreads>(ShowallConfig::default()).unwrap();
    let report = read_report(&kernel, &module, 64);
    assert_eq!(report.lines().count(), 1);
    assert!(report.starts_with("0,0,0x"));
}

#[test]
fn kernel_threads_are_bracketed() {
    let kernel = Kernel::new();
    let tasks = kernel.tasks();
    let kt = tasks.spawn_kthread("kworker/0:1").unwrap();
    let user = tasks.spawn_process("bash").unwrap();
    let module = kernel.load::<ShowallThreads>(ShowallConfig::default()).unwrap();
    let report = read_report(&kernel, &module, 4096);

    for line in report.lines().skip(1) {
        let rec: ThreadRecord = line.parse().unwrap();
        if rec.pid == kt {
            assert!(line.ends_with(",[kworker/0:1]"), "{}", line);
            assert!(rec.kernel_thread);
        } else if rec.pid == user {
            assert!(line.ends_with(",bash"), "{}", line);
            assert!(!rec.kernel_thread);
        }
    }
}

#[test]
fn thread_count_only_on_multithreaded_leader() {
    let kernel = Kernel::new();
    let tasks = kernel.tasks();
    let single = tasks.spawn_process("sshd").unwrap();
    let multi = tasks.spawn_process("firefox").unwrap();
    let w1 = tasks.spawn_thread(multi, "Renderer").unwrap();
    let w2 = tasks.spawn_thread(multi, "Timer").unwrap();
    let kt = tasks.spawn_kthread("kthreadd").unwrap();
    let module = kernel.load::<ShowallThreads>(ShowallConfig::default()).unwrap();

    let recs = records(&read_report(&kernel, &module, 4096));
    let by_pid = |pid| recs.iter().find(|r| r.pid == pid).unwrap();
    assert_eq!(by_pid(multi).nr_threads, Some(3));
    assert_eq!(by_pid(w1).nr_threads, None);
    assert_eq!(by_pid(w2).nr_threads, None);
    assert_eq!(by_pid(single).nr_threads, None);
    assert_eq!(by_pid(kt).nr_threads, None);
    assert_eq!(by_pid(w1).tgid, multi);

    // Threads are listed right after their leader.
    let order: Vec<u32> = recs.iter().map(|r| r.pid).collect();
    assert_eq!(order, vec![0, single, multi, w1, w2, kt]);

    // Dropping back to one thread removes the field.
    tasks.exit(w1).unwrap();
    tasks.exit(w2).unwrap();
    let recs = records(&read_report(&kernel, &module, 4096));
    assert_eq!(recs.iter().find(|r| r.pid == multi).unwrap().nr_threads, None);
}

#[test]
fn chunked_reads_reassemble_the_report() {
    let kernel = Kernel::new();
    let tasks = kernel.tasks();
    for i in 0..20 {
        let pid = tasks.spawn_process(&format!("svc{}", i)).unwrap();
        if i % 3 == 0 {
            tasks.spawn_thread(pid, "helper").unwrap();
        }
    }
    let module = kernel.load::<ShowallThreads>(ShowallConfig::default()).unwrap();
    let whole = ThreadDump::new(Arc::clone(kernel.tasks()), 128).render().unwrap();

    for chunk in [1, 7, 64, 100_000] {
        assert_eq!(read_report(&kernel, &module, chunk), whole);
    }
}

#[test]
fn offset_advances_by_bytes_copied() {
    let kernel = Kernel::new();
    kernel.tasks().spawn_process("init").unwrap();
    let module = kernel.load::<ShowallThreads>(ShowallConfig::default()).unwrap();
    let mut file = kernel.debugfs().open(module.path()).unwrap();
    let mut buf = [0u8; 10];
    assert_eq!(file.read(&mut buf).unwrap(), 10);
    assert_eq!(file.pos(), 10);
    assert_eq!(&buf[..4], b"0,0,");
    assert_eq!(file.write(b"x"), Err(KernelError::InvalidArgument("file has no write handler")));
}

#[test]
fn names_longer_than_the_budget_still_fit() {
    let kernel = Kernel::new();
    for _ in 0..8 {
        kernel.tasks().spawn_process("averyverylongname").unwrap();
    }
    let cfg = ShowallConfig {
        per_record_budget: 1,
        ..ShowallConfig::default()
    };
    let module = kernel.load::<ShowallThreads>(cfg).unwrap();
    let recs = records(&read_report(&kernel, &module, 4096));
    assert_eq!(recs.len(), 9);
    assert!(recs[1..].iter().all(|r| r.name == "averyverylongna"));
}

#[test]
fn allocation_failure_is_enomem() {
    let kernel = Kernel::new();
    kernel.tasks().spawn_process("init").unwrap();
    let cfg = ShowallConfig {
        per_record_budget: usize::MAX,
        ..ShowallConfig::default()
    };
    let module = kernel.load::<ShowallThreads>(cfg).unwrap();
    let mut file = kernel.debugfs().open(module.path()).unwrap();
    let mut buf = [0u8; 32];
    let err = file.read(&mut buf).unwrap_err();
    assert_eq!(err, KernelError::OutOfMemory);
    assert_eq!(err.to_errno(), -12);
    assert_eq!(file.pos(), 0);
}

#[test]
fn module_lifecycle_owns_the_debugfs_entry() {
    init_logging();
    let kernel = Kernel::new();
    let module = kernel.load::<ShowallThreads>(ShowallConfig::default()).unwrap();
    assert_eq!(module.path(), "dbgfs_showall_threads/dbgfs_showall_threads");
    assert!(kernel.debugfs().exists(module.path()).unwrap());

    // A second instance collides with the first.
    assert!(matches!(
        kernel.load::<ShowallThreads>(ShowallConfig::default()),
        Err(KernelError::AlreadyExists(_))
    ));

    drop(module);
    assert!(!kernel.debugfs().exists("dbgfs_showall_threads").unwrap());
    assert!(kernel.load::<ShowallThreads>(ShowallConfig::default()).is_ok());
}

#[test]
fn missing_debugfs_is_no_device() {
    let kernel = Kernel::with_parts(Arc::new(TaskRegistry::new()), Arc::new(DebugFs::unavailable()));
    let err = kernel.load::<ShowallThreads>(ShowallConfig::default()).err().unwrap();
    assert_eq!(err, KernelError::NoDevice);
    assert_eq!(err.to_errno(), -19);
}

#[test]
fn custom_names_and_mode() {
    let kernel = Kernel::new();
    let cfg = ShowallConfig {
        dir_name: "threads".into(),
        file_name: "all".into(),
        mode: 0o200,
        ..ShowallConfig::default()
    };
    let module = kernel.load::<ShowallThreads>(cfg).unwrap();
    assert_eq!(module.path(), "threads/all");
    let mut file = kernel.debugfs().open("/threads/all").unwrap();
    assert_eq!(file.read(&mut [0u8; 8]), Err(KernelError::NotPermitted));
}

#[test]
fn render_is_consistent_under_concurrent_churn() {
    init_logging();
    let tasks = Arc::new(TaskRegistry::new());
    tasks.spawn_kthread("kthreadd").unwrap();
    let dump = ThreadDump::new(Arc::clone(&tasks), 128);
    let done = Arc::new(AtomicBool::new(false));

    let churn = {
        let tasks = Arc::clone(&tasks);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            for round in 0..2000 {
                let leader = tasks.spawn_process("worker").unwrap();
                let helper = tasks.spawn_thread(leader, "helper").unwrap();
                tasks.spawn_thread(leader, "io").unwrap();
                tasks.set_comm(helper, &format!("helper-{}", round)).unwrap();
                tasks.exit(helper).unwrap();
                if round % 3 != 0 {
                    tasks.exit(leader).unwrap();
                }
            }
            done.store(true, Ordering::SeqCst);
        })
    };

    let mut renders = 0;
    while renders < 500 || !done.load(Ordering::SeqCst) {
        let report = dump.render().unwrap();
        let recs: Vec<ThreadRecord> = report
            .lines()
            .map(|line| {
                assert!(line.split(',').count() >= 5, "{}", line);
                line.parse().unwrap()
            })
            .collect();
        assert_eq!(recs[0].pid, 0);

        // Every group in the snapshot agrees with its leader's count.
        let mut members: HashMap<u32, usize> = HashMap::new();
        for rec in &recs[1..] {
            *members.entry(rec.tgid).or_insert(0) += 1;
        }
        for rec in recs.iter().filter(|r| r.pid != 0 && r.pid == r.tgid) {
            let n = members[&rec.tgid];
            assert_eq!(rec.nr_threads, (n > 1).then_some(n), "{}", report);
        }
        for rec in &recs[1..] {
            assert!(recs.iter().any(|r| r.pid == rec.tgid), "orphan {}", rec);
        }
        renders += 1;
        if renders > 100_000 {
            break;
        }
    }
    churn.join().unwrap();
    assert!(renders >= 500);

    let report = dump.render().unwrap();
    assert_eq!(report.lines().count(), tasks.count_threads().unwrap() + 1);
}

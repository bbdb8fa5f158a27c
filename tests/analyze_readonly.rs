mod common;

use common::Sandbox;
use sysclean::{
    DefaultTaskFactory, ExecutionEngine, ExecutionMode, OsFamily, OutcomeStatus,
    PlatformCapabilities, StorageMedium, TaskId,
};

fn populated() -> Sandbox {
    let sandbox = Sandbox::new();
    sandbox.file("temp/a.tmp", 4_000);
    sandbox.file("temp/build-1234/obj.o", 9_000);
    sandbox.trashed("report.pdf", 12_000);
    sandbox.file("cache/thumbnails/x.png", 3_000);
    sandbox.file("Prefetch/APP.EXE-1234.pf", 700);
    sandbox.aged_file("home/archive/old.iso", 50_000, 120);
    sandbox.empty_dir("home/projects/stale/empty");
    sandbox
}

fn windows_hdd_engine(sandbox: &Sandbox) -> ExecutionEngine {
    ExecutionEngine::new(
        PlatformCapabilities::new(OsFamily::Windows, StorageMedium::Rotational),
        DefaultTaskFactory::new(sandbox.config()),
    )
}

#[test]
fn analyze_leaves_every_byte_in_place() {
    let sandbox = populated();
    let before = sandbox.snapshot();

    let report = windows_hdd_engine(&sandbox).run([], true, ExecutionMode::Analyze);

    assert_eq!(sandbox.snapshot(), before);
    assert_eq!(report.outcomes().len(), 7);
    assert!(report
        .outcomes()
        .iter()
        .all(|o| o.status == OutcomeStatus::Succeeded));
    assert_eq!(report.get(TaskId::Temp).unwrap().bytes, 13_000);
    assert_eq!(report.get(TaskId::Trash).unwrap().bytes, 12_000);
    assert_eq!(report.get(TaskId::Cache).unwrap().bytes, 3_000);
    assert_eq!(report.get(TaskId::Prefetch).unwrap().bytes, 700);
    assert_eq!(report.get(TaskId::Defrag).unwrap().bytes, 0);
    assert_eq!(report.get(TaskId::LargeOld).unwrap().bytes, 50_000);
    assert_eq!(report.get(TaskId::EmptyDirs).unwrap().entries.len(), 3);
    assert_eq!(
        report.total_bytes(),
        13_000 + 12_000 + 3_000 + 700 + 50_000
    );
}

#[test]
fn estimates_are_idempotent() {
    let sandbox = populated();
    let engine = windows_hdd_engine(&sandbox);

    let first = engine.run([], true, ExecutionMode::Analyze);
    let second = engine.run([], true, ExecutionMode::Analyze);

    let bytes = |r: &sysclean::ResultReport| -> Vec<(TaskId, u64, usize)> {
        r.outcomes()
            .iter()
            .map(|o| (o.id, o.bytes, o.entries.len()))
            .collect()
    };
    assert_eq!(bytes(&first), bytes(&second));
}

#[test]
fn execute_never_deletes_large_old_finds() {
    let sandbox = populated();
    let engine = windows_hdd_engine(&sandbox);

    let report = engine.run([TaskId::LargeOld], false, ExecutionMode::Execute);

    let outcome = report.get(TaskId::LargeOld).unwrap();
    assert_eq!(outcome.status, OutcomeStatus::Succeeded);
    assert_eq!(outcome.entries.len(), 1);
    assert!(sandbox.path("home/archive/old.iso").exists());
}

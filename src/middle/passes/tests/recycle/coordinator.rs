//! 两遍扫描与单元驱动

use super::{run, sequential};
use crate::middle::core::ir::{ClassUnit, Method};
use crate::middle::core::MethodBuilder;
use crate::middle::passes::recycle::coordinator::site_location;
use crate::middle::passes::recycle::{
    CallPattern, CategoryFlags, CheckOptions, Phase, RecycleChecker, ReleaseCall, ResourceKind,
    ResourceTable, UnitDriver,
};
use crate::middle::passes::tests::{unit_of, ResourceOps, VELOCITY_TRACKER};
use crate::util::diagnostic::Severity;

const TRACKER_SIG: &str = "Landroid/view/VelocityTracker;";

fn leaking_parcel(name: &str) -> Method {
    MethodBuilder::new(name, "()V")
        .locals(2)
        .obtain_parcel()
        .store(1)
        .ret()
        .build()
}

fn recycled_parcel(name: &str) -> Method {
    MethodBuilder::new(name, "()V")
        .locals(2)
        .obtain_parcel()
        .store(1)
        .load(1)
        .write_parcel()
        .load(1)
        .recycle_parcel()
        .ret()
        .build()
}

fn leaking_tracker(name: &str) -> Method {
    MethodBuilder::new(name, "()V")
        .locals(2)
        .obtain_velocity_tracker()
        .store(1)
        .ret()
        .build()
}

fn mixed_unit() -> ClassUnit {
    let mut b = MethodBuilder::new("maybe", "(I)V").locals(3);
    let skip = b.new_label();
    let one_arm = b
        .obtain_parcel()
        .store(2)
        .load(1)
        .if_zero(skip)
        .load(2)
        .recycle_parcel()
        .mark(skip)
        .ret()
        .build();

    unit_of(vec![
        leaking_parcel("leak"),
        recycled_parcel("clean"),
        one_arm,
        leaking_tracker("track"),
        MethodBuilder::new("twice", "()V")
            .locals(2)
            .obtain_parcel()
            .store(1)
            .load(1)
            .recycle_parcel()
            .load(1)
            .recycle_parcel()
            .ret()
            .build(),
    ])
}

// ============ 第一遍 ============

#[test]
fn test_recycled_unit_is_clean() {
    let report = run(&unit_of(vec![recycled_parcel("write")]));

    assert!(report.diagnostics.is_empty());
    assert!(!report.rescanned);
    assert_eq!(
        report.flags.get("Parcel"),
        Some(&CategoryFlags {
            obtained: true,
            released: true,
            handled: true,
        })
    );
}

#[test]
fn test_leak_reported_at_obtain_site() {
    let report = run(&unit_of(vec![leaking_parcel("write")]));

    assert_eq!(report.diagnostics.len(), 1);
    assert!(!report.rescanned);

    let diagnostic = &report.diagnostics[0];
    assert_eq!(diagnostic.code, "R0001");
    assert_eq!(diagnostic.severity, Severity::Warning);
    assert_eq!(
        diagnostic.message,
        "This Parcel should be recycled after use with #recycle()"
    );
    assert_eq!(diagnostic.resource.as_deref(), Some("Parcel"));

    let location = diagnostic.location.as_ref().unwrap();
    assert_eq!(location.class, "com/example/Widget");
    assert_eq!(location.method, "write()V");
    assert_eq!(location.instruction, 0);
}

#[test]
fn test_double_recycle_reported_once() {
    let method = MethodBuilder::new("write", "()V")
        .locals(2)
        .obtain_parcel()
        .store(1)
        .load(1)
        .recycle_parcel()
        .load(1)
        .recycle_parcel()
        .ret()
        .build();
    let report = run(&unit_of(vec![method]));

    assert_eq!(report.diagnostics.len(), 1);
    let diagnostic = &report.diagnostics[0];
    assert_eq!(diagnostic.code, "R0002");
    assert_eq!(diagnostic.message, "This Parcel has already been recycled");
    assert_eq!(diagnostic.location.as_ref().unwrap().instruction, 5);
}

#[test]
fn test_field_store_is_silent() {
    let method = MethodBuilder::new("init", "()V")
        .load(0)
        .obtain_parcel()
        .put_field("com/example/Widget", "parcel", "Landroid/os/Parcel;")
        .ret()
        .build();
    let report = run(&unit_of(vec![method]));

    assert!(report.diagnostics.is_empty());
    assert!(report.flags["Parcel"].handled);
    assert!(!report.rescanned);
}

#[test]
fn test_leaks_sorted_by_location() {
    let report = run(&unit_of(vec![leaking_parcel("b"), leaking_parcel("a")]));

    let methods: Vec<_> = report
        .diagnostics
        .iter()
        .map(|d| d.location.as_ref().unwrap().method.as_str())
        .collect();
    assert_eq!(methods, ["a()V", "b()V"]);
}

#[test]
fn test_location_carries_file_and_line() {
    let method = MethodBuilder::new("write", "()V")
        .locals(2)
        .line(12)
        .obtain_parcel()
        .line(13)
        .store(1)
        .ret()
        .build();
    let unit = ClassUnit::new("com/example/Widget")
        .with_source_file("Widget.java")
        .with_method(method);

    let report = run(&unit);
    let location = report.diagnostics[0].location.as_ref().unwrap();
    assert_eq!(location.file.as_deref(), Some("Widget.java"));
    assert_eq!(location.line, Some(12));
    assert_eq!(location.origin(), "Widget.java:12");

    let direct = site_location(&unit, &unit.methods[0], 1);
    assert_eq!(direct.line, Some(13));
    assert_eq!(direct.instruction, 1);
}

#[test]
fn test_severity_override() {
    let driver = UnitDriver::new(
        ResourceTable::builtin().clone(),
        CheckOptions {
            parallel: false,
            rescan: true,
            severity: Severity::Error,
        },
    );
    let report = driver.run(&unit_of(vec![leaking_parcel("write")]));
    assert_eq!(report.diagnostics[0].severity, Severity::Error);
}

// ============ 第二遍 ============

#[test]
fn test_coarse_kind_reported_on_rescan() {
    let report = run(&unit_of(vec![leaking_tracker("track")]));

    assert!(report.rescanned);
    assert_eq!(report.diagnostics.len(), 1);
    let diagnostic = &report.diagnostics[0];
    assert_eq!(diagnostic.code, "R0001");
    assert_eq!(diagnostic.resource.as_deref(), Some("VelocityTracker"));
    assert_eq!(
        diagnostic.message,
        "This VelocityTracker should be recycled after use with #recycle()"
    );
    assert_eq!(
        report.flags["VelocityTracker"],
        CategoryFlags {
            obtained: true,
            released: false,
            handled: false,
        }
    );
}

#[test]
fn test_coarse_kind_released_elsewhere() {
    let keep = MethodBuilder::new("start", "()V")
        .load(0)
        .obtain_velocity_tracker()
        .put_field("com/example/Widget", "tracker", TRACKER_SIG)
        .ret()
        .build();
    let release = MethodBuilder::new("stop", "()V")
        .load(0)
        .get_field("com/example/Widget", "tracker", TRACKER_SIG)
        .recycle_velocity_tracker()
        .ret()
        .build();

    let report = run(&unit_of(vec![keep, release]));
    assert!(report.diagnostics.is_empty());
    assert!(!report.rescanned);
    assert!(report.flags["VelocityTracker"].released);
}

#[test]
fn test_message_from_handler() {
    let method = MethodBuilder::new("post", "()V")
        .locals(2)
        .obtain_message()
        .store(1)
        .ret()
        .build();

    let report = run(&unit_of(vec![method]));
    assert_eq!(report.diagnostics.len(), 1);
    assert_eq!(report.diagnostics[0].resource.as_deref(), Some("Message"));
    assert_eq!(
        report.diagnostics[0].location.as_ref().unwrap().instruction,
        1
    );
}

#[test]
fn test_rescan_disabled() {
    let driver = UnitDriver::new(
        ResourceTable::builtin().clone(),
        CheckOptions {
            parallel: false,
            rescan: false,
            severity: Severity::Warning,
        },
    );
    let report = driver.run(&unit_of(vec![leaking_tracker("track")]));
    assert!(report.diagnostics.is_empty());
    assert!(!report.rescanned);
}

#[test]
fn test_aborted_site_is_silent() {
    // 执行越过方法末尾，数据流分析中止
    let method = MethodBuilder::new("broken", "()V")
        .locals(2)
        .obtain_parcel()
        .store(1)
        .build();

    let report = run(&unit_of(vec![method]));
    assert_eq!(report.aborted, 1);
    assert!(report.diagnostics.is_empty());
    // 种类仍可疑，第二遍跳过已有结论的位置
    assert!(report.rescanned);
}

#[test]
fn test_oversized_method_does_not_stop_unit() {
    let huge = MethodBuilder::new("huge", "()V")
        .locals(usize::MAX)
        .obtain_parcel()
        .store(1)
        .ret()
        .build();
    let leak = MethodBuilder::new("leak", "()V")
        .locals(2)
        .obtain_parcel()
        .store(1)
        .ret()
        .build();

    let report = run(&unit_of(vec![huge, leak]));
    assert_eq!(report.aborted, 1);
    assert_eq!(report.diagnostics.len(), 1);
    assert_eq!(
        report.diagnostics[0].location.as_ref().unwrap().method,
        "leak()V"
    );
}

// ============ 阶段 ============

#[test]
fn test_phase_transitions() {
    let table = ResourceTable::builtin();
    let unit = unit_of(vec![leaking_tracker("track")]);
    let mut checker = RecycleChecker::new(table, CheckOptions::default());
    assert_eq!(checker.phase(), Phase::Initial);

    checker.before_unit();
    assert_eq!(checker.phase(), Phase::Scanning);
    checker.scan(&unit);
    assert!(checker.after_unit());
    assert_eq!(checker.phase(), Phase::MaybeRescan);
    assert!(checker.context().rescan_requested);

    assert!(checker.begin_rescan());
    assert_eq!(checker.phase(), Phase::Rescanning);
    checker.scan(&unit);
    assert!(!checker.after_unit());
    assert_eq!(checker.phase(), Phase::Done);
    assert!(!checker.begin_rescan());

    let (diagnostics, context) = checker.finish();
    assert_eq!(diagnostics.len(), 1);
    assert!(context.settled.is_empty());
}

#[test]
fn test_no_rescan_when_handled() {
    let table = ResourceTable::builtin();
    let mut checker = RecycleChecker::new(table, CheckOptions::default());

    checker.before_unit();
    checker.scan(&unit_of(vec![leaking_parcel("write")]));
    assert!(!checker.after_unit());
    assert_eq!(checker.phase(), Phase::Done);
    assert!(checker.context().settled.contains(&(0, 0)));
}

#[test]
fn test_scan_outside_pass_is_ignored() {
    let table = ResourceTable::builtin();
    let mut checker = RecycleChecker::new(table, CheckOptions::default());
    checker.scan(&unit_of(vec![leaking_parcel("write")]));

    let (diagnostics, _) = checker.finish();
    assert!(diagnostics.is_empty());
}

#[test]
fn test_repeated_scan_reports_once() {
    let table = ResourceTable::builtin();
    let unit = unit_of(vec![leaking_parcel("write")]);
    let mut checker = RecycleChecker::new(table, CheckOptions::default());

    checker.before_unit();
    checker.scan(&unit);
    checker.scan(&unit);
    checker.after_unit();

    let (diagnostics, _) = checker.finish();
    assert_eq!(diagnostics.len(), 1);
}

#[test]
fn test_context_reset_between_units() {
    let table = ResourceTable::builtin();
    let mut checker = RecycleChecker::new(table, CheckOptions::default());

    checker.before_unit();
    checker.scan(&unit_of(vec![leaking_tracker("track")]));
    assert!(checker.after_unit());

    checker.before_unit();
    assert!(!checker.context().rescan_requested);
    assert!(checker
        .context()
        .flags
        .values()
        .all(|flags| *flags == CategoryFlags::default()));
}

// ============ 驱动 ============

#[test]
fn test_parallel_matches_sequential() {
    let unit = mixed_unit();
    let parallel = UnitDriver::default().run(&unit);
    let sequential = sequential().run(&unit);

    assert_eq!(parallel.diagnostics, sequential.diagnostics);
    assert_eq!(parallel.flags, sequential.flags);
    assert_eq!(parallel.rescanned, sequential.rescanned);
}

#[test]
fn test_mixed_unit_findings() {
    let report = run(&mixed_unit());
    let findings: Vec<_> = report
        .diagnostics
        .iter()
        .map(|d| {
            let location = d.location.as_ref().unwrap();
            (d.code.as_str(), location.method.as_str(), location.instruction)
        })
        .collect();

    // 按方法名排序：leak、track、twice
    assert_eq!(
        findings,
        [
            ("R0001", "leak()V", 0),
            ("R0001", "track()V", 0),
            ("R0002", "twice()V", 5),
        ]
    );
    assert!(report.rescanned);
}

#[test]
fn test_run_is_idempotent() {
    let driver = sequential();
    let unit = mixed_unit();
    assert_eq!(driver.run(&unit), driver.run(&unit));
}

#[test]
fn test_run_all_keeps_order() {
    let units = vec![
        ClassUnit::new("com/example/B").with_method(leaking_parcel("write")),
        ClassUnit::new("com/example/A").with_method(recycled_parcel("write")),
    ];
    let driver = UnitDriver::default();

    let reports = driver.run_all(&units);
    let names: Vec<_> = reports.iter().map(|r| r.unit.as_str()).collect();
    assert_eq!(names, ["com/example/B", "com/example/A"]);

    let diagnostics = driver.check_units(&units);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(
        diagnostics[0].location.as_ref().unwrap().class,
        "com/example/B"
    );
}

// ============ 资源表配置 ============

#[test]
fn test_disabled_kind() {
    let table = ResourceTable::configured(&["Parcel".to_string()], &[]);
    let driver = UnitDriver::new(table, CheckOptions::default());

    let report = driver.run(&unit_of(vec![leaking_parcel("write")]));
    assert!(report.diagnostics.is_empty());
    assert!(!report.flags.contains_key("Parcel"));
}

#[test]
fn test_custom_kind() {
    let cursor = ResourceKind {
        name: "Cursor".to_string(),
        owner: "android/database/Cursor".to_string(),
        obtain: vec![CallPattern::new("android/content/ContentResolver", "query", None)],
        release: ReleaseCall {
            name: "close".to_string(),
            desc: "()V".to_string(),
        },
        flow_checked: true,
        preserving: Vec::new(),
    };
    let driver = UnitDriver::new(
        ResourceTable::configured(&[], &[cursor]),
        CheckOptions::default(),
    );

    let query = |close: bool| {
        let b = MethodBuilder::new("load", "()V")
            .locals(2)
            .load(0)
            .invoke_virtual(
                "android/content/ContentResolver",
                "query",
                "()Landroid/database/Cursor;",
            )
            .store(1);
        let b = if close {
            b.load(1)
                .invoke_virtual("android/database/Cursor", "close", "()V")
        } else {
            b
        };
        b.ret().build()
    };

    let leaked = driver.run(&unit_of(vec![query(false)]));
    assert_eq!(leaked.diagnostics.len(), 1);
    assert_eq!(
        leaked.diagnostics[0].message,
        "This Cursor should be recycled after use with #recycle()"
    );
    assert_eq!(leaked.diagnostics[0].resource.as_deref(), Some("Cursor"));

    let closed = driver.run(&unit_of(vec![query(true)]));
    assert!(closed.diagnostics.is_empty());
}

#[test]
fn test_tracker_constant_matches_builtin() {
    let table = ResourceTable::builtin();
    let id = table.find("VelocityTracker").unwrap();
    assert_eq!(table.kind(id).unwrap().owner, VELOCITY_TRACKER);
}

//! Adoption policy: how failures of every kind become a `Fault`.
//!
//! Tests cover:
//! - fresh faults starting at their caller
//! - identity reuse on the raising thread
//! - re-rooting faults that crossed a thread boundary
//! - foreign errors with and without a native stack
//! - thiserror-based errors
//! - absent failures

use snaptrace::{Fault, RawStack, ResultFaultExt, SourceLocation, Traced};
use std::hint::black_box;
use std::io;
use std::thread;

#[derive(Debug, thiserror::Error)]
enum StoreError {
    #[error("record {0} not found")]
    NotFound(u32),
    #[error("storage unavailable")]
    Io(#[from] io::Error),
}

// Adoption sites live in `#[inline(never)]` helpers so their frames survive
// optimized builds; `black_box` keeps the adopting call out of tail position.

#[inline(never)]
fn adopt_at_site(remote: Fault) -> Fault {
    black_box(Fault::adopt(remote))
}

#[inline(never)]
fn deny_write() -> Fault {
    black_box(Fault::adopt(io::Error::new(io::ErrorKind::PermissionDenied, "read-only")))
}

#[inline(never)]
fn raise_fresh() -> Fault {
    black_box(Fault::new("fresh"))
}

// ============================================================================
// Fresh faults
// ============================================================================

#[test]
fn fresh_fault_starts_at_caller() {
    let fault = raise_fresh();
    assert!(fault.frame_count() > 0);
    assert!(!fault.frames().iter().any(|f| f.location().declared_in(Fault::BOUNDARY)));

    let top = fault.frames()[0].location();
    if top.is_resolved() {
        assert_eq!(top.function(), Some("raise_fresh"));
    }
}

#[test]
fn fresh_fault_snapshot_fallback_skips_library_frames() {
    let mut fault = Fault::empty();
    fault.snap("k", 1);
    let holder = fault.frames().iter().find(|f| f.has_snapshots()).unwrap();
    assert!(!holder.location().declared_in(Fault::BOUNDARY));
}

// ============================================================================
// Same thread
// ============================================================================

#[test]
fn same_thread_fault_is_returned_unchanged() {
    let mut fault = Fault::new("original");
    fault.snap("attempt", 1);
    let id = fault.id();
    let frame_count = fault.frame_count();

    let adopted = Fault::adopt(fault);
    assert_eq!(adopted.id(), id);
    assert_eq!(adopted.frame_count(), frame_count);
    assert_eq!(adopted.message(), Some("original"));
    assert!(adopted.render().contains("[attempt=1]"));
}

#[test]
fn readopting_through_result_keeps_one_fault() {
    let first: Result<(), Fault> = Err(Fault::new("deep failure"));
    let id = first.as_ref().map_err(Fault::id).unwrap_err();

    let second = first.fault();
    let third = second.snap("layer", || 3);
    let fault = third.unwrap_err();
    assert_eq!(fault.id(), id);
    assert_eq!(fault.message(), Some("deep failure"));
}

// ============================================================================
// Other threads
// ============================================================================

#[test]
fn cross_thread_fault_is_wrapped() {
    let remote = thread::spawn(|| {
        let mut fault = Fault::new("worker failed");
        fault.snap("job", 42);
        fault
    })
    .join()
    .unwrap();
    let remote_id = remote.id();
    let remote_token = remote.diagnostic_token();
    let remote_thread = remote.thread_id();

    let local = adopt_at_site(remote);

    assert_ne!(local.id(), remote_id);
    assert_ne!(local.thread_id(), remote_thread);
    assert_eq!(local.thread_id(), thread::current().id());

    let message = local.message().unwrap();
    assert!(message.starts_with("[cause fault: "));
    assert!(message.ends_with(']'));
    assert!(message.contains("worker failed"));
    assert!(message.contains(&format!("-:[{}]:-", remote_token)));
    assert!(message.contains("[job=42]"));

    assert!(local.frame_count() > 0);
    let top = local.frames()[0].location();
    if top.is_resolved() {
        assert_eq!(top.function(), Some("adopt_at_site"));
    }
}

#[test]
fn cross_thread_wrap_copies_cause() {
    let remote = thread::spawn(|| Fault::adopt(io::Error::other("socket closed")))
        .join()
        .unwrap();

    let local = Fault::adopt(remote);
    let cause = local.cause().unwrap();
    assert_eq!(cause.type_name(), "std::io::error::Error");
    assert_eq!(cause.message(), Some("socket closed"));
}

#[test]
fn cross_thread_wrap_starts_fresh_snapshots() {
    let remote = thread::spawn(|| Fault::new("remote").with_snap("remote_only", true))
        .join()
        .unwrap();

    let local = Fault::adopt(remote);
    assert!(local.frames().iter().all(|f| !f.has_snapshots()));
}

// ============================================================================
// Foreign failures
// ============================================================================

#[test]
fn traced_failure_keeps_its_origin_frames() {
    let origin: RawStack = vec![
        SourceLocation::new("app::db", "d3", 30),
        SourceLocation::new("app::db", "d2", 20),
        SourceLocation::new("app::db", "d1", 10),
        SourceLocation::new("app", "d0", 1),
    ]
    .into();

    let fault = Fault::adopt(Traced::from_parts("app::db::DbError", "timeout", origin));

    let functions: Vec<_> = fault
        .frames()
        .iter()
        .map(|f| f.location().function().unwrap())
        .collect();
    assert_eq!(functions, vec!["d3", "d2", "d1", "d0"]);
    assert_eq!(fault.frames()[0].index().get(), Some(3));
    assert_eq!(fault.message(), None);

    let cause = fault.cause().unwrap();
    assert_eq!(cause.type_name(), "app::db::DbError");
    assert_eq!(cause.message(), Some("timeout"));
}

#[inline(never)]
fn fail_at_origin() -> Result<(), Traced> {
    Err(Traced::capture(StoreError::NotFound(7)))
}

#[test]
fn traced_capture_starts_at_raising_function() {
    let traced = fail_at_origin().unwrap_err();
    let fault = Fault::adopt(traced);

    assert!(fault.frame_count() > 0);
    let top = fault.frames()[0].location();
    if top.is_resolved() {
        assert_eq!(top.function(), Some("fail_at_origin"));
    }

    let cause = fault.cause().unwrap();
    assert!(cause.type_name().ends_with("StoreError"));
    assert_eq!(cause.message(), Some("record 7 not found"));
}

#[test]
fn plain_error_frames_start_at_adoption_site() {
    let fault = deny_write();

    let cause = fault.cause().unwrap();
    assert_eq!(cause.type_name(), "std::io::error::Error");
    assert_eq!(cause.message(), Some("read-only"));

    let top = fault.frames()[0].location();
    if top.is_resolved() {
        assert_eq!(top.function(), Some("deny_write"));
        assert!(!fault.frames().iter().any(|f| f.location().declared_in(Fault::BOUNDARY)));
    }
}

#[test]
fn thiserror_source_chain_is_flattened_to_message() {
    let err = StoreError::from(io::Error::other("disk gone"));
    let fault = Fault::adopt(err);
    let cause = fault.cause().unwrap();
    assert_eq!(cause.message(), Some("storage unavailable"));
}

#[test]
fn traced_with_empty_stack_yields_no_frames() {
    let fault = Fault::adopt(Traced::from_parts("app::Lost", "no stack", RawStack::new()));
    assert_eq!(fault.frame_count(), 0);
    assert!(fault.render().contains("Cause: app::Lost. Msg: no stack. "));
}

// ============================================================================
// Absent failures
// ============================================================================

#[test]
fn adopt_none_gives_fresh_fault() {
    let fault = Fault::adopt_opt(None::<io::Error>);
    assert_eq!(fault.message(), None);
    assert!(fault.cause().is_none());
    assert!(fault.frame_count() > 0);
}

#[test]
fn adopt_some_matches_adopt() {
    let fault = Fault::adopt_opt(Some(StoreError::NotFound(1)));
    assert_eq!(fault.cause().unwrap().message(), Some("record 1 not found"));
}

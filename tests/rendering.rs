//! Render output: header layout, frame lines, custom formatters, and the
//! guarantee that rendering never fails.

use snaptrace::{
    CapturedFrame, Fault, FaultFormatter, RawStack, RenderOptions, SourceLocation, Traced,
};
use std::fmt;

fn fault_from(locations: Vec<SourceLocation>) -> Fault {
    Fault::adopt(Traced::from_parts(
        "app::Failure",
        "went wrong",
        RawStack::from(locations),
    ))
}

// ============================================================================
// Plain format
// ============================================================================

#[test]
fn full_render_layout() -> anyhow::Result<()> {
    let mut fault = fault_from(vec![
        SourceLocation::new("app::db", "fetch", 41).with_file("src/db.rs"),
        SourceLocation::new("app::orders", "load", 12).with_file("src/orders.rs"),
        SourceLocation::new("app", "main", 8),
    ]);
    // No frame of this test is among the synthetic frames, so snapshots go to
    // the most recent one.
    fault.snap("jj", 159);
    fault.snap_opt("data", None::<String>);

    let text = fault.render();
    let lines: Vec<_> = text.lines().collect();
    anyhow::ensure!(lines.len() == 4, "unexpected render:\n{text}");

    let header = format!(
        "snaptrace::fault::Fault: -:[{}]:- Thread: {:?}. Cause: app::Failure. Msg: went wrong. ",
        fault.diagnostic_token(),
        fault.thread_id()
    );
    assert_eq!(lines[0], header);
    assert_eq!(lines[1], "->> 2:app::db::fetch[src/db.rs:41]: [jj=159][data=None]");
    assert_eq!(lines[2], "->> 1:app::orders::load[src/orders.rs:12]");
    assert_eq!(lines[3], "->> 0:app::main[8]");
    Ok(())
}

#[test]
fn unresolved_locations_render_placeholders() {
    let fault = fault_from(vec![
        SourceLocation::unresolved(),
        SourceLocation::from_symbol("app::worker::run"),
    ]);
    let text = fault.render();
    assert!(text.contains("->> 1:<unknown>[?]"));
    assert!(text.contains("->> 0:app::worker::run[?]"));
}

#[test]
fn trait_method_locations_render_qualified() {
    let fault = fault_from(vec![
        SourceLocation::new("app::Pool", "open", 3)
            .with_trait("app::Connect")
            .with_file("src/pool.rs"),
    ]);
    assert!(fault.render().contains("->> 0:<app::Pool as app::Connect>::open[src/pool.rs:3]"));
}

#[test]
fn display_matches_render() {
    let fault = Fault::new("shown");
    assert_eq!(fault.to_string(), fault.render());
}

#[test]
fn debug_is_structured() {
    let fault = Fault::new("debugged");
    let debug = format!("{:?}", fault);
    assert!(debug.starts_with("Fault {"));
    assert!(debug.contains("message: Some(\"debugged\")"));
    assert!(debug.contains(&format!("token: {}", fault.diagnostic_token())));
}

#[test]
fn summary_is_header_only() {
    let fault = Fault::new("short");
    let summary = fault.summary();
    assert!(!summary.contains('\n'));
    assert!(summary.contains("short. "));
    assert!(!summary.contains("->> "));
}

#[test]
fn fault_converts_into_anyhow() -> anyhow::Result<()> {
    fn fails() -> Result<(), Fault> {
        Err(Fault::new("into anyhow"))
    }
    let err = fails().map_err(anyhow::Error::from).unwrap_err();
    let fault = err.downcast_ref::<Fault>();
    anyhow::ensure!(fault.is_some(), "anyhow lost the fault");
    assert_eq!(fault.and_then(Fault::message), Some("into anyhow"));
    Ok(())
}

// ============================================================================
// Custom formatters
// ============================================================================

struct Indented;

impl FaultFormatter for Indented {
    fn write_header(&self, fault: &Fault, out: &mut dyn fmt::Write) -> fmt::Result {
        writeln!(out, "fault #{}", fault.diagnostic_token())
    }

    fn write_frame(&self, frame: &CapturedFrame, out: &mut dyn fmt::Write) -> fmt::Result {
        writeln!(
            out,
            "    {} ({} snapshots)",
            frame.location().function().unwrap_or("?"),
            frame.snapshots().len()
        )
    }
}

#[test]
fn custom_formatter_controls_layout() {
    let fault = fault_from(vec![
        SourceLocation::new("app", "inner", 2),
        SourceLocation::new("app", "outer", 1),
    ])
    .with_snap("k", "v");

    let text = fault.render_using(&RenderOptions::new(), &Indented);
    let expected = format!(
        "fault #{}\n    inner (1 snapshots)\n    outer (0 snapshots)\n",
        fault.diagnostic_token()
    );
    assert_eq!(text, expected);
}

#[test]
fn custom_formatter_respects_bound() {
    let fault = fault_from(
        (0..10)
            .map(|n| SourceLocation::new("app", format!("f{n}"), n))
            .collect(),
    );
    let text = fault.render_using(&RenderOptions::new().with_max_frames(2), &Indented);
    assert_eq!(text.lines().count(), 3);
}

// ============================================================================
// Failure containment
// ============================================================================

struct Refusing;

impl FaultFormatter for Refusing {
    fn write_frame(&self, _frame: &CapturedFrame, _out: &mut dyn fmt::Write) -> fmt::Result {
        Err(fmt::Error)
    }
}

struct Panicking;

impl FaultFormatter for Panicking {
    fn write_header(&self, _fault: &Fault, _out: &mut dyn fmt::Write) -> fmt::Result {
        panic!("header exploded")
    }
}

#[test]
fn formatter_error_yields_fallback() {
    let fault = Fault::new("unrenderable");
    let text = fault.render_using(&RenderOptions::new(), &Refusing);
    assert_eq!(text, "failed to render fault: formatter returned an error");
}

#[test]
fn formatter_panic_yields_fallback() {
    let fault = Fault::new("unrenderable");
    let text = fault.render_using(&RenderOptions::new(), &Panicking);
    assert_eq!(text, "failed to render fault: formatter panicked: header exploded");
}

#[test]
fn failing_value_display_does_not_break_render() {
    struct Broken;
    impl fmt::Display for Broken {
        fn fmt(&self, _f: &mut fmt::Formatter<'_>) -> fmt::Result {
            Err(fmt::Error)
        }
    }

    let mut fault = Fault::new("value");
    fault.snap("broken", Broken);
    fault.snap("after", 1);
    assert!(fault.render().contains("[broken=<unprintable>][after=1]"));
}

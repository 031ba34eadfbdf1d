//! Integration tests for the public CloudBuilder and CloudEngine API
//!
//! These tests drive the crate the way a host application would: through
//! the builder, a session, and a custom render surface.

use std::collections::BTreeMap;

use cumulus::{
    CloudBuilder, CloudEngine, CloudSession, CumulusError, WordUpdate,
    config::AppConfig,
    geometry::{Bounds, Size},
    surface::{RenderSurface, SurfaceError},
};

/// A surface with fixed-size glyphs that logs every call.
#[derive(Default)]
struct RecordingSurface {
    shown: BTreeMap<String, Bounds>,
    calls: Vec<String>,
    refuse: Option<String>,
}

impl RenderSurface for RecordingSurface {
    fn measure(&self, name: &str, count: i64) -> Size {
        Size::new(10.0 * name.len() as f32, 12.0 + 2.0 * count as f32)
    }

    fn create_element(&mut self, name: &str, _count: i64) -> Result<(), SurfaceError> {
        self.calls.push(format!("create {name}"));
        if self.refuse.as_deref() == Some(name) {
            return Err(SurfaceError::Rejected {
                name: name.to_string(),
                reason: "refused by test".to_string(),
            });
        }
        Ok(())
    }

    fn show_element(&mut self, name: &str, _count: i64, bounds: Bounds) {
        self.shown.insert(name.to_string(), bounds);
    }

    fn destroy_element(&mut self, name: &str) {
        self.calls.push(format!("destroy {name}"));
        self.shown.remove(name);
    }
}

fn engine_with(surface: RecordingSurface) -> CloudEngine<RecordingSurface> {
    CloudBuilder::default()
        .build_engine_with_size(Size::new(1000.0, 1000.0), surface)
        .expect("default configuration is valid")
}

#[test]
fn test_builder_parse_and_replay() {
    let builder = CloudBuilder::new(AppConfig::default());
    let commands = builder
        .parse("# session\nrust rust*2 cloud\n-cloud\n")
        .expect("Failed to parse transcript");

    let snapshot = builder.replay(&commands).expect("Failed to replay");

    assert_eq!(snapshot.words.len(), 1);
    let rust = snapshot.word("rust").expect("rust should be tracked");
    assert_eq!(rust.count, 3);
    assert!(rust.bounds.is_some());
}

#[test]
fn test_builder_parse_error_keeps_source() {
    let builder = CloudBuilder::default();
    let source = "ok\n!unknown\n";

    match builder.parse(source) {
        Err(CumulusError::Transcript { err, src }) => {
            assert_eq!(src, source);
            assert_eq!(err.line(), 2);
        }
        other => panic!("expected transcript error, got {other:?}"),
    }
}

#[test]
fn test_surface_receives_create_show_destroy() {
    let mut engine = engine_with(RecordingSurface::default());

    engine.add_word("first");
    engine.add_word("second");
    assert!(engine.surface().shown.contains_key("first"));
    assert!(engine.surface().shown.contains_key("second"));

    engine.remove_word_named("first");
    assert_eq!(
        engine.surface().calls,
        vec!["create first", "create second", "destroy first"]
    );
    assert!(!engine.surface().shown.contains_key("first"));
}

#[test]
fn test_shown_bounds_do_not_overlap() {
    let mut engine = engine_with(RecordingSurface::default());
    let text = "the quick brown fox jumps over the lazy dog while the cat sleeps \
                and the quick dog barks at the brown cat";
    for word in cumulus::words::tokenize(text) {
        engine.add_word(&word);
    }

    let shown: Vec<_> = engine.surface().shown.values().copied().collect();
    assert_eq!(shown.len(), engine.len());
    for (i, a) in shown.iter().enumerate() {
        for b in &shown[i + 1..] {
            assert!(!a.intersects(b), "{a:?} overlaps {b:?}");
        }
    }
    assert_eq!(engine.check_invariants(), Ok(()));
}

#[test]
fn test_refused_word_is_tracked_but_not_shown() {
    let surface = RecordingSurface {
        refuse: Some("shy".to_string()),
        ..RecordingSurface::default()
    };
    let mut engine = engine_with(surface);

    let update = engine.add_word("shy");

    assert!(matches!(update, WordUpdate::Inserted { attached: false, .. }));
    assert!(engine.contains_word("shy"));
    assert!(!engine.surface().shown.contains_key("shy"));
    assert_eq!(engine.clusters().count(), 0);
    assert_eq!(engine.check_invariants(), Ok(()));
}

#[test]
fn test_session_lifecycle() {
    let config = AppConfig::default();
    let mut session = CloudSession::new();

    let engine = session
        .create_instance(
            Size::new(400.0, 400.0),
            RecordingSurface::default(),
            &config,
        )
        .expect("Failed to create engine");
    engine.add_word("persisted");

    let again = session
        .create_instance(
            Size::new(400.0, 400.0),
            RecordingSurface::default(),
            &config,
        )
        .expect("Failed to get engine");
    assert!(again.contains_word("persisted"));

    let engine = session.destroy_instance().expect("engine should be live");
    assert_eq!(engine.len(), 1);
    assert!(session.instance().is_none());
}

#[test]
fn test_snapshot_json_shape() {
    let builder = CloudBuilder::default();
    let commands = builder.parse("alpha beta*2\n").expect("Failed to parse");
    let snapshot = builder.replay(&commands).expect("Failed to replay");

    let json = snapshot.to_json_pretty().expect("Failed to serialize");

    assert!(json.contains("\"layout\""));
    assert!(json.contains("\"words\""));
    assert!(json.contains("\"name\": \"beta\""));
    assert!(json.contains("\"top\""));
}

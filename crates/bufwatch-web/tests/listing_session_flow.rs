//! Listing JSON through to painted pixels, the way a JS host drives it.

use bufwatch_core::{
    Admission, Config, DropReason, EntityId, EntityKind, PixelSurface, TraceEvent, encode_frame,
};
use bufwatch_web::{HostDriver, parse_listing};
use proptest::prelude::*;

const FIRST_FETCH: &str = r#"[
    {"oid": 16397, "relname": "pgbench_accounts", "total_blocks": 1640, "relfilenode": 16397, "relkind": "r"},
    {"oid": 16405, "relname": "pgbench_accounts_pkey", "total_blocks": 276, "relfilenode": 16405, "relkind": "i"},
    {"oid": 16400, "relname": "pgbench_branches", "total_blocks": 0, "relfilenode": 16400, "relkind": "r"}
]"#;

const SECOND_FETCH: &str = r#"[
    {"oid": 16397, "relname": "pgbench_accounts", "total_blocks": 1700, "relfilenode": 16397, "relkind": "r"},
    {"oid": 16400, "relname": "pgbench_branches", "total_blocks": 1, "relfilenode": 16400, "relkind": "r"}
]"#;

fn mounted_driver() -> HostDriver<PixelSurface> {
    let mut driver = HostDriver::new(Config::default());
    driver.set_entities(FIRST_FETCH).expect("listing parses");
    for id in driver.select_all() {
        driver.mount(id, PixelSurface::new(400)).expect("mounts");
    }
    driver.connection_opened(0.0);
    driver
}

fn frame(entity: u32, block: u32) -> Vec<u8> {
    encode_frame(&TraceEvent::unclassified(EntityId(entity), block))
}

#[test]
fn first_fetch_mounts_all_relations() {
    let driver = mounted_driver();
    let session = driver.session();
    assert_eq!(session.canvases().len(), 3);

    let indexes: Vec<_> = session
        .registry()
        .indexes()
        .iter()
        .map(|e| e.name.clone())
        .collect();
    assert_eq!(indexes, ["pgbench_accounts_pkey"]);

    // An empty relation still gets one cell.
    let branches = session.geometry_for(EntityId(16400)).expect("mounted");
    assert_eq!(branches.total_blocks(), 1);
    assert_eq!(branches.surface_height(), 16);
}

#[test]
fn highlight_paints_then_fades_to_neutral() {
    let mut driver = mounted_driver();
    let palette = driver.session().config().palette;

    assert_eq!(driver.feed(&frame(16397, 70), 10.0), Some(Admission::Lit));
    let pixel = |driver: &HostDriver<PixelSurface>| {
        let canvas = driver.session().canvases().get(EntityId(16397)).expect("mounted");
        // Block 70 on a 63-wide grid: row 1, col 7.
        let rect = canvas.geometry().cell_rect(70);
        assert_eq!((rect.x, rect.y), (10 + 7 * 6, 10 + 6));
        canvas.surface().pixel(rect.x, rect.y)
    };
    assert_eq!(pixel(&driver), Some(palette.highlight));

    driver.tick(509.0);
    assert_eq!(pixel(&driver), Some(palette.highlight));
    driver.tick(510.0);
    assert_eq!(pixel(&driver), Some(palette.neutral));
}

#[test]
fn refetch_prunes_and_relays_out() {
    let mut driver = mounted_driver();
    driver.feed(&frame(16405, 1), 0.0);
    driver.feed(&frame(16397, 1), 0.0);

    let outcome = driver.set_entities(SECOND_FETCH).expect("listing parses");
    assert_eq!(outcome.removed, vec![EntityId(16405)]);
    assert_eq!(outcome.resized, vec![EntityId(16397)]);

    let session = driver.session();
    assert!(!session.is_selected(EntityId(16405)));
    assert_eq!(session.decay().pending_len(), 0);
    assert_eq!(
        session.geometry_for(EntityId(16397)).map(|g| g.total_blocks()),
        Some(1700)
    );
    assert_eq!(
        driver.feed(&frame(16405, 1), 1.0),
        Some(Admission::Dropped(DropReason::NotSelected))
    );
}

#[test]
fn reconnect_after_close_resumes_stream() {
    let mut driver = mounted_driver();
    driver.connection_closed();
    assert!(!driver.is_connected());
    assert_eq!(driver.feed(&frame(16397, 0), 5.0), None);

    driver.connection_opened(6.0);
    assert!(driver.is_connected());
    assert_eq!(driver.feed(&frame(16397, 0), 7.0), Some(Admission::Lit));
    assert_eq!(driver.session().connection().frames_accepted(), 1);
}

#[test]
fn teardown_reports_released_canvases() {
    let mut driver = mounted_driver();
    driver.feed(&frame(16397, 3), 0.0);
    let report = driver.teardown();
    assert_eq!(report.cancelled_decays, 1);
    assert_eq!(report.released_surfaces, 3);
}

// ── Listing invariants ──────────────────────────────────────────────────

fn row_strategy() -> impl Strategy<Value = (u32, i64, u32, char)> {
    (
        any::<u32>(),
        -5i64..5000,
        0u32..50,
        prop_oneof![Just('r'), Just('p'), Just('i'), Just('I')],
    )
}

proptest! {
    #[test]
    fn parsed_listing_is_clean(rows in proptest::collection::vec(row_strategy(), 0..40)) {
        let body = format!(
            "[{}]",
            rows.iter()
                .enumerate()
                .map(|(i, (oid, blocks, filenode, kind))| format!(
                    r#"{{"oid": {oid}, "relname": "rel_{i}", "total_blocks": {blocks}, "relfilenode": {filenode}, "relkind": "{kind}"}}"#
                ))
                .collect::<Vec<_>>()
                .join(",")
        );
        let entities = parse_listing(&body).unwrap();

        let mut ids = std::collections::HashSet::new();
        for entity in &entities {
            prop_assert!(entity.id.0 != 0);
            prop_assert!(entity.total_blocks >= 1);
            prop_assert!(ids.insert(entity.id), "duplicate {}", entity.id);
            prop_assert!(matches!(
                entity.kind,
                EntityKind::Table | EntityKind::PartitionedTable | EntityKind::Index | EntityKind::PartitionedIndex
            ));
        }
        let distinct_nonzero: std::collections::HashSet<_> =
            rows.iter().map(|row| row.2).filter(|&f| f != 0).collect();
        prop_assert_eq!(entities.len(), distinct_nonzero.len());
    }
}

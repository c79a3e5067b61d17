use std::hint::black_box;
use std::time::Duration;

use bufwatch_core::{
    Config, DeterministicClock, Entity, EntityId, EntityKind, PixelSurface, Session, TraceEvent,
    decode_frame, encode_frame,
};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};

const REL: EntityId = EntityId(16397);
const BLOCKS: u32 = 4096;

/// xorshift64 so the access pattern is stable across runs.
fn block_sequence(len: usize, hot_blocks: u32) -> Vec<u32> {
    let mut state = 0x9E37_79B9_7F4A_7C15u64;
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            (state % u64::from(hot_blocks)) as u32
        })
        .collect()
}

fn session() -> Session<PixelSurface, DeterministicClock> {
    let mut session = Session::new(Config::default(), DeterministicClock::new());
    session.replace_entities(vec![Entity::new(
        REL,
        16397,
        "pgbench_accounts",
        EntityKind::Table,
        BLOCKS,
    )]);
    session.select_all();
    session
        .mount(REL, PixelSurface::new(400).with_recording(false))
        .expect("mounts");
    session.connection_opened();
    session
}

fn bench_admit_and_expire(c: &mut Criterion) {
    let mut group = c.benchmark_group("decay/admit_expire");
    for hot_blocks in [16u32, 512, BLOCKS] {
        let blocks = block_sequence(10_000, hot_blocks);
        group.throughput(Throughput::Elements(blocks.len() as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("hot_{hot_blocks}")),
            &blocks,
            |b, blocks| {
                b.iter(|| {
                    let mut session = session();
                    // 10k events/s: one event every 100us, ticking each 16ms frame.
                    for (i, &block) in blocks.iter().enumerate() {
                        session.clock_mut().advance(Duration::from_micros(100));
                        black_box(session.on_event(TraceEvent::unclassified(REL, block)));
                        if i % 160 == 0 {
                            black_box(session.tick());
                        }
                    }
                    session.teardown()
                });
            },
        );
    }
    group.finish();
}

fn bench_frame_path(c: &mut Criterion) {
    let frames: Vec<Vec<u8>> = block_sequence(10_000, BLOCKS)
        .into_iter()
        .map(|block| encode_frame(&TraceEvent::unclassified(REL, block)))
        .collect();

    let mut group = c.benchmark_group("decay/frames");
    group.throughput(Throughput::Elements(frames.len() as u64));
    group.bench_function("decode_only", |b| {
        b.iter(|| {
            for frame in &frames {
                let _ = black_box(decode_frame(black_box(frame)));
            }
        });
    });
    group.bench_function("on_frame", |b| {
        b.iter(|| {
            let mut session = session();
            for frame in &frames {
                black_box(session.on_frame(frame));
            }
            session.teardown()
        });
    });
    group.finish();
}

criterion_group!(benches, bench_admit_and_expire, bench_frame_path);
criterion_main!(benches);

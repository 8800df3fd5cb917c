// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Performance benchmarks for songcast
//!
//! Run with: cargo bench
//!
//! These benchmarks measure:
//! - Markdown parsing throughput
//! - Session snapshot serialization (what every edit persists and broadcasts)
//! - Broadcast fan-out to live contexts

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use songcast::session::store::{from_json, to_json};
use songcast::song::parse;
use songcast::sync::{SyncHub, SyncMessage};
use songcast::Session;

/// Build a song with `verses` verses and a chorus after each
fn song_markdown(verses: usize) -> String {
    let mut md = String::from("# Benchmark Song\n\n");
    for v in 1..=verses {
        md.push_str(&format!("## Verse {}\n", v));
        for line in 0..4 {
            md.push_str(&format!("Line {} of verse {}\n", line, v));
        }
        md.push_str("\n## Chorus\nSing it again\nAnd once more\n\n");
    }
    md
}

fn session_with(songs: usize) -> Session {
    let md = song_markdown(4);
    Session {
        songs: (0..songs).map(|i| parse(&md, format!("song-{}", i))).collect(),
        current_song_id: Some("song-0".to_string()),
        current_part_index: 0,
    }
}

/// Benchmark parsing songs of growing length
fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");

    for verses in [2, 8, 32].iter() {
        let md = song_markdown(*verses);
        group.bench_with_input(BenchmarkId::from_parameter(verses), &md, |b, md| {
            b.iter(|| black_box(parse(black_box(md), "bench")))
        });
    }

    group.finish();
}

/// Benchmark session JSON encode/decode
fn bench_session_json(c: &mut Criterion) {
    let mut group = c.benchmark_group("session_json");

    for songs in [10, 100].iter() {
        let session = session_with(*songs);
        let json = to_json(&session).unwrap();

        group.bench_with_input(BenchmarkId::new("encode", songs), &session, |b, session| {
            b.iter(|| black_box(to_json(black_box(session)).unwrap()))
        });
        group.bench_with_input(BenchmarkId::new("decode", songs), &json, |b, json| {
            b.iter(|| black_box(from_json(black_box(json)).unwrap()))
        });
    }

    group.finish();
}

/// Benchmark snapshot fan-out to several live contexts
fn bench_broadcast(c: &mut Criterion) {
    let hub = SyncHub::new();
    let director = hub.open("bench");
    let mut lives: Vec<_> = (0..4).map(|_| hub.open("bench").subscribe()).collect();
    let session = session_with(20);

    c.bench_function("broadcast_snapshot_to_4", |b| {
        b.iter(|| {
            director.send(SyncMessage::session_updated(&session));
            for live in lives.iter_mut() {
                black_box(live.recv_all());
            }
        })
    });
}

criterion_group!(benches, bench_parse, bench_session_json, bench_broadcast);
criterion_main!(benches);

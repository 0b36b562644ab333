use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use coda_chess::game_state::board::Board;
use coda_chess::search::searcher::{SearchConfig, Searcher};

#[derive(Clone, Copy)]
struct SearchCase {
    name: &'static str,
    fen: &'static str,
}

const CASES: &[SearchCase] = &[
    SearchCase {
        name: "startpos",
        fen: "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
    },
    SearchCase {
        name: "classical_mid",
        fen: "r4rk1/1pp1qppp/p1np1n2/2b1p1B1/2B1P1b1/P1NP1N2/1PP1QPPP/R4RK1 w - - 0 10",
    },
    SearchCase {
        name: "tactical",
        fen: "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
    },
    SearchCase {
        name: "end_kpk",
        fen: "8/8/8/8/8/4k3/4P3/4K3 w - - 0 1",
    },
];

fn bench_fixed_depth_search(c: &mut Criterion) {
    let depth = std::env::var("CODA_SEARCH_DEPTH")
        .ok()
        .and_then(|v| v.parse::<u8>().ok())
        .unwrap_or(4)
        .max(1);

    let mut group = c.benchmark_group("fixed_depth_search");
    group.warm_up_time(Duration::from_secs(1));
    group.measurement_time(Duration::from_secs(4));
    group.sample_size(20);

    let config = SearchConfig {
        max_depth: depth,
        tt_size_mb: 16,
        ..SearchConfig::default()
    };

    for case in CASES {
        let board = Board::from_fen(case.fen).expect("benchmark FEN should parse");
        group.bench_with_input(BenchmarkId::new(case.name, format!("d{depth}")), &board, |b, board| {
            b.iter(|| {
                // A fresh searcher per run keeps the table cold.
                let mut searcher = Searcher::new(board.clone(), config);
                let report = searcher.start_search();
                assert!(report.best_move.is_some());
                black_box(report.nodes)
            });
        });
    }

    group.finish();
}

criterion_group!(search_benches, bench_fixed_depth_search);
criterion_main!(search_benches);

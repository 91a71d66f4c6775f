//! Control cycle benchmark: policy decision and a full processing cycle
//! (poll → decide → scoped state write → log enqueue).

use criterion::{Criterion, criterion_group, criterion_main};
use farm_common::channel::ReadingChannel;
use farm_common::state::{FarmState, StateHandle};
use farm_common::types::{Reading, Thresholds};
use farm_control::{AlertRules, Controller, decide, log_channel};
use std::hint::black_box;
use std::time::Duration;

fn bench_decide(c: &mut Criterion) {
    let reading = Reading::now(26.4, 72.1);
    let thresholds = Thresholds {
        temp: 28,
        humidity: 70,
    };
    c.bench_function("policy_decide", |b| {
        b.iter(|| decide(black_box(&reading), black_box(thresholds)))
    });
}

fn bench_alert_rules(c: &mut Criterion) {
    let rules = AlertRules::default();
    let thresholds = Thresholds {
        temp: 28,
        humidity: 70,
    };
    c.bench_function("alert_rules_active", |b| {
        b.iter(|| rules.active(black_box(34.2), black_box(81.0), black_box(thresholds)))
    });
}

fn bench_processing_cycle(c: &mut Criterion) {
    let state = StateHandle::new(FarmState::default());
    let (_channel, tx, rx) = ReadingChannel::new();
    // Queue saturates after the first 64 iterations; the drop-oldest path is
    // part of the steady state being measured.
    let (log_tx, _log_rx) = log_channel(64);
    let mut controller = Controller::new(state, rx, log_tx, Duration::from_secs(1));
    let reading = Reading::now(26.4, 72.1);

    c.bench_function("controller_cycle_with_reading", |b| {
        b.iter(|| {
            let _ = tx.send(reading);
            black_box(controller.run_cycle())
        })
    });
}

criterion_group!(benches, bench_decide, bench_alert_rules, bench_processing_cycle);
criterion_main!(benches);

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use common::{build_harness, build_harness_with, make_signal};
use signalbot::supervisor::Supervisor;

/// A recovery already in flight makes a second trigger a no-op.
#[tokio::test]
async fn recovery_is_single_flight() {
    let h = build_harness(&["Fortune Tiger"]);
    let supervisor = Supervisor::new(Arc::clone(&h.orchestrator));

    h.bot.recovering.store(true, Ordering::SeqCst);
    supervisor.attempt_auto_recovery().await;

    assert_eq!(h.bot.recovery_attempts.load(Ordering::SeqCst), 0);
    assert_eq!(h.source.reinit_count.load(Ordering::SeqCst), 0);
}

/// A successful recovery resets the strike and empty-cycle counters and
/// forces a cycle through the regular delivery path.
#[tokio::test]
async fn successful_recovery_resets_counters_and_forces_cycle() {
    let h = build_harness(&["Fortune Tiger"]);
    let supervisor = Supervisor::new(Arc::clone(&h.orchestrator));
    supervisor.spawn_scheduler();

    h.bot.consecutive_empty_random.store(1, Ordering::SeqCst);
    h.source.healthy.store(false, Ordering::SeqCst);
    h.source.push_batch(vec![make_signal("Fortune Tiger", 92.0)]);

    supervisor.attempt_auto_recovery().await;

    assert_eq!(h.source.reinit_count.load(Ordering::SeqCst), 1);
    assert!(h.source.healthy.load(Ordering::SeqCst));
    assert_eq!(h.bot.recovery_attempts.load(Ordering::SeqCst), 0);
    assert_eq!(h.bot.consecutive_empty_random.load(Ordering::SeqCst), 0);
    assert_eq!(h.whatsapp.sent_count(), 1);
    assert!(!h.bot.recovering.load(Ordering::SeqCst));

    supervisor.shutdown();
}

/// Five consecutive failed recoveries escalate to a full restart, which
/// keeps retrying the browser rebuild until it succeeds.
#[tokio::test]
async fn fifth_failed_recovery_triggers_full_restart() {
    let h = build_harness(&["Fortune Tiger"]);
    let supervisor = Supervisor::new(Arc::clone(&h.orchestrator));

    h.source.healthy.store(false, Ordering::SeqCst);
    // Attempts 1-5 fail, the restart's first rebuild fails, the retry works.
    h.source.reinit_failures.store(6, Ordering::SeqCst);

    for _ in 0..5 {
        supervisor.attempt_auto_recovery().await;
    }

    assert_eq!(h.source.reinit_count.load(Ordering::SeqCst), 7);
    assert_eq!(h.bot.recovery_attempts.load(Ordering::SeqCst), 0);
    assert!(supervisor.scheduler_alive());
    assert!(!h.bot.recovering.load(Ordering::SeqCst));

    supervisor.shutdown();
}

/// Forced-send liveness: with the pipeline quiet past the threshold, the
/// supervisor forces a delivery without waiting for a clock boundary.
#[tokio::test(start_paused = true)]
async fn forced_send_fires_after_quiet_period() {
    let h = build_harness_with(&["Fortune Tiger"], |c| {
        c.supervisor_tick_secs = 1;
        c.forced_send_period_secs = 5;
        // Keep the other tiers out of the way.
        c.health_check_period_secs = 100_000;
        c.watchdog_period_secs = 100_000;
    });
    h.source.push_batch(vec![make_signal("Fortune Tiger", 92.0)]);

    let supervisor = Supervisor::new(Arc::clone(&h.orchestrator));
    let task = tokio::spawn(Arc::clone(&supervisor).run());

    // Past the forced-send period; nothing was ever sent, so it is stale.
    tokio::time::sleep(Duration::from_secs(8)).await;

    assert_eq!(h.whatsapp.sent_count(), 1);
    assert!(h.bot.last_send().is_some());

    task.abort();
}

/// A paused bot never gets forced sends.
#[tokio::test(start_paused = true)]
async fn forced_send_respects_pause() {
    let h = build_harness_with(&["Fortune Tiger"], |c| {
        c.supervisor_tick_secs = 1;
        c.forced_send_period_secs = 5;
        c.health_check_period_secs = 100_000;
        c.watchdog_period_secs = 100_000;
    });
    h.store.set_running(false);
    h.source.push_batch(vec![make_signal("Fortune Tiger", 92.0)]);

    let supervisor = Supervisor::new(Arc::clone(&h.orchestrator));
    let task = tokio::spawn(Arc::clone(&supervisor).run());

    tokio::time::sleep(Duration::from_secs(8)).await;

    assert_eq!(h.whatsapp.sent_count(), 0);
    assert_eq!(h.source.fetch_count.load(Ordering::SeqCst), 0);

    task.abort();
}

/// The health tier respawns a dead scheduler task.
#[tokio::test(start_paused = true)]
async fn health_tier_respawns_dead_scheduler() {
    let h = build_harness_with(&["Fortune Tiger"], |c| {
        c.supervisor_tick_secs = 1;
        c.health_check_period_secs = 3;
        c.watchdog_period_secs = 100_000;
        c.forced_send_period_secs = 100_000;
        // Fresh-enough send below keeps the staleness probe quiet.
        c.health_stale_secs = 100_000;
    });
    h.bot.mark_send();

    let supervisor = Supervisor::new(Arc::clone(&h.orchestrator));
    assert!(!supervisor.scheduler_alive());

    let task = tokio::spawn(Arc::clone(&supervisor).run());
    tokio::time::sleep(Duration::from_secs(5)).await;

    assert!(supervisor.scheduler_alive());
    assert_eq!(h.bot.recovery_attempts.load(Ordering::SeqCst), 0);

    task.abort();
    supervisor.shutdown();
}

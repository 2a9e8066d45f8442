//! # Background Workers
//!
//! Periodic lifecycle scans and the reminder dispatcher.
//! Each worker stops when the shutdown channel flips to `true`.

use crate::state::ReminderReceiver;
use chrono::Utc;
use curb_core::{LifecycleScanner, ReminderTask};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Run the expiry and alert scans every `period`.
pub fn spawn_scanners(
    scanner: LifecycleScanner,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(period_secs = period.as_secs(), "Lifecycle scanner started");

        loop {
            tokio::select! {
                _ = shutdown.changed() => break,
                _ = ticker.tick() => {}
            }
            run_scan(&scanner).await;
        }

        info!("Lifecycle scanner stopped");
    })
}

/// One pass of both scans; failures are logged and retried next tick.
pub async fn run_scan(scanner: &LifecycleScanner) {
    let now = Utc::now();

    match scanner.check_expired_events(now).await {
        Ok(expired) => debug!(count = expired.len(), "Expiry scan complete"),
        Err(e) => warn!(error = %e, "Expiry scan failed"),
    }

    match scanner.check_ongoing_events(now).await {
        Ok(scan) => debug!(alerted = scan.alerted, enqueued = scan.enqueued, "Alert scan complete"),
        Err(e) => warn!(error = %e, "Alert scan failed"),
    }
}

/// Hand queued reminders off until shutdown, then close the queue and
/// deliver whatever is still buffered. Delivery transport is external;
/// the hand-off is logged here. Resolves to the number dispatched.
pub fn spawn_reminder_dispatcher(
    mut reminders: ReminderReceiver,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<usize> {
    tokio::spawn(async move {
        let mut dispatched = 0;
        loop {
            tokio::select! {
                _ = shutdown.changed() => break,
                task = reminders.recv() => match task {
                    Some(task) => {
                        dispatch(&task);
                        dispatched += 1;
                    }
                    None => break,
                },
            }
        }

        reminders.close();
        while let Some(task) = reminders.recv().await {
            dispatch(&task);
            dispatched += 1;
        }

        info!(dispatched, "Reminder dispatcher stopped");
        dispatched
    })
}

fn dispatch(task: &ReminderTask) {
    info!(
        session_id = %task.session_id,
        user_id = %task.user_id,
        zone = %task.zone,
        plate = %task.vehicle_plate,
        stop = %task.stop_time_utc,
        minutes_before = task.alert_before_minutes,
        "Dispatching expiration reminder"
    );
}

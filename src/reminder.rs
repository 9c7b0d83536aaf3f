use crate::model::ProgressState;
use crate::storage::{load_state, JsonFileStore};
use chrono::{Duration as ChronoDuration, Local, NaiveDate, NaiveDateTime, NaiveTime};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Today at `at` if that is still ahead of `now`, otherwise tomorrow.
pub(crate) fn next_reminder_at(now: NaiveDateTime, at: NaiveTime) -> NaiveDateTime {
    let today = now.date().and_time(at);
    if today > now {
        today
    } else {
        today + ChronoDuration::days(1)
    }
}

pub(crate) fn should_remind(state: &ProgressState, today: NaiveDate) -> bool {
    state.settings.notifications.enabled && state.last_log_date != Some(today)
}

/// Fires a check-in notification once a day at the configured time. The save
/// is re-read on every wake-up so settings changes and resets apply without a
/// restart.
pub(crate) fn spawn_daily(store: JsonFileStore) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let at = match load_state(&store) {
                Ok(st) => st.settings.notifications.time,
                Err(e) => {
                    warn!(error = %e, "reminder could not read progress");
                    ProgressState::default().settings.notifications.time
                }
            };
            let now = Local::now().naive_local();
            let next = next_reminder_at(now, at);
            let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
            debug!(%next, "next daily reminder");
            tokio::time::sleep(wait).await;

            let today = Local::now().date_naive();
            match load_state(&store) {
                Ok(st) if should_remind(&st, today) => {
                    info!("Daily check-in: time to log your habits and continue your journey!");
                }
                Ok(_) => debug!("reminder skipped"),
                Err(e) => warn!(error = %e, "reminder could not read progress"),
            }
        }
    })
}

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Timelike, Utc};
use serde::Deserialize;
use tokio::task::JoinHandle;

use notisweep_core::{NotificationApi, SweepOutcome};

use crate::sweeper::Sweeper;

/// Default trigger: once an hour at minute 15.
pub const DEFAULT_CRON: &str = "15 * * * *";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScheduleError {
    #[error("expected 5 cron fields, got {0}")]
    FieldCount(usize),
    #[error("minute field {0:?} must be a number from 0 to 59")]
    InvalidMinute(String),
    #[error("only hourly schedules are supported; field {position} must be `*`, got {value:?}")]
    Unsupported { position: usize, value: String },
}

/// A cron expression of the form `M * * * *`: fire once an hour at minute `M`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HourlySchedule {
    minute: u32,
}

impl HourlySchedule {
    pub fn at_minute(minute: u32) -> Result<Self, ScheduleError> {
        if minute > 59 {
            return Err(ScheduleError::InvalidMinute(minute.to_string()));
        }
        Ok(Self { minute })
    }

    pub fn minute(&self) -> u32 {
        self.minute
    }

    /// First firing time strictly after `now`.
    pub fn next_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let into_hour = TimeDelta::minutes(i64::from(now.minute()))
            + TimeDelta::seconds(i64::from(now.second()))
            + TimeDelta::nanoseconds(i64::from(now.nanosecond()));
        let candidate = now - into_hour + TimeDelta::minutes(i64::from(self.minute));
        if candidate > now {
            candidate
        } else {
            candidate + TimeDelta::hours(1)
        }
    }

    /// Slot after one that just `fired`. Never repeats `fired` even if the
    /// wall clock reads slightly behind it, and skips slots missed while the
    /// process was stalled.
    pub fn following(&self, fired: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
        self.next_after(fired.max(now))
    }
}

impl Default for HourlySchedule {
    fn default() -> Self {
        Self { minute: 15 }
    }
}

impl FromStr for HourlySchedule {
    type Err = ScheduleError;

    fn from_str(expr: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = expr.split_whitespace().collect();
        if fields.len() != 5 {
            return Err(ScheduleError::FieldCount(fields.len()));
        }
        let minute = fields[0]
            .parse::<u32>()
            .map_err(|_| ScheduleError::InvalidMinute(fields[0].to_string()))?;
        if let Some((position, value)) = fields
            .iter()
            .enumerate()
            .skip(1)
            .find(|(_, f)| **f != "*")
        {
            return Err(ScheduleError::Unsupported {
                position: position + 1,
                value: value.to_string(),
            });
        }
        Self::at_minute(minute)
    }
}

impl fmt::Display for HourlySchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} * * * *", self.minute)
    }
}

/// When sweeps are triggered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// Only on the hourly timer.
    #[default]
    Scheduled,
    /// Once at startup.
    Once,
    /// At startup and on the timer.
    Both,
}

impl RunMode {
    pub fn runs_at_startup(self) -> bool {
        matches!(self, Self::Once | Self::Both)
    }

    pub fn runs_on_timer(self) -> bool {
        matches!(self, Self::Scheduled | Self::Both)
    }
}

impl FromStr for RunMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "scheduled" => Ok(Self::Scheduled),
            "once" => Ok(Self::Once),
            "both" => Ok(Self::Both),
            other => Err(format!("unknown run mode {other:?}")),
        }
    }
}

/// Run one sweep on its own task, logging the outcome.
pub fn spawn_sweep<A>(sweeper: Arc<Sweeper<A>>) -> JoinHandle<()>
where
    A: NotificationApi + 'static,
{
    tokio::spawn(async move {
        match sweeper.sweep().await {
            Ok(SweepOutcome::Completed(report)) if !report.is_clean() => {
                tracing::warn!(
                    run_id = %report.run_id,
                    failures = report.failures.len(),
                    "Sweep finished with failed items"
                );
            },
            Ok(_) => {},
            Err(e) => tracing::error!(error = %e, "Sweep failed"),
        }
    })
}

/// Fire a sweep at every tick of `schedule`, forever.
///
/// Each sweep runs on its own task so a slow sweep never delays the timer;
/// the sweeper itself skips triggers that overlap a running sweep.
pub fn spawn_scheduler<A>(sweeper: Arc<Sweeper<A>>, schedule: HourlySchedule) -> JoinHandle<()>
where
    A: NotificationApi + 'static,
{
    tokio::spawn(async move {
        tracing::info!(%schedule, "Scheduler started");
        let mut next = schedule.next_after(Utc::now());
        loop {
            let wait = (next - Utc::now()).to_std().unwrap_or_default();
            tracing::debug!(next = %next, "Next sweep scheduled");
            tokio::time::sleep(wait).await;

            tracing::info!("It's time! Running notification sweep.");
            spawn_sweep(Arc::clone(&sweeper));
            next = schedule.following(next, Utc::now());
        }
    })
}

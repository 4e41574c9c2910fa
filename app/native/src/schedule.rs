//! Schedule evaluation.
//!
//! Pure decision functions: given a playlist, the current time and the bucket
//! of its last fire, decide whether it fires now. Every schedule except
//! `Interval` compares coarse bucket keys (hour, day, arm time) instead of
//! elapsed time, so repeated polls and backwards clock moves never fire the
//! same bucket twice.

use std::time::Duration;

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveTime, TimeDelta, Timelike};
use serde::{Deserialize, Serialize};

use crate::playlist::{Playlist, ScheduleType, ValidationError};

/// Identifies the slot a fire belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum FireBucket {
    /// Interval schedules: the raw fire time.
    Instant { at: DateTime<FixedOffset> },
    /// Hourly schedules.
    Hour { date: NaiveDate, hour: u32 },
    /// Daily and custom schedules.
    Day { date: NaiveDate },
    /// On-launch schedules: the moment the playlist was armed.
    Launch { armed_at: DateTime<FixedOffset> },
}

impl FireBucket {
    /// Hour bucket containing `now`.
    #[must_use]
    pub fn hour_of(now: DateTime<FixedOffset>) -> Self {
        Self::Hour {
            date: now.date_naive(),
            hour: now.hour(),
        }
    }

    /// Day bucket containing `now`.
    #[must_use]
    pub fn day_of(now: DateTime<FixedOffset>) -> Self { Self::Day { date: now.date_naive() } }
}

/// Inputs the evaluator needs besides the playlist itself.
#[derive(Debug, Clone, Copy)]
pub struct EvalContext {
    /// Current time.
    pub now: DateTime<FixedOffset>,
    /// Worker polling cadence; bounds the daily fire window.
    pub poll_interval: Duration,
    /// When the worker armed this playlist (process start or enable).
    pub armed_at: DateTime<FixedOffset>,
}

/// Result of a schedule evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    /// Whether the playlist fires on this poll.
    pub fire: bool,
    /// Bucket to record if it does.
    pub bucket: FireBucket,
}

/// Decides whether `playlist` fires at `ctx.now`.
///
/// # Errors
///
/// Returns a [`ValidationError`] when the schedule is malformed; the caller
/// skips the playlist for this poll.
pub fn should_fire(
    playlist: &Playlist,
    ctx: &EvalContext,
    last_fired: Option<&FireBucket>,
) -> Result<Decision, ValidationError> {
    playlist.validate_schedule()?;
    let now = ctx.now;

    let decision = match playlist.schedule_type {
        ScheduleType::Interval => {
            let baseline = interval_baseline(playlist, ctx, last_fired);
            let elapsed = now.signed_duration_since(baseline);
            // A baseline in the future means the clock went backwards: fire once
            // to re-baseline rather than stalling until the clock catches up.
            let fire = elapsed < TimeDelta::zero() || elapsed >= interval(playlist);
            Decision {
                fire,
                bucket: FireBucket::Instant { at: now },
            }
        }
        ScheduleType::Hourly => {
            let bucket = FireBucket::hour_of(now);
            Decision {
                fire: last_fired != Some(&bucket),
                bucket,
            }
        }
        ScheduleType::Daily => {
            let time = playlist.required_schedule_time()?;
            daily_decision(now, time, ctx.poll_interval, last_fired)
        }
        ScheduleType::Custom => {
            let time = playlist.required_schedule_time()?;
            let mut decision = daily_decision(now, time, ctx.poll_interval, last_fired);
            decision.fire &= playlist.runs_on(now.weekday());
            decision
        }
        ScheduleType::OnLaunch => {
            let bucket = FireBucket::Launch { armed_at: ctx.armed_at };
            Decision {
                fire: last_fired != Some(&bucket),
                bucket,
            }
        }
    };

    Ok(decision)
}

/// Advisory estimate of the next fire time.
///
/// Returns `ctx.now` when the playlist is due, and `None` when it will not fire
/// again without a new enable transition (on-launch schedules that already fired).
///
/// # Errors
///
/// Returns a [`ValidationError`] when the schedule is malformed.
pub fn next_fire_estimate(
    playlist: &Playlist,
    ctx: &EvalContext,
    last_fired: Option<&FireBucket>,
) -> Result<Option<DateTime<FixedOffset>>, ValidationError> {
    if should_fire(playlist, ctx, last_fired)?.fire {
        return Ok(Some(ctx.now));
    }
    let now = ctx.now;

    let estimate = match playlist.schedule_type {
        ScheduleType::Interval => {
            interval_baseline(playlist, ctx, last_fired).checked_add_signed(interval(playlist))
        }
        ScheduleType::Hourly => {
            let top_of_hour = now.date_naive().and_hms_opt(now.hour(), 0, 0);
            top_of_hour
                .and_then(|naive| naive.and_local_timezone(*now.offset()).single())
                .map(|start| start + TimeDelta::hours(1))
        }
        ScheduleType::Daily | ScheduleType::Custom => {
            let time = playlist.required_schedule_time()?;
            (0..=7)
                .filter_map(|offset| now.date_naive().checked_add_days(chrono::Days::new(offset)))
                .filter(|date| {
                    playlist.schedule_type == ScheduleType::Daily
                        || playlist.runs_on(date.weekday())
                })
                .filter_map(|date| date.and_time(time).and_local_timezone(*now.offset()).single())
                .find(|candidate| *candidate > now)
        }
        ScheduleType::OnLaunch => None,
    };

    Ok(estimate)
}

/// Shared logic for daily and custom schedules.
///
/// Fires at the first poll on or after `time` while today's bucket is still
/// unfired, so a window missed to sleep, hibernate or a clock jump is caught
/// up later the same day. The bucket comparison limits that to one fire per
/// day. The `[time, time + poll)` window only tells on-time fires apart from
/// catch-up fires in the log.
fn daily_decision(
    now: DateTime<FixedOffset>,
    time: NaiveTime,
    poll_interval: Duration,
    last_fired: Option<&FireBucket>,
) -> Decision {
    let bucket = FireBucket::day_of(now);
    let current = now.time();
    let fire = last_fired != Some(&bucket) && current >= time;

    if fire {
        let window = TimeDelta::from_std(poll_interval).unwrap_or(TimeDelta::MAX);
        if current.signed_duration_since(time) >= window {
            tracing::debug!(%time, %now, "catching up on a missed daily window");
        }
    }

    Decision { fire, bucket }
}

/// Reference point for interval schedules: the later of the last fire and
/// the last enable, falling back to the arm time.
///
/// An enable stamped after `now` only counts until the first fire; after that
/// the recorded instant is the baseline, otherwise every poll would fire.
fn interval_baseline(
    playlist: &Playlist,
    ctx: &EvalContext,
    last_fired: Option<&FireBucket>,
) -> DateTime<FixedOffset> {
    let last_instant = match last_fired {
        Some(FireBucket::Instant { at }) => Some(*at),
        _ => None,
    };

    match (last_instant, playlist.enabled_at) {
        (Some(last), Some(enabled)) if enabled > ctx.now => last,
        (Some(last), Some(enabled)) => last.max(enabled),
        (Some(at), None) | (None, Some(at)) => at,
        (None, None) => ctx.armed_at,
    }
}

fn interval(playlist: &Playlist) -> TimeDelta {
    i64::try_from(playlist.interval_seconds)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .unwrap_or(TimeDelta::MAX)
}

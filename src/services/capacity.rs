//! Admission control for the skills queue.
//!
//! [`compute_status`] is pure: it reads the settings, the current list sizes and a clock
//! reading, and returns a [`CapacityDecision`]. Writing the sticky closed flag back to the
//! settings store is the caller's job when [`CapacityDecision::should_permanently_close`]
//! is set.

use chrono::{DateTime, Datelike, Local, TimeZone};
use serde::{Serialize, Serializer};
use utoipa::ToSchema;

use crate::dao::models::{QueueSettings, QueueSizes};

const MILLIS_PER_MINUTE: i64 = 60_000;

/// Why the queue is open or closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CapacityReason {
    /// Operator forced the queue open.
    Manual,
    /// The queue was closed earlier and stays closed.
    PermanentlyClosed,
    /// The cutoff setting could not be parsed; registration stays open.
    InvalidCutoff,
    /// The turnover setting is not a positive number of minutes; registration stays open.
    InvalidTurnover,
    /// The cutoff time has been reached.
    PastCutoff,
    /// Projected capacity is used up.
    CapacityFull,
    /// Slots are still available before the cutoff.
    CapacityAvailable,
}

impl CapacityReason {
    /// Wire name of the reason.
    pub fn as_str(&self) -> &'static str {
        match self {
            CapacityReason::Manual => "manual",
            CapacityReason::PermanentlyClosed => "permanently_closed",
            CapacityReason::InvalidCutoff => "invalid_cutoff",
            CapacityReason::InvalidTurnover => "invalid_turnover",
            CapacityReason::PastCutoff => "past_cutoff",
            CapacityReason::CapacityFull => "capacity_full",
            CapacityReason::CapacityAvailable => "capacity_available",
        }
    }
}

/// Remaining registrations; `Unlimited` never takes part in slot arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemainingSlots {
    /// No projected limit applies.
    Unlimited,
    /// This many more teams fit before the cutoff.
    Limited(u64),
}

impl Serialize for RemainingSlots {
    /// `Unlimited` is encoded as `null`, finite counts as numbers.
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            RemainingSlots::Unlimited => serializer.serialize_none(),
            RemainingSlots::Limited(slots) => serializer.serialize_u64(*slots),
        }
    }
}

/// Outcome of an admission check. Recomputed on every request, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CapacityDecision {
    /// Whether new teams may join the queue.
    pub is_open: bool,
    /// Rule that produced the decision.
    pub reason: CapacityReason,
    /// Slots left; `null` when unlimited.
    #[schema(value_type = Option<u64>)]
    pub remaining_slots: RemainingSlots,
    /// Teams that fit between now and the cutoff.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_capacity: Option<u64>,
    /// Teams serving plus waiting.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_queue_size: Option<u64>,
    /// Whole minutes until the cutoff.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minutes_remaining: Option<i64>,
    /// Advisory: the caller should set `skillsQueueClosed`.
    pub should_permanently_close: bool,
}

impl CapacityDecision {
    fn open(reason: CapacityReason) -> Self {
        Self {
            is_open: true,
            reason,
            remaining_slots: RemainingSlots::Unlimited,
            total_capacity: None,
            current_queue_size: None,
            minutes_remaining: None,
            should_permanently_close: false,
        }
    }

    fn closed(reason: CapacityReason) -> Self {
        Self {
            is_open: false,
            reason,
            remaining_slots: RemainingSlots::Limited(0),
            total_capacity: None,
            current_queue_size: None,
            minutes_remaining: None,
            should_permanently_close: false,
        }
    }
}

/// Parsed cutoff without a year; the year is taken from the clock at evaluation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cutoff {
    /// 1-12.
    pub month: u32,
    /// 1-31.
    pub day: u32,
    /// 0-23.
    pub hour: u32,
    /// 0-59.
    pub minute: u32,
}

/// Parse `M/D h:mm AM|PM`, also accepting `M/D hAM` and `M/D h pm`.
pub fn parse_cutoff(input: &str) -> Option<Cutoff> {
    let (date, clock) = input.trim().split_once(char::is_whitespace)?;
    let (month, day) = date.split_once('/')?;
    let month = parse_small_number(month)?;
    let day = parse_small_number(day)?;

    let clock = clock.trim().to_ascii_uppercase();
    let (clock, afternoon) = if let Some(rest) = clock.strip_suffix("PM") {
        (rest.trim_end(), true)
    } else if let Some(rest) = clock.strip_suffix("AM") {
        (rest.trim_end(), false)
    } else {
        return None;
    };

    let (hour, minute) = match clock.split_once(':') {
        Some((hour, minute)) if minute.len() == 2 => {
            (parse_small_number(hour)?, parse_small_number(minute)?)
        }
        Some(_) => return None,
        None => (parse_small_number(clock)?, 0),
    };

    if !(1..=12).contains(&hour) || minute > 59 {
        return None;
    }

    let hour = match (hour, afternoon) {
        (12, false) => 0,
        (12, true) => 12,
        (hour, true) => hour + 12,
        (hour, false) => hour,
    };

    Some(Cutoff {
        month,
        day,
        hour,
        minute,
    })
}

/// One or two ASCII digits.
fn parse_small_number(raw: &str) -> Option<u32> {
    if raw.is_empty() || raw.len() > 2 || !raw.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

/// Decide whether registration is open, evaluated against the server-local clock.
pub fn compute_status_now(settings: &QueueSettings, sizes: QueueSizes) -> CapacityDecision {
    compute_status(settings, sizes, &Local::now())
}

/// Decide whether registration is open at `now`.
///
/// The cutoff is interpreted in `now`'s time zone, in `now`'s year.
pub fn compute_status<Tz: TimeZone>(
    settings: &QueueSettings,
    sizes: QueueSizes,
    now: &DateTime<Tz>,
) -> CapacityDecision {
    if settings.skills_queue_manually_open {
        return CapacityDecision::open(CapacityReason::Manual);
    }

    if settings.skills_queue_closed {
        return CapacityDecision::closed(CapacityReason::PermanentlyClosed);
    }

    let Some(cutoff) = parse_cutoff(&settings.skills_cutoff_time) else {
        return CapacityDecision::open(CapacityReason::InvalidCutoff);
    };

    let Some(cutoff_at) = now
        .timezone()
        .with_ymd_and_hms(
            now.year(),
            cutoff.month,
            cutoff.day,
            cutoff.hour,
            cutoff.minute,
            0,
        )
        .earliest()
    else {
        return CapacityDecision::open(CapacityReason::InvalidCutoff);
    };

    let minutes_remaining = (cutoff_at - now.clone())
        .num_milliseconds()
        .div_euclid(MILLIS_PER_MINUTE);

    if minutes_remaining <= 0 {
        return CapacityDecision {
            minutes_remaining: Some(0),
            should_permanently_close: true,
            ..CapacityDecision::closed(CapacityReason::PastCutoff)
        };
    }

    if settings.skills_turnover_time == 0 {
        return CapacityDecision::open(CapacityReason::InvalidTurnover);
    }

    let fields = u64::from(settings.number_of_fields.max(1));
    let minutes = minutes_remaining as u64;
    let total_capacity = minutes * fields / u64::from(settings.skills_turnover_time);
    let current_queue_size = sizes.total() as u64;
    let remaining = total_capacity.saturating_sub(current_queue_size);

    let decision = CapacityDecision {
        is_open: remaining > 0,
        reason: CapacityReason::CapacityAvailable,
        remaining_slots: RemainingSlots::Limited(remaining),
        total_capacity: Some(total_capacity),
        current_queue_size: Some(current_queue_size),
        minutes_remaining: Some(minutes_remaining),
        should_permanently_close: false,
    };

    if remaining == 0 {
        CapacityDecision {
            reason: CapacityReason::CapacityFull,
            should_permanently_close: true,
            ..decision
        }
    } else {
        decision
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, NaiveDate};

    fn at(month: u32, day: u32, hour: u32, minute: u32) -> DateTime<FixedOffset> {
        let offset = FixedOffset::west_opt(5 * 3600).unwrap();
        let naive = NaiveDate::from_ymd_opt(2025, month, day)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap();
        offset.from_local_datetime(&naive).single().unwrap()
    }

    fn settings(cutoff: &str) -> QueueSettings {
        QueueSettings {
            skills_cutoff_time: cutoff.into(),
            skills_turnover_time: 5,
            skills_queue_manually_open: false,
            skills_queue_closed: false,
            number_of_fields: 4,
        }
    }

    fn sizes(total: usize) -> QueueSizes {
        QueueSizes {
            now_serving: total.min(4),
            queue: total.saturating_sub(4),
        }
    }

    #[test]
    fn parses_supported_cutoff_formats() {
        assert_eq!(
            parse_cutoff("2/6 12:00 PM"),
            Some(Cutoff {
                month: 2,
                day: 6,
                hour: 12,
                minute: 0
            })
        );
        assert_eq!(parse_cutoff("2/6 12am").map(|c| c.hour), Some(0));
        assert_eq!(parse_cutoff("11/30 3:45pm").map(|c| (c.hour, c.minute)), Some((15, 45)));
        assert_eq!(parse_cutoff(" 2/6  9 AM ").map(|c| c.hour), Some(9));
    }

    #[test]
    fn rejects_malformed_cutoffs() {
        assert_eq!(parse_cutoff("12:00 PM"), None);
        assert_eq!(parse_cutoff("2/6 12:00"), None);
        assert_eq!(parse_cutoff("2/6 13:00 PM"), None);
        assert_eq!(parse_cutoff("2/6 1:5 PM"), None);
        assert_eq!(parse_cutoff(""), None);
    }

    #[test]
    fn manual_override_wins_even_past_cutoff_and_closed() {
        let mut settings = settings("2/6 12:00 PM");
        settings.skills_queue_manually_open = true;
        settings.skills_queue_closed = true;

        let decision = compute_status(&settings, sizes(500), &at(2, 7, 9, 0));
        assert!(decision.is_open);
        assert_eq!(decision.reason, CapacityReason::Manual);
        assert_eq!(decision.remaining_slots, RemainingSlots::Unlimited);
        assert!(!decision.should_permanently_close);
    }

    #[test]
    fn closed_flag_is_sticky() {
        let mut settings = settings("2/6 12:00 PM");
        settings.skills_queue_closed = true;

        let decision = compute_status(&settings, sizes(0), &at(2, 6, 8, 0));
        assert!(!decision.is_open);
        assert_eq!(decision.reason, CapacityReason::PermanentlyClosed);
        assert_eq!(decision.remaining_slots, RemainingSlots::Limited(0));
    }

    #[test]
    fn unparseable_cutoff_fails_open() {
        let decision = compute_status(&settings("noon-ish"), sizes(100), &at(2, 6, 11, 0));
        assert!(decision.is_open);
        assert_eq!(decision.reason, CapacityReason::InvalidCutoff);
    }

    #[test]
    fn impossible_calendar_date_fails_open() {
        let decision = compute_status(&settings("2/30 12:00 PM"), sizes(0), &at(2, 6, 11, 0));
        assert!(decision.is_open);
        assert_eq!(decision.reason, CapacityReason::InvalidCutoff);
    }

    #[test]
    fn zero_turnover_fails_open() {
        let mut settings = settings("2/6 12:00 PM");
        settings.skills_turnover_time = 0;
        let decision = compute_status(&settings, sizes(3), &at(2, 6, 11, 0));
        assert!(decision.is_open);
        assert_eq!(decision.reason, CapacityReason::InvalidTurnover);
    }

    #[test]
    fn capacity_available_with_room_left() {
        let decision = compute_status(&settings("2/6 12:00 PM"), sizes(20), &at(2, 6, 11, 30));

        assert!(decision.is_open);
        assert_eq!(decision.reason, CapacityReason::CapacityAvailable);
        assert_eq!(decision.total_capacity, Some(24));
        assert_eq!(decision.current_queue_size, Some(20));
        assert_eq!(decision.minutes_remaining, Some(30));
        assert_eq!(decision.remaining_slots, RemainingSlots::Limited(4));
        assert!(!decision.should_permanently_close);
    }

    #[test]
    fn capacity_full_requests_permanent_close() {
        let decision = compute_status(&settings("2/6 12:00 PM"), sizes(24), &at(2, 6, 11, 30));

        assert!(!decision.is_open);
        assert_eq!(decision.reason, CapacityReason::CapacityFull);
        assert_eq!(decision.remaining_slots, RemainingSlots::Limited(0));
        assert_eq!(decision.total_capacity, Some(24));
        assert!(decision.should_permanently_close);
    }

    #[test]
    fn overfull_queue_clamps_remaining_at_zero() {
        let decision = compute_status(&settings("2/6 12:00 PM"), sizes(40), &at(2, 6, 11, 30));
        assert_eq!(decision.remaining_slots, RemainingSlots::Limited(0));
        assert_eq!(decision.reason, CapacityReason::CapacityFull);
    }

    #[test]
    fn past_cutoff_closes_regardless_of_queue_size() {
        for size in [0, 5, 50] {
            let decision =
                compute_status(&settings("2/6 12:00 PM"), sizes(size), &at(2, 6, 12, 1));
            assert!(!decision.is_open);
            assert_eq!(decision.reason, CapacityReason::PastCutoff);
            assert!(decision.should_permanently_close);
        }
    }

    #[test]
    fn exactly_at_cutoff_counts_as_past() {
        let decision = compute_status(&settings("2/6 12:00 PM"), sizes(0), &at(2, 6, 12, 0));
        assert_eq!(decision.reason, CapacityReason::PastCutoff);
    }

    #[test]
    fn partial_minutes_are_floored() {
        let now = at(2, 6, 11, 58) + chrono::Duration::seconds(30);
        let decision = compute_status(&settings("2/6 12:00 PM"), sizes(0), &now);
        assert_eq!(decision.minutes_remaining, Some(1));
        // floor(1 / 5 * 4) = 0
        assert_eq!(decision.total_capacity, Some(0));
        assert_eq!(decision.reason, CapacityReason::CapacityFull);
    }

    #[test]
    fn zero_fields_counts_as_one() {
        let mut settings = settings("2/6 12:00 PM");
        settings.number_of_fields = 0;
        let decision = compute_status(&settings, sizes(0), &at(2, 6, 11, 30));
        assert_eq!(decision.total_capacity, Some(6));
    }

    #[test]
    fn unlimited_serializes_as_null() {
        let decision = CapacityDecision::open(CapacityReason::Manual);
        let json = serde_json::to_value(&decision).unwrap();
        assert_eq!(json["remainingSlots"], serde_json::Value::Null);
        assert_eq!(json["reason"], "manual");
        assert!(json.get("totalCapacity").is_none());
    }
}

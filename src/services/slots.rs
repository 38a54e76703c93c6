use chrono::{Datelike, NaiveDateTime, Timelike};

/// First bookable hour of the day.
pub const OPENING_HOUR: u32 = 8;
/// Slots must start before this hour; the last one starts at 17:30.
pub const CLOSING_HOUR: u32 = 18;
pub const SLOT_MINUTES: [u32; 2] = [0, 30];

/// Whether `candidate` can be booked at local time `now`.
///
/// Only the date is compared against `now`: a slot earlier today is still
/// valid as long as it sits inside business hours.
pub fn is_valid_slot(candidate: &NaiveDateTime, now: &NaiveDateTime) -> bool {
    let within_business_hours = (OPENING_HOUR..CLOSING_HOUR).contains(&candidate.hour());
    let on_weekday = is_weekday(candidate);
    let is_current_month = candidate.month() == now.month() && candidate.year() == now.year();
    let not_before_today = candidate.day() >= now.day();
    let on_slot_boundary = SLOT_MINUTES.contains(&candidate.minute());

    within_business_hours && on_weekday && is_current_month && not_before_today && on_slot_boundary
}

pub fn is_weekday<D: Datelike>(date: &D) -> bool {
    (1..=5).contains(&date.weekday().num_days_from_sunday())
}

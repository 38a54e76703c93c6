use std::collections::HashSet;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use super::slots::{is_weekday, CLOSING_HOUR, OPENING_HOUR, SLOT_MINUTES};

/// First day offered: today, or tomorrow once business hours are over.
pub fn anchor_date(now: &NaiveDateTime) -> NaiveDate {
    if now.hour() >= CLOSING_HOUR {
        now.date() + Duration::days(1)
    } else {
        now.date()
    }
}

/// Every bookable slot from the anchor day to the end of its month that is not
/// in `booked`, in chronological order.
///
/// On the anchor day, slots at or before the top of the current hour are
/// dropped. The cutoff only looks at `now`'s hour, so after closing time it
/// empties the whole anchor day.
pub fn available_slots(now: &NaiveDateTime, booked: &HashSet<NaiveDateTime>) -> Vec<NaiveDateTime> {
    let anchor = anchor_date(now);
    let cutoff = NaiveTime::from_hms_opt(now.hour(), 0, 0).map(|t| anchor.and_time(t));

    anchor
        .iter_days()
        .take_while(|day| day.month() == anchor.month())
        .filter(|day| is_weekday(day))
        .flat_map(day_slots)
        .filter(|slot| match cutoff {
            Some(cutoff) if slot.date() == anchor => *slot > cutoff,
            _ => true,
        })
        .filter(|slot| !booked.contains(slot))
        .collect()
}

fn day_slots(day: NaiveDate) -> impl Iterator<Item = NaiveDateTime> {
    (OPENING_HOUR..CLOSING_HOUR)
        .flat_map(|hour| SLOT_MINUTES.iter().map(move |minute| (hour, *minute)))
        .filter_map(move |(hour, minute)| day.and_hms_opt(hour, minute, 0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::slots::is_valid_slot;

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    #[test]
    fn test_same_day_cutoff() {
        let slots = available_slots(&dt("2021-08-10 10:00"), &HashSet::new());
        assert_eq!(slots.first(), Some(&dt("2021-08-10 10:30")));

        let tenth: Vec<_> = slots
            .iter()
            .filter(|s| s.date() == dt("2021-08-10 00:00").date())
            .collect();
        assert_eq!(tenth.len(), 15);
        assert_eq!(tenth.last(), Some(&&dt("2021-08-10 17:30")));
    }

    #[test]
    fn test_whole_month_enumerated() {
        let slots = available_slots(&dt("2021-08-10 10:00"), &HashSet::new());
        // 15 on the 10th, then 15 full weekdays of 20 slots each
        assert_eq!(slots.len(), 15 + 15 * 20);
        assert_eq!(slots.last(), Some(&dt("2021-08-31 17:30")));
    }

    #[test]
    fn test_before_opening_keeps_whole_day() {
        let slots = available_slots(&dt("2021-08-10 07:15"), &HashSet::new());
        assert_eq!(slots.first(), Some(&dt("2021-08-10 08:00")));
    }

    #[test]
    fn test_booked_slots_removed() {
        let booked: HashSet<_> = [dt("2021-08-10 10:30"), dt("2021-08-20 14:00")].into();
        let slots = available_slots(&dt("2021-08-10 10:00"), &booked);
        assert!(!slots.contains(&dt("2021-08-10 10:30")));
        assert!(!slots.contains(&dt("2021-08-20 14:00")));
        assert_eq!(slots.first(), Some(&dt("2021-08-10 11:00")));
        assert_eq!(slots.len(), 15 + 15 * 20 - 2);
    }

    #[test]
    fn test_strictly_increasing() {
        let slots = available_slots(&dt("2021-08-02 13:00"), &HashSet::new());
        assert!(slots.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_weekends_skipped() {
        let slots = available_slots(&dt("2021-08-10 10:00"), &HashSet::new());
        assert!(slots.iter().all(|s| is_weekday(s)));
    }

    #[test]
    fn test_every_offered_slot_is_valid() {
        let now = dt("2021-08-10 10:00");
        let slots = available_slots(&now, &HashSet::new());
        assert!(slots.iter().all(|s| is_valid_slot(s, &now)));
    }

    #[test]
    fn test_after_closing_moves_to_tomorrow() {
        // Tuesday evening: anchor is Wednesday, whose slots all fall under the hour cutoff
        let slots = available_slots(&dt("2021-08-10 19:00"), &HashSet::new());
        assert_eq!(slots.first(), Some(&dt("2021-08-12 08:00")));
    }

    #[test]
    fn test_last_weekday_after_closing_is_empty() {
        // Tuesday the 31st, 18:30: the anchor rolls to September 1st, which the cutoff empties
        let slots = available_slots(&dt("2021-08-31 18:30"), &HashSet::new());
        assert!(slots.iter().all(|s| s.date() != dt("2021-09-01 00:00").date()));
        assert_eq!(slots.first(), Some(&dt("2021-09-02 08:00")));
    }

    #[test]
    fn test_last_day_late_in_day() {
        // the cutoff is the top of the hour, so 17:30 is still offered at 17:10
        let slots = available_slots(&dt("2021-08-31 17:10"), &HashSet::new());
        assert_eq!(slots, vec![dt("2021-08-31 17:30")]);

        let booked: HashSet<_> = [dt("2021-08-31 17:30")].into();
        assert!(available_slots(&dt("2021-08-31 17:10"), &booked).is_empty());
    }

    #[test]
    fn test_weekend_anchor() {
        // Saturday 28th: only Monday 30th and Tuesday 31st remain
        let slots = available_slots(&dt("2021-08-28 09:00"), &HashSet::new());
        assert_eq!(slots.len(), 40);
        assert_eq!(slots.first(), Some(&dt("2021-08-30 08:00")));
    }
}

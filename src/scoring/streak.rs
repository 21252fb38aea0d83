// src/scoring/streak.rs

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};

/// Collapses completion timestamps to the set of UTC calendar days.
pub fn completion_days<I>(completed_at: I) -> HashSet<NaiveDate>
where
    I: IntoIterator<Item = DateTime<Utc>>,
{
    completed_at.into_iter().map(|ts| ts.date_naive()).collect()
}

/// Number of consecutive days, ending at `today`, present in `days`.
///
/// Returns 0 when `today` itself has no completion.
pub fn current_streak(days: &HashSet<NaiveDate>, today: NaiveDate) -> u32 {
    let mut streak = 0;
    let mut cursor = Some(today);

    while let Some(day) = cursor {
        if !days.contains(&day) {
            break;
        }
        streak += 1;
        cursor = day.pred_opt();
    }

    streak
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn three_consecutive_days_ending_today() {
        let today = day(2025, 3, 10);
        let days: HashSet<_> = [today, today - Duration::days(1), today - Duration::days(2)]
            .into_iter()
            .collect();
        assert_eq!(current_streak(&days, today), 3);
    }

    #[test]
    fn missing_today_breaks_the_streak() {
        let today = day(2025, 3, 10);
        let days: HashSet<_> = [today - Duration::days(1), today - Duration::days(2)]
            .into_iter()
            .collect();
        assert_eq!(current_streak(&days, today), 0);
    }

    #[test]
    fn gap_stops_counting() {
        let today = day(2025, 3, 10);
        let days: HashSet<_> = [today, today - Duration::days(1), today - Duration::days(3)]
            .into_iter()
            .collect();
        assert_eq!(current_streak(&days, today), 2);
    }

    #[test]
    fn streak_crosses_month_boundary() {
        let days: HashSet<_> = [day(2025, 3, 1), day(2025, 2, 28), day(2025, 2, 27)]
            .into_iter()
            .collect();
        assert_eq!(current_streak(&days, day(2025, 3, 1)), 3);
    }

    #[test]
    fn timestamps_truncate_to_utc_day() {
        let days = completion_days([
            Utc.with_ymd_and_hms(2025, 3, 10, 0, 5, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 3, 10, 23, 59, 59).unwrap(),
            Utc.with_ymd_and_hms(2025, 3, 9, 12, 0, 0).unwrap(),
        ]);
        assert_eq!(days.len(), 2);
        assert_eq!(current_streak(&days, day(2025, 3, 10)), 2);
    }
}

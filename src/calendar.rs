use chrono::NaiveDate;

use crate::types::CalendarFestival;

/// Festivals within this many days are flagged as coming soon
pub const SOON_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FestivalStatus {
    Past,
    Soon,
    Upcoming,
}

// The calendar function returns `YYYY-MM-DD`, sometimes with a time part.
fn festival_day(date: &str) -> Option<NaiveDate> {
    let day = date.get(..10).unwrap_or(date);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

/// Signed number of days from `today` to the festival, if it has a usable date
pub fn days_until(festival: &CalendarFestival, today: NaiveDate) -> Option<i64> {
    let day = festival_day(festival.festival_date.as_deref()?)?;
    Some((day - today).num_days())
}

/// Undated festivals count as upcoming
pub fn status(festival: &CalendarFestival, today: NaiveDate) -> FestivalStatus {
    match days_until(festival, today) {
        Some(days) if days < 0 => FestivalStatus::Past,
        Some(days) if days <= SOON_DAYS => FestivalStatus::Soon,
        _ => FestivalStatus::Upcoming,
    }
}

pub fn describe_days(days: i64) -> String {
    match days {
        d if d < 0 => format!("{} days ago", -d),
        0 => "Today!".to_string(),
        1 => "Tomorrow".to_string(),
        d => format!("In {d} days"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn festival(date: Option<&str>) -> CalendarFestival {
        CalendarFestival {
            name: "Sarhul".to_string(),
            festival_date: date.map(str::to_string),
            duration_days: 1,
            ..Default::default()
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 15).unwrap()
    }

    #[test]
    fn counts_days_in_both_directions() {
        assert_eq!(days_until(&festival(Some("2026-03-21")), today()), Some(6));
        assert_eq!(days_until(&festival(Some("2026-03-10")), today()), Some(-5));
        assert_eq!(
            days_until(&festival(Some("2026-03-16T00:00:00Z")), today()),
            Some(1)
        );
        assert_eq!(days_until(&festival(Some("spring")), today()), None);
        assert_eq!(days_until(&festival(None), today()), None);
    }

    #[test]
    fn classifies_status() {
        assert_eq!(status(&festival(Some("2026-03-14")), today()), FestivalStatus::Past);
        assert_eq!(status(&festival(Some("2026-03-15")), today()), FestivalStatus::Soon);
        assert_eq!(status(&festival(Some("2026-03-22")), today()), FestivalStatus::Soon);
        assert_eq!(status(&festival(Some("2026-03-23")), today()), FestivalStatus::Upcoming);
        assert_eq!(status(&festival(None), today()), FestivalStatus::Upcoming);
    }

    #[test]
    fn describes_relative_days() {
        assert_eq!(describe_days(-3), "3 days ago");
        assert_eq!(describe_days(0), "Today!");
        assert_eq!(describe_days(1), "Tomorrow");
        assert_eq!(describe_days(40), "In 40 days");
    }
}

use anyhow::{anyhow, Result};
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;

/// UTC bounds `[start, end)` of calendar day `date` in `tz`.
pub fn day_window(date: NaiveDate, tz: Tz) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let start = local_midnight(date, tz)?;
    let next = date
        .succ_opt()
        .ok_or_else(|| anyhow!("date out of range: {date}"))?;
    let end = local_midnight(next, tz)?;
    Ok((start, end))
}

fn local_midnight(date: NaiveDate, tz: Tz) -> Result<DateTime<Utc>> {
    let naive = date.and_time(chrono::NaiveTime::MIN);
    match tz.from_local_datetime(&naive).earliest() {
        Some(dt) => Ok(dt.with_timezone(&Utc)),
        // Midnight skipped by a DST jump: the day starts an hour later.
        None => tz
            .from_local_datetime(&(naive + Duration::hours(1)))
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
            .ok_or_else(|| anyhow!("no local midnight for {date} in {tz}")),
    }
}

pub fn local_today(tz: Tz, now: DateTime<Utc>) -> NaiveDate {
    now.with_timezone(&tz).date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kolkata_day_starts_at_1830_utc() {
        let d = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        let (start, end) = day_window(d, chrono_tz::Asia::Kolkata).unwrap();
        assert_eq!(start.to_rfc3339(), "2025-03-13T18:30:00+00:00");
        assert_eq!(end.to_rfc3339(), "2025-03-14T18:30:00+00:00");
    }

    #[test]
    fn late_evening_utc_is_next_day_in_kolkata() {
        let now = Utc.with_ymd_and_hms(2025, 3, 13, 20, 0, 0).unwrap();
        assert_eq!(
            local_today(chrono_tz::Asia::Kolkata, now),
            NaiveDate::from_ymd_opt(2025, 3, 14).unwrap()
        );
    }

    #[test]
    fn dst_day_is_23_hours() {
        let d = NaiveDate::from_ymd_opt(2025, 3, 9).unwrap();
        let (start, end) = day_window(d, chrono_tz::America::New_York).unwrap();
        assert_eq!(end - start, Duration::hours(23));
    }
}

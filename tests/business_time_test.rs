use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Weekday};
use lead_analytics::{
    business_duration, AfterHoursRollover, BusinessCalendar, BusinessDuration, TimeInterval,
};

fn ts(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, mo, d)
        .unwrap()
        .and_hms_opt(h, mi, 0)
        .unwrap()
}

/// Deterministic minute-aligned timestamp pairs spread over two weeks,
/// including reversed and equal pairs.
fn sample_pairs() -> Vec<(NaiveDateTime, NaiveDateTime)> {
    let base = ts(2024, 2, 26, 0, 0);
    let mut state: u64 = 0x2545_f491_4f6c_dd1d;
    let mut next = move |modulo: u64| {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        (state % modulo) as i64
    };

    (0..400)
        .map(|i| {
            let created = base + TimeDelta::minutes(next(14 * 24 * 60));
            let contacted = match i % 10 {
                0 => created,
                1 => created - TimeDelta::minutes(next(3_000) + 1),
                _ => created + TimeDelta::minutes(next(9 * 24 * 60)),
            };
            (created, contacted)
        })
        .collect()
}

/// Business minutes in `[created, contacted)` counted one minute at a time.
fn brute_force_minutes(
    created: NaiveDateTime,
    contacted: NaiveDateTime,
    calendar: &BusinessCalendar,
) -> i64 {
    let mut minutes = 0;
    let mut t = created;
    while t < contacted {
        let time = t.time();
        if calendar.is_working_day(t.weekday())
            && time >= calendar.day_start()
            && time < calendar.day_end()
        {
            minutes += 1;
        }
        t += TimeDelta::minutes(1);
    }
    minutes
}

#[test]
fn test_non_negative_for_all_inputs() {
    for rollover in [
        AfterHoursRollover::KeepTimeOfDay,
        AfterHoursRollover::NextDayStart,
    ] {
        let calendar = BusinessCalendar::default().with_after_hours(rollover);
        for (created, contacted) in sample_pairs() {
            let result = business_duration(Some(created), Some(contacted), &calendar).unwrap();
            assert!(
                result.hours >= 0.0,
                "negative hours for {} -> {}: {:?}",
                created,
                contacted,
                result
            );
        }
    }
}

#[test]
fn test_missing_input_propagates() {
    let calendar = BusinessCalendar::default();
    for (created, contacted) in sample_pairs().into_iter().take(20) {
        assert_eq!(business_duration(None, Some(contacted), &calendar), None);
        assert_eq!(business_duration(Some(created), None, &calendar), None);
    }
    assert_eq!(TimeInterval::default().business_duration(&calendar), None);
}

#[test]
fn test_order_degeneracy() {
    let calendar = BusinessCalendar::default();
    for (created, contacted) in sample_pairs() {
        if created >= contacted {
            assert_eq!(
                business_duration(Some(created), Some(contacted), &calendar),
                Some(BusinessDuration::ZERO)
            );
        }
    }
}

#[test]
fn test_documented_examples() {
    let calendar = BusinessCalendar::default();
    let check = |created, contacted, hours: f64, days: u32| {
        assert_eq!(
            business_duration(Some(created), Some(contacted), &calendar),
            Some(BusinessDuration { hours, days }),
            "{} -> {}",
            created,
            contacted
        );
    };

    // weekend to weekend
    check(ts(2024, 3, 2, 10, 0), ts(2024, 3, 3, 10, 0), 0.0, 0);
    // same window, same day
    check(ts(2024, 3, 4, 10, 0), ts(2024, 3, 4, 13, 0), 3.0, 0);
    // one full span then one hour
    check(ts(2024, 3, 4, 10, 0), ts(2024, 3, 5, 10, 0), 6.0, 1);
    // snapped to window start
    check(ts(2024, 3, 4, 7, 0), ts(2024, 3, 4, 11, 0), 2.0, 0);
}

#[test]
fn test_next_day_start_matches_brute_force_overlap() {
    let calendar = BusinessCalendar::default().with_after_hours(AfterHoursRollover::NextDayStart);

    for (created, contacted) in sample_pairs() {
        let result = business_duration(Some(created), Some(contacted), &calendar).unwrap();
        let expected_minutes = brute_force_minutes(created, contacted, &calendar);
        let actual_minutes = (result.hours * 60.0).round() as i64;
        assert_eq!(
            actual_minutes, expected_minutes,
            "{} -> {}: {:?}",
            created, contacted, result
        );
    }
}

#[test]
fn test_keep_time_of_day_never_exceeds_overlap() {
    let keep = BusinessCalendar::default();
    let next = keep.with_after_hours(AfterHoursRollover::NextDayStart);

    for (created, contacted) in sample_pairs() {
        let kept = business_duration(Some(created), Some(contacted), &keep).unwrap();
        let rolled = business_duration(Some(created), Some(contacted), &next).unwrap();
        assert!(kept.hours <= rolled.hours);
        assert!(kept.days <= rolled.days);

        // after the first accrual the cursor always sits at day_start, so the
        // policies can only diverge before it
        if keep.is_working_day(created.weekday()) && created.time() < keep.day_end() {
            assert_eq!(kept, rolled, "{} -> {}", created, contacted);
        }
    }
}

#[test]
fn test_days_count_windows_reached() {
    let calendar = BusinessCalendar::default().with_after_hours(AfterHoursRollover::NextDayStart);
    let window = calendar.window_length().num_minutes() as f64 / 60.0;

    for (created, contacted) in sample_pairs() {
        let result = business_duration(Some(created), Some(contacted), &calendar).unwrap();
        // every counted day contributes at most one full window
        assert!(result.hours <= (result.days as f64 + 1.0) * window + 1e-9);
    }
}

#[test]
fn test_deterministic_across_threads() {
    let calendar = BusinessCalendar::new(
        [Weekday::Sun, Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu],
        NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        NaiveTime::from_hms_opt(15, 0, 0).unwrap(),
    )
    .unwrap();
    let pairs = sample_pairs();

    let expected: Vec<Option<BusinessDuration>> = pairs
        .iter()
        .map(|(c, t)| business_duration(Some(*c), Some(*t), &calendar))
        .collect();

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let pairs = &pairs;
                let calendar = &calendar;
                scope.spawn(move || {
                    // each worker walks the batch in a different order
                    let mut out = vec![None; pairs.len()];
                    for step in 0..pairs.len() {
                        let i = (step * 7 + worker * 13) % pairs.len();
                        let (c, t) = pairs[i];
                        out[i] = business_duration(Some(c), Some(t), calendar);
                    }
                    out
                })
            })
            .collect();

        for handle in handles {
            let out = handle.join().unwrap();
            for (a, b) in out.iter().zip(expected.iter()) {
                assert_eq!(
                    a.map(|d| (d.hours.to_bits(), d.days)),
                    b.map(|d| (d.hours.to_bits(), d.days))
                );
            }
        }
    });
}

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use rota::{
    Occurrence, RecurrenceKind, RuleParseError, RuleWarning, ScheduleRule, describe,
    next_occurrence, occurrences_between, ordinal, rule_warnings, upcoming,
};

fn d(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

const ALL_WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

#[test]
fn daily_is_always_the_next_day() {
    let rule = ScheduleRule::daily();
    let mut date = d(2023, 12, 25);
    for _ in 0..400 {
        assert_eq!(next_occurrence(&rule, date), Some(date + Duration::days(1)));
        date = date + Duration::days(1);
    }
}

#[test]
fn weekly_single_interval_lands_on_weekday_within_a_week() {
    let start = d(2024, 1, 1);
    for weekday in ALL_WEEKDAYS {
        let rule = ScheduleRule::weekly(1, weekday);
        for offset in 0..14 {
            let from = start + Duration::days(offset);
            let next = next_occurrence(&rule, from).unwrap();
            assert_eq!(next.weekday(), weekday);
            let gap = (next - from).num_days();
            assert!((1..=7).contains(&gap), "gap {gap} from {from}");
        }
    }
}

#[test]
fn weekly_chained_calls_are_interval_weeks_apart() {
    for interval in 1..=4u32 {
        let rule = ScheduleRule::weekly(interval, Weekday::Wed);
        let dates = upcoming(&rule, d(2024, 2, 10), 6);
        assert_eq!(dates.len(), 6);
        for pair in dates.windows(2) {
            assert_eq!((pair[1] - pair[0]).num_days(), i64::from(interval) * 7);
        }
    }
}

#[test]
fn weekly_every_two_weeks_on_friday_scenario() {
    let rule = ScheduleRule::weekly(2, Weekday::Fri);
    let first = next_occurrence(&rule, d(2024, 1, 1)).unwrap();
    assert_eq!(first, d(2024, 1, 5));
    let second = next_occurrence(&rule, first).unwrap();
    assert_eq!(second, d(2024, 1, 19));
    assert_eq!(describe(&rule), "Every 2 weeks on Friday");
}

#[test]
fn monthly_fifteenth_scenario() {
    let rule = ScheduleRule::monthly(1, 15);
    assert_eq!(next_occurrence(&rule, d(2024, 1, 20)), Some(d(2024, 2, 15)));
    assert_eq!(describe(&rule), "On the 15th of every month");
}

#[test]
fn monthly_day_31_clamps_to_month_end() {
    let rule = ScheduleRule::monthly(1, 31);
    assert_eq!(next_occurrence(&rule, d(2024, 1, 31)), Some(d(2024, 2, 29)));
    assert_eq!(next_occurrence(&rule, d(2023, 1, 31)), Some(d(2023, 2, 28)));
    assert_eq!(next_occurrence(&rule, d(2024, 3, 31)), Some(d(2024, 4, 30)));
    assert_eq!(next_occurrence(&rule, d(2024, 4, 30)), Some(d(2024, 5, 31)));
}

#[test]
fn monthly_interval_crosses_year_boundary() {
    let rule = ScheduleRule::monthly(3, 10);
    assert_eq!(next_occurrence(&rule, d(2024, 11, 2)), Some(d(2025, 2, 10)));
    assert_eq!(describe(&rule), "On the 10th of every 3 months");
}

#[test]
fn monthly_day_zero_is_treated_as_first() {
    let rule = ScheduleRule::monthly(1, 0);
    assert_eq!(next_occurrence(&rule, d(2024, 6, 12)), Some(d(2024, 7, 1)));
}

#[test]
fn custom_interval_adds_days() {
    let rule = ScheduleRule::every_n_days(10);
    assert_eq!(next_occurrence(&rule, d(2024, 2, 25)), Some(d(2024, 3, 6)));
    assert_eq!(describe(&rule), "Every 10 days");
}

#[test]
fn zero_interval_behaves_like_one() {
    let from = d(2024, 5, 3);
    assert_eq!(
        next_occurrence(&ScheduleRule::every_n_days(0), from),
        Some(d(2024, 5, 4))
    );
    assert_eq!(
        next_occurrence(&ScheduleRule::weekly(0, Weekday::Fri), from),
        Some(d(2024, 5, 10))
    );
    assert_eq!(
        next_occurrence(&ScheduleRule::monthly(0, 3), from),
        Some(d(2024, 6, 3))
    );
    assert_eq!(
        describe(&ScheduleRule::weekly(0, Weekday::Fri)),
        "Every week on Friday"
    );
}

#[test]
fn third_monday_scenario() {
    let rule = ScheduleRule::nth_weekday(Occurrence::Third, Weekday::Mon);
    assert_eq!(next_occurrence(&rule, d(2024, 3, 1)), Some(d(2024, 3, 18)));
    assert_eq!(describe(&rule), "Every 3rd Monday of each month");
}

#[test]
fn nth_weekday_moves_to_next_month_once_passed() {
    let rule = ScheduleRule::nth_weekday(Occurrence::Third, Weekday::Mon);
    // on the occurrence itself counts as passed
    assert_eq!(next_occurrence(&rule, d(2024, 3, 18)), Some(d(2024, 4, 15)));
    assert_eq!(next_occurrence(&rule, d(2024, 12, 20)), Some(d(2025, 1, 20)));
}

#[test]
fn last_friday_picks_fifth_or_fourth() {
    let rule = ScheduleRule::nth_weekday(Occurrence::Last, Weekday::Fri);
    // March 2024 has five Fridays
    assert_eq!(next_occurrence(&rule, d(2024, 3, 1)), Some(d(2024, 3, 29)));
    // February 2024 has four
    assert_eq!(next_occurrence(&rule, d(2024, 2, 1)), Some(d(2024, 2, 23)));
    assert_eq!(describe(&rule), "On the Last Friday of every month");
}

#[test]
fn manual_has_no_automatic_dates() {
    let rule = ScheduleRule::manual();
    assert_eq!(next_occurrence(&rule, d(2024, 1, 1)), None);
    assert!(upcoming(&rule, d(2024, 1, 1), 3).is_empty());
    assert_eq!(describe(&rule), "Manual (no automatic schedule)");
}

#[test]
fn unused_fields_are_ignored() {
    let mut rule = ScheduleRule::daily();
    rule.weekday = Weekday::Sun;
    rule.day_of_month = 99;
    rule.occurrence = Occurrence::Last;
    rule.interval = 0;
    assert_eq!(next_occurrence(&rule, d(2024, 1, 1)), Some(d(2024, 1, 2)));
    assert!(rule_warnings(&rule).is_empty());
}

#[test]
fn describe_is_stable_across_calls() {
    let rules = [
        ScheduleRule::daily(),
        ScheduleRule::weekly(3, Weekday::Tue),
        ScheduleRule::monthly(2, 22),
        ScheduleRule::every_n_days(1),
        ScheduleRule::nth_weekday(Occurrence::First, Weekday::Sat),
    ];
    for rule in rules {
        assert_eq!(describe(&rule), describe(&rule));
    }
    assert_eq!(describe(&ScheduleRule::every_n_days(1)), "Every day");
    assert_eq!(
        describe(&ScheduleRule::weekly(1, Weekday::Tue)),
        "Every week on Tuesday"
    );
}

#[test]
fn ordinal_suffixes() {
    let cases = [
        (1, "1st"),
        (2, "2nd"),
        (3, "3rd"),
        (4, "4th"),
        (11, "11th"),
        (12, "12th"),
        (13, "13th"),
        (21, "21st"),
        (22, "22nd"),
        (23, "23rd"),
        (31, "31st"),
        (111, "111th"),
    ];
    for (n, expected) in cases {
        assert_eq!(ordinal(n), expected);
    }
}

#[test]
fn occurrences_between_lists_a_calendar_month() {
    let rule = ScheduleRule::weekly(1, Weekday::Tue);
    let dates = occurrences_between(&rule, d(2024, 4, 1), d(2024, 4, 30));
    assert_eq!(
        dates,
        vec![d(2024, 4, 2), d(2024, 4, 9), d(2024, 4, 16), d(2024, 4, 23), d(2024, 4, 30)]
    );
}

#[test]
fn rule_warnings_flag_clamped_values() {
    assert_eq!(
        rule_warnings(&ScheduleRule::every_n_days(0)),
        vec![RuleWarning::Interval { value: 0, applied: 1 }]
    );
    assert_eq!(
        rule_warnings(&ScheduleRule::weekly(400, Weekday::Mon)),
        vec![RuleWarning::Interval {
            value: 400,
            applied: 400
        }]
    );
    assert_eq!(
        rule_warnings(&ScheduleRule::monthly(1, 40)),
        vec![RuleWarning::DayOfMonth { value: 40 }]
    );
    assert_eq!(
        RuleWarning::DayOfMonth { value: 40 }.to_string(),
        "day of month 40 is outside 1..=31; the last day of the month will be used"
    );
    assert_eq!(
        RuleWarning::DayOfMonth { value: 0 }.to_string(),
        "day of month 0 is outside 1..=31; the 1st will be used"
    );
    assert!(rule_warnings(&ScheduleRule::monthly(1, 31)).is_empty());
}

#[test]
fn upcoming_with_huge_count_does_not_preallocate() {
    assert!(upcoming(&ScheduleRule::manual(), d(2024, 1, 1), usize::MAX).is_empty());

    // stops at the end of chrono's range instead of running forever
    let near_end = NaiveDate::MAX - Duration::days(3);
    assert_eq!(
        upcoming(&ScheduleRule::daily(), near_end, usize::MAX),
        vec![
            NaiveDate::MAX - Duration::days(2),
            NaiveDate::MAX - Duration::days(1),
            NaiveDate::MAX
        ]
    );
}

fn every_kind() -> Vec<ScheduleRule> {
    RecurrenceKind::variants()
        .iter()
        .map(|&kind| ScheduleRule {
            kind,
            interval: 2,
            weekday: Weekday::Fri,
            day_of_month: 31,
            occurrence: Occurrence::Last,
        })
        .collect()
}

#[test]
fn next_occurrence_is_none_past_the_representable_range() {
    for rule in every_kind() {
        assert_eq!(next_occurrence(&rule, NaiveDate::MAX), None, "{rule:?}");
    }
}

#[test]
fn next_occurrence_in_the_last_representable_month_stays_valid() {
    let last_year = NaiveDate::MAX.year();
    for day in 1..=31 {
        let from = d(last_year, 12, day);
        for rule in every_kind() {
            if let Some(next) = next_occurrence(&rule, from) {
                assert!(next > from && next <= NaiveDate::MAX, "{rule:?} from {from}");
            }
        }
    }
    assert_eq!(
        next_occurrence(&ScheduleRule::monthly(1, 31), d(last_year, 12, 1)),
        None
    );
}

#[test]
fn next_occurrence_from_the_earliest_date_is_defined() {
    for rule in every_kind() {
        let next = next_occurrence(&rule, NaiveDate::MIN);
        assert_eq!(next.is_some(), rule.kind != RecurrenceKind::Manual, "{rule:?}");
    }
}

#[test]
fn rule_tokens_parse_and_print() {
    let rule: ScheduleRule = "weekly:2:fri".parse().unwrap();
    assert_eq!(rule, ScheduleRule::weekly(2, Weekday::Fri));
    assert_eq!(rule.to_token(), "weekly:2:friday");
    assert_eq!(rule.to_token().parse::<ScheduleRule>().unwrap(), rule);

    assert_eq!(
        "nth:last:Friday".parse::<ScheduleRule>().unwrap(),
        ScheduleRule::nth_weekday(Occurrence::Last, Weekday::Fri)
    );
    assert_eq!(
        "monthly:15".parse::<ScheduleRule>().unwrap(),
        ScheduleRule::monthly(1, 15)
    );
    assert_eq!(
        "every:10".parse::<ScheduleRule>().unwrap(),
        ScheduleRule::every_n_days(10)
    );
    assert_eq!("DAILY".parse::<ScheduleRule>().unwrap(), ScheduleRule::daily());

    assert!(matches!(
        "yearly".parse::<ScheduleRule>(),
        Err(RuleParseError::UnknownKind(_))
    ));
    assert!(matches!(
        "weekly:2:funday".parse::<ScheduleRule>(),
        Err(RuleParseError::UnknownWeekday(_))
    ));
    assert!(matches!(
        "nth:fifth:mon".parse::<ScheduleRule>(),
        Err(RuleParseError::UnknownOccurrence(_))
    ));
    assert!(matches!(
        "every".parse::<ScheduleRule>(),
        Err(RuleParseError::Malformed { .. })
    ));
}

#[test]
fn kind_names_round_trip() {
    for kind in RecurrenceKind::variants() {
        assert_eq!(kind.as_str().parse::<RecurrenceKind>().unwrap(), *kind);
    }
}

#[test]
fn rule_json_uses_snake_case_and_defaults() {
    let rule: ScheduleRule =
        serde_json::from_str(r#"{"kind":"nth_weekday_of_month","weekday":"Mon","occurrence":"third"}"#)
            .unwrap();
    assert_eq!(rule, ScheduleRule::nth_weekday(Occurrence::Third, Weekday::Mon));
}

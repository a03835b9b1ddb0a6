#![forbid(unsafe_code)]
use chrono::NaiveDate;
use gardes::{
    build_schedule, compact_summary, expectation_report, fairness_log, median_report,
    model::{Participant, ScheduleRequest, ShiftTemplate, Tier, WeekendRule},
    report::{median, SummaryRow},
    summary_table, DeviationRow, GroupBy, ParticipantId, SummaryTable,
};

fn points_only(points: &[(&str, f64)]) -> SummaryTable {
    SummaryTable {
        labels: Vec::new(),
        rows: points
            .iter()
            .map(|(name, pts)| SummaryRow {
                participant: ParticipantId::new(name),
                tier: Tier::Junior,
                labels: Vec::new(),
                assigned_points: *pts,
                expected_points: 4.0,
            })
            .collect(),
    }
}

#[test]
fn median_deviation_lists_only_rows_beyond_tolerance() {
    let table = points_only(&[("A", 6.0), ("B", 2.0), ("C", 4.0)]);
    let rows = median_report(&table, 0.0);
    assert_eq!(
        rows,
        vec![
            DeviationRow::Points {
                participant: ParticipantId::new("A"),
                points_delta: 2.0,
            },
            DeviationRow::Points {
                participant: ParticipantId::new("B"),
                points_delta: -2.0,
            },
        ]
    );
    assert!(median_report(&table, 2.0).is_empty());
}

#[test]
fn even_count_median_is_the_mean_of_the_middle_pair() {
    assert_eq!(median([4.0, 1.0, 3.0, 2.0]), 2.5);
    assert_eq!(median(Vec::new()), 0.0);
}

// samedi + dimanche, un junior et un senior : affectation entièrement déterminée
fn weekend_pair() -> ScheduleRequest {
    let mut req = ScheduleRequest::new(
        NaiveDate::from_ymd_opt(2023, 1, 7).unwrap(),
        NaiveDate::from_ymd_opt(2023, 1, 8).unwrap(),
    );
    req.weekend = WeekendRule::saturday_sunday();
    req.add_shift(ShiftTemplate::new("D", Tier::Junior));
    req.add_shift(ShiftTemplate::new("N", Tier::Senior).with_points(2.0));
    req.add_participant(Participant::new("Alice", Tier::Junior));
    req.add_participant(Participant::new("Bob", Tier::Senior));
    req
}

#[test]
fn fairness_log_snapshot() {
    let req = weekend_pair();
    let result = build_schedule(&req, 0).unwrap();
    insta::assert_snapshot!(fairness_log(&req, &result), @r"
    Alice: total 4.0 (dev +0.0), weekend 4.0, D 4.0
    Bob: total 8.0 (dev +0.0), weekend 8.0, N 8.0
    Total point range: 4.0
    Weekend point range: 4.0
    ");
}

#[test]
fn summary_and_expectation_agree_on_a_balanced_run() {
    let req = weekend_pair();
    let result = build_schedule(&req, 0).unwrap();
    let table = summary_table(&result);

    assert_eq!(table.labels, vec!["D".to_string(), "N".to_string()]);
    let alice = &table.rows[0];
    assert_eq!(alice.participant, ParticipantId::new("Alice"));
    assert_eq!(alice.labels[0].assigned_total, 2);
    assert_eq!(alice.labels[0].expected_weekend, 2);
    assert_eq!(alice.labels[1].assigned_total, 0);
    assert!(expectation_report(&table, 0.0).is_empty());

    let by_tier = compact_summary(&result, GroupBy::Tier);
    assert_eq!(by_tier.len(), 2);
    assert_eq!(by_tier[0].key, "Junior");
    assert_eq!(by_tier[1].assigned_points, 8.0);

    let by_shift = compact_summary(&result, GroupBy::Shift);
    assert_eq!(by_shift.iter().map(|r| r.total).collect::<Vec<_>>(), vec![2, 2]);
}

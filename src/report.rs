//! Rapports dérivés d'un résultat final (lecture seule).

use crate::availability;
use crate::model::{ParticipantId, ScheduleRequest, Tier};
use crate::scheduler::{shift_points, Cell, ScheduleResult};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelSummary {
    pub label: String,
    pub assigned_total: u32,
    pub expected_total: u32,
    pub assigned_weekend: u32,
    pub expected_weekend: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    pub participant: ParticipantId,
    pub tier: Tier,
    pub labels: Vec<LabelSummary>,
    pub assigned_points: f64,
    /// Arrondi au dixième.
    pub expected_points: f64,
}

/// Tableau large : participant × label régulier, plus les points.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryTable {
    pub labels: Vec<String>,
    pub rows: Vec<SummaryRow>,
}

pub fn summary_table(result: &ScheduleResult) -> SummaryTable {
    let labels: Vec<String> = result
        .labels
        .iter()
        .filter(|l| result.targets.contains_key(*l))
        .cloned()
        .collect();

    let rows = result
        .stats
        .iter()
        .map(|(id, stats)| SummaryRow {
            participant: id.clone(),
            tier: stats.tier,
            labels: labels
                .iter()
                .map(|label| {
                    let tally = result.tally(label, id);
                    let target = result.target(label, id);
                    LabelSummary {
                        label: label.clone(),
                        assigned_total: tally.total,
                        expected_total: target.total,
                        assigned_weekend: tally.weekend,
                        expected_weekend: target.weekend,
                    }
                })
                .collect(),
            assigned_points: stats.points,
            expected_points: round1(result.expected_points.get(id).copied().unwrap_or(0.0)),
        })
        .collect();

    SummaryTable { labels, rows }
}

/// Ligne d'écart signé (par rapport à la médiane ou à l'attendu).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DeviationRow {
    Label {
        participant: ParticipantId,
        label: String,
        total_delta: f64,
        weekend_delta: f64,
    },
    Points {
        participant: ParticipantId,
        points_delta: f64,
    },
}

/// Écarts à la médiane (total et week-end par label, puis points), au-delà de `tolerance`.
pub fn median_report(table: &SummaryTable, tolerance: f64) -> Vec<DeviationRow> {
    let mut out = Vec::new();

    for (idx, label) in table.labels.iter().enumerate() {
        let med_total = median(table.rows.iter().map(|r| f64::from(r.labels[idx].assigned_total)));
        let med_weekend =
            median(table.rows.iter().map(|r| f64::from(r.labels[idx].assigned_weekend)));
        for row in &table.rows {
            let total_delta = f64::from(row.labels[idx].assigned_total) - med_total;
            let weekend_delta = f64::from(row.labels[idx].assigned_weekend) - med_weekend;
            if total_delta.abs() > tolerance || weekend_delta.abs() > tolerance {
                out.push(DeviationRow::Label {
                    participant: row.participant.clone(),
                    label: label.clone(),
                    total_delta,
                    weekend_delta,
                });
            }
        }
    }

    let med_points = median(table.rows.iter().map(|r| r.assigned_points));
    for row in &table.rows {
        let points_delta = row.assigned_points - med_points;
        if points_delta.abs() > tolerance {
            out.push(DeviationRow::Points {
                participant: row.participant.clone(),
                points_delta,
            });
        }
    }
    out
}

/// Écarts entre assigné et attendu (quotas entiers, points attendus).
pub fn expectation_report(table: &SummaryTable, tolerance: f64) -> Vec<DeviationRow> {
    let mut out = Vec::new();
    for row in &table.rows {
        for summary in &row.labels {
            let total_delta = f64::from(summary.assigned_total) - f64::from(summary.expected_total);
            let weekend_delta =
                f64::from(summary.assigned_weekend) - f64::from(summary.expected_weekend);
            if total_delta.abs() > tolerance || weekend_delta.abs() > tolerance {
                out.push(DeviationRow::Label {
                    participant: row.participant.clone(),
                    label: summary.label.clone(),
                    total_delta,
                    weekend_delta,
                });
            }
        }
    }
    for row in &table.rows {
        let points_delta = row.assigned_points - row.expected_points;
        if points_delta.abs() > tolerance {
            out.push(DeviationRow::Points {
                participant: row.participant.clone(),
                points_delta,
            });
        }
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupBy {
    Participant,
    Tier,
    Shift,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompactRow {
    pub key: String,
    pub total: u32,
    pub weekend: u32,
    pub assigned_points: f64,
    pub expected_points: f64,
}

/// Résumé compact, éventuellement regroupé par niveau ou par label.
pub fn compact_summary(result: &ScheduleResult, group_by: GroupBy) -> Vec<CompactRow> {
    let regular: Vec<&String> = result
        .labels
        .iter()
        .filter(|l| result.targets.contains_key(*l))
        .collect();

    let per_participant = || {
        result.stats.iter().map(|(id, stats)| {
            let (total, weekend) = regular.iter().fold((0, 0), |(t, w), label| {
                let tally = result.tally(label, id);
                (t + tally.total, w + tally.weekend)
            });
            let expected = round1(result.expected_points.get(id).copied().unwrap_or(0.0));
            (id, stats.tier, total, weekend, stats.points, expected)
        })
    };

    match group_by {
        GroupBy::Participant => per_participant()
            .map(|(id, _, total, weekend, points, expected)| CompactRow {
                key: id.to_string(),
                total,
                weekend,
                assigned_points: points,
                expected_points: expected,
            })
            .collect(),
        GroupBy::Tier => {
            let mut groups: BTreeMap<Tier, CompactRow> = BTreeMap::new();
            for (_, tier, total, weekend, points, expected) in per_participant() {
                let row = groups.entry(tier).or_insert_with(|| CompactRow {
                    key: tier.to_string(),
                    total: 0,
                    weekend: 0,
                    assigned_points: 0.0,
                    expected_points: 0.0,
                });
                row.total += total;
                row.weekend += weekend;
                row.assigned_points += points;
                row.expected_points += expected;
            }
            groups.into_values().collect()
        }
        GroupBy::Shift => regular
            .iter()
            .map(|label| {
                let (total, weekend) = result.stats.keys().fold((0, 0), |(t, w), id| {
                    let tally = result.tally(label, id);
                    (t + tally.total, w + tally.weekend)
                });
                CompactRow {
                    key: (*label).clone(),
                    total,
                    weekend,
                    assigned_points: 0.0,
                    expected_points: 0.0,
                }
            })
            .collect(),
    }
}

/// Journal d'équité lisible : une ligne par participant puis les amplitudes.
pub fn fairness_log(request: &ScheduleRequest, result: &ScheduleResult) -> String {
    #[derive(Default)]
    struct Points {
        total: f64,
        weekend: f64,
        labels: BTreeMap<String, f64>,
    }

    let mut by_person: BTreeMap<&ParticipantId, Points> =
        result.stats.keys().map(|id| (id, Points::default())).collect();

    for row in &result.rows {
        for (idx, cell) in row.cells.iter().enumerate() {
            let Cell::Assigned(pid) = cell else {
                continue;
            };
            let Some(template) = request.find_shift(&result.labels[idx]) else {
                continue;
            };
            let pts = shift_points(row.date, template, &request.weekend);
            let entry = by_person.entry(pid).or_default();
            entry.total += pts;
            *entry.labels.entry(template.label.clone()).or_insert(0.0) += pts;
            if availability::is_weekend(row.date, template, &request.weekend) {
                entry.weekend += pts;
            }
        }
    }

    let mut lines = Vec::with_capacity(by_person.len() + 2);
    for (id, info) in &by_person {
        let expected = result.expected_points.get(*id).copied().unwrap_or(0.0);
        let mut line = format!(
            "{id}: total {:.1} (dev {:+.1}), weekend {:.1}",
            info.total,
            round1(info.total - expected),
            info.weekend
        );
        for (label, pts) in &info.labels {
            line.push_str(&format!(", {label} {pts:.1}"));
        }
        lines.push(line);
    }

    let range = |values: Vec<f64>| -> Option<f64> {
        let max = values.iter().copied().reduce(f64::max)?;
        let min = values.iter().copied().reduce(f64::min)?;
        Some(max - min)
    };
    if let Some(r) = range(by_person.values().map(|p| p.total).collect()) {
        lines.push(format!("Total point range: {r:.1}"));
    }
    if let Some(r) = range(by_person.values().map(|p| p.weekend).collect()) {
        lines.push(format!("Weekend point range: {r:.1}"));
    }
    lines.join("\n")
}

/// Médiane ; moyenne des deux valeurs centrales pour un effectif pair, 0 si vide.
pub fn median(values: impl IntoIterator<Item = f64>) -> f64 {
    let mut v: Vec<f64> = values.into_iter().collect();
    if v.is_empty() {
        return 0.0;
    }
    v.sort_by(f64::total_cmp);
    let mid = v.len() / 2;
    if v.len() % 2 == 0 {
        (v[mid - 1] + v[mid]) / 2.0
    } else {
        v[mid]
    }
}

fn round1(v: f64) -> f64 {
    let r = (v * 10.0).round() / 10.0;
    // pas de "-0.0" à l'affichage
    if r == 0.0 {
        0.0
    } else {
        r
    }
}

use super::{Cell, Conflict, ConflictKind, ScheduleResult};
use crate::availability::Availability;
use crate::model::{ParticipantId, ScheduleRequest};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Vérifie a posteriori toutes les contraintes dures d'un résultat.
pub fn detect_conflicts(request: &ScheduleRequest, result: &ScheduleResult) -> Vec<Conflict> {
    let mut out = Vec::new();
    let availability = Availability::new(&request.windows);
    let opts = request.options;

    // (date, label, night float)
    let mut by_person: BTreeMap<&ParticipantId, Vec<(NaiveDate, &str, bool)>> = BTreeMap::new();

    for row in &result.rows {
        for (idx, cell) in row.cells.iter().enumerate() {
            let Cell::Assigned(pid) = cell else {
                continue;
            };
            let label = result.labels[idx].as_str();
            let conflict = |kind| Conflict {
                participant: pid.clone(),
                date: row.date,
                label: label.to_string(),
                other: None,
                kind,
            };

            let (Some(person), Some(template)) =
                (request.find_participant(pid), request.find_shift(label))
            else {
                out.push(conflict(ConflictKind::UnknownParticipant));
                continue;
            };
            if person.tier != template.tier {
                out.push(conflict(ConflictKind::TierMismatch));
            }
            if availability.on_leave(pid, row.date) {
                out.push(conflict(ConflictKind::OnLeave));
            }
            if !availability.is_active_rotator(pid, row.date) {
                out.push(conflict(ConflictKind::InactiveRotator));
            }
            by_person
                .entry(pid)
                .or_default()
                .push((row.date, label, template.night_float));
        }
    }

    for (pid, shifts) in &by_person {
        for (i, (da, la, nfa)) in shifts.iter().enumerate() {
            for (db, lb, nfb) in shifts.iter().skip(i + 1) {
                let gap = (*db - *da).num_days().abs();
                // l'écart minimal ne concerne que les gardes régulières ;
                // les blocs night float sont contrôlés par leur longueur
                let gap_applies = !(*nfa && *nfb);
                let kind = if gap == 0 && opts.same_day_exclusive {
                    Some(ConflictKind::DoubleAssignment)
                } else if gap_applies && gap < i64::from(opts.min_gap_days) {
                    Some(ConflictKind::RestViolation)
                } else {
                    None
                };
                if let Some(kind) = kind {
                    out.push(Conflict {
                        participant: (*pid).clone(),
                        date: *da,
                        label: la.to_string(),
                        other: Some((*db, lb.to_string())),
                        kind,
                    });
                }
            }
        }
    }

    out.extend(night_float_runs(request, result));
    out
}

/// Chaque suite maximale de jours consécutifs d'un même participant sur un label
/// night float dure exactement la longueur de bloc ; une suite plus courte n'est
/// admise que si elle touche une case vide du même label (bloc partiellement vide).
fn night_float_runs(request: &ScheduleRequest, result: &ScheduleResult) -> Vec<Conflict> {
    let block = request.options.night_float_block_length as usize;
    let mut out = Vec::new();
    if block <= 1 {
        return out;
    }

    for template in request.shifts.iter().filter(|t| t.night_float) {
        let Some(idx) = result.label_index(&template.label) else {
            continue;
        };
        let unfilled_at = |row: Option<usize>| {
            row.and_then(|r| result.rows.get(r))
                .and_then(|r| r.cells.get(idx))
                .is_some_and(Cell::is_unfilled)
        };

        let mut rows_of: BTreeMap<&ParticipantId, Vec<usize>> = BTreeMap::new();
        for (r, row) in result.rows.iter().enumerate() {
            if let Some(Cell::Assigned(pid)) = row.cells.get(idx) {
                rows_of.entry(pid).or_default().push(r);
            }
        }

        for (pid, rows) in rows_of {
            for (first, last) in runs(&rows) {
                let len = last - first + 1;
                let partial = len < block
                    && (unfilled_at(first.checked_sub(1)) || unfilled_at(Some(last + 1)));
                if len != block && !partial {
                    out.push(Conflict {
                        participant: pid.clone(),
                        date: result.rows[first].date,
                        label: template.label.clone(),
                        other: Some((result.rows[last].date, template.label.clone())),
                        kind: ConflictKind::NightFloatRun,
                    });
                }
            }
        }
    }
    out
}

/// Découpe des indices croissants en suites consécutives (premier, dernier).
fn runs(rows: &[usize]) -> Vec<(usize, usize)> {
    let mut out = Vec::new();
    let Some(&head) = rows.first() else {
        return out;
    };
    let (mut first, mut last) = (head, head);
    for &r in &rows[1..] {
        if r == last + 1 {
            last = r;
        } else {
            out.push((first, last));
            first = r;
            last = r;
        }
    }
    out.push((first, last));
    out
}

use super::QuotaTarget;
use crate::model::{ParticipantId, ScheduleRequest, Tier};
use crate::quota::{allocate_integer_quotas, fair_shares, normalize_overall_quota};
use chrono::NaiveDate;
use std::collections::BTreeMap;

pub(super) struct Quotas {
    /// [template][participant]
    pub targets: Vec<Vec<QuotaTarget>>,
    pub weekend_slots: Vec<u32>,
    pub expected_points: Vec<f64>,
}

/// Quotas entiers par label régulier et points attendus par participant.
///
/// Poids = biais × jours actifs (rotation) ; les gardes supplémentaires sont
/// réparties sur les labels du niveau au prorata de leur nombre de créneaux.
pub(super) fn compute(
    request: &ScheduleRequest,
    dates: &[NaiveDate],
    weekend: &[Vec<bool>],
    pools: &[Vec<usize>],
    rotation_days: &[usize],
) -> Quotas {
    let people = &request.participants;
    let n_days = dates.len();
    let mut targets = vec![vec![QuotaTarget::default(); people.len()]; request.shifts.len()];
    let mut weekend_slots = vec![0u32; request.shifts.len()];
    let mut expected_points = vec![0.0; people.len()];

    let tier_slots = |tier: Tier| -> f64 {
        let labels = request
            .shifts
            .iter()
            .filter(|t| !t.night_float && t.tier == tier)
            .count();
        (labels * n_days) as f64
    };

    let mut by_tier: BTreeMap<Tier, BTreeMap<String, BTreeMap<ParticipantId, u32>>> =
        BTreeMap::new();

    for (t, template) in request.shifts.iter().enumerate() {
        let weekend_count = weekend[t].iter().filter(|w| **w).count();
        weekend_slots[t] = weekend_count as u32;
        if template.night_float || pools[t].is_empty() {
            continue;
        }

        let slots = n_days as f64;
        let weights: BTreeMap<ParticipantId, f64> = pools[t]
            .iter()
            .map(|&p| (people[p].id.clone(), people[p].bias * rotation_days[p] as f64))
            .collect();

        let per_tier = tier_slots(template.tier);
        let mut extras: BTreeMap<ParticipantId, f64> = pools[t]
            .iter()
            .map(|&p| {
                let e = f64::from(people[p].extra_oncalls) * slots / per_tier;
                (people[p].id.clone(), e)
            })
            .collect();
        let extra_sum: f64 = extras.values().sum();
        if extra_sum > slots {
            let scale = slots / extra_sum;
            extras.values_mut().for_each(|e| *e *= scale);
        }
        let reserved: f64 = extras.values().sum();

        let base = fair_shares(&weights, slots - reserved);
        let share_total: BTreeMap<ParticipantId, f64> = base
            .iter()
            .map(|(id, s)| (id.clone(), s + extras.get(id).copied().unwrap_or(0.0)))
            .collect();
        // part week-end prise dans la part totale : jamais au-dessus d'elle
        let share_weekend: BTreeMap<ParticipantId, f64> = share_total
            .iter()
            .map(|(id, st)| (id.clone(), weekend_count as f64 * st / slots))
            .collect();

        let total_q = allocate_integer_quotas(&share_total, n_days as i64);
        let mut weekend_q = allocate_integer_quotas(&share_weekend, weekend_count as i64);
        cap_weekend_by_total(&total_q, &mut weekend_q);

        for &p in &pools[t] {
            let id = &people[p].id;
            targets[t][p] = QuotaTarget {
                total: total_q.get(id).copied().unwrap_or(0),
                weekend: weekend_q.get(id).copied().unwrap_or(0),
            };
            let st = share_total.get(id).copied().unwrap_or(0.0);
            let sw = share_weekend.get(id).copied().unwrap_or(0.0);
            expected_points[p] += template.points * (st - sw) + template.points * 2.0 * sw;
        }

        by_tier
            .entry(template.tier)
            .or_default()
            .insert(template.label.clone(), total_q);
    }

    let span = n_days;
    for (tier, mut quotas) in by_tier {
        let uniform: Vec<ParticipantId> = people
            .iter()
            .enumerate()
            .filter(|(idx, p)| {
                p.tier == tier
                    && !p.night_float
                    && (p.bias - 1.0).abs() < 1e-9
                    && p.extra_oncalls == 0
                    && rotation_days[*idx] == span
            })
            .map(|(_, p)| p.id.clone())
            .collect();
        normalize_overall_quota(&mut quotas, &uniform, request.options.quota_tolerance);

        for (t, template) in request.shifts.iter().enumerate() {
            let Some(q) = quotas.get(&template.label) else {
                continue;
            };
            if template.night_float || template.tier != tier {
                continue;
            }
            let mut weekend_q: BTreeMap<ParticipantId, u32> = pools[t]
                .iter()
                .map(|&p| (people[p].id.clone(), targets[t][p].weekend))
                .collect();
            cap_weekend_by_total(q, &mut weekend_q);
            for &p in &pools[t] {
                let id = &people[p].id;
                targets[t][p].total = q.get(id).copied().unwrap_or(0);
                targets[t][p].weekend = weekend_q.get(id).copied().unwrap_or(0);
            }
        }
    }

    Quotas {
        targets,
        weekend_slots,
        expected_points,
    }
}

/// Ramène chaque quota week-end sous le quota total du même participant ; les
/// unités retirées vont, dans l'ordre des clés, à ceux qui ont encore de la marge.
fn cap_weekend_by_total(
    total: &BTreeMap<ParticipantId, u32>,
    weekend: &mut BTreeMap<ParticipantId, u32>,
) {
    let mut excess = 0;
    for (id, w) in weekend.iter_mut() {
        let cap = total.get(id).copied().unwrap_or(0);
        if *w > cap {
            excess += *w - cap;
            *w = cap;
        }
    }
    for (id, w) in weekend.iter_mut() {
        if excess == 0 {
            break;
        }
        let cap = total.get(id).copied().unwrap_or(0);
        let room = cap.saturating_sub(*w).min(excess);
        *w += room;
        excess -= room;
    }
}

use super::Scheduler;
use crate::model::Tier;
use std::collections::BTreeMap;

/// Pré-assignation night float : template → (jour → participant).
#[derive(Debug, Default)]
pub(super) struct NightFloatPlan {
    pub assignments: Vec<(usize, BTreeMap<usize, usize>)>,
    /// (jour, template)
    pub unfilled: Vec<(usize, usize)>,
}

/// Découpe la période en blocs contigus et fait tourner le pool de chaque template.
///
/// Le bloc `i` revient à `pool[(i + k) % len]`, `k` étant le rang du template parmi
/// les night float du même niveau. Le décalage `k` sert uniquement à ce que deux
/// templates night float d'un même niveau ne tirent pas la même personne le même
/// jour ; avec un seul template par niveau, `k = 0`.
///
/// Un bloc tronqué par la fin de période, ou dont l'assigné couvrirait aussi le
/// bloc précédent, reste vide en entier.
pub(super) fn plan(scheduler: &Scheduler) -> NightFloatPlan {
    let block = scheduler.opts.night_float_block_length.max(1) as usize;
    let n_days = scheduler.dates.len();
    let mut out = NightFloatPlan::default();
    let mut used_by_day: Vec<Vec<usize>> = vec![Vec::new(); n_days];
    let mut rank_by_tier: BTreeMap<Tier, usize> = BTreeMap::new();

    for (t, template) in scheduler.request.shifts.iter().enumerate() {
        if !template.night_float {
            continue;
        }
        let rank = rank_by_tier.entry(template.tier).or_insert(0);
        let offset = *rank;
        *rank += 1;

        let pool = &scheduler.pools[t];
        let mut by_day = BTreeMap::new();
        let mut previous: Option<usize> = None;

        for (i, start) in (0..n_days).step_by(block).enumerate() {
            let end = (start + block).min(n_days);
            if pool.is_empty() {
                out.unfilled.extend((start..end).map(|day| (day, t)));
                continue;
            }

            let assignee = pool[(i + offset) % pool.len()];
            let truncated = end - start < block;
            if truncated || previous == Some(assignee) {
                out.unfilled.extend((start..end).map(|day| (day, t)));
                previous = None;
                continue;
            }
            previous = Some(assignee);

            for day in start..end {
                let taken = scheduler.opts.same_day_exclusive && used_by_day[day].contains(&assignee);
                if !scheduler.available[assignee][day] || taken {
                    out.unfilled.push((day, t));
                } else {
                    by_day.insert(day, assignee);
                    used_by_day[day].push(assignee);
                }
            }
        }
        out.assignments.push((t, by_day));
    }

    out
}

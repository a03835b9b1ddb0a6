use super::night_float::NightFloatPlan;
use super::{util, Scheduler};
use rand::seq::SliceRandom;

/// Passe unique jour par jour : night float d'abord, puis chaque label régulier.
pub(super) fn assign_days(scheduler: &mut Scheduler, plan: &NightFloatPlan) {
    scheduler.unfilled.extend(plan.unfilled.iter().copied());
    let regular = scheduler.regular_templates();

    for day in 0..scheduler.dates.len() {
        let mut nf_today = Vec::new();
        for (t, by_day) in &plan.assignments {
            if let Some(&p) = by_day.get(&day) {
                scheduler.place(day, *t, p);
                scheduler.expected_points[p] += scheduler.cell_points(day, *t);
                scheduler.last_assigned[p] = Some(day);
                nf_today.push(p);
            }
        }

        for &t in &regular {
            match pick_candidate(scheduler, day, t, &nf_today) {
                Some(p) => {
                    scheduler.place(day, t, p);
                    scheduler.last_assigned[p] = Some(day);
                }
                None => scheduler.unfilled.push((day, t)),
            }
        }
    }
}

fn pick_candidate(scheduler: &mut Scheduler, day: usize, t: usize, nf_today: &[usize]) -> Option<usize> {
    let weekend = scheduler.weekend[t][day];
    let weekend_quota = weekend && scheduler.weekend_slots[t] > 0;

    let mut eligible: Vec<usize> = scheduler.pools[t]
        .iter()
        .copied()
        .filter(|&p| {
            !nf_today.contains(&p)
                && scheduler.available[p][day]
                && scheduler.gap_ok(p, day)
                && !(scheduler.opts.same_day_exclusive && scheduler.assigned_on(p, day))
        })
        // un dépassement d'une unité est toléré, le rééquilibrage le corrige
        .filter(|&p| scheduler.tallies[p][t].total < scheduler.targets[t][p].total + 1)
        .collect();

    if weekend_quota {
        let under_weekend: Vec<usize> = eligible
            .iter()
            .copied()
            .filter(|&p| scheduler.tallies[p][t].weekend < scheduler.targets[t][p].weekend)
            .collect();
        if !under_weekend.is_empty() {
            eligible = under_weekend;
        }
    }
    if eligible.is_empty() {
        return None;
    }

    let mut under: Vec<usize> = Vec::new();
    if weekend_quota {
        under = eligible
            .iter()
            .copied()
            .filter(|&p| scheduler.tallies[p][t].weekend < scheduler.targets[t][p].weekend)
            .collect();
    }
    if under.is_empty() {
        under = eligible
            .iter()
            .copied()
            .filter(|&p| scheduler.tallies[p][t].total < scheduler.targets[t][p].total)
            .collect();
    }

    if !under.is_empty() {
        under.shuffle(&mut scheduler.rng);
        return under.first().copied();
    }

    eligible.shuffle(&mut scheduler.rng);
    let deficit = |p: usize| {
        let target = scheduler.targets[t][p];
        let tally = scheduler.tallies[p][t];
        (
            i64::from(target.weekend) - i64::from(tally.weekend),
            i64::from(target.total) - i64::from(tally.total),
        )
    };
    util::first_max_by(&eligible, deficit, |a, b| a.cmp(b))
}

impl Scheduler<'_> {
    /// Dernière garde (tous labels) au moins `min_gap_days` jours avant `day`.
    pub(super) fn gap_ok(&self, p: usize, day: usize) -> bool {
        match self.last_assigned[p] {
            None => true,
            Some(last) => day.saturating_sub(last) >= self.opts.min_gap_days as usize,
        }
    }
}

use super::{util, Scheduler};
use tracing::debug;

/// Relance le comblement au plus `filler_max_passes` fois, tant que le nombre de
/// cases vides diminue.
pub(super) fn fill_unassigned(scheduler: &mut Scheduler) {
    for pass in 0..scheduler.opts.filler_max_passes {
        let before = scheduler.unfilled.len();
        if before == 0 {
            break;
        }
        fill_pass(scheduler);
        debug!(pass, before, after = scheduler.unfilled.len(), "filler pass");
        if scheduler.unfilled.len() >= before {
            break;
        }
    }
}

fn fill_pass(scheduler: &mut Scheduler) {
    let pending = std::mem::take(&mut scheduler.unfilled);
    let mut still = Vec::new();

    for (day, t) in pending {
        if scheduler.grid[day][t].is_some() {
            continue;
        }
        // les blocs night float ne sont jamais complétés par le pool régulier
        if scheduler.request.shifts[t].night_float {
            still.push((day, t));
            continue;
        }

        let candidates: Vec<usize> = scheduler.pools[t]
            .iter()
            .copied()
            .filter(|&p| !scheduler.assigned_on(p, day) && !scheduler.violates(p, day, &[]))
            .collect();

        let weekend = scheduler.weekend[t][day];
        let priority = |p: usize| {
            let target = scheduler.targets[t][p];
            let tally = scheduler.tallies[p][t];
            let weekend_deficit = if weekend {
                i64::from(target.weekend) - i64::from(tally.weekend)
            } else {
                0
            };
            (
                scheduler.expected_points[p] - scheduler.points[p],
                weekend_deficit,
                i64::from(target.total) - i64::from(tally.total),
            )
        };

        match util::first_max_by(&candidates, priority, |a, b| util::cmp_deficit(*a, *b)) {
            Some(p) => {
                scheduler.place(day, t, p);
                scheduler.recompute_last(p);
            }
            None => still.push((day, t)),
        }
    }

    scheduler.unfilled = still;
}

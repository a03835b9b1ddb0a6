use crate::availability;
use crate::model::{ShiftTemplate, WeekendRule};
use chrono::NaiveDate;
use std::cmp::Ordering;

/// Points d'une occurrence : doublés en week-end et en night float.
pub fn shift_points(date: NaiveDate, template: &ShiftTemplate, rule: &WeekendRule) -> f64 {
    if template.night_float || availability::is_weekend(date, template, rule) {
        template.points * 2.0
    } else {
        template.points
    }
}

/// Comparaison lexicographique des tuples de déficit (points, week-end, total).
pub(super) fn cmp_deficit(a: (f64, i64, i64), b: (f64, i64, i64)) -> Ordering {
    a.0.total_cmp(&b.0)
        .then(a.1.cmp(&b.1))
        .then(a.2.cmp(&b.2))
}

/// Premier élément maximal selon `key` (à égalité, l'ordre d'entrée décide).
pub(super) fn first_max_by<T: Copy, K>(
    items: &[T],
    mut key: impl FnMut(T) -> K,
    mut cmp: impl FnMut(&K, &K) -> Ordering,
) -> Option<T> {
    let mut best: Option<(T, K)> = None;
    for &item in items {
        let k = key(item);
        let better = match &best {
            None => true,
            Some((_, bk)) => cmp(&k, bk) == Ordering::Greater,
        };
        if better {
            best = Some((item, k));
        }
    }
    best.map(|(item, _)| item)
}

pub(super) const POINTS_EPS: f64 = 1e-9;

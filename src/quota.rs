//! Répartition entière des quotas (plus forts restes, Hare–Niemeyer) et
//! normalisation globale entre labels.

use std::collections::BTreeMap;

/// Parts fractionnaires proportionnelles aux poids, de somme `slots`.
/// Si tous les poids sont nuls, la répartition est égale.
pub fn fair_shares<K: Ord + Clone>(weights: &BTreeMap<K, f64>, slots: f64) -> BTreeMap<K, f64> {
    if weights.is_empty() {
        return BTreeMap::new();
    }
    let sum: f64 = weights.values().map(|w| clean(*w)).sum();
    if sum <= 0.0 {
        let even = slots / weights.len() as f64;
        return weights.keys().map(|k| (k.clone(), even)).collect();
    }
    weights
        .iter()
        .map(|(k, w)| (k.clone(), slots * clean(*w) / sum))
        .collect()
}

/// Convertit des parts fractionnaires en entiers de somme exactement `total_slots`.
///
/// Chaque part est arrondie à l'entier inférieur, puis le manque est distribué une
/// unité à la fois aux plus forts restes ; à reste égal, l'ordre des clés décide.
/// Si `total_slots <= 0` ou si `shares` est vide, tout vaut 0.
pub fn allocate_integer_quotas<K: Ord + Clone>(
    shares: &BTreeMap<K, f64>,
    total_slots: i64,
) -> BTreeMap<K, u32> {
    if total_slots <= 0 || shares.is_empty() {
        return shares.keys().map(|k| (k.clone(), 0)).collect();
    }

    let mut base: BTreeMap<K, u32> = BTreeMap::new();
    let mut remainders: Vec<(K, f64)> = Vec::with_capacity(shares.len());
    for (k, share) in shares {
        let share = clean(*share);
        let floor = share.floor();
        base.insert(k.clone(), floor as u32);
        remainders.push((k.clone(), share - floor));
    }
    // tri stable : les clés restent en ordre croissant à reste égal
    remainders.sort_by(|a, b| b.1.total_cmp(&a.1));

    let used: i64 = base.values().map(|v| i64::from(*v)).sum();
    let mut shortfall = total_slots - used;

    while shortfall > 0 {
        for (k, _) in &remainders {
            if shortfall == 0 {
                break;
            }
            if let Some(v) = base.get_mut(k) {
                *v += 1;
                shortfall -= 1;
            }
        }
    }

    // parts dont la somme dépasse la cible : on retire aux plus petits restes
    while shortfall < 0 {
        for (k, _) in remainders.iter().rev() {
            if shortfall == 0 {
                break;
            }
            if let Some(v) = base.get_mut(k) {
                if *v > 0 {
                    *v -= 1;
                    shortfall += 1;
                }
            }
        }
    }

    base
}

/// Rapproche le total (somme sur les labels) de chaque participant de la moyenne.
///
/// À chaque itération, une unité passe du participant le plus au-dessus de la
/// moyenne au plus en dessous, sur un label où le premier a un quota supérieur au
/// second. S'arrête quand les deux extrêmes sont dans la tolérance, quand leur écart
/// est inférieur à 2, ou quand aucun label ne permet le transfert.
pub fn normalize_overall_quota<K: Ord + Clone>(
    quotas: &mut BTreeMap<String, BTreeMap<K, u32>>,
    participants: &[K],
    tolerance: f64,
) {
    if participants.len() < 2 {
        return;
    }

    let mut totals: BTreeMap<K, i64> = participants
        .iter()
        .map(|p| {
            let sum = quotas
                .values()
                .map(|q| i64::from(q.get(p).copied().unwrap_or(0)))
                .sum();
            (p.clone(), sum)
        })
        .collect();
    let mean = totals.values().sum::<i64>() as f64 / participants.len() as f64;

    loop {
        let Some((over, under)) = extremes(participants, &totals) else {
            return;
        };
        let over_total = totals[&over];
        let under_total = totals[&under];
        if (over_total as f64 - mean).abs() <= tolerance
            && (under_total as f64 - mean).abs() <= tolerance
        {
            return;
        }
        if over_total - under_total < 2 {
            return;
        }

        let label = quotas.iter().find_map(|(label, q)| match (q.get(&over), q.get(&under)) {
            (Some(a), Some(b)) if a > b => Some(label.clone()),
            _ => None,
        });
        let Some(label) = label else {
            return;
        };

        if let Some(q) = quotas.get_mut(&label) {
            if let Some(v) = q.get_mut(&over) {
                *v -= 1;
            }
            if let Some(v) = q.get_mut(&under) {
                *v += 1;
            }
        }
        if let Some(t) = totals.get_mut(&over) {
            *t -= 1;
        }
        if let Some(t) = totals.get_mut(&under) {
            *t += 1;
        }
    }
}

fn extremes<K: Ord + Clone>(participants: &[K], totals: &BTreeMap<K, i64>) -> Option<(K, K)> {
    let mut over: Option<&K> = None;
    let mut under: Option<&K> = None;
    for p in participants {
        let t = totals.get(p)?;
        if over.map_or(true, |o| *t > totals[o]) {
            over = Some(p);
        }
        if under.map_or(true, |u| *t < totals[u]) {
            under = Some(p);
        }
    }
    Some((over?.clone(), under?.clone()))
}

fn clean(v: f64) -> f64 {
    if v.is_finite() && v > 0.0 {
        v
    } else {
        0.0
    }
}

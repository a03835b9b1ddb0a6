//! Prédicats de disponibilité : week-end, congés, fenêtres de rotation.

use crate::model::{AvailabilityWindow, ParticipantId, ShiftTemplate, WeekendRule, WindowKind};
use chrono::{Datelike, NaiveDate};
use std::collections::HashMap;

/// Vrai si `date` compte comme week-end pour `template`.
pub fn is_weekend(date: NaiveDate, template: &ShiftTemplate, rule: &WeekendRule) -> bool {
    let weekday = date.weekday();
    rule.days.contains(&weekday) || (template.weekend_extra_day && weekday == rule.extra_day)
}

/// Index des fenêtres par participant, construit une fois par exécution.
#[derive(Debug, Clone, Default)]
pub struct Availability {
    leaves: HashMap<ParticipantId, Vec<(NaiveDate, NaiveDate)>>,
    rotations: HashMap<ParticipantId, Vec<(NaiveDate, NaiveDate)>>,
}

impl Availability {
    pub fn new(windows: &[AvailabilityWindow]) -> Self {
        let mut out = Self::default();
        for w in windows {
            let target = match w.kind {
                WindowKind::Leave => &mut out.leaves,
                WindowKind::Rotation => &mut out.rotations,
            };
            target
                .entry(w.participant.clone())
                .or_default()
                .push((w.from, w.to));
        }
        out
    }

    pub fn on_leave(&self, participant: &ParticipantId, date: NaiveDate) -> bool {
        self.leaves
            .get(participant)
            .is_some_and(|ranges| ranges.iter().any(|(from, to)| *from <= date && date <= *to))
    }

    /// Sans fenêtre de rotation : toujours actif. Sinon actif seulement dans l'union de ses fenêtres.
    pub fn is_active_rotator(&self, participant: &ParticipantId, date: NaiveDate) -> bool {
        match self.rotations.get(participant) {
            None => true,
            Some(ranges) => ranges.iter().any(|(from, to)| *from <= date && date <= *to),
        }
    }

    pub fn is_available(&self, participant: &ParticipantId, date: NaiveDate) -> bool {
        !self.on_leave(participant, date) && self.is_active_rotator(participant, date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Tier;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, day).unwrap()
    }

    #[test]
    fn weekend_extra_day_only_for_opted_in_template() {
        let rule = WeekendRule::default();
        let plain = ShiftTemplate::new("ER night", Tier::Junior);
        let thursday = plain.clone().with_extra_weekend_day();

        // 2025-01-02 est un jeudi, 2025-01-03 un vendredi
        assert!(!is_weekend(d(2), &plain, &rule));
        assert!(is_weekend(d(2), &thursday, &rule));
        assert!(is_weekend(d(3), &plain, &rule));
        assert!(!is_weekend(d(1), &thursday, &rule));
    }

    #[test]
    fn rotation_windows_are_a_union() {
        let a = ParticipantId::new("A");
        let b = ParticipantId::new("B");
        let avail = Availability::new(&[
            AvailabilityWindow::rotation(&a, d(1), d(3)),
            AvailabilityWindow::rotation(&a, d(10), d(12)),
            AvailabilityWindow::leave(&b, d(5), d(5)),
        ]);

        assert!(avail.is_active_rotator(&a, d(2)));
        assert!(!avail.is_active_rotator(&a, d(5)));
        assert!(avail.is_active_rotator(&a, d(11)));
        assert!(avail.is_active_rotator(&b, d(20)));

        assert!(avail.on_leave(&b, d(5)));
        assert!(!avail.on_leave(&b, d(6)));
        assert!(!avail.is_available(&b, d(5)));
    }
}

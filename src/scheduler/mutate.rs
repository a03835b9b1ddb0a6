use super::{util, Scheduler};

impl Scheduler<'_> {
    pub(super) fn cell_points(&self, day: usize, t: usize) -> f64 {
        util::shift_points(self.dates[day], &self.request.shifts[t], &self.request.weekend)
    }

    /// Écrit `p` dans la case et met à jour compteurs et points.
    pub(super) fn place(&mut self, day: usize, t: usize, p: usize) {
        debug_assert!(self.grid[day][t].is_none());
        self.grid[day][t] = Some(p);
        self.tallies[p][t].total += 1;
        if self.weekend[t][day] {
            self.tallies[p][t].weekend += 1;
        }
        self.points[p] += self.cell_points(day, t);
    }

    /// Vide la case et rend l'ancien assigné.
    pub(super) fn remove(&mut self, day: usize, t: usize) -> Option<usize> {
        let p = self.grid[day][t].take()?;
        self.tallies[p][t].total -= 1;
        if self.weekend[t][day] {
            self.tallies[p][t].weekend -= 1;
        }
        self.points[p] -= self.cell_points(day, t);
        Some(p)
    }

    /// Échange les assignés de deux cases remplies.
    pub(super) fn swap_cells(&mut self, a: (usize, usize), b: (usize, usize)) {
        let (Some(pa), Some(pb)) = (self.remove(a.0, a.1), self.remove(b.0, b.1)) else {
            return;
        };
        self.place(a.0, a.1, pb);
        self.place(b.0, b.1, pa);
        self.recompute_last(pa);
        self.recompute_last(pb);
    }

    /// Réattribue une case remplie à `to`.
    pub(super) fn transfer(&mut self, day: usize, t: usize, to: usize) {
        if let Some(from) = self.remove(day, t) {
            self.place(day, t, to);
            self.recompute_last(from);
            self.recompute_last(to);
        }
    }

    pub(super) fn assigned_on(&self, p: usize, day: usize) -> bool {
        self.grid[day].contains(&Some(p))
    }

    /// Vrai si `p` ne peut pas tenir une garde le jour `day` : congé, rotation
    /// inactive, ou autre garde (tous labels, hors `ignore`) trop proche.
    pub(super) fn violates(&self, p: usize, day: usize, ignore: &[(usize, usize)]) -> bool {
        if !self.available[p][day] {
            return true;
        }
        let reach = match (self.opts.min_gap_days as usize, self.opts.same_day_exclusive) {
            (0, false) => return false,
            (0, true) => 0,
            (gap, _) => gap - 1,
        };
        let lo = day.saturating_sub(reach);
        let hi = (day + reach).min(self.dates.len() - 1);
        (lo..=hi).any(|d| {
            self.grid[d]
                .iter()
                .enumerate()
                .any(|(t, cell)| *cell == Some(p) && !ignore.contains(&(d, t)))
        })
    }

    pub(super) fn recompute_last(&mut self, p: usize) {
        self.last_assigned[p] = self.grid.iter().rposition(|row| row.contains(&Some(p)));
    }

    pub(super) fn recompute_all_last(&mut self) {
        for p in 0..self.last_assigned.len() {
            self.recompute_last(p);
        }
    }
}

//! Moteur d'assignation : quotas, night float, passe jour par jour,
//! rééquilibrage par échanges locaux, comblement des trous.
//!
//! Les étapes s'exécutent strictement en séquence sur un état de travail
//! (`Scheduler`) propre à chaque exécution ; le hasard vient d'un unique
//! générateur initialisé avec la graine de l'appelant.

mod assignment;
mod conflicts;
mod filler;
mod mutate;
mod night_float;
mod rebalance;
mod targets;
mod types;
mod util;

pub use conflicts::detect_conflicts;
pub use types::{
    Cell, Conflict, ConflictKind, ParticipantStats, QuotaTarget, SchedError, ScheduleResult,
    ScheduleRow, Tally, UnfilledSlot,
};
pub use util::shift_points;

use crate::availability::{self, Availability};
use crate::model::{AssignOptions, ScheduleRequest};
use chrono::NaiveDate;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Contrat commun des moteurs capables de produire un planning.
pub trait ScheduleBackend {
    fn name(&self) -> &'static str;
    fn build(&self, request: &ScheduleRequest, seed: u64) -> Result<ScheduleResult, SchedError>;
}

/// Moteur glouton + réparation locale (implémentation par défaut).
#[derive(Debug, Default, Clone, Copy)]
pub struct GreedyBackend;

impl ScheduleBackend for GreedyBackend {
    fn name(&self) -> &'static str {
        "greedy"
    }

    fn build(&self, request: &ScheduleRequest, seed: u64) -> Result<ScheduleResult, SchedError> {
        Ok(Scheduler::new(request, seed)?.run())
    }
}

/// Point d'entrée unique : une demande + une graine → un planning reproductible.
pub fn build_schedule(request: &ScheduleRequest, seed: u64) -> Result<ScheduleResult, SchedError> {
    GreedyBackend.build(request, seed)
}

/// Scheduler : état de travail d'une exécution (indices participants/templates).
#[derive(Debug)]
pub struct Scheduler<'a> {
    request: &'a ScheduleRequest,
    opts: AssignOptions,
    dates: Vec<NaiveDate>,
    /// [participant][jour] : ni en congé, ni rotateur inactif
    available: Vec<Vec<bool>>,
    /// [template][jour]
    weekend: Vec<Vec<bool>>,
    /// [template] : pool éligible (régulier ou night float selon le template)
    pools: Vec<Vec<usize>>,
    /// [jour][template]
    grid: Vec<Vec<Option<usize>>>,
    /// [participant][template]
    tallies: Vec<Vec<Tally>>,
    points: Vec<f64>,
    expected_points: Vec<f64>,
    /// [template][participant]
    targets: Vec<Vec<QuotaTarget>>,
    weekend_slots: Vec<u32>,
    last_assigned: Vec<Option<usize>>,
    unfilled: Vec<(usize, usize)>,
    rng: ChaCha8Rng,
}

impl<'a> Scheduler<'a> {
    /// Prépare l'état et calcule les quotas. Échoue si personne n'est disponible.
    pub fn new(request: &'a ScheduleRequest, seed: u64) -> Result<Self, SchedError> {
        if request.end < request.start {
            return Err(SchedError::InvalidDateRange);
        }
        if request.options.night_float_block_length == 0 {
            return Err(SchedError::InvalidBlockLength);
        }

        let dates = request.dates();
        let index = Availability::new(&request.windows);
        let available: Vec<Vec<bool>> = request
            .participants
            .iter()
            .map(|p| dates.iter().map(|d| index.is_available(&p.id, *d)).collect())
            .collect();

        if !available.iter().any(|days| days.iter().any(|ok| *ok)) {
            warn!(
                participants = request.participants.len(),
                "no participant available on any day, aborting"
            );
            return Err(SchedError::NoAvailability);
        }

        let rotation_days: Vec<usize> = request
            .participants
            .iter()
            .map(|p| {
                dates
                    .iter()
                    .filter(|d| index.is_active_rotator(&p.id, **d))
                    .count()
            })
            .collect();

        let weekend: Vec<Vec<bool>> = request
            .shifts
            .iter()
            .map(|t| {
                dates
                    .iter()
                    .map(|d| availability::is_weekend(*d, t, &request.weekend))
                    .collect()
            })
            .collect();

        let pools: Vec<Vec<usize>> = request
            .shifts
            .iter()
            .map(|t| {
                request
                    .participants
                    .iter()
                    .enumerate()
                    .filter(|(_, p)| p.tier == t.tier && p.night_float == t.night_float)
                    .map(|(idx, _)| idx)
                    .collect()
            })
            .collect();

        let quotas = targets::compute(request, &dates, &weekend, &pools, &rotation_days);

        let n_people = request.participants.len();
        let n_shifts = request.shifts.len();
        Ok(Self {
            request,
            opts: request.options,
            grid: vec![vec![None; n_shifts]; dates.len()],
            tallies: vec![vec![Tally::default(); n_shifts]; n_people],
            points: vec![0.0; n_people],
            expected_points: quotas.expected_points,
            targets: quotas.targets,
            weekend_slots: quotas.weekend_slots,
            last_assigned: vec![None; n_people],
            unfilled: Vec::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            dates,
            available,
            weekend,
            pools,
        })
    }

    /// Exécute tout le pipeline et rend le résultat final.
    pub fn run(mut self) -> ScheduleResult {
        let plan = night_float::plan(&self);
        debug!(unfilled = plan.unfilled.len(), "night-float blocks planned");

        assignment::assign_days(&mut self, &plan);
        debug!(unfilled = self.unfilled.len(), "day pass done");

        let swaps = rebalance::balance_weekends(&mut self);
        debug!(swaps, "weekend pass done");
        let moves = rebalance::balance_totals(&mut self);
        debug!(moves, "total pass done");
        let moves = rebalance::balance_points(&mut self);
        debug!(moves, "points pass done");

        filler::fill_unassigned(&mut self);

        let result = self.into_result();
        info!(
            days = result.rows.len(),
            labels = result.labels.len(),
            unfilled = result.unfilled.len(),
            "schedule built"
        );
        result
    }

    fn regular_templates(&self) -> Vec<usize> {
        self.request
            .shifts
            .iter()
            .enumerate()
            .filter(|(_, t)| !t.night_float)
            .map(|(idx, _)| idx)
            .collect()
    }

    fn into_result(self) -> ScheduleResult {
        let req = self.request;
        let id = |p: usize| req.participants[p].id.clone();
        let labels: Vec<String> = req.shifts.iter().map(|t| t.label.clone()).collect();

        let rows = self
            .dates
            .iter()
            .zip(self.grid.iter())
            .map(|(date, row)| ScheduleRow {
                date: *date,
                cells: row
                    .iter()
                    .map(|cell| cell.map_or(Cell::Unfilled, |p| Cell::Assigned(id(p))))
                    .collect(),
            })
            .collect();

        let mut stats = BTreeMap::new();
        let mut expected_points = BTreeMap::new();
        for (p, participant) in req.participants.iter().enumerate() {
            let per_label: BTreeMap<String, Tally> = labels
                .iter()
                .cloned()
                .zip(self.tallies[p].iter().copied())
                .collect();
            stats.insert(
                participant.id.clone(),
                ParticipantStats {
                    tier: participant.tier,
                    night_float: participant.night_float,
                    total: self.tallies[p].iter().map(|t| t.total).sum(),
                    weekend: self.tallies[p].iter().map(|t| t.weekend).sum(),
                    points: self.points[p],
                    per_label,
                },
            );
            expected_points.insert(participant.id.clone(), self.expected_points[p]);
        }

        let mut targets = BTreeMap::new();
        for t in self.regular_templates() {
            let per_person = self.pools[t]
                .iter()
                .map(|&p| (id(p), self.targets[t][p]))
                .collect();
            targets.insert(labels[t].clone(), per_person);
        }

        let unfilled = self
            .unfilled
            .iter()
            .map(|&(day, t)| UnfilledSlot {
                date: self.dates[day],
                label: labels[t].clone(),
            })
            .collect();

        ScheduleResult {
            labels,
            rows,
            stats,
            targets,
            expected_points,
            unfilled,
        }
    }
}

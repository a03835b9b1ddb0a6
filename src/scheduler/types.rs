use crate::model::{ParticipantId, Tier};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedError {
    #[error("no participant is available on any day of the range")]
    NoAvailability,
    #[error("invalid date range: end must not be before start")]
    InvalidDateRange,
    #[error("night-float block length must be at least 1 day")]
    InvalidBlockLength,
}

/// Contenu d'une case (date, label) de la grille.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cell {
    Assigned(ParticipantId),
    Unfilled,
}

impl Cell {
    pub fn participant(&self) -> Option<&ParticipantId> {
        match self {
            Cell::Assigned(p) => Some(p),
            Cell::Unfilled => None,
        }
    }

    pub fn is_unfilled(&self) -> bool {
        matches!(self, Cell::Unfilled)
    }
}

/// Une ligne de la grille ; `cells` suit l'ordre de `ScheduleResult::labels`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleRow {
    pub date: NaiveDate,
    pub cells: Vec<Cell>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub total: u32,
    pub weekend: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantStats {
    pub tier: Tier,
    pub night_float: bool,
    pub total: u32,
    pub weekend: u32,
    pub points: f64,
    pub per_label: BTreeMap<String, Tally>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaTarget {
    pub total: u32,
    pub weekend: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnfilledSlot {
    pub date: NaiveDate,
    pub label: String,
}

/// Résultat complet d'une exécution, immuable une fois rendu.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleResult {
    pub labels: Vec<String>,
    pub rows: Vec<ScheduleRow>,
    pub stats: BTreeMap<ParticipantId, ParticipantStats>,
    /// Quotas entiers par label régulier (les labels night float n'en ont pas).
    pub targets: BTreeMap<String, BTreeMap<ParticipantId, QuotaTarget>>,
    pub expected_points: BTreeMap<ParticipantId, f64>,
    pub unfilled: Vec<UnfilledSlot>,
}

impl ScheduleResult {
    pub fn label_index(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }

    pub fn cell(&self, date: NaiveDate, label: &str) -> Option<&Cell> {
        let idx = self.label_index(label)?;
        self.rows
            .iter()
            .find(|r| r.date == date)
            .and_then(|r| r.cells.get(idx))
    }

    /// Toutes les gardes d'un participant, en ordre chronologique.
    pub fn assignments_of(&self, participant: &ParticipantId) -> Vec<(NaiveDate, &str)> {
        let mut out = Vec::new();
        for row in &self.rows {
            for (idx, cell) in row.cells.iter().enumerate() {
                if cell.participant() == Some(participant) {
                    out.push((row.date, self.labels[idx].as_str()));
                }
            }
        }
        out
    }

    pub fn target(&self, label: &str, participant: &ParticipantId) -> QuotaTarget {
        self.targets
            .get(label)
            .and_then(|t| t.get(participant))
            .copied()
            .unwrap_or_default()
    }

    pub fn tally(&self, label: &str, participant: &ParticipantId) -> Tally {
        self.stats
            .get(participant)
            .and_then(|s| s.per_label.get(label))
            .copied()
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConflictKind {
    TierMismatch,
    OnLeave,
    InactiveRotator,
    RestViolation,
    DoubleAssignment,
    NightFloatRun,
    UnknownParticipant,
}

impl ConflictKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictKind::TierMismatch => "tier",
            ConflictKind::OnLeave => "leave",
            ConflictKind::InactiveRotator => "rotation",
            ConflictKind::RestViolation => "rest",
            ConflictKind::DoubleAssignment => "double",
            ConflictKind::NightFloatRun => "night-float-run",
            ConflictKind::UnknownParticipant => "unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    pub participant: ParticipantId,
    pub date: NaiveDate,
    pub label: String,
    /// Seconde case impliquée (repos, double garde).
    pub other: Option<(NaiveDate, String)>,
    pub kind: ConflictKind,
}

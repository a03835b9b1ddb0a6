use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifiant fort pour Participant (nom unique dans le roster).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ParticipantId(String);

impl ParticipantId {
    pub fn new<S: AsRef<str>>(s: S) -> Self {
        Self(s.as_ref().to_owned())
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Niveau d'éligibilité, commun aux participants et aux templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Tier {
    Junior,
    Senior,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Junior => "Junior",
            Tier::Senior => "Senior",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "junior" | "j" => Some(Tier::Junior),
            "senior" | "s" => Some(Tier::Senior),
            _ => None,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Template de garde. Immuable une fois référencé par une exécution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShiftTemplate {
    pub label: String,
    pub tier: Tier,
    #[serde(default)]
    pub night_float: bool,
    /// Le jour supplémentaire de `WeekendRule` compte comme week-end pour ce template.
    #[serde(default)]
    pub weekend_extra_day: bool,
    #[serde(default = "default_points")]
    pub points: f64,
}

fn default_points() -> f64 {
    1.0
}

impl ShiftTemplate {
    pub fn new<L: Into<String>>(label: L, tier: Tier) -> Self {
        Self {
            label: label.into(),
            tier,
            night_float: false,
            weekend_extra_day: false,
            points: default_points(),
        }
    }

    pub fn night_float(mut self) -> Self {
        self.night_float = true;
        self
    }

    pub fn with_extra_weekend_day(mut self) -> Self {
        self.weekend_extra_day = true;
        self
    }

    pub fn with_points(mut self, points: f64) -> Self {
        self.points = points;
        self
    }
}

/// Participant (membre du roster)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub tier: Tier,
    /// Multiplie la part équitable (1.0 par défaut).
    #[serde(default = "default_bias")]
    pub bias: f64,
    #[serde(default)]
    pub extra_oncalls: u32,
    /// Éligible au night float de son niveau : exclu du pool des gardes régulières.
    #[serde(default)]
    pub night_float: bool,
}

fn default_bias() -> f64 {
    1.0
}

impl Participant {
    pub fn new<S: AsRef<str>>(name: S, tier: Tier) -> Self {
        Self {
            id: ParticipantId::new(name),
            tier,
            bias: default_bias(),
            extra_oncalls: 0,
            night_float: false,
        }
    }

    pub fn night_float(mut self) -> Self {
        self.night_float = true;
        self
    }

    pub fn with_bias(mut self, bias: f64) -> Self {
        self.bias = bias;
        self
    }

    pub fn with_extra_oncalls(mut self, extra: u32) -> Self {
        self.extra_oncalls = extra;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WindowKind {
    Leave,
    Rotation,
}

/// Fenêtre de disponibilité, bornes incluses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityWindow {
    pub participant: ParticipantId,
    pub kind: WindowKind,
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl AvailabilityWindow {
    pub fn leave(participant: &ParticipantId, from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            participant: participant.clone(),
            kind: WindowKind::Leave,
            from,
            to,
        }
    }

    pub fn rotation(participant: &ParticipantId, from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            participant: participant.clone(),
            kind: WindowKind::Rotation,
            from,
            to,
        }
    }

    pub fn covers(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }
}

/// Jours comptés comme week-end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekendRule {
    pub days: Vec<Weekday>,
    /// Jour ajouté au week-end pour les templates `weekend_extra_day`.
    pub extra_day: Weekday,
}

impl Default for WeekendRule {
    fn default() -> Self {
        Self {
            days: vec![Weekday::Fri, Weekday::Sat],
            extra_day: Weekday::Thu,
        }
    }
}

impl WeekendRule {
    pub fn saturday_sunday() -> Self {
        Self {
            days: vec![Weekday::Sat, Weekday::Sun],
            extra_day: Weekday::Fri,
        }
    }
}

/// Options d'assignation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssignOptions {
    pub min_gap_days: u32,
    pub night_float_block_length: u32,
    /// Interdit deux gardes le même jour, quel que soit `min_gap_days`.
    pub same_day_exclusive: bool,
    pub quota_tolerance: f64,
    pub points_max_rounds: usize,
    pub filler_max_passes: usize,
}

impl Default for AssignOptions {
    fn default() -> Self {
        Self {
            min_gap_days: 1,
            night_float_block_length: 5,
            same_day_exclusive: true,
            quota_tolerance: 1.0,
            points_max_rounds: 10,
            filler_max_passes: 3,
        }
    }
}

/// Demande complète pour une exécution du moteur.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleRequest {
    pub start: NaiveDate,
    pub end: NaiveDate,
    #[serde(default)]
    pub shifts: Vec<ShiftTemplate>,
    #[serde(default)]
    pub participants: Vec<Participant>,
    #[serde(default)]
    pub windows: Vec<AvailabilityWindow>,
    #[serde(default)]
    pub weekend: WeekendRule,
    #[serde(default)]
    pub options: AssignOptions,
}

impl ScheduleRequest {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start,
            end,
            shifts: Vec::new(),
            participants: Vec::new(),
            windows: Vec::new(),
            weekend: WeekendRule::default(),
            options: AssignOptions::default(),
        }
    }

    /// Ajoute un template en rendant son label unique (`"label #2"`, `"label #3"`, ...).
    /// Retourne le label retenu.
    pub fn add_shift(&mut self, mut template: ShiftTemplate) -> String {
        let base = template.label.trim().to_string();
        let mut unique = base.clone();
        let mut count = 2;
        while self.shifts.iter().any(|s| s.label == unique) {
            unique = format!("{base} #{count}");
            count += 1;
        }
        template.label = unique.clone();
        self.shifts.push(template);
        unique
    }

    pub fn add_participant(&mut self, participant: Participant) {
        self.participants.push(participant);
    }

    pub fn add_window(&mut self, window: AvailabilityWindow) {
        self.windows.push(window);
    }

    pub fn find_participant(&self, id: &ParticipantId) -> Option<&Participant> {
        self.participants.iter().find(|p| &p.id == id)
    }

    pub fn find_shift(&self, label: &str) -> Option<&ShiftTemplate> {
        self.shifts.iter().find(|s| s.label == label)
    }

    /// Toutes les dates de la période, bornes incluses.
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.start.iter_days().take_while(|d| *d <= self.end).collect()
    }

    pub fn span_days(&self) -> usize {
        if self.end < self.start {
            return 0;
        }
        (self.end - self.start).num_days() as usize + 1
    }
}

/// Demande de démonstration : dix templates, 30 juniors et 15 seniors,
/// dont les dix premiers juniors et les cinq premiers seniors en night float.
pub fn demo_request(start: NaiveDate, end: NaiveDate) -> ScheduleRequest {
    const JUNIORS: [&str; 30] = [
        "Alice", "Ben", "Carla", "Derek", "Eva", "Frank", "Grace", "Hector", "Isla", "Jack",
        "Kira", "Liam", "Mia", "Noah", "Olivia", "Paul", "Quinn", "Rosa", "Sam", "Tara", "Umar",
        "Violet", "Wes", "Xena", "Yara", "Zane", "Aaron", "Bella", "Caleb", "Dana",
    ];
    const SENIORS: [&str; 15] = [
        "Erin", "Felix", "Gina", "Harold", "Ivy", "Jonah", "Karen", "Leo", "Monica", "Nathan",
        "Opal", "Perry", "Ruth", "Simon", "Tanya",
    ];

    let mut req = ScheduleRequest::new(start, end);
    for template in [
        ShiftTemplate::new("Junior night float", Tier::Junior).night_float(),
        ShiftTemplate::new("Senior night float", Tier::Senior).night_float(),
        ShiftTemplate::new("ER night", Tier::Junior).with_extra_weekend_day(),
        ShiftTemplate::new("Ward night", Tier::Junior).with_extra_weekend_day(),
        ShiftTemplate::new("Senior night", Tier::Senior).with_extra_weekend_day(),
        ShiftTemplate::new("Evening", Tier::Senior),
        ShiftTemplate::new("Morning", Tier::Senior),
        ShiftTemplate::new("Ward morning", Tier::Junior),
        ShiftTemplate::new("ER zone 1 morning", Tier::Junior),
        ShiftTemplate::new("ER zone 2 morning", Tier::Junior),
    ] {
        req.add_shift(template);
    }

    for (tier, names, nf) in [(Tier::Junior, &JUNIORS[..], 10), (Tier::Senior, &SENIORS[..], 5)] {
        for (idx, name) in names.iter().enumerate() {
            let participant = Participant::new(name, tier);
            req.add_participant(if idx < nf {
                participant.night_float()
            } else {
                participant
            });
        }
    }
    req
}

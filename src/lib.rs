#![forbid(unsafe_code)]
//! Gardes : construction de tableaux de garde équitables (sans BD).
//!
//! - Quotas entiers par plus forts restes, pondérés (biais, rotation, extras).
//! - Blocs night float en rotation, puis passe gloutonne jour par jour.
//! - Rééquilibrage local (week-end, total, points) et comblement des trous.
//! - Reproductible : même demande + même graine → même planning.

pub mod availability;
pub mod io;
pub mod model;
pub mod quota;
pub mod report;
pub mod scheduler;
pub mod storage;

pub use availability::Availability;
pub use model::{
    demo_request, AssignOptions, AvailabilityWindow, Participant, ParticipantId, ScheduleRequest,
    ShiftTemplate, Tier, WeekendRule, WindowKind,
};
pub use quota::{allocate_integer_quotas, fair_shares, normalize_overall_quota};
pub use report::{
    compact_summary, expectation_report, fairness_log, median_report, summary_table, DeviationRow,
    GroupBy, SummaryTable,
};
pub use scheduler::{
    build_schedule, detect_conflicts, Cell, Conflict, ConflictKind, GreedyBackend, SchedError,
    ScheduleBackend, ScheduleResult, Scheduler,
};
pub use storage::{JsonStorage, ScheduleRun, Storage};

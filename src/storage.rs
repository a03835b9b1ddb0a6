use crate::model::ScheduleRequest;
use crate::scheduler::ScheduleResult;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Exécution terminée : la demande, la graine et le planning obtenu.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleRun {
    pub request: ScheduleRequest,
    pub seed: u64,
    pub result: ScheduleResult,
}

pub trait Storage {
    /// Charge une exécution depuis un support.
    fn load(&self) -> anyhow::Result<ScheduleRun>;
    /// Sauvegarde de manière atomique.
    fn save(&self, run: &ScheduleRun) -> anyhow::Result<()>;
}

pub struct JsonStorage {
    path: PathBuf,
}

impl JsonStorage {
    pub fn open<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        Ok(Self { path: path.as_ref().to_path_buf() })
    }
}

impl Storage for JsonStorage {
    fn load(&self) -> anyhow::Result<ScheduleRun> {
        let data = fs::read(&self.path).with_context(|| format!("reading {}", self.path.display()))?;
        let run: ScheduleRun = serde_json::from_slice(&data).with_context(|| "parsing run.json")?;
        Ok(run)
    }

    fn save(&self, run: &ScheduleRun) -> anyhow::Result<()> {
        let json = serde_json::to_vec_pretty(run)?;
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir).with_context(|| "creating temp file")?;
        tmp.write_all(&json)?;
        tmp.flush()?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).with_context(|| "atomic rename")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Participant, ShiftTemplate, Tier};
    use crate::scheduler::build_schedule;
    use chrono::NaiveDate;

    fn run(seed: u64) -> ScheduleRun {
        let day = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        let mut request = ScheduleRequest::new(day, day + chrono::Duration::days(2));
        request.add_shift(ShiftTemplate::new("Ward", Tier::Junior));
        request.add_participant(Participant::new("A", Tier::Junior));
        request.add_participant(Participant::new("B", Tier::Junior));
        let result = build_schedule(&request, seed).unwrap();
        ScheduleRun { request, seed, result }
    }

    #[test]
    fn saved_run_loads_back_identical() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonStorage::open(dir.path().join("run.json")).unwrap();
        let original = run(3);
        storage.save(&original).unwrap();
        assert_eq!(storage.load().unwrap(), original);
    }

    #[test]
    fn save_replaces_the_previous_run() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonStorage::open(dir.path().join("run.json")).unwrap();
        storage.save(&run(1)).unwrap();
        storage.save(&run(2)).unwrap();
        assert_eq!(storage.load().unwrap().seed, 2);
        // seul le fichier final reste, pas de temporaire orphelin
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonStorage::open(dir.path().join("absent.json")).unwrap();
        assert!(storage.load().is_err());
    }
}

use crate::model::{
    AvailabilityWindow, Participant, ParticipantId, ScheduleRequest, ShiftTemplate, Tier,
    WindowKind,
};
use crate::report::SummaryTable;
use crate::scheduler::{Cell, ScheduleResult};
use anyhow::{bail, Context};
use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Import de participants: header `name,tier[,bias][,extra_oncalls][,night_float]`
pub fn import_participants_csv<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<Participant>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;
    let mut out = Vec::new();
    for rec in rdr.records() {
        let rec = rec?;
        let name = rec.get(0).context("missing name")?.trim();
        if name.is_empty() {
            bail!("invalid participant row (empty name)");
        }
        let tier = parse_tier(rec.get(1).context("missing tier")?)
            .with_context(|| format!("invalid tier for {name}"))?;
        let mut participant = Participant::new(name, tier);
        if let Some(raw) = optional(&rec, 2) {
            participant.bias = raw
                .parse()
                .with_context(|| format!("invalid bias for {name}"))?;
            if !participant.bias.is_finite() || participant.bias < 0.0 {
                bail!("bias must be a non-negative number for {name}");
            }
        }
        if let Some(raw) = optional(&rec, 3) {
            participant.extra_oncalls = raw
                .parse()
                .with_context(|| format!("invalid extra_oncalls for {name}"))?;
        }
        if let Some(raw) = optional(&rec, 4) {
            participant.night_float =
                parse_bool(raw).with_context(|| format!("invalid night_float for {name}"))?;
        }
        out.push(participant);
    }
    Ok(out)
}

/// Import de templates: header `label,tier[,night_float][,weekend_extra_day][,points]`
pub fn import_shifts_csv<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<ShiftTemplate>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;
    let mut out = Vec::new();
    for rec in rdr.records() {
        let rec = rec?;
        let label = rec.get(0).context("missing label")?.trim();
        if label.is_empty() {
            bail!("invalid shift row (empty label)");
        }
        let tier = parse_tier(rec.get(1).context("missing tier")?)
            .with_context(|| format!("invalid tier for shift {label}"))?;
        let mut template = ShiftTemplate::new(label, tier);
        if let Some(raw) = optional(&rec, 2) {
            template.night_float = parse_bool(raw)
                .with_context(|| format!("invalid night_float for shift {label}"))?;
        }
        if let Some(raw) = optional(&rec, 3) {
            template.weekend_extra_day = parse_bool(raw)
                .with_context(|| format!("invalid weekend_extra_day for shift {label}"))?;
        }
        if let Some(raw) = optional(&rec, 4) {
            template.points = raw
                .parse()
                .with_context(|| format!("invalid points for shift {label}"))?;
        }
        out.push(template);
    }
    Ok(out)
}

/// Import de fenêtres: header `name,kind,from,to` (`leave`/`rotation`, dates `YYYY-MM-DD`)
pub fn import_windows_csv<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<AvailabilityWindow>> {
    let mut rdr = ReaderBuilder::new().has_headers(true).from_path(path)?;
    let mut out = Vec::new();
    for rec in rdr.records() {
        let rec = rec?;
        let name = rec.get(0).context("missing name")?.trim();
        let kind = match rec.get(1).context("missing kind")?.trim().to_ascii_lowercase().as_str() {
            "leave" | "conge" | "congé" => WindowKind::Leave,
            "rotation" => WindowKind::Rotation,
            other => bail!("unknown window kind for {name}: {other}"),
        };
        let from = parse_date(rec.get(2).context("missing from")?)?;
        let to = parse_date(rec.get(3).context("missing to")?)?;
        if to < from {
            bail!("window for {name} ends before it starts");
        }
        out.push(AvailabilityWindow {
            participant: ParticipantId::new(name),
            kind,
            from,
            to,
        });
    }
    Ok(out)
}

/// Charge une demande JSON puis la valide.
pub fn load_request_json<P: AsRef<Path>>(path: P) -> anyhow::Result<ScheduleRequest> {
    let path = path.as_ref();
    let data = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let request: ScheduleRequest =
        serde_json::from_slice(&data).with_context(|| format!("parsing {}", path.display()))?;
    validate_request(&request)?;
    Ok(request)
}

/// Contrôles de cohérence d'une demande avant exécution.
pub fn validate_request(request: &ScheduleRequest) -> anyhow::Result<()> {
    if request.end < request.start {
        bail!("end date {} is before start date {}", request.end, request.start);
    }
    let mut names = HashSet::new();
    for p in &request.participants {
        if !names.insert(p.id.as_str()) {
            bail!("duplicate participant: {}", p.id);
        }
        if !p.bias.is_finite() || p.bias < 0.0 {
            bail!("bias must be a non-negative number for {}", p.id);
        }
    }
    let mut labels = HashSet::new();
    for s in &request.shifts {
        if !labels.insert(s.label.as_str()) {
            bail!("duplicate shift label: {}", s.label);
        }
        if !s.points.is_finite() || s.points < 0.0 {
            bail!("points must be a non-negative number for shift {}", s.label);
        }
    }
    for w in &request.windows {
        if request.find_participant(&w.participant).is_none() {
            bail!("window refers to unknown participant: {}", w.participant);
        }
        if w.to < w.from {
            bail!("window for {} ends before it starts", w.participant);
        }
    }
    Ok(())
}

/// Export CSV de la grille: header `Date,Day,<labels...>`, case vide si non pourvue
pub fn export_grid_csv<P: AsRef<Path>>(path: P, result: &ScheduleResult) -> anyhow::Result<()> {
    let mut w = WriterBuilder::new().has_headers(true).from_path(path)?;
    let mut header = vec!["Date".to_string(), "Day".to_string()];
    header.extend(result.labels.iter().cloned());
    w.write_record(&header)?;
    for row in &result.rows {
        let mut record = vec![row.date.format("%Y-%m-%d").to_string(), row.date.format("%a").to_string()];
        record.extend(row.cells.iter().map(|cell| match cell {
            Cell::Assigned(pid) => pid.to_string(),
            Cell::Unfilled => String::new(),
        }));
        w.write_record(&record)?;
    }
    w.flush()?;
    Ok(())
}

/// Export CSV du tableau récapitulatif:
/// `participant,tier,<label> total,<label> expected,<label> weekend,<label> expected weekend,...,points,expected points`
pub fn export_summary_csv<P: AsRef<Path>>(path: P, table: &SummaryTable) -> anyhow::Result<()> {
    let mut w = WriterBuilder::new().has_headers(true).from_path(path)?;
    let mut header = vec!["participant".to_string(), "tier".to_string()];
    for label in &table.labels {
        header.push(format!("{label} total"));
        header.push(format!("{label} expected"));
        header.push(format!("{label} weekend"));
        header.push(format!("{label} expected weekend"));
    }
    header.push("points".to_string());
    header.push("expected points".to_string());
    w.write_record(&header)?;

    let mut buf = itoa::Buffer::new();
    for row in &table.rows {
        let mut record = vec![row.participant.to_string(), row.tier.to_string()];
        for summary in &row.labels {
            for n in [
                summary.assigned_total,
                summary.expected_total,
                summary.assigned_weekend,
                summary.expected_weekend,
            ] {
                record.push(buf.format(n).to_owned());
            }
        }
        record.push(format!("{:.1}", row.assigned_points));
        record.push(format!("{:.1}", row.expected_points));
        w.write_record(&record)?;
    }
    w.flush()?;
    Ok(())
}

/// Export JSON du résultat (jolie mise en forme)
pub fn export_result_json<P: AsRef<Path>>(path: P, result: &ScheduleResult) -> anyhow::Result<()> {
    let s = serde_json::to_string_pretty(result)?;
    fs::write(path, s)?;
    Ok(())
}

fn optional(rec: &StringRecord, idx: usize) -> Option<&str> {
    rec.get(idx).map(str::trim).filter(|s| !s.is_empty())
}

fn parse_tier(raw: &str) -> anyhow::Result<Tier> {
    match Tier::parse(raw) {
        Some(tier) => Ok(tier),
        None => bail!("expected junior or senior, got {raw:?}"),
    }
}

fn parse_bool(s: &str) -> anyhow::Result<bool> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "y" | "oui" => Ok(true),
        "false" | "0" | "no" | "n" | "non" => Ok(false),
        _ => bail!("expected boolean"),
    }
}

fn parse_date(raw: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").with_context(|| format!("invalid date: {raw}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn csv_file(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f.flush().unwrap();
        f
    }

    #[test]
    fn participants_optional_columns() {
        let f = csv_file("name,tier,bias,extra_oncalls,night_float\nAlice,junior,,,\nBob,S,0.5,2,oui\n");
        let people = import_participants_csv(f.path()).unwrap();
        assert_eq!(people.len(), 2);
        assert_eq!(people[0].bias, 1.0);
        assert!(!people[0].night_float);
        assert_eq!(people[1].tier, Tier::Senior);
        assert_eq!(people[1].bias, 0.5);
        assert_eq!(people[1].extra_oncalls, 2);
        assert!(people[1].night_float);
    }

    #[test]
    fn unknown_tier_is_rejected() {
        let f = csv_file("name,tier\nAlice,intern\n");
        assert!(import_participants_csv(f.path()).is_err());
    }

    #[test]
    fn windows_parse_kinds_and_dates() {
        let f = csv_file("name,kind,from,to\nAlice,leave,2025-01-02,2025-01-03\nBob,Rotation,2025-01-01,2025-01-10\n");
        let windows = import_windows_csv(f.path()).unwrap();
        assert_eq!(windows[0].kind, WindowKind::Leave);
        assert_eq!(windows[1].kind, WindowKind::Rotation);
        assert_eq!(windows[1].to, NaiveDate::from_ymd_opt(2025, 1, 10).unwrap());
    }

    #[test]
    fn validation_rejects_window_for_unknown_participant() {
        let day = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let mut req = ScheduleRequest::new(day, day);
        req.add_participant(Participant::new("Alice", Tier::Junior));
        req.add_window(AvailabilityWindow::leave(&ParticipantId::new("Zoe"), day, day));
        assert!(validate_request(&req).is_err());
    }
}

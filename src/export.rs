use std::io::Write;

use serde::Serialize;

use crate::mapping;
use crate::models::Report;

/// One CSV line per report.
#[derive(Debug, Serialize)]
struct ReportRow<'a> {
    id: String,
    student_id: &'a str,
    student_name: &'a str,
    created_at: String,
    status: &'static str,
    categories: String,
    symbols: String,
    body_parts: String,
    body_part_codes: String,
    emotion_level: u8,
    emotion_code: i32,
    location: &'a str,
    location_code: i32,
    frequency: &'static str,
    frequency_code: i32,
    safety_level: u8,
    safety_code: i32,
    teacher_notes: &'a str,
}

impl<'a> ReportRow<'a> {
    fn from_report(report: &'a Report) -> Self {
        let mut categories: Vec<&str> = Vec::new();
        for symbol in &report.symbols {
            let name = symbol.category.as_str();
            if !categories.contains(&name) {
                categories.push(name);
            }
        }
        let points = report.body_map.as_deref().unwrap_or_default();

        Self {
            id: report.id.to_string(),
            student_id: &report.student_id,
            student_name: &report.student_name,
            created_at: report.created_at.to_rfc3339(),
            status: report.status.as_str(),
            categories: categories.join(";"),
            symbols: join(report.symbols.iter().map(|s| s.id.clone())),
            body_parts: join(points.iter().map(|p| p.body_part.to_string())),
            body_part_codes: join(
                points
                    .iter()
                    .map(|p| mapping::body_part_code(p.body_part).to_string()),
            ),
            emotion_level: report.emotion.level,
            emotion_code: mapping::emotion_code(report.emotion.level),
            location: &report.location.id,
            location_code: mapping::location_code(&report.location.id),
            frequency: report.frequency.as_str(),
            frequency_code: mapping::frequency_code(report.frequency),
            safety_level: report.safety.level,
            safety_code: mapping::safety_code(&report.safety),
            teacher_notes: report.teacher_notes.as_deref().unwrap_or(""),
        }
    }
}

fn join(values: impl Iterator<Item = String>) -> String {
    values.collect::<Vec<_>>().join(";")
}

pub fn write_csv<W: Write>(writer: W, reports: &[Report]) -> anyhow::Result<usize> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for report in reports {
        csv_writer.serialize(ReportRow::from_report(report))?;
    }
    csv_writer.flush()?;
    Ok(reports.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body_map;
    use crate::catalog::{self, AttackMethod};
    use crate::models::{BodyRegion, EmotionScale, Frequency, ReportStatus, SafetyThermometer};
    use chrono::Utc;
    use uuid::Uuid;

    fn physical_report() -> Report {
        Report {
            id: Uuid::new_v4(),
            student_id: "student-001".to_string(),
            student_name: "Avery".to_string(),
            symbols: vec![
                AttackMethod::Frapper.to_selection(),
                AttackMethod::Pousser.to_selection(),
            ],
            body_map: Some(body_map::selections_for(&[
                BodyRegion::LeftArm,
                BodyRegion::Head,
            ])),
            emotion: EmotionScale::from_level(4).unwrap(),
            location: catalog::default_locations()[0].clone(),
            frequency: Frequency::Always,
            safety: SafetyThermometer::from_level(5).unwrap(),
            status: ReportStatus::Reviewed,
            teacher_notes: Some("met family".to_string()),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn writes_header_and_codes() {
        let mut buffer = Vec::new();
        let written = write_csv(&mut buffer, &[physical_report()]).unwrap();
        assert_eq!(written, 1);

        let text = String::from_utf8(buffer).unwrap();
        let mut lines = text.lines();
        let header = lines.next().unwrap();
        assert!(header.starts_with("id,student_id,student_name,created_at,status,categories"));
        let row = lines.next().unwrap();
        assert!(row.contains(",reviewed,physical,hit;push,left_arm;head,27;1,"));
        assert!(row.contains(",classroom,2,always,3,5,5,met family"));
    }

    #[test]
    fn empty_export_writes_nothing() {
        let mut buffer = Vec::new();
        assert_eq!(write_csv(&mut buffer, &[]).unwrap(), 0);
        assert!(buffer.is_empty());
    }
}

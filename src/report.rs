use std::collections::HashMap;
use std::fmt::Write;

use crate::analysis;
use crate::catalog;
use crate::models::{Report, ReportAnalysis, ReportStatus};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub pending: usize,
    pub reviewed: usize,
    pub resolved: usize,
}

impl StatusCounts {
    pub fn total(&self) -> usize {
        self.pending + self.reviewed + self.resolved
    }
}

pub fn count_by_status(reports: &[Report]) -> StatusCounts {
    let mut counts = StatusCounts::default();
    for report in reports {
        match report.status {
            ReportStatus::Pending => counts.pending += 1,
            ReportStatus::Reviewed => counts.reviewed += 1,
            ReportStatus::Resolved => counts.resolved += 1,
        }
    }
    counts
}

pub fn filter_by_status(reports: &[Report], status: Option<ReportStatus>) -> Vec<&Report> {
    reports
        .iter()
        .filter(|report| status.map_or(true, |wanted| report.status == wanted))
        .collect()
}

/// Groups reports per student, keeping first-seen order of students.
pub fn group_by_student(reports: &[Report]) -> Vec<(String, String, Vec<Report>)> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(String, String, Vec<Report>)> = Vec::new();
    for report in reports {
        let slot = *index.entry(report.student_id.as_str()).or_insert_with(|| {
            groups.push((report.student_id.clone(), report.student_name.clone(), Vec::new()));
            groups.len() - 1
        });
        groups[slot].2.push(report.clone());
    }
    groups
}

/// One line per report for list views.
pub fn summary_line(report: &Report) -> String {
    let mut symbols: Vec<&str> = report
        .symbols
        .iter()
        .take(3)
        .map(|symbol| symbol.label.as_str())
        .collect();
    let more = report.symbols.len().saturating_sub(3);
    let extra = if more > 0 { format!(" +{more}") } else { String::new() };
    if symbols.is_empty() {
        symbols.push("-");
    }
    format!(
        "{} | {} | {} | {}{} | {} {} | emotion {}/5 | safety {}/5",
        report.id,
        report.created_at.format("%Y-%m-%d %H:%M"),
        report.student_name,
        symbols.join(", "),
        extra,
        report.location.icon,
        report.location.name,
        report.emotion.level,
        report.safety.level,
    )
}

pub fn render_analysis(output: &mut String, analysis: &ReportAnalysis) {
    let classes: Vec<&str> = analysis
        .trend
        .classes()
        .iter()
        .map(|class| class.as_str())
        .collect();

    let _ = writeln!(output, "> {}", analysis.trend.recommendation);
    let _ = writeln!(output);
    let _ = writeln!(output, "- Trend: {}", classes.join(", "));
    let _ = writeln!(output, "- Reports: {}", analysis.total_reports);
    if let (Some(first), Some(last)) = (analysis.first_report_date, analysis.last_report_date) {
        let _ = writeln!(
            output,
            "- Period: {} to {}",
            first.format("%Y-%m-%d"),
            last.format("%Y-%m-%d")
        );
    }
    let _ = writeln!(
        output,
        "- Average emotion {:.1}/5, average safety {:.1}/5",
        analysis.average_emotion_level, analysis.average_safety_level
    );

    if !analysis.most_common_categories.is_empty() {
        let categories: Vec<String> = analysis
            .most_common_categories
            .iter()
            .map(|entry| {
                let info = catalog::category_info(entry.category);
                format!("{} {} ({})", info.icon.to_markdown(info.label), info.label, entry.count)
            })
            .collect();
        let _ = writeln!(output, "- Most common: {}", categories.join(", "));
    }

    let pattern = &analysis.frequency_pattern;
    let _ = writeln!(
        output,
        "- Frequency: once {}, sometimes {}, often {}, always {}",
        pattern.once, pattern.sometimes, pattern.often, pattern.always
    );

    for issue in &analysis.recurring_issues {
        let _ = writeln!(output, "- Recurring: {issue}");
    }
}

pub fn build_report(reports: &[Report]) -> String {
    let counts = count_by_status(reports);
    let mut output = String::new();

    let _ = writeln!(output, "# Incident Report Review");
    let _ = writeln!(
        output,
        "{} reports in total, {} pending, {} reviewed, {} resolved",
        counts.total(),
        counts.pending,
        counts.reviewed,
        counts.resolved
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Students");

    let groups = group_by_student(reports);
    if groups.is_empty() {
        let _ = writeln!(output, "No reports recorded yet.");
    } else {
        for (student_id, student_name, history) in &groups {
            let analysis = analysis::analyze_student_reports(history);
            let _ = writeln!(output);
            let _ = writeln!(output, "### {student_name} ({student_id})");
            render_analysis(&mut output, &analysis);
        }
    }

    let mut pending: Vec<&Report> = filter_by_status(reports, Some(ReportStatus::Pending));
    pending.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    let _ = writeln!(output);
    let _ = writeln!(output, "## Pending Reports");

    if pending.is_empty() {
        let _ = writeln!(output, "Nothing waiting for review.");
    } else {
        for report in pending.iter().take(10) {
            let _ = writeln!(output, "- {}", summary_line(report));
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        Category, EmotionScale, Frequency, SafetyThermometer, SymbolSelection,
    };
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    fn sample_report(student_id: &str, name: &str, status: ReportStatus, days_ago: i64) -> Report {
        Report {
            id: Uuid::new_v4(),
            student_id: student_id.to_string(),
            student_name: name.to_string(),
            symbols: vec![SymbolSelection {
                id: "mock".to_string(),
                label: "Se moquer".to_string(),
                category: Category::Verbal,
            }],
            body_map: None,
            emotion: EmotionScale::from_level(3).unwrap(),
            location: catalog::default_locations()[1].clone(),
            frequency: Frequency::Often,
            safety: SafetyThermometer::from_level(3).unwrap(),
            status,
            teacher_notes: None,
            created_at: Utc::now() - Duration::days(days_ago),
        }
    }

    #[test]
    fn counts_each_status() {
        let reports = vec![
            sample_report("s1", "Avery", ReportStatus::Pending, 1),
            sample_report("s1", "Avery", ReportStatus::Resolved, 2),
            sample_report("s2", "Jules", ReportStatus::Pending, 3),
        ];
        let counts = count_by_status(&reports);
        assert_eq!(counts.pending, 2);
        assert_eq!(counts.resolved, 1);
        assert_eq!(counts.total(), 3);
        assert_eq!(filter_by_status(&reports, None).len(), 3);
        assert_eq!(filter_by_status(&reports, Some(ReportStatus::Reviewed)).len(), 0);
    }

    #[test]
    fn groups_keep_first_seen_order() {
        let reports = vec![
            sample_report("s2", "Jules", ReportStatus::Pending, 1),
            sample_report("s1", "Avery", ReportStatus::Pending, 2),
            sample_report("s2", "Jules", ReportStatus::Reviewed, 3),
        ];
        let groups = group_by_student(&reports);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, "s2");
        assert_eq!(groups[0].2.len(), 2);
    }

    #[test]
    fn report_lists_students_and_pending() {
        let reports = vec![
            sample_report("s1", "Avery", ReportStatus::Pending, 1),
            sample_report("s1", "Avery", ReportStatus::Pending, 5),
            sample_report("s1", "Avery", ReportStatus::Reviewed, 9),
        ];
        let output = build_report(&reports);
        assert!(output.contains("3 reports in total, 2 pending, 1 reviewed, 0 resolved"));
        assert!(output.contains("### Avery (s1)"));
        assert!(output.contains("Recurring: verbal harassment reported 3 times"));
        assert!(output.contains("- Trend: recurring\n"));
        assert!(output.contains("Cour de récréation"));
    }

    #[test]
    fn analysis_shows_every_trend_class() {
        let mut reports = vec![
            sample_report("s1", "Avery", ReportStatus::Pending, 3),
            sample_report("s1", "Avery", ReportStatus::Pending, 2),
            sample_report("s1", "Avery", ReportStatus::Pending, 1),
        ];
        reports[2].safety = SafetyThermometer::from_level(5).unwrap();

        let mut output = String::new();
        render_analysis(&mut output, &analysis::analyze_student_reports(&reports));
        assert!(output.contains("- Trend: worsening, recurring\n"));

        let mut empty = String::new();
        render_analysis(&mut empty, &analysis::analyze_student_reports(&[]));
        assert!(empty.contains("- Trend: stable\n"));
    }

    #[test]
    fn empty_report_says_so() {
        let output = build_report(&[]);
        assert!(output.contains("No reports recorded yet."));
        assert!(output.contains("Nothing waiting for review."));
    }
}

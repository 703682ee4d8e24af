use std::collections::HashMap;

use crate::models::{
    Category, CategoryCount, FrequencyPattern, Report, ReportAnalysis, TrendAnalysis,
};

/// A category seen this many times or more counts as a recurring issue.
pub const RECURRING_THRESHOLD: usize = 3;
/// Recurring problems are only flagged past this many reports.
pub const RECURRING_REPORT_FLOOR: usize = 2;
/// Minimum rise in mean safety or emotion level between the earliest and
/// most recent thirds that counts as worsening.
pub const WORSENING_THRESHOLD: f64 = 1.0;
pub const TOP_CATEGORIES: usize = 3;

const NEUTRAL_RECOMMENDATION: &str =
    "No reports yet for this student. Keep checking in regularly.";

/// Full recompute over one student's report history. Input order does not
/// matter; an empty history yields zeroed statistics.
pub fn analyze_student_reports(reports: &[Report]) -> ReportAnalysis {
    if reports.is_empty() {
        return ReportAnalysis {
            total_reports: 0,
            first_report_date: None,
            last_report_date: None,
            average_emotion_level: 0.0,
            average_safety_level: 0.0,
            most_common_categories: Vec::new(),
            frequency_pattern: FrequencyPattern::default(),
            recurring_issues: Vec::new(),
            trend: TrendAnalysis {
                is_worsening: false,
                has_recurring_problems: false,
                recommendation: NEUTRAL_RECOMMENDATION.to_string(),
            },
        };
    }

    let mut sorted: Vec<&Report> = reports.iter().collect();
    sorted.sort_by_key(|report| report.created_at);

    let total = sorted.len();
    let average_emotion = mean(sorted.iter().map(|r| f64::from(r.emotion.level)));
    let average_safety = mean(sorted.iter().map(|r| f64::from(r.safety.level)));

    let category_counts = count_categories(&sorted);
    let most_common: Vec<CategoryCount> = category_counts
        .iter()
        .take(TOP_CATEGORIES)
        .cloned()
        .collect();

    let mut frequency_pattern = FrequencyPattern::default();
    for report in &sorted {
        frequency_pattern.record(report.frequency);
    }

    let recurring: Vec<&CategoryCount> = category_counts
        .iter()
        .filter(|entry| entry.category != Category::General && entry.count >= RECURRING_THRESHOLD)
        .collect();
    let recurring_issues: Vec<String> = recurring
        .iter()
        .map(|entry| format!("{} harassment reported {} times", entry.category, entry.count))
        .collect();

    let is_worsening = is_worsening(&sorted);
    let has_recurring_problems = !recurring.is_empty() && total > RECURRING_REPORT_FLOOR;
    let recommendation = recommend(is_worsening, has_recurring_problems, &recurring, total);

    ReportAnalysis {
        total_reports: total,
        first_report_date: sorted.first().map(|r| r.created_at),
        last_report_date: sorted.last().map(|r| r.created_at),
        average_emotion_level: round1(average_emotion),
        average_safety_level: round1(average_safety),
        most_common_categories: most_common,
        frequency_pattern,
        recurring_issues,
        trend: TrendAnalysis {
            is_worsening,
            has_recurring_problems,
            recommendation,
        },
    }
}

/// Per-category symbol counts, highest first. Ties keep first-seen order.
fn count_categories(sorted: &[&Report]) -> Vec<CategoryCount> {
    let mut order: Vec<Category> = Vec::new();
    let mut counts: HashMap<Category, usize> = HashMap::new();
    for report in sorted {
        for symbol in &report.symbols {
            let entry = counts.entry(symbol.category).or_insert_with(|| {
                order.push(symbol.category);
                0
            });
            *entry += 1;
        }
    }

    let mut ranked: Vec<CategoryCount> = order
        .into_iter()
        .map(|category| CategoryCount {
            category,
            count: counts.get(&category).copied().unwrap_or(0),
        })
        .collect();
    // stable sort keeps first-seen order on ties
    ranked.sort_by(|a, b| b.count.cmp(&a.count));
    ranked
}

/// Recent-third mean minus earliest-third mean of one level.
fn window_delta(sorted: &[&Report], level: impl Fn(&Report) -> u8) -> f64 {
    let third = (sorted.len() / 3).max(1);
    let earliest = mean(sorted[..third].iter().map(|r| f64::from(level(r))));
    let recent = mean(sorted[sorted.len() - third..].iter().map(|r| f64::from(level(r))));
    recent - earliest
}

/// Safety and emotion are judged separately; either rising past the
/// threshold is enough.
fn is_worsening(sorted: &[&Report]) -> bool {
    if sorted.len() < 2 {
        return false;
    }
    window_delta(sorted, |r| r.safety.level) >= WORSENING_THRESHOLD
        || window_delta(sorted, |r| r.emotion.level) >= WORSENING_THRESHOLD
}

fn recommend(
    worsening: bool,
    recurring: bool,
    recurring_entries: &[&CategoryCount],
    total: usize,
) -> String {
    let categories = recurring_entries
        .iter()
        .map(|entry| entry.category.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    match (worsening, recurring) {
        (true, true) => format!(
            "Situation is getting worse and {categories} harassment keeps coming back across {total} reports. \
             Meet the student urgently and involve the school's anti-harassment referent."
        ),
        (false, true) => format!(
            "Recurring {categories} harassment across {total} reports. \
             Plan a follow-up meeting and watch the places where it happens."
        ),
        (true, false) => "Recent reports show the student feels less safe than before. \
             Schedule a check-in soon."
            .to_string(),
        (false, false) => {
            "Situation looks stable. Keep monitoring and check in regularly.".to_string()
        }
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), value| (sum + value, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

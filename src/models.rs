use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

/// Harassment type a symbol belongs to. Declaration order is the order the
/// fixed wizard visits categories in, and the order selections are flattened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Physical,
    Verbal,
    Social,
    Cyber,
    General,
}

impl Category {
    /// Categories a student can pick on a category step.
    pub const REPORTABLE: [Category; 4] = [
        Category::Physical,
        Category::Verbal,
        Category::Social,
        Category::Cyber,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Physical => "physical",
            Category::Verbal => "verbal",
            Category::Social => "social",
            Category::Cyber => "cyber",
            Category::General => "general",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "physical" => Ok(Category::Physical),
            "verbal" => Ok(Category::Verbal),
            "social" => Ok(Category::Social),
            "cyber" => Ok(Category::Cyber),
            "general" => Ok(Category::General),
            other => Err(ValidationError::UnknownCategory(other.to_string())),
        }
    }
}

/// Catalog entry as served by the symbol lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    pub id: String,
    pub label: String,
    pub category: Category,
}

/// One incident-type marker attached to a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolSelection {
    pub id: String,
    pub label: String,
    pub category: Category,
}

impl From<&Symbol> for SymbolSelection {
    fn from(symbol: &Symbol) -> Self {
        Self {
            id: symbol.id.clone(),
            label: symbol.label.clone(),
            category: symbol.category,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyRegion {
    Head,
    Neck,
    Chest,
    Stomach,
    LeftArm,
    RightArm,
    LeftHand,
    RightHand,
    Hips,
    LeftLeg,
    RightLeg,
    LeftFoot,
    RightFoot,
}

impl BodyRegion {
    pub const ALL: [BodyRegion; 13] = [
        BodyRegion::Head,
        BodyRegion::Neck,
        BodyRegion::Chest,
        BodyRegion::Stomach,
        BodyRegion::LeftArm,
        BodyRegion::RightArm,
        BodyRegion::LeftHand,
        BodyRegion::RightHand,
        BodyRegion::Hips,
        BodyRegion::LeftLeg,
        BodyRegion::RightLeg,
        BodyRegion::LeftFoot,
        BodyRegion::RightFoot,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BodyRegion::Head => "head",
            BodyRegion::Neck => "neck",
            BodyRegion::Chest => "chest",
            BodyRegion::Stomach => "stomach",
            BodyRegion::LeftArm => "left_arm",
            BodyRegion::RightArm => "right_arm",
            BodyRegion::LeftHand => "left_hand",
            BodyRegion::RightHand => "right_hand",
            BodyRegion::Hips => "hips",
            BodyRegion::LeftLeg => "left_leg",
            BodyRegion::RightLeg => "right_leg",
            BodyRegion::LeftFoot => "left_foot",
            BodyRegion::RightFoot => "right_foot",
        }
    }
}

impl fmt::Display for BodyRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BodyRegion {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let wanted = value.trim().to_ascii_lowercase();
        BodyRegion::ALL
            .into_iter()
            .find(|region| region.as_str() == wanted)
            .ok_or(ValidationError::UnknownBodyRegion(wanted))
    }
}

/// Body-region marker. Coordinates are percentages of the reference frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyMapSelection {
    pub body_part: BodyRegion,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EmotionColor {
    Green,
    Yellow,
    Orange,
    Red,
    DarkRed,
}

impl EmotionColor {
    pub fn as_str(self) -> &'static str {
        match self {
            EmotionColor::Green => "green",
            EmotionColor::Yellow => "yellow",
            EmotionColor::Orange => "orange",
            EmotionColor::Red => "red",
            EmotionColor::DarkRed => "dark-red",
        }
    }
}

impl FromStr for EmotionColor {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "green" => Ok(EmotionColor::Green),
            "yellow" => Ok(EmotionColor::Yellow),
            "orange" => Ok(EmotionColor::Orange),
            "red" => Ok(EmotionColor::Red),
            "dark-red" => Ok(EmotionColor::DarkRed),
            other => Err(ValidationError::UnknownTag(other.to_string())),
        }
    }
}

/// Ordinal emotional state, 1 (calm) to 5 (angry).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmotionScale {
    pub level: u8,
    pub color: EmotionColor,
}

impl EmotionScale {
    const PALETTE: [(EmotionColor, &'static str); 5] = [
        (EmotionColor::Green, "quiet"),
        (EmotionColor::Yellow, "confusion"),
        (EmotionColor::Orange, "pessimism"),
        (EmotionColor::Red, "fear"),
        (EmotionColor::DarkRed, "angry"),
    ];

    pub fn from_level(level: u8) -> Result<Self, ValidationError> {
        let (color, _) = Self::palette_entry(level).ok_or(ValidationError::LevelOutOfRange {
            field: "emotion",
            level,
        })?;
        Ok(Self { level, color })
    }

    pub fn feeling(&self) -> &'static str {
        Self::palette_entry(self.level)
            .map(|(_, feeling)| feeling)
            .unwrap_or("unknown")
    }

    fn palette_entry(level: u8) -> Option<(EmotionColor, &'static str)> {
        match level {
            1..=5 => Some(Self::PALETTE[usize::from(level - 1)]),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SafetyFeeling {
    VerySafe,
    Safe,
    Neutral,
    Unsafe,
    VeryUnsafe,
}

impl SafetyFeeling {
    pub fn as_str(self) -> &'static str {
        match self {
            SafetyFeeling::VerySafe => "very_safe",
            SafetyFeeling::Safe => "safe",
            SafetyFeeling::Neutral => "neutral",
            SafetyFeeling::Unsafe => "unsafe",
            SafetyFeeling::VeryUnsafe => "very_unsafe",
        }
    }
}

impl FromStr for SafetyFeeling {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "very_safe" => Ok(SafetyFeeling::VerySafe),
            "safe" => Ok(SafetyFeeling::Safe),
            "neutral" => Ok(SafetyFeeling::Neutral),
            "unsafe" => Ok(SafetyFeeling::Unsafe),
            "very_unsafe" => Ok(SafetyFeeling::VeryUnsafe),
            other => Err(ValidationError::UnknownTag(other.to_string())),
        }
    }
}

/// Ordinal safety level, 1 (very safe) to 5 (very unsafe).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyThermometer {
    pub level: u8,
    pub feeling: SafetyFeeling,
}

impl SafetyThermometer {
    pub fn from_level(level: u8) -> Result<Self, ValidationError> {
        let feeling = match level {
            1 => SafetyFeeling::VerySafe,
            2 => SafetyFeeling::Safe,
            3 => SafetyFeeling::Neutral,
            4 => SafetyFeeling::Unsafe,
            5 => SafetyFeeling::VeryUnsafe,
            _ => {
                return Err(ValidationError::LevelOutOfRange {
                    field: "safety",
                    level,
                })
            }
        };
        Ok(Self { level, feeling })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Once,
    Sometimes,
    Often,
    Always,
}

impl Frequency {
    pub fn as_str(self) -> &'static str {
        match self {
            Frequency::Once => "once",
            Frequency::Sometimes => "sometimes",
            Frequency::Often => "often",
            Frequency::Always => "always",
        }
    }
}

impl FromStr for Frequency {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "once" => Ok(Frequency::Once),
            "sometimes" => Ok(Frequency::Sometimes),
            "often" => Ok(Frequency::Often),
            "always" => Ok(Frequency::Always),
            other => Err(ValidationError::UnknownTag(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: String,
    pub name: String,
    pub icon: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    #[default]
    Pending,
    Reviewed,
    Resolved,
}

impl ReportStatus {
    pub const ALL: [ReportStatus; 3] = [
        ReportStatus::Pending,
        ReportStatus::Reviewed,
        ReportStatus::Resolved,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ReportStatus::Pending => "pending",
            ReportStatus::Reviewed => "reviewed",
            ReportStatus::Resolved => "resolved",
        }
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportStatus {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(ReportStatus::Pending),
            "reviewed" => Ok(ReportStatus::Reviewed),
            "resolved" => Ok(ReportStatus::Resolved),
            other => Err(ValidationError::UnknownTag(other.to_string())),
        }
    }
}

/// A fully answered wizard, ready to hand to the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportDraft {
    pub student_id: String,
    pub student_name: String,
    pub symbols: Vec<SymbolSelection>,
    pub body_map: Option<Vec<BodyMapSelection>>,
    pub emotion: EmotionScale,
    pub location: Location,
    pub frequency: Frequency,
    pub safety: SafetyThermometer,
}

impl ReportDraft {
    pub fn has_physical(&self) -> bool {
        self.symbols
            .iter()
            .any(|symbol| symbol.category == Category::Physical)
    }

    /// Checks the aggregate invariants a store relies on.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.student_name.trim().is_empty() {
            return Err(ValidationError::MissingSubjectName);
        }
        if self.symbols.is_empty() {
            return Err(ValidationError::MissingSymbols);
        }

        let mut seen = std::collections::HashSet::new();
        for symbol in &self.symbols {
            if !seen.insert(symbol.id.as_str()) {
                return Err(ValidationError::DuplicateSymbol(symbol.id.clone()));
            }
        }

        match (&self.body_map, self.has_physical()) {
            (Some(points), true) if points.is_empty() => Err(ValidationError::MissingBodyLocation),
            (None, true) => Err(ValidationError::MissingBodyLocation),
            (Some(_), false) => Err(ValidationError::BodyMapWithoutPhysical),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: Uuid,
    pub student_id: String,
    pub student_name: String,
    pub symbols: Vec<SymbolSelection>,
    pub body_map: Option<Vec<BodyMapSelection>>,
    pub emotion: EmotionScale,
    pub location: Location,
    pub frequency: Frequency,
    pub safety: SafetyThermometer,
    pub status: ReportStatus,
    pub teacher_notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Report {
    pub fn from_draft(draft: ReportDraft, id: Uuid, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            student_id: draft.student_id,
            student_name: draft.student_name,
            symbols: draft.symbols,
            body_map: draft.body_map,
            emotion: draft.emotion,
            location: draft.location,
            frequency: draft.frequency,
            safety: draft.safety,
            status: ReportStatus::Pending,
            teacher_notes: None,
            created_at,
        }
    }

    pub fn apply(&mut self, update: &ReportUpdate) {
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(notes) = &update.teacher_notes {
            self.teacher_notes = Some(notes.clone());
        }
    }
}

/// Partial reviewer update; `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportUpdate {
    pub status: Option<ReportStatus>,
    pub teacher_notes: Option<String>,
}

impl ReportUpdate {
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.teacher_notes.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub category: Category,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FrequencyPattern {
    pub once: usize,
    pub sometimes: usize,
    pub often: usize,
    pub always: usize,
}

impl FrequencyPattern {
    pub fn record(&mut self, frequency: Frequency) {
        match frequency {
            Frequency::Once => self.once += 1,
            Frequency::Sometimes => self.sometimes += 1,
            Frequency::Often => self.often += 1,
            Frequency::Always => self.always += 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendClass {
    Worsening,
    Recurring,
    Stable,
}

impl TrendClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrendClass::Worsening => "worsening",
            TrendClass::Recurring => "recurring",
            TrendClass::Stable => "stable",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendAnalysis {
    pub is_worsening: bool,
    pub has_recurring_problems: bool,
    pub recommendation: String,
}

impl TrendAnalysis {
    pub fn classes(&self) -> Vec<TrendClass> {
        let mut classes = Vec::new();
        if self.is_worsening {
            classes.push(TrendClass::Worsening);
        }
        if self.has_recurring_problems {
            classes.push(TrendClass::Recurring);
        }
        if classes.is_empty() {
            classes.push(TrendClass::Stable);
        }
        classes
    }
}

/// Per-student statistics, recomputed on every request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportAnalysis {
    pub total_reports: usize,
    pub first_report_date: Option<DateTime<Utc>>,
    pub last_report_date: Option<DateTime<Utc>>,
    pub average_emotion_level: f64,
    pub average_safety_level: f64,
    pub most_common_categories: Vec<CategoryCount>,
    pub frequency_pattern: FrequencyPattern,
    pub recurring_issues: Vec<String>,
    pub trend: TrendAnalysis,
}

//! Report wizard: walks a student through the reporting questions, keeps the
//! answers as a draft and hands the finished draft to the report store.
//!
//! Two step layouts exist. `Variant::Fixed` asks one category per step and
//! puts the body map last. `Variant::Dynamic` asks all categories on one
//! step and only shows the body-location step when "physical" is chosen.
//!
//! Delayed actions (moving on after an explicit "none", clearing the form
//! after a successful send) are deadlines fired by [`ReportWizard::tick`].

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::body_map;
use crate::catalog::{self, AttackMethod};
use crate::error::{ValidationError, WizardError};
use crate::models::{
    BodyMapSelection, BodyRegion, Category, EmotionScale, Frequency, Location, Report,
    ReportDraft, SafetyThermometer, SymbolSelection,
};
use crate::selection::CategorySelections;
use crate::store::ReportStore;

pub const AUTO_ADVANCE_DELAY: Duration = Duration::from_millis(300);
pub const AUTO_RESET_DELAY: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    Fixed,
    Dynamic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    Triage,
    Category(Category),
    Categories,
    BodyLocation,
    Review,
    Emotion,
    Location,
    Frequency,
    Safety,
}

const FIXED_STEPS: [Step; 11] = [
    Step::Triage,
    Step::Category(Category::Physical),
    Step::Category(Category::Verbal),
    Step::Category(Category::Social),
    Step::Category(Category::Cyber),
    Step::Review,
    Step::Emotion,
    Step::Location,
    Step::Frequency,
    Step::Safety,
    Step::BodyLocation,
];

const DYNAMIC_STEPS: [Step; 8] = [
    Step::Triage,
    Step::Categories,
    Step::BodyLocation,
    Step::Review,
    Step::Emotion,
    Step::Location,
    Step::Frequency,
    Step::Safety,
];

impl Variant {
    /// Every step the variant can show, in order.
    pub fn sequence(self) -> &'static [Step] {
        match self {
            Variant::Fixed => &FIXED_STEPS,
            Variant::Dynamic => &DYNAMIC_STEPS,
        }
    }
}

/// Who the report is about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportingMode {
    /// The signed-in student reports for themself.
    SelfReport {
        student_id: String,
        student_name: String,
    },
    /// Someone reports for another student whose name is typed at triage.
    OnBehalf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Triage {
    EverythingFine,
    NeedToReport,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardStatus {
    Editing,
    Submitting,
    Completed {
        report_id: Uuid,
        everything_fine: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    AutoAdvanced(Step),
    AutoReset,
}

/// Everything entered so far.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Answers {
    pub triage: Option<Triage>,
    pub subject_name: String,
    pub subject_id: Option<String>,
    pub selections: CategorySelections,
    /// Categories ticked on the dynamic category step.
    pub chosen: Vec<Category>,
    pub body_regions: Vec<BodyRegion>,
    pub emotion: Option<EmotionScale>,
    pub location: Option<Location>,
    pub frequency: Option<Frequency>,
    pub safety: Option<SafetyThermometer>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Timers {
    advance: Option<(Instant, Step)>,
    reset: Option<Instant>,
}

#[derive(Debug)]
pub struct ReportWizard {
    variant: Variant,
    mode: ReportingMode,
    step: Step,
    answers: Answers,
    locations: Vec<Location>,
    status: WizardStatus,
    timers: Timers,
    torn_down: bool,
    last_error: Option<String>,
}

impl ReportWizard {
    pub fn new(variant: Variant, mode: ReportingMode) -> Self {
        Self {
            variant,
            mode,
            step: Step::Triage,
            answers: Answers::default(),
            locations: Vec::new(),
            status: WizardStatus::Editing,
            timers: Timers::default(),
            torn_down: false,
            last_error: None,
        }
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn mode(&self) -> &ReportingMode {
        &self.mode
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn answers(&self) -> &Answers {
        &self.answers
    }

    pub fn status(&self) -> &WizardStatus {
        &self.status
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    /// Message for the last failed send, cleared by the next success or reset.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn symbols(&self) -> Vec<SymbolSelection> {
        self.answers.selections.flatten()
    }

    pub fn body_map(&self) -> Vec<BodyMapSelection> {
        body_map::selections_for(&self.answers.body_regions)
    }

    pub fn attack_methods(&self) -> Vec<AttackMethod> {
        self.answers.selections.attack_methods()
    }

    /// Fetches the location list. A failure is logged and leaves the list
    /// empty.
    pub async fn load_locations<S: ReportStore + ?Sized>(&mut self, store: &S) -> usize {
        match store.list_locations().await {
            Ok(locations) => self.locations = locations,
            Err(err) => warn!("Error loading locations: {err}"),
        }
        self.locations.len()
    }

    pub fn visible_steps(&self) -> Vec<Step> {
        let physical = self.physical_chosen();
        self.variant
            .sequence()
            .iter()
            .copied()
            .filter(|step| {
                self.variant == Variant::Fixed || *step != Step::BodyLocation || physical
            })
            .collect()
    }

    /// 1-based position and visible step count.
    pub fn progress(&self) -> (usize, usize) {
        let visible = self.visible_steps();
        let position = visible
            .iter()
            .position(|step| *step == self.step)
            .map_or(0, |index| index + 1);
        (position, visible.len())
    }

    pub fn is_terminal(&self) -> bool {
        self.visible_steps().last() == Some(&self.step)
    }

    fn physical_chosen(&self) -> bool {
        match self.variant {
            Variant::Fixed => self.answers.selections.has_physical(),
            Variant::Dynamic => self.answers.chosen.contains(&Category::Physical),
        }
    }

    fn ensure_editable(&self) -> Result<(), WizardError> {
        if self.torn_down {
            return Err(WizardError::TornDown);
        }
        match self.status {
            WizardStatus::Editing => Ok(()),
            WizardStatus::Submitting => Err(WizardError::SubmitInFlight),
            WizardStatus::Completed { .. } => Err(WizardError::Completed),
        }
    }

    fn reposition(&mut self) {
        let visible = self.visible_steps();
        let target = nearest_visible(self.variant.sequence(), &visible, self.step);
        if target != self.step {
            debug!(from = ?self.step, to = ?target, "step no longer visible, repositioned");
            self.step = target;
        }
    }

    // ---- triage ----

    /// "I need to report something": moves past triage.
    pub fn start_report(&mut self) -> Result<Step, WizardError> {
        self.ensure_editable()?;
        if !matches!(self.mode, ReportingMode::SelfReport { .. }) {
            return Err(WizardError::WrongMode);
        }
        if self.step != Step::Triage {
            return Err(WizardError::WrongStep(self.step));
        }
        self.answers.triage = Some(Triage::NeedToReport);
        self.advance()
    }

    pub fn set_subject_name(&mut self, name: &str) -> Result<(), WizardError> {
        self.ensure_editable()?;
        if self.mode != ReportingMode::OnBehalf {
            return Err(WizardError::WrongMode);
        }
        self.answers.subject_name = name.to_string();
        Ok(())
    }

    /// "Everything is fine": sends a minimal-severity report straight away.
    /// On failure the triage answer is cleared so the question can be asked
    /// again.
    pub async fn report_everything_fine<S: ReportStore + ?Sized>(
        &mut self,
        store: &S,
        now: Instant,
    ) -> Result<Report, WizardError> {
        self.ensure_editable()?;
        let ReportingMode::SelfReport {
            student_id,
            student_name,
        } = self.mode.clone()
        else {
            return Err(WizardError::WrongMode);
        };
        if self.step != Step::Triage {
            return Err(WizardError::WrongStep(self.step));
        }

        self.answers.triage = Some(Triage::EverythingFine);
        if self.locations.is_empty() {
            self.load_locations(store).await;
        }
        let location = self
            .locations
            .first()
            .cloned()
            .unwrap_or_else(catalog::fallback_location);

        let draft = ReportDraft {
            student_id,
            student_name,
            symbols: vec![catalog::everything_fine()],
            body_map: None,
            emotion: EmotionScale::from_level(1)?,
            location,
            frequency: Frequency::Once,
            safety: SafetyThermometer::from_level(1)?,
        };

        match self.send(store, &draft, now, true).await {
            Ok(report) => Ok(report),
            Err(err) => {
                self.answers.triage = None;
                Err(err)
            }
        }
    }

    // ---- categories ----

    /// Replaces the selections for one category. Does not move the wizard.
    pub fn select_category(
        &mut self,
        category: Category,
        selections: Vec<SymbolSelection>,
    ) -> Result<(), WizardError> {
        self.ensure_editable()?;
        if !Category::REPORTABLE.contains(&category) {
            return Err(ValidationError::UnknownCategory(category.to_string()).into());
        }
        let non_empty = !selections.is_empty();
        self.answers.selections.replace(category, selections)?;
        if self.variant == Variant::Dynamic && non_empty && !self.answers.chosen.contains(&category)
        {
            self.answers.chosen.push(category);
        }
        self.reposition();
        Ok(())
    }

    /// Ticks or unticks a category on the dynamic category step. Unticking
    /// drops that category's symbols.
    pub fn toggle_category(&mut self, category: Category) -> Result<bool, WizardError> {
        self.ensure_editable()?;
        if self.variant != Variant::Dynamic {
            return Err(WizardError::WrongStep(self.step));
        }
        if !Category::REPORTABLE.contains(&category) {
            return Err(ValidationError::UnknownCategory(category.to_string()).into());
        }

        let chosen = if let Some(index) = self.answers.chosen.iter().position(|c| *c == category) {
            self.answers.chosen.remove(index);
            self.answers.selections.remove(category);
            false
        } else {
            self.answers.chosen.push(category);
            true
        };
        self.reposition();
        Ok(chosen)
    }

    /// Explicit "nothing happened in this category". On a fixed category step
    /// that had no selections, schedules a move to the next category step.
    pub fn confirm_none(&mut self, category: Category, now: Instant) -> Result<bool, WizardError> {
        self.ensure_editable()?;
        let fresh = self.answers.selections.confirm_none(category);
        if self.variant == Variant::Dynamic {
            self.answers.chosen.retain(|c| *c != category);
            self.reposition();
            return Ok(false);
        }

        let on_step = self.step == Step::Category(category);
        let next_is_category = self
            .next_visible()
            .is_some_and(|next| matches!(next, Step::Category(_)));
        if fresh && on_step && next_is_category {
            self.timers.advance = Some((now + AUTO_ADVANCE_DELAY, self.step));
            return Ok(true);
        }
        Ok(false)
    }

    // ---- physical details ----

    pub fn toggle_body_region(&mut self, region: BodyRegion) -> Result<(), WizardError> {
        self.ensure_editable()?;
        let regions = &mut self.answers.body_regions;
        if let Some(index) = regions.iter().position(|r| *r == region) {
            regions.remove(index);
        } else {
            regions.push(region);
        }
        Ok(())
    }

    pub fn set_body_regions(&mut self, regions: &[BodyRegion]) -> Result<(), WizardError> {
        self.ensure_editable()?;
        self.answers.body_regions.clear();
        for region in regions {
            if !self.answers.body_regions.contains(region) {
                self.answers.body_regions.push(*region);
            }
        }
        Ok(())
    }

    /// Sets how the student was hurt; each method becomes one physical
    /// symbol.
    pub fn set_attack_methods(&mut self, methods: &[AttackMethod]) -> Result<(), WizardError> {
        self.ensure_editable()?;
        self.answers.selections.set_attack_methods(methods);
        if self.variant == Variant::Dynamic && !self.answers.chosen.contains(&Category::Physical) {
            self.answers.chosen.push(Category::Physical);
        }
        self.reposition();
        Ok(())
    }

    // ---- scalar answers ----

    pub fn set_emotion(&mut self, level: u8) -> Result<(), WizardError> {
        self.ensure_editable()?;
        self.answers.emotion = Some(EmotionScale::from_level(level)?);
        Ok(())
    }

    /// Picks a location from the loaded list.
    pub fn set_location(&mut self, location_id: &str) -> Result<(), WizardError> {
        self.ensure_editable()?;
        let location = self
            .locations
            .iter()
            .find(|location| location.id == location_id)
            .cloned()
            .ok_or_else(|| ValidationError::UnknownLocation(location_id.to_string()))?;
        self.answers.location = Some(location);
        Ok(())
    }

    pub fn set_frequency(&mut self, frequency: Frequency) -> Result<(), WizardError> {
        self.ensure_editable()?;
        self.answers.frequency = Some(frequency);
        Ok(())
    }

    pub fn set_safety(&mut self, level: u8) -> Result<(), WizardError> {
        self.ensure_editable()?;
        self.answers.safety = Some(SafetyThermometer::from_level(level)?);
        Ok(())
    }

    // ---- navigation ----

    /// Completion check for a single step.
    pub fn check_step(&self, step: Step) -> Result<(), ValidationError> {
        let answers = &self.answers;
        match step {
            Step::Triage => match self.mode {
                ReportingMode::SelfReport { .. } => match answers.triage {
                    Some(Triage::NeedToReport) => Ok(()),
                    _ => Err(ValidationError::MissingTriage),
                },
                ReportingMode::OnBehalf => {
                    if answers.subject_name.trim().is_empty() {
                        Err(ValidationError::MissingSubjectName)
                    } else {
                        Ok(())
                    }
                }
            },
            Step::Category(_) | Step::Review => Ok(()),
            Step::Categories => {
                if answers.chosen.is_empty() {
                    return Err(ValidationError::MissingCategory);
                }
                match answers.chosen.iter().find(|category| {
                    **category != Category::Physical && answers.selections.get(**category).is_empty()
                }) {
                    Some(category) => Err(ValidationError::EmptyCategory(*category)),
                    None => Ok(()),
                }
            }
            Step::BodyLocation => match self.variant {
                Variant::Fixed => Ok(()),
                Variant::Dynamic => self.check_physical_details(),
            },
            Step::Emotion => answers.emotion.map(|_| ()).ok_or(ValidationError::MissingEmotion),
            Step::Location => answers
                .location
                .as_ref()
                .map(|_| ())
                .ok_or(ValidationError::MissingLocation),
            Step::Frequency => answers
                .frequency
                .map(|_| ())
                .ok_or(ValidationError::MissingFrequency),
            Step::Safety => answers.safety.map(|_| ()).ok_or(ValidationError::MissingSafety),
        }
    }

    fn check_physical_details(&self) -> Result<(), ValidationError> {
        if !self.physical_chosen() {
            return Ok(());
        }
        if self.answers.body_regions.is_empty() {
            return Err(ValidationError::MissingBodyLocation);
        }
        if self.answers.selections.attack_methods().is_empty() {
            return Err(ValidationError::MissingAttackMethod);
        }
        Ok(())
    }

    pub fn can_advance(&self) -> bool {
        self.ensure_editable().is_ok() && !self.is_terminal() && self.check_step(self.step).is_ok()
    }

    fn next_visible(&self) -> Option<Step> {
        let visible = self.visible_steps();
        let index = visible.iter().position(|step| *step == self.step)?;
        visible.get(index + 1).copied()
    }

    pub fn advance(&mut self) -> Result<Step, WizardError> {
        self.ensure_editable()?;
        self.check_step(self.step)?;
        let next = self.next_visible().ok_or(WizardError::WrongStep(self.step))?;
        self.timers.advance = None;
        debug!(from = ?self.step, to = ?next, "wizard advanced");
        self.step = next;
        Ok(next)
    }

    /// Goes back one step. Answers are kept.
    pub fn retreat(&mut self) -> Result<Step, WizardError> {
        self.ensure_editable()?;
        let visible = self.visible_steps();
        let index = visible
            .iter()
            .position(|step| *step == self.step)
            .unwrap_or(0);
        if index == 0 {
            return Err(WizardError::AtFirstStep);
        }
        self.timers.advance = None;
        self.step = visible[index - 1];
        debug!(to = ?self.step, "wizard went back");
        Ok(self.step)
    }

    // ---- submission ----

    fn subject(&self) -> (String, String) {
        match &self.mode {
            ReportingMode::SelfReport {
                student_id,
                student_name,
            } => (student_id.clone(), student_name.clone()),
            ReportingMode::OnBehalf => (
                self.answers.subject_id.clone().unwrap_or_default(),
                self.answers.subject_name.trim().to_string(),
            ),
        }
    }

    /// Assembles the draft, or names the first missing answer.
    pub fn build_draft(&self) -> Result<ReportDraft, ValidationError> {
        let answers = &self.answers;
        if self.mode == ReportingMode::OnBehalf && answers.subject_name.trim().is_empty() {
            return Err(ValidationError::MissingSubjectName);
        }

        let symbols = self.symbols();
        if symbols.is_empty() {
            return Err(ValidationError::MissingSymbols);
        }
        let emotion = answers.emotion.ok_or(ValidationError::MissingEmotion)?;
        let location = answers
            .location
            .clone()
            .ok_or(ValidationError::MissingLocation)?;
        let frequency = answers.frequency.ok_or(ValidationError::MissingFrequency)?;
        let safety = answers.safety.ok_or(ValidationError::MissingSafety)?;

        self.check_physical_details()?;
        let body_map = if symbols.iter().any(|s| s.category == Category::Physical) {
            let points = self.body_map();
            if points.is_empty() {
                return Err(ValidationError::MissingBodyLocation);
            }
            Some(points)
        } else {
            None
        };

        let (student_id, student_name) = self.subject();
        let draft = ReportDraft {
            student_id,
            student_name,
            symbols,
            body_map,
            emotion,
            location,
            frequency,
            safety,
        };
        draft.validate()?;
        Ok(draft)
    }

    pub fn can_submit(&self) -> bool {
        self.ensure_editable().is_ok() && self.is_terminal() && self.build_draft().is_ok()
    }

    /// Sends the draft from the last step. A store failure keeps every answer
    /// so the student can simply try again.
    pub async fn submit<S: ReportStore + ?Sized>(
        &mut self,
        store: &S,
        now: Instant,
    ) -> Result<Report, WizardError> {
        self.ensure_editable()?;
        if !self.is_terminal() {
            return Err(WizardError::WrongStep(self.step));
        }
        if self.mode == ReportingMode::OnBehalf && self.answers.subject_id.is_none() {
            self.answers.subject_id = Some(format!("student-{}", Uuid::new_v4()));
        }

        let draft = match self.build_draft() {
            Ok(draft) => draft,
            Err(err) => {
                self.last_error = Some(err.to_string());
                return Err(err.into());
            }
        };
        self.send(store, &draft, now, false).await
    }

    async fn send<S: ReportStore + ?Sized>(
        &mut self,
        store: &S,
        draft: &ReportDraft,
        now: Instant,
        everything_fine: bool,
    ) -> Result<Report, WizardError> {
        let in_flight = InFlight::begin(&mut self.status);
        match store.create_report(draft).await {
            Ok(report) => {
                info!(report_id = %report.id, student_id = %report.student_id, "report submitted");
                in_flight.finish(WizardStatus::Completed {
                    report_id: report.id,
                    everything_fine,
                });
                self.last_error = None;
                self.timers.advance = None;
                self.timers.reset = Some(now + AUTO_RESET_DELAY);
                Ok(report)
            }
            Err(err) => {
                warn!("Error submitting report: {err}");
                in_flight.finish(WizardStatus::Editing);
                self.last_error = Some("Error sending report. Please try again.".to_string());
                Err(err.into())
            }
        }
    }

    /// Clears every answer and returns to the first step.
    pub fn reset(&mut self) {
        self.answers = Answers::default();
        self.step = Step::Triage;
        self.status = WizardStatus::Editing;
        self.timers = Timers::default();
        self.last_error = None;
    }

    // ---- timers ----

    pub fn next_deadline(&self) -> Option<Instant> {
        if self.torn_down {
            return None;
        }
        let advance = self.timers.advance.map(|(at, _)| at);
        match (advance, self.timers.reset) {
            (Some(a), Some(r)) => Some(a.min(r)),
            (a, r) => a.or(r),
        }
    }

    /// Fires every deadline at or before `now`.
    pub fn tick(&mut self, now: Instant) -> Vec<TimerEvent> {
        let mut events = Vec::new();
        if self.torn_down {
            return events;
        }

        if let Some(at) = self.timers.reset {
            if at <= now {
                self.reset();
                events.push(TimerEvent::AutoReset);
                return events;
            }
        }

        if let Some((at, scheduled_on)) = self.timers.advance {
            if at <= now {
                self.timers.advance = None;
                if self.step == scheduled_on && self.advance().is_ok() {
                    events.push(TimerEvent::AutoAdvanced(self.step));
                }
            }
        }
        events
    }

    /// Cancels pending deadlines; the wizard ignores ticks afterwards.
    pub fn teardown(&mut self) {
        self.timers = Timers::default();
        self.torn_down = true;
    }
}

/// Holds the wizard in `Submitting` while a send is awaited. Dropped before
/// `finish` (the send future was cancelled), it puts the wizard back to
/// `Editing` with the draft untouched.
struct InFlight<'a> {
    status: &'a mut WizardStatus,
}

impl<'a> InFlight<'a> {
    fn begin(status: &'a mut WizardStatus) -> Self {
        *status = WizardStatus::Submitting;
        Self { status }
    }

    fn finish(self, next: WizardStatus) {
        *self.status = next;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if *self.status == WizardStatus::Submitting {
            *self.status = WizardStatus::Editing;
        }
    }
}

/// `current` if visible, else the first visible step after it in
/// `sequence`, else the last visible step.
fn nearest_visible(sequence: &[Step], visible: &[Step], current: Step) -> Step {
    if visible.contains(&current) {
        return current;
    }
    let start = sequence
        .iter()
        .position(|step| *step == current)
        .unwrap_or(0);
    sequence[start..]
        .iter()
        .find(|step| visible.contains(step))
        .or_else(|| visible.last())
        .copied()
        .unwrap_or(current)
}

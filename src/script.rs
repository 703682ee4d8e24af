//! Answers file for driving a wizard without a UI. The wizard is walked step
//! by step and each step is answered from the file, so the same completion
//! rules apply as for an interactive session.

use std::collections::BTreeMap;
use std::time::Instant;

use serde::Deserialize;
use tracing::debug;

use crate::catalog::AttackMethod;
use crate::error::{ValidationError, WizardError};
use crate::models::{BodyRegion, Category, Frequency, Report, SymbolSelection};
use crate::store::ReportStore;
use crate::wizard::{ReportWizard, ReportingMode, Step, Variant};

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ScriptSubject {
    SelfReport {
        student_id: String,
        student_name: String,
    },
    OnBehalf {
        name: String,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct WizardScript {
    #[serde(default = "default_variant")]
    pub variant: Variant,
    pub subject: ScriptSubject,
    #[serde(default)]
    pub everything_fine: bool,
    /// Symbol ids per category. A category with an empty list is answered
    /// "none" (fixed layout) or ticked without symbols (dynamic layout).
    #[serde(default)]
    pub categories: BTreeMap<Category, Vec<String>>,
    #[serde(default)]
    pub attack_methods: Vec<AttackMethod>,
    #[serde(default)]
    pub body_regions: Vec<BodyRegion>,
    pub emotion: Option<u8>,
    pub location: Option<String>,
    pub frequency: Option<Frequency>,
    pub safety: Option<u8>,
}

fn default_variant() -> Variant {
    Variant::Dynamic
}

impl WizardScript {
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    fn mode(&self) -> ReportingMode {
        match &self.subject {
            ScriptSubject::SelfReport {
                student_id,
                student_name,
            } => ReportingMode::SelfReport {
                student_id: student_id.clone(),
                student_name: student_name.clone(),
            },
            ScriptSubject::OnBehalf { .. } => ReportingMode::OnBehalf,
        }
    }
}

async fn resolve<S: ReportStore + ?Sized>(
    store: &S,
    category: Category,
    ids: &[String],
) -> Result<Vec<SymbolSelection>, WizardError> {
    let catalog = store.list_symbols_by_category(category).await?;
    ids.iter()
        .map(|id| {
            catalog
                .iter()
                .find(|symbol| symbol.id == *id)
                .map(SymbolSelection::from)
                .ok_or_else(|| WizardError::from(ValidationError::UnknownSymbol(id.clone())))
        })
        .collect()
}

/// Runs `script` through a fresh wizard and submits the result.
pub async fn run_script<S: ReportStore + ?Sized>(
    script: &WizardScript,
    store: &S,
    now: Instant,
) -> Result<Report, WizardError> {
    let mut wizard = ReportWizard::new(script.variant, script.mode());
    wizard.load_locations(store).await;

    if script.everything_fine {
        return wizard.report_everything_fine(store, now).await;
    }

    match &script.subject {
        ScriptSubject::SelfReport { .. } => {
            wizard.start_report()?;
        }
        ScriptSubject::OnBehalf { name } => {
            wizard.set_subject_name(name)?;
            wizard.advance()?;
        }
    }

    loop {
        answer_step(&mut wizard, script, store, now).await?;
        if wizard.is_terminal() {
            break;
        }
        wizard.advance()?;
    }

    let result = wizard.submit(store, now).await;
    wizard.teardown();
    result
}

async fn answer_step<S: ReportStore + ?Sized>(
    wizard: &mut ReportWizard,
    script: &WizardScript,
    store: &S,
    now: Instant,
) -> Result<(), WizardError> {
    let step = wizard.step();
    debug!(?step, "answering scripted step");
    match step {
        Step::Triage | Step::Review => {}
        Step::Category(category) => {
            if category == Category::Physical && !script.attack_methods.is_empty() {
                wizard.set_attack_methods(&script.attack_methods)?;
            } else {
                match script.categories.get(&category) {
                    Some(ids) if !ids.is_empty() => {
                        let selections = resolve(store, category, ids).await?;
                        wizard.select_category(category, selections)?;
                    }
                    _ => {
                        wizard.confirm_none(category, now)?;
                    }
                }
            }
        }
        Step::Categories => {
            for (category, ids) in &script.categories {
                if ids.is_empty() {
                    if !wizard.answers().chosen.contains(category) {
                        wizard.toggle_category(*category)?;
                    }
                } else {
                    let selections = resolve(store, *category, ids).await?;
                    wizard.select_category(*category, selections)?;
                }
            }
            if !script.attack_methods.is_empty() {
                wizard.set_attack_methods(&script.attack_methods)?;
            }
        }
        Step::BodyLocation => {
            wizard.set_body_regions(&script.body_regions)?;
        }
        Step::Emotion => {
            if let Some(level) = script.emotion {
                wizard.set_emotion(level)?;
            }
        }
        Step::Location => {
            if let Some(id) = &script.location {
                wizard.set_location(id)?;
            }
        }
        Step::Frequency => {
            if let Some(frequency) = script.frequency {
                wizard.set_frequency(frequency)?;
            }
        }
        Step::Safety => {
            if let Some(level) = script.safety {
                wizard.set_safety(level)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryReportStore;

    const PHYSICAL: &str = r#"{
        "variant": "dynamic",
        "subject": { "mode": "self_report", "student_id": "student-007", "student_name": "Ines" },
        "categories": { "physical": [], "verbal": ["mock"] },
        "attack_methods": ["frapper"],
        "body_regions": ["left_arm"],
        "emotion": 4,
        "location": "classroom",
        "frequency": "often",
        "safety": 4
    }"#;

    #[tokio::test]
    async fn runs_a_dynamic_script() {
        let store = MemoryReportStore::new();
        let script = WizardScript::from_json(PHYSICAL).unwrap();
        let report = run_script(&script, &store, Instant::now()).await.unwrap();

        let ids: Vec<&str> = report.symbols.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["hit", "mock"]);
        assert_eq!(report.body_map.unwrap()[0].body_part, BodyRegion::LeftArm);
        assert_eq!(report.student_id, "student-007");
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn fixed_script_answers_none_for_missing_categories() {
        let store = MemoryReportStore::new();
        let script = WizardScript::from_json(
            r#"{
                "variant": "fixed",
                "subject": { "mode": "on_behalf", "name": "Yanis" },
                "categories": { "cyber": ["photo", "online"] },
                "emotion": 2,
                "location": "online",
                "frequency": "sometimes",
                "safety": 3
            }"#,
        )
        .unwrap();
        let report = run_script(&script, &store, Instant::now()).await.unwrap();
        assert_eq!(report.student_name, "Yanis");
        assert_eq!(report.symbols.len(), 2);
        assert!(report.body_map.is_none());
    }

    #[tokio::test]
    async fn missing_answer_stops_the_walk() {
        let store = MemoryReportStore::new();
        let mut script = WizardScript::from_json(PHYSICAL).unwrap();
        script.emotion = None;
        let result = run_script(&script, &store, Instant::now()).await;
        assert!(matches!(
            result,
            Err(WizardError::Validation(ValidationError::MissingEmotion))
        ));
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn unknown_symbol_is_reported() {
        let store = MemoryReportStore::new();
        let mut script = WizardScript::from_json(PHYSICAL).unwrap();
        script
            .categories
            .insert(Category::Social, vec!["gossip".to_string()]);
        let result = run_script(&script, &store, Instant::now()).await;
        assert!(matches!(
            result,
            Err(WizardError::Validation(ValidationError::UnknownSymbol(_)))
        ));
    }

    #[tokio::test]
    async fn everything_fine_skips_the_questions() {
        let store = MemoryReportStore::new();
        let script = WizardScript::from_json(
            r#"{
                "subject": { "mode": "self_report", "student_id": "student-001", "student_name": "Student" },
                "everything_fine": true
            }"#,
        )
        .unwrap();
        let report = run_script(&script, &store, Instant::now()).await.unwrap();
        assert_eq!(report.symbols[0].category, Category::General);
    }
}

use thiserror::Error;
use uuid::Uuid;

use crate::models::Category;
use crate::wizard::Step;

/// Missing or malformed answers. Raised and handled locally; never sent to
/// the store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("select at least one incident to report")]
    MissingSymbols,

    #[error("choose how you feel")]
    MissingEmotion,

    #[error("choose where it happened")]
    MissingLocation,

    #[error("choose how often it happens")]
    MissingFrequency,

    #[error("choose how safe you feel")]
    MissingSafety,

    #[error("enter the name of the person who needs help")]
    MissingSubjectName,

    #[error("answer the first question before continuing")]
    MissingTriage,

    #[error("choose at least one category")]
    MissingCategory,

    #[error("select at least one incident in category {0}")]
    EmptyCategory(Category),

    #[error("mark where on the body it happened")]
    MissingBodyLocation,

    #[error("choose how you were hurt")]
    MissingAttackMethod,

    #[error("{field} level {level} is outside 1..=5")]
    LevelOutOfRange { field: &'static str, level: u8 },

    #[error("symbol {id} belongs to {actual}, not {expected}")]
    CategoryMismatch {
        id: String,
        expected: Category,
        actual: Category,
    },

    #[error("symbol {0} appears more than once")]
    DuplicateSymbol(String),

    #[error("body map is only recorded for physical incidents")]
    BodyMapWithoutPhysical,

    #[error("unknown category: {0}")]
    UnknownCategory(String),

    #[error("unknown symbol: {0}")]
    UnknownSymbol(String),

    #[error("unknown location: {0}")]
    UnknownLocation(String),

    #[error("unknown body region: {0}")]
    UnknownBodyRegion(String),

    #[error("unknown attack method: {0}")]
    UnknownAttackMethod(String),

    #[error("unknown value: {0}")]
    UnknownTag(String),
}

/// Failure talking to the report store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("report {0} not found")]
    NotFound(Uuid),

    #[error("stored row could not be decoded: {0}")]
    Decode(String),

    #[error("report rejected: {0}")]
    Rejected(#[from] ValidationError),

    #[error("report store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Error, Debug)]
pub enum WizardError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("could not reach the report store: {0}")]
    Store(#[from] StoreError),

    #[error("not available on step {0:?}")]
    WrongStep(Step),

    #[error("already on the first step")]
    AtFirstStep,

    #[error("a report is already being sent")]
    SubmitInFlight,

    #[error("the report has already been sent")]
    Completed,

    #[error("the wizard has been closed")]
    TornDown,

    #[error("only available when reporting for yourself")]
    WrongMode,
}

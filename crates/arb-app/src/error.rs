use thiserror::Error;

/// Errors surfaced while parsing operator input (spec.md §6.3). These never
/// reach the scanner/execution error taxonomy — they're rejected before any
/// venue call is made.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    #[error("could not parse input line, expected \"COIN Long (VENUE), Short (VENUE) [AMOUNT]\"")]
    Malformed,

    #[error("unknown venue {0:?}")]
    UnknownVenue(String),

    #[error("long and short venue must differ")]
    SameVenue,

    #[error("could not parse confirmation, expected \"Да[, X%]\" or \"Нет\"")]
    BadConfirmation,
}

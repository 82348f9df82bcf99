//! Error codes for the backend API.
//!
//! This module defines all error codes used throughout the application.
//! Add new codes here; never pass ad-hoc strings as error codes.
//!
//! All error codes are SCREAMING_SNAKE_CASE and map 1:1 to the strings
//! that appear in HTTP responses.

use core::fmt;

/// Centralized error codes for the backend API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Authentication & Authorization
    /// Missing or wrong `x-api-key`
    Unauthorized,
    /// Access denied
    Forbidden,
    /// Acting player is not on the game roster
    NotAMember,
    /// Only the round's judge may pick a winner
    NotJudge,
    /// The judge does not submit an answer
    JudgeCannotSubmit,

    // Request Validation
    /// Invalid game ID provided
    InvalidGameId,
    /// Malformed player address
    InvalidPlayer,
    /// Unknown action name or malformed payload
    InvalidAction,
    /// Action not legal in the current phase
    PhaseMismatch,
    /// Submitted answer is not in the player's hand
    CardNotInHand,
    /// Named player is not on the roster
    UnknownPlayer,
    /// Picked winner has no submission this round
    NoSubmission,
    /// Finalize payload is inconsistent
    BadPayload,
    /// Players have not delegated finalize rights to the relayer
    MissingDelegates,
    /// General bad request error
    BadRequest,

    // Resource Not Found
    /// Game not found
    GameNotFound,
    /// Match record not found in the store
    MatchNotFound,

    // Business Logic Conflicts
    /// Game is not in the started state
    GameNotActive,
    /// Player already submitted this round
    AlreadySubmitted,
    /// Match has not reached the ended phase
    MatchNotEnded,
    /// Generic conflict
    Conflict,

    // System Errors
    /// Match store unreachable
    StoreUnavailable,
    /// Chain gateway unreachable or returned garbage
    UpstreamUnavailable,
    /// Card catalog has no active prompts or answers
    EmptyCatalog,
    /// Ledger transaction failed
    LedgerFailure,
    /// Internal server error
    Internal,
    /// Configuration error
    ConfigError,
    /// Data corruption detected
    DataCorruption,
}

impl ErrorCode {
    /// Returns the canonical SCREAMING_SNAKE_CASE string for this error code.
    ///
    /// This is the exact string that appears in HTTP responses.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden => "FORBIDDEN",
            Self::NotAMember => "NOT_A_MEMBER",
            Self::NotJudge => "NOT_JUDGE",
            Self::JudgeCannotSubmit => "JUDGE_CANNOT_SUBMIT",

            Self::InvalidGameId => "INVALID_GAME_ID",
            Self::InvalidPlayer => "INVALID_PLAYER",
            Self::InvalidAction => "INVALID_ACTION",
            Self::PhaseMismatch => "PHASE_MISMATCH",
            Self::CardNotInHand => "CARD_NOT_IN_HAND",
            Self::UnknownPlayer => "UNKNOWN_PLAYER",
            Self::NoSubmission => "NO_SUBMISSION",
            Self::BadPayload => "BAD_PAYLOAD",
            Self::MissingDelegates => "MISSING_DELEGATES",
            Self::BadRequest => "BAD_REQUEST",

            Self::GameNotFound => "GAME_NOT_FOUND",
            Self::MatchNotFound => "MATCH_NOT_FOUND",

            Self::GameNotActive => "GAME_NOT_ACTIVE",
            Self::AlreadySubmitted => "ALREADY_SUBMITTED",
            Self::MatchNotEnded => "MATCH_NOT_ENDED",
            Self::Conflict => "CONFLICT",

            Self::StoreUnavailable => "STORE_UNAVAILABLE",
            Self::UpstreamUnavailable => "UPSTREAM_UNAVAILABLE",
            Self::EmptyCatalog => "EMPTY_CATALOG",
            Self::LedgerFailure => "LEDGER_FAILURE",
            Self::Internal => "INTERNAL",
            Self::ConfigError => "CONFIG_ERROR",
            Self::DataCorruption => "DATA_CORRUPTION",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

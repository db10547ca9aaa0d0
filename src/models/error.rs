//! Errors raised by tournament operations.

use crate::identity::IdentityError;
use crate::models::game::MatchId;
use crate::models::team::TeamId;
use crate::models::tournament::{TournamentId, TournamentStatus};
use thiserror::Error;

/// Why a score pair is not a valid final score.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Error)]
pub enum ScoreError {
    #[error("Matches cannot end in a draw")]
    Draw,
    #[error("The winning side must reach 13 rounds")]
    BelowThreshold,
    #[error("A 12-12 game continues into overtime; report the final overtime score")]
    NeedsExtension,
    #[error("Overtime must be won by 2 rounds")]
    ExtensionGapTooSmall,
    #[error("Invalid score")]
    Invalid,
}

/// Errors that can occur during tournament operations. All are user-facing.
#[derive(Debug, Error)]
pub enum TournamentError {
    #[error("Tournament not found")]
    TournamentNotFound(TournamentId),
    #[error("Match not found")]
    MatchNotFound(MatchId),
    #[error("Team not found")]
    TeamNotFound(TeamId),
    #[error("Tournament is {actual}, expected {expected}")]
    InvalidState {
        expected: TournamentStatus,
        actual: TournamentStatus,
    },
    #[error("Team count must be 4, 8 or 16 (got {0})")]
    InvalidCapacity(usize),
    #[error("Name must not be empty")]
    InvalidName,
    #[error("Tournament is full ({capacity} teams)")]
    CapacityExceeded { capacity: usize },
    #[error("A tournament named \"{0}\" already exists")]
    DuplicateTournamentName(String),
    #[error("A team named \"{0}\" is already registered")]
    DuplicateTeamName(String),
    #[error("Need {missing} more team(s) before the tournament can start")]
    IncompleteRoster { missing: usize },
    #[error("{0}")]
    InvalidScore(#[from] ScoreError),
    #[error("Match result was already reported")]
    MatchAlreadyCompleted(MatchId),
    #[error("Both teams of this match are not known yet")]
    UnassignedMatch(MatchId),
    #[error("{0}")]
    Identity(#[from] IdentityError),
    /// Stored state could not be read. Save failures never surface here.
    #[error("Tournament data is unavailable right now")]
    Storage(String),
}

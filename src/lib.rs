//! Team cup organizer: single-elimination bracket engine with models, logic and a registry service.

pub mod config;
pub mod identity;
pub mod logic;
pub mod models;
pub mod registry;
pub mod storage;

pub use identity::{HttpIdentityVerifier, IdentityConfig, IdentityError, IdentityVerifier};
pub use logic::{
    assess_progress, check_score, compute_progress, generate_bracket, is_valid_score,
    report_match_result, start_registration, start_tournament, winner_side, Advancement, Progress,
    ReportedResult,
};
pub use models::{
    Account, Captain, GameMatch, GroupId, MatchId, MatchStatus, ScoreError, Side, Team, TeamId,
    Tournament, TournamentError, TournamentId, TournamentStatus,
};
pub use registry::{MatchReport, Outcome, Persistence, TournamentRegistry};
pub use storage::{JsonFileStore, MemoryStore, StateStore, StorageError};

//! Tournament business logic: scoring, bracket generation, match lifecycle, progression.

pub mod bracket;
mod lifecycle;
mod progression;
pub mod scoring;
mod setup;

pub use bracket::generate_bracket;
pub use lifecycle::{
    advance_winner, complete_match, report_match_result, Advancement, ReportedResult,
};
pub use progression::{assess_progress, compute_progress, Progress};
pub use scoring::{check_score, is_valid_score, winner_side};
pub use setup::{start_registration, start_tournament};

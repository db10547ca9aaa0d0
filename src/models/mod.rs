//! Data structures for the cup: teams, matches, tournament state, errors.

mod error;
mod game;
mod team;
mod tournament;

pub use error::{ScoreError, TournamentError};
pub use game::{GameMatch, MatchId, MatchStatus, Side};
pub use team::{Account, Captain, Team, TeamId};
pub use tournament::{GroupId, Tournament, TournamentId, TournamentStatus, ALLOWED_CAPACITIES};

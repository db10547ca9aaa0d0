//! Tournament and TournamentStatus.

use crate::models::error::TournamentError;
use crate::models::game::{GameMatch, MatchId};
use crate::models::team::{Captain, Team, TeamId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a tournament.
pub type TournamentId = Uuid;

/// Identifier of the owning group (chat server / community).
pub type GroupId = String;

/// Team counts a bracket can be created for.
pub const ALLOWED_CAPACITIES: [usize; 3] = [4, 8, 16];

/// Phase of the tournament. Moves forward only.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentStatus {
    /// Created; not yet accepting teams.
    #[default]
    Draft,
    /// Accepting teams until capacity is reached.
    Registration,
    /// Bracket generated, matches being played.
    Active,
    /// Final reported; champion known.
    Completed,
}

impl fmt::Display for TournamentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TournamentStatus::Draft => "draft",
            TournamentStatus::Registration => "registration",
            TournamentStatus::Active => "active",
            TournamentStatus::Completed => "completed",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for TournamentStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "draft" => Ok(TournamentStatus::Draft),
            "registration" => Ok(TournamentStatus::Registration),
            "active" => Ok(TournamentStatus::Active),
            "completed" => Ok(TournamentStatus::Completed),
            _ => Err(()),
        }
    }
}

/// Full tournament state: teams, bracket matches and phase.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Tournament {
    pub id: TournamentId,
    pub group_id: GroupId,
    pub name: String,
    /// Number of teams the bracket is built for (4, 8 or 16).
    pub capacity: usize,
    pub status: TournamentStatus,
    /// 1-based stage currently in play.
    pub current_stage: u32,
    /// log2(capacity), fixed at creation.
    pub total_stages: u32,
    /// Registration order.
    pub teams: Vec<Team>,
    /// Empty until the tournament goes active.
    pub matches: Vec<GameMatch>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Tournament {
    /// Create a new tournament in Draft with no teams.
    pub fn new(
        group_id: impl Into<GroupId>,
        name: impl Into<String>,
        capacity: usize,
    ) -> Result<Self, TournamentError> {
        if !ALLOWED_CAPACITIES.contains(&capacity) {
            return Err(TournamentError::InvalidCapacity(capacity));
        }
        let name = name.into();
        let name = name.trim();
        if name.is_empty() {
            return Err(TournamentError::InvalidName);
        }
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            group_id: group_id.into(),
            name: name.to_string(),
            capacity,
            status: TournamentStatus::Draft,
            current_stage: 1,
            total_stages: capacity.trailing_zeros(),
            teams: Vec::new(),
            matches: Vec::new(),
            created_at: now,
            updated_at: now,
            completed_at: None,
        })
    }

    /// Fail with InvalidState unless the tournament is in `expected`.
    pub fn require_status(&self, expected: TournamentStatus) -> Result<(), TournamentError> {
        if self.status != expected {
            return Err(TournamentError::InvalidState {
                expected,
                actual: self.status,
            });
        }
        Ok(())
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn team(&self, id: TeamId) -> Option<&Team> {
        self.teams.iter().find(|t| t.id == id)
    }

    /// Display name of a team, or "TBD" for an empty slot.
    pub fn team_name(&self, id: Option<TeamId>) -> &str {
        id.and_then(|id| self.team(id))
            .map(|t| t.name.as_str())
            .unwrap_or("TBD")
    }

    pub fn game_match(&self, id: MatchId) -> Option<&GameMatch> {
        self.matches.iter().find(|m| m.id == id)
    }

    pub fn game_match_mut(&mut self, id: MatchId) -> Option<&mut GameMatch> {
        self.matches.iter_mut().find(|m| m.id == id)
    }

    /// Matches of one stage, ordered by position.
    pub fn matches_in_stage(&self, stage: u32) -> Vec<&GameMatch> {
        let mut matches: Vec<_> = self.matches.iter().filter(|m| m.stage == stage).collect();
        matches.sort_by_key(|m| m.position);
        matches
    }

    /// Teams still needed to fill the bracket.
    pub fn open_slots(&self) -> usize {
        self.capacity.saturating_sub(self.teams.len())
    }

    /// Fail unless the tournament is in Registration with at least one open slot.
    pub fn ensure_accepting_teams(&self) -> Result<(), TournamentError> {
        self.require_status(TournamentStatus::Registration)?;
        if self.open_slots() == 0 {
            return Err(TournamentError::CapacityExceeded {
                capacity: self.capacity,
            });
        }
        Ok(())
    }

    /// Register a team (Registration only). Names are unique within the tournament, case-insensitive.
    pub fn add_team(
        &mut self,
        name: impl Into<String>,
        captain: Captain,
    ) -> Result<&Team, TournamentError> {
        self.ensure_accepting_teams()?;
        let name = name.into();
        let name = name.trim();
        if name.is_empty() {
            return Err(TournamentError::InvalidName);
        }
        let is_duplicate = self.teams.iter().any(|t| t.name.eq_ignore_ascii_case(name));
        if is_duplicate {
            return Err(TournamentError::DuplicateTeamName(name.to_string()));
        }
        self.teams.push(Team::new(name, captain));
        self.touch();
        Ok(&self.teams[self.teams.len() - 1])
    }
}

//! Bracket match (GameMatch), its status, and which side won.

use crate::models::team::TeamId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a match.
pub type MatchId = Uuid;

/// Which side of a match: home (upper slot) or away (lower slot).
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Home,
    Away,
}

/// Lifecycle of a single match.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    /// At least one side not yet known.
    #[default]
    Pending,
    /// Both sides known, not yet played.
    Ready,
    /// Result reporting started. Not produced by the current flow.
    InProgress,
    /// Terminal: scores and winner fixed.
    Completed,
}

/// A single match in the bracket.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct GameMatch {
    pub id: MatchId,
    /// 1 = first round, `total_stages` = final.
    pub stage: u32,
    /// 1-based position within the stage.
    pub position: u32,
    pub home: Option<TeamId>,
    pub away: Option<TeamId>,
    pub winner: Option<TeamId>,
    pub home_score: Option<u32>,
    pub away_score: Option<u32>,
    pub status: MatchStatus,
    /// Match that receives this match's winner. None for the final.
    pub next_match: Option<MatchId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl GameMatch {
    /// Empty pending match at (stage, position).
    pub fn new(stage: u32, position: u32) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            stage,
            position,
            home: None,
            away: None,
            winner: None,
            home_score: None,
            away_score: None,
            status: MatchStatus::Pending,
            next_match: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    /// Team on the given side, if assigned.
    pub fn team(&self, side: Side) -> Option<TeamId> {
        match side {
            Side::Home => self.home,
            Side::Away => self.away,
        }
    }

    /// Both slots filled.
    pub fn has_both_teams(&self) -> bool {
        self.home.is_some() && self.away.is_some()
    }

    pub fn is_completed(&self) -> bool {
        self.status == MatchStatus::Completed
    }

    /// The participant that did not win. None until completed.
    pub fn loser(&self) -> Option<TeamId> {
        let winner = self.winner?;
        if self.home == Some(winner) {
            self.away
        } else {
            self.home
        }
    }

    /// Put `team` into the first empty slot (home first). Returns the side filled,
    /// or None if both slots were already taken.
    pub fn fill_open_slot(&mut self, team: TeamId) -> Option<Side> {
        let side = if self.home.is_none() {
            self.home = Some(team);
            Side::Home
        } else if self.away.is_none() {
            self.away = Some(team);
            Side::Away
        } else {
            return None;
        };
        self.updated_at = Utc::now();
        Some(side)
    }
}

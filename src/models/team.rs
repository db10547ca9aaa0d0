//! Team, Captain and the verified player Account attached to a captain.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a registered team (used in matches and lookups).
pub type TeamId = Uuid;

/// Player account returned by the identity service.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Stable id assigned by the game publisher.
    pub id: String,
    pub name: String,
    pub tag: String,
    /// Region the account was found in.
    pub region: String,
}

impl Account {
    /// `name#tag` form, as players type it.
    pub fn riot_id(&self) -> String {
        format!("{}#{}", self.name, self.tag)
    }
}

/// Team captain: the chat user who registered the team.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Captain {
    /// Opaque external id (chat platform user id).
    pub id: String,
    pub display_name: String,
    #[serde(default)]
    pub account: Option<Account>,
}

impl Captain {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            account: None,
        }
    }

    pub fn with_account(mut self, account: Account) -> Self {
        self.account = Some(account);
        self
    }
}

/// A team registered in a tournament. Never mutated after registration.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    pub captain: Captain,
    pub registered_at: DateTime<Utc>,
}

impl Team {
    /// Create a new team with a fresh id, stamped now.
    pub fn new(name: impl Into<String>, captain: Captain) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            captain,
            registered_at: Utc::now(),
        }
    }
}

//! Tournament registry: owns every group's tournaments and sequences operations on them.
//!
//! Each group's collection sits behind its own async mutex, so the
//! load-mutate-persist cycle of one operation never interleaves with another
//! operation on the same group. After every successful mutation the whole group
//! collection is written to the store; a failed write is logged and reported in
//! the returned [`Outcome`] but never fails the operation.

use crate::logic::{
    assess_progress, compute_progress, report_match_result, start_registration, start_tournament,
    Progress, ReportedResult,
};
use crate::models::{
    Captain, GameMatch, GroupId, MatchId, Team, TeamId, Tournament, TournamentError,
    TournamentId, TournamentStatus,
};
use crate::storage::StateStore;
use serde::Serialize;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Whether the state after an operation reached durable storage.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum Persistence {
    Saved,
    Failed(String),
}

impl Persistence {
    pub fn is_saved(&self) -> bool {
        matches!(self, Persistence::Saved)
    }
}

/// Result of a successful mutation plus what happened when persisting it.
#[derive(Clone, Debug, Serialize)]
pub struct Outcome<T> {
    pub value: T,
    pub persistence: Persistence,
}

/// Everything that changed after a reported result.
#[derive(Clone, Debug, Serialize)]
pub struct MatchReport {
    pub result: ReportedResult,
    pub game_match: GameMatch,
    /// Successor match after the winner was seated in it.
    pub next_match: Option<GameMatch>,
    pub progress: Progress,
}

type GroupSlot = Arc<Mutex<Vec<Tournament>>>;

pub struct TournamentRegistry {
    store: Arc<dyn StateStore>,
    groups: RwLock<HashMap<GroupId, GroupSlot>>,
    owners: RwLock<HashMap<TournamentId, GroupId>>,
}

impl TournamentRegistry {
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self {
            store,
            groups: RwLock::new(HashMap::new()),
            owners: RwLock::new(HashMap::new()),
        }
    }

    /// Load every stored group. Returns the number of tournaments loaded.
    pub async fn initialize(&self) -> Result<usize, TournamentError> {
        let groups = self.store.groups().await.map_err(storage_error)?;
        let mut loaded = 0;
        for group in groups {
            let slot = self.group_slot(&group).await?;
            loaded += slot.lock().await.len();
        }
        log::info!("Loaded {} tournament(s) from storage", loaded);
        Ok(loaded)
    }

    /// Persist every loaded group one last time.
    pub async fn shutdown(&self) -> Vec<(GroupId, Persistence)> {
        let slots: Vec<(GroupId, GroupSlot)> = self
            .groups
            .read()
            .await
            .iter()
            .map(|(g, s)| (g.clone(), s.clone()))
            .collect();
        let mut outcomes = Vec::with_capacity(slots.len());
        for (group, slot) in slots {
            let tournaments = slot.lock().await;
            let persistence = self.persist(&group, &tournaments).await;
            outcomes.push((group, persistence));
        }
        log::info!("Registry shut down, {} group(s) flushed", outcomes.len());
        outcomes
    }

    /// The group's collection, loading it from storage on first access.
    ///
    /// The load runs without holding the group table lock; when two callers race
    /// on the same group, the first slot inserted wins and the other load is dropped.
    async fn group_slot(&self, group: &str) -> Result<GroupSlot, TournamentError> {
        if let Some(slot) = self.groups.read().await.get(group) {
            return Ok(slot.clone());
        }
        let tournaments = self.store.load(group).await.map_err(storage_error)?;
        if let Some(stray) = tournaments.iter().find(|t| t.group_id != group) {
            log::warn!(
                "Stored collection of group {} holds tournament {} of group {}",
                group,
                stray.id,
                stray.group_id
            );
            return Err(TournamentError::Storage(format!(
                "collection of group {group} holds tournament {} of group {}",
                stray.id, stray.group_id
            )));
        }

        let mut groups = self.groups.write().await;
        match groups.entry(group.to_string()) {
            Entry::Occupied(entry) => Ok(entry.get().clone()),
            Entry::Vacant(entry) => {
                let mut owners = self.owners.write().await;
                for t in &tournaments {
                    owners.insert(t.id, t.group_id.clone());
                }
                log::debug!("Group {} loaded with {} tournament(s)", group, tournaments.len());
                Ok(entry.insert(Arc::new(Mutex::new(tournaments))).clone())
            }
        }
    }

    async fn slot_for(&self, id: TournamentId) -> Result<(GroupId, GroupSlot), TournamentError> {
        let group = self
            .owners
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(TournamentError::TournamentNotFound(id))?;
        let slot = self.group_slot(&group).await?;
        Ok((group, slot))
    }

    async fn persist(&self, group: &str, tournaments: &[Tournament]) -> Persistence {
        match self.store.save(group, tournaments).await {
            Ok(()) => Persistence::Saved,
            Err(e) => {
                log::warn!("Failed to persist tournaments of group {}: {}", group, e);
                Persistence::Failed(e.to_string())
            }
        }
    }

    /// Run `f` on one tournament under its group lock, then persist the group.
    /// Nothing is persisted when `f` fails.
    async fn mutate<T>(
        &self,
        id: TournamentId,
        f: impl FnOnce(&mut Tournament) -> Result<T, TournamentError>,
    ) -> Result<Outcome<T>, TournamentError> {
        let (group, slot) = self.slot_for(id).await?;
        let mut tournaments = slot.lock().await;
        let tournament = tournaments
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(TournamentError::TournamentNotFound(id))?;
        let value = f(tournament)?;
        let persistence = self.persist(&group, &tournaments).await;
        Ok(Outcome { value, persistence })
    }

    async fn read<T>(
        &self,
        id: TournamentId,
        f: impl FnOnce(&Tournament) -> T,
    ) -> Result<T, TournamentError> {
        let (_, slot) = self.slot_for(id).await?;
        let tournaments = slot.lock().await;
        tournaments
            .iter()
            .find(|t| t.id == id)
            .map(f)
            .ok_or(TournamentError::TournamentNotFound(id))
    }

    /// Create a tournament in Draft. Names are unique per group, case-insensitive.
    pub async fn create_tournament(
        &self,
        group: &str,
        name: &str,
        capacity: usize,
    ) -> Result<Outcome<Tournament>, TournamentError> {
        let slot = self.group_slot(group).await?;
        let mut tournaments = slot.lock().await;
        let tournament = Tournament::new(group, name, capacity)?;
        if tournaments
            .iter()
            .any(|t| t.name.eq_ignore_ascii_case(&tournament.name))
        {
            return Err(TournamentError::DuplicateTournamentName(tournament.name));
        }
        log::info!(
            "Created tournament {} ({}) for {} teams in group {}",
            tournament.name,
            tournament.id,
            capacity,
            group
        );
        self.owners
            .write()
            .await
            .insert(tournament.id, group.to_string());
        tournaments.push(tournament.clone());
        let persistence = self.persist(group, &tournaments).await;
        Ok(Outcome {
            value: tournament,
            persistence,
        })
    }

    pub async fn start_registration(
        &self,
        id: TournamentId,
    ) -> Result<Outcome<Tournament>, TournamentError> {
        self.mutate(id, |t| {
            start_registration(t)?;
            log::info!("Registration opened for {}", t.name);
            Ok(t.clone())
        })
        .await
    }

    /// Register a team. The captain's identity must already be verified by the caller.
    pub async fn register_team(
        &self,
        id: TournamentId,
        name: &str,
        captain: Captain,
    ) -> Result<Outcome<Team>, TournamentError> {
        self.mutate(id, |t| {
            let team = t.add_team(name, captain)?.clone();
            log::info!(
                "Team {} registered in {} ({}/{})",
                team.name,
                t.name,
                t.teams.len(),
                t.capacity
            );
            Ok(team)
        })
        .await
    }

    /// Cheap check that the tournament exists and can still take a team.
    pub async fn ensure_accepting_teams(&self, id: TournamentId) -> Result<(), TournamentError> {
        self.read(id, Tournament::ensure_accepting_teams).await?
    }

    /// Generate the bracket and go Active. Requires a full roster.
    pub async fn start_tournament(
        &self,
        id: TournamentId,
    ) -> Result<Outcome<Tournament>, TournamentError> {
        self.mutate(id, |t| {
            start_tournament(t, &mut rand::thread_rng())?;
            log::info!(
                "Tournament {} started: {} matches over {} stage(s)",
                t.name,
                t.matches.len(),
                t.total_stages
            );
            Ok(t.clone())
        })
        .await
    }

    /// Report a final score, advance the winner and re-derive stage/completion.
    pub async fn report_match_result(
        &self,
        id: TournamentId,
        match_id: MatchId,
        home_score: u32,
        away_score: u32,
    ) -> Result<Outcome<MatchReport>, TournamentError> {
        self.mutate(id, |t| {
            let result = report_match_result(t, match_id, home_score, away_score)?;
            let progress = assess_progress(t);
            let game_match = t
                .game_match(match_id)
                .cloned()
                .ok_or(TournamentError::MatchNotFound(match_id))?;
            let next_match = result
                .advanced
                .and_then(|a| t.game_match(a.match_id).cloned());
            log::info!(
                "{}: stage {} match {} won by {} ({}-{})",
                t.name,
                game_match.stage,
                game_match.position,
                t.team_name(Some(result.winner)),
                home_score,
                away_score
            );
            Ok(MatchReport {
                result,
                game_match,
                next_match,
                progress,
            })
        })
        .await
    }

    /// Hard delete, allowed in any status.
    pub async fn delete_tournament(
        &self,
        id: TournamentId,
    ) -> Result<Outcome<Tournament>, TournamentError> {
        let (group, slot) = self.slot_for(id).await?;
        let mut tournaments = slot.lock().await;
        let index = tournaments
            .iter()
            .position(|t| t.id == id)
            .ok_or(TournamentError::TournamentNotFound(id))?;
        let removed = tournaments.remove(index);
        self.owners.write().await.remove(&id);
        log::info!("Deleted tournament {} ({})", removed.name, id);
        let persistence = self.persist(&group, &tournaments).await;
        Ok(Outcome {
            value: removed,
            persistence,
        })
    }

    pub async fn get(&self, id: TournamentId) -> Result<Tournament, TournamentError> {
        self.read(id, Tournament::clone).await
    }

    /// All tournaments of a group, in creation order.
    pub async fn list_by_group(&self, group: &str) -> Result<Vec<Tournament>, TournamentError> {
        let slot = self.group_slot(group).await?;
        let tournaments = slot.lock().await;
        Ok(tournaments.clone())
    }

    pub async fn list_by_status(
        &self,
        group: &str,
        status: TournamentStatus,
    ) -> Result<Vec<Tournament>, TournamentError> {
        let mut tournaments = self.list_by_group(group).await?;
        tournaments.retain(|t| t.status == status);
        Ok(tournaments)
    }

    pub async fn get_team(
        &self,
        id: TournamentId,
        team_id: TeamId,
    ) -> Result<Team, TournamentError> {
        self.read(id, |t| t.team(team_id).cloned())
            .await?
            .ok_or(TournamentError::TeamNotFound(team_id))
    }

    /// Progress snapshot without modifying the tournament.
    pub async fn assess(&self, id: TournamentId) -> Result<Progress, TournamentError> {
        self.read(id, compute_progress).await
    }

    /// Matches of the stage currently in play, by position.
    pub async fn current_stage_matches(
        &self,
        id: TournamentId,
    ) -> Result<Vec<GameMatch>, TournamentError> {
        self.read(id, |t| {
            let stage = compute_progress(t).current_stage;
            t.matches_in_stage(stage).into_iter().cloned().collect()
        })
        .await
    }
}

fn storage_error(e: crate::storage::StorageError) -> TournamentError {
    log::warn!("Storage load failed: {}", e);
    TournamentError::Storage(e.to_string())
}

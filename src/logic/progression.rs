//! Stage progression: re-derive current stage, completion, champion and runner-up from match states.

use crate::models::{TeamId, Tournament, TournamentStatus};
use chrono::Utc;
use serde::Serialize;
use std::collections::BTreeSet;

/// Snapshot of where a tournament stands.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct Progress {
    pub is_completed: bool,
    pub current_stage: u32,
    pub total_stages: u32,
    pub champion: Option<TeamId>,
    pub runner_up: Option<TeamId>,
}

/// Walk stages in ascending order and stop at the first one with an unfinished match.
///
/// Writes `current_stage` back to the tournament and, once the final is done, moves it to
/// Completed. Recomputed from scratch on every call, so repeated calls are harmless.
pub fn assess_progress(tournament: &mut Tournament) -> Progress {
    let progress = compute_progress(tournament);

    tournament.current_stage = progress.current_stage;
    if progress.is_completed && tournament.status != TournamentStatus::Completed {
        let now = Utc::now();
        tournament.status = TournamentStatus::Completed;
        tournament.completed_at = Some(now);
        tournament.updated_at = now;
        log::info!(
            "Tournament {} ({}) completed, champion: {}",
            tournament.name,
            tournament.id,
            tournament.team_name(progress.champion)
        );
    }
    progress
}

/// Same as `assess_progress` without writing anything back.
pub fn compute_progress(tournament: &Tournament) -> Progress {
    let total_stages = tournament.total_stages;
    let stages: BTreeSet<u32> = tournament.matches.iter().map(|m| m.stage).collect();

    let mut progress = Progress {
        is_completed: false,
        current_stage: tournament.current_stage.clamp(1, total_stages.max(1)),
        total_stages,
        champion: None,
        runner_up: None,
    };

    for stage in stages {
        let mut in_stage = tournament.matches.iter().filter(|m| m.stage == stage);
        if !in_stage.all(|m| m.is_completed()) {
            progress.current_stage = stage.min(total_stages);
            return progress;
        }
        progress.current_stage = stage.min(total_stages);
        if stage == total_stages {
            if let Some(last) = tournament.matches.iter().find(|m| m.stage == stage) {
                progress.is_completed = true;
                progress.champion = last.winner;
                progress.runner_up = last.loser();
            }
            return progress;
        }
    }
    progress
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::bracket::generate_bracket;
    use crate::logic::lifecycle::report_match_result;
    use crate::models::Captain;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn active_tournament(capacity: usize) -> Tournament {
        let mut t = Tournament::new("g", "Cup", capacity).unwrap();
        t.status = TournamentStatus::Registration;
        for i in 0..capacity {
            t.add_team(format!("T{i}"), Captain::new(i.to_string(), "c"))
                .unwrap();
        }
        let mut rng = StdRng::seed_from_u64(3);
        t.matches = generate_bracket(&t.teams, &mut rng).unwrap();
        t.status = TournamentStatus::Active;
        t
    }

    fn play_stage(t: &mut Tournament, stage: u32) {
        let ids: Vec<_> = t.matches_in_stage(stage).iter().map(|m| m.id).collect();
        for id in ids {
            report_match_result(t, id, 13, 4).unwrap();
        }
    }

    #[test]
    fn fresh_bracket_is_in_stage_one() {
        let mut t = active_tournament(8);
        let p = assess_progress(&mut t);
        assert!(!p.is_completed);
        assert_eq!(p.current_stage, 1);
        assert_eq!(p.total_stages, 3);
    }

    #[test]
    fn finished_stage_moves_to_next() {
        let mut t = active_tournament(8);
        play_stage(&mut t, 1);
        let p = assess_progress(&mut t);
        assert_eq!(p.current_stage, 2);
        assert_eq!(t.current_stage, 2);
        assert_eq!(t.status, TournamentStatus::Active);
    }

    #[test]
    fn final_completes_tournament_and_is_stable() {
        let mut t = active_tournament(4);
        play_stage(&mut t, 1);
        play_stage(&mut t, 2);
        let final_match = t.matches_in_stage(2)[0].clone();

        let p = assess_progress(&mut t);
        assert!(p.is_completed);
        assert_eq!(p.current_stage, 2);
        assert_eq!(p.champion, final_match.home);
        assert_eq!(p.runner_up, final_match.away);
        assert_eq!(t.status, TournamentStatus::Completed);
        let completed_at = t.completed_at;
        assert!(completed_at.is_some());

        assert_eq!(assess_progress(&mut t), p);
        assert_eq!(t.completed_at, completed_at);
    }

    #[test]
    fn match_order_does_not_matter() {
        let mut t = active_tournament(8);
        play_stage(&mut t, 1);
        t.matches.reverse();
        assert_eq!(compute_progress(&t).current_stage, 2);
    }
}

//! Match lifecycle: reporting a result and advancing the winner to the next match.

use crate::logic::scoring::check_score;
use crate::models::{
    GameMatch, MatchId, MatchStatus, Side, TeamId, Tournament, TournamentError, TournamentStatus,
};
use chrono::Utc;
use serde::Serialize;

/// Where a winner went after a result was reported.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct Advancement {
    pub match_id: MatchId,
    pub side: Side,
    /// The target match flipped to Ready with this fill.
    pub now_ready: bool,
}

/// Outcome of a successful report.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct ReportedResult {
    pub match_id: MatchId,
    pub winner: TeamId,
    pub advanced: Option<Advancement>,
}

/// Record a final score on one match and mark it Completed. Returns the winner.
///
/// Fails without touching the match if it is already completed, a slot is empty,
/// or the score is not final.
pub fn complete_match(
    game_match: &mut GameMatch,
    home_score: u32,
    away_score: u32,
) -> Result<TeamId, TournamentError> {
    if game_match.is_completed() {
        return Err(TournamentError::MatchAlreadyCompleted(game_match.id));
    }
    let (Some(home), Some(away)) = (game_match.home, game_match.away) else {
        return Err(TournamentError::UnassignedMatch(game_match.id));
    };
    let winner = match check_score(home_score, away_score)? {
        Side::Home => home,
        Side::Away => away,
    };

    let now = Utc::now();
    game_match.home_score = Some(home_score);
    game_match.away_score = Some(away_score);
    game_match.winner = Some(winner);
    game_match.status = MatchStatus::Completed;
    game_match.completed_at = Some(now);
    game_match.updated_at = now;
    Ok(winner)
}

/// Seat `winner` in the first open slot of `target`, flipping it to Ready once both sides are known.
pub fn advance_winner(target: &mut GameMatch, winner: TeamId) -> Option<Advancement> {
    let side = target.fill_open_slot(winner)?;
    let now_ready = target.has_both_teams() && target.status == MatchStatus::Pending;
    if now_ready {
        target.status = MatchStatus::Ready;
    }
    Some(Advancement {
        match_id: target.id,
        side,
        now_ready,
    })
}

/// Report a match result in an active tournament and propagate the winner forward.
///
/// Only the reported match and its linked successor change; stage and completion
/// are re-derived separately by `assess_progress`. A link to a missing match is
/// rejected before anything is modified.
pub fn report_match_result(
    tournament: &mut Tournament,
    match_id: MatchId,
    home_score: u32,
    away_score: u32,
) -> Result<ReportedResult, TournamentError> {
    tournament.require_status(TournamentStatus::Active)?;
    let next = tournament
        .game_match(match_id)
        .ok_or(TournamentError::MatchNotFound(match_id))?
        .next_match;
    if let Some(next_id) = next {
        if tournament.game_match(next_id).is_none() {
            log::warn!("Match {} links to missing match {}", match_id, next_id);
            return Err(TournamentError::MatchNotFound(next_id));
        }
    }

    let game_match = tournament
        .game_match_mut(match_id)
        .ok_or(TournamentError::MatchNotFound(match_id))?;
    let winner = complete_match(game_match, home_score, away_score)?;

    let advanced = match next.and_then(|next_id| tournament.game_match_mut(next_id)) {
        Some(target) => {
            let next_id = target.id;
            let advanced = advance_winner(target, winner);
            if advanced.is_none() {
                log::warn!(
                    "Match {} already had both teams; winner of {} not advanced",
                    next_id,
                    match_id
                );
            }
            advanced
        }
        None => None,
    };

    tournament.touch();
    Ok(ReportedResult {
        match_id,
        winner,
        advanced,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ScoreError;
    use uuid::Uuid;

    fn ready_match() -> GameMatch {
        let mut m = GameMatch::new(1, 1);
        m.home = Some(Uuid::new_v4());
        m.away = Some(Uuid::new_v4());
        m.status = MatchStatus::Ready;
        m
    }

    #[test]
    fn complete_sets_scores_and_winner() {
        let mut m = ready_match();
        let winner = complete_match(&mut m, 9, 13).unwrap();
        assert_eq!(Some(winner), m.away);
        assert_eq!(m.status, MatchStatus::Completed);
        assert_eq!((m.home_score, m.away_score), (Some(9), Some(13)));
        assert!(m.completed_at.is_some());
        assert_eq!(m.loser(), m.home);
    }

    #[test]
    fn second_report_fails_and_leaves_match_unchanged() {
        let mut m = ready_match();
        complete_match(&mut m, 13, 5).unwrap();
        let before = m.clone();
        assert!(matches!(
            complete_match(&mut m, 5, 13),
            Err(TournamentError::MatchAlreadyCompleted(_))
        ));
        assert_eq!(m, before);
    }

    #[test]
    fn unassigned_match_is_rejected() {
        let mut m = GameMatch::new(2, 1);
        m.home = Some(Uuid::new_v4());
        assert!(matches!(
            complete_match(&mut m, 13, 5),
            Err(TournamentError::UnassignedMatch(_))
        ));
    }

    #[test]
    fn invalid_score_carries_diagnosis() {
        let mut m = ready_match();
        assert!(matches!(
            complete_match(&mut m, 13, 12),
            Err(TournamentError::InvalidScore(ScoreError::NeedsExtension))
        ));
        assert_eq!(m.status, MatchStatus::Ready);
        assert!(m.winner.is_none());
    }

    #[test]
    fn advance_fills_home_then_away() {
        let mut target = GameMatch::new(2, 1);
        let first = advance_winner(&mut target, Uuid::new_v4()).unwrap();
        assert_eq!(first.side, Side::Home);
        assert!(!first.now_ready);
        assert_eq!(target.status, MatchStatus::Pending);

        let second = advance_winner(&mut target, Uuid::new_v4()).unwrap();
        assert_eq!(second.side, Side::Away);
        assert!(second.now_ready);
        assert_eq!(target.status, MatchStatus::Ready);

        assert!(advance_winner(&mut target, Uuid::new_v4()).is_none());
    }
}

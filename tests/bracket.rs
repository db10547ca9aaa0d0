//! Integration tests for bracket generation and winner propagation.

use bracket_cup::{
    generate_bracket, report_match_result, start_registration, start_tournament, Captain,
    GameMatch, MatchStatus, Side, Team, Tournament, TournamentError,
};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::{HashMap, HashSet};

fn teams(n: usize) -> Vec<Team> {
    (0..n)
        .map(|i| Team::new(format!("Team {i}"), Captain::new(format!("u{i}"), format!("Cap {i}"))))
        .collect()
}

fn active_tournament(capacity: usize, seed: u64) -> Tournament {
    let mut t = Tournament::new("guild", "Cup", capacity).unwrap();
    start_registration(&mut t).unwrap();
    for i in 0..capacity {
        t.add_team(format!("Team {i}"), Captain::new(format!("u{i}"), "cap"))
            .unwrap();
    }
    start_tournament(&mut t, &mut StdRng::seed_from_u64(seed)).unwrap();
    t
}

fn find(t: &Tournament, stage: u32, position: u32) -> GameMatch {
    t.matches
        .iter()
        .find(|m| m.stage == stage && m.position == position)
        .cloned()
        .unwrap()
}

proptest! {
    #[test]
    fn bracket_shape(exp in 2u32..=4, seed in any::<u64>()) {
        let n = 1usize << exp;
        let matches = generate_bracket(&teams(n), &mut StdRng::seed_from_u64(seed)).unwrap();
        prop_assert_eq!(matches.len(), n - 1);

        let keys: HashSet<_> = matches.iter().map(|m| (m.stage, m.position)).collect();
        prop_assert_eq!(keys.len(), n - 1);
        prop_assert!(matches.iter().all(|m| (1..=exp).contains(&m.stage)));

        let ids: HashSet<_> = matches.iter().map(|m| m.id).collect();
        let finals: Vec<_> = matches.iter().filter(|m| m.next_match.is_none()).collect();
        prop_assert_eq!(finals.len(), 1);
        prop_assert_eq!(finals[0].stage, exp);
        for m in matches.iter().filter(|m| m.stage < exp) {
            prop_assert!(ids.contains(&m.next_match.unwrap()));
        }

        for m in &matches {
            if m.stage == 1 {
                prop_assert_eq!(m.status, MatchStatus::Ready);
                prop_assert!(m.home.is_some() && m.away.is_some());
            } else {
                prop_assert_eq!(m.status, MatchStatus::Pending);
                prop_assert!(m.home.is_none() && m.away.is_none());
            }
        }
    }
}

#[test]
fn sibling_results_fill_both_slots() {
    let mut t = active_tournament(8, 11);
    let first = find(&t, 1, 1);
    let second = find(&t, 1, 2);
    let target = first.next_match.unwrap();
    assert_eq!(second.next_match, Some(target));

    let r = report_match_result(&mut t, first.id, 13, 7).unwrap();
    assert_eq!(Some(r.winner), first.home);
    let advanced = r.advanced.unwrap();
    assert_eq!(advanced.match_id, target);
    assert_eq!(advanced.side, Side::Home);
    let next = t.game_match(target).unwrap();
    assert_eq!(next.home, first.home);
    assert!(next.away.is_none());
    assert_eq!(next.status, MatchStatus::Pending);

    report_match_result(&mut t, second.id, 12, 14).unwrap();
    let next = t.game_match(target).unwrap();
    assert_eq!(next.home, first.home);
    assert_eq!(next.away, second.away);
    assert_eq!(next.status, MatchStatus::Ready);
}

#[test]
fn later_stage_cannot_be_reported_early() {
    let mut t = active_tournament(4, 5);
    let final_match = find(&t, 2, 1);
    assert!(matches!(
        report_match_result(&mut t, final_match.id, 13, 2),
        Err(TournamentError::UnassignedMatch(_))
    ));
}

#[test]
fn double_report_is_rejected_without_changes() {
    let mut t = active_tournament(4, 9);
    let m = find(&t, 1, 1);
    report_match_result(&mut t, m.id, 13, 11).unwrap();
    let before: HashMap<_, _> = t.matches.iter().map(|m| (m.id, m.clone())).collect();

    assert!(matches!(
        report_match_result(&mut t, m.id, 11, 13),
        Err(TournamentError::MatchAlreadyCompleted(_))
    ));
    for m in &t.matches {
        assert_eq!(&before[&m.id], m);
    }
}

#[test]
fn dangling_link_leaves_match_untouched() {
    let mut t = active_tournament(4, 3);
    let m = find(&t, 1, 1);
    let missing = uuid::Uuid::new_v4();
    t.game_match_mut(m.id).unwrap().next_match = Some(missing);
    let before = t.game_match(m.id).cloned().unwrap();

    let err = report_match_result(&mut t, m.id, 13, 5).unwrap_err();
    assert!(matches!(err, TournamentError::MatchNotFound(id) if id == missing));
    assert_eq!(t.game_match(m.id).unwrap(), &before);
    assert_eq!(before.status, MatchStatus::Ready);
}

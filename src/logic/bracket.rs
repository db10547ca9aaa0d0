//! Bracket generation: random seeding and the full single-elimination match tree.

use crate::models::{GameMatch, MatchId, MatchStatus, Team, TeamId, TournamentError};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashMap;

/// Number of matches in `stage` of a bracket with `total_stages` stages; 0 past the final.
fn stage_size(total_stages: u32, stage: u32) -> u32 {
    match total_stages.checked_sub(stage) {
        Some(depth) if stage >= 1 => 1u32.checked_shl(depth).unwrap_or(0),
        _ => 0,
    }
}

/// Build every match of the bracket for `teams` (length must be a power of two, at least 2).
///
/// 1. Shuffle the teams; the shuffled order is the seeding.
/// 2. Allocate one match per (stage, position), stage 1 holding `n / 2` matches.
/// 3. Seat shuffled pairs into stage 1 and mark those matches Ready.
/// 4. Link each match to (stage + 1, ceil(position / 2)); the final has no link.
pub fn generate_bracket<R: Rng + ?Sized>(
    teams: &[Team],
    rng: &mut R,
) -> Result<Vec<GameMatch>, TournamentError> {
    let n = teams.len();
    if n < 2 || !n.is_power_of_two() {
        return Err(TournamentError::InvalidCapacity(n));
    }
    let mut seeded: Vec<TeamId> = teams.iter().map(|t| t.id).collect();
    seeded.shuffle(rng);

    let total_stages = n.trailing_zeros();

    let mut matches = Vec::with_capacity(n - 1);
    let mut ids: HashMap<(u32, u32), MatchId> = HashMap::with_capacity(n - 1);
    for stage in 1..=total_stages {
        for position in 1..=stage_size(total_stages, stage) {
            let m = GameMatch::new(stage, position);
            ids.insert((stage, position), m.id);
            matches.push(m);
        }
    }

    for m in &mut matches {
        if m.stage == 1 {
            let i = 2 * (m.position as usize - 1);
            m.home = Some(seeded[i]);
            m.away = Some(seeded[i + 1]);
            m.status = MatchStatus::Ready;
        }
        if m.stage < total_stages {
            m.next_match = ids.get(&(m.stage + 1, m.position.div_ceil(2))).copied();
        }
    }

    Ok(matches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Captain;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn teams(n: usize) -> Vec<Team> {
        (0..n)
            .map(|i| Team::new(format!("T{i}"), Captain::new(i.to_string(), format!("C{i}"))))
            .collect()
    }

    #[test]
    fn rejects_non_power_of_two() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(matches!(
            generate_bracket(&teams(6), &mut rng),
            Err(TournamentError::InvalidCapacity(6))
        ));
    }

    #[test]
    fn stage_sizes_halve_and_stop_after_the_final() {
        let sizes: Vec<u32> = (0..=5).map(|stage| stage_size(4, stage)).collect();
        assert_eq!(sizes, [0, 8, 4, 2, 1, 0]);
        assert_eq!(stage_size(2, 7), 0);
    }

    #[test]
    fn eight_team_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        let matches = generate_bracket(&teams(8), &mut rng).unwrap();
        assert_eq!(matches.len(), 7);
        let per_stage: Vec<usize> = (1..=3)
            .map(|s| matches.iter().filter(|m| m.stage == s).count())
            .collect();
        assert_eq!(per_stage, [4, 2, 1]);

        let by_id: HashMap<_, _> = matches.iter().map(|m| (m.id, m)).collect();
        for m in &matches {
            match m.next_match {
                Some(next) => {
                    let target = by_id[&next];
                    assert_eq!(target.stage, m.stage + 1);
                    assert_eq!(target.position, m.position.div_ceil(2));
                }
                None => assert_eq!(m.stage, 3),
            }
        }
    }

    #[test]
    fn first_stage_seats_every_team_once() {
        let teams = teams(16);
        let mut rng = StdRng::seed_from_u64(42);
        let matches = generate_bracket(&teams, &mut rng).unwrap();
        let mut seated = HashSet::new();
        for m in matches.iter().filter(|m| m.stage == 1) {
            assert_eq!(m.status, MatchStatus::Ready);
            assert!(seated.insert(m.home.unwrap()));
            assert!(seated.insert(m.away.unwrap()));
        }
        assert_eq!(seated.len(), 16);
        for m in matches.iter().filter(|m| m.stage > 1) {
            assert_eq!(m.status, MatchStatus::Pending);
            assert!(m.home.is_none() && m.away.is_none());
        }
    }
}

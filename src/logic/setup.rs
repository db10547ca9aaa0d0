//! Setup phase: open registration and start the tournament (Registration -> Active).

use crate::logic::bracket::generate_bracket;
use crate::models::{Tournament, TournamentError, TournamentStatus};
use rand::Rng;

/// Open team registration (Draft -> Registration).
pub fn start_registration(tournament: &mut Tournament) -> Result<(), TournamentError> {
    tournament.require_status(TournamentStatus::Draft)?;
    tournament.status = TournamentStatus::Registration;
    tournament.touch();
    Ok(())
}

/// Start the tournament: require a full roster, generate the bracket once, go Active.
pub fn start_tournament<R: Rng + ?Sized>(
    tournament: &mut Tournament,
    rng: &mut R,
) -> Result<(), TournamentError> {
    tournament.require_status(TournamentStatus::Registration)?;
    let missing = tournament.open_slots();
    if missing > 0 {
        return Err(TournamentError::IncompleteRoster { missing });
    }
    tournament.matches = generate_bracket(&tournament.teams, rng)?;
    tournament.status = TournamentStatus::Active;
    tournament.current_stage = 1;
    tournament.touch();
    Ok(())
}

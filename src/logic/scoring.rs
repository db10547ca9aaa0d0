//! Final score validation: first to 13 rounds, overtime from 12-12 won by 2.

use crate::models::{ScoreError, Side};

/// Rounds needed to win in regulation.
pub const REGULATION_ROUNDS: u32 = 13;
/// Both sides at this count means the game went to overtime.
pub const EXTENSION_THRESHOLD: u32 = 12;
/// Lead required to close out overtime.
pub const EXTENSION_GAP: u32 = 2;

/// Check a (home, away) final score, diagnosing why it is not valid.
///
/// 1. Equal scores are never final (12-12 and above is an unfinished overtime).
/// 2. 13 to at most 11 is a regulation win.
/// 3. Both sides at 12+ with a 2-round lead is an overtime win.
pub fn check_score(home: u32, away: u32) -> Result<Side, ScoreError> {
    if home == away {
        return Err(if home >= EXTENSION_THRESHOLD {
            ScoreError::NeedsExtension
        } else {
            ScoreError::Draw
        });
    }
    let (high, low) = (home.max(away), home.min(away));
    let side = if home > away { Side::Home } else { Side::Away };

    if high < REGULATION_ROUNDS {
        return Err(ScoreError::BelowThreshold);
    }
    if high == REGULATION_ROUNDS && low < EXTENSION_THRESHOLD {
        return Ok(side);
    }
    if low >= EXTENSION_THRESHOLD {
        if high == REGULATION_ROUNDS {
            // 13-12: overtime started but is not finished.
            return Err(ScoreError::NeedsExtension);
        }
        if high - low >= EXTENSION_GAP {
            return Ok(side);
        }
        return Err(ScoreError::ExtensionGapTooSmall);
    }
    Err(ScoreError::Invalid)
}

/// True if `(home, away)` is a final score.
pub fn is_valid_score(home: u32, away: u32) -> bool {
    check_score(home, away).is_ok()
}

/// Winning side, or None when the score is not valid.
pub fn winner_side(home: u32, away: u32) -> Option<Side> {
    check_score(home, away).ok()
}

// Snake-order turn calculation. Pure functions over the persisted session.

use crate::dto::draft_dto::{DraftPosition, DraftSession, DraftStatus, Turn};
use crate::error::DraftError;

/// Team on the clock for a given slot. Odd rounds run the order forward,
/// even rounds run it backward.
pub fn team_for_pick(order: &[i64], round: i64, pick_in_round: i64) -> Option<i64> {
    let idx = usize::try_from(pick_in_round - 1).ok()?;
    if idx >= order.len() || round < 1 {
        return None;
    }
    if round % 2 == 1 {
        Some(order[idx])
    } else {
        Some(order[order.len() - 1 - idx])
    }
}

/// Position of an absolute pick number.
pub fn position_for(pick_number: i64, team_count: i64) -> DraftPosition {
    let zero_based = pick_number - 1;
    DraftPosition {
        round: zero_based / team_count + 1,
        pick_in_round: zero_based % team_count + 1,
        pick_number,
    }
}

/// One pick further along.
pub fn step(position: DraftPosition, team_count: i64) -> DraftPosition {
    if position.pick_in_round >= team_count {
        DraftPosition {
            round: position.round + 1,
            pick_in_round: 1,
            pick_number: position.pick_number + 1,
        }
    } else {
        DraftPosition {
            round: position.round,
            pick_in_round: position.pick_in_round + 1,
            pick_number: position.pick_number + 1,
        }
    }
}

fn turn_at(order: &[i64], position: DraftPosition) -> Option<Turn> {
    team_for_pick(order, position.round, position.pick_in_round).map(|team_id| Turn {
        team_id,
        round: position.round,
        pick_in_round: position.pick_in_round,
        pick_number: position.pick_number,
    })
}

pub fn current_turn(session: &DraftSession) -> Result<Turn, DraftError> {
    if session.status != DraftStatus::InProgress {
        return Err(DraftError::DraftNotInProgress);
    }
    if session.position.pick_number > session.total_picks() {
        return Err(DraftError::DraftAlreadyComplete);
    }
    turn_at(&session.team_order, session.position).ok_or(DraftError::DraftNotInProgress)
}

/// The turn after the current one, or `None` once the board runs out.
pub fn next_turn(session: &DraftSession) -> Option<Turn> {
    if session.status != DraftStatus::InProgress || session.team_order.is_empty() {
        return None;
    }
    let next = step(session.position, session.team_count());
    if next.pick_number > session.total_picks() {
        return None;
    }
    turn_at(&session.team_order, next)
}

/// Every turn of a draft in order.
pub fn draft_order(order: &[i64], rounds: i64) -> Vec<Turn> {
    let team_count = order.len() as i64;
    (1..=team_count * rounds)
        .filter_map(|n| turn_at(order, position_for(n, team_count)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::roster_rules::RosterLayout;

    const A: i64 = 1;
    const B: i64 = 2;
    const C: i64 = 3;
    const D: i64 = 4;

    fn session(order: Vec<i64>, pick_number: i64) -> DraftSession {
        let team_count = order.len() as i64;
        DraftSession {
            league_id: 1,
            team_order: order,
            roster_layout: RosterLayout::default(),
            status: DraftStatus::InProgress,
            position: position_for(pick_number, team_count),
        }
    }

    fn teams(turns: &[Turn]) -> Vec<i64> {
        turns.iter().map(|t| t.team_id).collect()
    }

    #[test]
    fn snake_order_for_four_teams() {
        let order = draft_order(&[A, B, C, D], 3);
        assert_eq!(teams(&order[0..4]), vec![A, B, C, D]);
        assert_eq!(teams(&order[4..8]), vec![D, C, B, A]);
        assert_eq!(teams(&order[8..12]), vec![A, B, C, D]);
        assert_eq!(order[4].round, 2);
        assert_eq!(order[4].pick_number, 5);
    }

    #[test]
    fn two_teams_double_back_at_the_turn() {
        let order = draft_order(&[A, B], 2);
        assert_eq!(teams(&order), vec![A, B, B, A]);
    }

    #[test]
    fn stepping_keeps_pick_number_in_sync() {
        let mut pos = DraftPosition::FIRST;
        for n in 1..=40 {
            assert_eq!(pos, position_for(n, 4));
            assert_eq!(pos.pick_number, (pos.round - 1) * 4 + pos.pick_in_round);
            pos = step(pos, 4);
        }
        assert_eq!(pos.pick_number, 41);
        assert_eq!(pos.round, 11);
    }

    #[test]
    fn current_turn_requires_in_progress() {
        let mut s = session(vec![A, B], 1);
        s.status = DraftStatus::NotStarted;
        assert!(matches!(current_turn(&s), Err(DraftError::DraftNotInProgress)));
        s.status = DraftStatus::Complete;
        assert!(matches!(current_turn(&s), Err(DraftError::DraftNotInProgress)));
    }

    #[test]
    fn current_and_next_turn() {
        let s = session(vec![A, B, C, D], 4);
        let now = current_turn(&s).unwrap();
        assert_eq!((now.team_id, now.round, now.pick_number), (D, 1, 4));
        let next = next_turn(&s).unwrap();
        assert_eq!((next.team_id, next.round, next.pick_number), (D, 2, 5));
    }

    #[test]
    fn next_turn_ends_at_last_pick() {
        let s = session(vec![A, B, C, D], 40);
        assert_eq!(current_turn(&s).unwrap().team_id, A);
        assert_eq!(next_turn(&s), None);

        let past = session(vec![A, B, C, D], 41);
        assert!(matches!(current_turn(&past), Err(DraftError::DraftAlreadyComplete)));
        assert_eq!(next_turn(&past), None);
    }

    #[test]
    fn out_of_range_slot_has_no_team() {
        assert_eq!(team_for_pick(&[A, B], 1, 3), None);
        assert_eq!(team_for_pick(&[A, B], 1, 0), None);
        assert_eq!(team_for_pick(&[], 1, 1), None);
    }
}

//! 静态局面评估。始终从固定的参考玩家视角打分，对方视角由调用方取反。
//!
//! 距离按不考虑棋子阻挡的最短路径计算，因此距离项对双方严格反对称。

use crate::game::{distance_to_row, GameState, PlayerId, Position};

pub const WIN_SCORE: f64 = 10_000.0;
pub const NO_PATH_SCORE: f64 = 5_000.0;
/// 超过该绝对值的分数视为已分胜负，搜索在此提前终止。
pub const DECISIVE_THRESHOLD: f64 = 5_000.0;

const DISTANCE_WEIGHT: f64 = 10.0;
const WALL_WEIGHT: f64 = 2.0;
const REPETITION_PENALTY: f64 = 0.5;

pub fn is_decisive(score: f64) -> bool {
    score > DECISIVE_THRESHOLD || score < -DECISIVE_THRESHOLD
}

pub fn evaluate(
    state: &GameState,
    reference: PlayerId,
    previous_position: Option<Position>,
) -> f64 {
    let opponent_id = GameState::opponent_of(reference);
    let own = state.player(reference);
    let opponent = state.player(opponent_id);

    let own_distance = distance_to_row(
        own.position,
        GameState::goal_row(reference),
        &state.walls,
        None,
    );
    let opponent_distance = distance_to_row(
        opponent.position,
        GameState::goal_row(opponent_id),
        &state.walls,
        None,
    );

    match (own_distance, opponent_distance) {
        (Some(0), _) => WIN_SCORE,
        (_, Some(0)) => -WIN_SCORE,
        (None, _) => -NO_PATH_SCORE,
        (_, None) => NO_PATH_SCORE,
        (Some(own_distance), Some(opponent_distance)) => {
            let mut score = (f64::from(opponent_distance) - f64::from(own_distance))
                * DISTANCE_WEIGHT
                + f64::from(own.walls_remaining) * WALL_WEIGHT;
            if previous_position == Some(own.position) {
                score -= REPETITION_PENALTY;
            }
            score
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Wall, PLAYER_ONE, PLAYER_TWO};

    fn distance_term(state: &GameState, reference: PlayerId) -> f64 {
        evaluate(state, reference, None)
            - f64::from(state.player(reference).walls_remaining) * WALL_WEIGHT
    }

    #[test]
    fn opening_position_is_balanced() {
        let state = GameState::new();
        assert_eq!(evaluate(&state, PLAYER_ONE, None), 20.0);
        assert_eq!(evaluate(&state, PLAYER_TWO, None), 20.0);
    }

    #[test]
    fn distance_term_is_antisymmetric() {
        let mut state = GameState::new()
            .with_positions(Position::new(2, 3), Position::new(6, 4))
            .with_walls(vec![Wall::horizontal(2, 3), Wall::vertical(5, 5)]);
        state.player1.walls_remaining = 9;
        state.player2.walls_remaining = 9;
        let a = distance_term(&state, PLAYER_ONE);
        let b = distance_term(&state, PLAYER_TWO);
        assert_ne!(a, 0.0);
        assert_eq!(a, -b);
    }

    #[test]
    fn goal_row_scores_as_win_and_loss() {
        let state = GameState::new().with_positions(Position::new(3, 8), Position::new(5, 5));
        assert_eq!(evaluate(&state, PLAYER_ONE, None), WIN_SCORE);
        assert_eq!(evaluate(&state, PLAYER_TWO, None), -WIN_SCORE);
        assert!(is_decisive(evaluate(&state, PLAYER_TWO, None)));
    }

    #[test]
    fn sealed_player_scores_no_path() {
        // player one boxed into the top-left corner pocket
        let state = GameState::new()
            .with_positions(Position::new(0, 0), Position::new(4, 8))
            .with_walls(vec![Wall::horizontal(0, 0), Wall::vertical(1, 0)]);
        assert_eq!(evaluate(&state, PLAYER_ONE, None), -NO_PATH_SCORE);
        assert_eq!(evaluate(&state, PLAYER_TWO, None), NO_PATH_SCORE);
    }

    #[test]
    fn returning_to_previous_square_is_penalised() {
        let state = GameState::new();
        let fresh = evaluate(&state, PLAYER_ONE, Some(Position::new(3, 0)));
        let repeated = evaluate(&state, PLAYER_ONE, Some(Position::new(4, 0)));
        assert_eq!(fresh - repeated, REPETITION_PENALTY);
        assert!(!is_decisive(fresh));
    }
}

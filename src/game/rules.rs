use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{
    pathfinding::{shortest_path, step_targets, DIRECTIONS},
    state::{
        is_valid_player, GameState, IntegrityError, Move, Orientation, PlayerId, Position, Wall,
        CENTER_COLUMN, PLAYER_ONE, PLAYER_TWO, WALL_GRID_SIZE,
    },
};

/// 参与墙体候选生成的对手路径格数。
const WALL_PATH_LOOKAHEAD: usize = 4;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Error)]
#[serde(tag = "type")]
pub enum RuleError {
    #[error("the game is already finished")]
    GameFinished,
    #[error("player {player_id} does not exist")]
    PlayerNotFound { player_id: PlayerId },
    #[error("pawn cannot move to ({}, {})", .target.x, .target.y)]
    IllegalPawnMove { target: Position },
    #[error("player {player_id} has no walls left")]
    NoWallsRemaining { player_id: PlayerId },
    #[error("wall at ({}, {}) is not a legal placement", .wall.x, .wall.y)]
    IllegalWall { wall: Wall },
    #[error("integrity violation: {error}")]
    IntegrityViolation { error: IntegrityError },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleResolution {
    pub state: GameState,
    #[serde(rename = "move")]
    pub applied: Move,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<PlayerId>,
}

impl RuleResolution {
    pub fn new(state: GameState, applied: Move) -> Self {
        let winner = state.winner;
        Self {
            state,
            applied,
            winner,
        }
    }
}

/// 当前墙集合下 `wall` 能否放置：范围、重叠、首尾相接、交叉，以及双方终点连通性。
pub fn is_wall_placement_legal(state: &GameState, wall: &Wall) -> bool {
    if !wall.in_range() {
        return false;
    }
    if state.walls.iter().any(|placed| placed.conflicts_with(wall)) {
        return false;
    }

    let mut walls = state.walls.clone();
    walls.push(*wall);
    [PLAYER_ONE, PLAYER_TWO].into_iter().all(|player_id| {
        shortest_path(
            state.player(player_id).position,
            GameState::goal_row(player_id),
            &walls,
            None,
        )
        .is_some()
    })
}

/// `player_id` 的全部合法棋子走法（含直跳与斜跳），按离终点距离、离中线距离排序。
pub fn legal_pawn_moves(state: &GameState, player_id: PlayerId) -> Vec<Move> {
    let from = state.player(player_id).position;
    let opponent = state.player(GameState::opponent_of(player_id)).position;
    let goal_row = GameState::goal_row(player_id);

    let mut targets: Vec<Position> = DIRECTIONS
        .iter()
        .flat_map(|&direction| step_targets(from, direction, &state.walls, Some(opponent)))
        .collect();
    targets.sort_by_key(|target| {
        (
            (target.y - goal_row).unsigned_abs(),
            (target.x - CENTER_COLUMN).unsigned_abs(),
        )
    });
    targets.into_iter().map(Move::Pawn).collect()
}

/// 启发式的墙体候选：对手最短路径前几格及自身位置周围 3×3 的锚点。
///
/// 只是缩小搜索范围，候选仍要经过完整的合法性检查。
fn wall_candidate_anchors(state: &GameState, player_id: PlayerId) -> Vec<Position> {
    let own = state.player(player_id).position;
    let opponent_id = GameState::opponent_of(player_id);
    let opponent = state.player(opponent_id).position;

    let mut centers: Vec<Position> = shortest_path(
        opponent,
        GameState::goal_row(opponent_id),
        &state.walls,
        Some(own),
    )
    .map(|result| {
        result
            .path
            .into_iter()
            .take(WALL_PATH_LOOKAHEAD)
            .collect()
    })
    .unwrap_or_default();
    centers.push(own);

    let mut anchors: Vec<Position> = Vec::new();
    for center in centers {
        for dy in -1..=1 {
            for dx in -1..=1 {
                let anchor = center.offset(dx, dy);
                let in_range = (0..WALL_GRID_SIZE).contains(&anchor.x)
                    && (0..WALL_GRID_SIZE).contains(&anchor.y);
                if in_range && !anchors.contains(&anchor) {
                    anchors.push(anchor);
                }
            }
        }
    }
    anchors
}

/// 启发式邻域内的合法放墙走法，按离对手的曼哈顿距离排序。
pub fn legal_wall_moves(state: &GameState, player_id: PlayerId) -> Vec<Move> {
    if state.player(player_id).walls_remaining == 0 {
        return Vec::new();
    }
    let opponent = state.player(GameState::opponent_of(player_id)).position;

    let mut walls: Vec<Wall> = wall_candidate_anchors(state, player_id)
        .into_iter()
        .flat_map(|anchor| {
            Orientation::ALL
                .into_iter()
                .map(move |orientation| Wall::new(anchor.x, anchor.y, orientation))
        })
        .filter(|wall| is_wall_placement_legal(state, wall))
        .collect();
    walls.sort_by_key(|wall| wall.anchor().manhattan(opponent));
    walls.into_iter().map(Move::Wall).collect()
}

/// 整个棋盘上所有合法的放墙位置，不做启发式裁剪。
pub fn all_legal_walls(state: &GameState, player_id: PlayerId) -> Vec<Wall> {
    if state.player(player_id).walls_remaining == 0 {
        return Vec::new();
    }
    let mut walls = Vec::new();
    for y in 0..WALL_GRID_SIZE {
        for x in 0..WALL_GRID_SIZE {
            for orientation in Orientation::ALL {
                let wall = Wall::new(x, y, orientation);
                if is_wall_placement_legal(state, &wall) {
                    walls.push(wall);
                }
            }
        }
    }
    walls
}

/// 搜索使用的走法列表：先棋子、后放墙，顺序固定。对局结束后为空。
///
/// 不校验 `state`；来自外部的局面先经 [`RuleEngine::legal_moves`] 或
/// [`GameState::integrity_check`]。越界坐标不会导致 panic，只是没有可走的棋步。
pub fn generate_legal_moves(state: &GameState, player_id: PlayerId) -> Vec<Move> {
    if state.is_finished() {
        return Vec::new();
    }
    let mut moves = legal_pawn_moves(state, player_id);
    moves.extend(legal_wall_moves(state, player_id));
    moves
}

/// 纯函数：把走法应用到 `state` 的副本上，由当前行动方执行。
///
/// 不做合法性校验，需要校验时使用 [`RuleEngine::play`]。
pub fn apply_move(state: &GameState, mv: &Move) -> GameState {
    let mut next = state.clone();
    let mover = state.turn_owner;
    match mv {
        Move::Pawn(target) => {
            next.player_mut(mover).position = *target;
            if target.y == GameState::goal_row(mover) {
                next.winner = Some(mover);
            }
        }
        Move::Wall(wall) => {
            next.walls.push(*wall);
            let player = next.player_mut(mover);
            player.walls_remaining = player.walls_remaining.saturating_sub(1);
        }
    }
    next.turn_owner = GameState::opponent_of(mover);
    next.version = state.version + 1;
    next
}

/// 带校验的状态转移入口。
#[derive(Debug, Default, Clone, Copy)]
pub struct RuleEngine;

impl RuleEngine {
    pub fn new() -> Self {
        Self
    }

    fn ensure_integrity(state: &GameState) -> Result<(), RuleError> {
        state
            .integrity_check()
            .map_err(|error| RuleError::IntegrityViolation { error })
    }

    pub fn validate_move(&self, state: &GameState, mv: &Move) -> Result<(), RuleError> {
        if state.is_finished() {
            return Err(RuleError::GameFinished);
        }
        Self::ensure_integrity(state)?;

        let mover = state.turn_owner;
        match mv {
            Move::Pawn(target) => {
                if !legal_pawn_moves(state, mover).contains(mv) {
                    return Err(RuleError::IllegalPawnMove { target: *target });
                }
            }
            Move::Wall(wall) => {
                if state.player(mover).walls_remaining == 0 {
                    return Err(RuleError::NoWallsRemaining { player_id: mover });
                }
                if !is_wall_placement_legal(state, wall) {
                    return Err(RuleError::IllegalWall { wall: *wall });
                }
            }
        }
        Ok(())
    }

    pub fn play(&self, state: &GameState, mv: Move) -> Result<RuleResolution, RuleError> {
        if let Err(error) = self.validate_move(state, &mv) {
            tracing::debug!(%error, ?mv, "move rejected");
            return Err(error);
        }
        Ok(RuleResolution::new(apply_move(state, &mv), mv))
    }

    pub fn legal_moves(
        &self,
        state: &GameState,
        player_id: PlayerId,
    ) -> Result<Vec<Move>, RuleError> {
        if !is_valid_player(player_id) {
            return Err(RuleError::PlayerNotFound { player_id });
        }
        Self::ensure_integrity(state)?;
        Ok(generate_legal_moves(state, player_id))
    }
}

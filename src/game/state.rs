use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::pathfinding::shortest_path;

/// 棋盘边长（格子数）。
pub const BOARD_SIZE: i8 = 9;
/// 墙锚点的取值范围为 0..WALL_GRID_SIZE。
pub const WALL_GRID_SIZE: i8 = BOARD_SIZE - 1;
/// 每名玩家的初始墙数量。
pub const WALLS_PER_PLAYER: u8 = 10;
/// 中线列，用于走法排序。
pub const CENTER_COLUMN: i8 = BOARD_SIZE / 2;

/// 玩家标识，取值 1 或 2。
pub type PlayerId = u8;

pub const PLAYER_ONE: PlayerId = 1;
pub const PLAYER_TWO: PlayerId = 2;

/// 棋盘上的格子坐标。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    pub x: i8,
    pub y: i8,
}

impl Position {
    pub const fn new(x: i8, y: i8) -> Self {
        Self { x, y }
    }

    /// 坐标饱和相加：棋盘外的坐标偏移后仍在棋盘外，不会溢出。
    pub fn offset(self, dx: i8, dy: i8) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
        }
    }

    pub fn manhattan(self, other: Position) -> u16 {
        (i16::from(self.x) - i16::from(other.x)).unsigned_abs()
            + (i16::from(self.y) - i16::from(other.y)).unsigned_abs()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Horizontal,
    Vertical,
}

impl Orientation {
    pub const ALL: [Orientation; 2] = [Orientation::Horizontal, Orientation::Vertical];
}

/// 墙：以 (x, y) 为锚点、横跨两格的挡板。
///
/// 横墙阻断第 y 行与第 y+1 行之间、x 与 x+1 两列的纵向通行；
/// 竖墙阻断第 x 列与第 x+1 列之间、y 与 y+1 两行的横向通行。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Wall {
    pub x: i8,
    pub y: i8,
    pub orientation: Orientation,
}

impl Wall {
    pub const fn new(x: i8, y: i8, orientation: Orientation) -> Self {
        Self { x, y, orientation }
    }

    pub fn horizontal(x: i8, y: i8) -> Self {
        Self::new(x, y, Orientation::Horizontal)
    }

    pub fn vertical(x: i8, y: i8) -> Self {
        Self::new(x, y, Orientation::Vertical)
    }

    pub fn in_range(&self) -> bool {
        (0..WALL_GRID_SIZE).contains(&self.x) && (0..WALL_GRID_SIZE).contains(&self.y)
    }

    pub fn anchor(&self) -> Position {
        Position::new(self.x, self.y)
    }

    /// 与 `other` 是否重叠、首尾相接成一条线或十字交叉。
    pub fn conflicts_with(&self, other: &Wall) -> bool {
        if self.x == other.x && self.y == other.y {
            // same anchor: duplicate or crossing
            return true;
        }
        if self.orientation != other.orientation {
            return false;
        }
        match self.orientation {
            Orientation::Horizontal => self.y == other.y && (self.x - other.x).abs() == 1,
            Orientation::Vertical => self.x == other.x && (self.y - other.y).abs() == 1,
        }
    }
}

/// 走法：移动棋子或放置墙。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Move {
    Pawn(Position),
    Wall(Wall),
}

impl Move {
    pub fn pawn(x: i8, y: i8) -> Self {
        Move::Pawn(Position::new(x, y))
    }

    pub fn wall(x: i8, y: i8, orientation: Orientation) -> Self {
        Move::Wall(Wall::new(x, y, orientation))
    }

    pub fn is_wall(&self) -> bool {
        matches!(self, Move::Wall(_))
    }
}

/// 单个玩家的状态。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PlayerState {
    pub position: Position,
    pub walls_remaining: u8,
}

impl PlayerState {
    pub fn new(position: Position, walls_remaining: u8) -> Self {
        Self {
            position,
            walls_remaining,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Error)]
#[serde(tag = "type")]
pub enum IntegrityError {
    #[error("invalid player id {player_id}")]
    InvalidPlayerId { player_id: PlayerId },
    #[error("player {player_id} is off the board at ({}, {})", .position.x, .position.y)]
    PositionOutOfBounds {
        player_id: PlayerId,
        position: Position,
    },
    #[error("both pawns occupy ({}, {})", .position.x, .position.y)]
    PawnsOverlap { position: Position },
    #[error("player {player_id} holds {value} walls, more than the budget")]
    WallBudgetExceeded { player_id: PlayerId, value: u8 },
    #[error("{placed} walls placed but only {budget} were ever available")]
    WallCountMismatch { placed: usize, budget: usize },
    #[error("wall anchor ({}, {}) is out of range", .wall.x, .wall.y)]
    WallOutOfRange { wall: Wall },
    #[error("wall at ({}, {}) overlaps or crosses another wall", .wall.x, .wall.y)]
    WallConflict { wall: Wall },
    #[error("winner {winner} has not reached its goal row")]
    InconsistentWinner { winner: PlayerId },
    #[error("player {player_id} cannot reach its goal row")]
    GoalUnreachable { player_id: PlayerId },
}

/// 对局整体状态。核心逻辑从不原地修改它，每次转移都生成新值。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub player1: PlayerState,
    pub player2: PlayerState,
    pub turn_owner: PlayerId,
    #[serde(default)]
    pub walls: Vec<Wall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner: Option<PlayerId>,
    #[serde(default)]
    pub version: u64,
}

impl GameState {
    /// 标准开局：一号玩家在 (4,0)，二号玩家在 (4,8)，一号先手。
    pub fn new() -> Self {
        Self {
            player1: PlayerState::new(Position::new(CENTER_COLUMN, 0), WALLS_PER_PLAYER),
            player2: PlayerState::new(
                Position::new(CENTER_COLUMN, BOARD_SIZE - 1),
                WALLS_PER_PLAYER,
            ),
            turn_owner: PLAYER_ONE,
            walls: Vec::new(),
            winner: None,
            version: 0,
        }
    }

    pub fn with_turn_owner(mut self, player_id: PlayerId) -> Self {
        self.turn_owner = player_id;
        self
    }

    pub fn with_walls(mut self, walls: Vec<Wall>) -> Self {
        self.walls = walls;
        self
    }

    pub fn with_positions(mut self, player1: Position, player2: Position) -> Self {
        self.player1.position = player1;
        self.player2.position = player2;
        self
    }

    pub fn player(&self, id: PlayerId) -> &PlayerState {
        if id == PLAYER_ONE {
            &self.player1
        } else {
            &self.player2
        }
    }

    pub fn player_mut(&mut self, id: PlayerId) -> &mut PlayerState {
        if id == PLAYER_ONE {
            &mut self.player1
        } else {
            &mut self.player2
        }
    }

    pub fn opponent_of(player_id: PlayerId) -> PlayerId {
        if player_id == PLAYER_ONE {
            PLAYER_TWO
        } else {
            PLAYER_ONE
        }
    }

    /// 一号玩家的终点是第 8 行，二号玩家是第 0 行。
    pub fn goal_row(player_id: PlayerId) -> i8 {
        if player_id == PLAYER_ONE {
            BOARD_SIZE - 1
        } else {
            0
        }
    }

    pub fn is_finished(&self) -> bool {
        self.winner.is_some()
    }

    pub fn has_reached_goal(&self, player_id: PlayerId) -> bool {
        self.player(player_id).position.y == Self::goal_row(player_id)
    }

    pub fn integrity_check(&self) -> Result<(), IntegrityError> {
        if !is_valid_player(self.turn_owner) {
            return Err(IntegrityError::InvalidPlayerId {
                player_id: self.turn_owner,
            });
        }

        for player_id in [PLAYER_ONE, PLAYER_TWO] {
            let player = self.player(player_id);
            if !in_bounds(player.position) {
                return Err(IntegrityError::PositionOutOfBounds {
                    player_id,
                    position: player.position,
                });
            }
            if player.walls_remaining > WALLS_PER_PLAYER {
                return Err(IntegrityError::WallBudgetExceeded {
                    player_id,
                    value: player.walls_remaining,
                });
            }
        }

        if self.player1.position == self.player2.position {
            return Err(IntegrityError::PawnsOverlap {
                position: self.player1.position,
            });
        }

        let budget = usize::from(WALLS_PER_PLAYER) * 2
            - usize::from(self.player1.walls_remaining)
            - usize::from(self.player2.walls_remaining);
        if self.walls.len() > budget {
            return Err(IntegrityError::WallCountMismatch {
                placed: self.walls.len(),
                budget,
            });
        }

        for (index, wall) in self.walls.iter().enumerate() {
            if !wall.in_range() {
                return Err(IntegrityError::WallOutOfRange { wall: *wall });
            }
            if self.walls[..index].iter().any(|w| w.conflicts_with(wall)) {
                return Err(IntegrityError::WallConflict { wall: *wall });
            }
        }

        if let Some(winner) = self.winner {
            if !is_valid_player(winner) {
                return Err(IntegrityError::InvalidPlayerId { player_id: winner });
            }
            if !self.has_reached_goal(winner) {
                return Err(IntegrityError::InconsistentWinner { winner });
            }
        }

        for player_id in [PLAYER_ONE, PLAYER_TWO] {
            let start = self.player(player_id).position;
            if shortest_path(start, Self::goal_row(player_id), &self.walls, None).is_none() {
                return Err(IntegrityError::GoalUnreachable { player_id });
            }
        }

        Ok(())
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

pub fn is_valid_player(player_id: PlayerId) -> bool {
    player_id == PLAYER_ONE || player_id == PLAYER_TWO
}

pub fn in_bounds(position: Position) -> bool {
    (0..BOARD_SIZE).contains(&position.x) && (0..BOARD_SIZE).contains(&position.y)
}

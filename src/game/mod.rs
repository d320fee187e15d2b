//! 规则核心：棋盘状态、连通性寻路、走法生成与状态转移。

pub mod pathfinding;
pub mod rules;
pub mod state;

pub use pathfinding::{distance_to_row, is_blocked, shortest_path, PathResult};
pub use rules::{
    all_legal_walls, apply_move, generate_legal_moves, is_wall_placement_legal, legal_pawn_moves,
    legal_wall_moves, RuleEngine, RuleError, RuleResolution,
};
pub use state::{
    in_bounds, GameState, IntegrityError, Move, Orientation, PlayerId, PlayerState, Position, Wall,
    BOARD_SIZE, PLAYER_ONE, PLAYER_TWO, WALLS_PER_PLAYER,
};

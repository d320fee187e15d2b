use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::evaluation::{evaluate, is_decisive};
use crate::game::{apply_move, generate_legal_moves, GameState, Move, PlayerId, Position};

pub const MIN_DEPTH: u8 = 1;
pub const MAX_DEPTH: u8 = 4;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AiDifficulty {
    Easy,
    Normal,
    Hard,
    Expert,
}

impl AiDifficulty {
    pub fn depth(self) -> u8 {
        match self {
            AiDifficulty::Easy => 1,
            AiDifficulty::Normal => 2,
            AiDifficulty::Hard => 3,
            AiDifficulty::Expert => 4,
        }
    }
}

impl FromStr for AiDifficulty {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "easy" | "1" => Ok(AiDifficulty::Easy),
            "normal" | "medium" | "2" => Ok(AiDifficulty::Normal),
            "hard" | "3" => Ok(AiDifficulty::Hard),
            "expert" | "extreme" | "4" => Ok(AiDifficulty::Expert),
            _ => Err(()),
        }
    }
}

/// 搜索配置。深度是唯一的限流手段，没有时间截止。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct AiConfig {
    pub depth: u8,
}

impl AiConfig {
    pub fn from_difficulty(difficulty: AiDifficulty) -> Self {
        Self {
            depth: difficulty.depth(),
        }
    }

    pub fn with_depth(mut self, depth: u8) -> Self {
        self.depth = depth.clamp(MIN_DEPTH, MAX_DEPTH);
        self
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        AiConfig::from_difficulty(AiDifficulty::Normal)
    }
}

/// 搜索结果：分值与最佳走法。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SearchOutcome {
    pub score: f64,
    #[serde(rename = "move")]
    pub best_move: Option<Move>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AiDecision {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<Move>,
    pub evaluation: f64,
    pub depth_reached: u8,
    pub nodes: u64,
}

struct SearchStats {
    nodes: u64,
    depth_reached: u8,
}

impl SearchStats {
    fn new() -> Self {
        Self {
            nodes: 0,
            depth_reached: 0,
        }
    }
}

/// 一次搜索的上下文：AI 玩家、根深度与防反复参考位置。
struct Searcher {
    ai: PlayerId,
    root_depth: u8,
    previous_position: Option<Position>,
    stats: SearchStats,
}

impl Searcher {
    fn minimax(
        &mut self,
        state: &GameState,
        depth: u8,
        mut alpha: f64,
        mut beta: f64,
        maximizing: bool,
    ) -> SearchOutcome {
        self.stats.nodes += 1;
        let depth_explored = self.root_depth.saturating_sub(depth);
        if depth_explored > self.stats.depth_reached {
            self.stats.depth_reached = depth_explored;
        }

        let score = evaluate(state, self.ai, self.previous_position);
        if depth == 0 || is_decisive(score) {
            return SearchOutcome {
                score,
                best_move: None,
            };
        }

        let actor = if maximizing {
            self.ai
        } else {
            GameState::opponent_of(self.ai)
        };
        let moves = generate_legal_moves(state, actor);

        let mut best_move = None;
        let mut best_score = if maximizing {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };

        for mv in &moves {
            let child = apply_move(state, mv);
            let child_score = self
                .minimax(&child, depth - 1, alpha, beta, !maximizing)
                .score;

            if maximizing {
                if child_score > best_score {
                    best_score = child_score;
                    best_move = Some(*mv);
                }
                alpha = alpha.max(best_score);
            } else {
                if child_score < best_score {
                    best_score = child_score;
                    best_move = Some(*mv);
                }
                beta = beta.min(best_score);
            }

            if beta <= alpha {
                break;
            }
        }

        match best_move {
            Some(mv) => SearchOutcome {
                score: best_score,
                best_move: Some(mv),
            },
            None => SearchOutcome {
                score,
                best_move: moves.first().copied(),
            },
        }
    }
}

fn run_search(
    state: &GameState,
    depth: u8,
    previous_position: Option<Position>,
) -> (SearchOutcome, SearchStats) {
    let mut searcher = Searcher {
        ai: state.turn_owner,
        root_depth: depth,
        previous_position,
        stats: SearchStats::new(),
    };
    let mut outcome = searcher.minimax(state, depth, f64::NEG_INFINITY, f64::INFINITY, true);
    if outcome.best_move.is_none() {
        outcome.best_move = generate_legal_moves(state, state.turn_owner).first().copied();
    }
    tracing::debug!(
        player = state.turn_owner,
        depth,
        nodes = searcher.stats.nodes,
        score = outcome.score,
        best_move = ?outcome.best_move,
        "search finished"
    );
    (outcome, searcher.stats)
}

/// 以当前行动方为 AI 做深度受限的 alpha-beta 极小极大搜索。
///
/// 完全确定：相同的局面、深度与参考位置必然得到相同的走法和分值。
pub fn search(
    state: &GameState,
    depth: u8,
    previous_position: Option<Position>,
) -> SearchOutcome {
    run_search(state, depth, previous_position).0
}

pub struct AiAgent {
    config: AiConfig,
}

impl AiAgent {
    pub fn new(config: AiConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> AiConfig {
        self.config
    }

    pub fn decide_move(
        &self,
        state: &GameState,
        previous_position: Option<Position>,
    ) -> AiDecision {
        let (outcome, stats) = run_search(state, self.config.depth, previous_position);
        AiDecision {
            action: outcome.best_move,
            evaluation: outcome.score,
            depth_reached: stats.depth_reached,
            nodes: stats.nodes,
        }
    }
}

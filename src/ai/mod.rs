//! AI 模块：静态评估与 alpha-beta 极小极大搜索。

pub mod evaluation;
pub mod minimax;

pub use evaluation::{evaluate, is_decisive, DECISIVE_THRESHOLD};
pub use minimax::{
    search, AiAgent, AiConfig, AiDecision, AiDifficulty, SearchOutcome, MAX_DEPTH, MIN_DEPTH,
};

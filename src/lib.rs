pub mod ai;
pub mod game;
pub mod worker;

use gloo_timers::future::TimeoutFuture;
use serde::{Deserialize, Serialize};
use serde_wasm_bindgen::{from_value, Serializer};
use std::str::FromStr;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;
use web_sys::js_sys::Promise;

pub use ai::{
    evaluate, search, AiAgent, AiConfig, AiDecision, AiDifficulty, SearchOutcome, MAX_DEPTH,
    MIN_DEPTH,
};
pub use game::{
    all_legal_walls, apply_move, generate_legal_moves, is_wall_placement_legal, shortest_path,
    GameState, IntegrityError, Move, Orientation, PathResult, PlayerId, PlayerState, Position,
    RuleEngine, RuleError, RuleResolution, Wall,
};
pub use worker::{handle_request, SearchRequest, SearchResponse, WorkerError};

#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn start() {
    set_panic_hook();
}

/// `None` 序列化为 `null`，映射序列化为普通对象。
fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, serde_wasm_bindgen::Error> {
    value.serialize(&Serializer::json_compatible())
}

fn to_js_error<E: std::fmt::Display>(error: E) -> JsValue {
    JsValue::from_str(&error.to_string())
}

fn rule_to_js_error(error: RuleError) -> JsValue {
    to_js(&error).unwrap_or_else(|serialize_err| JsValue::from_str(&serialize_err.to_string()))
}

fn response_to_js(response: &SearchResponse) -> JsValue {
    if let SearchResponse::Failure { error, .. } = response {
        web_sys::console::error_1(&JsValue::from_str(error));
    }
    to_js(response).unwrap_or_else(|serialize_err| {
        JsValue::from_str(&worker::response_to_json(&SearchResponse::failure(
            serialize_err.to_string(),
        )))
    })
}

fn difficulty_depth(difficulty: Option<String>) -> u8 {
    difficulty
        .as_deref()
        .and_then(|value| AiDifficulty::from_str(value).ok())
        .map(AiDifficulty::depth)
        .unwrap_or_else(|| AiConfig::default().depth)
}

/// 持有一局对局状态的引擎，供没有独立 worker 的宿主直接调用。
#[wasm_bindgen]
pub struct GameEngine {
    state: GameState,
    engine: RuleEngine,
}

#[wasm_bindgen]
impl GameEngine {
    #[wasm_bindgen(constructor)]
    pub fn new(initial_state_json: Option<String>) -> Result<GameEngine, JsValue> {
        let state = if let Some(json) = initial_state_json {
            let state: GameState = serde_json::from_str(&json).map_err(to_js_error)?;
            state.integrity_check().map_err(to_js_error)?;
            state
        } else {
            GameState::new()
        };
        Ok(GameEngine {
            state,
            engine: RuleEngine::new(),
        })
    }

    pub fn state_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.state).map_err(to_js_error)
    }

    pub fn set_state_json(&mut self, json: &str) -> Result<(), JsValue> {
        let state: GameState = serde_json::from_str(json).map_err(to_js_error)?;
        state.integrity_check().map_err(to_js_error)?;
        self.state = state;
        Ok(())
    }

    pub fn legal_moves_json(&self) -> Result<String, JsValue> {
        let moves = self
            .engine
            .legal_moves(&self.state, self.state.turn_owner)
            .map_err(rule_to_js_error)?;
        serde_json::to_string(&moves).map_err(to_js_error)
    }

    pub fn play_move_json(&mut self, move_json: &str) -> Result<String, JsValue> {
        let mv: Move = serde_json::from_str(move_json).map_err(to_js_error)?;
        let resolution = self
            .engine
            .play(&self.state, mv)
            .map_err(rule_to_js_error)?;
        self.state = resolution.state.clone();
        serde_json::to_string(&resolution).map_err(to_js_error)
    }

    pub fn apply_ai_move(
        &mut self,
        difficulty: Option<String>,
        previous_position_json: Option<String>,
    ) -> Result<String, JsValue> {
        let previous_position = match previous_position_json {
            Some(json) => Some(serde_json::from_str::<Position>(&json).map_err(to_js_error)?),
            None => None,
        };
        let config = AiConfig::default().with_depth(difficulty_depth(difficulty));
        let decision = AiAgent::new(config).decide_move(&self.state, previous_position);
        if let Some(mv) = decision.action {
            let resolution = self
                .engine
                .play(&self.state, mv)
                .map_err(rule_to_js_error)?;
            self.state = resolution.state;
        }
        serde_json::to_string(&decision).map_err(to_js_error)
    }
}

/// 标准开局状态。
#[wasm_bindgen(js_name = "createGameState")]
pub fn create_game_state() -> Result<JsValue, JsValue> {
    to_js(&GameState::new()).map_err(JsValue::from)
}

#[wasm_bindgen(js_name = "validateState")]
pub fn validate_state(state: JsValue) -> Result<(), JsValue> {
    let state: GameState = from_value(state).map_err(JsValue::from)?;
    state
        .integrity_check()
        .map_err(|error| rule_to_js_error(RuleError::IntegrityViolation { error }))
}

#[wasm_bindgen(js_name = "generateLegalMoves")]
pub fn generate_legal_moves_js(state: JsValue, player_id: PlayerId) -> Result<JsValue, JsValue> {
    let state: GameState = from_value(state).map_err(JsValue::from)?;
    let moves = RuleEngine::new()
        .legal_moves(&state, player_id)
        .map_err(rule_to_js_error)?;
    to_js(&moves).map_err(JsValue::from)
}

#[wasm_bindgen(js_name = "applyMove")]
pub fn apply_move_js(state: JsValue, mv: JsValue) -> Result<JsValue, JsValue> {
    let state: GameState = from_value(state).map_err(JsValue::from)?;
    let mv: Move = from_value(mv).map_err(JsValue::from)?;
    match RuleEngine::new().play(&state, mv) {
        Ok(resolution) => to_js(&resolution).map_err(JsValue::from),
        Err(error) => Err(rule_to_js_error(error)),
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PathQuery {
    start: Position,
    target_row: i8,
    #[serde(default)]
    walls: Vec<Wall>,
    #[serde(default)]
    opponent_position: Option<Position>,
}

/// 返回 `{ distance, nextStep, path }`，不可达时返回 `null`。
#[wasm_bindgen(js_name = "shortestPath")]
pub fn shortest_path_js(query: JsValue) -> Result<JsValue, JsValue> {
    let query: PathQuery = from_value(query).map_err(JsValue::from)?;
    let result = shortest_path(
        query.start,
        query.target_row,
        &query.walls,
        query.opponent_position,
    );
    to_js(&result).map_err(JsValue::from)
}

#[wasm_bindgen(js_name = "evaluateState")]
pub fn evaluate_state(
    state: JsValue,
    reference: PlayerId,
    previous_position: JsValue,
) -> Result<f64, JsValue> {
    if !game::state::is_valid_player(reference) {
        return Err(rule_to_js_error(RuleError::PlayerNotFound {
            player_id: reference,
        }));
    }
    let state: GameState = from_value(state).map_err(JsValue::from)?;
    let previous_position: Option<Position> =
        from_value(previous_position).map_err(JsValue::from)?;
    Ok(evaluate(&state, reference, previous_position))
}

/// 计算边界入口：`{ state, depth, previousPosition? }` → `{ success, move | error }`，从不抛出。
#[wasm_bindgen(js_name = "computeAiMove")]
pub fn compute_ai_move(request: JsValue) -> JsValue {
    let response = match from_value::<SearchRequest>(request) {
        Ok(request) => handle_request(&request),
        Err(error) => SearchResponse::failure(
            WorkerError::InvalidRequest {
                reason: error.to_string(),
            }
            .to_string(),
        ),
    };
    response_to_js(&response)
}

/// 同上，但以 JSON 字符串收发，便于经 postMessage 传递。
#[wasm_bindgen(js_name = "computeAiMoveJson")]
pub fn compute_ai_move_json(request_json: &str) -> String {
    worker::handle_request_json(request_json)
}

/// 异步版本：返回 Promise，可选延迟模拟思考时间。
#[wasm_bindgen(js_name = "thinkAi")]
pub fn think_ai(request: JsValue, delay_ms: Option<u32>) -> Promise {
    let parsed = from_value::<SearchRequest>(request);
    let delay = delay_ms.unwrap_or(0);

    future_to_promise(async move {
        if delay > 0 {
            TimeoutFuture::new(delay).await;
        }
        let response = match parsed {
            Ok(request) => handle_request(&request),
            Err(error) => SearchResponse::failure(
                WorkerError::InvalidRequest {
                    reason: error.to_string(),
                }
                .to_string(),
            ),
        };
        Ok(response_to_js(&response))
    })
}

#[cfg(feature = "console_error_panic_hook")]
fn set_panic_hook() {
    console_error_panic_hook::set_once();
}

#[cfg(not(feature = "console_error_panic_hook"))]
fn set_panic_hook() {}

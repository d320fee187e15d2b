//! 浏览器端的计算边界测试，使用 `wasm-pack test --headless --chrome` 运行。
#![cfg(target_arch = "wasm32")]

use quoridor_core::{compute_ai_move_json, create_game_state, GameState, Move, SearchResponse};
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
fn create_game_state_returns_opening_position() {
    let value = create_game_state().expect("state should convert");
    let state: GameState = serde_wasm_bindgen::from_value(value).expect("state should parse back");
    assert_eq!(state, GameState::new());
}

#[wasm_bindgen_test]
fn compute_ai_move_json_answers_with_a_pawn_step() {
    let request = serde_json::json!({
        "state": GameState::new().with_turn_owner(2),
        "depth": 1,
    });
    let response: SearchResponse =
        serde_json::from_str(&compute_ai_move_json(&request.to_string())).expect("valid json");
    assert_eq!(response.best_move(), Some(Move::pawn(4, 7)));
}

#[wasm_bindgen_test]
fn compute_ai_move_json_reports_bad_depth() {
    let request = serde_json::json!({ "state": GameState::new(), "depth": 9 });
    let response: SearchResponse =
        serde_json::from_str(&compute_ai_move_json(&request.to_string())).expect("valid json");
    assert!(!response.is_success());
}

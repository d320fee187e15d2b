//! 计算边界：搜索请求/响应契约，以及把搜索放到交互路径之外执行的后台 worker。
//!
//! 核心搜索是同步纯函数；这里是唯一捕获意外故障并转换为失败响应的地方。

use std::panic::{self, AssertUnwindSafe};

use serde::{de, Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::ai::{search, SearchOutcome, MAX_DEPTH, MIN_DEPTH};
use crate::game::{GameState, IntegrityError, Move, Position};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub state: GameState,
    pub depth: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_position: Option<Position>,
}

impl SearchRequest {
    pub fn new(state: GameState, depth: u8) -> Self {
        Self {
            state,
            depth,
            previous_position: None,
        }
    }

    pub fn with_previous_position(mut self, position: Position) -> Self {
        self.previous_position = Some(position);
        self
    }
}

/// `{ success: true, move }` 或 `{ success: false, error }`。
///
/// 反序列化时按 `success` 选择分支，`success` 与 `error` 不一致的报文会被拒绝。
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum SearchResponse {
    Failure {
        success: bool,
        error: String,
    },
    Success {
        success: bool,
        #[serde(rename = "move")]
        best_move: Option<Move>,
    },
}

#[derive(Deserialize)]
struct RawResponse {
    success: bool,
    #[serde(default, rename = "move")]
    best_move: Option<Move>,
    #[serde(default)]
    error: Option<String>,
}

impl<'de> Deserialize<'de> for SearchResponse {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = RawResponse::deserialize(deserializer)?;
        match (raw.success, raw.error) {
            (true, None) => Ok(SearchResponse::success(raw.best_move)),
            (false, Some(error)) => Ok(SearchResponse::failure(error)),
            (true, Some(_)) => Err(de::Error::custom(
                "successful response must not carry an error",
            )),
            (false, None) => Err(de::Error::custom("failed response is missing its error")),
        }
    }
}

impl SearchResponse {
    pub fn success(best_move: Option<Move>) -> Self {
        SearchResponse::Success {
            success: true,
            best_move,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        SearchResponse::Failure {
            success: false,
            error: error.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, SearchResponse::Success { .. })
    }

    pub fn best_move(&self) -> Option<Move> {
        match self {
            SearchResponse::Success { best_move, .. } => *best_move,
            SearchResponse::Failure { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Error)]
#[serde(tag = "type")]
pub enum WorkerError {
    #[error("malformed request: {reason}")]
    InvalidRequest { reason: String },
    #[error("search depth {depth} is outside {}..={}", MIN_DEPTH, MAX_DEPTH)]
    InvalidDepth { depth: u8 },
    #[error("invalid game state: {error}")]
    InvalidState { error: IntegrityError },
    #[error("a search is already pending")]
    SearchPending,
    #[error("search worker unavailable: {reason}")]
    WorkerUnavailable { reason: String },
    #[error("search failed: {reason}")]
    ComputeFailure { reason: String },
}

pub fn validate_request(request: &SearchRequest) -> Result<(), WorkerError> {
    if !(MIN_DEPTH..=MAX_DEPTH).contains(&request.depth) {
        return Err(WorkerError::InvalidDepth {
            depth: request.depth,
        });
    }
    request
        .state
        .integrity_check()
        .map_err(|error| WorkerError::InvalidState { error })
}

fn panic_reason(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

pub fn run_request(request: &SearchRequest) -> Result<SearchOutcome, WorkerError> {
    validate_request(request)?;
    panic::catch_unwind(AssertUnwindSafe(|| {
        search(&request.state, request.depth, request.previous_position)
    }))
    .map_err(|payload| WorkerError::ComputeFailure {
        reason: panic_reason(payload),
    })
}

/// 处理一次请求，所有错误都转换为失败响应。
pub fn handle_request(request: &SearchRequest) -> SearchResponse {
    match run_request(request) {
        Ok(outcome) => SearchResponse::success(outcome.best_move),
        Err(error) => {
            tracing::warn!(%error, depth = request.depth, "search request failed");
            SearchResponse::failure(error.to_string())
        }
    }
}

pub fn response_to_json(response: &SearchResponse) -> String {
    serde_json::to_string(response).unwrap_or_else(|error| {
        serde_json::json!({ "success": false, "error": error.to_string() }).to_string()
    })
}

/// JSON 入口：请求解析失败同样返回失败响应，不会抛出。
pub fn handle_request_json(json: &str) -> String {
    let response = match serde_json::from_str::<SearchRequest>(json) {
        Ok(request) => handle_request(&request),
        Err(error) => {
            let error = WorkerError::InvalidRequest {
                reason: error.to_string(),
            };
            tracing::warn!(%error, "search request rejected");
            SearchResponse::failure(error.to_string())
        }
    };
    response_to_json(&response)
}

#[cfg(not(target_arch = "wasm32"))]
pub use native::SearchWorker;

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::thread;

    use crossbeam_channel::{bounded, Receiver, TryRecvError};

    use super::{handle_request, SearchRequest, SearchResponse, WorkerError};

    const DISCONNECTED: &str = "search worker exited without a result";

    /// 在后台线程上执行搜索。同一时间最多一个未完成的请求，不支持中途取消。
    #[derive(Debug, Default)]
    pub struct SearchWorker {
        pending: Option<Receiver<SearchResponse>>,
    }

    impl SearchWorker {
        pub fn new() -> Self {
            Self { pending: None }
        }

        pub fn is_pending(&self) -> bool {
            self.pending.is_some()
        }

        pub fn submit(&mut self, request: SearchRequest) -> Result<(), WorkerError> {
            if self.pending.is_some() {
                return Err(WorkerError::SearchPending);
            }

            let (sender, receiver) = bounded(1);
            thread::Builder::new()
                .name("quoridor-search".into())
                .spawn(move || {
                    let response = handle_request(&request);
                    // receiver may already be gone if the caller dropped the worker
                    let _ = sender.send(response);
                })
                .map_err(|error| WorkerError::WorkerUnavailable {
                    reason: error.to_string(),
                })?;

            self.pending = Some(receiver);
            Ok(())
        }

        /// 非阻塞地取回结果；仍在计算时返回 `None`。
        pub fn poll(&mut self) -> Option<SearchResponse> {
            let result = self.pending.as_ref()?.try_recv();
            match result {
                Ok(response) => {
                    self.pending = None;
                    Some(response)
                }
                Err(TryRecvError::Empty) => None,
                Err(TryRecvError::Disconnected) => {
                    self.pending = None;
                    Some(SearchResponse::failure(DISCONNECTED))
                }
            }
        }

        /// 阻塞等待当前请求完成；没有未完成请求时返回 `None`。
        pub fn wait(&mut self) -> Option<SearchResponse> {
            let receiver = self.pending.take()?;
            Some(
                receiver
                    .recv()
                    .unwrap_or_else(|_| SearchResponse::failure(DISCONNECTED)),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Orientation, Wall, PLAYER_TWO};

    #[test]
    fn success_response_shape() {
        let json = response_to_json(&SearchResponse::success(Some(Move::pawn(4, 7))));
        let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");
        assert_eq!(
            value,
            serde_json::json!({ "success": true, "move": { "kind": "pawn", "x": 4, "y": 7 } })
        );

        let empty = response_to_json(&SearchResponse::success(None));
        assert_eq!(empty, r#"{"success":true,"move":null}"#);
    }

    #[test]
    fn responses_read_back_into_the_right_variant() {
        let failure: SearchResponse =
            serde_json::from_str(r#"{"success":false,"error":"boom"}"#).expect("valid json");
        assert_eq!(failure, SearchResponse::failure("boom"));
        assert!(!failure.is_success());

        let success: SearchResponse =
            serde_json::from_str(r#"{"success":true,"move":null}"#).expect("valid json");
        assert!(success.is_success());
        assert_eq!(success.best_move(), None);
    }

    #[test]
    fn inconsistent_responses_are_rejected() {
        assert!(serde_json::from_str::<SearchResponse>(r#"{"success":true,"error":"x"}"#).is_err());
        assert!(serde_json::from_str::<SearchResponse>(r#"{"success":false}"#).is_err());
        assert!(serde_json::from_str::<SearchResponse>(r#"{"move":null}"#).is_err());

        let wall: SearchResponse = serde_json::from_str(
            r#"{"success":true,"move":{"kind":"wall","x":2,"y":5,"orientation":"vertical"}}"#,
        )
        .expect("valid json");
        assert_eq!(wall.best_move(), Some(Move::wall(2, 5, Orientation::Vertical)));
    }

    #[test]
    fn json_request_round_trip_through_search() {
        let request = SearchRequest::new(GameState::new().with_turn_owner(PLAYER_TWO), 1)
            .with_previous_position(Position::new(3, 8));
        let json = serde_json::to_string(&request).expect("request should serialize");
        assert!(json.contains("\"previousPosition\""));
        assert!(json.contains("\"turnOwner\":2"));

        let response: SearchResponse =
            serde_json::from_str(&handle_request_json(&json)).expect("valid response");
        assert_eq!(response.best_move(), Some(Move::pawn(4, 7)));
    }

    #[test]
    fn rejects_out_of_range_depth() {
        let response = handle_request(&SearchRequest::new(GameState::new(), 5));
        assert_eq!(
            response,
            SearchResponse::failure(WorkerError::InvalidDepth { depth: 5 }.to_string())
        );
        assert!(!handle_request(&SearchRequest::new(GameState::new(), 0)).is_success());
    }

    #[test]
    fn rejects_malformed_state() {
        let state = GameState::new().with_walls(vec![Wall::horizontal(1, 1)]);
        let response = handle_request(&SearchRequest::new(state, 2));
        assert!(!response.is_success());

        let garbage = handle_request_json("{\"state\": 42}");
        let value: serde_json::Value = serde_json::from_str(&garbage).expect("valid json");
        assert_eq!(value["success"], serde_json::json!(false));
        assert!(value["error"].as_str().is_some_and(|e| e.starts_with("malformed request")));
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn worker_refuses_a_second_request_while_pending() {
        let mut worker = SearchWorker::new();
        assert_eq!(worker.poll(), None);
        assert_eq!(worker.wait(), None);

        worker
            .submit(SearchRequest::new(GameState::new(), 2))
            .expect("first request should start");
        assert!(worker.is_pending());
        assert_eq!(
            worker.submit(SearchRequest::new(GameState::new(), 1)),
            Err(WorkerError::SearchPending)
        );

        let response = worker.wait().expect("pending search should answer");
        assert!(response.is_success());
        assert!(response.best_move().is_some());
        assert!(!worker.is_pending());
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn worker_answers_match_direct_search() {
        let state = GameState::new().with_turn_owner(PLAYER_TWO);
        let direct = search(&state, 2, None);

        let mut worker = SearchWorker::new();
        worker
            .submit(SearchRequest::new(state, 2))
            .expect("request should start");
        let response = loop {
            if let Some(response) = worker.poll() {
                break response;
            }
            std::thread::yield_now();
        };
        assert_eq!(response.best_move(), direct.best_move);
    }
}

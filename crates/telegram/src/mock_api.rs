//! Local stand-in for the Telegram Bot API and `t.me/s/` preview pages.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use {
    axum::{
        Json, Router,
        body::Bytes,
        extract::{Path, State},
        http::{StatusCode, Uri},
        response::{Html, IntoResponse, Response},
        routing::{get, post},
    },
    serde_json::{Value, json},
    teloxide::Bot,
    tokio::task::JoinHandle,
};

#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub method: String,
    pub body: Value,
}

#[derive(Clone, Default)]
struct MockState {
    chats: Arc<Mutex<HashMap<String, i64>>>,
    previews: Arc<Mutex<HashMap<String, (StatusCode, String)>>>,
    failing_texts: Arc<Mutex<Vec<String>>>,
    rate_limited: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
}

pub struct MockTelegramApi {
    addr: SocketAddr,
    state: MockState,
    server: JoinHandle<()>,
}

impl MockTelegramApi {
    pub async fn start() -> Self {
        let state = MockState::default();
        let app = Router::new()
            .route("/s/{handle}", get(preview_handler))
            .route("/{*path}", post(bot_api_handler))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("local addr");
        let server = tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("serve mock telegram api");
        });

        Self {
            addr,
            state,
            server,
        }
    }

    pub fn api_url(&self) -> reqwest::Url {
        reqwest::Url::parse(&format!("http://{}/", self.addr)).expect("parse api url")
    }

    pub fn bot(&self) -> Bot {
        Bot::new("test-token").set_api_url(self.api_url())
    }

    /// Base URL for preview pages, i.e. the stand-in for `https://t.me/s/`.
    pub fn preview_base_url(&self) -> String {
        format!("http://{}/s/", self.addr)
    }

    pub fn add_chat(&self, handle: &str, id: i64) {
        self.state
            .chats
            .lock()
            .unwrap()
            .insert(format!("@{handle}"), id);
    }

    pub fn set_preview(&self, handle: &str, status: StatusCode, html: &str) {
        self.state
            .previews
            .lock()
            .unwrap()
            .insert(handle.to_string(), (status, html.to_string()));
    }

    /// Reject every sendMessage whose text contains `needle`.
    pub fn fail_sends_containing(&self, needle: &str) {
        self.state
            .failing_texts
            .lock()
            .unwrap()
            .push(needle.to_string());
    }

    /// Answer the next `count` sendMessage calls with `429 retry after 0`.
    pub fn rate_limit_next(&self, count: usize) {
        self.state.rate_limited.store(count, Ordering::SeqCst);
    }

    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.state.requests.lock().unwrap().clone()
    }
}

impl Drop for MockTelegramApi {
    fn drop(&mut self) {
        self.server.abort();
    }
}

async fn preview_handler(State(state): State<MockState>, Path(handle): Path<String>) -> Response {
    match state.previews.lock().unwrap().get(&handle) {
        Some((status, html)) => (*status, Html(html.clone())).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn bot_api_handler(State(state): State<MockState>, uri: Uri, body: Bytes) -> Json<Value> {
    let method = uri.path().rsplit('/').next().unwrap_or_default().to_string();
    let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    state.requests.lock().unwrap().push(CapturedRequest {
        method: method.clone(),
        body: body.clone(),
    });

    match method.as_str() {
        "GetMe" => Json(json!({
            "ok": true,
            "result": {
                "id": 7,
                "is_bot": true,
                "first_name": "herald",
                "username": "herald_test_bot",
                "can_join_groups": true,
                "can_read_all_group_messages": false,
                "supports_inline_queries": false,
                "can_connect_to_business": false,
                "has_main_web_app": false
            }
        })),
        "GetChat" => {
            let key = body["chat_id"].as_str().unwrap_or_default();
            match state.chats.lock().unwrap().get(key) {
                Some(id) => Json(json!({
                    "ok": true,
                    "result": {
                        "id": id,
                        "type": "channel",
                        "title": key.trim_start_matches('@'),
                        "username": key.trim_start_matches('@'),
                        "accent_color_id": 0,
                        "max_reaction_count": 11
                    }
                })),
                None => Json(json!({
                    "ok": false,
                    "error_code": 400,
                    "description": "Bad Request: chat not found"
                })),
            }
        },
        "SendMessage" => {
            let remaining = state.rate_limited.load(Ordering::SeqCst);
            if remaining > 0 {
                state.rate_limited.store(remaining - 1, Ordering::SeqCst);
                return Json(json!({
                    "ok": false,
                    "error_code": 429,
                    "description": "Too Many Requests: retry after 0",
                    "parameters": { "retry_after": 0 }
                }));
            }
            let text = body["text"].as_str().unwrap_or_default();
            let failing = state
                .failing_texts
                .lock()
                .unwrap()
                .iter()
                .any(|needle| text.contains(needle.as_str()));
            if failing {
                return Json(json!({
                    "ok": false,
                    "error_code": 400,
                    "description": "Bad Request: message thread not found"
                }));
            }
            Json(json!({
                "ok": true,
                "result": {
                    "message_id": 1,
                    "date": 0,
                    "chat": { "id": 42, "type": "private" },
                    "text": text
                }
            }))
        },
        _ => Json(json!({ "ok": true, "result": true })),
    }
}

//! A scripted in-memory server.
//!
//! Statement batches are answered from a queue of reply bodies (an empty
//! success when the queue runs dry). Transaction control is answered by the
//! server itself: opening hands out a new transaction URL, commit and
//! rollback are recorded, so tests can check what would have persisted.

use crate::replies;
use serde_json::Value as Json;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use strand_request::{Transport, TransportError, TransportResponse, TransportResult};

/// Server root used by test sessions.
pub const BASE_URL: &str = "http://localhost:7474";

const TRANSACTION_ENDPOINT: &str = "http://localhost:7474/db/data/transaction";

/// A recorded request.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Post { url: String, body: Json },
    Delete { url: String },
}

enum Reply {
    Body(String),
    Unreachable(String),
}

#[derive(Default)]
struct State {
    replies: VecDeque<Reply>,
    requests: Vec<Request>,
    transactions: i64,
    committed: Vec<String>,
    rolled_back: Vec<String>,
}

/// In-memory transport with scripted replies. Clones share state.
#[derive(Clone, Default)]
pub struct ScriptedServer {
    state: Rc<RefCell<State>>,
}

impl ScriptedServer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the reply to the next statement batch.
    pub fn reply(&self, body: impl Into<String>) -> &Self {
        self.state.borrow_mut().replies.push_back(Reply::Body(body.into()));
        self
    }

    /// Make the next statement batch fail in transport.
    pub fn unreachable(&self, message: &str) -> &Self {
        self.state
            .borrow_mut()
            .replies
            .push_back(Reply::Unreachable(message.to_string()));
        self
    }

    pub fn requests(&self) -> Vec<Request> {
        self.state.borrow().requests.clone()
    }

    pub fn request_count(&self) -> usize {
        self.state.borrow().requests.len()
    }

    /// Texts of every statement posted, in order.
    pub fn statements(&self) -> Vec<String> {
        self.posted_statements()
            .into_iter()
            .filter_map(|(_, s)| s.get("statement").and_then(Json::as_str).map(str::to_string))
            .collect()
    }

    /// Every statement posted, with the URL it went to.
    pub fn posted_statements(&self) -> Vec<(String, Json)> {
        self.state
            .borrow()
            .requests
            .iter()
            .filter_map(|request| match request {
                Request::Post { url, body } => Some((url, body)),
                Request::Delete { .. } => None,
            })
            .flat_map(|(url, body)| {
                body.get("statements")
                    .and_then(Json::as_array)
                    .cloned()
                    .unwrap_or_default()
                    .into_iter()
                    .map(move |statement| (url.clone(), statement))
            })
            .collect()
    }

    /// The last statement posted.
    pub fn last_statement(&self) -> Option<Json> {
        self.posted_statements().pop().map(|(_, statement)| statement)
    }

    /// URLs of committed transactions.
    pub fn committed(&self) -> Vec<String> {
        self.state.borrow().committed.clone()
    }

    /// URLs of rolled back transactions.
    pub fn rolled_back(&self) -> Vec<String> {
        self.state.borrow().rolled_back.clone()
    }

    fn is_transaction_commit(url: &str, body: &Json) -> bool {
        let empty = body
            .get("statements")
            .and_then(Json::as_array)
            .map_or(true, Vec::is_empty);
        url.starts_with(TRANSACTION_ENDPOINT)
            && url.ends_with("/commit")
            && url != format!("{}/commit", TRANSACTION_ENDPOINT)
            && empty
    }
}

impl Transport for ScriptedServer {
    fn post(&mut self, url: &str, body: &str) -> TransportResult<TransportResponse> {
        let json: Json =
            serde_json::from_str(body).map_err(|e| TransportError::new(e.to_string()))?;
        let mut state = self.state.borrow_mut();
        state.requests.push(Request::Post {
            url: url.to_string(),
            body: json.clone(),
        });

        if url == TRANSACTION_ENDPOINT {
            state.transactions += 1;
            let tx = format!("{}/{}", TRANSACTION_ENDPOINT, state.transactions);
            let body = serde_json::json!({
                "commit": format!("{}/commit", tx),
                "results": [],
                "errors": []
            });
            return Ok(TransportResponse::new(body.to_string()).with_location(tx));
        }

        if Self::is_transaction_commit(url, &json) {
            let tx = url.trim_end_matches("/commit").to_string();
            state.committed.push(tx);
            return Ok(TransportResponse::new(replies::empty()));
        }

        match state.replies.pop_front() {
            Some(Reply::Body(body)) => Ok(TransportResponse::new(body)),
            Some(Reply::Unreachable(message)) => Err(TransportError::new(message)),
            None => Ok(TransportResponse::new(replies::empty())),
        }
    }

    fn delete(&mut self, url: &str) -> TransportResult<TransportResponse> {
        let mut state = self.state.borrow_mut();
        state.requests.push(Request::Delete {
            url: url.to_string(),
        });
        state.rolled_back.push(url.to_string());
        Ok(TransportResponse::new(""))
    }
}

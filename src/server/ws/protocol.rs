use serde::{Deserialize, Serialize};

use crate::pipeline::{Strategy, TraceStep};

#[derive(Debug, Deserialize, Default)]
pub struct WsIncomingMessage {
    #[serde(rename = "type")]
    pub msg_type: Option<String>,
    pub question: Option<String>,
    /// Older clients send the question as `message`.
    pub message: Option<String>,
    pub strategy: Option<Strategy>,
    #[serde(rename = "sessionId", alias = "session_id")]
    pub session_id: Option<String>,
}

impl WsIncomingMessage {
    pub fn question(&self) -> Option<&str> {
        self.question
            .as_deref()
            .or(self.message.as_deref())
            .map(str::trim)
            .filter(|q| !q.is_empty())
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsOutgoingMessage {
    Thought { data: String, step: TraceStep },
    Answer { message: String, strategy: Strategy },
    Done,
    Error { message: String },
}

impl WsOutgoingMessage {
    pub fn thought(step: TraceStep) -> Self {
        WsOutgoingMessage::Thought {
            data: step.render(),
            step,
        }
    }
}

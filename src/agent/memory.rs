use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;

pub const DEFAULT_SESSION: &str = "default";
pub const DEFAULT_MAX_SESSIONS: usize = 256;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Turn {
    pub question: String,
    pub answer: String,
    pub at: DateTime<Utc>,
}

#[derive(Default)]
struct Session {
    turns: VecDeque<Turn>,
    last_used: u64,
}

#[derive(Default)]
struct Sessions {
    by_id: HashMap<String, Session>,
    clock: u64,
}

/// Per-session record of completed question/answer turns, oldest first.
///
/// Holds at most `max_sessions` sessions; recording into a new session when
/// full evicts the least recently used one.
pub struct ConversationMemory {
    sessions: Mutex<Sessions>,
    max_turns: usize,
    max_sessions: usize,
}

impl ConversationMemory {
    pub fn new(max_turns: usize, max_sessions: usize) -> Self {
        Self {
            sessions: Mutex::new(Sessions::default()),
            max_turns,
            max_sessions: max_sessions.max(1),
        }
    }

    pub async fn record(&self, session_id: &str, question: &str, answer: &str) {
        if self.max_turns == 0 {
            return;
        }
        let mut sessions = self.sessions.lock().await;
        sessions.clock += 1;
        let now = sessions.clock;

        if !sessions.by_id.contains_key(session_id) && sessions.by_id.len() >= self.max_sessions {
            let oldest = sessions
                .by_id
                .iter()
                .min_by_key(|(_, session)| session.last_used)
                .map(|(id, _)| id.clone());
            if let Some(oldest) = oldest {
                tracing::debug!(session = %oldest, "Evicting least recently used session");
                sessions.by_id.remove(&oldest);
            }
        }

        let session = sessions.by_id.entry(session_id.to_string()).or_default();
        session.last_used = now;
        session.turns.push_back(Turn {
            question: question.to_string(),
            answer: answer.to_string(),
            at: Utc::now(),
        });
        while session.turns.len() > self.max_turns {
            session.turns.pop_front();
        }
    }

    /// Reading a session counts as using it.
    pub async fn turns(&self, session_id: &str) -> Vec<Turn> {
        let mut sessions = self.sessions.lock().await;
        sessions.clock += 1;
        let now = sessions.clock;
        match sessions.by_id.get_mut(session_id) {
            Some(session) => {
                session.last_used = now;
                session.turns.iter().cloned().collect()
            }
            None => Vec::new(),
        }
    }

    /// `Human: ...` / `AI: ...` lines for the prompt.
    pub async fn transcript(&self, session_id: &str) -> String {
        self.turns(session_id)
            .await
            .iter()
            .map(|turn| format!("Human: {}\nAI: {}", turn.question, turn.answer))
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[cfg(test)]
    pub(crate) async fn session_count(&self) -> usize {
        self.sessions.lock().await.by_id.len()
    }
}

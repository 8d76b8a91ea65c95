use serde::Serialize;
use tokio::sync::mpsc;

pub type TraceSender = mpsc::UnboundedSender<TraceStep>;

/// One intermediate artifact of a run, in the order it was produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TraceStep {
    Retrieved {
        output: String,
    },
    Validated {
        output: String,
    },
    ToolCall {
        iteration: usize,
        thought: String,
        tool: String,
        input: String,
        observation: String,
    },
    /// The model's output could not be read as an action or an answer.
    InvalidStep {
        iteration: usize,
        output: String,
        observation: String,
    },
    Notice {
        message: String,
    },
}

impl TraceStep {
    /// Markdown shown to the user as one "thought".
    pub fn render(&self) -> String {
        match self {
            TraceStep::Retrieved { output } => {
                format!("**Retrieved Documents**:\n```json\n{}\n```", output)
            }
            TraceStep::Validated { output } => {
                format!("**Validated Sources**:\n```json\n{}\n```", output)
            }
            TraceStep::ToolCall {
                tool,
                input,
                observation,
                ..
            } => format!(
                "**Action**: {} → _{}_\n**Observation**: {}",
                tool, input, observation
            ),
            TraceStep::InvalidStep { observation, .. } => {
                format!("**Action**: _unreadable_\n**Observation**: {}", observation)
            }
            TraceStep::Notice { message } => format!("**Note**: {}", message),
        }
    }
}

/// Collects steps for a single run, optionally forwarding each one as it happens.
#[derive(Debug, Default)]
pub struct Trace {
    steps: Vec<TraceStep>,
    live: Option<TraceSender>,
}

impl Trace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_live(live: TraceSender) -> Self {
        Self {
            steps: Vec::new(),
            live: Some(live),
        }
    }

    pub fn push(&mut self, step: TraceStep) {
        if let Some(live) = &self.live {
            // A closed receiver only means nobody is watching any more.
            let _ = live.send(step.clone());
        }
        self.steps.push(step);
    }

    pub fn steps(&self) -> &[TraceStep] {
        &self.steps
    }

    pub fn into_steps(self) -> Vec<TraceStep> {
        self.steps
    }
}

pub fn render_thoughts(steps: &[TraceStep]) -> Vec<String> {
    steps.iter().map(TraceStep::render).collect()
}

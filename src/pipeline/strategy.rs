use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How a question is driven through the three stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// retrieve -> validate -> synthesize, always in that order.
    #[default]
    #[serde(alias = "fixed_graph", alias = "graph", alias = "workflow")]
    FixedGraph,
    /// A ReAct loop that chooses which stage to call next.
    #[serde(alias = "agent_driven", alias = "agent", alias = "react")]
    AgentDriven,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::FixedGraph => "fixed-graph",
            Strategy::AgentDriven => "agent-driven",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "fixed-graph" | "graph" | "workflow" => Ok(Strategy::FixedGraph),
            "agent-driven" | "agent" | "react" => Ok(Strategy::AgentDriven),
            other => Err(format!("Unknown strategy: {}", other)),
        }
    }
}

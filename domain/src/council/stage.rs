//! Council pipeline stages

use serde::{Deserialize, Serialize};

/// Stage of a council turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Stage 1 - every council member answers independently
    Council,
    /// Stage 2 - members rank each other's anonymized answers
    Ranking,
    /// Stage 3 - the chairman synthesizes the final answer
    Synthesis,
}

impl Stage {
    pub fn all() -> [Stage; 3] {
        [Stage::Council, Stage::Ranking, Stage::Synthesis]
    }

    pub fn number(&self) -> u8 {
        match self {
            Stage::Council => 1,
            Stage::Ranking => 2,
            Stage::Synthesis => 3,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Stage::Council => "council",
            Stage::Ranking => "ranking",
            Stage::Synthesis => "synthesis",
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            Stage::Council => "Individual Responses",
            Stage::Ranking => "Peer Rankings",
            Stage::Synthesis => "Final Synthesis",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Stage {}: {}", self.number(), self.display_name())
    }
}

//! Council value objects - the payloads each stage produces.
//!
//! These mirror the backend's result shapes:
//! - [`CouncilAnswer`] - one member's stage 1 answer
//! - [`PeerRanking`] - one member's stage 2 evaluation of the anonymized answers
//! - [`RankingMetadata`] - label mapping and aggregate ranking sent with stage 2
//! - [`ChairmanAnswer`] - the stage 3 synthesis

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Stage 1: a council member's independent answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CouncilAnswer {
    /// The model that answered
    pub model: String,
    /// The answer text
    #[serde(default)]
    pub response: String,
}

impl CouncilAnswer {
    pub fn new(model: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            response: response.into(),
        }
    }
}

/// Stage 2: a council member's ranking of the anonymized answers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerRanking {
    /// The model that performed the ranking
    pub model: String,
    /// Full evaluation text
    #[serde(default)]
    pub ranking: String,
    /// Labels ("Response A", ...) extracted from the final ranking, best first
    #[serde(default)]
    pub parsed_ranking: Vec<String>,
}

impl PeerRanking {
    pub fn new(model: impl Into<String>, ranking: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ranking: ranking.into(),
            parsed_ranking: Vec::new(),
        }
    }

    pub fn with_parsed(mut self, labels: Vec<String>) -> Self {
        self.parsed_ranking = labels;
        self
    }
}

/// Average position of one model across all peer rankings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateRank {
    pub model: String,
    pub average_rank: f64,
    #[serde(default)]
    pub rankings_count: usize,
}

/// Diagnostic data sent alongside stage 2
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RankingMetadata {
    /// Anonymous label to model id ("Response A" -> "openai/gpt-5.1")
    #[serde(default)]
    pub label_to_model: BTreeMap<String, String>,
    /// Models ordered by average rank, best first
    #[serde(default)]
    pub aggregate_rankings: Vec<AggregateRank>,
}

impl RankingMetadata {
    /// De-anonymize a label, falling back to the label itself.
    pub fn resolve_label<'a>(&'a self, label: &'a str) -> &'a str {
        self.label_to_model
            .get(label)
            .map(String::as_str)
            .unwrap_or(label)
    }

    /// The model with the best average rank, if any ranking was aggregated.
    pub fn leader(&self) -> Option<&AggregateRank> {
        self.aggregate_rankings
            .iter()
            .min_by(|a, b| a.average_rank.total_cmp(&b.average_rank))
    }
}

/// Stage 3: the chairman's final synthesized answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChairmanAnswer {
    /// The chairman model
    pub model: String,
    /// The synthesized answer
    #[serde(default)]
    pub response: String,
}

impl ChairmanAnswer {
    pub fn new(model: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            response: response.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_resolves_labels() {
        let mut metadata = RankingMetadata::default();
        metadata
            .label_to_model
            .insert("Response A".to_string(), "openai/gpt-5.1".to_string());

        assert_eq!(metadata.resolve_label("Response A"), "openai/gpt-5.1");
        assert_eq!(metadata.resolve_label("Response Z"), "Response Z");
    }

    #[test]
    fn leader_has_lowest_average_rank() {
        let metadata = RankingMetadata {
            label_to_model: BTreeMap::new(),
            aggregate_rankings: vec![
                AggregateRank {
                    model: "b".to_string(),
                    average_rank: 2.5,
                    rankings_count: 4,
                },
                AggregateRank {
                    model: "a".to_string(),
                    average_rank: 1.25,
                    rankings_count: 4,
                },
            ],
        };
        assert_eq!(metadata.leader().unwrap().model, "a");
        assert!(RankingMetadata::default().leader().is_none());
    }

    #[test]
    fn peer_ranking_tolerates_missing_parsed_ranking() {
        let ranking: PeerRanking =
            serde_json::from_value(serde_json::json!({"model": "m", "ranking": "text"})).unwrap();
        assert!(ranking.parsed_ranking.is_empty());
    }
}

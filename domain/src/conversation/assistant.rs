//! The assistant message under construction during a turn.

use crate::council::stage::Stage;
use crate::council::value_objects::{ChairmanAnswer, CouncilAnswer, PeerRanking, RankingMetadata};
use serde::{Deserialize, Serialize};

/// Per-stage "in progress" flags shown while a turn streams.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageLoading {
    pub stage1: bool,
    pub stage2: bool,
    pub stage3: bool,
}

impl StageLoading {
    pub fn get(&self, stage: Stage) -> bool {
        match stage {
            Stage::Council => self.stage1,
            Stage::Ranking => self.stage2,
            Stage::Synthesis => self.stage3,
        }
    }

    pub fn set(&mut self, stage: Stage, loading: bool) {
        match stage {
            Stage::Council => self.stage1 = loading,
            Stage::Ranking => self.stage2 = loading,
            Stage::Synthesis => self.stage3 = loading,
        }
    }

    pub fn any(&self) -> bool {
        self.stage1 || self.stage2 || self.stage3
    }
}

/// Assistant reply assembled from the three council stages.
///
/// Stage fields are monotonic within a turn: once set they are only
/// replaced by a later completion of the same stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssistantMessage {
    #[serde(default)]
    pub stage1: Option<Vec<CouncilAnswer>>,
    #[serde(default)]
    pub stage2: Option<Vec<PeerRanking>>,
    #[serde(default)]
    pub stage3: Option<ChairmanAnswer>,
    #[serde(default)]
    pub metadata: Option<RankingMetadata>,
    #[serde(default)]
    pub loading: StageLoading,
}

impl AssistantMessage {
    /// Whether the given stage has produced its result.
    pub fn has_stage(&self, stage: Stage) -> bool {
        match stage {
            Stage::Council => self.stage1.is_some(),
            Stage::Ranking => self.stage2.is_some(),
            Stage::Synthesis => self.stage3.is_some(),
        }
    }

    /// Stages with results, in pipeline order.
    pub fn completed_stages(&self) -> Vec<Stage> {
        Stage::all()
            .into_iter()
            .filter(|s| self.has_stage(*s))
            .collect()
    }

    pub fn is_finished(&self) -> bool {
        self.stage3.is_some() && !self.loading.any()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_is_empty() {
        let msg = AssistantMessage::default();
        assert!(msg.completed_stages().is_empty());
        assert!(!msg.loading.any());
        assert!(!msg.is_finished());
    }

    #[test]
    fn loading_flags_by_stage() {
        let mut loading = StageLoading::default();
        loading.set(Stage::Ranking, true);
        assert!(loading.get(Stage::Ranking));
        assert!(!loading.get(Stage::Council));
        assert!(loading.any());
        loading.set(Stage::Ranking, false);
        assert!(!loading.any());
    }

    #[test]
    fn completed_stages_in_order() {
        let msg = AssistantMessage {
            stage3: Some(ChairmanAnswer::new("chair", "final")),
            stage1: Some(vec![]),
            ..Default::default()
        };
        assert_eq!(msg.completed_stages(), vec![Stage::Council, Stage::Synthesis]);
        assert!(msg.is_finished());
    }
}

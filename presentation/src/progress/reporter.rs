//! Progress reporting for council turns

use colored::Colorize;
use council_application::{TurnError, TurnNotifier};
use council_domain::{AssistantMessage, ConversationId, Stage};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Reports a streaming turn with one spinner per stage
pub struct ProgressReporter {
    multi: MultiProgress,
    bars: Mutex<HashMap<Stage, ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            bars: Mutex::new(HashMap::new()),
        }
    }

    fn bars(&self) -> MutexGuard<'_, HashMap<Stage, ProgressBar>> {
        self.bars.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn stage_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {prefix:.bold.cyan} {msg} {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    fn finish_all(&self, message: &str) {
        for (_, pb) in self.bars().drain() {
            if !pb.is_finished() {
                pb.abandon_with_message(message.to_string());
            }
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl TurnNotifier for ProgressReporter {
    fn on_stage_start(&self, stage: Stage) {
        let pb = self.multi.add(ProgressBar::new_spinner());
        pb.set_style(Self::stage_style());
        pb.set_prefix(stage.to_string());
        pb.set_message(stage_waiting_message(stage));
        pb.enable_steady_tick(Duration::from_millis(100));
        if let Some(previous) = self.bars().insert(stage, pb) {
            previous.finish_and_clear();
        }
    }

    fn on_stage_complete(&self, stage: Stage, message: &AssistantMessage) {
        if let Some(pb) = self.bars().remove(&stage) {
            pb.finish_with_message(format!("{} {}", "v".green(), stage_summary(stage, message)));
        }
    }

    fn on_turn_failed(&self, _error: &TurnError, _rolled_back: bool) {
        self.finish_all(&format!("{}", "x failed".red()));
    }

    fn on_turn_cancelled(&self) {
        self.finish_all(&format!("{}", "cancelled".yellow()));
    }

    fn on_turn_complete(&self, _message: &AssistantMessage) {
        self.finish_all("");
    }
}

/// Simple text-based progress (no fancy UI)
pub struct SimpleProgress;

impl TurnNotifier for SimpleProgress {
    fn on_turn_start(&self, conversation_id: &ConversationId, _content: &str) {
        println!("{} {}", "->".cyan(), format!("conversation {}", conversation_id).dimmed());
    }

    fn on_stage_start(&self, stage: Stage) {
        println!("{} {}", "->".cyan(), stage.to_string().bold());
    }

    fn on_stage_complete(&self, stage: Stage, message: &AssistantMessage) {
        println!("  {} {}", "v".green(), stage_summary(stage, message));
    }

    fn on_title_updated(&self, title: Option<&str>) {
        if let Some(title) = title {
            println!("  {} {}", "title:".dimmed(), title);
        }
    }

    fn on_turn_failed(&self, error: &TurnError, rolled_back: bool) {
        if rolled_back {
            println!("  {} {} (message discarded)", "x".red(), error);
        } else {
            println!("  {} {}", "x".red(), error);
        }
    }

    fn on_turn_cancelled(&self) {
        println!("  {}", "cancelled".yellow());
    }
}

fn stage_waiting_message(stage: Stage) -> &'static str {
    match stage {
        Stage::Council => "Collecting individual responses...",
        Stage::Ranking => "Running peer rankings...",
        Stage::Synthesis => "Chairman is synthesizing...",
    }
}

/// One-line result of a finished stage.
pub fn stage_summary(stage: Stage, message: &AssistantMessage) -> String {
    match stage {
        Stage::Council => {
            let count = message.stage1.as_ref().map_or(0, Vec::len);
            format!("{} responses", count)
        }
        Stage::Ranking => {
            let count = message.stage2.as_ref().map_or(0, Vec::len);
            match message.metadata.as_ref().and_then(|m| m.leader()) {
                Some(leader) => format!(
                    "{} rankings, leader {} ({:.2})",
                    count, leader.model, leader.average_rank
                ),
                None => format!("{} rankings", count),
            }
        }
        Stage::Synthesis => match &message.stage3 {
            Some(answer) => format!("synthesized by {}", answer.model),
            None => "no synthesis".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use council_domain::{
        AggregateRank, ChairmanAnswer, CouncilAnswer, PeerRanking, RankingMetadata,
    };

    #[test]
    fn council_summary_counts_answers() {
        let message = AssistantMessage {
            stage1: Some(vec![
                CouncilAnswer::new("a/one", "x"),
                CouncilAnswer::new("b/two", "y"),
            ]),
            ..Default::default()
        };
        assert_eq!(stage_summary(Stage::Council, &message), "2 responses");
    }

    #[test]
    fn ranking_summary_names_leader() {
        let message = AssistantMessage {
            stage2: Some(vec![PeerRanking::new("a/one", "FINAL RANKING:")]),
            metadata: Some(RankingMetadata {
                aggregate_rankings: vec![
                    AggregateRank {
                        model: "b/two".to_string(),
                        average_rank: 1.5,
                        rankings_count: 2,
                    },
                    AggregateRank {
                        model: "a/one".to_string(),
                        average_rank: 1.0,
                        rankings_count: 2,
                    },
                ],
                ..Default::default()
            }),
            ..Default::default()
        };
        assert_eq!(
            stage_summary(Stage::Ranking, &message),
            "1 rankings, leader a/one (1.00)"
        );
    }

    #[test]
    fn synthesis_summary() {
        let empty = AssistantMessage::default();
        assert_eq!(stage_summary(Stage::Synthesis, &empty), "no synthesis");

        let message = AssistantMessage {
            stage3: Some(ChairmanAnswer::new("c/chair", "final")),
            ..Default::default()
        };
        assert_eq!(
            stage_summary(Stage::Synthesis, &message),
            "synthesized by c/chair"
        );
    }
}

//! Console output formatter for council results

use colored::Colorize;
use council_domain::{
    AssistantMessage, Conversation, ConversationId, ConversationSummary, MessageBody,
    ModelCatalogSnapshot, OutputFormat, Settings, preview,
};

/// Formats council results for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Format an assistant message in the requested format
    pub fn render(format: OutputFormat, question: &str, message: &AssistantMessage) -> String {
        match format {
            OutputFormat::Full => Self::format(question, message),
            OutputFormat::Synthesis => Self::format_synthesis_only(question, message),
            OutputFormat::Json => Self::format_json(question, message),
        }
    }

    /// Format every stage of an assistant message
    pub fn format(question: &str, message: &AssistantMessage) -> String {
        let mut output = String::new();

        output.push_str(&Self::header("LLM Council Results"));
        output.push('\n');
        output.push_str(&format!("{} {}\n", "Question:".cyan().bold(), question));

        // Stage 1: Individual Responses
        if let Some(answers) = &message.stage1 {
            output.push_str(&Self::section_header("Stage 1: Individual Responses"));
            for answer in answers {
                output.push_str(&format!(
                    "\n{}\n{}\n",
                    format!("── {} ──", answer.model).yellow().bold(),
                    answer.response
                ));
            }
        }

        // Stage 2: Peer Rankings
        if let Some(rankings) = &message.stage2 {
            output.push_str(&Self::section_header("Stage 2: Peer Rankings"));
            for ranking in rankings {
                output.push_str(&format!(
                    "\n{}\n{}\n",
                    format!("── {} ──", ranking.model).yellow().bold(),
                    ranking.ranking
                ));
                if !ranking.parsed_ranking.is_empty() {
                    let resolved: Vec<&str> = ranking
                        .parsed_ranking
                        .iter()
                        .map(|label| match &message.metadata {
                            Some(metadata) => metadata.resolve_label(label),
                            None => label.as_str(),
                        })
                        .collect();
                    output.push_str(&format!(
                        "{} {}\n",
                        "Extracted ranking:".dimmed(),
                        resolved.join(" > ")
                    ));
                }
            }

            if let Some(metadata) = &message.metadata
                && !metadata.aggregate_rankings.is_empty()
            {
                output.push_str(&format!("\n{}\n", "Aggregate Rankings:".cyan().bold()));
                for (position, rank) in metadata.aggregate_rankings.iter().enumerate() {
                    output.push_str(&format!(
                        "  {}. {} (avg {:.2}, {} votes)\n",
                        position + 1,
                        rank.model,
                        rank.average_rank,
                        rank.rankings_count
                    ));
                }
            }
        }

        // Stage 3: Final Synthesis
        output.push_str(&Self::section_header("Stage 3: Final Synthesis"));
        match &message.stage3 {
            Some(answer) => output.push_str(&format!(
                "\n{}\n\n{}\n",
                format!("Chairman: {}", answer.model).yellow().bold(),
                answer.response
            )),
            None => output.push_str(&format!("\n{}\n", "No synthesis was produced.".dimmed())),
        }

        output.push_str(&Self::footer());
        output
    }

    /// Format as JSON
    pub fn format_json(question: &str, message: &AssistantMessage) -> String {
        let value = serde_json::json!({
            "question": question,
            "stage1": message.stage1,
            "stage2": message.stage2,
            "stage3": message.stage3,
            "metadata": message.metadata,
        });
        serde_json::to_string_pretty(&value).unwrap_or_else(|_| "{}".to_string())
    }

    /// Format synthesis only (concise output)
    pub fn format_synthesis_only(question: &str, message: &AssistantMessage) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "{}\n\n",
            "=== LLM Council Conclusion ===".cyan().bold()
        ));
        output.push_str(&format!("{} {}\n\n", "Q:".bold(), question));

        if let Some(answers) = &message.stage1 {
            let models: Vec<&str> = answers.iter().map(|a| a.model.as_str()).collect();
            output.push_str(&format!(
                "{} {}\n\n",
                "Models consulted:".dimmed(),
                models.join(", ")
            ));
        }

        match &message.stage3 {
            Some(answer) => output.push_str(&answer.response),
            None => output.push_str(&"No synthesis was produced.".dimmed().to_string()),
        }
        output.push('\n');
        output
    }

    /// Format the conversation list, marking the selected entry
    pub fn format_conversations(
        summaries: &[ConversationSummary],
        selected: Option<&ConversationId>,
    ) -> String {
        if summaries.is_empty() {
            return format!("{}\n", "No conversations yet".dimmed());
        }
        let mut output = String::new();
        for summary in summaries {
            let marker = if Some(&summary.id) == selected { "*" } else { " " };
            output.push_str(&format!(
                "{} {} {} {}\n",
                marker.green().bold(),
                summary.id.as_str().dimmed(),
                preview(summary.display_title(), 48).bold(),
                format!(
                    "({} messages, {})",
                    summary.message_count,
                    summary.created_at.format("%Y-%m-%d %H:%M")
                )
                .dimmed()
            ));
        }
        output
    }

    /// Format a loaded conversation's history: questions and syntheses
    pub fn format_history(conversation: &Conversation) -> String {
        let mut output = format!(
            "{} {}\n",
            "Conversation:".cyan().bold(),
            conversation.title.as_deref().unwrap_or("New Conversation")
        );
        for message in &conversation.messages {
            match &message.body {
                MessageBody::User { content } => {
                    output.push_str(&format!("\n{} {}\n", "You:".bold(), content));
                }
                MessageBody::Assistant(assistant) => match &assistant.stage3 {
                    Some(answer) => output.push_str(&format!(
                        "{}\n{}\n",
                        format!("Council ({}):", answer.model).yellow().bold(),
                        Self::indent(&answer.response, "  ")
                    )),
                    None => output.push_str(&format!("{}\n", "(no synthesis)".dimmed())),
                },
            }
        }
        output
    }

    /// Format the active council settings
    pub fn format_settings(settings: &Settings) -> String {
        let mut output = format!("{}\n", "Council models:".cyan().bold());
        for model in &settings.council_models {
            output.push_str(&format!("  * {}\n", model));
        }
        output.push_str(&format!(
            "{} {}\n",
            "Chairman:".cyan().bold(),
            settings.chairman_model
        ));
        output
    }

    /// Format the model catalog, marking configured models
    pub fn format_models(catalog: &ModelCatalogSnapshot, settings: &Settings) -> String {
        if catalog.is_free_text() {
            return format!(
                "{}\n",
                "Model list unavailable; enter model ids as free text.".yellow()
            );
        }
        let mut output = String::new();
        if let Some(source) = catalog.source {
            output.push_str(&format!(
                "{} {} ({})\n",
                "Models:".cyan().bold(),
                catalog.models.len(),
                source
            ));
        }
        for model in &catalog.models {
            let marker = if model.id == settings.chairman_model {
                "C".magenta().bold().to_string()
            } else if settings.is_council_member(&model.id) {
                "*".green().bold().to_string()
            } else {
                " ".to_string()
            };
            let context = model
                .context_length
                .map(|c| format!(" [{}k ctx]", c / 1000))
                .unwrap_or_default();
            output.push_str(&format!(
                "{} {} {}{}\n",
                marker,
                model.id,
                model.label.dimmed(),
                context.dimmed()
            ));
        }
        output
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }

    /// Indent a multi-line string
    pub fn indent(text: &str, prefix: &str) -> String {
        text.lines()
            .map(|line| format!("{}{}", prefix, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use council_domain::{
        AggregateRank, CatalogSource, ChairmanAnswer, CouncilAnswer, Message, ModelDescriptor,
        PeerRanking, RankingMetadata,
    };
    use std::collections::BTreeMap;

    fn finished() -> AssistantMessage {
        AssistantMessage {
            stage1: Some(vec![
                CouncilAnswer::new("a/one", "Answer one"),
                CouncilAnswer::new("b/two", "Answer two"),
            ]),
            stage2: Some(vec![
                PeerRanking::new("a/one", "B is better")
                    .with_parsed(vec!["Response B".to_string(), "Response A".to_string()]),
            ]),
            stage3: Some(ChairmanAnswer::new("c/chair", "The final word")),
            metadata: Some(RankingMetadata {
                label_to_model: BTreeMap::from([
                    ("Response A".to_string(), "a/one".to_string()),
                    ("Response B".to_string(), "b/two".to_string()),
                ]),
                aggregate_rankings: vec![AggregateRank {
                    model: "b/two".to_string(),
                    average_rank: 1.0,
                    rankings_count: 1,
                }],
            }),
            ..Default::default()
        }
    }

    #[test]
    fn full_output_contains_every_stage() {
        let output = ConsoleFormatter::format("Why?", &finished());
        assert!(output.contains("Answer one"));
        assert!(output.contains("B is better"));
        assert!(output.contains("b/two > a/one"));
        assert!(output.contains("avg 1.00"));
        assert!(output.contains("The final word"));
    }

    #[test]
    fn synthesis_only_skips_rankings() {
        let output = ConsoleFormatter::format_synthesis_only("Why?", &finished());
        assert!(output.contains("The final word"));
        assert!(output.contains("a/one, b/two"));
        assert!(!output.contains("B is better"));
    }

    #[test]
    fn missing_synthesis_is_reported() {
        let output = ConsoleFormatter::render(
            OutputFormat::Synthesis,
            "Why?",
            &AssistantMessage::default(),
        );
        assert!(output.contains("No synthesis was produced."));
    }

    #[test]
    fn json_output_is_parseable() {
        let output = ConsoleFormatter::render(OutputFormat::Json, "Why?", &finished());
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["question"], "Why?");
        assert_eq!(value["stage3"]["model"], "c/chair");
        assert_eq!(value["stage1"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn conversation_list_marks_selection() {
        let first = Conversation::new("c1", Utc::now()).summary();
        let second = Conversation::new("c2", Utc::now()).summary();
        let output =
            ConsoleFormatter::format_conversations(&[first, second.clone()], Some(&second.id));
        let selected_line = output.lines().find(|l| l.contains("c2")).unwrap();
        assert!(selected_line.contains('*'));
        assert!(output.contains("New Conversation"));
    }

    #[test]
    fn empty_conversation_list() {
        assert!(ConsoleFormatter::format_conversations(&[], None).contains("No conversations yet"));
    }

    #[test]
    fn history_shows_questions_and_syntheses() {
        let conversation = Conversation::new("c1", Utc::now()).with_appended([
            Message::user("Why?"),
            Message {
                body: MessageBody::Assistant(finished()),
                ..Message::assistant_placeholder()
            },
        ]);
        let output = ConsoleFormatter::format_history(&conversation);
        assert!(output.contains("Why?"));
        assert!(output.contains("  The final word"));
    }

    #[test]
    fn models_without_catalog_fall_back_to_free_text() {
        let output =
            ConsoleFormatter::format_models(&ModelCatalogSnapshot::empty(), &Settings::default());
        assert!(output.contains("free text"));
    }

    #[test]
    fn models_list_source_and_entries() {
        let catalog = ModelCatalogSnapshot::new(
            vec![ModelDescriptor::bare("a/one"), ModelDescriptor::bare("z/other")],
            CatalogSource::Cache,
        );
        let settings = Settings::new(vec!["a/one".to_string()], "a/one");
        let output = ConsoleFormatter::format_models(&catalog, &settings);
        assert!(output.contains("(cache)"));
        assert!(output.contains("z/other"));
    }

    #[test]
    fn settings_lists_members_and_chairman() {
        let settings = Settings::new(vec!["a/one".to_string(), "b/two".to_string()], "b/two");
        let output = ConsoleFormatter::format_settings(&settings);
        assert!(output.contains("  * a/one"));
        assert!(output.contains("b/two"));
    }

    #[test]
    fn indent_prefixes_lines() {
        assert_eq!(ConsoleFormatter::indent("a\nb", "> "), "> a\n> b");
    }
}

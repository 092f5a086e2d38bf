//! Running one council turn from the terminal

use crate::{ConsoleFormatter, OutputConfig, ProgressReporter, SimpleProgress};
use colored::Colorize;
use council_application::{
    ConversationRepository, NoTurnNotifier, StreamClient, TurnController, TurnNotifier,
    TurnOutcome,
};
use council_domain::{AssistantMessage, ConversationId, MessageId, OutputFormat};
use std::io::IsTerminal;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Send `question` to `conversation_id`, cancelling on Ctrl-C, and print
/// the result in the configured format.
pub async fn run_turn<S, R>(
    controller: &TurnController<S, R>,
    conversation_id: &ConversationId,
    question: &str,
    output: &OutputConfig,
    show_progress: bool,
) -> TurnOutcome
where
    S: StreamClient + 'static,
    R: ConversationRepository + 'static,
{
    let cancel = CancellationToken::new();
    let watcher = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                debug!("Ctrl-C received, cancelling turn");
                cancel.cancel();
            }
        })
    };

    // Spinners need a terminal; piped output gets plain progress lines.
    let progress = ProgressReporter::new();
    let notifier: &dyn TurnNotifier = if !show_progress || output.format == OutputFormat::Json {
        &NoTurnNotifier
    } else if std::io::stderr().is_terminal() {
        &progress
    } else {
        &SimpleProgress
    };
    let outcome = controller
        .send_message(Some(conversation_id), question, notifier, &cancel)
        .await;
    watcher.abort();

    match &outcome {
        TurnOutcome::Completed {
            conversation_id,
            assistant_id,
            ..
        } => {
            if let Some(message) = assistant_message(controller, conversation_id, assistant_id) {
                println!(
                    "{}",
                    ConsoleFormatter::render(output.format, question, &message)
                );
            }
        }
        TurnOutcome::Failed {
            conversation_id,
            assistant_id,
            error,
            rolled_back,
            ..
        } => {
            if !rolled_back
                && let Some(message) = assistant_message(controller, conversation_id, assistant_id)
                && message.stage1.is_some()
            {
                println!("{}", ConsoleFormatter::format(question, &message));
            }
            eprintln!("{} {}", "Error:".red().bold(), error);
            if *rolled_back {
                eprintln!("{}", "Your message was not sent; try again.".dimmed());
            }
        }
        TurnOutcome::Cancelled { .. } => {
            eprintln!("{}", "Turn cancelled; partial results were kept.".yellow());
        }
        TurnOutcome::Rejected(error) => {
            eprintln!("{} {}", "Error:".red().bold(), error);
        }
        TurnOutcome::Skipped(reason) => {
            eprintln!("{} {}", "Skipped:".yellow(), reason);
        }
    }
    outcome
}

fn assistant_message<S, R>(
    controller: &TurnController<S, R>,
    conversation_id: &ConversationId,
    assistant_id: &MessageId,
) -> Option<AssistantMessage>
where
    S: StreamClient + 'static,
    R: ConversationRepository + 'static,
{
    controller
        .state()
        .snapshot(conversation_id)?
        .message(assistant_id)?
        .as_assistant()
        .cloned()
}

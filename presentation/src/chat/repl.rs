//! REPL (Read-Eval-Print Loop) for interactive chat

use super::command::Command;
use super::turn::run_turn;
use crate::{ConsoleFormatter, OutputConfig, ReplConfig};
use colored::Colorize;
use council_application::{
    ConversationRepository, ConversationService, ModelCatalog, SettingsService, SettingsStore,
    StreamClient, TurnController,
};
use council_domain::{ConversationId, Settings};
use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, Result as RlResult};

/// Interactive chat REPL
pub struct ChatRepl<S, R, St, C>
where
    S: StreamClient + 'static,
    R: ConversationRepository + 'static,
    St: SettingsStore + 'static,
    C: ModelCatalog + 'static,
{
    controller: TurnController<S, R>,
    conversations: ConversationService<R>,
    settings: SettingsService<St, C>,
    output: OutputConfig,
    config: ReplConfig,
}

impl<S, R, St, C> ChatRepl<S, R, St, C>
where
    S: StreamClient + 'static,
    R: ConversationRepository + 'static,
    St: SettingsStore + 'static,
    C: ModelCatalog + 'static,
{
    /// Create a new ChatRepl
    pub fn new(
        controller: TurnController<S, R>,
        conversations: ConversationService<R>,
        settings: SettingsService<St, C>,
    ) -> Self {
        Self {
            controller,
            conversations,
            settings,
            output: OutputConfig::default(),
            config: ReplConfig::default(),
        }
    }

    pub fn with_output(mut self, output: OutputConfig) -> Self {
        self.output = output;
        self
    }

    pub fn with_config(mut self, config: ReplConfig) -> Self {
        self.config = config;
        self
    }

    /// Run the interactive REPL
    pub async fn run(&self) -> RlResult<()> {
        let mut rl = DefaultEditor::new()?;

        let history_path = self.config.history_path();
        if let Some(ref path) = history_path {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            let _ = rl.load_history(path);
        }

        let loaded = self.settings.load().await;
        if let Some(notice) = &loaded.notice {
            eprintln!("{}", notice.yellow());
        }
        self.conversations.refresh().await;

        self.print_welcome();

        loop {
            match rl.readline(&self.prompt()) {
                Ok(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }

                    if line.starts_with('/') {
                        if self.handle_command(Command::parse(line)).await {
                            break;
                        }
                        continue;
                    }

                    let _ = rl.add_history_entry(line);
                    self.process_question(line).await;
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!("Bye!");
                    break;
                }
                Err(err) => {
                    eprintln!("Error: {:?}", err);
                    break;
                }
            }
        }

        if let Some(ref path) = history_path {
            let _ = rl.save_history(path);
        }

        Ok(())
    }

    fn prompt(&self) -> String {
        let state = self.conversations.state();
        let title = state.selected().and_then(|id| {
            state
                .summaries()
                .into_iter()
                .find(|s| s.id == id)
                .and_then(|s| s.title)
        });
        match title {
            Some(title) => format!("[{}] >>> ", council_domain::preview(&title, 24)),
            None => ">>> ".to_string(),
        }
    }

    fn print_welcome(&self) {
        let settings = self.settings.get();
        println!();
        println!("╭─────────────────────────────────────────────╮");
        println!("│           LLM Council - Chat Mode           │");
        println!("╰─────────────────────────────────────────────╯");
        println!();
        println!("Council: {}", settings.council_models.join(", "));
        println!("Chairman: {}", settings.chairman_model);
        println!();
        println!("{}", Command::help());
        println!();
    }

    /// Handle slash commands. Returns true if should exit.
    async fn handle_command(&self, command: Command) -> bool {
        match command {
            Command::Quit => {
                println!("Bye!");
                return true;
            }
            Command::Help => {
                println!();
                println!("{}", Command::help());
                println!();
            }
            Command::New => match self.conversations.create().await {
                Ok(id) => println!("Started conversation {}", id.as_str().dimmed()),
                Err(e) => eprintln!("{} {}", "Error:".red().bold(), e),
            },
            Command::List => {
                self.conversations.refresh().await;
                let state = self.conversations.state();
                print!(
                    "{}",
                    ConsoleFormatter::format_conversations(
                        &state.summaries(),
                        state.selected().as_ref()
                    )
                );
            }
            Command::Switch(id) => {
                let id = ConversationId::new(id);
                match self.conversations.select(&id).await {
                    Ok(()) => self.print_history(&id),
                    Err(e) => eprintln!("{} {}", "Error:".red().bold(), e),
                }
            }
            Command::History => match self.conversations.state().selected() {
                Some(id) => self.print_history(&id),
                None => println!("{}", "No conversation selected".dimmed()),
            },
            Command::Settings => print!("{}", ConsoleFormatter::format_settings(&self.settings.get())),
            Command::Models { refresh } => {
                let catalog = self.settings.list_models(refresh).await;
                print!(
                    "{}",
                    ConsoleFormatter::format_models(&catalog, &self.settings.get())
                );
            }
            Command::Council(models) => {
                let current = self.settings.get();
                self.save_settings(Settings::new(models, current.chairman_model))
                    .await;
            }
            Command::Chairman(model) => {
                let current = self.settings.get();
                self.save_settings(Settings::new(current.council_models, model))
                    .await;
            }
            Command::ResetSettings => match self.settings.reset().await {
                Ok(settings) => {
                    println!("{}", "Settings restored to defaults".green());
                    print!("{}", ConsoleFormatter::format_settings(&settings));
                }
                Err(e) => eprintln!("{} {}", "Error:".red().bold(), e),
            },
            Command::MissingArgument(usage) => {
                println!("Usage: {}", usage);
            }
            Command::Unknown(name) => {
                println!("Unknown command: {}", name);
                println!("Type /help for available commands");
            }
        }
        false
    }

    async fn save_settings(&self, settings: Settings) {
        match self.settings.save(settings).await {
            Ok(saved) => print!("{}", ConsoleFormatter::format_settings(&saved)),
            Err(e) => eprintln!("{} {}", "Error:".red().bold(), e),
        }
    }

    fn print_history(&self, id: &ConversationId) {
        if let Some(conversation) = self.conversations.state().snapshot(id) {
            println!("{}", ConsoleFormatter::format_history(&conversation));
        }
    }

    async fn process_question(&self, question: &str) {
        println!();

        let id = match self.conversations.state().selected() {
            Some(id) => id,
            None => match self.conversations.create().await {
                Ok(id) => id,
                Err(e) => {
                    eprintln!("{} {}", "Error:".red().bold(), e);
                    return;
                }
            },
        };

        run_turn(
            &self.controller,
            &id,
            question,
            &self.output,
            self.config.show_progress,
        )
        .await;
        println!();
    }
}

//! Slash commands understood by the chat REPL

/// A parsed slash command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Quit,
    /// Start a new conversation
    New,
    /// List conversations
    List,
    /// Select a conversation by id
    Switch(String),
    /// Show the selected conversation's history
    History,
    /// Show the council settings
    Settings,
    /// List available models
    Models { refresh: bool },
    /// Replace the council members
    Council(Vec<String>),
    /// Replace the chairman
    Chairman(String),
    ResetSettings,
    MissingArgument(&'static str),
    Unknown(String),
}

impl Command {
    /// Parse a line starting with `/`.
    pub fn parse(line: &str) -> Self {
        let mut parts = line.trim().splitn(2, char::is_whitespace);
        let name = parts.next().unwrap_or_default();
        let arg = parts.next().map(str::trim).unwrap_or_default();

        match name {
            "/quit" | "/exit" | "/q" => Command::Quit,
            "/help" | "/h" | "/?" => Command::Help,
            "/new" => Command::New,
            "/list" | "/ls" => Command::List,
            "/switch" | "/open" => {
                if arg.is_empty() {
                    Command::MissingArgument("/switch <conversation-id>")
                } else {
                    Command::Switch(arg.to_string())
                }
            }
            "/history" => Command::History,
            "/settings" => Command::Settings,
            "/models" => Command::Models {
                refresh: arg == "refresh",
            },
            "/council" => {
                let models: Vec<String> = arg
                    .split(|c: char| c == ',' || c.is_whitespace())
                    .filter(|m| !m.is_empty())
                    .map(str::to_string)
                    .collect();
                if models.is_empty() {
                    Command::MissingArgument("/council <model>[,<model>...]")
                } else {
                    Command::Council(models)
                }
            }
            "/chairman" => {
                if arg.is_empty() {
                    Command::MissingArgument("/chairman <model>")
                } else {
                    Command::Chairman(arg.to_string())
                }
            }
            "/reset-settings" => Command::ResetSettings,
            _ => Command::Unknown(name.to_string()),
        }
    }

    pub fn help() -> &'static str {
        "Commands:
  /help, /h, /?              - Show this help
  /new                       - Start a new conversation
  /list                      - List conversations
  /switch <id>               - Switch to a conversation
  /history                   - Show the current conversation
  /settings                  - Show council members and chairman
  /models [refresh]          - List available models
  /council <m1>,<m2>,...     - Set council members
  /chairman <model>          - Set the chairman
  /reset-settings            - Restore default settings
  /quit, /exit, /q           - Exit chat

Press Ctrl-C while the council is working to cancel the turn."
    }
}

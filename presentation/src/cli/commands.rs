//! CLI command definitions

use clap::{Parser, ValueEnum};
use council_domain::OutputFormat as DomainOutputFormat;
use std::path::PathBuf;

/// Output format for council results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Every stage: council answers, peer rankings and the synthesis
    Full,
    /// Only the chairman's synthesis
    Synthesis,
    /// The assistant message as JSON
    Json,
}

impl From<OutputFormat> for DomainOutputFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Full => DomainOutputFormat::Full,
            OutputFormat::Synthesis => DomainOutputFormat::Synthesis,
            OutputFormat::Json => DomainOutputFormat::Json,
        }
    }
}

/// CLI arguments for llm-council
#[derive(Parser, Debug)]
#[command(name = "llm-council")]
#[command(author, version, about = "LLM Council - ask a council of models, get a chairman's synthesis")]
#[command(long_about = r#"
LLM Council sends your question to a council of models through the council backend.

Each turn streams three stages:
1. Individual Responses: every council model answers independently
2. Peer Rankings: each model ranks the anonymized answers
3. Final Synthesis: the chairman model writes the final answer

Configuration files are loaded from (in priority order):
1. LLM_COUNCIL_* environment variables (e.g. LLM_COUNCIL_BACKEND__BASE_URL)
2. --config <path>     Explicit config file
3. ./council.toml      Project-level config
4. ~/.config/llm-council/config.toml   Global config

Example:
  llm-council "What's the best way to handle errors in Rust?"
  llm-council -m openai/gpt-5.1 -m x-ai/grok-4 --chairman x-ai/grok-4 "Compare async runtimes"
  llm-council --chat
"#)]
pub struct Cli {
    /// The question to ask the council (not required in chat mode)
    pub question: Option<String>,

    /// Start interactive chat mode
    #[arg(short, long)]
    pub chat: bool,

    /// Council member models for this session (can be specified multiple times)
    #[arg(short = 'm', long = "council-model", value_name = "MODEL")]
    pub council_models: Vec<String>,

    /// Chairman model for this session
    #[arg(long, value_name = "MODEL")]
    pub chairman: Option<String>,

    /// Continue an existing conversation instead of creating one
    #[arg(long, value_name = "ID")]
    pub conversation: Option<String>,

    /// Output format
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormat>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,

    /// List the models available to the council and exit
    #[arg(long)]
    pub list_models: bool,

    /// With --list-models, bypass the catalog cache
    #[arg(long, requires = "list_models")]
    pub refresh: bool,

    /// Show the active council settings and exit
    #[arg(long)]
    pub show_settings: bool,

    /// Restore the default council settings and exit
    #[arg(long)]
    pub reset_settings: bool,

    /// Council backend URL (overrides [backend].base_url)
    #[arg(long, value_name = "URL")]
    pub backend: Option<String>,

    /// Directory for daily-rolling log files
    #[arg(long, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,
}

impl Cli {
    /// Whether any council override was given on the command line.
    pub fn has_council_override(&self) -> bool {
        !self.council_models.is_empty() || self.chairman.is_some()
    }
}

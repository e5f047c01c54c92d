use clap::Parser;
use clap_complete::Shell;
use std::path::PathBuf;

/// CLI arguments for moonchat
#[derive(Parser, Debug, Default)]
#[command(name = "moonchat")]
#[command(about = "Moonchat - chat with Moonshot/Kimi models from the command line")]
#[command(version)]
pub struct Cli {
    /// Text or file paths to send as one question (single-shot mode)
    #[arg(value_name = "TEXT_OR_FILE")]
    pub inputs: Vec<String>,

    /// Run in interactive mode
    #[arg(short, long, action = clap::ArgAction::SetTrue)]
    pub interactive: bool,

    /// Model to use: a name, or the 1-based position in the model list
    #[arg(short, long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Sampling temperature
    #[arg(short, long, value_name = "FLOAT")]
    pub temperature: Option<f32>,

    /// API base URL (OpenAI-compatible, e.g. https://api.moonshot.cn/v1)
    #[arg(long, value_name = "URL")]
    pub api_url: Option<String>,

    /// Data directory holding the key, background, history and log files
    #[arg(long, value_name = "DIR", env = "MOONCHAT_HOME")]
    pub data_dir: Option<PathBuf>,

    /// File whose first line is the API key
    #[arg(long, value_name = "PATH")]
    pub key_file: Option<PathBuf>,

    /// Do not load background knowledge
    #[arg(long)]
    pub no_background: bool,

    /// Do not write the conversation log
    #[arg(long)]
    pub no_log: bool,

    /// Enable verbose debug output (shows HTTP requests, responses and stream chunks)
    #[arg(long, short = 'v')]
    pub verbose: bool,

    /// Generate shell completions
    #[arg(long, value_enum, value_name = "SHELL")]
    pub generate: Option<Shell>,
}

use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[value(alias = "google")]
    Gemini,
    #[value(alias = "open-ai", alias = "openai")]
    OpenAI,
    #[value(alias = "ollama")]
    Ollama,
}

#[derive(Parser, Debug, Default)]
#[command(name = "brew-wizard", version, about = "Guided beverage recipe generator backed by a generative-text service")]
pub struct Args {
    /// TOML config file; flags below override it.
    #[arg(long)]
    pub config: Option<String>,

    #[arg(long, value_enum)]
    pub provider: Option<ProviderKind>,

    #[arg(long)]
    pub model: Option<String>,

    #[arg(long)]
    pub api_base: Option<String>,

    /// Name of the environment variable holding the API key.
    #[arg(long)]
    pub api_key_env: Option<String>,

    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Quiet period after the last edit before suggestions refresh.
    #[arg(long)]
    pub debounce_ms: Option<u64>,

    /// Write request/response JSON for every generation call.
    #[arg(long, default_value_t = false)]
    pub save_transcripts: bool,

    #[arg(long)]
    pub transcript_dir: Option<String>,

    /// Directory exported recipe cards are written to.
    #[arg(long)]
    pub export_dir: Option<String>,

    #[arg(long, default_value_t = false)]
    pub debug: bool,
}

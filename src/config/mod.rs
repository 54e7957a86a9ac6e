use anyhow::Context;
use fs_err as fs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cli::{Args, ProviderKind};
use crate::errors::BrewError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub provider: ProviderKind,
    pub model: Option<String>,
    pub api_base: Option<String>,
    pub api_key_env: Option<String>,
    pub timeout_secs: u64,
    pub debounce_ms: u64,
    pub save_transcripts: bool,
    pub transcript_dir: String,
    pub export_dir: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Gemini,
            model: None,
            api_base: None,
            api_key_env: None,
            timeout_secs: 120,
            debounce_ms: 3_000,
            save_transcripts: false,
            transcript_dir: ".brew/transcripts".into(),
            export_dir: ".".into(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)?;
        let cfg: Config =
            toml::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
        Ok(cfg)
    }

    /// Config file (if any), then CLI flags on top.
    pub fn resolve(args: &Args) -> anyhow::Result<Self> {
        let mut cfg = match &args.config {
            Some(p) => Config::load(Path::new(p))?,
            None => Config::default(),
        };
        cfg.apply_args(args);
        Ok(cfg)
    }

    pub fn apply_args(&mut self, args: &Args) {
        if let Some(p) = args.provider {
            if p != self.provider {
                // A model name from the file belongs to the old provider.
                self.model = None;
            }
            self.provider = p;
        }
        if let Some(m) = &args.model {
            self.model = Some(m.clone());
        }
        if let Some(b) = &args.api_base {
            self.api_base = Some(b.clone());
        }
        if let Some(k) = &args.api_key_env {
            self.api_key_env = Some(k.clone());
        }
        if let Some(t) = args.timeout_secs {
            self.timeout_secs = t;
        }
        if let Some(d) = args.debounce_ms {
            self.debounce_ms = d;
        }
        if args.save_transcripts {
            self.save_transcripts = true;
        }
        if let Some(d) = &args.transcript_dir {
            self.transcript_dir = d.clone();
        }
        if let Some(d) = &args.export_dir {
            self.export_dir = d.clone();
        }
    }

    pub fn model(&self) -> String {
        self.model.clone().unwrap_or_else(|| {
            match self.provider {
                ProviderKind::Gemini => "gemini-2.5-flash",
                ProviderKind::OpenAI => "gpt-4.1-mini",
                ProviderKind::Ollama => "llama3.1",
            }
            .to_string()
        })
    }

    pub fn api_key_env(&self) -> String {
        self.api_key_env.clone().unwrap_or_else(|| {
            match self.provider {
                ProviderKind::Gemini => "GEMINI_API_KEY",
                ProviderKind::OpenAI => "OPENAI_API_KEY",
                ProviderKind::Ollama => "OLLAMA_API_KEY",
            }
            .to_string()
        })
    }

    pub fn api_key(&self) -> Result<String, BrewError> {
        let var = self.api_key_env();
        std::env::var(&var)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| BrewError::Config(format!("{var} env var is not set")))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn transcript_dir(&self) -> Option<PathBuf> {
        self.save_transcripts.then(|| PathBuf::from(&self.transcript_dir))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_the_wizard_timings() {
        let cfg = Config::default();
        assert_eq!(cfg.debounce(), Duration::from_secs(3));
        assert_eq!(cfg.provider, ProviderKind::Gemini);
        assert_eq!(cfg.model(), "gemini-2.5-flash");
        assert!(cfg.transcript_dir().is_none());
    }

    #[test]
    fn toml_file_is_partial_and_flags_override_it() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "provider = \"ollama\"\nmodel = \"qwen2.5\"\ndebounce_ms = 500").unwrap();

        let cfg = Config::load(file.path()).unwrap();
        assert_eq!(cfg.provider, ProviderKind::Ollama);
        assert_eq!(cfg.model(), "qwen2.5");
        assert_eq!(cfg.timeout_secs, 120);

        let args = Args {
            config: Some(file.path().display().to_string()),
            debounce_ms: Some(1_000),
            save_transcripts: true,
            ..Args::default()
        };
        let cfg = Config::resolve(&args).unwrap();
        assert_eq!(cfg.debounce_ms, 1_000);
        assert_eq!(cfg.model(), "qwen2.5");
        assert!(cfg.transcript_dir().is_some());
    }

    #[test]
    fn switching_provider_drops_the_file_model() {
        let mut cfg = Config { model: Some("qwen2.5".into()), ..Config::default() };
        cfg.apply_args(&Args { provider: Some(ProviderKind::OpenAI), ..Args::default() });
        assert_eq!(cfg.model(), "gpt-4.1-mini");
        assert_eq!(cfg.api_key_env(), "OPENAI_API_KEY");
    }

    #[test]
    fn bad_toml_reports_the_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "debounce_ms = \"soon\"").unwrap();
        let err = format!("{:#}", Config::load(file.path()).unwrap_err());
        assert!(err.contains("parsing"), "{err}");
    }
}

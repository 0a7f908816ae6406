use facematch_core::{MatchOptions, MatchStrategy, DEFAULT_SIMILARITY_THRESHOLD};
use std::path::PathBuf;
use std::str::FromStr;

/// CLI configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory containing `det_10g.onnx` and `w600k_r50.onnx`.
    pub model_dir: PathBuf,
    /// Cosine similarity a face must exceed to count as a reference match.
    pub similarity_threshold: f32,
    /// How detected faces are assigned to references.
    pub strategy: MatchStrategy,
}

impl Config {
    /// Load configuration from `FACEMATCH_*` environment variables with defaults.
    pub fn from_env() -> Self {
        let model_dir = std::env::var("FACEMATCH_MODEL_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| facematch_core::default_model_dir());

        Self {
            model_dir,
            similarity_threshold: env_parse(
                "FACEMATCH_SIMILARITY_THRESHOLD",
                DEFAULT_SIMILARITY_THRESHOLD,
            ),
            strategy: env_parse("FACEMATCH_MATCH_STRATEGY", MatchStrategy::Greedy),
        }
    }

    pub fn match_options(&self) -> MatchOptions {
        MatchOptions {
            threshold: self.similarity_threshold,
            strategy: self.strategy,
        }
    }
}

fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "ignoring unparseable setting");
            default
        }),
        Err(_) => default,
    }
}

use std::env;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;

const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-ada-002";
const DEFAULT_EMBEDDING_DIMENSION: usize = 1536;
const DEFAULT_CHAT_MODEL: &str = "gpt-4o";
const DEFAULT_CHAT_TEMPERATURE: f32 = 0.7;
const DEFAULT_PDF_PATH: &str = "data/RESEARCH PAPER.pdf";
const DEFAULT_INDEX_DIR: &str = "db";
const DEFAULT_CHUNK_SIZE: usize = 1000;
const DEFAULT_CHUNK_OVERLAP: usize = 200;
const DEFAULT_SEARCH_LIMIT: usize = 5;
const DEFAULT_AGENT_MAX_ITERATIONS: usize = 15;

/// Name of the environment variable holding the provider credential.
pub const API_KEY_VARIABLE: &str = "OPENAI_API_KEY";

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the research assistant.
#[derive(Debug, Clone)]
pub struct Config {
    /// Credential for the hosted embedding and chat provider.
    pub openai_api_key: Option<String>,
    /// Base URL of the OpenAI-compatible API, including the version segment.
    pub openai_base_url: String,
    /// Embedding provider used to generate vector representations.
    pub embedding_provider: EmbeddingProvider,
    /// Embedding model identifier passed to the provider.
    pub embedding_model: String,
    /// Dimensionality of vectors produced by the hashing provider.
    pub embedding_dimension: usize,
    /// Chat model used by every agent role.
    pub chat_model: String,
    /// Sampling temperature used by every agent role.
    pub chat_temperature: f32,
    /// Location of the research paper.
    pub pdf_path: PathBuf,
    /// Directory holding the persisted index.
    pub index_dir: PathBuf,
    /// Chunk window size in characters.
    pub chunk_size: usize,
    /// Characters shared by adjacent chunks of the same page.
    pub chunk_overlap: usize,
    /// Number of chunks returned by the retrieval facade.
    pub search_default_limit: usize,
    /// Upper bound on model round trips within a single agent stage.
    pub agent_max_iterations: usize,
}

/// Supported embedding backends.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EmbeddingProvider {
    /// Hosted OpenAI embeddings API.
    OpenAI,
    /// Deterministic local hashing embedder; needs no network access.
    Hashing,
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            openai_api_key: load_env_optional(API_KEY_VARIABLE),
            openai_base_url: load_env_optional("OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            embedding_provider: match load_env_optional("EMBEDDING_PROVIDER") {
                Some(value) => value
                    .parse()
                    .map_err(|()| ConfigError::InvalidValue("EMBEDDING_PROVIDER".to_string()))?,
                None => EmbeddingProvider::OpenAI,
            },
            embedding_model: load_env_optional("EMBEDDING_MODEL")
                .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string()),
            embedding_dimension: load_parsed("EMBEDDING_DIMENSION")?
                .unwrap_or(DEFAULT_EMBEDDING_DIMENSION),
            chat_model: load_env_optional("CHAT_MODEL")
                .unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string()),
            chat_temperature: load_parsed("CHAT_TEMPERATURE")?.unwrap_or(DEFAULT_CHAT_TEMPERATURE),
            pdf_path: load_env_optional("PAPER_PDF_PATH")
                .unwrap_or_else(|| DEFAULT_PDF_PATH.to_string())
                .into(),
            index_dir: load_env_optional("INDEX_DIR")
                .unwrap_or_else(|| DEFAULT_INDEX_DIR.to_string())
                .into(),
            chunk_size: load_parsed("TEXT_SPLITTER_CHUNK_SIZE")?.unwrap_or(DEFAULT_CHUNK_SIZE),
            chunk_overlap: load_parsed("TEXT_SPLITTER_CHUNK_OVERLAP")?
                .unwrap_or(DEFAULT_CHUNK_OVERLAP),
            search_default_limit: load_parsed("SEARCH_DEFAULT_LIMIT")?
                .unwrap_or(DEFAULT_SEARCH_LIMIT),
            agent_max_iterations: load_parsed("AGENT_MAX_ITERATIONS")?
                .unwrap_or(DEFAULT_AGENT_MAX_ITERATIONS),
        })
    }

    /// Whether the provider credential is present and non-blank.
    pub fn has_credentials(&self) -> bool {
        self.openai_api_key
            .as_deref()
            .map(|key| !key.trim().is_empty())
            .unwrap_or(false)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            embedding_provider: EmbeddingProvider::OpenAI,
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            embedding_dimension: DEFAULT_EMBEDDING_DIMENSION,
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            chat_temperature: DEFAULT_CHAT_TEMPERATURE,
            pdf_path: PathBuf::from(DEFAULT_PDF_PATH),
            index_dir: PathBuf::from(DEFAULT_INDEX_DIR),
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            search_default_limit: DEFAULT_SEARCH_LIMIT,
            agent_max_iterations: DEFAULT_AGENT_MAX_ITERATIONS,
        }
    }
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn load_parsed<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    load_env_optional(key)
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue(key.to_string()))
        })
        .transpose()
}

impl std::str::FromStr for EmbeddingProvider {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            "hashing" | "local" => Ok(Self::Hashing),
            _ => Err(()),
        }
    }
}

/// Load `.env` from the working directory into the process environment.
///
/// Runs before tracing is installed so that `RUST_LOG` and `RESEARCH_RAG_LOG_FILE` set there
/// reach the subscriber. Variables already present in the environment win.
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

/// Load a specific env file, returning whether it was read.
pub fn load_dotenv_from(path: &Path) -> bool {
    dotenvy::from_path(path).is_ok()
}

/// Global configuration cache populated during process start.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Load configuration from the environment, apply caller overrides (CLI flags), and install the
/// result in the global cache.
pub fn init_config<F>(apply_overrides: F) -> Result<&'static Config, ConfigError>
where
    F: FnOnce(&mut Config),
{
    load_dotenv();
    let mut config = Config::from_env()?;
    apply_overrides(&mut config);
    tracing::debug!(
        base_url = %config.openai_base_url,
        embedding_provider = ?config.embedding_provider,
        embedding_model = %config.embedding_model,
        chat_model = %config.chat_model,
        pdf = %config.pdf_path.display(),
        index_dir = %config.index_dir.display(),
        "Loaded configuration"
    );
    Ok(CONFIG.get_or_init(|| config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_parses_known_names() {
        assert_eq!("OpenAI".parse(), Ok(EmbeddingProvider::OpenAI));
        assert_eq!("hashing".parse(), Ok(EmbeddingProvider::Hashing));
        assert_eq!(" local ".parse(), Ok(EmbeddingProvider::Hashing));
        assert!("ollama".parse::<EmbeddingProvider>().is_err());
    }

    #[test]
    fn defaults_match_main_index_path() {
        let config = Config::default();
        assert_eq!(config.chunk_size, 1000);
        assert_eq!(config.chunk_overlap, 200);
        assert_eq!(config.search_default_limit, 5);
        assert_eq!(config.chat_model, "gpt-4o");
        assert_eq!(config.index_dir, PathBuf::from("db"));
    }

    fn set_env(key: &str, value: &str) {
        // SAFETY: each test uses its own variable name, so no other thread reads or writes it.
        unsafe { std::env::set_var(key, value) }
    }

    #[test]
    fn unparsable_number_is_invalid_value() {
        set_env("RESEARCH_RAG_TEST_CHUNK_SIZE", "abc");
        let result = load_parsed::<usize>("RESEARCH_RAG_TEST_CHUNK_SIZE");
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue(key)) if key == "RESEARCH_RAG_TEST_CHUNK_SIZE"
        ));

        set_env("RESEARCH_RAG_TEST_TEMPERATURE", " 0.25 ");
        assert_eq!(
            load_parsed::<f32>("RESEARCH_RAG_TEST_TEMPERATURE").expect("parsed"),
            Some(0.25)
        );
        assert_eq!(
            load_parsed::<usize>("RESEARCH_RAG_TEST_UNSET").expect("unset"),
            None
        );
    }

    #[test]
    fn from_env_rejects_unknown_provider() {
        set_env("EMBEDDING_PROVIDER", "ollama");
        let result = Config::from_env();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue(key)) if key == "EMBEDDING_PROVIDER"
        ));
    }

    #[test]
    fn env_file_values_reach_the_environment() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join(".env");
        std::fs::write(&path, "RESEARCH_RAG_TEST_FROM_DOTENV=loaded\n").expect("write");

        assert!(load_dotenv_from(&path));
        assert_eq!(
            load_env_optional("RESEARCH_RAG_TEST_FROM_DOTENV").as_deref(),
            Some("loaded")
        );
        assert!(!load_dotenv_from(&temp.path().join("missing.env")));
    }

    #[test]
    fn blank_credentials_are_treated_as_missing() {
        let mut config = Config::default();
        assert!(!config.has_credentials());
        config.openai_api_key = Some("   ".into());
        assert!(!config.has_credentials());
        config.openai_api_key = Some("sk-test".into());
        assert!(config.has_credentials());
    }
}

/// Typed errors for the crate's seams.
///
/// Pipeline tasks and `run()` use `anyhow::Result`; these enums exist where a
/// caller needs to tell failure modes apart (config validation at startup,
/// speech sink failures that the channel logs and swallows).
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("failed to start speech command `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source:  std::io::Error,
    },
    #[error("failed to interrupt current utterance: {0}")]
    Cancel(#[source] std::io::Error),
    #[error("speech output unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("config serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShellError {
    #[error("config.json not found at {0}")] ConfigMissing(PathBuf),
    #[error("invalid configuration: {0}")] InvalidConfig(String),
    #[error("missing configuration for {0}")] MissingProviderSetting(String),
    #[error("unknown provider: {0}")] UnknownProvider(String),
    #[error("provider error: {0}")] Provider(String),
    #[error("no valid code block found in AI response")] NoCodeBlock,
    #[error("invalid project name: {0:?}")] InvalidName(String),
    #[error("path escapes its base directory: {0}")] PathEscape(PathBuf),
}

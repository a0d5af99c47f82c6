use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use crate::config::{ProviderKind, Settings};
use crate::errors::ShellError;

pub mod anthropic;
pub mod openai;

/// Every AI call is a single request with this timeout.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[async_trait]
pub trait Provider: Send + Sync {
    fn name(&self) -> &str;
    async fn complete(&self, prompt: &str, system_prompt: &str) -> Result<String>;
}

pub type DynProvider = Box<dyn Provider + Send + Sync>;

/// Builds a provider from whatever settings the session currently holds.
pub trait ProviderSource: Send + Sync {
    fn provider(&self, settings: Option<&Settings>) -> Result<DynProvider, ShellError>;
}

/// Production source: picks the wire format named by `active_provider`.
pub struct ConfiguredProviders {
    pub config_path: std::path::PathBuf,
}

impl ProviderSource for ConfiguredProviders {
    fn provider(&self, settings: Option<&Settings>) -> Result<DynProvider, ShellError> {
        let settings = settings.ok_or_else(|| ShellError::ConfigMissing(self.config_path.clone()))?;
        make_provider(settings)
    }
}

pub fn make_provider(settings: &Settings) -> Result<DynProvider, ShellError> {
    let active = settings.active()?;
    tracing::debug!(provider = %active.kind, model = %active.model, "building provider");
    match active.kind {
        ProviderKind::OpenAI => Ok(Box::new(openai::OpenAIProvider::new(
            active.model,
            active.api_key,
            active.endpoint,
            REQUEST_TIMEOUT,
        ))),
        ProviderKind::Anthropic => Ok(Box::new(anthropic::Anthropic::new(
            active.model,
            active.api_key,
            active.endpoint,
            REQUEST_TIMEOUT,
        ))),
    }
}

#[cfg(test)]
pub(crate) mod test_server {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Answers exactly one HTTP request with `status` and `body`, handing the
    /// raw request text back through the join handle.
    pub async fn one_shot(status: u16, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 4096];
            loop {
                let n = sock.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
                if let Some(head_end) = find(&buf, b"\r\n\r\n") {
                    let head = String::from_utf8_lossy(&buf[..head_end]).to_lowercase();
                    let len = head
                        .lines()
                        .find_map(|l| l.strip_prefix("content-length:"))
                        .and_then(|v| v.trim().parse::<usize>().ok())
                        .unwrap_or(0);
                    if buf.len() >= head_end + 4 + len {
                        break;
                    }
                }
            }
            let reply = format!(
                "HTTP/1.1 {status} X\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            sock.write_all(reply.as_bytes()).await.unwrap();
            sock.shutdown().await.ok();
            String::from_utf8_lossy(&buf).to_string()
        });
        (format!("http://{addr}"), handle)
    }

    fn find(hay: &[u8], needle: &[u8]) -> Option<usize> {
        hay.windows(needle.len()).position(|w| w == needle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn make_provider_selects_wire_format() {
        let mut s = Settings::default();
        s.api_keys.insert("openai".into(), "k".into());
        assert_eq!(make_provider(&s).unwrap().name(), "openai");

        s.active_provider = "anthropic".into();
        s.api_keys.insert("anthropic".into(), "k".into());
        assert_eq!(make_provider(&s).unwrap().name(), "anthropic");
    }

    #[test]
    fn configured_source_without_settings_is_config_missing() {
        let src = ConfiguredProviders { config_path: "config.json".into() };
        assert!(matches!(src.provider(None), Err(ShellError::ConfigMissing(_))));
    }
}

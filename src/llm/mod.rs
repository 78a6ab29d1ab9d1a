//! Text generation via rig-core.
//!
//! The workflow engine treats generation as an opaque capability behind
//! [`TextGenerator`]; the production implementation talks to Anthropic
//! through rig-core. Tests substitute scripted generators.

use async_trait::async_trait;
use rig::client::CompletionClient;
use rig::completion::Prompt;
use secrecy::{ExposeSecret, SecretString};

use crate::error::{Error, Result};
use crate::telemetry::spans::start_chat_span;
use tracing::Instrument;

/// Opaque text-generation capability.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Produce a completion for the composite prompt.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Identifier of the model producing the text.
    fn model_id(&self) -> &str;
}

/// Create an Anthropic client from a secret API key.
///
/// # Errors
/// Returns an error if the underlying HTTP client cannot be constructed.
pub fn anthropic_client(
    api_key: &SecretString,
) -> Result<rig::providers::anthropic::Client> {
    rig::providers::anthropic::Client::new(api_key.expose_secret())
        .map_err(|e| Error::Config(format!("failed to create Anthropic client: {e}")))
}

/// Anthropic-backed generator.
pub struct AnthropicGenerator {
    client: rig::providers::anthropic::Client,
    model: String,
}

impl AnthropicGenerator {
    pub fn new(api_key: &SecretString, model: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: anthropic_client(api_key)?,
            model: model.into(),
        })
    }
}

#[async_trait]
impl TextGenerator for AnthropicGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let span = start_chat_span(&self.model, "anthropic");
        let agent = self.client.agent(&self.model).build();
        async move { agent.prompt(prompt).await }
            .instrument(span)
            .await
            .map_err(|e| Error::Execution(format!("completion failed: {e}")))
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

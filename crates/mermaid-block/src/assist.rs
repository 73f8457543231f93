//! AI-assisted authoring: prompt an external text-generation service and pull a Mermaid diagram
//! out of its reply.

use crate::config::GenerationOptions;
use crate::error::AssistError;
use crate::gateway::RenderGateway;
use regex::Regex;
use std::future::Future;
use std::sync::OnceLock;

/// Transport to the AI service. Owned by the host; only the call shape is fixed here.
pub trait TextGenerator {
    /// Returns the generated text, or a description of why the service could not answer.
    fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> impl Future<Output = Result<String, String>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssistMode {
    /// Produce a new diagram; overwrites any existing source.
    Generate,
    /// Modify the existing diagram.
    Edit,
}

impl AssistMode {
    /// `Edit` when there is a diagram to edit, `Generate` otherwise.
    pub fn default_for(current: &str) -> Self {
        if current.trim().is_empty() {
            AssistMode::Generate
        } else {
            AssistMode::Edit
        }
    }

    /// Whether running this mode replaces existing source text.
    pub fn overwrites(self, current: &str) -> bool {
        self == AssistMode::Generate && !current.trim().is_empty()
    }
}

/// Builds the single prompt sent to the service.
pub fn build_prompt(mode: AssistMode, current: &str, instruction: &str) -> String {
    let instruction = instruction.trim();
    let mut prompt = String::new();
    match mode {
        AssistMode::Generate => {
            prompt.push_str("Create a Mermaid diagram based on this description:\n");
            prompt.push_str(instruction);
            prompt.push('\n');
        }
        AssistMode::Edit => {
            prompt.push_str("Modify the following Mermaid diagram.\n\nCurrent diagram:\n```mermaid\n");
            prompt.push_str(current.trim());
            prompt.push_str("\n```\n\nRequested change:\n");
            prompt.push_str(instruction);
            prompt.push('\n');
        }
    }
    prompt.push_str(
        "\nRespond with the complete diagram in a single ```mermaid fenced code block and nothing else.",
    );
    prompt
}

fn fenced_block_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)```[^`\n]*\n(.*?)```").expect("valid regex")
    })
}

/// Content strictly between the first opening fence (with an optional info string such as
/// `mermaid`) and its closing fence, without the surrounding newlines.
pub fn extract_fenced_block(reply: &str) -> Result<String, AssistError> {
    let caps = fenced_block_regex()
        .captures(reply)
        .ok_or(AssistError::Extraction)?;
    let body = caps[1].trim_matches(['\r', '\n']).trim_end();
    if body.trim().is_empty() {
        return Err(AssistError::Extraction);
    }
    Ok(body.to_string())
}

/// Capability handle handed out by the host once the AI integration is known to be available.
#[derive(Debug, Clone)]
pub struct AssistBridge<T> {
    generator: T,
    options: GenerationOptions,
}

impl<T: TextGenerator> AssistBridge<T> {
    pub fn new(generator: T, options: GenerationOptions) -> Self {
        Self { generator, options }
    }

    pub fn options(&self) -> &GenerationOptions {
        &self.options
    }

    /// Asks the service for a diagram and returns the new source text.
    ///
    /// The extracted text must pass `validate`; nothing is retried.
    pub async fn assist<G: RenderGateway>(
        &self,
        gateway: &G,
        mode: AssistMode,
        current: &str,
        instruction: &str,
    ) -> Result<String, AssistError> {
        if mode == AssistMode::Edit && current.trim().is_empty() {
            return Err(AssistError::NothingToEdit);
        }

        let prompt = build_prompt(mode, current, instruction);
        let reply = self
            .generator
            .generate(&prompt, &self.options)
            .await
            .map_err(|message| {
                tracing::warn!(%message, "AI service request failed");
                AssistError::Service(message)
            })?;

        let code = extract_fenced_block(&reply)?;
        if let Err(err) = gateway.validate(&code).await {
            tracing::warn!(error = %err, "AI produced invalid Mermaid syntax");
            return Err(AssistError::InvalidSyntax(err));
        }
        Ok(code)
    }
}

/// Runs [`AssistBridge::assist`] when the host provided the capability.
pub async fn assist_with<T: TextGenerator, G: RenderGateway>(
    bridge: Option<&AssistBridge<T>>,
    gateway: &G,
    mode: AssistMode,
    current: &str,
    instruction: &str,
) -> Result<String, AssistError> {
    let Some(bridge) = bridge else {
        return Err(AssistError::NotConfigured);
    };
    bridge.assist(gateway, mode, current, instruction).await
}

use super::{RenderFailure, RenderGateway, RenderRequest};
use crate::config::{RendererConfig, RendererSettings};
use crate::error::{RenderError, SyntaxError};
use crate::source::RenderOptions;
use regex::Regex;
use std::future::Future;
use std::path::Path;
use std::process::Command;
use std::sync::OnceLock;

/// [`RenderGateway`] backed by the Mermaid CLI (`mmdc`).
///
/// Each call runs its own `mmdc` process on a worker thread with a config file written for that
/// request, so concurrent calls never share renderer configuration.
#[derive(Debug, Clone, Default)]
pub struct MermaidCli {
    settings: RendererSettings,
}

impl MermaidCli {
    pub fn new(settings: RendererSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &RendererSettings {
        &self.settings
    }

    fn run(&self, request: RenderRequest) -> impl Future<Output = Result<String, RenderFailure>> {
        let settings = self.settings.clone();
        let (tx, rx) = futures::channel::oneshot::channel();
        std::thread::spawn(move || {
            let _ = tx.send(run_blocking(&settings, &request));
        });
        async move {
            rx.await.unwrap_or_else(|_| {
                Err(RenderFailure::Render(RenderError::new(
                    "renderer worker exited without a result",
                )))
            })
        }
    }
}

impl RenderGateway for MermaidCli {
    fn validate(&self, text: &str) -> impl Future<Output = Result<(), SyntaxError>> {
        let request = RenderRequest::new(text, RenderOptions::default());
        let run = self.run(request);
        async move {
            match run.await {
                Ok(_) => Ok(()),
                Err(RenderFailure::Syntax(err)) => Err(err),
                // Not a syntax problem; `render` will report it.
                Err(RenderFailure::Render(_)) => Ok(()),
            }
        }
    }

    fn render(&self, request: &RenderRequest) -> impl Future<Output = Result<String, RenderError>> {
        let run = self.run(request.clone());
        async move {
            run.await.map_err(|failure| match failure {
                RenderFailure::Syntax(err) => RenderError::new(err.message),
                RenderFailure::Render(err) => err,
            })
        }
    }

    /// One `mmdc` run: a parse failure during rendering is the validation result.
    fn validate_then_render(
        &self,
        request: &RenderRequest,
    ) -> impl Future<Output = Result<String, RenderFailure>> {
        self.run(request.clone())
    }
}

fn run_blocking(settings: &RendererSettings, request: &RenderRequest) -> Result<String, RenderFailure> {
    let io_failure =
        |what: &str, err: std::io::Error| RenderFailure::Render(RenderError::new(format!("{what}: {err}")));

    let dir = tempfile::tempdir().map_err(|e| io_failure("failed to create scratch dir", e))?;
    let input = dir.path().join("input.mmd");
    let output = dir.path().join("output.svg");
    let config_path = dir.path().join("config.json");

    let config = RendererConfig::for_request(settings, &request.options);
    let config_json = serde_json::to_string(config.as_value())
        .map_err(|e| RenderFailure::Render(RenderError::new(e.to_string())))?;
    std::fs::write(&config_path, config_json)
        .map_err(|e| io_failure("failed to write renderer config", e))?;
    std::fs::write(&input, &request.text)
        .map_err(|e| io_failure("failed to write diagram source", e))?;

    let mut cmd = build_command(settings, request, &input, &output, &config_path);
    tracing::trace!(?cmd, "spawning Mermaid CLI");
    let out = cmd
        .output()
        .map_err(|e| io_failure(&format!("failed to start `{}`", settings.command), e))?;

    if !out.status.success() {
        let stderr = String::from_utf8_lossy(&out.stderr);
        return Err(classify_failure(&stderr));
    }

    std::fs::read_to_string(&output).map_err(|e| io_failure("renderer produced no SVG", e))
}

fn build_command(
    settings: &RendererSettings,
    request: &RenderRequest,
    input: &Path,
    output: &Path,
    config_path: &Path,
) -> Command {
    let mut cmd = Command::new(&settings.command);
    cmd.args(&settings.args)
        .arg("--quiet")
        .arg("--input")
        .arg(input)
        .arg("--output")
        .arg(output)
        .arg("--configFile")
        .arg(config_path)
        .arg("--theme")
        .arg(request.options.theme.as_str())
        .arg("--svgId")
        .arg(&request.id);
    if let Some(puppeteer) = &settings.puppeteer_config {
        cmd.arg("--puppeteerConfigFile").arg(puppeteer);
    }
    cmd
}

fn parse_error_line_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?:Parse|Lexical) error on line (\d+)").expect("valid regex")
    })
}

fn expecting_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"Expecting (.+?), got '([^']*)'").expect("valid regex"))
}

fn is_syntax_failure(text: &str) -> bool {
    parse_error_line_regex().is_match(text)
        || text.contains("No diagram type detected")
        || text.contains("Syntax error in text")
}

/// Keeps the human-readable part of the CLI's stderr (drops the `Error: ` prefix and the
/// JavaScript stack trace).
fn failure_message(stderr: &str) -> String {
    let lines: Vec<&str> = stderr
        .lines()
        .map(str::trim_end)
        .take_while(|line| !line.trim_start().starts_with("at "))
        .filter(|line| !line.trim().is_empty())
        .collect();
    let joined = lines.join("\n");
    let joined = joined.strip_prefix("Error: ").unwrap_or(&joined).trim();
    if joined.is_empty() {
        "renderer exited with an error".to_string()
    } else {
        joined.to_string()
    }
}

/// Maps Mermaid CLI stderr to a typed failure, recovering the parser's line/token hints.
fn classify_failure(stderr: &str) -> RenderFailure {
    let message = failure_message(stderr);
    if !is_syntax_failure(&message) {
        return RenderFailure::Render(RenderError::new(message));
    }

    let mut err = SyntaxError::new(message.clone());
    if let Some(line) = parse_error_line_regex()
        .captures(&message)
        .and_then(|c| c[1].parse::<usize>().ok())
    {
        err = err.with_line(line);
    }
    if let Some(caps) = expecting_regex().captures(&message) {
        let expected = caps[1]
            .split(',')
            .map(|tok| tok.trim().trim_matches('\'').to_string())
            .filter(|tok| !tok.is_empty());
        err = err.with_expected(expected).with_token(&caps[2]);
    }
    RenderFailure::Syntax(err)
}

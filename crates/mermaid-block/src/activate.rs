//! One-shot activation of diagram placeholders in published HTML.

use crate::gateway::{RenderGateway, RenderOutcome, RenderRequest, render_only};
use crate::normalize::normalize_code;
use crate::placeholder::{Placeholder, discover, substitute};
use crate::svg::{enable_dragging, error_panel};
use futures::stream::{self, StreamExt};

/// Placeholders rendered at the same time unless configured otherwise.
pub const DEFAULT_CONCURRENT_RENDERS: usize = 4;

/// What happened to one placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaceholderResult {
    /// Normalized text was empty; the placeholder was left untouched.
    Skipped,
    Rendered { id: String, draggable: bool },
    Failed { id: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivatedPage {
    pub html: String,
    /// One entry per placeholder, in document order.
    pub results: Vec<PlaceholderResult>,
}

impl ActivatedPage {
    pub fn rendered_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| matches!(r, PlaceholderResult::Rendered { .. }))
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| matches!(r, PlaceholderResult::Failed { .. }))
            .count()
    }
}

/// Renders every placeholder of a page once.
///
/// Placeholders are independent: they render concurrently (at most `concurrency` at a time),
/// each with its own request id and display options, and a failure only affects its own
/// placeholder. Substituted placeholders are marked processed, so running the activator on its
/// own output changes nothing.
#[derive(Debug, Clone)]
pub struct PageActivator<G> {
    gateway: G,
    concurrency: usize,
}

impl<G: RenderGateway> PageActivator<G> {
    pub fn new(gateway: G) -> Self {
        Self {
            gateway,
            concurrency: DEFAULT_CONCURRENT_RENDERS,
        }
    }

    /// Caps the number of renders in flight. `0` is treated as `1`.
    pub fn with_concurrency(mut self, limit: usize) -> Self {
        self.concurrency = limit.max(1);
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub async fn activate(&self, html: &str) -> crate::Result<ActivatedPage> {
        let placeholders = discover(html)?;
        tracing::debug!(count = placeholders.len(), "activating diagram placeholders");

        let resolved: Vec<_> = stream::iter(placeholders.iter().map(|p| self.resolve(p)))
            .buffered(self.concurrency)
            .collect()
            .await;
        let (replacements, results): (Vec<_>, Vec<_>) = resolved.into_iter().unzip();

        let html = substitute(html, &replacements)?;
        Ok(ActivatedPage { html, results })
    }

    async fn resolve(&self, placeholder: &Placeholder) -> (Option<String>, PlaceholderResult) {
        let code = normalize_code(&placeholder.raw_text);
        if code.is_empty() {
            return (None, PlaceholderResult::Skipped);
        }

        let request = RenderRequest::new(code, placeholder.options);
        match render_only(&self.gateway, &request).await {
            RenderOutcome::Rendered { svg } => {
                let svg = if placeholder.draggable {
                    enable_dragging(&svg)
                } else {
                    svg
                };
                (
                    Some(svg),
                    PlaceholderResult::Rendered {
                        id: request.id,
                        draggable: placeholder.draggable,
                    },
                )
            }
            RenderOutcome::RenderError(err) => failed(request.id, err.message),
            RenderOutcome::SyntaxError(err) => failed(request.id, err.message),
            RenderOutcome::Empty => (None, PlaceholderResult::Skipped),
        }
    }
}

fn failed(id: String, message: String) -> (Option<String>, PlaceholderResult) {
    tracing::warn!(%id, %message, "placeholder failed to render");
    (
        Some(error_panel(&message)),
        PlaceholderResult::Failed { id, message },
    )
}

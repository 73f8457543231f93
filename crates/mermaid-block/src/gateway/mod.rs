//! Boundary to the external Mermaid renderer.

mod mmdc;

pub use mmdc::MermaidCli;

use crate::error::{RenderError, SyntaxError};
use crate::source::{DiagramSource, RenderOptions};
use crate::svg::make_responsive;
use std::future::Future;

/// One attempt to turn diagram text into SVG.
///
/// Every request carries a freshly generated id; the renderer keys its per-diagram state (and the
/// ids inside the emitted SVG) on it, so ids are never reused across attempts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderRequest {
    pub id: String,
    pub text: String,
    pub options: RenderOptions,
}

impl RenderRequest {
    pub fn new(text: impl Into<String>, options: RenderOptions) -> Self {
        Self {
            id: fresh_render_id(),
            text: text.into(),
            options,
        }
    }

    /// Request for the trimmed text of `source`.
    pub fn for_source(source: &DiagramSource) -> Self {
        Self::new(source.trimmed_text(), source.options())
    }
}

/// `mermaid-` followed by 32 hex digits; valid as an SVG/HTML id and as a CSS selector.
pub fn fresh_render_id() -> String {
    format!("mermaid-{}", uuid::Uuid::new_v4().simple())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
    /// Nothing to render.
    Empty,
    Rendered { svg: String },
    SyntaxError(SyntaxError),
    RenderError(RenderError),
}

impl RenderOutcome {
    pub fn is_rendered(&self) -> bool {
        matches!(self, RenderOutcome::Rendered { .. })
    }
}

/// Why [`RenderGateway::validate_then_render`] produced no SVG.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderFailure {
    Syntax(SyntaxError),
    Render(RenderError),
}

/// The two calls the block needs from a Mermaid implementation.
///
/// Display options are part of [`RenderRequest`], so implementations configure the renderer per
/// call instead of through shared global state.
pub trait RenderGateway {
    /// Syntax-only check.
    fn validate(&self, text: &str) -> impl Future<Output = Result<(), SyntaxError>>;

    /// Renders the request to SVG markup.
    fn render(&self, request: &RenderRequest) -> impl Future<Output = Result<String, RenderError>>;

    /// `validate` followed by `render`; the render only runs when validation passed.
    ///
    /// Renderers that report syntax errors while rendering should override this with a single
    /// call.
    fn validate_then_render(
        &self,
        request: &RenderRequest,
    ) -> impl Future<Output = Result<String, RenderFailure>> {
        async move {
            self.validate(request.text.trim())
                .await
                .map_err(RenderFailure::Syntax)?;
            self.render(request).await.map_err(RenderFailure::Render)
        }
    }
}

/// Interactive pipeline: validate, then render, then make the SVG responsive.
///
/// Empty text never reaches the gateway.
pub async fn validate_and_render<G: RenderGateway>(
    gateway: &G,
    request: &RenderRequest,
) -> RenderOutcome {
    if request.text.trim().is_empty() {
        return RenderOutcome::Empty;
    }

    tracing::debug!(id = %request.id, code = %request.text, "final Mermaid code");
    match gateway.validate_then_render(request).await {
        Ok(svg) => RenderOutcome::Rendered {
            svg: make_responsive(&svg),
        },
        Err(RenderFailure::Syntax(err)) => {
            tracing::debug!(id = %request.id, error = %err, "diagram failed validation");
            RenderOutcome::SyntaxError(err)
        }
        Err(RenderFailure::Render(err)) => {
            tracing::warn!(id = %request.id, error = %err, "failed to render diagram");
            RenderOutcome::RenderError(err)
        }
    }
}

/// Render without a separate validation step (page activation).
pub async fn render_only<G: RenderGateway>(gateway: &G, request: &RenderRequest) -> RenderOutcome {
    if request.text.trim().is_empty() {
        return RenderOutcome::Empty;
    }

    tracing::debug!(id = %request.id, code = %request.text, "final Mermaid code");
    match gateway.render(request).await {
        Ok(svg) => RenderOutcome::Rendered {
            svg: make_responsive(&svg),
        },
        Err(err) => {
            tracing::warn!(id = %request.id, error = %err, "failed to render diagram");
            RenderOutcome::RenderError(err)
        }
    }
}

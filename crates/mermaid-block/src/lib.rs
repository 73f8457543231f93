#![forbid(unsafe_code)]

//! Preview and page-activation controller for a Mermaid chart block.
//!
//! The block lets an author type Mermaid markup, preview it while editing, optionally have an AI
//! service write or revise it, and see it rendered on the published page. Mermaid itself is an
//! external collaborator reached through [`RenderGateway`]; this crate owns the lifecycle around
//! it:
//! - [`PreviewController`]: edit-time state machine (validate, render, display or error), with
//!   stale results from superseded requests dropped
//! - [`PageActivator`]: one-shot substitution of placeholders in published HTML
//! - [`normalize_code`]: repairs arrow syntax mangled by HTML storage
//! - [`AssistBridge`]: prompt building and fenced-block extraction for AI assistance
//!
//! All async APIs are runtime-agnostic (no specific executor required).

pub mod activate;
pub mod assist;
pub mod config;
pub mod drag;
pub mod error;
pub mod gateway;
pub mod normalize;
pub mod placeholder;
pub mod preview;
pub mod source;
pub mod svg;

pub use activate::{ActivatedPage, PageActivator, PlaceholderResult};
pub use assist::{AssistBridge, AssistMode, TextGenerator, assist_with, extract_fenced_block};
pub use config::{
    ActivationSettings, BlockConfig, GenerationOptions, PreviewSettings, RendererConfig,
    RendererSettings,
};
pub use drag::{DragSession, DragTarget, DragTargetKind, Point, Translate};
pub use error::{AssistError, Error, RenderError, Result, SyntaxError};
pub use gateway::{MermaidCli, RenderFailure, RenderGateway, RenderOutcome, RenderRequest};
pub use normalize::normalize_code;
pub use placeholder::{Placeholder, WrapperStyle, render_placeholder};
pub use preview::{
    Completion, PreviewController, PreviewDisplay, PreviewFailure, PreviewState, RenderJob,
    SourceEdit, Surface,
};
pub use source::{DiagramSource, Direction, FontSize, RenderOptions, Theme};

#[cfg(test)]
mod tests;

//! Edit-time preview lifecycle.
//!
//! The controller is sans-IO: edits and surface switches return a [`RenderJob`] when a render
//! should start, the host runs the job against a [`RenderGateway`] (see [`RenderJob::run`]), and
//! feeds the [`Completion`] back through [`PreviewController::complete`]. Only the most recently
//! issued job may change what is displayed; completions of superseded jobs are dropped, which
//! makes out-of-order resolution harmless.

use crate::config::PreviewSettings;
use crate::error::{RenderError, SyntaxError};
use crate::gateway::{RenderGateway, RenderOutcome, RenderRequest, validate_and_render};
use crate::source::{DiagramSource, Direction, FontSize, Theme};
use std::time::{Duration, Instant};

pub const EMPTY_SOURCE_MESSAGE: &str = "Enter some Mermaid diagram code to see a preview.";
pub const RENDERING_MESSAGE: &str = "Rendering diagram...";

/// The two views of the block's editing card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Surface {
    #[default]
    Markup,
    Preview,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceEdit {
    Text(String),
    Theme(Theme),
    FontSize(i64),
    Direction(Direction),
    Draggable(bool),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewFailure {
    Syntax(SyntaxError),
    Render(RenderError),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PreviewState {
    #[default]
    Idle,
    Pending {
        seq: u64,
    },
    Rendered,
    Failed(PreviewFailure),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Error,
}

/// What the preview panel currently shows. Exactly one of these at a time.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PreviewDisplay {
    #[default]
    Blank,
    Notice {
        kind: NoticeKind,
        text: String,
    },
    Diagram {
        svg: String,
    },
}

impl PreviewDisplay {
    fn info(text: &str) -> Self {
        PreviewDisplay::Notice {
            kind: NoticeKind::Info,
            text: text.to_string(),
        }
    }

    fn error(text: String) -> Self {
        PreviewDisplay::Notice {
            kind: NoticeKind::Error,
            text,
        }
    }
}

/// A render the host should run. `seq` identifies it when the result comes back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderJob {
    pub seq: u64,
    pub request: RenderRequest,
}

impl RenderJob {
    pub async fn run<G: RenderGateway>(self, gateway: &G) -> Completion {
        let outcome = validate_and_render(gateway, &self.request).await;
        Completion {
            seq: self.seq,
            outcome,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub seq: u64,
    pub outcome: RenderOutcome,
}

#[derive(Debug)]
pub struct PreviewController {
    source: DiagramSource,
    surface: Surface,
    state: PreviewState,
    display: PreviewDisplay,
    debounce: Duration,
    next_seq: u64,
    /// Job whose completion may still be applied.
    current: Option<u64>,
    /// Deadline of a debounced render that has not been issued yet.
    scheduled: Option<Instant>,
}

impl PreviewController {
    pub fn new(source: DiagramSource) -> Self {
        Self {
            source,
            surface: Surface::Markup,
            state: PreviewState::Idle,
            display: PreviewDisplay::Blank,
            debounce: Duration::ZERO,
            next_seq: 1,
            current: None,
            scheduled: None,
        }
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Applies the `preview` section of [`crate::BlockConfig`].
    pub fn with_settings(self, settings: &PreviewSettings) -> Self {
        self.with_debounce(Duration::from_millis(settings.debounce_ms))
    }

    pub fn source(&self) -> &DiagramSource {
        &self.source
    }

    pub fn surface(&self) -> Surface {
        self.surface
    }

    pub fn state(&self) -> &PreviewState {
        &self.state
    }

    pub fn display(&self) -> &PreviewDisplay {
        &self.display
    }

    /// True while a job has been issued and its result not yet applied.
    pub fn is_busy(&self) -> bool {
        matches!(self.state, PreviewState::Pending { .. })
    }

    /// Overlay shown above the panel while busy.
    pub fn busy_message(&self) -> Option<&'static str> {
        self.is_busy().then_some(RENDERING_MESSAGE)
    }

    pub fn edit(&mut self, edit: SourceEdit) -> Option<RenderJob> {
        self.edit_at(edit, Instant::now())
    }

    /// Applies an edit. Returns a job when a render should start right away.
    ///
    /// Text and display-option edits invalidate any in-flight job. While the preview is hidden,
    /// nothing is issued; showing it again renders the current source.
    pub fn edit_at(&mut self, edit: SourceEdit, now: Instant) -> Option<RenderJob> {
        let affects_render = match edit {
            SourceEdit::Text(text) => {
                let changed = self.source.text != text;
                self.source.text = text;
                changed
            }
            SourceEdit::Theme(theme) => set_if_changed(&mut self.source.theme, theme),
            SourceEdit::FontSize(px) => set_if_changed(&mut self.source.font_size, FontSize::new(px)),
            SourceEdit::Direction(dir) => set_if_changed(&mut self.source.direction, dir),
            SourceEdit::Draggable(draggable) => {
                // Dragging only exists on the published page.
                self.source.draggable = draggable;
                false
            }
        };
        if !affects_render {
            return None;
        }

        self.supersede_in_flight();
        if self.surface != Surface::Preview {
            return None;
        }
        self.schedule(now)
    }

    pub fn show(&mut self, surface: Surface) -> Option<RenderJob> {
        self.show_at(surface, Instant::now())
    }

    /// Switches the visible surface. Switching to the preview always re-renders: display options
    /// may have changed while it was hidden, so nothing is cached across visits.
    pub fn show_at(&mut self, surface: Surface, now: Instant) -> Option<RenderJob> {
        self.surface = surface;
        match surface {
            Surface::Markup => {
                self.scheduled = None;
                None
            }
            Surface::Preview => {
                self.supersede_in_flight();
                self.schedule(now)
            }
        }
    }

    /// Releases a debounced render once its quiet period has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<RenderJob> {
        match self.scheduled {
            Some(deadline) if now >= deadline && self.surface == Surface::Preview => {
                self.scheduled = None;
                self.issue()
            }
            _ => None,
        }
    }

    /// Deadline of the pending debounced render, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.scheduled
    }

    /// Applies a finished job. Returns `false` if the job was superseded and its result dropped.
    pub fn complete(&mut self, completion: Completion) -> bool {
        if self.current != Some(completion.seq) {
            tracing::trace!(seq = completion.seq, "dropping stale preview render");
            return false;
        }
        self.current = None;

        match completion.outcome {
            RenderOutcome::Empty => {
                self.state = PreviewState::Idle;
                self.display = PreviewDisplay::info(EMPTY_SOURCE_MESSAGE);
            }
            RenderOutcome::Rendered { svg } => {
                self.state = PreviewState::Rendered;
                self.display = PreviewDisplay::Diagram { svg };
            }
            RenderOutcome::SyntaxError(err) => {
                self.display = PreviewDisplay::error(syntax_error_text(&err));
                self.state = PreviewState::Failed(PreviewFailure::Syntax(err));
            }
            RenderOutcome::RenderError(err) => {
                self.display = PreviewDisplay::error(format!(
                    "Unable to render diagram: {}",
                    err.message
                ));
                self.state = PreviewState::Failed(PreviewFailure::Render(err));
            }
        }
        true
    }

    /// Issues, runs and applies a render for the current source in one step.
    ///
    /// Convenient when edits cannot interleave with the render (e.g. a CLI); interactive hosts
    /// should drive [`RenderJob::run`] and [`PreviewController::complete`] themselves.
    pub async fn refresh<G: RenderGateway>(&mut self, gateway: &G) -> &PreviewState {
        self.supersede_in_flight();
        self.scheduled = None;
        if let Some(job) = self.issue() {
            let completion = job.run(gateway).await;
            self.complete(completion);
        }
        &self.state
    }

    fn supersede_in_flight(&mut self) {
        if let Some(seq) = self.current.take() {
            tracing::trace!(seq, "superseding in-flight preview render");
        }
        if self.is_busy() {
            self.state = PreviewState::Idle;
        }
    }

    fn schedule(&mut self, now: Instant) -> Option<RenderJob> {
        if self.debounce.is_zero() || self.source.is_empty() {
            self.scheduled = None;
            return self.issue();
        }
        self.scheduled = Some(now + self.debounce);
        None
    }

    fn issue(&mut self) -> Option<RenderJob> {
        if self.source.is_empty() {
            self.state = PreviewState::Idle;
            self.display = PreviewDisplay::info(EMPTY_SOURCE_MESSAGE);
            return None;
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        self.current = Some(seq);
        self.state = PreviewState::Pending { seq };

        let request = RenderRequest::for_source(&self.source);
        tracing::debug!(seq, id = %request.id, "issuing preview render");
        Some(RenderJob { seq, request })
    }
}

fn set_if_changed<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}

fn syntax_error_text(err: &SyntaxError) -> String {
    let mut text = format!(
        "Unable to render diagram: {}. Please check your syntax.",
        err.message
    );
    for line in err.detail_lines() {
        text.push('\n');
        text.push_str(&line);
    }
    text
}

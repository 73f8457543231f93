//! Placeholder markup shared by the server-side render and the page activator.
//!
//! Canonical layout:
//!
//! ```html
//! <div class="wp-block-mermaid-chart-block mermaid-chart-block" data-draggable="false" style="...">
//!   <div class="mermaid" data-theme="dark" data-fontsize="16" data-direction="TB">graph TD
//! A --&gt; B</div>
//! </div>
//! ```
//!
//! The `.mermaid` element inside the block container is the placeholder. Its text content is the
//! raw diagram source; activation replaces its content in place and marks it `data-processed`.

use crate::source::{DiagramSource, Direction, FontSize, RenderOptions, Theme};
use crate::svg::escape_html;
use lol_html::{RewriteStrSettings, element, rewrite_str, text};
use serde_json::Value;
use std::cell::{Cell, RefCell};

pub const CONTAINER_CLASS: &str = "wp-block-mermaid-chart-block";
pub const CONTAINER_SELECTOR: &str = ".wp-block-mermaid-chart-block";
pub const PLACEHOLDER_SELECTOR: &str =
    ".wp-block-mermaid-chart-block .mermaid:not([data-processed])";

/// A diagram location found in published HTML, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    pub index: usize,
    /// Text content as it appears in the markup (entities not decoded).
    pub raw_text: String,
    pub options: RenderOptions,
    pub draggable: bool,
}

/// Finds every unprocessed placeholder in `html`.
///
/// Missing or unrecognized `data-theme` / `data-fontsize` / `data-direction` values fall back to
/// `default` / 16 / `TB`.
pub fn discover(html: &str) -> crate::Result<Vec<Placeholder>> {
    let found: RefCell<Vec<Placeholder>> = RefCell::new(Vec::new());
    let container_draggable = Cell::new(false);

    rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![
                element!(CONTAINER_SELECTOR, |el| {
                    let flag = el.get_attribute("data-draggable");
                    container_draggable.set(flag.as_deref().map(str::trim) == Some("true"));
                    Ok(())
                }),
                element!(PLACEHOLDER_SELECTOR, |el| {
                    let theme = el.get_attribute("data-theme");
                    let font_size = el.get_attribute("data-fontsize");
                    let direction = el.get_attribute("data-direction");
                    let mut found = found.borrow_mut();
                    let index = found.len();
                    found.push(Placeholder {
                        index,
                        raw_text: String::new(),
                        options: RenderOptions {
                            theme: Theme::from_attr(theme.as_deref()),
                            font_size: FontSize::from_attr(font_size.as_deref()),
                            direction: Direction::from_attr(direction.as_deref()),
                        },
                        draggable: container_draggable.get(),
                    });
                    Ok(())
                }),
                text!(PLACEHOLDER_SELECTOR, |chunk| {
                    if let Some(last) = found.borrow_mut().last_mut() {
                        last.raw_text.push_str(chunk.as_str());
                    }
                    Ok(())
                }),
            ],
            ..RewriteStrSettings::new()
        },
    )?;

    Ok(found.into_inner())
}

/// Replaces the content of the `n`-th placeholder with `replacements[n]` (when `Some`) and marks
/// it processed. Placeholders mapped to `None` are left untouched.
pub fn substitute(html: &str, replacements: &[Option<String>]) -> crate::Result<String> {
    let next_index = Cell::new(0usize);

    let out = rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![element!(PLACEHOLDER_SELECTOR, |el| {
                let index = next_index.get();
                next_index.set(index + 1);
                if let Some(Some(content)) = replacements.get(index) {
                    el.set_inner_content(content, lol_html::html_content::ContentType::Html);
                    el.set_attribute("data-processed", "true")?;
                }
                Ok(())
            })],
            ..RewriteStrSettings::new()
        },
    )?;
    Ok(out)
}

/// Presentation of the block wrapper on the published page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrapperStyle {
    pub background_color: String,
    pub padding: u32,
    pub border_style: String,
}

impl Default for WrapperStyle {
    fn default() -> Self {
        Self {
            background_color: "#ffffff".to_string(),
            padding: 16,
            border_style: "dashed".to_string(),
        }
    }
}

impl WrapperStyle {
    /// Reads `backgroundColor`, `padding` and `borderStyle` from the block attributes.
    pub fn from_attributes(attrs: &Value) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| {
            attrs
                .get(key)
                .and_then(Value::as_str)
                .filter(|s| !s.trim().is_empty())
                .map(str::to_string)
        };
        Self {
            background_color: non_empty("backgroundColor").unwrap_or(defaults.background_color),
            padding: attrs
                .get("padding")
                .and_then(Value::as_u64)
                .filter(|p| *p > 0)
                .and_then(|p| u32::try_from(p).ok())
                .unwrap_or(defaults.padding),
            border_style: non_empty("borderStyle").unwrap_or(defaults.border_style),
        }
    }

    fn css(&self) -> String {
        format!(
            "background-color: {}; padding: {}px; border: 1px {} #ccc;",
            self.background_color, self.padding, self.border_style
        )
    }
}

/// Server-side markup for one block. Empty (post-trim) text yields the wrapper without a
/// placeholder, so nothing is activated for it.
pub fn render_placeholder(source: &DiagramSource, style: &WrapperStyle) -> String {
    let mut out = format!(
        r#"<div class="{CONTAINER_CLASS} mermaid-chart-block" data-draggable="{}" style="{}">"#,
        source.draggable,
        escape_html(&style.css()),
    );
    let text = source.trimmed_text();
    if !text.is_empty() {
        out.push_str(&format!(
            r#"<div class="mermaid" data-theme="{}" data-fontsize="{}" data-direction="{}">{}</div>"#,
            source.theme,
            source.font_size,
            source.direction,
            escape_html(text),
        ));
    }
    out.push_str("</div>");
    out
}

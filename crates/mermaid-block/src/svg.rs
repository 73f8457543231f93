//! Post-processing applied to renderer output before it is injected into a page.

use lol_html::{RewriteStrSettings, element, rewrite_str};
use std::cell::Cell;

const RESPONSIVE_STYLE: [(&str, &str); 4] = [
    ("max-width", "100%"),
    ("height", "auto"),
    ("display", "block"),
    ("margin", "0 auto"),
];

const MOVE_CURSOR: [(&str, &str); 1] = [("cursor", "move")];

/// Replaces (or adds) the given declarations in an inline `style` value, keeping the others.
pub(crate) fn merge_style(existing: Option<&str>, overrides: &[(&str, &str)]) -> String {
    let mut decls: Vec<String> = existing
        .unwrap_or_default()
        .split(';')
        .map(str::trim)
        .filter(|decl| !decl.is_empty())
        .filter(|decl| {
            let name = decl.split(':').next().unwrap_or_default().trim();
            !overrides
                .iter()
                .any(|(key, _)| name.eq_ignore_ascii_case(key))
        })
        .map(str::to_string)
        .collect();
    decls.extend(overrides.iter().map(|(key, value)| format!("{key}: {value}")));
    let mut out = decls.join("; ");
    out.push(';');
    out
}

/// Bounds the root `<svg>` to its container width with automatic height, centered.
///
/// Falls back to the input unchanged if the markup cannot be rewritten.
pub fn make_responsive(svg: &str) -> String {
    let root_done = Cell::new(false);
    let rewritten = rewrite_str(
        svg,
        RewriteStrSettings {
            element_content_handlers: vec![element!("svg", |el| {
                if root_done.replace(true) {
                    return Ok(());
                }
                let style = merge_style(el.get_attribute("style").as_deref(), &RESPONSIVE_STYLE);
                el.set_attribute("style", &style)?;
                Ok(())
            })],
            ..RewriteStrSettings::new()
        },
    );
    match rewritten {
        Ok(out) => out,
        Err(err) => {
            tracing::warn!(error = %err, "could not post-process SVG; using it unchanged");
            svg.to_string()
        }
    }
}

/// Marks the diagram as draggable: the root `<svg>` gets `data-draggable="true"` and every node
/// and cluster gets a move cursor. The pointer handling itself lives in [`crate::drag`].
pub fn enable_dragging(svg: &str) -> String {
    let root_done = Cell::new(false);
    let rewritten = rewrite_str(
        svg,
        RewriteStrSettings {
            element_content_handlers: vec![
                element!("svg", |el| {
                    if !root_done.replace(true) {
                        el.set_attribute("data-draggable", "true")?;
                    }
                    Ok(())
                }),
                element!(".node", |el| {
                    let style = merge_style(el.get_attribute("style").as_deref(), &MOVE_CURSOR);
                    el.set_attribute("style", &style)?;
                    Ok(())
                }),
                element!(".cluster", |el| {
                    let style = merge_style(el.get_attribute("style").as_deref(), &MOVE_CURSOR);
                    el.set_attribute("style", &style)?;
                    Ok(())
                }),
            ],
            ..RewriteStrSettings::new()
        },
    );
    match rewritten {
        Ok(out) => out,
        Err(err) => {
            tracing::warn!(error = %err, "could not enable dragging; using SVG unchanged");
            svg.to_string()
        }
    }
}

pub(crate) fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Visible error node that replaces a placeholder whose diagram failed to render.
pub fn error_panel(message: &str) -> String {
    format!(
        r#"<div class="mermaid-error" role="alert">Failed to render diagram: {}</div>"#,
        escape_html(message)
    )
}

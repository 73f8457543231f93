use futures::executor::block_on;
use mermaid_block::{
    DiagramSource, PageActivator, PlaceholderResult, PreviewController, PreviewDisplay,
    PreviewState, RenderError, RenderGateway, RenderRequest, SourceEdit, Surface, SyntaxError,
    Theme, WrapperStyle, normalize_code, render_placeholder,
};
use serde_json::json;
use std::future::{Future, ready};

/// Accepts anything that starts with a known diagram keyword.
struct KeywordGateway;

impl RenderGateway for KeywordGateway {
    fn validate(&self, text: &str) -> impl Future<Output = Result<(), SyntaxError>> {
        let known = ["graph", "flowchart", "sequenceDiagram"]
            .iter()
            .any(|kw| text.trim_start().starts_with(kw));
        ready(if known {
            Ok(())
        } else {
            Err(SyntaxError::new("No diagram type detected").with_line(1))
        })
    }

    fn render(&self, request: &RenderRequest) -> impl Future<Output = Result<String, RenderError>> {
        ready(if request.text.contains("crash") {
            Err(RenderError::new("renderer crashed"))
        } else {
            Ok(format!(
                r#"<svg id="{}" style="max-width: 200px;"><g class="node" id="n0"></g></svg>"#,
                request.id
            ))
        })
    }
}

#[test]
fn saved_block_renders_on_the_published_page() {
    let attrs = json!({
        "content": "graph LR\nA –> B",
        "theme": "dark",
        "fontSize": 18,
        "diagramDirection": "LR",
        "isDraggable": true,
        "padding": 24
    });
    let source = DiagramSource::from_attributes(&attrs);
    let markup = render_placeholder(&source, &WrapperStyle::from_attributes(&attrs));
    assert!(markup.contains("padding: 24px"), "{markup}");

    let page = format!("<article><p>Intro</p>{markup}</article>");
    let activated = block_on(PageActivator::new(KeywordGateway).activate(&page)).expect("activate");

    assert_eq!(activated.rendered_count(), 1);
    assert!(matches!(
        &activated.results[0],
        PlaceholderResult::Rendered { draggable: true, .. }
    ));
    assert!(activated.html.starts_with("<article><p>Intro</p>"));
    assert!(activated.html.contains("max-width: 100%"), "{}", activated.html);
    assert!(activated.html.contains("cursor: move"), "{}", activated.html);
    assert!(!activated.html.contains("–"), "{}", activated.html);
}

#[test]
fn failed_block_does_not_block_its_neighbours() {
    let good = render_placeholder(
        &DiagramSource::new("graph TD\nA-->B"),
        &WrapperStyle::default(),
    );
    let bad = render_placeholder(
        &DiagramSource::new("graph TD\ncrash-->B"),
        &WrapperStyle::default(),
    );
    let page = format!("{bad}{good}");

    let activated = block_on(PageActivator::new(KeywordGateway).activate(&page)).expect("activate");
    assert_eq!(activated.failed_count(), 1);
    assert_eq!(activated.rendered_count(), 1);
    assert!(activated.html.contains("renderer crashed"));
    assert!(activated.html.contains("<svg"));
}

#[test]
fn editor_preview_follows_the_author() {
    let gateway = KeywordGateway;
    let mut controller = PreviewController::new(DiagramSource::new("graph TD\nA-->B"));

    controller.show(Surface::Preview);
    block_on(controller.refresh(&gateway));
    assert_eq!(controller.state(), &PreviewState::Rendered);

    let job = controller
        .edit(SourceEdit::Text("hello world".to_string()))
        .expect("job");
    controller.complete(block_on(job.run(&gateway)));
    match controller.display() {
        PreviewDisplay::Notice { text, .. } => {
            assert!(text.contains("No diagram type detected"), "{text}");
            assert!(text.contains("Line: 1"), "{text}");
        }
        other => panic!("expected an error notice, got {other:?}"),
    }

    let job = controller
        .edit(SourceEdit::Text(normalize_code("flowchart LR\nA—>B")))
        .expect("job");
    assert_eq!(job.request.text, "flowchart LR\nA --> B");
    let job = controller.edit(SourceEdit::Theme(Theme::Forest)).expect("job");
    controller.complete(block_on(job.run(&gateway)));
    assert_eq!(controller.state(), &PreviewState::Rendered);
    assert_eq!(controller.source().theme, Theme::Forest);
}

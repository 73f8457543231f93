use crate::error::{RenderError, SyntaxError};
use crate::gateway::{RenderGateway, RenderRequest};
use std::cell::{Cell, RefCell};
use std::future::{Future, ready};

mod assist;

/// In-memory renderer. Text containing a registered marker fails validation or rendering; all
/// other text renders to a tiny SVG echoing the request id, theme and text.
#[derive(Default)]
pub(crate) struct ScriptedGateway {
    invalid: Vec<(String, SyntaxError)>,
    failing: Vec<(String, RenderError)>,
    validations: Cell<usize>,
    renders: RefCell<Vec<RenderRequest>>,
}

impl ScriptedGateway {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn reject_syntax(mut self, marker: &str, err: SyntaxError) -> Self {
        self.invalid.push((marker.to_string(), err));
        self
    }

    pub(crate) fn fail_render(mut self, marker: &str, message: &str) -> Self {
        self.failing
            .push((marker.to_string(), RenderError::new(message)));
        self
    }

    pub(crate) fn validations(&self) -> usize {
        self.validations.get()
    }

    pub(crate) fn renders(&self) -> Vec<RenderRequest> {
        self.renders.borrow().clone()
    }
}

impl RenderGateway for ScriptedGateway {
    fn validate(&self, text: &str) -> impl Future<Output = Result<(), SyntaxError>> {
        self.validations.set(self.validations.get() + 1);
        let verdict = self
            .invalid
            .iter()
            .find(|(marker, _)| text.contains(marker.as_str()))
            .map(|(_, err)| err.clone());
        ready(match verdict {
            Some(err) => Err(err),
            None => Ok(()),
        })
    }

    fn render(&self, request: &RenderRequest) -> impl Future<Output = Result<String, RenderError>> {
        self.renders.borrow_mut().push(request.clone());
        let failure = self
            .failing
            .iter()
            .find(|(marker, _)| request.text.contains(marker.as_str()))
            .map(|(_, err)| err.clone());
        ready(match failure {
            Some(err) => Err(err),
            None => Ok(fake_svg(request)),
        })
    }
}

pub(crate) fn fake_svg(request: &RenderRequest) -> String {
    format!(
        r#"<svg id="{}" style="max-width: 320px;" data-theme="{}"><g class="node" id="flowchart-A-0"><text>{}</text></g><g class="edgePaths"></g></svg>"#,
        request.id,
        request.options.theme,
        crate::svg::escape_html(&request.text),
    )
}

use super::ScriptedGateway;
use crate::assist::{
    AssistBridge, AssistMode, TextGenerator, assist_with, build_prompt, extract_fenced_block,
};
use crate::config::GenerationOptions;
use crate::error::{AssistError, SyntaxError};
use crate::preview::{PreviewController, SourceEdit, Surface};
use crate::source::DiagramSource;
use futures::executor::block_on;
use std::cell::RefCell;
use std::future::{Future, ready};

struct CannedGenerator {
    reply: Result<String, String>,
    prompts: RefCell<Vec<String>>,
}

impl CannedGenerator {
    fn replying(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            prompts: RefCell::new(Vec::new()),
        }
    }

    fn failing(message: &str) -> Self {
        Self {
            reply: Err(message.to_string()),
            prompts: RefCell::new(Vec::new()),
        }
    }
}

impl TextGenerator for CannedGenerator {
    fn generate(
        &self,
        prompt: &str,
        _options: &GenerationOptions,
    ) -> impl Future<Output = Result<String, String>> {
        self.prompts.borrow_mut().push(prompt.to_string());
        ready(self.reply.clone())
    }
}

#[test]
fn extracts_exactly_the_fenced_content() {
    let reply = "Sure! ```mermaid\nflowchart TD\nA-->B\n```";
    assert_eq!(
        extract_fenced_block(reply).expect("block"),
        "flowchart TD\nA-->B"
    );
}

#[test]
fn extraction_accepts_bare_fences_and_takes_the_first_block() {
    let reply = "```\ngraph LR\nX-->Y\n```\nand also\n```mermaid\ngraph TD\nZ-->W\n```";
    assert_eq!(extract_fenced_block(reply).expect("block"), "graph LR\nX-->Y");
}

#[test]
fn extraction_fails_without_a_fence() {
    assert_eq!(
        extract_fenced_block("flowchart TD\nA-->B"),
        Err(AssistError::Extraction)
    );
    assert_eq!(
        extract_fenced_block("```mermaid\n\n```"),
        Err(AssistError::Extraction)
    );
    assert_eq!(
        extract_fenced_block("```mermaid\nflowchart TD"),
        Err(AssistError::Extraction)
    );
}

#[test]
fn mode_defaults_follow_the_current_source() {
    assert_eq!(AssistMode::default_for(""), AssistMode::Generate);
    assert_eq!(AssistMode::default_for("  \n"), AssistMode::Generate);
    assert_eq!(AssistMode::default_for("graph TD\nA-->B"), AssistMode::Edit);

    assert!(AssistMode::Generate.overwrites("graph TD\nA-->B"));
    assert!(!AssistMode::Generate.overwrites(""));
    assert!(!AssistMode::Edit.overwrites("graph TD\nA-->B"));
}

#[test]
fn prompts_carry_the_instruction_and_current_code() {
    let generate = build_prompt(AssistMode::Generate, "", "  a login flow ");
    assert!(
        generate.starts_with("Create a Mermaid diagram based on this description:\na login flow\n"),
        "{generate}"
    );
    assert!(generate.contains("```mermaid fenced code block"));

    let edit = build_prompt(AssistMode::Edit, "\ngraph TD\nA-->B\n", "add a node C");
    assert!(edit.contains("```mermaid\ngraph TD\nA-->B\n```"), "{edit}");
    assert!(edit.contains("Requested change:\nadd a node C"), "{edit}");
}

#[test]
fn generated_diagram_is_validated_and_returned() {
    let gateway = ScriptedGateway::new();
    let bridge = AssistBridge::new(
        CannedGenerator::replying("Sure! ```mermaid\nflowchart TD\nA-->B\n```"),
        GenerationOptions::default(),
    );

    let code = block_on(bridge.assist(&gateway, AssistMode::Generate, "", "two boxes"))
        .expect("assist");
    assert_eq!(code, "flowchart TD\nA-->B");
    assert_eq!(gateway.validations(), 1);
    assert!(gateway.renders().is_empty());
}

#[test]
fn invalid_generated_syntax_is_rejected() {
    let err = SyntaxError::new("Parse error on line 1").with_line(1);
    let gateway = ScriptedGateway::new().reject_syntax("nonsense", err.clone());
    let bridge = AssistBridge::new(
        CannedGenerator::replying("```mermaid\nnonsense here\n```"),
        GenerationOptions::default(),
    );

    let result = block_on(bridge.assist(&gateway, AssistMode::Generate, "", "anything"));
    assert_eq!(result, Err(AssistError::InvalidSyntax(err)));
}

#[test]
fn service_failures_are_reported() {
    let gateway = ScriptedGateway::new();
    let bridge = AssistBridge::new(
        CannedGenerator::failing("quota exceeded"),
        GenerationOptions::default(),
    );

    let result = block_on(bridge.assist(&gateway, AssistMode::Generate, "", "anything"));
    assert_eq!(result, Err(AssistError::Service("quota exceeded".to_string())));
    assert_eq!(gateway.validations(), 0);
}

#[test]
fn reply_without_fence_is_an_extraction_error() {
    let gateway = ScriptedGateway::new();
    let bridge = AssistBridge::new(
        CannedGenerator::replying("I cannot draw that."),
        GenerationOptions::default(),
    );
    let result = block_on(bridge.assist(&gateway, AssistMode::Generate, "", "anything"));
    assert_eq!(result, Err(AssistError::Extraction));
}

#[test]
fn editing_requires_existing_source() {
    let gateway = ScriptedGateway::new();
    let generator = CannedGenerator::replying("```\ngraph TD\nA-->B\n```");
    let bridge = AssistBridge::new(generator, GenerationOptions::default());

    let result = block_on(bridge.assist(&gateway, AssistMode::Edit, "   ", "add C"));
    assert_eq!(result, Err(AssistError::NothingToEdit));
}

#[test]
fn missing_capability_is_not_configured() {
    let gateway = ScriptedGateway::new();
    let result = block_on(assist_with::<CannedGenerator, _>(
        None,
        &gateway,
        AssistMode::Generate,
        "",
        "anything",
    ));
    assert_eq!(result, Err(AssistError::NotConfigured));
}

#[test]
fn accepted_text_replaces_the_source_and_rerenders_the_preview() {
    let gateway = ScriptedGateway::new();
    let bridge = AssistBridge::new(
        CannedGenerator::replying("```mermaid\ngraph TD\nA-->B\nB-->C\n```"),
        GenerationOptions::default(),
    );
    let mut controller = PreviewController::new(DiagramSource::new("graph TD\nA-->B"));
    controller.show(Surface::Preview);

    let current = controller.source().text.clone();
    let mode = AssistMode::default_for(&current);
    let code = block_on(assist_with(Some(&bridge), &gateway, mode, &current, "add C"))
        .expect("assist");

    let job = controller
        .edit(SourceEdit::Text(code.clone()))
        .expect("edit triggers a render");
    assert_eq!(job.request.text, code);
    assert!(controller.complete(block_on(job.run(&gateway))));
    assert_eq!(controller.source().text, "graph TD\nA-->B\nB-->C");
}

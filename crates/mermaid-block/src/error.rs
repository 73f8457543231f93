pub type Result<T> = std::result::Result<T, Error>;

/// Malformed diagram source, as reported by the renderer's parser.
///
/// `token`, `expected` and `line` mirror the hash Mermaid attaches to its parse errors and are
/// only present when the renderer supplied them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct SyntaxError {
    pub message: String,
    pub token: Option<String>,
    pub expected: Vec<String>,
    pub line: Option<usize>,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            token: None,
            expected: Vec::new(),
            line: None,
        }
    }

    pub fn with_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_expected<I, S>(mut self, expected: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.expected = expected.into_iter().map(Into::into).collect();
        self
    }

    /// `Expected: …` / `Found: …` / `Line: …` hint lines, in that order.
    pub fn detail_lines(&self) -> Vec<String> {
        let mut details = Vec::new();
        if !self.expected.is_empty() {
            details.push(format!("Expected: {}", self.expected.join(", ")));
        }
        if let Some(token) = &self.token {
            details.push(format!("Found: {token}"));
        }
        if let Some(line) = self.line {
            details.push(format!("Line: {line}"));
        }
        details
    }
}

/// The renderer accepted the syntax but could not produce output.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct RenderError {
    pub message: String,
}

impl RenderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssistError {
    #[error("AI service request failed: {0}")]
    Service(String),

    #[error("AI reply did not contain a fenced Mermaid code block")]
    Extraction,

    #[error("AI produced invalid syntax: {0}")]
    InvalidSyntax(SyntaxError),

    #[error("AI services are not configured")]
    NotConfigured,

    #[error("Edit mode requires an existing diagram")]
    NothingToEdit,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration JSON: {0}")]
    Config(#[from] serde_json::Error),

    #[error("HTML rewrite failed: {message}")]
    Rewrite { message: String },

    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Assist(#[from] AssistError),
}

impl From<lol_html::errors::RewritingError> for Error {
    fn from(value: lol_html::errors::RewritingError) -> Self {
        Self::Rewrite {
            message: value.to_string(),
        }
    }
}

use std::fmt::{Debug, Display};

/// Failure type shared by the whole export pipeline.
///
/// Carries a [`ErrorKind`] describing which stage failed plus a chain of
/// human-readable context strings. Context is pushed at each level an error
/// is surfaced through, and displayed outermost-first.
pub struct Error {
    kind: ErrorKind,
    context: Vec<String>,
}

pub enum ErrorKind {
    /// Malformed or non-object request payload. Caller-fixable, never retried.
    BadRequest(String),
    /// A token that cannot be reversed to structured text.
    MalformedToken(String),
    /// A token that decodes to text which is not a well-formed document.
    InvalidDocument(String),
    /// Transient navigation/network failure, retried up to a fixed bound.
    Navigation(String),
    /// The page's content root never appeared within the wait timeout.
    RenderTimeout(String),
    /// The browser session could not be established.
    Session(fantoccini::error::NewSessionError),
    /// PDF capture itself failed.
    Capture(fantoccini::error::CmdError),
    /// Template rendering failed.
    Template(minijinja::Error),
    Io(std::io::Error),
    Other(String),
}

pub trait AddContext<T> {
    fn add_context(self, ctx: &str) -> Result<T, Error>;
}

impl Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut context = self.context.clone();
        context.reverse();
        let context = if context.is_empty() {
            String::from("no context")
        } else {
            context.join(" -> ")
        };
        write!(f, "{}: {context}", self.kind_name())
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Error {
            context: vec![format!("{:?}", value)],
            kind: ErrorKind::Io(value),
        }
    }
}

impl From<fantoccini::error::NewSessionError> for Error {
    fn from(value: fantoccini::error::NewSessionError) -> Self {
        Error {
            context: vec![format!("{:?}", value)],
            kind: ErrorKind::Session(value),
        }
    }
}

impl From<fantoccini::error::PrintConfigurationError> for Error {
    fn from(value: fantoccini::error::PrintConfigurationError) -> Self {
        Error {
            context: vec![format!("{:?}", value)],
            kind: ErrorKind::Other(format!("{:?}", value)),
        }
    }
}

impl From<minijinja::Error> for Error {
    fn from(value: minijinja::Error) -> Self {
        Error {
            context: vec![value.to_string()],
            kind: ErrorKind::Template(value),
        }
    }
}

impl From<String> for Error {
    fn from(value: String) -> Self {
        Error {
            context: vec![value.to_string()],
            kind: ErrorKind::Other(value),
        }
    }
}

impl Error {
    pub fn bad_request(detail: impl Into<String>) -> Self {
        let detail = detail.into();
        Error {
            context: vec![detail.clone()],
            kind: ErrorKind::BadRequest(detail),
        }
    }

    pub fn malformed_token(detail: impl Into<String>) -> Self {
        let detail = detail.into();
        Error {
            context: vec![detail.clone()],
            kind: ErrorKind::MalformedToken(detail),
        }
    }

    pub fn invalid_document(detail: impl Into<String>) -> Self {
        let detail = detail.into();
        Error {
            context: vec![detail.clone()],
            kind: ErrorKind::InvalidDocument(detail),
        }
    }

    pub fn navigation(detail: impl Into<String>) -> Self {
        let detail = detail.into();
        Error {
            context: vec![detail.clone()],
            kind: ErrorKind::Navigation(detail),
        }
    }

    pub fn render_timeout(detail: impl Into<String>) -> Self {
        let detail = detail.into();
        Error {
            context: vec![detail.clone()],
            kind: ErrorKind::RenderTimeout(detail),
        }
    }

    pub fn capture(source: fantoccini::error::CmdError) -> Self {
        Error {
            context: vec![format!("{:?}", source)],
            kind: ErrorKind::Capture(source),
        }
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Machine-readable failure kind, used as the `kind` field of JSON error
    /// bodies. Anything not caller-fixable or retry-specific collapses to
    /// `export_failure`.
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            ErrorKind::BadRequest(_) => "bad_request",
            ErrorKind::MalformedToken(_) => "malformed_token",
            ErrorKind::InvalidDocument(_) => "invalid_document",
            ErrorKind::Navigation(_) => "navigation_error",
            ErrorKind::RenderTimeout(_) => "render_timeout",
            ErrorKind::Session(_)
            | ErrorKind::Capture(_)
            | ErrorKind::Template(_)
            | ErrorKind::Io(_)
            | ErrorKind::Other(_) => "export_failure",
        }
    }

    /// Add more context to the given error. This context will ultimately be
    /// displayed to the caller and could be useful for correcting bad input
    /// or diagnosing a broken rendering environment.
    ///
    /// Generally a single layer of context should be added for every level
    /// that an error is surfaced.
    pub fn add_context(self, context: &str) -> Error {
        let mut existing = self.context.clone();
        existing.push(context.to_string());
        Self {
            context: existing,
            ..self
        }
    }
}

impl<T> AddContext<T> for Result<T, Error> {
    fn add_context(self, ctx: &str) -> Result<T, Error> {
        match self {
            Ok(d) => Ok(d),
            Err(e) => Err(e.add_context(ctx)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_shows_kind_and_context_outermost_first() {
        let err = Error::navigation("connection refused")
            .add_context("navigating to print page")
            .add_context("exporting pdf");
        let text = err.to_string();
        assert!(text.starts_with("navigation_error: exporting pdf -> "));
        assert!(text.ends_with("connection refused"));
    }

    #[test]
    fn kind_names_match_taxonomy() {
        assert_eq!(Error::bad_request("x").kind_name(), "bad_request");
        assert_eq!(Error::malformed_token("x").kind_name(), "malformed_token");
        assert_eq!(Error::invalid_document("x").kind_name(), "invalid_document");
        assert_eq!(Error::render_timeout("x").kind_name(), "render_timeout");
        assert_eq!(Error::from(String::from("x")).kind_name(), "export_failure");
    }
}

// alias-cli/src/output.rs
use alias_sync::{Alias, ErrorKind, ErrorNotification};
use serde::Serialize;
use std::io::IsTerminal;

/// Output format option
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Auto-detect based on TTY
    Auto,
    /// Force JSON output
    Json,
    /// Force human-readable output
    Human,
}

impl OutputFormat {
    pub fn is_human(&self) -> bool {
        match self {
            Self::Json => false,
            Self::Human => true,
            Self::Auto => std::io::stdout().is_terminal(),
        }
    }
}

/// Trait for types that can be formatted for output
pub trait Formattable {
    /// Format as JSON string
    fn to_json(&self) -> String;

    /// Format as human-readable string
    fn to_human(&self) -> String;
}

/// Format output based on the specified format
pub fn format_output<T: Formattable>(data: &T, format: OutputFormat) -> String {
    if format.is_human() {
        data.to_human()
    } else {
        data.to_json()
    }
}

/// Standard JSON response envelope
#[derive(Debug, Serialize)]
pub struct Response<T> {
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    meta: Option<Meta>,
}

impl<T> Response<T> {
    pub fn ok(result: T) -> Self {
        Self {
            ok: true,
            result: Some(result),
            error: None,
            meta: None,
        }
    }

    pub fn ok_with_meta(result: T, meta: Meta) -> Self {
        Self {
            ok: true,
            result: Some(result),
            error: None,
            meta: Some(meta),
        }
    }

    pub fn error(error: ErrorResponse) -> Response<()> {
        Response::<()> {
            ok: false,
            result: None,
            error: Some(error),
            meta: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    #[serde(rename = "type")]
    type_: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    retryable: Option<bool>,
}

impl ErrorResponse {
    pub fn safety_rejected(message: String) -> Self {
        Self {
            type_: "safety_rejected".to_string(),
            message,
            retryable: Some(false),
        }
    }

    pub fn not_found(message: String) -> Self {
        Self {
            type_: "not_found".to_string(),
            message,
            retryable: Some(false),
        }
    }

    pub fn validation_failed(message: String) -> Self {
        Self {
            type_: "validation_failed".to_string(),
            message,
            retryable: Some(false),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn exit_code(&self) -> ExitCode {
        match self.type_.as_str() {
            "network_error" => ExitCode::TransientError,
            "safety_rejected" => ExitCode::SafetyRejected,
            _ => ExitCode::PermanentError,
        }
    }
}

impl From<&ErrorNotification> for ErrorResponse {
    fn from(err: &ErrorNotification) -> Self {
        Self {
            type_: err.kind.to_string(),
            message: err.message.clone(),
            retryable: Some(err.kind.is_retryable()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Meta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_more: Option<bool>,
}

/// Exit codes for agent decision making
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    TransientError = 1,
    PermanentError = 2,
    SafetyRejected = 3,
}

impl ExitCode {
    pub fn code(&self) -> i32 {
        *self as i32
    }

    pub fn for_kind(kind: ErrorKind) -> Self {
        if kind.is_retryable() {
            Self::TransientError
        } else {
            Self::PermanentError
        }
    }
}

/// Alias rows for `list`
pub struct AliasTable<'a> {
    pub aliases: &'a [Alias],
    pub meta: Meta,
}

impl Formattable for AliasTable<'_> {
    fn to_json(&self) -> String {
        serde_json::to_string(&Response::ok_with_meta(self.aliases, self.meta.clone()))
            .unwrap_or_default()
    }

    fn to_human(&self) -> String {
        if self.aliases.is_empty() {
            return "No aliases".to_string();
        }
        self.aliases
            .iter()
            .map(alias_line)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn alias_line(alias: &Alias) -> String {
    let state = if alias.enabled { "on " } else { "off" };
    let created = alias
        .created_at()
        .map(|t| t.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".to_string());
    let mut line = format!(
        "{:>8}  [{}]  {}  {}  fwd {} / blk {} / rep {}",
        alias.id,
        state,
        alias.email,
        created,
        alias.metadata.nb_forward,
        alias.metadata.nb_block,
        alias.metadata.nb_reply
    );
    if let Some(note) = alias.metadata.note.as_deref().filter(|n| !n.is_empty()) {
        line.push_str(&format!("  ({})", note));
    }
    line
}

// Print response to stdout
pub fn print_response<T: Serialize>(resp: &Response<T>) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string(resp)?);
    Ok(())
}

/// Report an error in the selected format and return its exit code
pub fn report_error(error: ErrorResponse, format: OutputFormat) -> anyhow::Result<ExitCode> {
    let code = error.exit_code();
    if format.is_human() {
        print_error(error.message());
    } else {
        print_response(&Response::<()>::error(error))?;
    }
    Ok(code)
}

/// Print a styled success message
pub fn print_success(message: &str) {
    let term = console::Term::stdout();
    let _ = term.write_str(&format!("{} {}\n", console::style("✓").green(), message));
}

/// Print a styled error message
pub fn print_error(message: &str) {
    let term = console::Term::stderr();
    let _ = term.write_str(&format!("{} {}\n", console::style("Error:").red(), message));
}

/// Print a styled warning message
pub fn print_warning(message: &str) {
    let term = console::Term::stderr();
    let _ = term.write_str(&format!("{} {}\n", console::style("Warning:").yellow(), message));
}

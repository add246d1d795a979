use miette::Diagnostic;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// The step of an engine session an error originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Open,
    Clear,
    Submit,
    VerifyCount,
    ConfigureOutput,
    Generate,
    Lookup,
    Info,
    Export,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Open => "open",
            Stage::Clear => "clear",
            Stage::Submit => "submit",
            Stage::VerifyCount => "verify_count",
            Stage::ConfigureOutput => "configure_output",
            Stage::Generate => "generate",
            Stage::Lookup => "lookup",
            Stage::Info => "info",
            Stage::Export => "export",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Diagnostic)]
pub enum GatewayError {
    #[error("required asset not found: {}", path.display())]
    #[diagnostic(code(gateway::asset_missing))]
    AssetMissing { path: PathBuf },

    #[error("configuration template not found: {}", path.display())]
    #[diagnostic(code(gateway::config_missing))]
    ConfigMissing { path: PathBuf },

    #[error("malformed configuration at line {line}: {reason}")]
    #[diagnostic(code(gateway::config_parse))]
    ConfigParse { line: usize, reason: String },

    #[error("engine failed to initialize (code {code}): {message}")]
    #[diagnostic(
        code(gateway::engine_open),
        help("check the configuration template and the engine installation")
    )]
    EngineOpenFailed { code: i32, message: String },

    #[error("engine step '{stage}' failed (code {code}): {message}")]
    #[diagnostic(code(gateway::engine_step))]
    EngineStepFailed {
        stage: Stage,
        code: i32,
        message: String,
    },

    #[error("engine reported {reported} titles, expected {expected}")]
    #[diagnostic(code(gateway::count_mismatch))]
    CountMismatch { expected: usize, reported: i32 },

    #[error("'{stage}' is not allowed while the session is {state}")]
    #[diagnostic(code(gateway::invalid_state))]
    InvalidState { stage: Stage, state: String },

    #[error("invalid request: {0}")]
    #[diagnostic(code(gateway::invalid_request))]
    InvalidRequest(String),

    #[error("failed to load native library {}: {message}", path.display())]
    #[diagnostic(code(gateway::library_load))]
    LibraryLoad { path: PathBuf, message: String },

    #[error("IO error: {0}")]
    #[diagnostic(code(gateway::io))]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    #[diagnostic(code(gateway::json))]
    Json(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    #[diagnostic(code(gateway::internal))]
    Internal(String),
}

impl GatewayError {
    /// Status code the HTTP collaborator should answer with.
    pub fn status(&self) -> u16 {
        match self {
            GatewayError::AssetMissing { .. } | GatewayError::InvalidRequest(_) => 400,
            _ => 500,
        }
    }

    /// Session step the error is attributed to, when it came from the engine protocol.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            GatewayError::EngineOpenFailed { .. } => Some(Stage::Open),
            GatewayError::EngineStepFailed { stage, .. } | GatewayError::InvalidState { stage, .. } => {
                Some(*stage)
            }
            GatewayError::CountMismatch { .. } => Some(Stage::VerifyCount),
            _ => None,
        }
    }

    /// Message handed back to the caller. Engine failures surface the engine's own text.
    pub fn client_message(&self) -> String {
        match self {
            GatewayError::EngineOpenFailed { message, .. }
            | GatewayError::EngineStepFailed { message, .. }
                if !message.is_empty() =>
            {
                message.clone()
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T, E = GatewayError> = std::result::Result<T, E>;

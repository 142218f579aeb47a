use std::fmt;

use crate::ir::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    Info,
    Warning,
    Error,
    Critical,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level_str = match self {
            Level::Info => "INFO",
            Level::Warning => "WARNING",
            Level::Error => "ERROR",
            Level::Critical => "CRITICAL",
        };
        write!(f, "{}", level_str)
    }
}

/// Where a failure comes from. `Internal` means an upstream pass or the IR
/// construction itself is broken; `InvalidInput` means the user handed us
/// something malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Internal,
    InvalidInput,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Internal => write!(f, "internal"),
            ErrorCategory::InvalidInput => write!(f, "invalid-input"),
        }
    }
}

pub trait GraphoptErrorExt {
    fn level(&self) -> Level;
    fn message(&self) -> String;
    fn issuer(&self) -> String;
    fn category(&self) -> ErrorCategory;
    fn node(&self) -> Option<NodeId>;
}

pub type OptResult<T> = Result<T, Box<dyn GraphoptErrorExt>>;

impl fmt::Debug for dyn GraphoptErrorExt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let node_str = match self.node() {
            Some(n) => n.to_string(),
            None => "node:none".to_string(),
        };

        write!(
            f,
            "GRAPHOPT | {} | {} | {} | {} | {}",
            self.level(),
            self.category(),
            self.issuer(),
            node_str,
            self.message()
        )
    }
}

impl fmt::Display for dyn GraphoptErrorExt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Internal-consistency violation. Always fatal for the optimization run.
#[derive(Debug, Clone)]
pub struct InternalError {
    message: String,
    issuer: String,
    node: Option<NodeId>,
}

impl InternalError {
    pub fn new(message: impl Into<String>, issuer: &str) -> Self {
        InternalError {
            message: message.into(),
            issuer: issuer.to_string(),
            node: None,
        }
    }

    pub fn at(message: impl Into<String>, issuer: &str, node: NodeId) -> Self {
        InternalError {
            message: message.into(),
            issuer: issuer.to_string(),
            node: Some(node),
        }
    }

    pub fn boxed(self) -> Box<dyn GraphoptErrorExt> {
        Box::new(self)
    }
}

impl fmt::Display for InternalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.node {
            Some(n) => write!(f, "internal error in {} at {}: {}", self.issuer, n, self.message),
            None => write!(f, "internal error in {}: {}", self.issuer, self.message),
        }
    }
}

impl std::error::Error for InternalError {}

impl GraphoptErrorExt for InternalError {
    fn level(&self) -> Level {
        Level::Critical
    }

    fn message(&self) -> String {
        self.message.clone()
    }

    fn issuer(&self) -> String {
        self.issuer.clone()
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Internal
    }

    fn node(&self) -> Option<NodeId> {
        self.node
    }
}

/// A structural problem with user-supplied input (configuration files,
/// program descriptions), as opposed to a compiler bug.
#[derive(Debug, Clone)]
pub struct InvalidInputError {
    level: Level,
    message: String,
    issuer: String,
}

impl InvalidInputError {
    pub fn new(message: impl Into<String>, issuer: &str) -> Self {
        InvalidInputError {
            level: Level::Error,
            message: message.into(),
            issuer: issuer.to_string(),
        }
    }

    pub fn with(level: Level, message: String, issuer: String) -> Self {
        InvalidInputError { level, message, issuer }
    }

    pub fn boxed(self) -> Box<dyn GraphoptErrorExt> {
        Box::new(self)
    }
}

impl fmt::Display for InvalidInputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid input ({}): {}", self.issuer, self.message)
    }
}

impl std::error::Error for InvalidInputError {}

impl GraphoptErrorExt for InvalidInputError {
    fn level(&self) -> Level {
        self.level
    }

    fn message(&self) -> String {
        self.message.clone()
    }

    fn issuer(&self) -> String {
        self.issuer.clone()
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::InvalidInput
    }

    fn node(&self) -> Option<NodeId> {
        None
    }
}

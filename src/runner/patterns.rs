//! Error translation for failed steps.
//!
//! Matches a step failure against known patterns and produces the message
//! shown on the failed step. Unrecognized failures are shown verbatim and
//! reported to tracking as "Unknown error".

use regex::Regex;
use std::sync::LazyLock;

use crate::error::LaunchError;

/// Tracking text for failures no pattern recognizes.
pub const UNKNOWN_ERROR: &str = "Unknown error";

/// A user-facing rendering of a step failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayMessage {
    /// Text written into the step's error status.
    pub text: String,
    /// Whether a pattern recognized the failure.
    pub known: bool,
}

impl DisplayMessage {
    pub fn known(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            known: true,
        }
    }

    pub fn unknown(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            known: false,
        }
    }

    /// Text reported to tracking.
    pub fn tracking_text(&self) -> &str {
        if self.known {
            &self.text
        } else {
            UNKNOWN_ERROR
        }
    }
}

/// Turns a step failure into a display message.
pub trait ErrorTranslator: Send + Sync {
    fn translate(&self, error: &anyhow::Error) -> DisplayMessage;
}

/// A registered failure pattern.
pub struct ErrorPattern {
    /// Pattern name (for debugging).
    pub name: &'static str,
    /// Compiled matcher.
    pub regex: &'static LazyLock<Regex>,
    /// Build the display text from captures.
    pub render: fn(&regex::Captures) -> String,
}

macro_rules! lazy_regex {
    ($name:ident, $pattern:expr) => {
        static $name: LazyLock<Regex> =
            LazyLock::new(|| Regex::new($pattern).expect("built-in pattern must compile"));
    };
}

lazy_regex!(
    RE_USER_REJECTED,
    r"(?i)user (rejected|denied)|rejected by user|ACTION_REJECTED"
);
lazy_regex!(
    RE_INSUFFICIENT_FUNDS,
    r"(?i)insufficient funds[^\n]*"
);
lazy_regex!(RE_EXECUTION_REVERTED, r"(?i)execution reverted:?\s*([^\n]+)?");
lazy_regex!(RE_NONCE_TOO_LOW, r"(?i)nonce (too low|has already been used)");
lazy_regex!(
    RE_GAS_ESTIMATION,
    r"(?i)(cannot|unable to|failed to) estimate gas|gas required exceeds allowance"
);
lazy_regex!(
    RE_TIMEOUT,
    r"(?i)timed? ?out|timeout exceeded|deadline exceeded"
);
lazy_regex!(RE_RATE_LIMIT, r"(?i)rate limit|too many requests|\b429\b");

/// Return all built-in patterns, ordered by specificity.
pub fn built_in_patterns() -> Vec<ErrorPattern> {
    vec![
        ErrorPattern {
            name: "user_rejected",
            regex: &RE_USER_REJECTED,
            render: |_| "Transaction was rejected in your wallet".to_string(),
        },
        ErrorPattern {
            name: "insufficient_funds",
            regex: &RE_INSUFFICIENT_FUNDS,
            render: |caps| caps[0].trim().to_string(),
        },
        ErrorPattern {
            name: "execution_reverted",
            regex: &RE_EXECUTION_REVERTED,
            render: |caps| match caps.get(1).map(|m| m.as_str().trim()) {
                Some(reason) if !reason.is_empty() => format!("Execution reverted: {}", reason),
                _ => "Execution reverted".to_string(),
            },
        },
        ErrorPattern {
            name: "nonce_too_low",
            regex: &RE_NONCE_TOO_LOW,
            render: |_| {
                "Nonce too low: another transaction from this wallet is pending".to_string()
            },
        },
        ErrorPattern {
            name: "gas_estimation",
            regex: &RE_GAS_ESTIMATION,
            render: |_| "Gas estimation failed: the transaction would likely revert".to_string(),
        },
        ErrorPattern {
            name: "rate_limit",
            regex: &RE_RATE_LIMIT,
            render: |_| "RPC rate limit reached, wait a moment and retry".to_string(),
        },
        ErrorPattern {
            name: "timeout",
            regex: &RE_TIMEOUT,
            render: |_| "Request timed out".to_string(),
        },
    ]
}

/// Default translator backed by [`built_in_patterns`].
pub struct ErrorParser {
    patterns: Vec<ErrorPattern>,
}

impl ErrorParser {
    pub fn new() -> Self {
        Self {
            patterns: built_in_patterns(),
        }
    }

    /// Name of the first pattern matching `text`.
    pub fn matching_pattern(&self, text: &str) -> Option<&'static str> {
        self.patterns
            .iter()
            .find(|p| p.regex.is_match(text))
            .map(|p| p.name)
    }
}

impl Default for ErrorParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorTranslator for ErrorParser {
    fn translate(&self, error: &anyhow::Error) -> DisplayMessage {
        // Outermost context first, so a stderr line wins over the command.
        for cause in error.chain() {
            let text = cause.to_string();
            for pattern in &self.patterns {
                if let Some(caps) = pattern.regex.captures(&text) {
                    return DisplayMessage::known((pattern.render)(&caps));
                }
            }
        }

        let text = format!("{:#}", error);

        if let Some(LaunchError::CommandFailed { command, code }) =
            error.downcast_ref::<LaunchError>()
        {
            let text = match code {
                Some(code) => format!("Command exited with code {}: {}", code, command),
                None => format!("Command was terminated: {}", command),
            };
            return DisplayMessage::known(text);
        }

        DisplayMessage::unknown(text)
    }
}

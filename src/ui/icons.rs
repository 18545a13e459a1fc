//! Status icons for step states.

use crate::steps::StepStatus;

use super::theme::LaunchTheme;

/// Canonical status kinds used across launchpad output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusKind {
    /// Not attempted yet.
    Idle,
    /// Currently executing.
    Running,
    /// Completed successfully.
    Success,
    /// Failed.
    Failed,
}

impl StatusKind {
    /// Unicode icon for TTY output.
    pub fn icon(self) -> &'static str {
        match self {
            Self::Idle => "○",
            Self::Running => "◆",
            Self::Success => "✓",
            Self::Failed => "✗",
        }
    }

    /// Bracketed text for non-TTY output.
    pub fn bracketed(self) -> &'static str {
        match self {
            Self::Idle => "[idle]",
            Self::Running => "[run]",
            Self::Success => "[ok]",
            Self::Failed => "[FAIL]",
        }
    }

    /// Styled icon string using the given theme.
    pub fn styled(self, theme: &LaunchTheme) -> String {
        let icon = self.icon();
        match self {
            Self::Idle => theme.dim.apply_to(icon).to_string(),
            Self::Running => theme.info.apply_to(icon).to_string(),
            Self::Success => theme.success.apply_to(icon).to_string(),
            Self::Failed => theme.error.apply_to(icon).to_string(),
        }
    }

    /// Format a status line: styled icon + message.
    pub fn format(self, theme: &LaunchTheme, msg: &str) -> String {
        format!("{} {}", self.styled(theme), msg)
    }

    /// Format a status line for non-TTY: bracketed + message.
    pub fn format_plain(self, msg: &str) -> String {
        format!("{} {}", self.bracketed(), msg)
    }
}

impl From<&StepStatus> for StatusKind {
    fn from(status: &StepStatus) -> Self {
        match status {
            StepStatus::Idle => Self::Idle,
            StepStatus::Pending => Self::Running,
            StepStatus::Completed => Self::Success,
            StepStatus::Error(_) => Self::Failed,
        }
    }
}

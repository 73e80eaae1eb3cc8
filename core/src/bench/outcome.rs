use std::{fmt, time::Duration};

use serde::Serialize;

/// Result of a single process launch (or of a short-circuited attempt).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionOutcome {
    Success(Duration),
    Timeout,
    /// Nonzero exit. `None` when the process was terminated by a signal.
    ProcessFailed(Option<i32>),
    ToolUnavailable,
    CompileFailed,
}

/// Classification of a whole pair, i.e. an [`ExecutionOutcome`] without the timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Success,
    Timeout,
    ProcessFailed(Option<i32>),
    ToolUnavailable,
    CompileFailed,
}

impl ExecutionOutcome {
    pub fn verdict(&self) -> Verdict {
        use ExecutionOutcome::*;
        match *self {
            Success(_) => Verdict::Success,
            Timeout => Verdict::Timeout,
            ProcessFailed(code) => Verdict::ProcessFailed(code),
            ToolUnavailable => Verdict::ToolUnavailable,
            CompileFailed => Verdict::CompileFailed,
        }
    }

    pub fn elapsed(&self) -> Option<Duration> {
        match *self {
            Self::Success(t) => Some(t),
            _ => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

impl Verdict {
    /// Short code used in progress lines and badges.
    pub const fn code(&self) -> &'static str {
        use Verdict::*;
        match self {
            Success => "OK",
            Timeout => "TLE",
            ProcessFailed(_) => "RE",
            ToolUnavailable => "N/A",
            CompileFailed => "CE",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Verdict::ProcessFailed(Some(code)) => write!(f, "RE({})", code),
            Verdict::ProcessFailed(None) => write!(f, "RE(signal)"),
            v => f.write_str(v.code()),
        }
    }
}

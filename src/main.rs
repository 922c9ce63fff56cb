//! CLI entry point for workshop-dl.

use std::process::ExitCode;

mod app;
mod app_config;
mod cli;
mod output;

/// Process exit outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProcessExit {
    /// Every item downloaded.
    Success,
    /// Some items downloaded, some failed.
    Partial,
    /// Nothing downloaded, or a fatal error.
    Failure,
}

impl ProcessExit {
    pub(crate) fn code(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::Partial => 1,
            Self::Failure => 2,
        }
    }
}

impl From<ProcessExit> for ExitCode {
    fn from(exit: ProcessExit) -> Self {
        ExitCode::from(exit.code())
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    match app::runtime::run_workshop_dl().await {
        Ok(exit) => exit.into(),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ProcessExit::Failure.into()
        }
    }
}

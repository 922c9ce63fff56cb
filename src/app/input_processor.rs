//! Assembly of input text from positional arguments, piped stdin, or a prompt.

use std::io::{self, BufRead, IsTerminal, Read, Write};

use anyhow::{Context, Result};

use crate::cli::Args;

/// Shown when stdin is interactive and no links were passed.
pub(crate) const PROMPT: &str = "Enter Workshop links or item ids (separate with spaces): ";

/// Returns the raw input text, or `None` when nothing was provided.
///
/// Positional inputs win; otherwise piped stdin is read to EOF, and an
/// interactive stdin gets a single prompt.
pub(crate) fn process_input(args: &Args) -> Result<Option<String>> {
    let stdin = io::stdin();
    let interactive = stdin.is_terminal();
    collect_input(&args.inputs, interactive, &mut stdin.lock(), &mut io::stderr())
}

pub(crate) fn collect_input<R: BufRead, W: Write>(
    inputs: &[String],
    interactive: bool,
    reader: &mut R,
    prompt_out: &mut W,
) -> Result<Option<String>> {
    if !inputs.is_empty() {
        return Ok(Some(inputs.join("\n")));
    }

    let mut buffer = String::new();
    if interactive {
        write!(prompt_out, "{PROMPT}")?;
        prompt_out.flush()?;
        reader
            .read_line(&mut buffer)
            .context("Failed to read input line")?;
    } else {
        reader
            .read_to_string(&mut buffer)
            .context("Failed to read stdin")?;
    }

    if buffer.trim().is_empty() {
        Ok(None)
    } else {
        Ok(Some(buffer))
    }
}

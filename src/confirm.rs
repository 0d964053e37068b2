//! Interactive confirmation gate.
//!
//! A single-keystroke approval step between the preflight checks and the
//! first file mutation. There is no retry loop: one wrong or missing
//! keystroke declines the migration.

use std::io::{self, BufRead, Write};

use crate::error::RhinoError;

/// Asks the operator to approve the migration.
///
/// When `bypass` is set the prompt is skipped entirely. Otherwise reads a
/// single character from `input`; anything other than `y` (a read failure
/// included) yields [`RhinoError::Declined`].
pub fn confirm(bypass: bool, input: &mut dyn BufRead) -> Result<(), RhinoError> {
    if bypass {
        return Ok(());
    }

    print!("\nAre you sure you want to start tracking the devel series? [y/N] ");
    let _ = io::stdout().flush();

    let mut buf = [0u8; 1];
    match input.read(&mut buf) {
        Ok(1) if buf[0] == b'y' => Ok(()),
        _ => Err(RhinoError::Declined),
    }
}

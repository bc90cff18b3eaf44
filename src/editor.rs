//! Opening a finished project in the configured editor.

use crate::error::{Error, Result};
use log::debug;
use std::path::Path;
use std::process::{Command, Stdio};

/// Editors offered by `incubator config --edit`.
pub const EDITORS: [&str; 4] = ["none", "cursor", "code", "vim"];

const EDITOR_HINT: &str = "Install it or pick another editor with `incubator config --edit`.";

/// Program and arguments that open `dir` in `editor`.
///
/// Returns `None` when no editor is configured (`""` or `none`). Editors
/// other than the known ones are run as `<editor> <dir>`.
pub fn editor_command(editor: &str, dir: &Path) -> Option<(String, Vec<String>)> {
    let dir = dir.display().to_string();
    match editor.trim() {
        "" | "none" => None,
        program @ ("cursor" | "code") => {
            Some((program.to_string(), vec!["--new-window".to_string(), dir]))
        }
        program => Some((program.to_string(), vec![dir])),
    }
}

/// Starts the editor on `dir` without waiting for it to exit.
///
/// # Returns
/// * `Ok(false)` if no editor is configured
/// * `Ok(true)` once the editor process has been started
pub fn open_in_editor(editor: &str, dir: &Path) -> Result<bool> {
    let Some((program, args)) = editor_command(editor, dir) else {
        return Ok(false);
    };
    if which::which(&program).is_err() {
        return Err(Error::CommandNotFound { program, hint: EDITOR_HINT.to_string() });
    }

    debug!("Starting `{} {}`", program, args.join(" "));
    Command::new(&program)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;
    Ok(true)
}

//! Line-oriented parsing of the model's action protocol.
//!
//! The response format is a hard external contract shared with the
//! system prompt: a directive line announcing an action, then a command
//! field whose body runs until the next directive or field label. The
//! parsing stays purely textual; the command itself is an opaque blob
//! handed to the executor untouched.

/// Directive line marking that an action follows.
pub const ACTION_DIRECTIVE: &str = "ACTION: EXECUTE";
/// Field label beginning the command body.
pub const COMMAND_LABEL: &str = "COMMAND:";
/// File-delivery field label. Not interpreted here, but it terminates a
/// command body.
pub const FILE_LABEL: &str = "FILE:";

/// Extract the command requested by a response, if any.
///
/// Returns `None` when no line's trimmed form is exactly
/// [`ACTION_DIRECTIVE`], or when the directive is present but no
/// [`COMMAND_LABEL`] line follows it (a malformed response is treated
/// the same as no command). The body is everything after the label on
/// its line plus every following line, until a line starting with
/// `ACTION:` or `FILE:` or end of input. A later `COMMAND:` line inside
/// the body is merged label-stripped rather than terminating it.
/// Internal newlines are preserved; the whole body is trimmed at both
/// ends.
pub fn extract_command(response: &str) -> Option<String> {
    let lines: Vec<&str> = response.lines().collect();
    let directive_at = lines
        .iter()
        .position(|line| line.trim() == ACTION_DIRECTIVE)?;

    for (i, line) in lines.iter().enumerate().skip(directive_at + 1) {
        let Some(rest) = line.trim().strip_prefix(COMMAND_LABEL) else {
            continue;
        };

        let mut body = vec![rest.trim()];
        for following in &lines[i + 1..] {
            let trimmed = following.trim();
            if let Some(continued) = trimmed.strip_prefix(COMMAND_LABEL) {
                body.push(continued.trim());
                continue;
            }
            if trimmed.starts_with("ACTION:") || trimmed.starts_with(FILE_LABEL) {
                break;
            }
            body.push(*following);
        }
        let command = body.join("\n").trim().to_string();
        if command.is_empty() {
            return None;
        }
        return Some(command);
    }
    None
}

/// The `COMMAND:` lines of a raw response, trimmed.
///
/// Used to echo command lines for live observability as responses
/// arrive, independent of the parse/execute path.
pub fn command_lines(response: &str) -> impl Iterator<Item = &str> {
    response
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with(COMMAND_LABEL))
}

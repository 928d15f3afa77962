//! Line handling for the interactive chat loop.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Quit,
    Skip,
    Reset,
    Message(String),
}

/// Classify one line typed at the `You:` prompt.
///
/// `quit` and `exit` end the loop in any case; blank lines are skipped and
/// `/new` starts a fresh conversation.
pub fn parse_input(line: &str) -> Input {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Input::Skip;
    }
    if trimmed.eq_ignore_ascii_case("quit") || trimmed.eq_ignore_ascii_case("exit") {
        return Input::Quit;
    }
    if trimmed == "/new" {
        return Input::Reset;
    }
    Input::Message(trimmed.to_string())
}

use serde::Serialize;

use crate::errors::{CliError, with_debug_hint};
use crate::poem::PoemView;

#[derive(Debug, Clone)]
pub struct OutputMode {
    pub json: bool,
    pub quiet: bool,
    pub verbose: bool,
    pub debug: bool,
}

impl OutputMode {
    pub fn print_json<T: Serialize>(&self, value: &T) -> Result<(), CliError> {
        let text = serde_json::to_string(value)?;
        println!("{text}");
        Ok(())
    }

    pub fn print_human(&self, message: &str) {
        if self.json || self.quiet {
            return;
        }
        println!("{message}");
    }

    pub fn print_stderr(&self, message: &str) {
        if self.json || self.quiet {
            return;
        }
        eprintln!("{message}");
    }

    pub fn print_verbose(&self, message: &str) {
        if !self.verbose || self.json || self.quiet {
            return;
        }
        eprintln!("{message}");
    }

    /// Title, body and signature, the same order the poem display uses.
    pub fn print_poem(&self, poem: &PoemView, show_similar: bool) {
        for line in poem_lines(poem, show_similar) {
            self.print_human(&line);
        }
    }
}

pub fn poem_lines(poem: &PoemView, show_similar: bool) -> Vec<String> {
    let mut lines = Vec::new();
    if !poem.title.trim().is_empty() {
        lines.push(poem.title.trim().to_string());
        lines.push(String::new());
    }
    lines.extend(poem.body.lines().map(str::to_string));
    if !poem.signature.trim().is_empty() {
        lines.push(String::new());
        lines.extend(poem.signature.lines().map(str::to_string));
    }
    if show_similar && !poem.similar_poems.is_empty() {
        lines.push(String::new());
        lines.push(format!("Similar poems ({}):", poem.similar_poems.len()));
        for similar in &poem.similar_poems {
            lines.push(String::new());
            lines.extend(similar.lines().map(|l| format!("  {l}")));
        }
    }
    lines
}

/// Error text for the command line. Remote failures point at `--debug`
/// unless it is already on.
pub fn error_message(error: &CliError, mode: &OutputMode) -> String {
    let message = error.to_string();
    if error.is_remote() {
        with_debug_hint(&message, mode.debug)
    } else {
        message
    }
}

pub fn print_error(error: &CliError, mode: &OutputMode) {
    let message = error_message(error, mode);
    if mode.json {
        let payload = serde_json::json!({
            "error": message,
            "code": error.exit_code()
        });
        println!(
            "{}",
            serde_json::to_string(&payload)
                .unwrap_or_else(|_| "{\"error\":\"unknown\"}".to_string())
        );
        return;
    }

    eprintln!("Error: {message}");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn poem() -> PoemView {
        PoemView {
            title: "Ode".to_string(),
            body: "line one\nline two".to_string(),
            signature: String::new(),
            similar_poems: vec!["Title: Other\nverse".to_string()],
            poem_id: None,
        }
    }

    #[test]
    fn empty_signature_is_omitted() {
        assert_eq!(
            poem_lines(&poem(), false),
            vec!["Ode", "", "line one", "line two"]
        );
    }

    #[test]
    fn debug_hint_only_on_remote_errors() {
        let mut mode = OutputMode {
            json: false,
            quiet: false,
            verbose: false,
            debug: false,
        };
        let http = CliError::Server("HTTP error! status: 502".to_string());
        assert_eq!(
            error_message(&http, &mode),
            "HTTP error! status: 502 (try --debug for details)"
        );
        assert_eq!(
            error_message(&CliError::Usage("Prompt is empty.".to_string()), &mode),
            "Prompt is empty."
        );

        mode.debug = true;
        assert_eq!(error_message(&http, &mode), "HTTP error! status: 502");
    }

    #[test]
    fn similar_poems_are_indented() {
        let lines = poem_lines(&poem(), true);
        assert_eq!(lines[5], "Similar poems (1):");
        assert_eq!(lines[7], "  Title: Other");
        assert_eq!(lines[8], "  verse");
    }
}

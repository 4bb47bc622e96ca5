//! Console confirmation prompt for unknown server certificates

use std::io::IsTerminal;

use console::{Style, Term};
use davsync_core::UserInteractionListener;
use indicatif::ProgressBar;

/// Asks on the terminal; declines when stdin is not interactive
#[derive(Clone)]
pub struct ConsolePrompt {
    interactive: bool,
    highlight: Style,
    /// Hidden while the prompt is on screen
    progress: ProgressBar,
}

impl ConsolePrompt {
    pub fn new(progress: ProgressBar, colors: bool) -> Self {
        Self {
            interactive: std::io::stdin().is_terminal(),
            highlight: if colors {
                Style::new().yellow().bold()
            } else {
                Style::new()
            },
            progress,
        }
    }

    fn ask(&self, title: &str, detail: &str, question: &str) -> bool {
        let term = Term::stderr();
        let _ = term.write_line("");
        let _ = term.write_line(&self.highlight.apply_to(title).to_string());
        let _ = term.write_line("");
        for line in detail.lines() {
            let _ = term.write_line(&format!("  {line}"));
        }
        let _ = term.write_line("");
        let _ = term.write_str(&format!("{question} [y/N] "));

        match term.read_line() {
            Ok(answer) => is_yes(&answer),
            Err(e) => {
                tracing::warn!(error = %e, "Cannot read confirmation");
                false
            }
        }
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

impl UserInteractionListener for ConsolePrompt {
    fn on_user_confirm(&self, title: &str, detail: &str, question: &str) -> bool {
        if !self.interactive {
            tracing::warn!("Not a terminal; declining unknown certificate");
            return false;
        }
        self.progress.suspend(|| self.ask(title, detail, question))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_answers() {
        assert!(is_yes("y"));
        assert!(is_yes(" YES \n"));
        assert!(!is_yes(""));
        assert!(!is_yes("no"));
        assert!(!is_yes("yep"));
    }

    #[test]
    fn test_non_interactive_declines() {
        let prompt = ConsolePrompt {
            interactive: false,
            highlight: Style::new(),
            progress: ProgressBar::hidden(),
        };
        assert!(!prompt.on_user_confirm("t", "d", "q"));
    }
}

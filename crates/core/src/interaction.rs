//! User interaction seam
//!
//! Storage backends occasionally need a human decision, such as trusting an
//! unknown TLS certificate. The UI layer supplies an implementation.

/// Asks the user a yes/no question
#[cfg_attr(test, mockall::automock)]
pub trait UserInteractionListener: Send + Sync {
    /// Show `title` and `detail`, ask `question`, and return the answer.
    ///
    /// Called synchronously from within a TLS handshake, so implementations
    /// block until the user answers.
    fn on_user_confirm(&self, title: &str, detail: &str, question: &str) -> bool;
}

impl std::fmt::Debug for dyn UserInteractionListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("UserInteractionListener")
    }
}

//! Modal dialog collaborators
//!
//! Prompts are modal and blocking from the caller's perspective: the async
//! call suspends until the operator confirms or dismisses. A dismissal is
//! an explicit `Cancelled` outcome; it never silently continues as
//! confirmed.

use async_trait::async_trait;

/// Outcome of a modal prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptOutcome<T> {
    /// The operator confirmed, possibly supplying a value
    Confirmed(T),
    /// The operator dismissed the dialog
    Cancelled,
}

/// A selectable option in a keyed select prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    /// Value handed back on confirmation
    pub value: String,
    /// Label shown to the operator
    pub label: String,
}

/// Modal prompt collaborator
#[async_trait]
pub trait Prompter: Send + Sync {
    /// Free-text input prompt
    async fn input_text(&self, title: &str, message: &str) -> PromptOutcome<String>;

    /// Keyed select prompt; confirmation yields the selected option's value
    async fn select(
        &self,
        title: &str,
        message: &str,
        options: &[SelectOption],
    ) -> PromptOutcome<String>;

    /// Destructive-action warning prompt
    async fn confirm_danger(&self, title: &str, message: &str) -> PromptOutcome<()>;
}

/// Launcher for the timing-creation dialog
///
/// The dialog owns the creation call itself; this crate only opens it with
/// empty seed data.
#[async_trait]
pub trait CreateTimingDialog: Send + Sync {
    async fn open(&self);
}

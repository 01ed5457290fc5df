/// Lifecycle of one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    #[default]
    NotStarted,
    Validating,
    Processing,
    Done,
    Aborted,
}

impl RunState {
    /// Runs start by validating, and only a validated run may process rows.
    pub fn can_advance_to(self, next: RunState) -> bool {
        use RunState::*;
        matches!(
            (self, next),
            (NotStarted, Validating)
                | (Validating, Processing)
                | (Validating, Aborted)
                | (Processing, Done)
                | (Processing, Aborted)
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub state: RunState,
    pub loaded: usize,
    pub generated: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl RunReport {
    pub fn advance(&mut self, next: RunState) {
        debug_assert!(
            self.state.can_advance_to(next),
            "illegal run state change {:?} -> {next:?}",
            self.state
        );
        tracing::debug!(from = ?self.state, to = ?next, "run state");
        self.state = next;
    }

    pub fn succeeded(&self) -> bool {
        self.state == RunState::Done
    }
}

//! Intake wizard state machine.
//!
//! Progresses linearly: Welcome → SelectState → SelectCategory →
//! InputProblem → Loading → Result. Backward moves go one step at a time and
//! only between Welcome and Result. From Result the user either asks again
//! (back to InputProblem) or starts over (reset to Welcome).

use crate::decision::{DecisionCard, DecisionRequest};
use crate::intake::{EmotionalState, ProblemCategory};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WizardStep {
    Welcome = 0,
    SelectState = 1,
    SelectCategory = 2,
    InputProblem = 3,
    Loading = 4,
    Result = 5,
}

impl WizardStep {
    /// Transitions reachable through `Wizard::advance`.
    pub fn can_advance_to(&self, target: WizardStep) -> bool {
        use WizardStep::*;
        matches!(
            (self, target),
            (Welcome, SelectState) | (SelectState, SelectCategory) | (SelectCategory, InputProblem)
        )
    }

    pub fn previous(&self) -> Option<WizardStep> {
        use WizardStep::*;
        match self {
            SelectState => Some(Welcome),
            SelectCategory => Some(SelectState),
            InputProblem => Some(SelectCategory),
            Loading => Some(InputProblem),
            Welcome | Result => None,
        }
    }

    /// Whether the "back" control is offered on this step.
    pub fn can_go_back(&self) -> bool {
        *self > WizardStep::Welcome && *self < WizardStep::Result
    }
}

impl Default for WizardStep {
    fn default() -> Self {
        Self::Welcome
    }
}

impl std::fmt::Display for WizardStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Welcome => "welcome",
            Self::SelectState => "select_state",
            Self::SelectCategory => "select_category",
            Self::InputProblem => "input_problem",
            Self::Loading => "loading",
            Self::Result => "result",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WizardError {
    #[error("cannot move from {from} to {to}")]
    InvalidTransition { from: WizardStep, to: WizardStep },

    #[error("{0} must be chosen first")]
    MissingChoice(&'static str),

    #[error("problem text is empty")]
    EmptyProblemText,

    #[error("submission not allowed on step {step} (pending: {pending})")]
    SubmitBlocked { step: WizardStep, pending: bool },
}

/// Handed to the caller on submit; carries the token the completion must echo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub token: u64,
    pub request: DecisionRequest,
}

/// Session-scoped wizard state. Nothing here is persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Wizard {
    step: WizardStep,
    state: Option<EmotionalState>,
    category: Option<ProblemCategory>,
    text: String,
    results: Vec<DecisionCard>,
    /// Bumped on every submit, reset, and abandon.
    sequence: u64,
    pending: bool,
}

impl Wizard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn state(&self) -> Option<EmotionalState> {
        self.state
    }

    pub fn category(&self) -> Option<ProblemCategory> {
        self.category
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn results(&self) -> &[DecisionCard] {
        &self.results
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Move forward by one step along the intake path.
    pub fn advance(&mut self, target: WizardStep) -> Result<WizardStep, WizardError> {
        if !self.step.can_advance_to(target) {
            return Err(WizardError::InvalidTransition {
                from: self.step,
                to: target,
            });
        }
        match target {
            WizardStep::SelectCategory if self.state.is_none() => {
                return Err(WizardError::MissingChoice("emotional state"));
            }
            WizardStep::InputProblem if self.category.is_none() => {
                return Err(WizardError::MissingChoice("problem category"));
            }
            _ => {}
        }
        self.step = target;
        Ok(target)
    }

    pub fn start(&mut self) -> Result<WizardStep, WizardError> {
        self.advance(WizardStep::SelectState)
    }

    /// Record the emotional state and move on to the category choice.
    pub fn select_state(&mut self, state: EmotionalState) -> Result<WizardStep, WizardError> {
        if self.step == WizardStep::Welcome {
            self.start()?;
        }
        if self.step != WizardStep::SelectState {
            return Err(WizardError::InvalidTransition {
                from: self.step,
                to: WizardStep::SelectCategory,
            });
        }
        self.state = Some(state);
        self.advance(WizardStep::SelectCategory)
    }

    pub fn select_category(&mut self, category: ProblemCategory) -> Result<WizardStep, WizardError> {
        if self.step != WizardStep::SelectCategory {
            return Err(WizardError::InvalidTransition {
                from: self.step,
                to: WizardStep::InputProblem,
            });
        }
        self.category = Some(category);
        self.advance(WizardStep::InputProblem)
    }

    /// Text edits only land while the input step is showing.
    pub fn set_text(&mut self, text: impl Into<String>) {
        if self.step == WizardStep::InputProblem {
            self.text = text.into();
        }
    }

    pub fn push_char(&mut self, c: char) {
        if self.step == WizardStep::InputProblem {
            self.text.push(c);
        }
    }

    pub fn pop_char(&mut self) {
        if self.step == WizardStep::InputProblem {
            self.text.pop();
        }
    }

    /// One step back. Leaving Loading abandons the outstanding request.
    pub fn go_back(&mut self) -> bool {
        if !self.step.can_go_back() {
            return false;
        }
        let Some(prev) = self.step.previous() else {
            return false;
        };
        if self.step == WizardStep::Loading {
            self.abandon();
        }
        self.step = prev;
        true
    }

    /// Clear everything back to the initial session state.
    pub fn reset(&mut self) {
        self.abandon();
        self.step = WizardStep::Welcome;
        self.state = None;
        self.category = None;
        self.text.clear();
        self.results.clear();
    }

    /// From Result, return to the input step keeping the captured inputs.
    pub fn ask_again(&mut self) -> Result<WizardStep, WizardError> {
        if self.step != WizardStep::Result {
            return Err(WizardError::InvalidTransition {
                from: self.step,
                to: WizardStep::InputProblem,
            });
        }
        self.step = WizardStep::InputProblem;
        Ok(self.step)
    }

    pub fn can_submit(&self) -> bool {
        self.step == WizardStep::InputProblem && !self.pending && !self.text.trim().is_empty()
    }

    /// Enter Loading and hand back the request to send.
    pub fn submit(&mut self) -> Result<Submission, WizardError> {
        if self.step != WizardStep::InputProblem || self.pending {
            return Err(WizardError::SubmitBlocked {
                step: self.step,
                pending: self.pending,
            });
        }
        if self.text.trim().is_empty() {
            return Err(WizardError::EmptyProblemText);
        }

        self.sequence += 1;
        self.pending = true;
        self.step = WizardStep::Loading;

        Ok(Submission {
            token: self.sequence,
            request: DecisionRequest::new(self.text.clone(), self.state, self.category),
        })
    }

    /// Apply a finished request. Returns false (and changes nothing) when the
    /// token belongs to a superseded or abandoned request.
    pub fn complete(&mut self, token: u64, cards: Vec<DecisionCard>) -> bool {
        if !self.pending || token != self.sequence {
            return false;
        }
        self.pending = false;
        self.results = cards;
        self.step = WizardStep::Result;
        true
    }

    fn abandon(&mut self) {
        if self.pending {
            self.sequence += 1;
            self.pending = false;
        }
    }
}

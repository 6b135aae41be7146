//! shuxin-core: intake wizard state machine and decision payload types

pub mod decision;
pub mod help;
pub mod intake;
pub mod wizard;

pub use decision::{
    DecisionCard, DecisionContext, DecisionRequest, ResponseError,
    fallback_cards, parse_decision_response,
};
pub use help::EmergencyHelp;
pub use intake::{EmotionalState, ProblemCategory};
pub use wizard::{Submission, Wizard, WizardError, WizardStep};

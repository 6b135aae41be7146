//! Closed label sets the user picks from during intake.
//!
//! Both sets travel to the decision service as their human-readable label.
//! "Unset" is modelled as `None` at the call sites and serialized as `""`.

use serde::{Deserialize, Serialize};

/// How the user says they feel right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EmotionalState {
    #[serde(rename = "我有点慌")]
    Panicked,
    #[serde(rename = "我不知道该怎么选")]
    Undecided,
    #[serde(rename = "钱的事让我压力很大")]
    MoneyStress,
    #[serde(rename = "我想慢慢想，不急")]
    Unhurried,
}

impl EmotionalState {
    pub const ALL: [EmotionalState; 4] = [
        EmotionalState::Panicked,
        EmotionalState::Undecided,
        EmotionalState::MoneyStress,
        EmotionalState::Unhurried,
    ];

    pub fn label(self) -> &'static str {
        match self {
            EmotionalState::Panicked => "我有点慌",
            EmotionalState::Undecided => "我不知道该怎么选",
            EmotionalState::MoneyStress => "钱的事让我压力很大",
            EmotionalState::Unhurried => "我想慢慢想，不急",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.label() == label.trim())
    }
}

/// What kind of trouble the user is dealing with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProblemCategory {
    #[serde(rename = "账单/欠费")]
    Bills,
    #[serde(rename = "吃饭/出行/日常花销")]
    DailySpending,
    #[serde(rename = "工作/时间安排")]
    WorkSchedule,
    #[serde(rename = "其他/说不清")]
    Other,
}

impl ProblemCategory {
    pub const ALL: [ProblemCategory; 4] = [
        ProblemCategory::Bills,
        ProblemCategory::DailySpending,
        ProblemCategory::WorkSchedule,
        ProblemCategory::Other,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ProblemCategory::Bills => "账单/欠费",
            ProblemCategory::DailySpending => "吃饭/出行/日常花销",
            ProblemCategory::WorkSchedule => "工作/时间安排",
            ProblemCategory::Other => "其他/说不清",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.label() == label.trim())
    }
}

/// Label of an optional choice, `""` when unset.
pub fn state_label(state: Option<EmotionalState>) -> &'static str {
    state.map(EmotionalState::label).unwrap_or("")
}

pub fn category_label(category: Option<ProblemCategory>) -> &'static str {
    category.map(ProblemCategory::label).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_round_trip_through_from_label() {
        for s in EmotionalState::ALL {
            assert_eq!(EmotionalState::from_label(s.label()), Some(s));
        }
        for c in ProblemCategory::ALL {
            assert_eq!(ProblemCategory::from_label(c.label()), Some(c));
        }
        assert_eq!(EmotionalState::from_label("开心"), None);
    }

    #[test]
    fn test_serializes_as_label() {
        let json = serde_json::to_string(&ProblemCategory::Bills).unwrap();
        assert_eq!(json, "\"账单/欠费\"");
        assert_eq!(state_label(None), "");
    }
}

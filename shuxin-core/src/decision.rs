//! Wire types for the decision-generation service, plus the local fallback.

use serde::{Deserialize, Serialize};

use crate::intake::{EmotionalState, ProblemCategory, category_label, state_label};

/// Language tag sent with every request.
pub const LANGUAGE: &str = "zh";

/// Input mode sent with every request. Voice input is not available yet.
pub const MODE_TEXT: &str = "text";

/// Path appended to the configured API base.
pub const DECISION_PATH: &str = "/api/decision";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionContext {
    pub state: String,
    pub category: String,
    pub language: String,
    pub mode: String,
}

/// Exact outbound payload of `POST /api/decision`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionRequest {
    pub text: String,
    pub context: DecisionContext,
}

impl DecisionRequest {
    /// Build the payload. `text` is sent as typed, without trimming.
    pub fn new(
        text: impl Into<String>,
        state: Option<EmotionalState>,
        category: Option<ProblemCategory>,
    ) -> Self {
        Self {
            text: text.into(),
            context: DecisionContext {
                state: state_label(state).to_string(),
                category: category_label(category).to_string(),
                language: LANGUAGE.to_string(),
                mode: MODE_TEXT.to_string(),
            },
        }
    }
}

/// One rendered unit of advice.
///
/// Individual cards are not validated; see `DecisionCard::from_value`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DecisionCard {
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<String>>,
}

impl DecisionCard {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: None,
            items: None,
        }
    }

    /// Lenient read of one element of `cards`. Never fails: a missing or
    /// non-string `title` becomes `""`, non-string `content` is dropped,
    /// non-string `items` entries are skipped, and a non-object element
    /// becomes an empty card.
    pub fn from_value(value: &serde_json::Value) -> Self {
        let title = value
            .get("title")
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default()
            .to_string();
        let content = value
            .get("content")
            .and_then(serde_json::Value::as_str)
            .map(str::to_string);
        let items = value
            .get("items")
            .and_then(serde_json::Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(serde_json::Value::as_str)
                    .map(str::to_string)
                    .collect()
            });
        Self {
            title,
            content,
            items,
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_items<I, S>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.items = Some(items.into_iter().map(Into::into).collect());
        self
    }
}

/// Why a response body was rejected.
#[derive(Debug, thiserror::Error)]
pub enum ResponseError {
    #[error("response body is not JSON: {0}")]
    NotJson(#[from] serde_json::Error),

    #[error("response has no `cards` array")]
    MissingCards,
}

/// Parse a success body. Only the top-level `cards` array is checked; every
/// element is kept, in order.
pub fn parse_decision_response(body: &str) -> Result<Vec<DecisionCard>, ResponseError> {
    let value: serde_json::Value = serde_json::from_str(body)?;
    let cards = value
        .get("cards")
        .and_then(serde_json::Value::as_array)
        .ok_or(ResponseError::MissingCards)?;
    Ok(cards.iter().map(DecisionCard::from_value).collect())
}

const ECHO_TITLE: &str = "我听到的是";
const UNKNOWN_FEELING: &str = "有点复杂";

/// Deterministic local substitute used whenever the remote call fails.
///
/// The first card echoes `text` verbatim. Nothing here mentions the failure.
pub fn fallback_cards(text: &str, state: Option<EmotionalState>) -> Vec<DecisionCard> {
    let feeling = state.map(EmotionalState::label).unwrap_or(UNKNOWN_FEELING);

    vec![
        DecisionCard::new(ECHO_TITLE)
            .with_content(format!("您刚才说：“{text}”。我明白您现在感觉 {feeling}。")),
        DecisionCard::new("先做一件最小的事")
            .with_content(
                "先别急着做决定。现在只需要做一件最小的、能推进一点点的事：确认这件事最晚什么时候必须处理完。",
            )
            .with_items([
                "写下最晚截止时间",
                "把要做的动作拆成 1–2 个最小步骤",
                "先完成其中一个",
            ]),
        DecisionCard::new("把压力分成两类")
            .with_content(
                "我们先把“必须马上处理的”与“可以稍后再想的”分开，这会让大脑压力立刻下降一点。",
            )
            .with_items(["现在必须做：___", "今天之内再做：___", "本周再做：___"]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_payload_shape() {
        let req = DecisionRequest::new(
            "  电费单找不到了 ",
            Some(EmotionalState::Panicked),
            Some(ProblemCategory::Bills),
        );
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(
            v,
            serde_json::json!({
                "text": "  电费单找不到了 ",
                "context": {
                    "state": "我有点慌",
                    "category": "账单/欠费",
                    "language": "zh",
                    "mode": "text",
                }
            })
        );
    }

    #[test]
    fn test_request_with_unset_choices_sends_empty_labels() {
        let req = DecisionRequest::new("x", None, None);
        assert_eq!(req.context.state, "");
        assert_eq!(req.context.category, "");
    }

    #[test]
    fn test_parse_accepts_cards_verbatim() {
        let cards = parse_decision_response(r#"{"cards":[{"title":"A"}]}"#).unwrap();
        assert_eq!(cards, vec![DecisionCard::new("A")]);
    }

    #[test]
    fn test_parse_passes_through_card_without_title() {
        let cards =
            parse_decision_response(r#"{"cards":[{"content":"c","items":["1","2"]}],"extra":1}"#)
                .unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].title, "");
        assert_eq!(cards[0].items.as_deref(), Some(&["1".to_string(), "2".to_string()][..]));
    }

    #[test]
    fn test_parse_rejects_missing_or_non_array_cards() {
        assert!(matches!(
            parse_decision_response(r#"{"notCards":[]}"#),
            Err(ResponseError::MissingCards)
        ));
        assert!(matches!(
            parse_decision_response(r#"{"cards":{"title":"A"}}"#),
            Err(ResponseError::MissingCards)
        ));
        assert!(matches!(
            parse_decision_response(r#"{"cards":null}"#),
            Err(ResponseError::MissingCards)
        ));
        assert!(matches!(
            parse_decision_response("<html>oops</html>"),
            Err(ResponseError::NotJson(_))
        ));
    }

    #[test]
    fn test_parse_keeps_cards_with_odd_fields() {
        let cards = parse_decision_response(
            r#"{"cards":[
                {"title":null},
                {"title":7,"content":["x"]},
                {"title":"T","content":"c","items":["a",1,null,"b"]},
                {"title":"U","items":"not a list"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(
            cards,
            vec![
                DecisionCard::new(""),
                DecisionCard::new(""),
                DecisionCard::new("T").with_content("c").with_items(["a", "b"]),
                DecisionCard::new("U"),
            ]
        );
    }

    #[test]
    fn test_parse_keeps_non_object_elements_as_empty_cards() {
        let cards = parse_decision_response(r#"{"cards":[{"title":"A"},3,"text",null,[]]}"#).unwrap();
        assert_eq!(cards.len(), 5);
        assert_eq!(cards[0], DecisionCard::new("A"));
        assert!(cards[1..].iter().all(|c| *c == DecisionCard::default()));
    }

    #[test]
    fn test_parse_accepts_empty_cards() {
        assert!(parse_decision_response(r#"{"cards":[]}"#).unwrap().is_empty());
    }

    #[test]
    fn test_fallback_echoes_text_verbatim() {
        let text = "明天要面试，很紧张 \n 怎么办？";
        let cards = fallback_cards(text, Some(EmotionalState::MoneyStress));
        assert_eq!(cards.len(), 3);
        let echo = cards[0].content.as_deref().unwrap();
        assert!(echo.contains(text));
        assert!(echo.contains("钱的事让我压力很大"));
        assert_eq!(cards[1].items.as_ref().map(Vec::len), Some(3));
        assert_eq!(cards[2].items.as_ref().map(Vec::len), Some(3));
    }

    #[test]
    fn test_fallback_without_state_and_is_deterministic() {
        let a = fallback_cards("x", None);
        let b = fallback_cards("x", None);
        assert_eq!(a, b);
        assert!(a[0].content.as_deref().unwrap().contains("有点复杂"));
    }
}

use anyhow::{Result, bail};
use shuxin_client::{DecisionClient, DecisionOutcome};
use shuxin_core::{DecisionCard, DecisionRequest, EmotionalState, ProblemCategory};
use tracing::info;

/// Accepts `1`-`4` or the exact label.
pub fn parse_state(s: &str) -> Result<EmotionalState, String> {
    pick(s, &EmotionalState::ALL, |x| x.label())
}

pub fn parse_category(s: &str) -> Result<ProblemCategory, String> {
    pick(s, &ProblemCategory::ALL, |x| x.label())
}

fn pick<T: Copy>(s: &str, all: &[T], label: impl Fn(T) -> &'static str) -> Result<T, String> {
    let s = s.trim();
    if let Ok(n) = s.parse::<usize>() {
        if (1..=all.len()).contains(&n) {
            return Ok(all[n - 1]);
        }
    }
    all.iter()
        .copied()
        .find(|x| label(*x) == s)
        .ok_or_else(|| {
            let options: Vec<String> = all
                .iter()
                .enumerate()
                .map(|(i, x)| format!("{}={}", i + 1, label(*x)))
                .collect();
            format!("expected one of: {}", options.join(", "))
        })
}

/// One request outside the full-screen wizard. Same fallback path.
pub async fn run_ask(
    client: &DecisionClient,
    state: Option<EmotionalState>,
    category: Option<ProblemCategory>,
    text: &str,
    json: bool,
) -> Result<()> {
    if text.trim().is_empty() {
        bail!("problem text is empty (pass --text \"...\")");
    }

    let request = DecisionRequest::new(text, state, category);
    info!(url = client.url(), "one-shot decision request");
    let outcome = client.decide(&request).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print!("{}", render_outcome(&outcome));
    }
    Ok(())
}

pub fn render_outcome(outcome: &DecisionOutcome) -> String {
    let mut s = String::from("# 为您捋出了几条思路\n\n");
    for card in &outcome.cards {
        s.push_str(&render_card(card));
    }
    s
}

fn render_card(card: &DecisionCard) -> String {
    let mut s = format!("## {}\n", card.title);
    if let Some(content) = card.content.as_deref().filter(|c| !c.is_empty()) {
        s.push_str(content);
        s.push('\n');
    }
    for (i, item) in card.items.iter().flatten().enumerate() {
        s.push_str(&format!("  {}. {}\n", i + 1, item));
    }
    s.push('\n');
    s
}

//! Key handling for the wizard screen. No terminal access here, so the
//! behavior can be driven directly from tests.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use shuxin_client::{DecisionEvent, DecisionJob};
use shuxin_core::{
    EmergencyHelp, EmotionalState, ProblemCategory, Submission, Wizard, WizardStep, fallback_cards,
};
use tracing::{debug, error, info};

pub const VOICE_NOT_READY: &str = "语音功能正在开发中，很快就会和大家见面！";

/// What the run loop has to do after a key press.
#[derive(Debug, PartialEq, Eq)]
pub enum Action {
    None,
    Quit,
    Submit(Submission),
}

#[derive(Debug, Default)]
pub struct App {
    pub wizard: Wizard,
    pub help: EmergencyHelp,
    /// One-off notice shown as a dismissable popup (voice stub).
    pub notice: Option<&'static str>,
    /// Highlighted row on the two choice steps.
    pub cursor: usize,
    /// Vertical scroll of the result cards.
    pub scroll: u16,
    pub tick: usize,
}

impl App {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Action {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Action::Quit;
        }

        // The overlay swallows every key until it is dismissed.
        if self.help.is_open() {
            if matches!(key.code, KeyCode::Esc | KeyCode::Enter | KeyCode::F(1)) {
                self.help.close();
            }
            return Action::None;
        }
        if key.code == KeyCode::F(1) {
            self.help.open();
            return Action::None;
        }

        if self.notice.is_some() {
            self.notice = None;
            return Action::None;
        }

        let before = self.wizard.step();
        let action = match before {
            WizardStep::Welcome => self.on_welcome(key),
            WizardStep::SelectState => self.on_select_state(key),
            WizardStep::SelectCategory => self.on_select_category(key),
            WizardStep::InputProblem => self.on_input(key),
            WizardStep::Loading => self.on_loading(key),
            WizardStep::Result => self.on_result(key),
        };

        let after = self.wizard.step();
        if after != before {
            debug!(from = %before, to = %after, "step changed");
            self.sync_cursor();
        }
        action
    }

    /// Apply a finished request; stale ones are dropped by the wizard.
    pub fn on_decision(&mut self, event: DecisionEvent) -> bool {
        let applied = self.wizard.complete(event.request_id, event.outcome.cards);
        if applied {
            info!(request_id = event.request_id, source = ?event.outcome.source, "showing result");
            self.sync_cursor();
        } else {
            debug!(request_id = event.request_id, "discarding stale decision result");
        }
        applied
    }

    /// The worker is gone and `job` was never sent. Answer it locally so
    /// Loading cannot stick.
    pub fn on_send_failed(&mut self, job: DecisionJob) -> bool {
        error!(request_id = job.request_id, "decision worker unavailable, using fallback");
        let state = EmotionalState::from_label(&job.request.context.state);
        let cards = fallback_cards(&job.request.text, state);
        let applied = self.wizard.complete(job.request_id, cards);
        if applied {
            self.sync_cursor();
        }
        applied
    }

    fn on_welcome(&mut self, key: KeyEvent) -> Action {
        match key.code {
            KeyCode::Enter | KeyCode::Char(' ') => {
                let _ = self.wizard.start();
                Action::None
            }
            KeyCode::Char('q') => Action::Quit,
            _ => Action::None,
        }
    }

    fn on_select_state(&mut self, key: KeyEvent) -> Action {
        match self.choice(key, EmotionalState::ALL.len()) {
            Choice::Picked(i) => {
                let _ = self.wizard.select_state(EmotionalState::ALL[i]);
                Action::None
            }
            Choice::Back => {
                self.wizard.go_back();
                Action::None
            }
            Choice::Quit => Action::Quit,
            Choice::Moved | Choice::Ignored => Action::None,
        }
    }

    fn on_select_category(&mut self, key: KeyEvent) -> Action {
        match self.choice(key, ProblemCategory::ALL.len()) {
            Choice::Picked(i) => {
                let _ = self.wizard.select_category(ProblemCategory::ALL[i]);
                Action::None
            }
            Choice::Back => {
                self.wizard.go_back();
                Action::None
            }
            Choice::Quit => Action::Quit,
            Choice::Moved | Choice::Ignored => Action::None,
        }
    }

    fn choice(&mut self, key: KeyEvent, len: usize) -> Choice {
        match key.code {
            KeyCode::Up => {
                self.cursor = self.cursor.checked_sub(1).unwrap_or(len - 1);
                Choice::Moved
            }
            KeyCode::Down => {
                self.cursor = (self.cursor + 1) % len;
                Choice::Moved
            }
            KeyCode::Enter => Choice::Picked(self.cursor.min(len - 1)),
            KeyCode::Char(c) => match c.to_digit(10) {
                Some(d) if d >= 1 && (d as usize) <= len => Choice::Picked(d as usize - 1),
                _ if c == 'q' => Choice::Quit,
                _ => Choice::Ignored,
            },
            KeyCode::Esc | KeyCode::Backspace | KeyCode::Left => Choice::Back,
            _ => Choice::Ignored,
        }
    }

    fn on_input(&mut self, key: KeyEvent) -> Action {
        match key.code {
            KeyCode::Enter if key.modifiers.contains(KeyModifiers::ALT) => {
                self.wizard.push_char('\n');
                Action::None
            }
            KeyCode::Enter => {
                if !self.wizard.can_submit() {
                    return Action::None;
                }
                match self.wizard.submit() {
                    Ok(sub) => {
                        info!(request_id = sub.token, "submitting problem");
                        Action::Submit(sub)
                    }
                    Err(_) => Action::None,
                }
            }
            KeyCode::Esc => {
                self.wizard.go_back();
                Action::None
            }
            KeyCode::Backspace => {
                self.wizard.pop_char();
                Action::None
            }
            KeyCode::F(2) => {
                self.notice = Some(VOICE_NOT_READY);
                Action::None
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.wizard.push_char(c);
                Action::None
            }
            _ => Action::None,
        }
    }

    fn on_loading(&mut self, key: KeyEvent) -> Action {
        if key.code == KeyCode::Esc {
            info!("leaving loading; pending request abandoned");
            self.wizard.go_back();
        }
        Action::None
    }

    fn on_result(&mut self, key: KeyEvent) -> Action {
        match key.code {
            KeyCode::Enter | KeyCode::Char('a') => {
                let _ = self.wizard.ask_again();
            }
            KeyCode::Char('r') => self.wizard.reset(),
            KeyCode::Char('q') => return Action::Quit,
            KeyCode::Up => self.scroll = self.scroll.saturating_sub(1),
            KeyCode::Down => self.scroll = self.scroll.saturating_add(1),
            _ => {}
        }
        Action::None
    }

    /// Put the highlight on the current choice when a choice step shows.
    fn sync_cursor(&mut self) {
        self.scroll = 0;
        self.cursor = match self.wizard.step() {
            WizardStep::SelectState => self
                .wizard
                .state()
                .and_then(|s| EmotionalState::ALL.iter().position(|x| *x == s))
                .unwrap_or(0),
            WizardStep::SelectCategory => self
                .wizard
                .category()
                .and_then(|c| ProblemCategory::ALL.iter().position(|x| *x == c))
                .unwrap_or(0),
            _ => 0,
        };
    }
}

enum Choice {
    Picked(usize),
    Moved,
    Back,
    Quit,
    Ignored,
}

#[cfg(test)]
mod tests {
    use super::*;
    use shuxin_client::{DecisionOutcome, OutcomeSource};
    use shuxin_core::DecisionCard;

    fn press(app: &mut App, code: KeyCode) -> Action {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    fn finish(app: &mut App, token: u64, cards: Vec<DecisionCard>) -> bool {
        app.on_decision(DecisionEvent {
            request_id: token,
            outcome: DecisionOutcome {
                cards,
                source: OutcomeSource::Remote,
            },
        })
    }

    /// Walk to `step` the way a user would.
    fn app_at(step: WizardStep) -> App {
        let mut app = App::new();
        if step == WizardStep::Welcome {
            return app;
        }
        press(&mut app, KeyCode::Enter);
        if step == WizardStep::SelectState {
            return app;
        }
        press(&mut app, KeyCode::Char('2'));
        if step == WizardStep::SelectCategory {
            return app;
        }
        press(&mut app, KeyCode::Char('1'));
        type_text(&mut app, "账单找不到了");
        if step == WizardStep::InputProblem {
            return app;
        }
        let Action::Submit(sub) = press(&mut app, KeyCode::Enter) else {
            panic!("expected a submission");
        };
        if step == WizardStep::Loading {
            return app;
        }
        assert!(finish(&mut app, sub.token, vec![DecisionCard::new("A")]));
        app
    }

    const ALL_STEPS: [WizardStep; 6] = [
        WizardStep::Welcome,
        WizardStep::SelectState,
        WizardStep::SelectCategory,
        WizardStep::InputProblem,
        WizardStep::Loading,
        WizardStep::Result,
    ];

    #[test]
    fn test_help_overlay_leaves_wizard_untouched_on_every_step() {
        for step in ALL_STEPS {
            let mut app = app_at(step);
            assert_eq!(app.wizard.step(), step);
            let before = app.wizard.clone();

            assert_eq!(press(&mut app, KeyCode::F(1)), Action::None);
            assert!(app.help.is_open());

            // Keys that would otherwise navigate, edit, submit or quit.
            for code in [
                KeyCode::Char('1'),
                KeyCode::Char('q'),
                KeyCode::Char('r'),
                KeyCode::Backspace,
                KeyCode::Up,
            ] {
                assert_eq!(press(&mut app, code), Action::None);
            }
            assert!(app.help.is_open());

            press(&mut app, KeyCode::Esc);
            assert!(!app.help.is_open());
            assert_eq!(app.wizard, before, "wizard changed on {step}");
        }
    }

    #[test]
    fn test_enter_dismisses_help_without_submitting() {
        let mut app = app_at(WizardStep::InputProblem);
        press(&mut app, KeyCode::F(1));
        assert_eq!(press(&mut app, KeyCode::Enter), Action::None);
        assert!(!app.help.is_open());
        assert_eq!(app.wizard.step(), WizardStep::InputProblem);
    }

    #[test]
    fn test_blank_text_cannot_submit() {
        let mut app = app_at(WizardStep::SelectCategory);
        press(&mut app, KeyCode::Char('3'));
        type_text(&mut app, "   ");
        assert_eq!(press(&mut app, KeyCode::Enter), Action::None);
        assert_eq!(app.wizard.step(), WizardStep::InputProblem);
    }

    #[test]
    fn test_choices_by_arrow_keys() {
        let mut app = app_at(WizardStep::SelectState);
        press(&mut app, KeyCode::Up);
        assert_eq!(app.cursor, 3);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.wizard.state(), Some(EmotionalState::Unhurried));
        assert_eq!(app.wizard.step(), WizardStep::SelectCategory);

        // Coming back highlights the earlier pick.
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.wizard.step(), WizardStep::SelectState);
        assert_eq!(app.cursor, 3);
    }

    #[test]
    fn test_enter_while_loading_does_not_resubmit() {
        let mut app = app_at(WizardStep::Loading);
        assert_eq!(press(&mut app, KeyCode::Enter), Action::None);
        assert_eq!(app.wizard.step(), WizardStep::Loading);
    }

    #[test]
    fn test_escape_from_loading_drops_late_answer() {
        let mut app = app_at(WizardStep::InputProblem);
        let Action::Submit(sub) = press(&mut app, KeyCode::Enter) else {
            panic!("expected a submission");
        };
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.wizard.step(), WizardStep::InputProblem);
        assert!(!finish(&mut app, sub.token, vec![DecisionCard::new("late")]));
        assert_eq!(app.wizard.step(), WizardStep::InputProblem);
    }

    #[test]
    fn test_unsent_job_is_answered_with_fallback() {
        let mut app = app_at(WizardStep::InputProblem);
        let Action::Submit(sub) = press(&mut app, KeyCode::Enter) else {
            panic!("expected a submission");
        };
        let job = DecisionJob {
            request_id: sub.token,
            request: sub.request,
        };
        assert!(app.on_send_failed(job.clone()));
        assert_eq!(app.wizard.step(), WizardStep::Result);
        let cards = app.wizard.results();
        assert_eq!(cards.len(), 3);
        let echo = cards[0].content.as_deref().unwrap();
        assert!(echo.contains("账单找不到了"));
        assert!(echo.contains(EmotionalState::ALL[1].label()));

        // Already answered; a second failure report changes nothing.
        assert!(!app.on_send_failed(job));
    }

    #[test]
    fn test_result_exits() {
        let mut app = app_at(WizardStep::Result);
        press(&mut app, KeyCode::Char('a'));
        assert_eq!(app.wizard.step(), WizardStep::InputProblem);
        assert_eq!(app.wizard.text(), "账单找不到了");

        let mut app = app_at(WizardStep::Result);
        press(&mut app, KeyCode::Char('r'));
        assert_eq!(app.wizard.step(), WizardStep::Welcome);
        assert_eq!(app.wizard.state(), None);
        assert_eq!(app.wizard.category(), None);
        assert_eq!(app.wizard.text(), "");
        assert!(app.wizard.results().is_empty());
    }

    #[test]
    fn test_voice_stub_notice() {
        let mut app = app_at(WizardStep::InputProblem);
        press(&mut app, KeyCode::F(2));
        assert_eq!(app.notice, Some(VOICE_NOT_READY));
        let text = app.wizard.text().to_string();
        press(&mut app, KeyCode::Char('x'));
        assert_eq!(app.notice, None);
        assert_eq!(app.wizard.text(), text);
    }

    #[test]
    fn test_quit_keys() {
        let mut app = app_at(WizardStep::InputProblem);
        // 'q' is text on the input step.
        assert_eq!(press(&mut app, KeyCode::Char('q')), Action::None);
        assert_eq!(
            app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Action::Quit
        );
        assert_eq!(press(&mut App::new(), KeyCode::Char('q')), Action::Quit);
    }
}

use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};
use shuxin_client::{DecisionEvent, DecisionJob};
use shuxin_core::help::{HELP_BODY, HELP_DISMISS, HELP_ENTRY, HELP_TITLE};
use shuxin_core::{DecisionCard, EmotionalState, ProblemCategory, WizardStep};
use std::io::{self, Stdout};
use std::sync::mpsc::Receiver;
use tokio::sync::mpsc::UnboundedSender;

use crate::app::{Action, App};

const SPINNER: [&str; 4] = ["◐", "◓", "◑", "◒"];

pub fn run_wizard(
    jobs: UnboundedSender<DecisionJob>,
    events: Receiver<DecisionEvent>,
) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = wizard_loop(&mut terminal, &jobs, &events);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    res
}

fn wizard_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    jobs: &UnboundedSender<DecisionJob>,
    events: &Receiver<DecisionEvent>,
) -> Result<()> {
    let mut app = App::new();

    loop {
        while let Ok(ev) = events.try_recv() {
            app.on_decision(ev);
        }

        app.tick = app.tick.wrapping_add(1);
        terminal.draw(|f| draw(f, &app))?;

        if event::poll(std::time::Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                match app.handle_key(key) {
                    Action::Quit => break,
                    Action::Submit(sub) => {
                        let job = DecisionJob {
                            request_id: sub.token,
                            request: sub.request,
                        };
                        if let Err(e) = jobs.send(job) {
                            app.on_send_failed(e.0);
                        }
                    }
                    Action::None => {}
                }
            }
        }
    }

    Ok(())
}

fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(5),
            Constraint::Length(2),
        ])
        .split(f.area());

    let step = app.wizard.step();
    if step.can_go_back() {
        f.render_widget(
            Paragraph::new(Span::styled("← 返回上一页 (Esc)", Style::default().fg(Color::Blue))),
            chunks[0],
        );
    }

    match step {
        WizardStep::Welcome => draw_welcome(f, chunks[1]),
        WizardStep::SelectState => {
            let labels: Vec<&str> = EmotionalState::ALL.iter().map(|s| s.label()).collect();
            draw_choices(f, chunks[1], "第 1/3 步", "现在的状态", "您现在感觉怎么样？", &labels, app.cursor);
        }
        WizardStep::SelectCategory => {
            let labels: Vec<&str> = ProblemCategory::ALL.iter().map(|c| c.label()).collect();
            draw_choices(f, chunks[1], "第 2/3 步", "事情分类", "是什么样的事情？", &labels, app.cursor);
        }
        WizardStep::InputProblem => draw_input(f, chunks[1], app),
        WizardStep::Loading => draw_loading(f, chunks[1], app.tick),
        WizardStep::Result => draw_result(f, chunks[1], app),
    }

    let footer = Paragraph::new(Text::from(vec![
        Line::from(Span::styled(
            format!("F1 {HELP_ENTRY}"),
            Style::default().fg(Color::Gray).add_modifier(Modifier::UNDERLINED),
        )),
        Line::from(Span::styled(key_hints(step), Style::default().fg(Color::DarkGray))),
    ]))
    .alignment(Alignment::Center);
    f.render_widget(footer, chunks[2]);

    if let Some(notice) = app.notice {
        draw_popup(f, "提示", &[notice], "按任意键继续", Color::Blue);
    }
    if app.help.is_open() {
        draw_popup(f, HELP_TITLE, &HELP_BODY, HELP_DISMISS, Color::Red);
    }
}

fn key_hints(step: WizardStep) -> &'static str {
    match step {
        WizardStep::Welcome => "Enter 开始 · q 退出",
        WizardStep::SelectState | WizardStep::SelectCategory => {
            "1-4 / ↑↓ Enter 选择 · Esc 返回 · q 退出"
        }
        WizardStep::InputProblem => "Enter 提交 · Alt+Enter 换行 · F2 语音 · Esc 返回",
        WizardStep::Loading => "Esc 返回",
        WizardStep::Result => "a 换一种说法再问一次 · r 从头开始 · ↑↓ 滚动 · q 退出",
    }
}

fn draw_welcome(f: &mut Frame, area: Rect) {
    let text = Text::from(vec![
        Line::raw(""),
        Line::from(Span::styled(
            "舒心助手",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )),
        Line::raw(""),
        Line::from(Span::styled(
            "不替你做决定，只陪你把事情捋清楚",
            Style::default().fg(Color::Gray),
        )),
        Line::raw(""),
        Line::raw(""),
        Line::from(Span::styled(
            "[ 开始捋一捋 ]  按 Enter",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
    ]);
    f.render_widget(
        Paragraph::new(text)
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL)),
        area,
    );
}

fn draw_choices(
    f: &mut Frame,
    area: Rect,
    progress: &str,
    section: &str,
    question: &str,
    labels: &[&str],
    cursor: usize,
) {
    let mut lines = vec![
        Line::from(vec![
            Span::styled(progress.to_string(), Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("  "),
            Span::styled(section.to_string(), Style::default().fg(Color::Gray)),
        ]),
        Line::raw(""),
        Line::raw(question.to_string()),
        Line::raw(""),
    ];
    for (i, label) in labels.iter().enumerate() {
        let style = if i == cursor {
            Style::default().fg(Color::Black).bg(Color::Cyan)
        } else {
            Style::default().fg(Color::Cyan)
        };
        lines.push(Line::from(Span::styled(format!(" {}. {} ", i + 1, label), style)));
        lines.push(Line::raw(""));
    }
    f.render_widget(
        Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL)),
        area,
    );
}

fn draw_input(f: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(3), Constraint::Length(1)])
        .split(area);

    let header = Paragraph::new(Text::from(vec![
        Line::from(vec![
            Span::styled("第 3/3 步", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("  "),
            Span::styled("具体情况", Style::default().fg(Color::Gray)),
        ]),
        Line::raw(""),
        Line::raw("发生了什么事？"),
    ]));
    f.render_widget(header, chunks[0]);

    let text = app.wizard.text();
    let body = if text.is_empty() {
        Text::from(Span::styled(
            "在这里写下您担心的事情...（比如：电费单找不到了、明天要面试很紧张）",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        Text::from(format!("{text}▌"))
    };
    f.render_widget(
        Paragraph::new(body)
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL)),
        chunks[1],
    );

    let submit_style = if app.wizard.can_submit() {
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    f.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled("[ 帮我捋一捋 ]", submit_style),
            Span::raw("   "),
            Span::styled("[ 点这里用嘴说 F2 ]", Style::default().fg(Color::Blue)),
        ]))
        .alignment(Alignment::Center),
        chunks[2],
    );
}

fn draw_loading(f: &mut Frame, area: Rect, tick: usize) {
    let spinner = SPINNER[(tick / 4) % SPINNER.len()];
    let text = Text::from(vec![
        Line::raw(""),
        Line::from(Span::styled(spinner, Style::default().fg(Color::Blue))),
        Line::raw(""),
        Line::from(Span::styled("我在整理...很快", Style::default().add_modifier(Modifier::BOLD))),
        Line::raw(""),
        Line::from(Span::styled(
            "我正在帮你把事情理顺，先把最急的和不急的分开",
            Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC),
        )),
    ]);
    f.render_widget(
        Paragraph::new(text)
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL)),
        area,
    );
}

fn draw_result(f: &mut Frame, area: Rect, app: &App) {
    let mut lines = vec![
        Line::from(Span::styled(
            "为您捋出了几条思路",
            Style::default().add_modifier(Modifier::BOLD),
        ))
        .alignment(Alignment::Center),
        Line::raw(""),
    ];
    for card in app.wizard.results() {
        lines.extend(card_lines(card));
    }
    lines.push(Line::from(vec![
        Span::styled("[ 换一种说法再问一次 a ]", Style::default().fg(Color::Cyan)),
        Span::raw("   "),
        Span::styled("[ 从头开始 r ]", Style::default().fg(Color::Gray)),
    ]));

    f.render_widget(
        Paragraph::new(Text::from(lines))
            .wrap(Wrap { trim: false })
            .scroll((app.scroll, 0))
            .block(Block::default().borders(Borders::ALL)),
        area,
    );
}

/// Title, then content, then the numbered checklist when there is one.
fn card_lines(card: &DecisionCard) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from(vec![
        Span::styled("▍", Style::default().fg(Color::Blue)),
        Span::styled(card.title.clone(), Style::default().add_modifier(Modifier::BOLD)),
    ])];
    if let Some(content) = card.content.as_deref().filter(|c| !c.is_empty()) {
        lines.push(Line::raw(content.to_string()));
    }
    if let Some(items) = card.items.as_ref().filter(|i| !i.is_empty()) {
        for (i, item) in items.iter().enumerate() {
            lines.push(Line::from(vec![
                Span::styled(format!("  {}. ", i + 1), Style::default().fg(Color::Blue)),
                Span::raw(item.clone()),
            ]));
        }
    }
    lines.push(Line::raw(""));
    lines
}

fn draw_popup(f: &mut Frame, title: &str, body: &[&str], dismiss: &str, accent: Color) {
    let area = centered_rect(70, 50, f.area());
    let mut lines: Vec<Line> = Vec::new();
    for (i, para) in body.iter().enumerate() {
        if i > 0 {
            lines.push(Line::raw(""));
        }
        lines.push(Line::raw(para.to_string()));
    }
    lines.push(Line::raw(""));
    lines.push(
        Line::from(Span::styled(
            format!("[ {dismiss} ]"),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ))
        .alignment(Alignment::Center),
    );

    f.render_widget(Clear, area);
    f.render_widget(
        Paragraph::new(Text::from(lines)).wrap(Wrap { trim: false }).block(
            Block::default()
                .borders(Borders::ALL)
                .title(Span::styled(
                    title.to_string(),
                    Style::default().fg(accent).add_modifier(Modifier::BOLD),
                )),
        ),
        area,
    );
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

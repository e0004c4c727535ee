//! UI rendering for the coin quest game.

use crate::app::{App, ConfirmDialog, GachaPhase, MessageType, QuizPhase, Screen, SettingsRow};
use crate::models::{Difficulty, QuestionKind, Rarity};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
    Frame,
};

/// Draw the application.
pub fn draw(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Content
            Constraint::Length(3), // Footer/status
        ])
        .split(f.area());

    draw_header(f, app, chunks[0]);
    draw_content(f, app, chunks[1]);
    draw_footer(f, app, chunks[2]);

    if let Some(dialog) = &app.confirm_dialog {
        draw_confirm_dialog(f, dialog);
    }
}

fn draw_header(f: &mut Frame, app: &App, area: Rect) {
    let profile = app.engine.profile();
    let spans = if app.screen == Screen::Welcome {
        vec![Span::styled(
            "Coin Quest",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )]
    } else {
        vec![
            Span::styled(
                format!(" {} ", profile.name),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw("| "),
            Span::styled(
                format!("{} coins", profile.coins),
                Style::default().fg(Color::Yellow),
            ),
            Span::raw(" | "),
            Span::styled(
                format!("{} fruit on tree", profile.fruit_count()),
                Style::default().fg(Color::Green),
            ),
            Span::raw(" | "),
            Span::styled(
                format!("{} pulls left today", app.engine.remaining_pulls()),
                Style::default().fg(Color::Magenta),
            ),
        ]
    };

    let header = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL).title(" Coin Quest "))
        .alignment(Alignment::Center);

    f.render_widget(header, area);
}

fn draw_content(f: &mut Frame, app: &App, area: Rect) {
    match app.screen {
        Screen::Welcome => draw_welcome(f, app, area),
        Screen::Home => draw_home(f, app, area),
        Screen::Quiz => draw_quiz(f, app, area),
        Screen::Gacha => draw_gacha(f, app, area),
        Screen::SealGet => draw_seal_get(f, app, area),
        Screen::Tree => draw_tree(f, app, area),
        Screen::Collection => draw_collection(f, app, area),
        Screen::Settings => draw_settings(f, app, area),
    }
}

fn draw_welcome(f: &mut Frame, app: &App, area: Rect) {
    let lines = vec![
        Line::from(""),
        Line::from("Welcome, adventurer!"),
        Line::from(""),
        Line::from("What is your name?"),
        Line::from(""),
        Line::from(Span::styled(
            format!("> {}_", app.name_input),
            Style::default().fg(Color::Yellow),
        )),
    ];

    let welcome = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Center);

    f.render_widget(welcome, area);
}

fn draw_home(f: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = App::HOME_ITEMS
        .iter()
        .enumerate()
        .map(|(i, label)| {
            let style = if i == app.home_index {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
                    .bg(Color::DarkGray)
            } else {
                Style::default()
            };
            ListItem::new(Line::from(Span::styled(format!("  {label}"), style)))
        })
        .collect();

    let profile = app.engine.profile();
    let title = format!(
        " Home - {} seals, {} garden monsters ",
        profile.unlocked_seals.len(),
        profile.monsters.len()
    );

    let list = List::new(items).block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(list, area);
}

fn draw_quiz(f: &mut Frame, app: &App, area: Rect) {
    let Some(quiz) = &app.quiz else {
        return;
    };

    match quiz.phase {
        QuizPhase::PickDifficulty => {
            let items: Vec<ListItem> = Difficulty::ALL
                .iter()
                .enumerate()
                .map(|(i, d)| {
                    let style = if i == quiz.choice_index {
                        Style::default()
                            .fg(Color::Yellow)
                            .add_modifier(Modifier::BOLD)
                            .bg(Color::DarkGray)
                    } else {
                        Style::default()
                    };
                    let label = format!("  {} ({} questions)", d.name(), d.session_size());
                    ListItem::new(Line::from(Span::styled(label, style)))
                })
                .collect();

            let list = List::new(items)
                .block(Block::default().borders(Borders::ALL).title(" Pick a difficulty "));
            f.render_widget(list, area);
        }
        QuizPhase::Playing => draw_question(f, app, area),
        QuizPhase::Result => {
            let correct = quiz.correct_count();
            let total = quiz.results.len();
            let mut lines = vec![
                Line::from(""),
                Line::from(format!("You got {correct} out of {total}!")),
                Line::from(""),
            ];
            if quiz.all_correct() {
                let next = if quiz.extra {
                    "Perfect! You beat the danger stage!"
                } else {
                    "Perfect! A gacha capsule awaits..."
                };
                lines.push(Line::from(Span::styled(
                    next,
                    Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
                )));
            } else {
                lines.push(Line::from("Press r to retry the ones you missed."));
            }

            let result = Paragraph::new(lines)
                .block(Block::default().borders(Borders::ALL).title(" Results "))
                .alignment(Alignment::Center);
            f.render_widget(result, area);
        }
    }
}

fn draw_question(f: &mut Frame, app: &App, area: Rect) {
    let Some(quiz) = &app.quiz else {
        return;
    };
    let Some(question) = quiz.current() else {
        return;
    };

    let title = if quiz.extra {
        " DANGER STAGE ".to_string()
    } else {
        format!(
            " Question {}/{} ({}) ",
            quiz.index + 1,
            quiz.questions.len(),
            quiz.difficulty.name()
        )
    };

    let mut lines = vec![Line::from(question.text.clone()), Line::from("")];

    match question.kind {
        QuestionKind::Choice => {
            for (i, choice) in question.choices.iter().enumerate() {
                let style = if i == quiz.choice_index {
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };
                lines.push(Line::from(Span::styled(
                    format!("  {}. {}", i + 1, choice),
                    style,
                )));
            }
        }
        QuestionKind::Input => {
            lines.push(Line::from(Span::styled(
                format!("> {}_", quiz.input_buffer),
                Style::default().fg(Color::Yellow),
            )));
        }
    }

    let border_color = if quiz.extra { Color::Red } else { Color::Reset };
    let widget = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border_color))
                .title(title),
        )
        .wrap(Wrap { trim: true });

    f.render_widget(widget, area);
}

fn draw_gacha(f: &mut Frame, app: &App, area: Rect) {
    let Some(gacha) = &app.gacha else {
        return;
    };

    let lines = match &gacha.phase {
        GachaPhase::Ready => vec![
            Line::from(""),
            Line::from("A mysterious capsule machine stands before you."),
            Line::from(""),
            Line::from(Span::styled(
                "Press Enter to turn the crank!",
                Style::default().fg(Color::Yellow),
            )),
        ],
        GachaPhase::Rolling { .. } => vec![
            Line::from(""),
            Line::from(Span::styled(
                "* the capsule rattles and spins *",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )),
        ],
        GachaPhase::Result { outcome } => vec![
            Line::from(""),
            Line::from(Span::styled(
                format!("+{} coins!", outcome.reward),
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(format!("{} pulls left today", outcome.remaining)),
        ],
        GachaPhase::DangerPrompt => vec![
            Line::from(""),
            Line::from(Span::styled(
                "!!! WARNING !!!",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from("A monster guards a rare seal."),
            Line::from("One question. One chance."),
            Line::from(""),
            Line::from("Enter: fight   Esc: run away"),
        ],
    };

    let widget = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(" Gacha "))
        .alignment(Alignment::Center);

    f.render_widget(widget, area);
}

fn draw_seal_get(f: &mut Frame, app: &App, area: Rect) {
    let lines = match &app.seal_get {
        Some(seal) => {
            let mut lines = vec![
                Line::from(""),
                Line::from("You won a new seal!"),
                Line::from(""),
                Line::from(vec![
                    Span::styled(
                        format!("[{}] ", seal.rarity.name()),
                        rarity_style(seal.rarity),
                    ),
                    Span::styled(
                        seal.name.clone(),
                        Style::default().add_modifier(Modifier::BOLD),
                    ),
                ]),
            ];
            if let Some(description) = &seal.description {
                lines.push(Line::from(""));
                lines.push(Line::from(description.clone()));
            }
            lines
        }
        None => vec![
            Line::from(""),
            Line::from("The capsule was empty this time..."),
        ],
    };

    let widget = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(" Seal Get! "))
        .alignment(Alignment::Center);

    f.render_widget(widget, area);
}

fn draw_tree(f: &mut Frame, app: &App, area: Rect) {
    let profile = app.engine.profile();
    let fruit = profile.fruit_count();

    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "  (())  ",
            Style::default().fg(Color::Green),
        )),
        Line::from(Span::styled(
            " ((()))",
            Style::default().fg(Color::Green),
        )),
        Line::from("   ||   "),
        Line::from(""),
        Line::from(format!("{} ripe fruit ({} coins stored)", fruit, profile.tree_coins)),
        Line::from(format!(
            "{} coins banked this month",
            profile.monthly_harvested_coins
        )),
        Line::from(""),
    ];
    if fruit > 0 {
        lines.push(Line::from(Span::styled(
            "Press Enter to harvest a fruit (+10 coins)",
            Style::default().fg(Color::Yellow),
        )));
    } else {
        lines.push(Line::from("Win gacha coins to grow more fruit."));
    }

    let widget = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(" Coin Tree "))
        .alignment(Alignment::Center);

    f.render_widget(widget, area);
}

fn draw_collection(f: &mut Frame, app: &App, area: Rect) {
    let profile = app.engine.profile();
    let pool = app.engine.seal_pool();

    let items: Vec<ListItem> = pool
        .iter()
        .enumerate()
        .map(|(i, seal)| {
            let unlocked = profile.unlocked_seals.contains(&seal.id);
            let name = if unlocked {
                seal.name.clone()
            } else {
                "???".to_string()
            };

            let mut spans = vec![
                Span::styled(format!("[{:>2}] ", seal.rarity.name()), rarity_style(seal.rarity)),
                Span::styled(
                    name,
                    if unlocked {
                        Style::default()
                    } else {
                        Style::default().fg(Color::DarkGray)
                    },
                ),
            ];
            if unlocked {
                if let Some(description) = &seal.description {
                    spans.push(Span::styled(
                        format!("  {description}"),
                        Style::default().fg(Color::DarkGray),
                    ));
                }
            }

            let style = if i == app.collection_index {
                Style::default().bg(Color::DarkGray)
            } else {
                Style::default()
            };

            ListItem::new(Line::from(spans)).style(style)
        })
        .collect();

    let unlocked_in_pool = pool
        .iter()
        .filter(|s| profile.unlocked_seals.contains(&s.id))
        .count();
    // Unlocked ids with no entry in the current pool (the pool was swapped
    // out since they were won) still count toward the total.
    let stale = profile
        .unlocked_seals
        .iter()
        .filter(|id| crate::seals::find_seal(pool, id).is_none())
        .count();
    let title = if stale > 0 {
        format!(
            " Seal Book ({}/{}, +{} retired) ",
            unlocked_in_pool,
            pool.len(),
            stale
        )
    } else {
        format!(" Seal Book ({}/{}) ", unlocked_in_pool, pool.len())
    };

    let list = List::new(items).block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(list, area);
}

fn draw_settings(f: &mut Frame, app: &App, area: Rect) {
    if !app.settings_ui.unlocked {
        let masked = "*".repeat(app.settings_ui.passcode_input.len());
        let lines = vec![
            Line::from(""),
            Line::from("Grown-ups only! Enter the passcode:"),
            Line::from(""),
            Line::from(Span::styled(
                format!("> {masked}_"),
                Style::default().fg(Color::Yellow),
            )),
        ];
        let gate = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title(" Parent Settings "))
            .alignment(Alignment::Center);
        f.render_widget(gate, area);
        return;
    }

    let settings = app.engine.settings();
    let items: Vec<ListItem> = SettingsRow::ALL
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let value = match row {
                SettingsRow::MaxDailyGacha => settings.max_daily_gacha.to_string(),
                SettingsRow::MaxMonthlyCoins => settings.max_monthly_coins.to_string(),
                SettingsRow::RewardEasy => settings.coin_rewards.easy.to_string(),
                SettingsRow::RewardNormal => settings.coin_rewards.normal.to_string(),
                SettingsRow::RewardHard => settings.coin_rewards.hard.to_string(),
                SettingsRow::Passcode => "*".repeat(settings.parent_passcode.len()),
                SettingsRow::ImportCsv => {
                    format!("{} imported", app.engine.custom_question_count())
                }
                SettingsRow::ClearCustom | SettingsRow::ResetAll => String::new(),
            };

            let style = if i == app.settings_ui.row {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
                    .bg(Color::DarkGray)
            } else {
                Style::default()
            };

            let text = if value.is_empty() {
                format!("  {}", row.label())
            } else {
                format!("  {:<32} {}", row.label(), value)
            };
            ListItem::new(Line::from(Span::styled(text, style)))
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(" Parent Settings "));
    f.render_widget(list, area);

    if app.settings_ui.editing {
        draw_edit_dialog(f, app);
    }
}

fn draw_edit_dialog(f: &mut Frame, app: &App) {
    let area = centered_rect(50, 20, f.area());
    f.render_widget(Clear, area);

    let title = match SettingsRow::ALL[app.settings_ui.row] {
        SettingsRow::ImportCsv => "Path to CSV file",
        SettingsRow::Passcode => "New passcode",
        row => row.label(),
    };

    let input = Paragraph::new(app.settings_ui.input_buffer.as_str())
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {} ", title)),
        )
        .style(Style::default().fg(Color::Yellow));

    f.render_widget(input, area);

    f.set_cursor_position((
        area.x + 1 + app.settings_ui.input_buffer.len() as u16,
        area.y + 1,
    ));
}

fn rarity_style(rarity: Rarity) -> Style {
    let color = match rarity {
        Rarity::N => Color::Gray,
        Rarity::R => Color::Cyan,
        Rarity::SR => Color::Magenta,
        Rarity::UR => Color::Yellow,
    };
    Style::default().fg(color)
}

fn draw_footer(f: &mut Frame, app: &App, area: Rect) {
    let (msg, style) = if let Some((ref message, msg_type)) = app.message {
        let color = match msg_type {
            MessageType::Info => Color::Blue,
            MessageType::Success => Color::Green,
            MessageType::Error => Color::Red,
        };
        (message.clone(), Style::default().fg(color))
    } else {
        let help = match app.screen {
            Screen::Welcome => "Type your name, then press Enter",
            Screen::Home => "j/k:Navigate  Enter:Select  q:Quit",
            Screen::Quiz => "j/k or 1-4:Answer  Enter:Confirm  Esc:Give up",
            Screen::Gacha => "Enter:Pull  Esc:Walk away",
            Screen::SealGet => "Enter:Back home",
            Screen::Tree => "Enter:Harvest  Esc:Back",
            Screen::Collection => "j/k:Browse  Esc:Back",
            Screen::Settings => "j/k:Navigate  Enter:Edit  Esc:Back",
        };
        (help.to_string(), Style::default().fg(Color::DarkGray))
    };

    let footer = Paragraph::new(msg)
        .style(style)
        .block(Block::default().borders(Borders::ALL));

    f.render_widget(footer, area);
}

fn draw_confirm_dialog(f: &mut Frame, dialog: &ConfirmDialog) {
    let area = centered_rect(50, 20, f.area());
    f.render_widget(Clear, area);

    let text = Paragraph::new(dialog.message.clone())
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {} ", dialog.title)),
        )
        .wrap(Wrap { trim: true })
        .alignment(Alignment::Center);

    f.render_widget(text, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
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
        .split(popup_layout[1])[1]
}

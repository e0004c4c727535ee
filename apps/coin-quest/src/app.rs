//! Application state and logic.

use crate::config::Config;
use crate::engine::{Engine, GameError, PullOutcome};
use crate::models::{Difficulty, MonsterPlacement, Question, QuestionKind, Seal};
use crate::rewards;
use crate::store::Store;
use chrono::Utc;
use crossterm::event::{KeyCode, KeyEvent};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::{Duration, Instant};

/// Garden monsters awarded for surviving the danger stage.
const MONSTER_IMAGES: [&str; 4] = [
    "monsters/slime_knight.png",
    "monsters/fire_drake.png",
    "monsters/shadow_spirit.png",
    "monsters/forest_fox.png",
];

/// Application state.
pub struct App {
    pub engine: Engine,
    pub config: Config,
    pub rng: StdRng,
    pub screen: Screen,
    pub message: Option<(String, MessageType)>,
    pub confirm_dialog: Option<ConfirmDialog>,
    /// Name entry buffer on the welcome screen.
    pub name_input: String,
    /// Menu selection on the home screen.
    pub home_index: usize,
    pub quiz: Option<QuizSession>,
    pub gacha: Option<GachaSession>,
    /// Seal revealed after a danger-stage win.
    pub seal_get: Option<Seal>,
    pub collection_index: usize,
    pub settings_ui: SettingsUi,
}

/// Current screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Welcome,
    Home,
    Quiz,
    Gacha,
    SealGet,
    Tree,
    Collection,
    Settings,
}

/// Message type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    Info,
    Success,
    Error,
}

/// Confirmation dialog.
#[derive(Debug, Clone)]
pub struct ConfirmDialog {
    pub title: String,
    pub message: String,
    pub action: ConfirmAction,
}

/// Confirm action type.
#[derive(Debug, Clone)]
pub enum ConfirmAction {
    ResetAll,
    ClearCustomQuestions,
}

/// A quiz in progress.
pub struct QuizSession {
    pub difficulty: Difficulty,
    pub questions: Vec<Question>,
    pub index: usize,
    pub results: Vec<(Question, bool)>,
    pub choice_index: usize,
    pub input_buffer: String,
    pub phase: QuizPhase,
    /// True for the one-question danger stage.
    pub extra: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizPhase {
    PickDifficulty,
    Playing,
    Result,
}

impl QuizSession {
    fn picker() -> Self {
        Self {
            difficulty: Difficulty::Easy,
            questions: Vec::new(),
            index: 0,
            results: Vec::new(),
            choice_index: 0,
            input_buffer: String::new(),
            phase: QuizPhase::PickDifficulty,
            extra: false,
        }
    }

    pub fn current(&self) -> Option<&Question> {
        self.questions.get(self.index)
    }

    pub fn correct_count(&self) -> usize {
        self.results.iter().filter(|(_, ok)| *ok).count()
    }

    pub fn all_correct(&self) -> bool {
        !self.results.is_empty() && self.correct_count() == self.results.len()
    }
}

/// A gacha visit in progress.
pub struct GachaSession {
    pub difficulty: Difficulty,
    pub phase: GachaPhase,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GachaPhase {
    Ready,
    /// Capsule is spinning. The reward is neither computed nor committed
    /// until the timer fires; abandoning here leaves the profile untouched.
    Rolling { reveal_at: Instant },
    Result { outcome: PullOutcome },
    DangerPrompt,
}

/// Settings screen state.
pub struct SettingsUi {
    pub unlocked: bool,
    pub passcode_input: String,
    pub row: usize,
    pub editing: bool,
    pub input_buffer: String,
}

impl SettingsUi {
    fn locked() -> Self {
        Self {
            unlocked: false,
            passcode_input: String::new(),
            row: 0,
            editing: false,
            input_buffer: String::new(),
        }
    }
}

/// Editable rows on the settings screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsRow {
    MaxDailyGacha,
    MaxMonthlyCoins,
    RewardEasy,
    RewardNormal,
    RewardHard,
    Passcode,
    ImportCsv,
    ClearCustom,
    ResetAll,
}

impl SettingsRow {
    pub const ALL: [SettingsRow; 9] = [
        Self::MaxDailyGacha,
        Self::MaxMonthlyCoins,
        Self::RewardEasy,
        Self::RewardNormal,
        Self::RewardHard,
        Self::Passcode,
        Self::ImportCsv,
        Self::ClearCustom,
        Self::ResetAll,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::MaxDailyGacha => "Gacha pulls per day",
            Self::MaxMonthlyCoins => "Monthly coin ceiling",
            Self::RewardEasy => "Reward: easy",
            Self::RewardNormal => "Reward: normal",
            Self::RewardHard => "Reward: hard",
            Self::Passcode => "Parent passcode",
            Self::ImportCsv => "Import questions from CSV file",
            Self::ClearCustom => "Clear imported questions",
            Self::ResetAll => "Erase all data",
        }
    }
}

impl App {
    /// Create new application against the configured data directory.
    pub fn new() -> anyhow::Result<Self> {
        let config = Config::load();
        let store = Store::open(config.data_path())?;
        let engine = Engine::load(store, Utc::now().date_naive());
        Ok(Self::with_engine(engine, config, StdRng::from_entropy()))
    }

    /// Assemble an app from parts (tests inject a seeded rng and an
    /// in-memory store through here).
    pub fn with_engine(engine: Engine, config: Config, rng: StdRng) -> Self {
        let screen = if engine.is_fresh() {
            Screen::Welcome
        } else {
            Screen::Home
        };
        Self {
            engine,
            config,
            rng,
            screen,
            message: None,
            confirm_dialog: None,
            name_input: String::new(),
            home_index: 0,
            quiz: None,
            gacha: None,
            seal_get: None,
            collection_index: 0,
            settings_ui: SettingsUi::locked(),
        }
    }

    /// Whether a bare `q` may quit right now.
    pub fn can_quit(&self) -> bool {
        matches!(self.screen, Screen::Home) && self.confirm_dialog.is_none()
    }

    /// Advance timers. Runs the daily-reset check each pass so the gacha
    /// counter is always current before any limit check, and commits a
    /// pending gacha reward once its reveal timer fires.
    pub fn tick(&mut self) {
        self.engine.ensure_daily_reset(Utc::now().date_naive());

        let due = matches!(
            &self.gacha,
            Some(GachaSession {
                phase: GachaPhase::Rolling { reveal_at },
                ..
            }) if Instant::now() >= *reveal_at
        );
        if due && self.screen == Screen::Gacha {
            self.commit_pull();
        }
    }

    /// Commit the staged pull. Runs exactly once per reveal; the reward is
    /// applied against the live profile, never a stale copy.
    fn commit_pull(&mut self) {
        let Some(gacha) = &mut self.gacha else {
            return;
        };
        match self.engine.attempt_gacha_pull(gacha.difficulty, &mut self.rng) {
            Ok(outcome) => {
                gacha.phase = GachaPhase::Result { outcome };
            }
            Err(e) => {
                self.message = Some((e.to_string(), MessageType::Error));
                self.gacha = None;
                self.screen = Screen::Home;
            }
        }
    }

    /// Handle key input.
    pub fn handle_key(&mut self, key: KeyEvent) {
        if let Some(dialog) = self.confirm_dialog.clone() {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => {
                    self.confirm_dialog = None;
                    self.execute_confirm(dialog.action);
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    self.confirm_dialog = None;
                }
                _ => {}
            }
            return;
        }

        self.message = None;

        match self.screen {
            Screen::Welcome => self.handle_welcome_key(key),
            Screen::Home => self.handle_home_key(key),
            Screen::Quiz => self.handle_quiz_key(key),
            Screen::Gacha => self.handle_gacha_key(key),
            Screen::SealGet => self.handle_seal_get_key(key),
            Screen::Tree => self.handle_tree_key(key),
            Screen::Collection => self.handle_collection_key(key),
            Screen::Settings => self.handle_settings_key(key),
        }
    }

    fn execute_confirm(&mut self, action: ConfirmAction) {
        match action {
            ConfirmAction::ResetAll => {
                self.engine.reset_all(Utc::now().date_naive());
                self.settings_ui = SettingsUi::locked();
                self.name_input.clear();
                self.screen = Screen::Welcome;
                self.message = Some(("All data erased".to_string(), MessageType::Info));
            }
            ConfirmAction::ClearCustomQuestions => {
                self.engine.clear_custom_questions();
                self.message = Some((
                    "Imported questions cleared".to_string(),
                    MessageType::Success,
                ));
            }
        }
    }

    // Welcome

    fn handle_welcome_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => {
                let name = self.name_input.trim();
                if !name.is_empty() {
                    let name = name.to_string();
                    self.engine
                        .create_profile(&name, Utc::now().date_naive());
                    self.screen = Screen::Home;
                    self.message = Some((format!("Welcome, {name}!"), MessageType::Success));
                }
            }
            KeyCode::Backspace => {
                self.name_input.pop();
            }
            KeyCode::Char(c) => {
                if self.name_input.len() < 20 {
                    self.name_input.push(c);
                }
            }
            _ => {}
        }
    }

    // Home

    pub const HOME_ITEMS: [&'static str; 4] = ["Quiz", "Coin Tree", "Seal Book", "Parent Settings"];

    fn handle_home_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                self.home_index = (self.home_index + 1) % Self::HOME_ITEMS.len();
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.home_index =
                    (self.home_index + Self::HOME_ITEMS.len() - 1) % Self::HOME_ITEMS.len();
            }
            KeyCode::Enter => match self.home_index {
                0 => {
                    self.quiz = Some(QuizSession::picker());
                    self.screen = Screen::Quiz;
                }
                1 => self.screen = Screen::Tree,
                2 => {
                    self.collection_index = 0;
                    self.screen = Screen::Collection;
                }
                _ => {
                    self.settings_ui = SettingsUi::locked();
                    self.screen = Screen::Settings;
                }
            },
            _ => {}
        }
    }

    // Quiz

    fn handle_quiz_key(&mut self, key: KeyEvent) {
        let Some(quiz) = &mut self.quiz else {
            self.screen = Screen::Home;
            return;
        };

        match quiz.phase {
            QuizPhase::PickDifficulty => match key.code {
                KeyCode::Char('j') | KeyCode::Down => {
                    quiz.choice_index = (quiz.choice_index + 1) % Difficulty::ALL.len();
                }
                KeyCode::Char('k') | KeyCode::Up => {
                    quiz.choice_index =
                        (quiz.choice_index + Difficulty::ALL.len() - 1) % Difficulty::ALL.len();
                }
                KeyCode::Enter => {
                    let difficulty = Difficulty::ALL[quiz.choice_index];
                    self.start_quiz(difficulty, false);
                }
                KeyCode::Esc => {
                    self.quiz = None;
                    self.screen = Screen::Home;
                }
                _ => {}
            },
            QuizPhase::Playing => self.handle_quiz_answer_key(key),
            QuizPhase::Result => match key.code {
                KeyCode::Enter => self.finish_quiz(),
                KeyCode::Char('r') => {
                    if !self.quiz.as_ref().is_some_and(|q| q.all_correct()) {
                        self.retry_missed();
                    }
                }
                KeyCode::Esc => {
                    self.quiz = None;
                    self.screen = Screen::Home;
                }
                _ => {}
            },
        }
    }

    /// Start a session. An empty pool is fatal to the session and sends
    /// the player back to a safe screen with the error spelled out.
    pub fn start_quiz(&mut self, difficulty: Difficulty, extra: bool) {
        let count = if extra { 1 } else { difficulty.session_size() };
        match self.engine.select_session(difficulty, count, &mut self.rng) {
            Ok(questions) => {
                self.quiz = Some(QuizSession {
                    difficulty,
                    questions,
                    index: 0,
                    results: Vec::new(),
                    choice_index: 0,
                    input_buffer: String::new(),
                    phase: QuizPhase::Playing,
                    extra,
                });
                self.screen = Screen::Quiz;
            }
            Err(e) => {
                self.message = Some((e.to_string(), MessageType::Error));
                self.quiz = None;
                self.screen = Screen::Home;
            }
        }
    }

    fn handle_quiz_answer_key(&mut self, key: KeyEvent) {
        let Some(quiz) = &mut self.quiz else {
            return;
        };
        let Some(question) = quiz.current().cloned() else {
            quiz.phase = QuizPhase::Result;
            return;
        };

        match question.kind {
            QuestionKind::Choice => match key.code {
                KeyCode::Char('j') | KeyCode::Down => {
                    if !question.choices.is_empty() {
                        quiz.choice_index = (quiz.choice_index + 1) % question.choices.len();
                    }
                }
                KeyCode::Char('k') | KeyCode::Up => {
                    if !question.choices.is_empty() {
                        quiz.choice_index = (quiz.choice_index + question.choices.len() - 1)
                            % question.choices.len();
                    }
                }
                KeyCode::Char(c) if c.is_ascii_digit() => {
                    let n = c as usize - '0' as usize;
                    if (1..=question.choices.len()).contains(&n) {
                        let given = question.choices[n - 1].clone();
                        self.submit_answer(&question, &given);
                    }
                }
                KeyCode::Enter => {
                    if let Some(given) = question.choices.get(quiz.choice_index).cloned() {
                        self.submit_answer(&question, &given);
                    }
                }
                KeyCode::Esc => {
                    self.quiz = None;
                    self.screen = Screen::Home;
                }
                _ => {}
            },
            QuestionKind::Input => match key.code {
                KeyCode::Enter => {
                    let given = quiz.input_buffer.clone();
                    self.submit_answer(&question, &given);
                }
                KeyCode::Backspace => {
                    quiz.input_buffer.pop();
                }
                KeyCode::Char(c) => {
                    quiz.input_buffer.push(c);
                }
                KeyCode::Esc => {
                    self.quiz = None;
                    self.screen = Screen::Home;
                }
                _ => {}
            },
        }
    }

    fn submit_answer(&mut self, question: &Question, given: &str) {
        let is_correct = question.is_correct(given);
        // Mastery is committed per answered question, even if the session
        // is abandoned afterwards.
        self.engine.record_answer(question, is_correct);

        let explanation = if self.config.display.show_explanations {
            question.explanation.as_deref()
        } else {
            None
        };
        self.message = Some(if is_correct {
            match explanation {
                Some(why) => (format!("Correct! {why}"), MessageType::Success),
                None => ("Correct!".to_string(), MessageType::Success),
            }
        } else {
            let mut text = format!("Not quite. The answer was: {}", question.answer);
            if let Some(why) = explanation {
                text.push(' ');
                text.push_str(why);
            }
            (text, MessageType::Error)
        });

        let Some(quiz) = &mut self.quiz else {
            return;
        };
        quiz.results.push((question.clone(), is_correct));
        quiz.index += 1;
        quiz.choice_index = 0;
        quiz.input_buffer.clear();
        if quiz.index >= quiz.questions.len() {
            quiz.phase = QuizPhase::Result;
        }
    }

    /// Leave the result screen: a perfect normal quiz earns a gacha visit,
    /// a perfect danger stage earns a seal draw.
    fn finish_quiz(&mut self) {
        let Some(quiz) = self.quiz.take() else {
            self.screen = Screen::Home;
            return;
        };

        if !quiz.all_correct() {
            self.screen = Screen::Home;
            return;
        }

        if quiz.extra {
            self.award_danger_prizes(quiz.difficulty);
        } else {
            self.gacha = Some(GachaSession {
                difficulty: quiz.difficulty,
                phase: GachaPhase::Ready,
            });
            self.screen = Screen::Gacha;
        }
    }

    /// Rebuild the session from the questions that were missed.
    fn retry_missed(&mut self) {
        let Some(quiz) = &mut self.quiz else {
            return;
        };
        let missed: Vec<Question> = quiz
            .results
            .iter()
            .filter(|(_, ok)| !*ok)
            .map(|(q, _)| q.clone())
            .collect();
        if missed.is_empty() {
            return;
        }
        quiz.questions = missed;
        quiz.index = 0;
        quiz.results.clear();
        quiz.choice_index = 0;
        quiz.input_buffer.clear();
        quiz.phase = QuizPhase::Playing;
    }

    fn award_danger_prizes(&mut self, difficulty: Difficulty) {
        let seal = rewards::draw_seal(difficulty, self.engine.seal_pool(), &mut self.rng).cloned();
        if let Some(seal) = &seal {
            self.engine.unlock_seal(&seal.id);
        }

        let image = MONSTER_IMAGES[self.rng.gen_range(0..MONSTER_IMAGES.len())];
        let placement = MonsterPlacement::new(
            image,
            self.rng.gen_range(0.0..100.0),
            self.rng.gen_range(0.0..100.0),
            self.rng.gen_range(0.8..1.3),
        );
        self.engine.place_monster(placement);

        self.seal_get = seal;
        self.screen = Screen::SealGet;
    }

    // Gacha

    fn handle_gacha_key(&mut self, key: KeyEvent) {
        let Some(gacha) = &mut self.gacha else {
            self.screen = Screen::Home;
            return;
        };

        match gacha.phase {
            GachaPhase::Ready => match key.code {
                KeyCode::Enter | KeyCode::Char(' ') => {
                    self.engine.ensure_daily_reset(Utc::now().date_naive());
                    if self.engine.remaining_pulls() == 0 {
                        self.message = Some((
                            GameError::GachaLimitReached.to_string(),
                            MessageType::Error,
                        ));
                        self.gacha = None;
                        self.screen = Screen::Home;
                        return;
                    }
                    let reveal_at =
                        Instant::now() + Duration::from_millis(self.config.gacha.reveal_ms);
                    if let Some(gacha) = &mut self.gacha {
                        gacha.phase = GachaPhase::Rolling { reveal_at };
                    }
                }
                KeyCode::Esc => {
                    self.gacha = None;
                    self.screen = Screen::Home;
                }
                _ => {}
            },
            // Abandoning mid-spin commits nothing.
            GachaPhase::Rolling { .. } => {
                if key.code == KeyCode::Esc {
                    self.gacha = None;
                    self.screen = Screen::Home;
                }
            }
            GachaPhase::Result { outcome } => match key.code {
                KeyCode::Enter => {
                    if outcome.danger {
                        gacha.phase = GachaPhase::DangerPrompt;
                    } else {
                        self.gacha = None;
                        self.screen = Screen::Home;
                    }
                }
                KeyCode::Esc => {
                    self.gacha = None;
                    self.screen = Screen::Home;
                }
                _ => {}
            },
            GachaPhase::DangerPrompt => match key.code {
                KeyCode::Enter => {
                    let difficulty = gacha.difficulty;
                    self.gacha = None;
                    self.start_quiz(difficulty, true);
                }
                KeyCode::Esc => {
                    self.gacha = None;
                    self.screen = Screen::Home;
                }
                _ => {}
            },
        }
    }

    fn handle_seal_get_key(&mut self, key: KeyEvent) {
        if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
            self.seal_get = None;
            self.screen = Screen::Home;
        }
    }

    // Tree

    fn handle_tree_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter | KeyCode::Char(' ') => {
                if self.engine.harvest_fruit() {
                    self.message = Some((
                        "Harvested a fruit: +10 coins banked!".to_string(),
                        MessageType::Success,
                    ));
                } else {
                    self.message =
                        Some(("No ripe fruit on the tree yet".to_string(), MessageType::Info));
                }
            }
            KeyCode::Esc => self.screen = Screen::Home,
            _ => {}
        }
    }

    // Collection

    fn handle_collection_key(&mut self, key: KeyEvent) {
        let pool_len = self.engine.seal_pool().len();
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                if pool_len > 0 {
                    self.collection_index = (self.collection_index + 1) % pool_len;
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                if pool_len > 0 {
                    self.collection_index = (self.collection_index + pool_len - 1) % pool_len;
                }
            }
            KeyCode::Esc => self.screen = Screen::Home,
            _ => {}
        }
    }

    // Settings

    fn handle_settings_key(&mut self, key: KeyEvent) {
        if !self.settings_ui.unlocked {
            match key.code {
                KeyCode::Enter => {
                    if self.settings_ui.passcode_input == self.engine.settings().parent_passcode {
                        self.settings_ui.unlocked = true;
                    } else {
                        self.settings_ui.passcode_input.clear();
                        self.message =
                            Some(("Wrong passcode".to_string(), MessageType::Error));
                    }
                }
                KeyCode::Backspace => {
                    self.settings_ui.passcode_input.pop();
                }
                KeyCode::Char(c) => self.settings_ui.passcode_input.push(c),
                KeyCode::Esc => self.screen = Screen::Home,
                _ => {}
            }
            return;
        }

        if self.settings_ui.editing {
            match key.code {
                KeyCode::Enter => self.commit_settings_edit(),
                KeyCode::Esc => {
                    self.settings_ui.editing = false;
                    self.settings_ui.input_buffer.clear();
                }
                KeyCode::Backspace => {
                    self.settings_ui.input_buffer.pop();
                }
                KeyCode::Char(c) => self.settings_ui.input_buffer.push(c),
                _ => {}
            }
            return;
        }

        match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                self.settings_ui.row = (self.settings_ui.row + 1) % SettingsRow::ALL.len();
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.settings_ui.row =
                    (self.settings_ui.row + SettingsRow::ALL.len() - 1) % SettingsRow::ALL.len();
            }
            KeyCode::Enter => self.activate_settings_row(),
            KeyCode::Esc => self.screen = Screen::Home,
            _ => {}
        }
    }

    fn activate_settings_row(&mut self) {
        let settings = self.engine.settings();
        match SettingsRow::ALL[self.settings_ui.row] {
            SettingsRow::MaxDailyGacha => self.begin_edit(settings.max_daily_gacha.to_string()),
            SettingsRow::MaxMonthlyCoins => {
                self.begin_edit(settings.max_monthly_coins.to_string())
            }
            SettingsRow::RewardEasy => self.begin_edit(settings.coin_rewards.easy.to_string()),
            SettingsRow::RewardNormal => self.begin_edit(settings.coin_rewards.normal.to_string()),
            SettingsRow::RewardHard => self.begin_edit(settings.coin_rewards.hard.to_string()),
            SettingsRow::Passcode => self.begin_edit(settings.parent_passcode.clone()),
            SettingsRow::ImportCsv => self.begin_edit(String::new()),
            SettingsRow::ClearCustom => {
                self.confirm_dialog = Some(ConfirmDialog {
                    title: "Clear imported questions".to_string(),
                    message: format!(
                        "Remove all {} imported questions? (y/n)",
                        self.engine.custom_question_count()
                    ),
                    action: ConfirmAction::ClearCustomQuestions,
                });
            }
            SettingsRow::ResetAll => {
                self.confirm_dialog = Some(ConfirmDialog {
                    title: "Erase all data".to_string(),
                    message: "Really erase every profile, setting, and import? \
                              This cannot be undone. (y/n)"
                        .to_string(),
                    action: ConfirmAction::ResetAll,
                });
            }
        }
    }

    fn begin_edit(&mut self, initial: String) {
        self.settings_ui.editing = true;
        self.settings_ui.input_buffer = initial;
    }

    fn commit_settings_edit(&mut self) {
        let buffer = self.settings_ui.input_buffer.clone();
        self.settings_ui.editing = false;
        self.settings_ui.input_buffer.clear();

        let row = SettingsRow::ALL[self.settings_ui.row];
        if row == SettingsRow::ImportCsv {
            self.import_from_file(buffer.trim());
            return;
        }

        let mut settings = self.engine.settings().clone();
        match row {
            SettingsRow::Passcode => {
                let trimmed = buffer.trim();
                if trimmed.is_empty() {
                    self.message =
                        Some(("Passcode cannot be empty".to_string(), MessageType::Error));
                    return;
                }
                settings.parent_passcode = trimmed.to_string();
            }
            _ => {
                let Ok(value) = buffer.trim().parse::<u32>() else {
                    self.message =
                        Some(("Enter a positive number".to_string(), MessageType::Error));
                    return;
                };
                if value == 0 {
                    self.message =
                        Some(("Value must be at least 1".to_string(), MessageType::Error));
                    return;
                }
                match row {
                    SettingsRow::MaxDailyGacha => settings.max_daily_gacha = value,
                    SettingsRow::MaxMonthlyCoins => settings.max_monthly_coins = value,
                    SettingsRow::RewardEasy => settings.coin_rewards.easy = value,
                    SettingsRow::RewardNormal => settings.coin_rewards.normal = value,
                    SettingsRow::RewardHard => settings.coin_rewards.hard = value,
                    _ => {}
                }
            }
        }
        self.engine.update_settings(settings);
        self.message = Some(("Settings saved".to_string(), MessageType::Success));
    }

    fn import_from_file(&mut self, path: &str) {
        if path.is_empty() {
            return;
        }
        match std::fs::read_to_string(path) {
            Ok(csv) => {
                let summary = self.engine.import_questions(&csv);
                self.message = Some((
                    format!(
                        "Imported {} questions, skipped {} rows",
                        summary.imported, summary.skipped
                    ),
                    if summary.imported > 0 {
                        MessageType::Success
                    } else {
                        MessageType::Error
                    },
                ));
            }
            Err(e) => {
                self.message = Some((format!("Could not read {path}: {e}"), MessageType::Error));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Settings;
    use chrono::Utc;
    use crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn test_app() -> App {
        let mut engine = Engine::load(Store::in_memory(), Utc::now().date_naive());
        engine.create_profile("Kid", Utc::now().date_naive());
        let mut config = Config::default();
        config.gacha.reveal_ms = 0;
        App::with_engine(engine, config, StdRng::seed_from_u64(7))
    }

    fn answer_current_correctly(app: &mut App) {
        let question = app.quiz.as_ref().unwrap().current().unwrap().clone();
        let answer = question.answer.clone();
        app.submit_answer(&question, &answer);
    }

    #[test]
    fn test_fresh_app_starts_on_welcome() {
        let engine = Engine::load(Store::in_memory(), Utc::now().date_naive());
        let app = App::with_engine(engine, Config::default(), StdRng::seed_from_u64(1));
        assert_eq!(app.screen, Screen::Welcome);
    }

    #[test]
    fn test_welcome_name_entry_creates_profile() {
        let engine = Engine::load(Store::in_memory(), Utc::now().date_naive());
        let mut app = App::with_engine(engine, Config::default(), StdRng::seed_from_u64(1));
        for c in "Ava".chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.screen, Screen::Home);
        assert_eq!(app.engine.profile().name, "Ava");
    }

    #[test]
    fn test_perfect_quiz_leads_to_gacha() {
        let mut app = test_app();
        app.start_quiz(Difficulty::Easy, false);
        for _ in 0..3 {
            answer_current_correctly(&mut app);
        }
        assert_eq!(app.quiz.as_ref().unwrap().phase, QuizPhase::Result);
        assert!(app.quiz.as_ref().unwrap().all_correct());

        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.screen, Screen::Gacha);
    }

    #[test]
    fn test_imperfect_quiz_goes_home_and_can_retry() {
        let mut app = test_app();
        app.start_quiz(Difficulty::Easy, false);

        let question = app.quiz.as_ref().unwrap().current().unwrap().clone();
        app.submit_answer(&question, "definitely wrong");
        answer_current_correctly(&mut app);
        answer_current_correctly(&mut app);

        assert!(!app.quiz.as_ref().unwrap().all_correct());
        app.handle_key(key(KeyCode::Char('r')));
        let quiz = app.quiz.as_ref().unwrap();
        assert_eq!(quiz.phase, QuizPhase::Playing);
        assert_eq!(quiz.questions.len(), 1);
        assert_eq!(quiz.questions[0].id, question.id);
    }

    #[test]
    fn test_gacha_commit_is_staged_behind_reveal() {
        let mut app = test_app();
        app.gacha = Some(GachaSession {
            difficulty: Difficulty::Normal,
            phase: GachaPhase::Ready,
        });
        app.screen = Screen::Gacha;

        app.handle_key(key(KeyCode::Enter));
        assert!(matches!(
            app.gacha.as_ref().unwrap().phase,
            GachaPhase::Rolling { .. }
        ));
        // Nothing is committed while the capsule spins.
        assert_eq!(app.engine.profile().daily_gacha_count, 0);
        assert_eq!(app.engine.profile().coins, 0);

        // reveal_ms is 0 in tests, so the next tick commits.
        app.tick();
        let GachaPhase::Result { outcome } = app.gacha.as_ref().unwrap().phase else {
            panic!("expected result phase");
        };
        assert_eq!(app.engine.profile().daily_gacha_count, 1);
        assert_eq!(app.engine.profile().coins, outcome.reward);
    }

    #[test]
    fn test_abandoning_spin_commits_nothing() {
        let mut app = test_app();
        app.config.gacha.reveal_ms = 60_000;
        app.gacha = Some(GachaSession {
            difficulty: Difficulty::Normal,
            phase: GachaPhase::Ready,
        });
        app.screen = Screen::Gacha;

        app.handle_key(key(KeyCode::Enter));
        app.handle_key(key(KeyCode::Esc));
        app.tick();

        assert_eq!(app.screen, Screen::Home);
        assert_eq!(app.engine.profile().daily_gacha_count, 0);
        assert_eq!(app.engine.profile().coins, 0);
    }

    #[test]
    fn test_gacha_at_limit_bounces_home() {
        let mut app = test_app();
        let mut settings = app.engine.settings().clone();
        settings.max_daily_gacha = 1;
        app.engine.update_settings(settings);
        let mut rng = StdRng::seed_from_u64(1);
        app.engine
            .attempt_gacha_pull(Difficulty::Easy, &mut rng)
            .unwrap();

        app.gacha = Some(GachaSession {
            difficulty: Difficulty::Easy,
            phase: GachaPhase::Ready,
        });
        app.screen = Screen::Gacha;
        app.handle_key(key(KeyCode::Enter));

        assert_eq!(app.screen, Screen::Home);
        assert!(matches!(
            app.message,
            Some((_, MessageType::Error))
        ));
    }

    #[test]
    fn test_danger_win_awards_seal_and_monster() {
        let mut app = test_app();
        app.start_quiz(Difficulty::Hard, true);
        assert_eq!(app.quiz.as_ref().unwrap().questions.len(), 1);

        answer_current_correctly(&mut app);
        app.handle_key(key(KeyCode::Enter));

        assert_eq!(app.screen, Screen::SealGet);
        let seal = app.seal_get.as_ref().expect("a seal was drawn");
        assert!(app.engine.profile().unlocked_seals.contains(&seal.id));
        assert_eq!(app.engine.profile().monsters.len(), 1);
        let monster = &app.engine.profile().monsters[0];
        assert!((0.0..=100.0).contains(&monster.x));
        assert!((0.0..=100.0).contains(&monster.y));
        assert!(monster.scale > 0.0);
    }

    #[test]
    fn test_settings_gate_requires_passcode() {
        let mut app = test_app();
        app.screen = Screen::Settings;

        for c in "9999".chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
        app.handle_key(key(KeyCode::Enter));
        assert!(!app.settings_ui.unlocked);

        for c in Settings::default().parent_passcode.chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
        app.handle_key(key(KeyCode::Enter));
        assert!(app.settings_ui.unlocked);
    }

    #[test]
    fn test_reset_requires_confirmation() {
        let mut app = test_app();
        app.engine.unlock_seal("s1");
        app.screen = Screen::Settings;
        app.settings_ui.unlocked = true;
        app.settings_ui.row = SettingsRow::ALL.len() - 1; // ResetAll

        app.handle_key(key(KeyCode::Enter));
        assert!(app.confirm_dialog.is_some());

        app.handle_key(key(KeyCode::Char('n')));
        assert!(app.confirm_dialog.is_none());
        assert!(!app.engine.profile().unlocked_seals.is_empty());

        app.handle_key(key(KeyCode::Enter));
        app.handle_key(key(KeyCode::Char('y')));
        assert_eq!(app.screen, Screen::Welcome);
        assert!(app.engine.is_fresh());
        assert!(app.engine.profile().unlocked_seals.is_empty());
    }

    #[test]
    fn test_harvest_key_moves_coins() {
        let mut app = test_app();
        let mut settings = app.engine.settings().clone();
        settings.max_daily_gacha = 100;
        app.engine.update_settings(settings);
        let mut rng = StdRng::seed_from_u64(2);
        app.engine
            .attempt_gacha_pull(Difficulty::Hard, &mut rng)
            .unwrap();
        let staged = app.engine.profile().tree_coins;
        assert!(staged >= 10);

        app.screen = Screen::Tree;
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.engine.profile().tree_coins, staged - 10);
        assert_eq!(app.engine.profile().monthly_harvested_coins, 10);
    }
}

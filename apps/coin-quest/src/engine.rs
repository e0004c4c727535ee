//! Progression engine: the single authority for every profile mutation.
//!
//! All game rules live here: the daily reset, the gacha limit gate, coin
//! ceilings, tree harvesting, seal unlocks, and mastery counts. The UI
//! never touches the profile directly. Persistence is fire-and-forget: a
//! failed write is logged and the in-memory profile stays authoritative.

use crate::models::{
    Difficulty, MonsterPlacement, Profile, Question, Seal, Settings, HARVEST_UNIT,
};
use crate::questions::{self, ImportSummary};
use crate::rewards;
use crate::seals;
use crate::store::Store;
use chrono::NaiveDate;
use rand::Rng;
use thiserror::Error;

/// Game rule violations surfaced to the player.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GameError {
    #[error("no gacha pulls left today")]
    GachaLimitReached,
    #[error("no {} questions are available", .0.name())]
    EmptyQuestionPool(Difficulty),
}

/// Result of a successful gacha pull.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PullOutcome {
    /// Coins awarded by this pull.
    pub reward: u32,
    /// Pulls left today after this one.
    pub remaining: u32,
    /// Set when this pull spent the last slot; the caller offers the
    /// bonus danger challenge, the engine only signals.
    pub danger: bool,
}

/// The progression engine. Owns the store, the profile, and the settings.
pub struct Engine {
    store: Store,
    profile: Profile,
    settings: Settings,
    bank: Vec<Question>,
    custom: Vec<Question>,
    default_seals: Vec<Seal>,
    fresh: bool,
}

impl Engine {
    /// Load state from the store. When no profile record exists the engine
    /// holds a provisional profile that is not persisted until
    /// [`Engine::create_profile`] runs with the player's chosen name.
    pub fn load(store: Store, today: NaiveDate) -> Self {
        let settings = store.load_settings();
        let custom = store.load_custom_questions();
        let (profile, fresh) = match store.load_profile() {
            Some(profile) => (profile, false),
            None => (Profile::new("Explorer", today), true),
        };

        let mut engine = Self {
            store,
            profile,
            settings,
            bank: questions::built_in_questions(),
            custom,
            default_seals: seals::default_seals(),
            fresh,
        };
        if !engine.fresh {
            engine.ensure_daily_reset(today);
        }
        engine
    }

    /// Whether this is a first launch with no persisted profile yet.
    pub fn is_fresh(&self) -> bool {
        self.fresh
    }

    /// Create and persist the profile. Runs once, on first launch.
    pub fn create_profile(&mut self, name: &str, today: NaiveDate) {
        self.profile = Profile::new(name, today);
        self.fresh = false;
        self.persist_profile();
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Replace the settings and persist them.
    pub fn update_settings(&mut self, settings: Settings) {
        self.settings = settings;
        if let Err(e) = self.store.save_settings(&self.settings) {
            tracing::warn!("failed to save settings: {e}");
        }
    }

    /// The seal pool in effect: custom seals replace the defaults entirely
    /// when configured.
    pub fn seal_pool(&self) -> &[Seal] {
        seals::active_pool(&self.settings, &self.default_seals)
    }

    /// Gacha pulls left today.
    pub fn remaining_pulls(&self) -> u32 {
        self.settings
            .max_daily_gacha
            .saturating_sub(self.profile.daily_gacha_count)
    }

    /// Zero the daily gacha counter when the calendar day has rolled over.
    /// Idempotent; must run before any gacha-count check in a session.
    pub fn ensure_daily_reset(&mut self, today: NaiveDate) {
        if self.profile.last_played_date == today {
            return;
        }
        self.profile.daily_gacha_count = 0;
        self.profile.last_played_date = today;
        self.persist_profile();
    }

    /// Spend one gacha pull and apply its coin reward.
    ///
    /// Fails without touching the profile once the daily limit is reached.
    /// Coin balances are clamped to the monthly ceiling, never wrapped.
    pub fn attempt_gacha_pull(
        &mut self,
        difficulty: Difficulty,
        rng: &mut impl Rng,
    ) -> Result<PullOutcome, GameError> {
        if self.profile.daily_gacha_count >= self.settings.max_daily_gacha {
            return Err(GameError::GachaLimitReached);
        }

        let base = self.settings.coin_rewards.base(difficulty);
        let reward = rewards::roll_reward(base, rng);
        let ceiling = self.settings.max_monthly_coins;

        let profile = &mut self.profile;
        profile.coins = profile.coins.saturating_add(reward).min(ceiling);
        profile.monthly_coins = profile.monthly_coins.saturating_add(reward).min(ceiling);
        profile.tree_coins = profile.tree_coins.saturating_add(reward);
        profile.daily_gacha_count += 1;

        let remaining = self.remaining_pulls();
        self.persist_profile();

        Ok(PullOutcome {
            reward,
            remaining,
            danger: remaining == 0,
        })
    }

    /// Record a quiz answer. Correct answers bump the question's clear
    /// count; incorrect answers change nothing.
    pub fn record_answer(&mut self, question: &Question, is_correct: bool) {
        if !is_correct {
            return;
        }
        *self
            .profile
            .question_clear_counts
            .entry(question.id.clone())
            .or_insert(0) += 1;
        self.persist_profile();
    }

    /// Harvest one fruit from the coin tree. Returns false, leaving the
    /// profile untouched, when there is nothing ripe to pick.
    pub fn harvest_fruit(&mut self) -> bool {
        if self.profile.tree_coins < HARVEST_UNIT {
            return false;
        }
        self.profile.tree_coins -= HARVEST_UNIT;
        self.profile.monthly_harvested_coins += HARVEST_UNIT;
        self.persist_profile();
        true
    }

    /// Unlock a seal. Idempotent; persists only when the set changed.
    pub fn unlock_seal(&mut self, seal_id: &str) -> bool {
        let added = self.profile.unlocked_seals.insert(seal_id.to_string());
        if added {
            self.persist_profile();
        }
        added
    }

    /// Add a decorative monster to the garden.
    pub fn place_monster(&mut self, placement: MonsterPlacement) {
        self.profile.monsters.push(placement);
        self.persist_profile();
    }

    /// Pick a session's worth of questions, built-in and imported pools
    /// merged, biased toward questions with low clear counts.
    pub fn select_session(
        &self,
        difficulty: Difficulty,
        count: usize,
        rng: &mut impl Rng,
    ) -> Result<Vec<Question>, GameError> {
        let mut pool = self.bank.clone();
        pool.extend(self.custom.iter().cloned());

        let picked = questions::select_questions(
            &pool,
            difficulty,
            count,
            &self.profile.question_clear_counts,
            rng,
        );
        if picked.is_empty() {
            return Err(GameError::EmptyQuestionPool(difficulty));
        }
        Ok(picked)
    }

    /// Import custom questions from CSV text. Bad rows are skipped and
    /// counted; good rows are appended to the stored list.
    pub fn import_questions(&mut self, csv: &str) -> ImportSummary {
        let (parsed, summary) = questions::parse_csv(csv);
        if !parsed.is_empty() {
            if let Err(e) = self.store.append_custom_questions(&parsed) {
                tracing::warn!("failed to save imported questions: {e}");
            }
            self.custom.extend(parsed);
        }
        summary
    }

    pub fn custom_question_count(&self) -> usize {
        self.custom.len()
    }

    pub fn clear_custom_questions(&mut self) {
        if let Err(e) = self.store.clear_custom_questions() {
            tracing::warn!("failed to clear imported questions: {e}");
        }
        self.custom.clear();
    }

    /// Erase every durable record and return to the first-launch state.
    pub fn reset_all(&mut self, today: NaiveDate) {
        if let Err(e) = self.store.reset_all() {
            tracing::warn!("failed to erase stored records: {e}");
        }
        self.profile = Profile::new("Explorer", today);
        self.settings = Settings::default();
        self.custom.clear();
        self.fresh = true;
    }

    fn persist_profile(&mut self) {
        if let Err(e) = self.store.save_profile(&self.profile) {
            tracing::warn!("failed to save profile: {e}");
        }
    }

    #[cfg(test)]
    fn set_bank(&mut self, bank: Vec<Question>) {
        self.bank = bank;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    fn engine_with_profile() -> Engine {
        let mut engine = Engine::load(Store::in_memory(), day(1));
        engine.create_profile("Kid", day(1));
        engine
    }

    #[test]
    fn test_fresh_launch_then_create() {
        let mut engine = Engine::load(Store::in_memory(), day(1));
        assert!(engine.is_fresh());
        engine.create_profile("Kid", day(1));
        assert!(!engine.is_fresh());
        assert_eq!(engine.profile().name, "Kid");
        assert_eq!(engine.profile().coins, 0);
    }

    #[test]
    fn test_daily_reset_on_new_day() {
        let mut engine = engine_with_profile();
        engine.profile.daily_gacha_count = 2;

        engine.ensure_daily_reset(day(2));
        assert_eq!(engine.profile().daily_gacha_count, 0);
        assert_eq!(engine.profile().last_played_date, day(2));
    }

    #[test]
    fn test_daily_reset_is_idempotent() {
        let mut engine = engine_with_profile();
        engine.ensure_daily_reset(day(2));
        let snapshot = engine.profile().clone();

        engine.ensure_daily_reset(day(2));
        assert_eq!(*engine.profile(), snapshot);
    }

    #[test]
    fn test_same_day_keeps_gacha_count() {
        let mut engine = engine_with_profile();
        engine.profile.daily_gacha_count = 2;
        engine.ensure_daily_reset(day(1));
        assert_eq!(engine.profile().daily_gacha_count, 2);
    }

    #[test]
    fn test_pull_at_limit_fails_without_mutation() {
        let mut engine = engine_with_profile();
        engine.profile.daily_gacha_count = engine.settings.max_daily_gacha;
        let snapshot = engine.profile().clone();

        let mut rng = StdRng::seed_from_u64(1);
        let err = engine
            .attempt_gacha_pull(Difficulty::Easy, &mut rng)
            .unwrap_err();
        assert_eq!(err, GameError::GachaLimitReached);
        assert_eq!(*engine.profile(), snapshot);
    }

    #[test]
    fn test_last_pull_raises_danger_flag() {
        let mut engine = engine_with_profile();
        engine.profile.daily_gacha_count = 2;
        assert_eq!(engine.settings().max_daily_gacha, 3);

        let mut rng = StdRng::seed_from_u64(1);
        let outcome = engine
            .attempt_gacha_pull(Difficulty::Normal, &mut rng)
            .unwrap();
        assert_eq!(engine.profile().daily_gacha_count, 3);
        assert_eq!(outcome.remaining, 0);
        assert!(outcome.danger);
    }

    #[test]
    fn test_pull_before_limit_has_no_danger() {
        let mut engine = engine_with_profile();
        let mut rng = StdRng::seed_from_u64(1);
        let outcome = engine
            .attempt_gacha_pull(Difficulty::Normal, &mut rng)
            .unwrap();
        assert_eq!(outcome.remaining, 2);
        assert!(!outcome.danger);
        assert!(outcome.reward >= 1);
    }

    #[test]
    fn test_monthly_ceiling_clamps_not_wraps() {
        let mut engine = engine_with_profile();
        engine.profile.coins = 995;
        engine.profile.monthly_coins = 995;

        let mut rng = StdRng::seed_from_u64(1);
        let outcome = engine
            .attempt_gacha_pull(Difficulty::Hard, &mut rng)
            .unwrap();
        assert!(outcome.reward >= 25); // hard base 30, variance -5..=5
        assert_eq!(engine.profile().coins, 1000);
        assert_eq!(engine.profile().monthly_coins, 1000);
        // The tree balance is not subject to the ceiling.
        assert_eq!(engine.profile().tree_coins, outcome.reward);
    }

    #[test]
    fn test_rewards_stay_in_declared_range() {
        let mut engine = engine_with_profile();
        engine.settings.max_daily_gacha = 1000;
        let mut rng = StdRng::seed_from_u64(99);
        for _ in 0..200 {
            let outcome = engine
                .attempt_gacha_pull(Difficulty::Easy, &mut rng)
                .unwrap();
            assert!((10..=20).contains(&outcome.reward)); // easy base 15
        }
    }

    #[test]
    fn test_record_answer_counts_only_correct() {
        let mut engine = engine_with_profile();
        let question = engine.bank[0].clone();

        engine.record_answer(&question, false);
        assert_eq!(engine.profile().clear_count(&question.id), 0);

        engine.record_answer(&question, true);
        engine.record_answer(&question, true);
        assert_eq!(engine.profile().clear_count(&question.id), 2);
    }

    #[test]
    fn test_harvest_conservation() {
        let mut engine = engine_with_profile();
        engine.profile.tree_coins = 47;

        let mut harvested = 0;
        while engine.harvest_fruit() {
            harvested += 1;
        }
        assert_eq!(harvested, 4);
        assert_eq!(engine.profile().tree_coins, 7);
        assert_eq!(engine.profile().monthly_harvested_coins, 40);

        // Below one unit: nothing moves.
        assert!(!engine.harvest_fruit());
        assert_eq!(engine.profile().tree_coins, 7);
    }

    #[test]
    fn test_fruit_count_follows_tree_coins() {
        let mut engine = engine_with_profile();
        engine.profile.tree_coins = 35;
        assert_eq!(engine.profile().fruit_count(), 3);
        engine.harvest_fruit();
        assert_eq!(engine.profile().fruit_count(), 2);
    }

    #[test]
    fn test_unlock_seal_is_idempotent() {
        let mut engine = engine_with_profile();
        assert!(engine.unlock_seal("s4"));
        assert!(!engine.unlock_seal("s4"));
        assert_eq!(engine.profile().unlocked_seals.len(), 1);
    }

    #[test]
    fn test_empty_pool_is_an_error() {
        let mut engine = engine_with_profile();
        engine.set_bank(Vec::new());
        let mut rng = StdRng::seed_from_u64(1);
        let err = engine
            .select_session(Difficulty::Hard, 5, &mut rng)
            .unwrap_err();
        assert_eq!(err, GameError::EmptyQuestionPool(Difficulty::Hard));
    }

    #[test]
    fn test_imported_questions_join_their_difficulty() {
        let mut engine = engine_with_profile();
        engine.set_bank(Vec::new());
        let summary = engine.import_questions("choice,hard,math,99x99=?,9801,9801,9901");
        assert_eq!(summary.imported, 1);

        let mut rng = StdRng::seed_from_u64(1);
        let session = engine.select_session(Difficulty::Hard, 5, &mut rng).unwrap();
        assert_eq!(session.len(), 1);
        assert_eq!(session[0].answer, "9801");
    }

    #[test]
    fn test_reset_all_returns_to_first_launch() {
        let mut engine = engine_with_profile();
        engine.profile.coins = 500;
        engine.unlock_seal("s1");

        engine.reset_all(day(3));
        assert!(engine.is_fresh());
        assert_eq!(engine.profile().coins, 0);
        assert!(engine.profile().unlocked_seals.is_empty());
        assert_eq!(*engine.settings(), Settings::default());
    }

    #[test]
    fn test_state_survives_reload() {
        let mut engine = engine_with_profile();
        let mut rng = StdRng::seed_from_u64(1);
        let outcome = engine.attempt_gacha_pull(Difficulty::Easy, &mut rng).unwrap();
        engine.unlock_seal("s2");

        // Hand the same backing store to a new engine.
        let Engine { store, .. } = engine;
        let reloaded = Engine::load(store, day(1));
        assert!(!reloaded.is_fresh());
        assert_eq!(reloaded.profile().coins, outcome.reward);
        assert_eq!(reloaded.profile().daily_gacha_count, 1);
        assert!(reloaded.profile().unlocked_seals.contains("s2"));
    }

    #[test]
    fn test_reload_on_new_day_resets_counter() {
        let mut engine = engine_with_profile();
        let mut rng = StdRng::seed_from_u64(1);
        engine.attempt_gacha_pull(Difficulty::Easy, &mut rng).unwrap();

        let Engine { store, .. } = engine;
        let reloaded = Engine::load(store, day(2));
        assert_eq!(reloaded.profile().daily_gacha_count, 0);
        assert_eq!(reloaded.profile().last_played_date, day(2));
    }
}

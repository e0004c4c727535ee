//! Data models for the quiz game and its reward economy.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

/// Coins released by one harvest of the coin tree.
pub const HARVEST_UNIT: u32 = 10;

/// Question difficulty tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Normal,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Self::Easy, Self::Normal, Self::Hard];

    /// Get display name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Easy => "Easy",
            Self::Normal => "Normal",
            Self::Hard => "Hard",
        }
    }

    /// Questions per quiz session at this tier.
    pub fn session_size(&self) -> usize {
        match self {
            Self::Easy => 3,
            Self::Normal => 4,
            Self::Hard => 5,
        }
    }

    /// Parse a lowercase difficulty word (used by the CSV importer).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Some(Self::Easy),
            "normal" => Some(Self::Normal),
            "hard" => Some(Self::Hard),
            _ => None,
        }
    }
}

/// Seal rarity, ordered from common to ultra rare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Rarity {
    N,
    R,
    SR,
    UR,
}

impl Rarity {
    /// Get display name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::N => "N",
            Self::R => "R",
            Self::SR => "SR",
            Self::UR => "UR",
        }
    }
}

/// A collectible seal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Seal {
    /// Unique identifier within the pool.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Image reference (path or URL, presentation decides).
    pub image: String,
    /// Rarity tier.
    pub rarity: Rarity,
    /// Optional flavor text.
    #[serde(default)]
    pub description: Option<String>,
}

/// Question category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Money,
    Math,
    Other,
}

impl Category {
    /// Parse a category word, anything unknown lands in `Other`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "money" => Self::Money,
            "math" => Self::Math,
            _ => Self::Other,
        }
    }
}

/// How a question is answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionKind {
    /// Pick one of the listed choices.
    Choice,
    /// Free-form text input.
    Input,
}

impl Default for QuestionKind {
    fn default() -> Self {
        Self::Choice
    }
}

/// A quiz question, built-in or imported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Unique identifier.
    pub id: String,
    /// Category.
    pub category: Category,
    /// Difficulty tier.
    pub difficulty: Difficulty,
    /// Prompt text.
    pub text: String,
    /// Correct answer.
    pub answer: String,
    /// Choices for multiple-choice questions.
    #[serde(default)]
    pub choices: Vec<String>,
    /// Optional explanation shown after answering.
    #[serde(default)]
    pub explanation: Option<String>,
    /// Answer mode.
    #[serde(default)]
    pub kind: QuestionKind,
}

impl Question {
    /// Create a multiple-choice question.
    pub fn new_choice(
        id: impl Into<String>,
        category: Category,
        difficulty: Difficulty,
        text: impl Into<String>,
        answer: impl Into<String>,
        choices: &[&str],
    ) -> Self {
        Self {
            id: id.into(),
            category,
            difficulty,
            text: text.into(),
            answer: answer.into(),
            choices: choices.iter().map(|c| c.to_string()).collect(),
            explanation: None,
            kind: QuestionKind::Choice,
        }
    }

    /// Check an answer against the expected one.
    pub fn is_correct(&self, given: &str) -> bool {
        self.answer.trim() == given.trim()
    }
}

/// A decorative monster placed in the home garden.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonsterPlacement {
    /// Image reference.
    pub image: String,
    /// Horizontal position, percent of the garden width.
    pub x: f32,
    /// Vertical position, percent of the garden height.
    pub y: f32,
    /// Render scale, always positive.
    pub scale: f32,
}

impl MonsterPlacement {
    /// Create a placement, clamping coordinates into the garden.
    pub fn new(image: impl Into<String>, x: f32, y: f32, scale: f32) -> Self {
        Self {
            image: image.into(),
            x: x.clamp(0.0, 100.0),
            y: y.clamp(0.0, 100.0),
            scale: if scale > 0.0 { scale } else { 1.0 },
        }
    }
}

/// The single player profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Opaque identifier, assigned once at creation.
    pub id: String,
    /// Display name, set at creation.
    pub name: String,
    /// Lifetime coins, clamped to the monthly ceiling on increment.
    pub coins: u32,
    /// Coins earned this month, clamped to the monthly ceiling.
    pub monthly_coins: u32,
    /// Coins staged on the tree, waiting to be harvested.
    pub tree_coins: u32,
    /// Units harvested from the tree so far this month.
    pub monthly_harvested_coins: u32,
    /// Calendar day of the last session, drives the daily reset.
    pub last_played_date: NaiveDate,
    /// Gacha pulls spent today.
    pub daily_gacha_count: u32,
    /// Seals unlocked so far. Grows monotonically, inserts are idempotent.
    pub unlocked_seals: BTreeSet<String>,
    /// Times each question has been answered correctly.
    pub question_clear_counts: BTreeMap<String, u32>,
    /// Garden decorations, cosmetic only.
    pub monsters: Vec<MonsterPlacement>,
}

impl Profile {
    /// Create a fresh profile for a new player.
    pub fn new(name: impl Into<String>, today: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            coins: 0,
            monthly_coins: 0,
            tree_coins: 0,
            monthly_harvested_coins: 0,
            last_played_date: today,
            daily_gacha_count: 0,
            unlocked_seals: BTreeSet::new(),
            question_clear_counts: BTreeMap::new(),
            monsters: Vec::new(),
        }
    }

    /// Harvestable fruit on the tree right now. Always computed fresh,
    /// never cached across mutations.
    pub fn fruit_count(&self) -> u32 {
        self.tree_coins / HARVEST_UNIT
    }

    /// Clear count for a question, 0 when never answered correctly.
    pub fn clear_count(&self, question_id: &str) -> u32 {
        self.question_clear_counts
            .get(question_id)
            .copied()
            .unwrap_or(0)
    }
}

/// Per-difficulty base coin rewards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinRewards {
    pub easy: u32,
    pub normal: u32,
    pub hard: u32,
}

impl CoinRewards {
    /// Base reward for a difficulty tier.
    pub fn base(&self, difficulty: Difficulty) -> u32 {
        match difficulty {
            Difficulty::Easy => self.easy,
            Difficulty::Normal => self.normal,
            Difficulty::Hard => self.hard,
        }
    }
}

impl Default for CoinRewards {
    fn default() -> Self {
        Self {
            easy: 15,
            normal: 22,
            hard: 30,
        }
    }
}

/// Parent-controlled game settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Gacha pulls allowed per calendar day.
    pub max_daily_gacha: u32,
    /// Ceiling for `coins` and `monthly_coins`.
    pub max_monthly_coins: u32,
    /// Base coin value per difficulty.
    pub coin_rewards: CoinRewards,
    /// Passcode gating the settings screen.
    pub parent_passcode: String,
    /// When non-empty, replaces the default seal pool entirely.
    #[serde(default)]
    pub custom_seals: Vec<Seal>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_daily_gacha: 3,
            max_monthly_coins: 1000,
            coin_rewards: CoinRewards::default(),
            parent_passcode: "1234".to_string(),
            custom_seals: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_sizes() {
        assert_eq!(Difficulty::Easy.session_size(), 3);
        assert_eq!(Difficulty::Normal.session_size(), 4);
        assert_eq!(Difficulty::Hard.session_size(), 5);
    }

    #[test]
    fn test_difficulty_parse() {
        assert_eq!(Difficulty::parse(" Hard "), Some(Difficulty::Hard));
        assert_eq!(Difficulty::parse("impossible"), None);
    }

    #[test]
    fn test_rarity_order() {
        assert!(Rarity::N < Rarity::R);
        assert!(Rarity::R < Rarity::SR);
        assert!(Rarity::SR < Rarity::UR);
    }

    #[test]
    fn test_placement_clamping() {
        let m = MonsterPlacement::new("fox.png", 130.0, -5.0, 0.0);
        assert_eq!(m.x, 100.0);
        assert_eq!(m.y, 0.0);
        assert_eq!(m.scale, 1.0);
    }

    #[test]
    fn test_fruit_count() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let mut profile = Profile::new("Kid", today);
        assert_eq!(profile.fruit_count(), 0);
        profile.tree_coins = 35;
        assert_eq!(profile.fruit_count(), 3);
    }

    #[test]
    fn test_answer_check_trims() {
        let q = Question::new_choice(
            "q1",
            Category::Math,
            Difficulty::Easy,
            "1+1=?",
            "2",
            &["1", "2", "3"],
        );
        assert!(q.is_correct(" 2 "));
        assert!(!q.is_correct("3"));
    }

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.max_daily_gacha, 3);
        assert_eq!(settings.max_monthly_coins, 1000);
        assert_eq!(settings.coin_rewards.base(Difficulty::Normal), 22);
        assert!(settings.custom_seals.is_empty());
    }
}

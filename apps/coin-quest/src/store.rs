//! Durable storage for the game: three independent JSON records in the
//! platform data directory. A missing record always means "use defaults",
//! and a damaged record is recovered field by field, never surfaced.

use crate::models::{MonsterPlacement, Profile, Question, Seal, Settings};
use chrono::NaiveDate;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

const PROFILE_KEY: &str = "profile.json";
const SETTINGS_KEY: &str = "settings.json";
const CUSTOM_QUESTIONS_KEY: &str = "custom-questions.json";

/// Storage errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

enum Backing {
    Dir(PathBuf),
    Memory(HashMap<String, String>),
}

/// Key-to-JSON record store.
pub struct Store {
    backing: Backing,
}

impl Store {
    /// Open a store rooted at a directory, creating it if needed.
    pub fn open(root: PathBuf) -> StoreResult<Self> {
        std::fs::create_dir_all(&root)?;
        Ok(Self {
            backing: Backing::Dir(root),
        })
    }

    /// Create an in-memory store (for testing).
    pub fn in_memory() -> Self {
        Self {
            backing: Backing::Memory(HashMap::new()),
        }
    }

    fn read(&self, key: &str) -> Option<String> {
        match &self.backing {
            Backing::Dir(root) => std::fs::read_to_string(root.join(key)).ok(),
            Backing::Memory(map) => map.get(key).cloned(),
        }
    }

    fn write(&mut self, key: &str, value: String) -> StoreResult<()> {
        match &mut self.backing {
            Backing::Dir(root) => {
                std::fs::write(root.join(key), value)?;
            }
            Backing::Memory(map) => {
                map.insert(key.to_string(), value);
            }
        }
        Ok(())
    }

    fn remove(&mut self, key: &str) -> StoreResult<()> {
        match &mut self.backing {
            Backing::Dir(root) => match std::fs::remove_file(root.join(key)) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(e.into()),
            },
            Backing::Memory(map) => {
                map.remove(key);
                Ok(())
            }
        }
    }

    /// Load the profile. `None` means no record exists yet (first launch).
    pub fn load_profile(&self) -> Option<Profile> {
        let raw = self.read(PROFILE_KEY)?;
        match serde_json::from_str::<Value>(&raw) {
            Ok(value) => Some(profile_from_value(&value)),
            Err(e) => {
                tracing::warn!("profile record is not valid JSON, starting fresh: {e}");
                None
            }
        }
    }

    pub fn save_profile(&mut self, profile: &Profile) -> StoreResult<()> {
        let json = serde_json::to_string_pretty(profile)?;
        self.write(PROFILE_KEY, json)
    }

    /// Load settings, falling back to defaults field by field.
    pub fn load_settings(&self) -> Settings {
        match self.read(SETTINGS_KEY) {
            Some(raw) => match serde_json::from_str::<Value>(&raw) {
                Ok(value) => settings_from_value(&value),
                Err(e) => {
                    tracing::warn!("settings record is not valid JSON, using defaults: {e}");
                    Settings::default()
                }
            },
            None => Settings::default(),
        }
    }

    pub fn save_settings(&mut self, settings: &Settings) -> StoreResult<()> {
        let json = serde_json::to_string_pretty(settings)?;
        self.write(SETTINGS_KEY, json)
    }

    /// Load imported questions. Damaged entries are dropped individually.
    pub fn load_custom_questions(&self) -> Vec<Question> {
        let Some(raw) = self.read(CUSTOM_QUESTIONS_KEY) else {
            return Vec::new();
        };
        match serde_json::from_str::<Vec<Value>>(&raw) {
            Ok(items) => items
                .iter()
                .filter_map(|v| serde_json::from_value(v.clone()).ok())
                .collect(),
            Err(e) => {
                tracing::warn!("custom question record is not valid JSON: {e}");
                Vec::new()
            }
        }
    }

    /// Append imported questions to the stored list. Additive only, no
    /// dedupe against existing entries.
    pub fn append_custom_questions(&mut self, questions: &[Question]) -> StoreResult<()> {
        let mut all = self.load_custom_questions();
        all.extend_from_slice(questions);
        let json = serde_json::to_string_pretty(&all)?;
        self.write(CUSTOM_QUESTIONS_KEY, json)
    }

    pub fn clear_custom_questions(&mut self) -> StoreResult<()> {
        self.remove(CUSTOM_QUESTIONS_KEY)
    }

    /// Erase every durable record. No undo; the next load is first-launch.
    pub fn reset_all(&mut self) -> StoreResult<()> {
        self.remove(PROFILE_KEY)?;
        self.remove(SETTINGS_KEY)?;
        self.remove(CUSTOM_QUESTIONS_KEY)?;
        Ok(())
    }
}

// Field-level decoding with safe defaults. Every field is validated
// independently so a partially damaged record still yields a usable value.

fn profile_from_value(value: &Value) -> Profile {
    let unlocked_seals: BTreeSet<String> = value
        .get("unlocked_seals")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let question_clear_counts: BTreeMap<String, u32> = value
        .get("question_clear_counts")
        .and_then(Value::as_object)
        .map(|map| {
            map.iter()
                .filter_map(|(k, v)| v.as_u64().map(|n| (k.clone(), clamp_u32(n))))
                .collect()
        })
        .unwrap_or_default();

    let monsters: Vec<MonsterPlacement> = value
        .get("monsters")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|v| serde_json::from_value::<MonsterPlacement>(v.clone()).ok())
                .map(|m| MonsterPlacement::new(m.image, m.x, m.y, m.scale))
                .collect()
        })
        .unwrap_or_default();

    Profile {
        id: get_string(value, "id").unwrap_or_else(|| Uuid::new_v4().to_string()),
        name: get_string(value, "name").unwrap_or_else(|| "Unknown".to_string()),
        coins: get_u32(value, "coins"),
        monthly_coins: get_u32(value, "monthly_coins"),
        tree_coins: get_u32(value, "tree_coins"),
        monthly_harvested_coins: get_u32(value, "monthly_harvested_coins"),
        last_played_date: get_date(value, "last_played_date"),
        daily_gacha_count: get_u32(value, "daily_gacha_count"),
        unlocked_seals,
        question_clear_counts,
        monsters,
    }
}

fn settings_from_value(value: &Value) -> Settings {
    let defaults = Settings::default();

    let coin_rewards = value
        .get("coin_rewards")
        .map(|v| crate::models::CoinRewards {
            easy: get_positive_u32(v, "easy", defaults.coin_rewards.easy),
            normal: get_positive_u32(v, "normal", defaults.coin_rewards.normal),
            hard: get_positive_u32(v, "hard", defaults.coin_rewards.hard),
        })
        .unwrap_or(defaults.coin_rewards);

    let custom_seals: Vec<Seal> = value
        .get("custom_seals")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|v| serde_json::from_value(v.clone()).ok())
                .collect()
        })
        .unwrap_or_default();

    Settings {
        max_daily_gacha: get_positive_u32(value, "max_daily_gacha", defaults.max_daily_gacha),
        max_monthly_coins: get_positive_u32(value, "max_monthly_coins", defaults.max_monthly_coins),
        coin_rewards,
        parent_passcode: get_string(value, "parent_passcode")
            .unwrap_or(defaults.parent_passcode),
        custom_seals,
    }
}

fn clamp_u32(n: u64) -> u32 {
    n.min(u32::MAX as u64) as u32
}

fn get_u32(value: &Value, key: &str) -> u32 {
    value
        .get(key)
        .and_then(Value::as_u64)
        .map(clamp_u32)
        .unwrap_or(0)
}

fn get_positive_u32(value: &Value, key: &str, default: u32) -> u32 {
    value
        .get(key)
        .and_then(Value::as_u64)
        .map(clamp_u32)
        .filter(|n| *n > 0)
        .unwrap_or(default)
}

fn get_string(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn get_date(value: &Value, key: &str) -> NaiveDate {
    // An unreadable date falls back to the epoch so the next daily-reset
    // check zeroes the gacha counter rather than silently keeping it.
    value
        .get(key)
        .and_then(Value::as_str)
        .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, Difficulty};

    #[test]
    fn test_missing_records_mean_defaults() {
        let store = Store::in_memory();
        assert!(store.load_profile().is_none());
        assert_eq!(store.load_settings(), Settings::default());
        assert!(store.load_custom_questions().is_empty());
    }

    #[test]
    fn test_profile_round_trip_is_fixed_point() {
        let mut store = Store::in_memory();
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let mut profile = Profile::new("Kid", today);
        profile.coins = 120;
        profile.tree_coins = 45;
        profile.unlocked_seals.insert("s4".to_string());
        profile
            .question_clear_counts
            .insert("q1".to_string(), 3);

        store.save_profile(&profile).unwrap();
        let loaded = store.load_profile().unwrap();
        assert_eq!(loaded, profile);

        // Once through a load-with-defaults cycle, saving again changes nothing.
        store.save_profile(&loaded).unwrap();
        assert_eq!(store.load_profile().unwrap(), loaded);
    }

    #[test]
    fn test_partially_damaged_profile_recovers_per_field() {
        let mut store = Store::in_memory();
        store
            .write(
                PROFILE_KEY,
                r#"{
                    "name": "Kid",
                    "coins": "not a number",
                    "tree_coins": 30,
                    "last_played_date": "garbage",
                    "unlocked_seals": ["s1", 42, "s2"],
                    "question_clear_counts": {"q1": 2, "q2": "bad"}
                }"#
                .to_string(),
            )
            .unwrap();

        let profile = store.load_profile().unwrap();
        assert_eq!(profile.name, "Kid");
        assert_eq!(profile.coins, 0);
        assert_eq!(profile.tree_coins, 30);
        assert_eq!(profile.last_played_date, NaiveDate::default());
        assert_eq!(profile.unlocked_seals.len(), 2);
        assert_eq!(profile.question_clear_counts.get("q1"), Some(&2));
        assert_eq!(profile.question_clear_counts.get("q2"), None);
        assert!(!profile.id.is_empty());
    }

    #[test]
    fn test_settings_reject_zero_limits() {
        let mut store = Store::in_memory();
        store
            .write(
                SETTINGS_KEY,
                r#"{"max_daily_gacha": 0, "max_monthly_coins": 500}"#.to_string(),
            )
            .unwrap();

        let settings = store.load_settings();
        assert_eq!(settings.max_daily_gacha, 3);
        assert_eq!(settings.max_monthly_coins, 500);
    }

    #[test]
    fn test_custom_questions_are_additive() {
        let mut store = Store::in_memory();
        let q = Question::new_choice(
            "c1",
            Category::Math,
            Difficulty::Normal,
            "1+1=?",
            "2",
            &["1", "2", "3"],
        );
        store.append_custom_questions(&[q.clone()]).unwrap();
        store.append_custom_questions(&[q.clone()]).unwrap();
        // No auto-dedupe: importing the same row twice keeps both copies.
        assert_eq!(store.load_custom_questions().len(), 2);

        store.clear_custom_questions().unwrap();
        assert!(store.load_custom_questions().is_empty());
    }

    #[test]
    fn test_reset_all_erases_everything() {
        let mut store = Store::in_memory();
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        store.save_profile(&Profile::new("Kid", today)).unwrap();
        store.save_settings(&Settings::default()).unwrap();

        store.reset_all().unwrap();
        assert!(store.load_profile().is_none());
        assert_eq!(store.load_settings(), Settings::default());
    }
}

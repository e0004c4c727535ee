//! Question bank, session selection, and CSV import.

use crate::models::{Category, Difficulty, Question, QuestionKind};
use rand::Rng;
use std::collections::BTreeMap;
use uuid::Uuid;

/// The built-in bank of money and arithmetic questions.
pub fn built_in_questions() -> Vec<Question> {
    use Category::{Math, Money};
    use Difficulty::{Easy, Hard, Normal};

    let q = Question::new_choice;
    vec![
        // Easy: coin recognition and tiny sums.
        q("q1", Money, Easy, "How many cents is a dime worth?", "10", &["5", "10", "25"]),
        q("q2", Money, Easy, "Ten 10-cent coins make how much?", "100 cents", &["50 cents", "100 cents", "200 cents"]),
        q("q3", Money, Easy, "A candy costs 30 cents. You pay 50 cents. How much change?", "20 cents", &["10 cents", "20 cents", "30 cents"]),
        q("q4", Math, Easy, "5 + 5 = ?", "10", &["5", "10", "15"]),
        q("q5", Money, Easy, "How many cents is a nickel worth?", "5", &["5", "10", "25"]),
        q("q6", Money, Easy, "Five 10-cent coins make how much?", "50 cents", &["15 cents", "50 cents", "100 cents"]),
        // Normal: two-step money sums.
        q("q7", Money, Normal, "Tea costs $1.30. You hand over $1.00. How much more do you need?", "30 cents", &["20 cents", "30 cents", "50 cents"]),
        q("q8", Money, Normal, "Four quarters and three dimes make how much?", "$1.30", &["$1.30", "$1.03", "$1.20"]),
        q("q9", Math, Normal, "25 + 34 = ?", "59", &["59", "69", "49"]),
        q("q10", Money, Normal, "Which is more: two 50-cent coins or five 10-cent coins?", "two 50-cent coins", &["the same", "two 50-cent coins", "five 10-cent coins"]),
        q("q11", Math, Normal, "How many minutes are in one hour?", "60", &["30", "60", "100"]),
        q("q12", Math, Normal, "3 x 4 = ?", "12", &["7", "12", "15"]),
        q("q13", Money, Normal, "You have $2.00 and spend 80 cents. How much is left?", "$1.20", &["$1.00", "$1.20", "$1.80"]),
        // Hard: change-making and bigger arithmetic.
        q("q14", Money, Hard, "Juice costs $2.30. You pay with $5.00. How much change?", "$2.70", &["$1.70", "$2.70", "$3.70"]),
        q("q15", Money, Hard, "A book costs $6.50. You pay with $10.00. How much change?", "$3.50", &["$3.50", "$4.50", "$2.50"]),
        q("q16", Math, Hard, "8 x 7 = ?", "56", &["54", "56", "63"]),
        q("q17", Money, Hard, "$10.00 - $4.60 = ?", "$5.40", &["$6.40", "$5.40", "$4.40"]),
        q("q18", Money, Hard, "Bread costs $1.20. You buy three loaves and pay $5.00. How much change?", "$1.40", &["$1.40", "$2.40", "$0.40"]),
        q("q19", Math, Hard, "35 minutes + 40 minutes = ?", "1 hour 15 minutes", &["1 hour 5 minutes", "1 hour 15 minutes", "75 hours"]),
        q("q20", Math, Hard, "2000 - 125 = ?", "1875", &["1875", "1975", "1775"]),
        q("q21", Money, Hard, "Twenty 50-cent coins make how much?", "$10", &["$2", "$10", "$5"]),
        q("q22", Math, Hard, "7 x 8 = ?", "56", &["48", "54", "56"]),
    ]
}

/// Pick a session's worth of questions for a difficulty.
///
/// Returns exactly `min(count, matching)` distinct questions, weighted
/// toward questions with low clear counts so fresh material comes up more
/// often. With no mastery data every candidate weighs the same and this
/// degenerates to a uniform shuffle. An empty matching pool returns an
/// empty vec; the caller decides how fatal that is.
pub fn select_questions(
    pool: &[Question],
    difficulty: Difficulty,
    count: usize,
    clear_counts: &BTreeMap<String, u32>,
    rng: &mut impl Rng,
) -> Vec<Question> {
    let mut candidates: Vec<Question> = pool
        .iter()
        .filter(|q| q.difficulty == difficulty)
        .cloned()
        .collect();

    let take = count.min(candidates.len());
    let mut picked = Vec::with_capacity(take);

    for _ in 0..take {
        let weights: Vec<f64> = candidates
            .iter()
            .map(|q| {
                let clears = clear_counts.get(&q.id).copied().unwrap_or(0);
                1.0 / (1.0 + clears as f64)
            })
            .collect();
        let total: f64 = weights.iter().sum();

        let mut x = rng.gen::<f64>() * total;
        let mut index = candidates.len() - 1;
        for (i, w) in weights.iter().enumerate() {
            if x < *w {
                index = i;
                break;
            }
            x -= w;
        }

        picked.push(candidates.swap_remove(index));
    }

    picked
}

/// Outcome of a CSV import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// Rows turned into questions.
    pub imported: usize,
    /// Rows rejected by the shape check.
    pub skipped: usize,
}

/// Parse custom questions from the CSV-like import format.
///
/// Each row is `kind,difficulty,category,text,answer,choice1,choice2,...`.
/// Rows with fewer than five fields, or an unknown difficulty word, are
/// skipped and counted; the import never fails as a whole. Blank choice
/// cells are dropped, and every imported row gets a fresh id.
pub fn parse_csv(input: &str) -> (Vec<Question>, ImportSummary) {
    let mut questions = Vec::new();
    let mut summary = ImportSummary::default();

    for line in input.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() < 5 {
            summary.skipped += 1;
            continue;
        }

        let Some(difficulty) = Difficulty::parse(fields[1]) else {
            summary.skipped += 1;
            continue;
        };

        let kind = match fields[0].to_lowercase().as_str() {
            "input" => QuestionKind::Input,
            _ => QuestionKind::Choice,
        };
        let choices: Vec<String> = fields[5..]
            .iter()
            .filter(|c| !c.is_empty())
            .map(|c| c.to_string())
            .collect();

        questions.push(Question {
            id: Uuid::new_v4().to_string(),
            category: Category::parse(fields[2]),
            difficulty,
            text: fields[3].to_string(),
            answer: fields[4].to_string(),
            choices,
            explanation: None,
            kind,
        });
        summary.imported += 1;
    }

    (questions, summary)
}

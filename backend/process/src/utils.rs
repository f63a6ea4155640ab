use std::collections::HashSet;

use bank::{Bank, normalize};
use chrono::prelude::*;

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Trims every riddle, then drops incomplete ones and duplicates (same id or same
/// normalized question). Returns how many were dropped.
pub fn sanitize_bank(bank: &mut Bank) -> usize {
    let before = bank.riddles.len();
    let mut ids = HashSet::new();
    let mut questions = HashSet::new();

    bank.riddles.retain_mut(|riddle| {
        riddle.id = riddle.id.trim().to_string();
        riddle.question = riddle.question.trim().to_string();
        riddle.answer = riddle.answer.trim().to_string();
        riddle.alternates.retain(|alternate| !normalize(alternate).is_empty());
        riddle.hints.retain(|hint| !hint.trim().is_empty());

        let question = normalize(&riddle.question);
        let complete =
            !riddle.id.is_empty() && !question.is_empty() && !normalize(&riddle.answer).is_empty();

        complete && ids.insert(riddle.id.clone()) && questions.insert(question)
    });

    before - bank.riddles.len()
}

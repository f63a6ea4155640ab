use chrono::TimeDelta;

pub const BASE_SCORE: u32 = 100;
pub const TIME_BONUS_MAX: u32 = 100;
pub const TIME_BONUS_WINDOW_SECS: i64 = 10 * 60;
pub const HINT_PENALTY: u32 = 15;
pub const MESSAGE_PENALTY: u32 = 5;

#[derive(Clone, Copy, Debug)]
pub struct ScoreInputs {
    pub correct: bool,
    pub elapsed: TimeDelta,
    pub hints_used: u32,
    pub messages_sent: u32,
}

/// Linear decay from [`TIME_BONUS_MAX`] to zero over the bonus window.
pub fn time_bonus(elapsed: TimeDelta) -> u32 {
    let window = TIME_BONUS_WINDOW_SECS * 1000;
    let spent = elapsed.num_milliseconds().clamp(0, window);

    (TIME_BONUS_MAX as i64 * (window - spent) / window) as u32
}

pub fn compute_score(inputs: ScoreInputs) -> u32 {
    if !inputs.correct {
        return 0;
    }

    let penalty = inputs
        .hints_used
        .saturating_mul(HINT_PENALTY)
        .saturating_add(inputs.messages_sent.saturating_mul(MESSAGE_PENALTY));

    (BASE_SCORE + time_bonus(inputs.elapsed)).saturating_sub(penalty)
}

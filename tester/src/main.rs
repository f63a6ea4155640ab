use anyhow::Error;
use bank::{Bank, Riddle, write_bank};

const DEMO_BANK_PATH: &str = "../bank.json";

fn riddle(id: &str, question: &str, answer: &str, alternates: &[&str], hints: &[&str]) -> Riddle {
    Riddle {
        id: id.to_string(),
        question: question.to_string(),
        answer: answer.to_string(),
        alternates: alternates.iter().map(|s| s.to_string()).collect(),
        hints: hints.iter().map(|s| s.to_string()).collect(),
    }
}

fn main() -> Result<(), Error> {
    let bank = Bank {
        riddles: vec![
            riddle(
                "echo",
                "I speak without a mouth and hear without ears. I have no body, but I come alive with wind. What am I?",
                "An echo",
                &["echoes"],
                &["Mountains and canyons are full of me.", "I repeat whatever you say."],
            ),
            riddle(
                "map",
                "I have cities, but no houses. I have mountains, but no trees. I have water, but no fish. What am I?",
                "A map",
                &["atlas"],
                &["You might fold me.", "Explorers carry me."],
            ),
            riddle(
                "footsteps",
                "The more you take, the more you leave behind. What are they?",
                "Footsteps",
                &["steps", "footprints"],
                &["You make them every day.", "Look down while walking."],
            ),
            riddle(
                "candle",
                "I'm tall when I'm young, and I'm short when I'm old. What am I?",
                "A candle",
                &[],
                &["I burn.", "Birthday cakes carry several of me."],
            ),
        ],
    };

    println!("Demo riddles: {}", bank.riddles.len());

    write_bank(DEMO_BANK_PATH, &bank)?;
    println!("Wrote {DEMO_BANK_PATH}");

    Ok(())
}

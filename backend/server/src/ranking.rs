use serde::Serialize;

use crate::models::RankCounts;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Ranking {
    /// 1 is best; tied players share a rank.
    pub rank: u64,
    /// Share of the day's players scoring at or below this score, 0-100.
    pub percentile: u8,
    pub total: u64,
}

pub fn percentile(counts: RankCounts) -> Ranking {
    if counts.total == 0 {
        return Ranking {
            rank: 1,
            percentile: 100,
            total: 0,
        };
    }

    let at_or_below = (counts.lower + counts.tied).min(counts.total);

    Ranking {
        rank: counts.total - at_or_below + 1,
        percentile: ((at_or_below * 100 + counts.total / 2) / counts.total) as u8,
        total: counts.total,
    }
}

/// Positions for an already sorted (descending) score list, ties sharing a rank.
pub fn competition_ranks(scores: &[u32]) -> Vec<u64> {
    let mut positions = Vec::with_capacity(scores.len());

    for (index, score) in scores.iter().enumerate() {
        let position = match index {
            0 => 1,
            _ if scores[index - 1] == *score => positions[index - 1],
            _ => index as u64 + 1,
        };
        positions.push(position);
    }

    positions
}

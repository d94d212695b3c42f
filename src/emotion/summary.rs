use super::label::Emotion;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Distribution of recorded emotions for a session
///
/// `NoData` is returned for a session that never produced a classification;
/// it is deliberately distinct from an empty distribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "emotions", rename_all = "snake_case")]
pub enum EmotionSummary {
    NoData,
    /// Integer percentage per observed emotion
    Distribution(BTreeMap<Emotion, u32>),
}

impl EmotionSummary {
    /// Reduce a history of labels to per-label percentages
    ///
    /// Each label is rounded independently (half to even), so the total may
    /// land on 99 or 101.
    pub fn from_history<'a, I>(history: I) -> Self
    where
        I: IntoIterator<Item = &'a Emotion>,
    {
        let mut counts: BTreeMap<Emotion, usize> = BTreeMap::new();
        let mut total = 0usize;
        for emotion in history {
            *counts.entry(*emotion).or_insert(0) += 1;
            total += 1;
        }

        if total == 0 {
            return EmotionSummary::NoData;
        }

        let distribution = counts
            .into_iter()
            .map(|(emotion, count)| {
                let pct = (count as f64 / total as f64 * 100.0).round_ties_even();
                (emotion, pct as u32)
            })
            .collect();

        EmotionSummary::Distribution(distribution)
    }

    pub fn is_no_data(&self) -> bool {
        matches!(self, EmotionSummary::NoData)
    }

    pub fn percentage(&self, emotion: Emotion) -> Option<u32> {
        match self {
            EmotionSummary::NoData => None,
            EmotionSummary::Distribution(map) => map.get(&emotion).copied(),
        }
    }

    /// Highest-share emotion; ties go to the first label in vocabulary order
    pub fn dominant(&self) -> Option<Emotion> {
        match self {
            EmotionSummary::NoData => None,
            EmotionSummary::Distribution(map) => map
                .iter()
                .fold(None, |best: Option<(Emotion, u32)>, (emotion, pct)| match best {
                    Some((_, best_pct)) if best_pct >= *pct => best,
                    _ => Some((*emotion, *pct)),
                })
                .map(|(emotion, _)| emotion),
        }
    }

    /// One `label: N%` line per observed emotion
    pub fn lines(&self) -> Vec<String> {
        match self {
            EmotionSummary::NoData => Vec::new(),
            EmotionSummary::Distribution(map) => map
                .iter()
                .map(|(emotion, pct)| format!("{}: {}%", emotion, pct))
                .collect(),
        }
    }
}

impl fmt::Display for EmotionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmotionSummary::NoData => f.write_str("No emotions detected"),
            EmotionSummary::Distribution(_) => f.write_str(&self.lines().join(", ")),
        }
    }
}

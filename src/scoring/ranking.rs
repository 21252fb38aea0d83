// src/scoring/ranking.rs

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedEntry<K> {
    pub id: K,
    pub rank: u32,
    pub average_percent: f64,
}

/// Assigns dense ranks to scores already sorted by average descending.
///
/// Equal averages share a rank and the next distinct average gets the
/// previous rank plus one. Unsorted input yields ranks that follow input
/// order and are meaningless.
pub fn dense_rank<K, I>(scores: I) -> Vec<RankedEntry<K>>
where
    I: IntoIterator<Item = (K, f64)>,
{
    let mut ranked: Vec<RankedEntry<K>> = Vec::new();

    for (id, average_percent) in scores {
        let rank = match ranked.last() {
            None => 1,
            Some(prev) if prev.average_percent == average_percent => prev.rank,
            Some(prev) => prev.rank + 1,
        };
        ranked.push(RankedEntry {
            id,
            rank,
            average_percent,
        });
    }

    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranks(scores: &[f64]) -> Vec<u32> {
        dense_rank(scores.iter().enumerate().map(|(i, s)| (i, *s)))
            .into_iter()
            .map(|e| e.rank)
            .collect()
    }

    #[test]
    fn ties_share_rank() {
        assert_eq!(ranks(&[90.0, 90.0, 80.0]), vec![1, 1, 2]);
    }

    #[test]
    fn no_gap_after_tie() {
        assert_eq!(ranks(&[100.0, 90.0, 90.0, 50.0]), vec![1, 2, 2, 3]);
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(dense_rank(Vec::<(i64, f64)>::new()).is_empty());
    }

    #[test]
    fn keeps_ids_and_averages() {
        let ranked = dense_rank(vec![("ana", 75.5), ("ben", 75.5), ("cy", 60.0)]);
        assert_eq!(ranked[1].id, "ben");
        assert_eq!(ranked[1].average_percent, 75.5);
        assert_eq!(ranked[2].rank, 2);
    }
}

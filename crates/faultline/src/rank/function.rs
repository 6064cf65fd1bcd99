//! Function-granularity ranking with "max" tie-break.

use crate::key::LineKey;
use crate::result::{ensure_consistent, FaultlineResult};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Where the ground-truth function landed for one formula
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FunctionRank {
    /// Functions in the ranking
    pub functions: usize,
    /// Functions tied at the top score (equals the rank of the top block)
    pub tied_at_top: usize,
    /// Top score
    pub best_score: f64,
    /// Rank of the buggy function
    pub buggy_rank: usize,
    /// Score of the buggy function
    pub buggy_score: f64,
}

/// Total order on scores where `-0.0 == 0.0`
fn compare(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or_else(|| a.total_cmp(&b))
}

/// "max" ranks of scores already sorted in descending order
///
/// Every member of a block of equal scores gets the 1-based position of the
/// block's last member.
#[must_use]
pub fn max_ranks(sorted: &[f64]) -> Vec<usize> {
    let mut ranks = vec![0; sorted.len()];
    let mut start = 0;
    while start < sorted.len() {
        let mut end = start + 1;
        while end < sorted.len() && compare(sorted[end], sorted[start]) == Ordering::Equal {
            end += 1;
        }
        for rank in &mut ranks[start..end] {
            *rank = end;
        }
        start = end;
    }
    ranks
}

/// Collapse line scores to one score per `(file, function)` and rank it
///
/// Each function keeps its highest-scoring line; on equal scores the first
/// line encountered stays. Exactly one function must match `buggy`.
pub fn rank_functions(lines: &[(LineKey, f64)], buggy: &LineKey) -> FaultlineResult<FunctionRank> {
    let mut group_of: HashMap<(&str, &str), usize> = HashMap::new();
    let mut groups: Vec<(&LineKey, f64)> = Vec::new();
    for (key, score) in lines {
        match group_of.get(&key.function_id()) {
            Some(&i) => {
                if compare(*score, groups[i].1) == Ordering::Greater {
                    groups[i] = (key, *score);
                }
            }
            None => {
                group_of.insert(key.function_id(), groups.len());
                groups.push((key, *score));
            }
        }
    }
    ensure_consistent!(!groups.is_empty(), "no lines to rank");

    // Stable sort keeps first-encountered order among equal scores
    groups.sort_by(|a, b| compare(b.1, a.1));
    let scores: Vec<f64> = groups.iter().map(|g| g.1).collect();
    let ranks = max_ranks(&scores);
    ensure_consistent!(
        ranks.len() == group_of.len(),
        "ranked {} functions out of {}",
        ranks.len(),
        group_of.len()
    );

    let matches: Vec<usize> = groups
        .iter()
        .enumerate()
        .filter(|(_, (key, _))| key.function_id() == buggy.function_id())
        .map(|(i, _)| i)
        .collect();
    ensure_consistent!(
        matches.len() == 1,
        "{} functions match the buggy function {}#{}",
        matches.len(),
        buggy.file(),
        buggy.function()
    );
    let at = matches[0];

    Ok(FunctionRank {
        functions: groups.len(),
        tied_at_top: ranks[0],
        best_score: scores[0],
        buggy_rank: ranks[at],
        buggy_score: scores[at],
    })
}

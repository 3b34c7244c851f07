use std::collections::BTreeMap;

use crate::self_play::SelfPlayReport;

/// Aggregate guess-count statistics over self-play games.
#[derive(Clone, Debug, PartialEq)]
pub struct GuessStats {
    /// Games played.
    pub games: usize,
    /// Games that reached the target.
    pub solved: usize,
    /// Fewest guesses in a solved game.
    pub min: usize,
    /// Most guesses in a solved game.
    pub max: usize,
    /// Mean guesses over solved games.
    pub mean: f64,
    /// Solved games keyed by guess count.
    pub histogram: BTreeMap<usize, usize>,
    /// Targets that were not solved within the guess limit.
    pub unsolved: Vec<String>,
}

/// Compute statistics; `None` when no game was played.
pub fn guess_stats(reports: &[SelfPlayReport]) -> Option<GuessStats> {
    if reports.is_empty() {
        return None;
    }
    let mut histogram = BTreeMap::new();
    let mut unsolved = Vec::new();
    for report in reports {
        if report.solved {
            *histogram.entry(report.guess_count()).or_insert(0) += 1;
        } else {
            unsolved.push(report.target.clone());
        }
    }
    let solved: usize = histogram.values().sum();
    let total_guesses: usize = histogram.iter().map(|(guesses, games)| guesses * games).sum();
    let mean = if solved == 0 {
        0.0
    } else {
        total_guesses as f64 / solved as f64
    };
    Some(GuessStats {
        games: reports.len(),
        solved,
        min: histogram.keys().next().copied().unwrap_or(0),
        max: histogram.keys().next_back().copied().unwrap_or(0),
        mean,
        histogram,
        unsolved,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(target: &str, guesses: usize, solved: bool) -> SelfPlayReport {
        SelfPlayReport {
            target: target.to_string(),
            guesses: (0..guesses).map(|idx| format!("g{idx}")).collect(),
            solved,
        }
    }

    #[test]
    fn guess_stats_reports_distribution() {
        let stats = guess_stats(&[
            report("A", 2, true),
            report("B", 3, true),
            report("C", 3, true),
            report("D", 6, false),
        ])
        .expect("stats");
        assert_eq!(stats.games, 4);
        assert_eq!(stats.solved, 3);
        assert_eq!(stats.min, 2);
        assert_eq!(stats.max, 3);
        assert!((stats.mean - 8.0 / 3.0).abs() < 1e-9);
        assert_eq!(stats.histogram.get(&3), Some(&2));
        assert_eq!(stats.unsolved, vec!["D".to_string()]);
    }

    #[test]
    fn guess_stats_handles_empty_and_unsolved_only() {
        assert!(guess_stats(&[]).is_none());
        let stats = guess_stats(&[report("A", 4, false)]).expect("stats");
        assert_eq!(stats.solved, 0);
        assert_eq!(stats.mean, 0.0);
        assert_eq!(stats.min, 0);
    }
}

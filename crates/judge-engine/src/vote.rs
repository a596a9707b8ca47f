//! Majority vote over ensemble attempts.

use judge_core::Vote;

/// Frequency count that remembers the order in which values first appeared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoteTally {
    counts: Vec<(usize, usize)>,
}

impl VoteTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, index: usize) {
        match self.counts.iter_mut().find(|(i, _)| *i == index) {
            Some((_, n)) => *n += 1,
            None => self.counts.push((index, 1)),
        }
    }

    /// `(index, count)` pairs in first-seen order.
    pub fn counts(&self) -> &[(usize, usize)] {
        &self.counts
    }

    /// Most frequent index; on a tie, the one seen first.
    pub fn leader(&self) -> Option<usize> {
        let mut best: Option<(usize, usize)> = None;
        for &(index, count) in &self.counts {
            match best {
                Some((_, top)) if count <= top => {}
                _ => best = Some((index, count)),
            }
        }
        best.map(|(index, _)| index)
    }
}

impl FromIterator<usize> for VoteTally {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        let mut tally = Self::new();
        for index in iter {
            tally.record(index);
        }
        tally
    }
}

/// Mode of the cast votes, or `None` when there are none.
pub fn majority(votes: &[Vote]) -> Option<usize> {
    votes.iter().map(|v| v.index).collect::<VoteTally>().leader()
}

#[cfg(test)]
mod tests {
    use super::*;
    use judge_core::LlmMetrics;

    fn votes(indices: &[usize]) -> Vec<Vote> {
        indices.iter().map(|&i| Vote::parsed(i, LlmMetrics::default())).collect()
    }

    #[test]
    fn clear_majority() {
        assert_eq!(majority(&votes(&[1, 1, 1, 2, 0])), Some(1));
    }

    #[test]
    fn plurality_without_absolute_majority() {
        assert_eq!(majority(&votes(&[3, 2, 3, 0, 1])), Some(3));
    }

    #[test]
    fn tie_goes_to_first_seen() {
        assert_eq!(majority(&votes(&[0, 0, 1, 1, 2])), Some(0));
        assert_eq!(majority(&votes(&[2, 1, 1, 2, 0])), Some(2));
    }

    #[test]
    fn empty_has_no_majority() {
        assert_eq!(majority(&[]), None);
    }

    #[test]
    fn fallback_votes_count_as_zero() {
        let mut cast = votes(&[2, 2]);
        cast.push(Vote::call_failed("timeout"));
        cast.push(Vote::call_failed("timeout"));
        cast.push(Vote::unparseable("no tag", LlmMetrics::default()));
        assert_eq!(majority(&cast), Some(0));
    }

    #[test]
    fn tally_keeps_first_seen_order() {
        let tally: VoteTally = [2, 0, 2, 1].into_iter().collect();
        assert_eq!(tally.counts(), &[(2, 2), (0, 1), (1, 1)]);
    }
}

use std::collections::BTreeMap;

/// Commit counts per author over a recent window of history.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitStats {
    per_author: BTreeMap<String, usize>,
}

impl CommitStats {
    /// Tally a list of commit authors, one element per commit.
    pub fn from_authors<I, S>(authors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut per_author = BTreeMap::new();
        for author in authors {
            *per_author.entry(author.into()).or_insert(0) += 1;
        }

        Self { per_author }
    }

    #[must_use]
    pub fn total_commits(&self) -> usize {
        self.per_author.values().sum()
    }

    #[must_use]
    pub fn author_count(&self) -> usize {
        self.per_author.len()
    }

    #[must_use]
    pub const fn per_author(&self) -> &BTreeMap<String, usize> {
        &self.per_author
    }

    /// One minus the Herfindahl-Hirschman index of commit shares.
    ///
    /// A single author (or no commits at all) yields 0.0; `n` authors with equal shares
    /// yield `1 - 1/n`.
    #[must_use]
    #[expect(clippy::cast_precision_loss, reason = "commit counts are far below 2^52")]
    pub fn bus_factor(&self) -> f64 {
        let total = self.total_commits();
        if total == 0 {
            return 0.0;
        }

        let total = total as f64;
        let concentration: f64 = self
            .per_author
            .values()
            .map(|&count| {
                let share = count as f64 / total;
                share * share
            })
            .sum();

        (1.0 - concentration).clamp(0.0, 1.0)
    }
}

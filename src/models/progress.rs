use serde::{Deserialize, Serialize};

/// Completion counts for one playlist or for all of a user's playlists
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
    pub remaining: usize,
    /// Rounded half-up, always within 0..=100
    pub percentage: u8,
}

impl Progress {
    /// Builds a progress value, clamping `completed` to `total`
    pub fn new(completed: usize, total: usize) -> Self {
        let completed = completed.min(total);
        Self {
            completed,
            total,
            remaining: total - completed,
            percentage: percentage(completed, total),
        }
    }
}

impl std::ops::Add for Progress {
    type Output = Progress;

    /// Sums the counts and recomputes the percentage from the sums
    fn add(self, other: Progress) -> Progress {
        Progress::new(self.completed + other.completed, self.total + other.total)
    }
}

impl std::iter::Sum for Progress {
    fn sum<I: Iterator<Item = Progress>>(iter: I) -> Self {
        iter.fold(Progress::default(), |acc, p| acc + p)
    }
}

/// Integer round-half-up of completed / total * 100
fn percentage(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    ((completed * 200 + total) / (total * 2)) as u8
}

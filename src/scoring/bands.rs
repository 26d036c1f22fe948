/// Ordered threshold bands mapping a score to a label.
///
/// Bands are ascending `(upper_bound, label)` pairs with inclusive upper
/// bounds; the first band whose upper bound is at least the score wins.
/// `floor` is the lowest score the table accepts, so each variant keeps its
/// own literal boundaries (the register starts at 1, vendor scores at 0).
#[derive(Debug, Clone, Copy)]
pub struct Bands<L: 'static> {
    floor: u32,
    bands: &'static [(u32, L)],
}

impl<L: Copy + PartialEq> Bands<L> {
    pub const fn new(floor: u32, bands: &'static [(u32, L)]) -> Self {
        Self { floor, bands }
    }

    /// Label for `score`, or `None` when the score falls outside the table.
    pub fn classify(&self, score: u32) -> Option<L> {
        if score < self.floor {
            return None;
        }
        self.bands
            .iter()
            .find(|(upper, _)| score <= *upper)
            .map(|(_, label)| *label)
    }

    /// Inclusive `(low, high)` range covered by `label`, if it is in the table.
    pub fn range_of(&self, label: L) -> Option<(u32, u32)> {
        let mut low = self.floor;
        for (upper, candidate) in self.bands {
            if *candidate == label {
                return Some((low, *upper));
            }
            low = upper + 1;
        }
        None
    }

    pub fn floor(&self) -> u32 {
        self.floor
    }

    pub fn ceiling(&self) -> u32 {
        self.bands.last().map(|(upper, _)| *upper).unwrap_or(self.floor)
    }

    pub fn labels(&self) -> impl Iterator<Item = L> + '_ {
        self.bands.iter().map(|(_, label)| *label)
    }
}

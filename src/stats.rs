// src/stats.rs

/// Tab stops for the indentation weight
const TAB_WIDTH: u64 = 4;

/// Leading whitespace of a line in columns. Tabs advance to the next
/// multiple of four; the first other byte ends the scan.
pub fn indentation(content: &[u8]) -> u64 {
    let mut column = 0;
    for &byte in content {
        match byte {
            b' ' => column += 1,
            b'\t' => column = (column / TAB_WIDTH + 1) * TAB_WIDTH,
            _ => break,
        }
    }
    column
}

/// Added and removed line counts and indentation weights of one hunk
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HunkTally {
    pub removed: u64,
    pub added: u64,
    pub removed_weight: u64,
    pub added_weight: u64,
}

impl HunkTally {
    /// Counts one diff line; context and end-of-file markers are ignored.
    pub fn record(&mut self, origin: char, indent: u64) {
        match origin {
            '-' => {
                self.removed += 1;
                self.removed_weight += indent;
            }
            '+' => {
                self.added += 1;
                self.added_weight += indent;
            }
            _ => {}
        }
    }
}

/// Per-patch sums and per-hunk standard deviations of the hunk tallies
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DiffStats {
    pub loc_d: u64,
    pub loc_i: u64,
    pub comp_d: u64,
    pub comp_i: u64,
    pub loc_d_std: f64,
    pub loc_i_std: f64,
    pub comp_d_std: f64,
    pub comp_i_std: f64,
}

impl DiffStats {
    pub fn from_hunks(hunks: &[HunkTally]) -> Self {
        if hunks.is_empty() {
            return Self::default();
        }
        let column = |f: fn(&HunkTally) -> u64| hunks.iter().map(f).collect::<Vec<_>>();
        let removed = column(|h| h.removed);
        let added = column(|h| h.added);
        let removed_weight = column(|h| h.removed_weight);
        let added_weight = column(|h| h.added_weight);

        Self {
            loc_d: removed.iter().sum(),
            loc_i: added.iter().sum(),
            comp_d: removed_weight.iter().sum(),
            comp_i: added_weight.iter().sum(),
            loc_d_std: std_dev(&removed),
            loc_i_std: std_dev(&added),
            comp_d_std: std_dev(&removed_weight),
            comp_i_std: std_dev(&added_weight),
        }
    }

    /// The eight numbers: four sums followed by four standard deviations.
    pub fn to_vector(&self) -> [f64; 8] {
        [
            self.loc_d as f64,
            self.loc_i as f64,
            self.comp_d as f64,
            self.comp_i as f64,
            self.loc_d_std,
            self.loc_i_std,
            self.comp_d_std,
            self.comp_i_std,
        ]
    }
}

/// Population standard deviation.
fn std_dev(values: &[u64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().map(|&v| v as f64).sum::<f64>() / n;
    let variance = values
        .iter()
        .map(|&v| {
            let d = v as f64 - mean;
            d * d
        })
        .sum::<f64>()
        / n;
    variance.sqrt()
}

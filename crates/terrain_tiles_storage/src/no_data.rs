use float_ord::FloatOrd;

/// Decides whether a decoded height is a "no data" marker.
///
/// The sentinel table and threshold are multiplied by the provider's height factor once, when the rule is built, and every
/// comparison happens against already-scaled heights.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NoDataRule {
    sentinels: Vec<FloatOrd<f32>>,
    threshold: Option<f32>,
}

impl NoDataRule {
    /// A rule that never flags anything.
    pub fn none() -> Self {
        Self::default()
    }

    /// Builds the sorted sentinel table from raw `sentinels`, scaled by `height_factor`.
    pub fn new(sentinels: &[f32], height_factor: f32) -> Self {
        let mut table: Vec<FloatOrd<f32>> = sentinels
            .iter()
            .map(|&value| FloatOrd(value * height_factor))
            .collect();
        table.sort_unstable();
        table.dedup();

        Self {
            sentinels: table,
            threshold: None,
        }
    }

    /// Additionally flags every height strictly above `threshold * height_factor`.
    pub fn with_threshold(mut self, threshold: f32, height_factor: f32) -> Self {
        self.threshold = Some(threshold * height_factor);
        self
    }

    #[inline]
    pub fn is_no_data(&self, height: f32) -> bool {
        if let Some(threshold) = self.threshold {
            if height > threshold {
                return true;
            }
        }
        self.sentinels.binary_search(&FloatOrd(height)).is_ok()
    }

    /// The scaled sentinel values in ascending order.
    pub fn sentinels(&self) -> impl Iterator<Item = f32> + '_ {
        self.sentinels.iter().map(|v| v.0)
    }

    #[inline]
    pub fn threshold(&self) -> Option<f32> {
        self.threshold
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝

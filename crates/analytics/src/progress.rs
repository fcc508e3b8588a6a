use serde::Serialize;

/// Progress of `roe` towards `target_roe`.
///
/// `raw` is the unclamped percentage shown as text; `clamped` feeds bounded visuals and is
/// always within `[0, 100]`. Both come from the same single division.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TargetProgress {
    pub raw: f64,
    pub clamped: f64,
}

impl TargetProgress {
    pub fn new(roe: f64, target_roe: f64) -> Self {
        let raw = roe / target_roe * 100.0;
        let clamped = if raw.is_nan() {
            0.0
        } else {
            raw.clamp(0.0, 100.0)
        };
        Self { raw, clamped }
    }

    /// `None` when the target makes the ratio meaningless (zero target).
    pub fn raw_finite(&self) -> Option<f64> {
        self.raw.is_finite().then_some(self.raw)
    }

    pub fn target_reached(&self) -> bool {
        self.raw >= 100.0
    }
}

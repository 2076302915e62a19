use crate::config::LevelCfg;

/// True when `averaged` lies strictly within `tolerance` of `reference`.
#[inline]
pub fn is_level(averaged: f64, reference: f64, tolerance: f64) -> bool {
    (averaged - reference).abs() < tolerance
}

#[derive(Debug, Clone, Copy)]
pub struct LevelDetector {
    reference: f64,
    tolerance: f64,
}

impl LevelDetector {
    pub fn new(reference: f64, tolerance: f64) -> Self {
        Self {
            reference,
            tolerance,
        }
    }

    #[inline]
    pub fn classify(&self, averaged: f64) -> bool {
        is_level(averaged, self.reference, self.tolerance)
    }
}

impl From<LevelCfg> for LevelDetector {
    fn from(c: LevelCfg) -> Self {
        Self::new(c.reference, c.tolerance)
    }
}

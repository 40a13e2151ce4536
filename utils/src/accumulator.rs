//! Running big-integer sum used to reserve gas across a pipeline.

use alloy_primitives::U256;

#[derive(Debug, Default, Clone)]
pub struct BigAccumulator {
    total: U256,
}

impl BigAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `value` to the total and hand it back, so a step can capture the
    /// amount it reserved in the same expression.
    pub fn add(&mut self, value: U256) -> U256 {
        self.total = self.total.saturating_add(value);
        value
    }

    pub fn total(&self) -> U256 {
        self.total
    }
}

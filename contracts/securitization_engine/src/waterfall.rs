use crate::storage::{LossAllocation, TrancheClass, TranchePool};

/// Order in which tranches absorb losses, junior-most first.
pub const LOSS_ORDER: [TrancheClass; 3] = [
    TrancheClass::Equity,
    TrancheClass::Mezzanine,
    TrancheClass::Senior,
];

/// Per-tranche absorption.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerAbsorption {
    pub class: TrancheClass,
    /// Outstanding value before the loss
    pub capacity: i128,
    pub absorbed: i128,
    /// Loss remaining after this layer
    pub remaining_after: i128,
}

/// Result of running a loss through the tranche waterfall.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaterfallResult {
    pub total_loss: i128,
    pub total_absorbed: i128,
    /// Always three entries, in `LOSS_ORDER`
    pub layers: [LayerAbsorption; 3],
    /// Unabsorbed loss (zero if fully covered)
    pub shortfall: i128,
}

impl WaterfallResult {
    pub fn absorbed_by(&self, class: TrancheClass) -> i128 {
        self.layers
            .iter()
            .find(|layer| layer.class == class)
            .map(|layer| layer.absorbed)
            .unwrap_or(0)
    }

    pub fn fully_covered(&self) -> bool {
        self.shortfall == 0
    }

    /// Layer deltas net exactly to the loss: absorbed parts plus shortfall
    pub fn is_balanced(&self) -> bool {
        let layer_sum = self
            .layers
            .iter()
            .try_fold(0i128, |acc, layer| acc.checked_add(layer.absorbed));
        layer_sum == Some(self.total_absorbed)
            && self.total_absorbed.checked_add(self.shortfall) == Some(self.total_loss)
            && self
                .layers
                .iter()
                .all(|layer| layer.absorbed >= 0 && layer.absorbed <= layer.capacity)
    }

    pub fn to_allocation(&self, pool_id: u32) -> LossAllocation {
        LossAllocation {
            pool_id,
            requested: self.total_loss,
            equity: self.absorbed_by(TrancheClass::Equity),
            mezzanine: self.absorbed_by(TrancheClass::Mezzanine),
            senior: self.absorbed_by(TrancheClass::Senior),
            absorbed: self.total_absorbed,
            shortfall: self.shortfall,
        }
    }
}

/// Absorb a loss through the pool's tranches in subordination order.
///
/// Each layer takes `min(remaining, outstanding)`; every layer is visited
/// even when its outstanding value is zero. Loss beyond the pool's total
/// outstanding value is reported as `shortfall` rather than written down.
/// Non-positive losses absorb nothing.
pub fn absorb_loss(loss: i128, pool: &TranchePool) -> WaterfallResult {
    let mut remaining = if loss > 0 { loss } else { 0 };
    let mut layers = [LayerAbsorption {
        class: TrancheClass::Equity,
        capacity: 0,
        absorbed: 0,
        remaining_after: 0,
    }; 3];

    for (slot, class) in layers.iter_mut().zip(LOSS_ORDER) {
        let capacity = pool.outstanding(class).max(0);
        let absorbed = remaining.min(capacity);
        remaining -= absorbed;
        *slot = LayerAbsorption {
            class,
            capacity,
            absorbed,
            remaining_after: remaining,
        };
    }

    let total_loss = loss.max(0);
    WaterfallResult {
        total_loss,
        total_absorbed: total_loss - remaining,
        layers,
        shortfall: remaining,
    }
}

use voltaic_numeric::matrix::Triplet;

use crate::stamp::{push_rhs, RhsEntry, StampContext, Stampable};
use crate::waveform::Waveform;

/// An independent current source. Current is defined flowing from `plus` to
/// `minus` through the device; stamps nothing to the conductance matrix.
#[derive(Debug, Clone)]
pub struct CurrentSource {
    pub name: String,
    pub plus: String,
    pub minus: String,
    pub waveform: Waveform,
}

impl CurrentSource {
    pub fn new(name: impl Into<String>, plus: impl Into<String>, minus: impl Into<String>, waveform: Waveform) -> Self {
        CurrentSource {
            name: name.into(),
            plus: plus.into(),
            minus: minus.into(),
            waveform,
        }
    }

    pub fn identifier(&self) -> String {
        format!("I{}", self.name)
    }
}

impl Stampable for CurrentSource {
    fn stamp_conductance(&self, _ctx: &StampContext) -> Vec<Triplet> {
        Vec::new()
    }

    fn stamp_rhs(&self, ctx: &StampContext) -> Vec<RhsEntry> {
        let value = self.waveform.value_at(ctx.t);
        let mut out = Vec::with_capacity(2);
        push_rhs(&mut out, ctx.index_map.node(&self.plus), -value);
        push_rhs(&mut out, ctx.index_map.node(&self.minus), value);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index_map::IndexMap;

    #[test]
    fn stamps_rhs_only() {
        let src = CurrentSource::new("1", "a", "0", Waveform::Dc { value: 2.0 });
        let mut map = IndexMap::new();
        map.insert_node("a", 0);
        let ctx = StampContext {
            index_map: &map,
            solution: &[],
            state: &[],
            state_index: None,
            t: 0.0,
        };
        assert!(src.stamp_conductance(&ctx).is_empty());
        let rhs = src.stamp_rhs(&ctx);
        assert_eq!(rhs.len(), 1);
        assert!((rhs[0].value + 2.0).abs() < 1e-15);
    }
}

use voltaic_numeric::matrix::Triplet;

use crate::stamp::{push_conductance, push_rhs, RhsEntry, StampContext, Stampable};
use crate::waveform::Waveform;

/// An independent voltage source. Requires an auxiliary branch-current
/// unknown `i_V`; the plus/minus incidence rows carry `+1`/`-1` and the
/// current row's right-hand side carries the time-evaluated source value.
///
/// Also serves as the narrow "mutable drive input" device the PWM gating
/// story needs: `drive` overrides the waveform's DC level when set,
/// modeling the `setValue` contract without reflection.
#[derive(Debug, Clone)]
pub struct VoltageSource {
    pub name: String,
    pub plus: String,
    pub minus: String,
    pub waveform: Waveform,
    pub drive: Option<f64>,
}

impl VoltageSource {
    pub fn new(name: impl Into<String>, plus: impl Into<String>, minus: impl Into<String>, waveform: Waveform) -> Self {
        VoltageSource {
            name: name.into(),
            plus: plus.into(),
            minus: minus.into(),
            waveform,
            drive: None,
        }
    }

    pub fn identifier(&self) -> String {
        format!("V{}", self.name)
    }

    /// Sets a drive override (e.g. a PWM gate command), superseding the
    /// waveform for subsequent evaluations until cleared.
    pub fn set_value(&mut self, value: f64) {
        self.drive = Some(value);
    }

    pub fn clear_drive(&mut self) {
        self.drive = None;
    }

    pub fn value_at(&self, t: f64) -> f64 {
        self.drive.unwrap_or_else(|| self.waveform.value_at(t))
    }
}

impl Stampable for VoltageSource {
    fn needs_current_variable(&self) -> bool {
        true
    }

    fn stamp_conductance(&self, ctx: &StampContext) -> Vec<Triplet> {
        let p = ctx.index_map.node(&self.plus);
        let m = ctx.index_map.node(&self.minus);
        let i_row = ctx.index_map.current(&self.identifier());
        let mut out = Vec::with_capacity(4);
        push_conductance(&mut out, p, i_row, 1.0);
        push_conductance(&mut out, i_row, p, 1.0);
        push_conductance(&mut out, m, i_row, -1.0);
        push_conductance(&mut out, i_row, m, -1.0);
        out
    }

    fn stamp_rhs(&self, ctx: &StampContext) -> Vec<RhsEntry> {
        let mut out = Vec::with_capacity(1);
        push_rhs(
            &mut out,
            ctx.index_map.current(&self.identifier()),
            self.value_at(ctx.t),
        );
        out
    }
}

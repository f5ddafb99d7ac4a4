use voltaic_numeric::matrix::Triplet;

use crate::prelude::{Error, Result};
use crate::resistor::stamp_two_terminal_conductance;
use crate::stamp::{push_conductance, push_rhs, RhsEntry, StampContext, Stampable};

pub const DEFAULT_ON_RESISTANCE: f64 = 1e-2;
pub const DEFAULT_OFF_RESISTANCE: f64 = 1e6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MosfetRegion {
    Cutoff,
    Linear,
    Saturation,
}

/// An n-channel MOSFET with the three standard operating regions. Supports
/// either voltage-controlled operation (region derived from `V_gs`/`V_ds`) or
/// an externally-commanded override for PWM gate drive, mirroring the ideal
/// switch's "mutable drive input" but choosing between the linear and cutoff
/// companion models rather than a single on/off resistance pair.
#[derive(Debug, Clone)]
pub struct Mosfet {
    pub name: String,
    pub drain: String,
    pub gate: String,
    pub source: String,
    pub threshold_voltage: f64,
    /// `beta = k' * (W/L)`, the square-law transconductance coefficient.
    pub beta: f64,
    /// Channel-length modulation coefficient.
    pub lambda: f64,
    pub on_resistance: f64,
    pub off_resistance: f64,
    gate_override: Option<bool>,
}

impl Mosfet {
    pub fn new(
        name: impl Into<String>,
        drain: impl Into<String>,
        gate: impl Into<String>,
        source: impl Into<String>,
        threshold_voltage: f64,
        beta: f64,
        lambda: f64,
    ) -> Result<Self> {
        let name = name.into();
        if beta <= 0.0 {
            return Err(Error::NonPositiveConductanceCoefficient(name));
        }
        Ok(Mosfet {
            name,
            drain: drain.into(),
            gate: gate.into(),
            source: source.into(),
            threshold_voltage,
            beta,
            lambda,
            on_resistance: DEFAULT_ON_RESISTANCE,
            off_resistance: DEFAULT_OFF_RESISTANCE,
            gate_override: None,
        })
    }

    pub fn identifier(&self) -> String {
        format!("M{}", self.name)
    }

    /// Commands the externally-driven switch-like mode: `Some(true)` forces
    /// the linear companion (gate "on"), `Some(false)` forces cutoff,
    /// `None` reverts to voltage-controlled region selection.
    pub fn set_gate_override(&mut self, on: Option<bool>) {
        self.gate_override = on;
    }

    pub fn region(&self, v_gs: f64, v_ds: f64) -> MosfetRegion {
        if let Some(on) = self.gate_override {
            return if on { MosfetRegion::Linear } else { MosfetRegion::Cutoff };
        }
        if v_gs <= self.threshold_voltage {
            MosfetRegion::Cutoff
        } else if v_ds < (v_gs - self.threshold_voltage) {
            MosfetRegion::Linear
        } else {
            MosfetRegion::Saturation
        }
    }

    /// `I_d = 0.5 * beta * (V_gs - V_th)^2 * (1 + lambda * V_ds)`, valid in
    /// saturation.
    pub fn drain_current(&self, v_gs: f64, v_ds: f64) -> f64 {
        let overdrive = v_gs - self.threshold_voltage;
        0.5 * self.beta * overdrive * overdrive * (1.0 + self.lambda * v_ds)
    }

    pub fn transconductance(&self, v_gs: f64, v_ds: f64) -> f64 {
        self.beta * (v_gs - self.threshold_voltage) * (1.0 + self.lambda * v_ds)
    }

    pub fn output_conductance(&self, v_gs: f64) -> f64 {
        let overdrive = v_gs - self.threshold_voltage;
        0.5 * self.beta * overdrive * overdrive * self.lambda
    }

    /// The cutoff/conducting boundary's zero-crossing function,
    /// `V_gs - V_th`. The linear/saturation boundary is a smooth companion
    /// transition and is not separately event-localized.
    pub fn zero_crossing(&self, v_gs: f64) -> f64 {
        v_gs - self.threshold_voltage
    }

    fn node_voltage(ctx: &StampContext, name: &str) -> f64 {
        ctx.index_map.node(name).map(|i| ctx.solution[i]).unwrap_or(0.0)
    }

    fn operating_point(&self, ctx: &StampContext) -> (f64, f64) {
        if ctx.solution.is_empty() {
            return (0.0, 0.0);
        }
        let v_g = Self::node_voltage(ctx, &self.gate);
        let v_d = Self::node_voltage(ctx, &self.drain);
        let v_s = Self::node_voltage(ctx, &self.source);
        (v_g - v_s, v_d - v_s)
    }
}

impl Stampable for Mosfet {
    fn is_nonlinear(&self) -> bool {
        true
    }

    fn stamp_conductance(&self, ctx: &StampContext) -> Vec<Triplet> {
        let (v_gs, v_ds) = self.operating_point(ctx);
        match self.region(v_gs, v_ds) {
            MosfetRegion::Cutoff => {
                stamp_two_terminal_conductance(ctx.index_map, &self.drain, &self.source, 1.0 / self.off_resistance)
            }
            MosfetRegion::Linear => {
                stamp_two_terminal_conductance(ctx.index_map, &self.drain, &self.source, 1.0 / self.on_resistance)
            }
            MosfetRegion::Saturation => {
                let g_ds = self.output_conductance(v_gs);
                let g_m = self.transconductance(v_gs, v_ds);
                let d = ctx.index_map.node(&self.drain);
                let g = ctx.index_map.node(&self.gate);
                let s = ctx.index_map.node(&self.source);
                let mut out = stamp_two_terminal_conductance(ctx.index_map, &self.drain, &self.source, g_ds);
                push_conductance(&mut out, d, g, g_m);
                push_conductance(&mut out, d, s, -g_m);
                push_conductance(&mut out, s, g, -g_m);
                push_conductance(&mut out, s, s, g_m);
                out
            }
        }
    }

    fn stamp_rhs(&self, ctx: &StampContext) -> Vec<RhsEntry> {
        let (v_gs, v_ds) = self.operating_point(ctx);
        if self.region(v_gs, v_ds) != MosfetRegion::Saturation {
            return Vec::new();
        }
        let i_d = self.drain_current(v_gs, v_ds);
        let g_ds = self.output_conductance(v_gs);
        let g_m = self.transconductance(v_gs, v_ds);
        let i_eq = i_d - g_ds * v_ds - g_m * v_gs;
        let mut out = Vec::with_capacity(2);
        push_rhs(&mut out, ctx.index_map.node(&self.drain), -i_eq);
        push_rhs(&mut out, ctx.index_map.node(&self.source), i_eq);
        out
    }
}

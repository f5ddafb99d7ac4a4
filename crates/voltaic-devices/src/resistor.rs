use voltaic_numeric::matrix::Triplet;

use crate::index_map::IndexMap;
use crate::prelude::{Error, Result};
use crate::stamp::{push_conductance, RhsEntry, StampContext, Stampable};

/// SPICE's conventional nominal temperature, in °C, against which `tc1`/`tc2`
/// are defined.
pub const NOMINAL_TEMPERATURE: f64 = 27.0;

/// A resistor, stamping `G = 1/R` symmetrically on its two nodes. `resistance`
/// is the effective value actually stamped; it starts out equal to the
/// nominal value and is rescaled once, at setup, by
/// [`Resistor::with_temperature_coefficients`].
#[derive(Debug, Clone)]
pub struct Resistor {
    pub name: String,
    pub plus: String,
    pub minus: String,
    pub resistance: f64,
    nominal_resistance: f64,
    tc1: f64,
    tc2: f64,
    temperature: f64,
}

impl Resistor {
    /// Rejects non-positive resistance at construction.
    pub fn new(name: impl Into<String>, plus: impl Into<String>, minus: impl Into<String>, resistance: f64) -> Result<Self> {
        let name = name.into();
        if resistance <= 0.0 {
            return Err(Error::NonPositiveResistance {
                component: name,
                value: resistance,
            });
        }
        Ok(Resistor {
            name,
            plus: plus.into(),
            minus: minus.into(),
            resistance,
            nominal_resistance: resistance,
            tc1: 0.0,
            tc2: 0.0,
            temperature: NOMINAL_TEMPERATURE,
        })
    }

    /// Scales `resistance` at setup per SPICE's standard quadratic model:
    /// `R(T) = R_nominal * (1 + tc1*(T - 27) + tc2*(T - 27)^2)`. Always
    /// recomputed from the nominal value, so calling this more than once
    /// re-derives rather than compounds.
    pub fn with_temperature_coefficients(mut self, tc1: f64, tc2: f64, temperature: f64) -> Self {
        self.tc1 = tc1;
        self.tc2 = tc2;
        self.temperature = temperature;
        let delta = temperature - NOMINAL_TEMPERATURE;
        self.resistance = self.nominal_resistance * (1.0 + tc1 * delta + tc2 * delta * delta);
        self
    }

    pub fn identifier(&self) -> String {
        format!("R{}", self.name)
    }

    pub fn conductance(&self) -> f64 {
        1.0 / self.resistance
    }
}

impl Stampable for Resistor {
    fn stamp_conductance(&self, ctx: &StampContext) -> Vec<Triplet> {
        stamp_two_terminal_conductance(ctx.index_map, &self.plus, &self.minus, self.conductance())
    }

    fn stamp_rhs(&self, _ctx: &StampContext) -> Vec<RhsEntry> {
        Vec::new()
    }
}

/// Shared by every two-terminal resistive element (resistor, and the
/// on/off companion resistances of diodes/MOSFETs/switches): a conductance
/// `g` stamped symmetrically between `plus` and `minus`.
pub fn stamp_two_terminal_conductance(index_map: &IndexMap, plus: &str, minus: &str, g: f64) -> Vec<Triplet> {
    let p = index_map.node(plus);
    let m = index_map.node(minus);
    let mut out = Vec::with_capacity(4);
    push_conductance(&mut out, p, p, g);
    push_conductance(&mut out, m, m, g);
    push_conductance(&mut out, p, m, -g);
    push_conductance(&mut out, m, p, -g);
    out
}

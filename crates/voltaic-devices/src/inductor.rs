use voltaic_numeric::matrix::Triplet;

use crate::component::StateKind;
use crate::prelude::{Error, Result};
use crate::stamp::{push_rhs, RhsEntry, StampContext, Stampable};

/// An inductor modeled as a state variable treated as a current source: it
/// stamps nothing to the conductance matrix (beyond the preprocessor's
/// blanket `gmin` regularization) and contributes its present current on the
/// right-hand side. This is the only inductor representation the transient
/// engine exercises; the companion-resistor-with-history-source alternative
/// would require an auxiliary current variable per inductor, which does not
/// pair with the explicit state-update integrator.
#[derive(Debug, Clone)]
pub struct Inductor {
    pub name: String,
    pub plus: String,
    pub minus: String,
    pub inductance: f64,
    pub initial_current: f64,
}

impl Inductor {
    pub fn new(
        name: impl Into<String>,
        plus: impl Into<String>,
        minus: impl Into<String>,
        inductance: f64,
        initial_current: f64,
    ) -> Result<Self> {
        let name = name.into();
        if inductance <= 0.0 {
            return Err(Error::NonPositiveInductance {
                component: name,
                value: inductance,
            });
        }
        Ok(Inductor {
            name,
            plus: plus.into(),
            minus: minus.into(),
            inductance,
            initial_current,
        })
    }

    pub fn identifier(&self) -> String {
        format!("L{}", self.name)
    }

    /// `dIl/dt = V_across / L`, where `V_across = v_plus - v_minus`.
    pub fn derivative(&self, v_plus: f64, v_minus: f64) -> f64 {
        (v_plus - v_minus) / self.inductance
    }
}

impl Stampable for Inductor {
    fn is_state_variable(&self) -> bool {
        true
    }

    fn state_kind(&self) -> Option<StateKind> {
        Some(StateKind::Current)
    }

    fn initial_state(&self) -> f64 {
        self.initial_current
    }

    fn stamp_conductance(&self, _ctx: &StampContext) -> Vec<Triplet> {
        Vec::new()
    }

    fn stamp_rhs(&self, ctx: &StampContext) -> Vec<RhsEntry> {
        let il = ctx.own_state();
        let mut out = Vec::with_capacity(2);
        push_rhs(&mut out, ctx.index_map.node(&self.plus), -il);
        push_rhs(&mut out, ctx.index_map.node(&self.minus), il);
        out
    }
}

use voltaic_numeric::matrix::Triplet;

use crate::capacitor::Capacitor;
use crate::controlled_sources::{Cccs, Ccvs, Vccs, Vcvs};
use crate::current_source::CurrentSource;
use crate::diode::Diode;
use crate::inductor::Inductor;
use crate::mosfet::Mosfet;
use crate::resistor::Resistor;
use crate::stamp::{RhsEntry, StampContext, Stampable};
use crate::switch::Switch;
use crate::voltage_source::VoltageSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateKind {
    Voltage,
    Current,
}

/// A closed, tagged variant over every component type the core understands.
/// Replaces the reference's runtime polymorphism: there is no trait object
/// and no "does this respond to `stamp`" check, only a match.
#[derive(Debug, Clone)]
pub enum Component {
    Resistor(Resistor),
    Capacitor(Capacitor),
    Inductor(Inductor),
    VoltageSource(VoltageSource),
    CurrentSource(CurrentSource),
    Vccs(Vccs),
    Vcvs(Vcvs),
    Cccs(Cccs),
    Ccvs(Ccvs),
    Diode(Diode),
    Mosfet(Mosfet),
    Switch(Switch),
}

macro_rules! dispatch {
    ($self:expr, $method:ident($($args:expr),*)) => {
        match $self {
            Component::Resistor(e) => e.$method($($args),*),
            Component::Capacitor(e) => e.$method($($args),*),
            Component::Inductor(e) => e.$method($($args),*),
            Component::VoltageSource(e) => e.$method($($args),*),
            Component::CurrentSource(e) => e.$method($($args),*),
            Component::Vccs(e) => e.$method($($args),*),
            Component::Vcvs(e) => e.$method($($args),*),
            Component::Cccs(e) => e.$method($($args),*),
            Component::Ccvs(e) => e.$method($($args),*),
            Component::Diode(e) => e.$method($($args),*),
            Component::Mosfet(e) => e.$method($($args),*),
            Component::Switch(e) => e.$method($($args),*),
        }
    };
}

impl Component {
    pub fn identifier(&self) -> String {
        dispatch!(self, identifier())
    }

    pub fn name(&self) -> &str {
        match self {
            Component::Resistor(e) => &e.name,
            Component::Capacitor(e) => &e.name,
            Component::Inductor(e) => &e.name,
            Component::VoltageSource(e) => &e.name,
            Component::CurrentSource(e) => &e.name,
            Component::Vccs(e) => &e.name,
            Component::Vcvs(e) => &e.name,
            Component::Cccs(e) => &e.name,
            Component::Ccvs(e) => &e.name,
            Component::Diode(e) => &e.name,
            Component::Mosfet(e) => &e.name,
            Component::Switch(e) => &e.name,
        }
    }

    /// Every node name the component references, in a type-specific order.
    pub fn nodes(&self) -> Vec<&str> {
        match self {
            Component::Resistor(e) => vec![&e.plus, &e.minus],
            Component::Capacitor(e) => vec![&e.plus, &e.minus],
            Component::Inductor(e) => vec![&e.plus, &e.minus],
            Component::VoltageSource(e) => vec![&e.plus, &e.minus],
            Component::CurrentSource(e) => vec![&e.plus, &e.minus],
            Component::Vccs(e) => vec![&e.out_plus, &e.out_minus, &e.ctrl_plus, &e.ctrl_minus],
            Component::Vcvs(e) => vec![&e.out_plus, &e.out_minus, &e.ctrl_plus, &e.ctrl_minus],
            Component::Cccs(e) => vec![&e.out_plus, &e.out_minus],
            Component::Ccvs(e) => vec![&e.out_plus, &e.out_minus],
            Component::Diode(e) => vec![&e.anode, &e.cathode],
            Component::Mosfet(e) => vec![&e.drain, &e.gate, &e.source],
            Component::Switch(e) => vec![&e.plus, &e.minus],
        }
    }
}

impl Stampable for Component {
    fn needs_current_variable(&self) -> bool {
        dispatch!(self, needs_current_variable())
    }

    fn is_state_variable(&self) -> bool {
        dispatch!(self, is_state_variable())
    }

    fn state_kind(&self) -> Option<StateKind> {
        dispatch!(self, state_kind())
    }

    fn initial_state(&self) -> f64 {
        dispatch!(self, initial_state())
    }

    fn is_nonlinear(&self) -> bool {
        dispatch!(self, is_nonlinear())
    }

    fn stamp_conductance(&self, ctx: &StampContext) -> Vec<Triplet> {
        dispatch!(self, stamp_conductance(ctx))
    }

    fn stamp_rhs(&self, ctx: &StampContext) -> Vec<RhsEntry> {
        dispatch!(self, stamp_rhs(ctx))
    }
}

impl Component {
    /// Applies an externally-supplied control value (a PWM gate command or
    /// similar) to the subset of devices that expose a mutable drive input.
    /// Devices without one silently ignore the call.
    pub fn apply_control(&mut self, value: f64) {
        match self {
            Component::VoltageSource(v) => v.set_value(value),
            Component::Switch(s) => s.set_closed(value != 0.0),
            Component::Mosfet(m) => m.set_gate_override(Some(value != 0.0)),
            _ => {}
        }
    }

    /// The zero-crossing function of an event-driven device, evaluated at the
    /// given node solution. `None` for devices that never raise events.
    pub fn zero_crossing(&self, solution: &[f64], index_map: &crate::index_map::IndexMap) -> Option<f64> {
        let node_voltage = |name: &str| index_map.node(name).map(|i| solution[i]).unwrap_or(0.0);
        match self {
            Component::Switch(s) => Some(s.zero_crossing()),
            Component::Diode(d) => Some(d.zero_crossing(node_voltage(&d.anode), node_voltage(&d.cathode))),
            Component::Mosfet(m) => Some(m.zero_crossing(node_voltage(&m.gate) - node_voltage(&m.source))),
            _ => None,
        }
    }

    /// Event priority at simultaneous transitions: switches resolve first,
    /// then diodes, then MOSFETs. Lower sorts first.
    pub fn event_priority(&self) -> Option<u8> {
        match self {
            Component::Switch(_) => Some(0),
            Component::Diode(_) => Some(1),
            Component::Mosfet(_) => Some(2),
            _ => None,
        }
    }
}

impl std::fmt::Display for Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.identifier())
    }
}

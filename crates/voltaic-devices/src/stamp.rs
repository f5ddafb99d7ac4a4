use voltaic_numeric::matrix::Triplet;

use crate::component::StateKind;
use crate::index_map::IndexMap;

/// A single right-hand-side contribution: add `value` to row `row` of `i`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RhsEntry {
    pub row: usize,
    pub value: f64,
}

impl RhsEntry {
    pub fn new(row: usize, value: f64) -> Self {
        RhsEntry { row, value }
    }
}

/// Adds `value` at `(row, col)` to `out` if both indices are real (non-ground).
pub fn push_conductance(out: &mut Vec<Triplet>, row: Option<usize>, col: Option<usize>, value: f64) {
    if let (Some(r), Some(c)) = (row, col) {
        out.push(Triplet::new(r, c, value));
    }
}

pub fn push_rhs(out: &mut Vec<RhsEntry>, row: Option<usize>, value: f64) {
    if let Some(r) = row {
        out.push(RhsEntry::new(r, value));
    }
}

/// Everything a device's stamp methods need besides its own parameters:
/// resolved indices, the present MNA solution (used by nonlinear devices to
/// pick an operating region), the present integration-state vector, this
/// device's own slot in that vector (if it owns one), and the current time.
pub struct StampContext<'a> {
    pub index_map: &'a IndexMap,
    pub solution: &'a [f64],
    pub state: &'a [f64],
    pub state_index: Option<usize>,
    pub t: f64,
}

impl<'a> StampContext<'a> {
    pub fn own_state(&self) -> f64 {
        self.state_index.map(|i| self.state[i]).unwrap_or(0.0)
    }
}

/// The per-device capability contract: whether a device needs an auxiliary
/// branch-current unknown, whether it owns integration state, and how it
/// contributes to the conductance matrix and right-hand side.
pub trait Stampable {
    /// Voltage-defining elements (independent V sources, inductors modeled as
    /// companion resistors, VCVS, CCVS) require an auxiliary current unknown.
    fn needs_current_variable(&self) -> bool {
        false
    }

    fn is_state_variable(&self) -> bool {
        false
    }

    fn state_kind(&self) -> Option<StateKind> {
        None
    }

    fn initial_state(&self) -> f64 {
        0.0
    }

    /// `true` for devices whose stamp depends on an operating point and must
    /// be re-evaluated every step (diodes, MOSFETs, switches).
    fn is_nonlinear(&self) -> bool {
        false
    }

    /// Emits constant conductance contributions. Called once during base
    /// matrix assembly for linear elements, and every step for nonlinear
    /// elements whose mode may have changed.
    fn stamp_conductance(&self, ctx: &StampContext) -> Vec<Triplet>;

    /// Emits right-hand-side contributions given the present context.
    fn stamp_rhs(&self, ctx: &StampContext) -> Vec<RhsEntry>;
}

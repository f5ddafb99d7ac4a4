use voltaic_numeric::matrix::Triplet;

use crate::stamp::{push_conductance, RhsEntry, StampContext, Stampable};

/// Voltage-controlled current source: `I_out = gm * (V_ctrl+ - V_ctrl-)`.
/// Stamps a conductance between the output nodes proportional to the
/// control-node voltages; no auxiliary current variable needed.
#[derive(Debug, Clone)]
pub struct Vccs {
    pub name: String,
    pub out_plus: String,
    pub out_minus: String,
    pub ctrl_plus: String,
    pub ctrl_minus: String,
    pub transconductance: f64,
}

impl Vccs {
    pub fn identifier(&self) -> String {
        format!("G{}", self.name)
    }
}

impl Stampable for Vccs {
    fn stamp_conductance(&self, ctx: &StampContext) -> Vec<Triplet> {
        let op = ctx.index_map.node(&self.out_plus);
        let om = ctx.index_map.node(&self.out_minus);
        let cp = ctx.index_map.node(&self.ctrl_plus);
        let cm = ctx.index_map.node(&self.ctrl_minus);
        let gm = self.transconductance;
        let mut out = Vec::with_capacity(4);
        push_conductance(&mut out, op, cp, gm);
        push_conductance(&mut out, op, cm, -gm);
        push_conductance(&mut out, om, cp, -gm);
        push_conductance(&mut out, om, cm, gm);
        out
    }

    fn stamp_rhs(&self, _ctx: &StampContext) -> Vec<RhsEntry> {
        Vec::new()
    }
}

/// Voltage-controlled voltage source: `V_out+ - V_out- = gain * (V_ctrl+ - V_ctrl-)`.
/// Requires an auxiliary branch-current unknown like an independent source.
#[derive(Debug, Clone)]
pub struct Vcvs {
    pub name: String,
    pub out_plus: String,
    pub out_minus: String,
    pub ctrl_plus: String,
    pub ctrl_minus: String,
    pub gain: f64,
}

impl Vcvs {
    pub fn identifier(&self) -> String {
        format!("E{}", self.name)
    }
}

impl Stampable for Vcvs {
    fn needs_current_variable(&self) -> bool {
        true
    }

    fn stamp_conductance(&self, ctx: &StampContext) -> Vec<Triplet> {
        let op = ctx.index_map.node(&self.out_plus);
        let om = ctx.index_map.node(&self.out_minus);
        let cp = ctx.index_map.node(&self.ctrl_plus);
        let cm = ctx.index_map.node(&self.ctrl_minus);
        let i_row = ctx.index_map.current(&self.identifier());
        let mut out = Vec::with_capacity(6);
        push_conductance(&mut out, op, i_row, 1.0);
        push_conductance(&mut out, om, i_row, -1.0);
        push_conductance(&mut out, i_row, op, 1.0);
        push_conductance(&mut out, i_row, om, -1.0);
        push_conductance(&mut out, i_row, cp, -self.gain);
        push_conductance(&mut out, i_row, cm, self.gain);
        out
    }

    fn stamp_rhs(&self, _ctx: &StampContext) -> Vec<RhsEntry> {
        Vec::new()
    }
}

/// Current-controlled current source: `I_out = gain * I_monitor`, where
/// `I_monitor` is the branch current of another current-variable-bearing
/// element, identified by that element's own identifier (e.g. `"V1"`).
#[derive(Debug, Clone)]
pub struct Cccs {
    pub name: String,
    pub out_plus: String,
    pub out_minus: String,
    pub monitor_identifier: String,
    pub gain: f64,
}

impl Cccs {
    pub fn identifier(&self) -> String {
        format!("F{}", self.name)
    }
}

impl Stampable for Cccs {
    fn stamp_conductance(&self, ctx: &StampContext) -> Vec<Triplet> {
        let op = ctx.index_map.node(&self.out_plus);
        let om = ctx.index_map.node(&self.out_minus);
        let monitor_row = ctx.index_map.current(&self.monitor_identifier);
        let mut out = Vec::with_capacity(2);
        push_conductance(&mut out, op, monitor_row, self.gain);
        push_conductance(&mut out, om, monitor_row, -self.gain);
        out
    }

    fn stamp_rhs(&self, _ctx: &StampContext) -> Vec<RhsEntry> {
        Vec::new()
    }
}

/// Current-controlled voltage source: `V_out+ - V_out- = gain * I_monitor`.
/// Requires its own auxiliary branch-current unknown.
#[derive(Debug, Clone)]
pub struct Ccvs {
    pub name: String,
    pub out_plus: String,
    pub out_minus: String,
    pub monitor_identifier: String,
    pub gain: f64,
}

impl Ccvs {
    pub fn identifier(&self) -> String {
        format!("H{}", self.name)
    }
}

impl Stampable for Ccvs {
    fn needs_current_variable(&self) -> bool {
        true
    }

    fn stamp_conductance(&self, ctx: &StampContext) -> Vec<Triplet> {
        let op = ctx.index_map.node(&self.out_plus);
        let om = ctx.index_map.node(&self.out_minus);
        let i_row = ctx.index_map.current(&self.identifier());
        let monitor_row = ctx.index_map.current(&self.monitor_identifier);
        let mut out = Vec::with_capacity(5);
        push_conductance(&mut out, op, i_row, 1.0);
        push_conductance(&mut out, om, i_row, -1.0);
        push_conductance(&mut out, i_row, op, 1.0);
        push_conductance(&mut out, i_row, om, -1.0);
        push_conductance(&mut out, i_row, monitor_row, -self.gain);
        out
    }

    fn stamp_rhs(&self, _ctx: &StampContext) -> Vec<RhsEntry> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index_map::IndexMap;

    fn ctx<'a>(map: &'a IndexMap) -> StampContext<'a> {
        StampContext {
            index_map: map,
            solution: &[],
            state: &[],
            state_index: None,
            t: 0.0,
        }
    }

    #[test]
    fn vccs_stamps_cross_conductances() {
        let vccs = Vccs {
            name: "1".into(),
            out_plus: "a".into(),
            out_minus: "0".into(),
            ctrl_plus: "b".into(),
            ctrl_minus: "0".into(),
            transconductance: 0.1,
        };
        let mut map = IndexMap::new();
        map.insert_node("a", 0);
        map.insert_node("b", 1);
        let stamps = vccs.stamp_conductance(&ctx(&map));
        assert!(stamps.iter().any(|t| t.row == 0 && t.col == 1 && (t.value - 0.1).abs() < 1e-15));
    }

    #[test]
    fn cccs_reads_monitor_current_column() {
        let cccs = Cccs {
            name: "1".into(),
            out_plus: "a".into(),
            out_minus: "0".into(),
            monitor_identifier: "V1".into(),
            gain: 2.0,
        };
        let mut map = IndexMap::new();
        map.insert_node("a", 0);
        map.insert_current("V1", 5);
        let stamps = cccs.stamp_conductance(&ctx(&map));
        assert!(stamps.iter().any(|t| t.row == 0 && t.col == 5 && t.value == 2.0));
    }
}

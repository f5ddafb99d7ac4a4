use voltaic_numeric::matrix::{DenseMatrix, Triplet};
use voltaic_numeric::solve::{lu_solve, LinearSolverConfig};

/// A set of mutually coupled inductors, referenced by name rather than by
/// direct reference to avoid the cycle a `CoupledInductorGroup` holding
/// `&Inductor`s (or vice versa) would create. `coupling[i][j]` is `k_ij`
/// (dimensionless, `|k_ij| <= 1`); the diagonal is unused.
///
/// Each member inductor is still an ordinary `Component::Inductor` in the
/// circuit's element list and stamps its own RHS contribution; the group
/// only changes how the transient integrator derives `dI/dt` for its
/// members, since their voltages are now coupled:
/// `V_i = L_i * dI_i/dt + sum_{j != i} M_ij * dI_j/dt`.
#[derive(Debug, Clone)]
pub struct CoupledInductorGroup {
    pub name: String,
    pub inductor_names: Vec<String>,
    coupling: Vec<Vec<f64>>,
}

impl CoupledInductorGroup {
    pub fn new(name: impl Into<String>, inductor_names: Vec<String>) -> Self {
        let n = inductor_names.len();
        CoupledInductorGroup {
            name: name.into(),
            inductor_names,
            coupling: vec![vec![0.0; n]; n],
        }
    }

    /// Sets the symmetric coupling coefficient between the `i`th and `j`th
    /// member inductors (by position in `inductor_names`).
    pub fn set_coupling(&mut self, i: usize, j: usize, k_ij: f64) {
        self.coupling[i][j] = k_ij;
        self.coupling[j][i] = k_ij;
    }

    pub fn mutual_inductance(&self, i: usize, j: usize, inductances: &[f64]) -> f64 {
        self.coupling[i][j] * (inductances[i] * inductances[j]).sqrt()
    }

    /// Solves `L * dI/dt = V` for the group, where `L` has `inductances` on
    /// the diagonal and mutual inductances off it, and `V` is the
    /// node-solved voltage across each member inductor.
    pub fn derivatives(&self, inductances: &[f64], v_across: &[f64]) -> Result<Vec<f64>, voltaic_numeric::error::Error> {
        let n = self.inductor_names.len();
        let mut triplets = Vec::with_capacity(n * n);
        for i in 0..n {
            triplets.push(Triplet::new(i, i, inductances[i]));
            for j in 0..n {
                if i != j {
                    let m_ij = self.mutual_inductance(i, j, inductances);
                    if m_ij != 0.0 {
                        triplets.push(Triplet::new(i, j, m_ij));
                    }
                }
            }
        }
        let matrix = DenseMatrix::from_triplets(n, &triplets);
        lu_solve(&matrix, v_across, &LinearSolverConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uncoupled_group_reduces_to_independent_inductors() {
        let group = CoupledInductorGroup::new("T1", vec!["1".into(), "2".into()]);
        let derivatives = group.derivatives(&[1e-3, 2e-3], &[5.0, 4.0]).unwrap();
        assert!((derivatives[0] - 5000.0).abs() < 1e-3);
        assert!((derivatives[1] - 2000.0).abs() < 1e-3);
    }

    #[test]
    fn coupling_introduces_cross_terms() {
        let mut group = CoupledInductorGroup::new("T1", vec!["1".into(), "2".into()]);
        group.set_coupling(0, 1, 0.5);
        let m = group.mutual_inductance(0, 1, &[1e-3, 1e-3]);
        assert!((m - 0.5e-3).abs() < 1e-9);
        let derivatives = group.derivatives(&[1e-3, 1e-3], &[5.0, 5.0]).unwrap();
        // Symmetric excitation on a symmetric coupled pair: equal derivatives.
        assert!((derivatives[0] - derivatives[1]).abs() < 1e-6);
    }
}

use voltaic_core::config::SolverConfig;

/// Relative-plus-absolute convergence check between two full solution
/// vectors (node voltages followed by branch currents, per the MNA layout).
/// Rows at or beyond `node_count` are branch currents and use the current
/// absolute tolerance; everything below it is a voltage.
pub fn convergence_check(previous: &[f64], current: &[f64], node_count: usize, config: &SolverConfig) -> bool {
    if previous.is_empty() {
        return false;
    }

    previous.iter().zip(current).enumerate().all(|(row, (&prev, &value))| {
        let diff = (value - prev).abs();
        let scale = value.abs().max(prev.abs());
        let atol = if row < node_count {
            config.voltage_absolute_tolerance
        } else {
            config.current_absolute_tolerance
        };
        diff <= config.relative_tolerance * scale + atol
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_previous_never_converges() {
        assert!(!convergence_check(&[], &[1.0], 1, &SolverConfig::default()));
    }

    #[test]
    fn identical_vectors_converge() {
        let config = SolverConfig::default();
        assert!(convergence_check(&[1.0, 2.0], &[1.0, 2.0], 1, &config));
    }

    #[test]
    fn large_change_does_not_converge() {
        let config = SolverConfig::default();
        assert!(!convergence_check(&[1.0], &[5.0], 1, &config));
    }
}

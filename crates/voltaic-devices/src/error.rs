use thiserror::Error;

/// Constructor-time parameter violations for a device.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{component}: resistance must be positive, got {value}")]
    NonPositiveResistance { component: String, value: f64 },

    #[error("{component}: capacitance must be positive, got {value}")]
    NonPositiveCapacitance { component: String, value: f64 },

    #[error("{component}: inductance must be positive, got {value}")]
    NonPositiveInductance { component: String, value: f64 },

    #[error("{component}: on-resistance {r_on} must be less than off-resistance {r_off}")]
    OnResistanceNotLessThanOff {
        component: String,
        r_on: f64,
        r_off: f64,
    },

    #[error("{component}: forward voltage must be non-negative, got {value}")]
    NegativeForwardVoltage { component: String, value: f64 },

    #[error("{0}: transconductance coefficient must be positive")]
    NonPositiveConductanceCoefficient(String),
}

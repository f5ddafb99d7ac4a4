/// The transient state-update rule. `ForwardEuler` is the only fully
/// implemented variant; the others are represented so a follow-up can
/// complete them without reshaping the stepping call site, per the deferral
/// decision recorded for this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IntegrationMethod {
    #[default]
    ForwardEuler,
    RungeKutta4,
    Bdf2,
}

impl IntegrationMethod {
    pub fn name(self) -> &'static str {
        match self {
            IntegrationMethod::ForwardEuler => "forward Euler",
            IntegrationMethod::RungeKutta4 => "4th-order Runge-Kutta",
            IntegrationMethod::Bdf2 => "variable-step BDF2",
        }
    }
}

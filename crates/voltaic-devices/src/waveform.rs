/// A source waveform descriptor. Given a time `t` it yields a scalar value;
/// the numerical core never parses these from text, it only evaluates them.
#[derive(Debug, Clone, PartialEq)]
pub enum Waveform {
    Dc {
        value: f64,
    },
    Sine {
        offset: f64,
        amplitude: f64,
        frequency: f64,
        delay: f64,
        damping: f64,
    },
    Pulse {
        v1: f64,
        v2: f64,
        delay_time: f64,
        rise_time: f64,
        fall_time: f64,
        pulse_width: f64,
        period: f64,
    },
    Exp {
        v1: f64,
        v2: f64,
        delay_time_1: f64,
        time_constant_1: f64,
        delay_time_2: f64,
        time_constant_2: f64,
    },
    /// Ordered `(t, v)` breakpoints; linearly interpolated between them. Holds
    /// the first value before `t0` and the last value after the final point.
    Pwl {
        points: Vec<(f64, f64)>,
    },
}

impl Waveform {
    pub fn value_at(&self, t: f64) -> f64 {
        match self {
            Waveform::Dc { value } => *value,
            Waveform::Sine {
                offset,
                amplitude,
                frequency,
                delay,
                damping,
            } => {
                if t < *delay {
                    *offset
                } else {
                    let elapsed = t - delay;
                    let envelope = (-damping * elapsed).exp();
                    offset + amplitude * envelope * (2.0 * std::f64::consts::PI * frequency * elapsed).sin()
                }
            }
            Waveform::Pulse {
                v1,
                v2,
                delay_time,
                rise_time,
                fall_time,
                pulse_width,
                period,
            } => pulse_value_at(t, *v1, *v2, *delay_time, *rise_time, *fall_time, *pulse_width, *period),
            Waveform::Exp {
                v1,
                v2,
                delay_time_1,
                time_constant_1,
                delay_time_2,
                time_constant_2,
            } => exp_value_at(
                t,
                *v1,
                *v2,
                *delay_time_1,
                *time_constant_1,
                *delay_time_2,
                *time_constant_2,
            ),
            Waveform::Pwl { points } => pwl_value_at(points, t),
        }
    }
}

fn pulse_value_at(
    t: f64,
    v1: f64,
    v2: f64,
    delay_time: f64,
    rise_time: f64,
    fall_time: f64,
    pulse_width: f64,
    period: f64,
) -> f64 {
    if t < delay_time {
        return v1;
    }
    let cycle_time = if period > 0.0 {
        (t - delay_time) % period
    } else {
        t - delay_time
    };

    if cycle_time < rise_time {
        if rise_time == 0.0 {
            v2
        } else {
            v1 + (v2 - v1) * (cycle_time / rise_time)
        }
    } else if cycle_time < rise_time + pulse_width {
        v2
    } else if cycle_time < rise_time + pulse_width + fall_time {
        if fall_time == 0.0 {
            v1
        } else {
            let into_fall = cycle_time - rise_time - pulse_width;
            v2 + (v1 - v2) * (into_fall / fall_time)
        }
    } else {
        v1
    }
}

fn exp_value_at(
    t: f64,
    v1: f64,
    v2: f64,
    delay_time_1: f64,
    time_constant_1: f64,
    delay_time_2: f64,
    time_constant_2: f64,
) -> f64 {
    if t < delay_time_1 {
        v1
    } else if t < delay_time_2 {
        let tau1 = if time_constant_1 > 0.0 { time_constant_1 } else { 1e-12 };
        v1 + (v2 - v1) * (1.0 - (-(t - delay_time_1) / tau1).exp())
    } else {
        let tau1 = if time_constant_1 > 0.0 { time_constant_1 } else { 1e-12 };
        let tau2 = if time_constant_2 > 0.0 { time_constant_2 } else { 1e-12 };
        let rise_at_d2 = v1 + (v2 - v1) * (1.0 - (-(delay_time_2 - delay_time_1) / tau1).exp());
        rise_at_d2 + (v1 - v2) * (1.0 - (-(t - delay_time_2) / tau2).exp())
    }
}

fn pwl_value_at(points: &[(f64, f64)], t: f64) -> f64 {
    if points.is_empty() {
        return 0.0;
    }
    if t <= points[0].0 {
        return points[0].1;
    }
    if t >= points[points.len() - 1].0 {
        return points[points.len() - 1].1;
    }
    for window in points.windows(2) {
        let (t0, v0) = window[0];
        let (t1, v1) = window[1];
        if t >= t0 && t <= t1 {
            if (t1 - t0).abs() < f64::EPSILON {
                return v1;
            }
            let frac = (t - t0) / (t1 - t0);
            return v0 + (v1 - v0) * frac;
        }
    }
    points[points.len() - 1].1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dc_is_constant() {
        let w = Waveform::Dc { value: 5.0 };
        assert_eq!(w.value_at(0.0), 5.0);
        assert_eq!(w.value_at(1e6), 5.0);
    }

    #[test]
    fn sine_starts_at_offset_before_delay() {
        let w = Waveform::Sine {
            offset: 1.0,
            amplitude: 2.0,
            frequency: 1000.0,
            delay: 0.5,
            damping: 0.0,
        };
        assert_eq!(w.value_at(0.0), 1.0);
    }

    #[test]
    fn sine_undamped_matches_closed_form() {
        let w = Waveform::Sine {
            offset: 0.0,
            amplitude: 10.0,
            frequency: 1000.0,
            delay: 0.0,
            damping: 0.0,
        };
        let t = 0.25e-3; // quarter period
        let expected = 10.0 * (2.0 * std::f64::consts::PI * 1000.0 * t).sin();
        assert!((w.value_at(t) - expected).abs() < 1e-9);
    }

    #[test]
    fn pulse_traverses_each_phase() {
        let w = Waveform::Pulse {
            v1: 0.0,
            v2: 5.0,
            delay_time: 1.0,
            rise_time: 1.0,
            fall_time: 1.0,
            pulse_width: 2.0,
            period: 10.0,
        };
        assert_eq!(w.value_at(0.0), 0.0); // before delay
        assert_eq!(w.value_at(1.0), 0.0); // start of rise
        assert!((w.value_at(1.5) - 2.5).abs() < 1e-9); // mid-rise
        assert_eq!(w.value_at(2.5), 5.0); // plateau
        assert!((w.value_at(4.5) - 2.5).abs() < 1e-9); // mid-fall
        assert_eq!(w.value_at(5.5), 0.0); // back to v1
    }

    #[test]
    fn pulse_wraps_with_period() {
        let w = Waveform::Pulse {
            v1: 0.0,
            v2: 5.0,
            delay_time: 0.0,
            rise_time: 0.0,
            fall_time: 0.0,
            pulse_width: 1.0,
            period: 2.0,
        };
        assert_eq!(w.value_at(0.5), 5.0);
        assert_eq!(w.value_at(1.5), 0.0);
        assert_eq!(w.value_at(2.5), 5.0);
    }

    #[test]
    fn exp_rises_then_falls() {
        let w = Waveform::Exp {
            v1: 0.0,
            v2: 5.0,
            delay_time_1: 0.0,
            time_constant_1: 1e-3,
            delay_time_2: 5e-3,
            time_constant_2: 1e-3,
        };
        assert!(w.value_at(0.0) < 0.01);
        assert!(w.value_at(5e-3) > 4.9);
        assert!(w.value_at(20e-3) < 1.0);
    }

    #[test]
    fn pwl_interpolates_linearly() {
        let w = Waveform::Pwl {
            points: vec![(0.0, 0.0), (1.0, 10.0), (2.0, 0.0)],
        };
        assert_eq!(w.value_at(-1.0), 0.0);
        assert!((w.value_at(0.5) - 5.0).abs() < 1e-9);
        assert_eq!(w.value_at(1.0), 10.0);
        assert!((w.value_at(1.5) - 5.0).abs() < 1e-9);
        assert_eq!(w.value_at(3.0), 0.0);
    }
}

use crate::error::{Error, Result};

/// A hyperparameter schedule evaluated over episodes
pub trait Decay {
    /// Calculate value at time `t`
    fn evaluate(&self, t: f64) -> f64;
}

/// A constant value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Constant {
    value: f64,
}

impl Constant {
    pub fn new(value: f64) -> Self {
        Self { value }
    }
}

impl Decay for Constant {
    fn evaluate(&self, _t: f64) -> f64 {
        self.value
    }
}

/// v(t) = v<sub>f</sub> + (v<sub>i</sub> - v<sub>f</sub>) * e<sup>-rt</sup>
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Exponential {
    rate: f64,
    vi: f64,
    vf: f64,
}

impl Exponential {
    /// **Errors** if the rate is negative or the schedule does not decrease from `vi` to `vf`
    pub fn new(rate: f64, vi: f64, vf: f64) -> Result<Self> {
        if rate < 0.0 || vi < vf {
            return Err(Error::InvalidDecay(format!(
                "expected rate >= 0 and vi >= vf, got rate={rate}, vi={vi}, vf={vf}"
            )));
        }
        Ok(Self { rate, vi, vf })
    }
}

impl Decay for Exponential {
    fn evaluate(&self, t: f64) -> f64 {
        let &Self { rate, vi, vf } = self;
        vf + (vi - vf) * (-rate * t).exp()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_decay() {
        let x = Constant::new(0.1);
        assert_eq!(x.evaluate(0.0), 0.1);
        assert_eq!(x.evaluate(5000.0), 0.1);
    }

    #[test]
    fn exponential_decay() {
        let x = Exponential::new(2.0, 2.0, 0.5).unwrap();
        assert_eq!(x.evaluate(0.0), 2.0);
        assert_eq!(x.evaluate(1.0), 0.5 + 1.5 * f64::exp(-2.0));
    }

    #[test]
    fn exponential_rejects_increasing_schedule() {
        assert!(Exponential::new(1.0, 0.1, 1.0).is_err());
        assert!(Exponential::new(-1.0, 1.0, 0.1).is_err());
    }
}

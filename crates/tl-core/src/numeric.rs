use crate::CoreError;

/// Floating point type used throughout system
pub type Real = f64;

/// One tolerance for everything
#[derive(Clone, Copy, Debug)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-12,
            rel: 1e-9,
        }
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, CoreError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(CoreError::NonFinite { what, value: v })
    }
}

/// Finite and inside the closed interval `[min, max]`.
pub fn ensure_within(v: Real, min: Real, max: Real, what: &'static str) -> Result<Real, CoreError> {
    let v = ensure_finite(v, what)?;
    if v < min || v > max {
        return Err(CoreError::OutOfRange {
            what,
            value: v,
            min,
            max,
        });
    }
    Ok(v)
}

/// Clamp `v` into `[min, max]`, rejecting NaN/Inf instead of propagating them.
pub fn clamp_finite(v: Real, min: Real, max: Real, what: &'static str) -> Result<Real, CoreError> {
    Ok(ensure_finite(v, what)?.clamp(min, max))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn nearly_equal_basic() {
        let tol = Tolerances {
            abs: 1e-12,
            rel: 1e-9,
        };
        assert!(nearly_equal(1.0, 1.0 + 1e-12, tol));
        assert!(nearly_equal(0.0, 1e-13, tol));
        assert!(!nearly_equal(1.0, 1.0 + 1e-6, tol));
    }

    #[test]
    fn ensure_finite_detects_nan() {
        let err = ensure_finite(Real::NAN, "test").unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("Non-finite"));
    }

    #[test]
    fn ensure_within_reports_bounds() {
        assert_eq!(ensure_within(15.0, 15.0, 40.0, "t"), Ok(15.0));
        let err = ensure_within(40.5, 15.0, 40.0, "t").unwrap_err();
        assert!(matches!(err, CoreError::OutOfRange { value, .. } if value == 40.5));
        assert!(matches!(
            ensure_within(Real::INFINITY, 15.0, 40.0, "t"),
            Err(CoreError::NonFinite { .. })
        ));
    }

    #[test]
    fn clamp_finite_rejects_nan() {
        assert_eq!(clamp_finite(120.0, 0.0, 100.0, "p"), Ok(100.0));
        assert!(clamp_finite(Real::NAN, 0.0, 100.0, "p").is_err());
    }

    proptest! {
        #[test]
        fn clamp_finite_stays_in_range(v in -1e6f64..1e6) {
            let c = clamp_finite(v, 0.0, 100.0, "p").unwrap();
            prop_assert!((0.0..=100.0).contains(&c));
        }
    }
}

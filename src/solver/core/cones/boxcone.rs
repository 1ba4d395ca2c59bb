use super::Cone;
use crate::algebra::*;

// -------------------------------------
// Box Cone
// -------------------------------------

/// The cone `{(t, s) : t ≥ 0, t·l ≤ s ≤ t·u}`.
///
/// Infinite bounds are allowed and are left unscaled by `t`.
pub struct BoxCone<T: FloatT = f64> {
    lower: Vec<T>,
    upper: Vec<T>,
}

const BOX_BRACKET_ITERS: usize = 200;
const BOX_BISECT_ITERS: usize = 200;

impl<T> BoxCone<T>
where
    T: FloatT,
{
    pub fn new(lower: Vec<T>, upper: Vec<T>) -> Self {
        assert_eq!(lower.len(), upper.len());
        Self { lower, upper }
    }

    fn bounds_at(&self, i: usize, t: T) -> (T, T) {
        let (l, u) = (self.lower[i], self.upper[i]);
        let lo = if l.is_finite() { t * l } else { l };
        let hi = if u.is_finite() { t * u } else { u };
        (lo, hi)
    }

    // derivative (up to a factor 2) of the squared distance from
    // (t0, s0) to (t, clip(s0, t l, t u)).  Nondecreasing in t.
    fn slope(&self, t: T, t0: T, s0: &[T]) -> T {
        let mut g = t - t0;
        for (i, &si) in s0.iter().enumerate() {
            let (lo, hi) = self.bounds_at(i, t);
            if si < lo {
                g += (lo - si) * self.lower[i];
            } else if si > hi {
                g -= (si - hi) * self.upper[i];
            }
        }
        g
    }
}

impl<T> Cone<T> for BoxCone<T>
where
    T: FloatT,
{
    fn numel(&self) -> usize {
        self.lower.len() + 1
    }

    fn is_separable(&self) -> bool {
        false
    }

    fn project(&mut self, x: &mut [T]) {
        let t0 = x[0];
        let (_, s) = x.split_at_mut(1);

        let t = if self.slope(T::zero(), t0, s) >= T::zero() {
            T::zero()
        } else {
            // bracket the root of the slope, then bisect
            let mut lo = T::zero();
            let mut hi = T::max(T::one(), t0.abs());
            for _ in 0..BOX_BRACKET_ITERS {
                if self.slope(hi, t0, s) >= T::zero() {
                    break;
                }
                lo = hi;
                hi = hi + hi;
            }
            for _ in 0..BOX_BISECT_ITERS {
                let mid = (lo + hi) * (0.5).as_T();
                if mid <= lo || mid >= hi {
                    break;
                }
                if self.slope(mid, t0, s) >= T::zero() {
                    hi = mid;
                } else {
                    lo = mid;
                }
            }
            (lo + hi) * (0.5).as_T()
        };

        x[0] = t;
        for i in 0..self.lower.len() {
            let (lo, hi) = self.bounds_at(i, t);
            x[i + 1] = T::min(T::max(x[i + 1], lo), hi);
        }
    }
}

#[test]
fn test_box_projection() {
    let mut K = BoxCone::<f64>::new(vec![0., 0.], vec![1., 1.]);

    // (1, 0.5, 0.5) is inside
    let mut x = vec![1., 0.5, 0.5];
    K.project(&mut x);
    assert!((x[0] - 1.).abs() < 1e-12);
    assert_eq!(&x[1..], &[0.5, 0.5]);

    // with t fixed at 1, s = (2, -1) projects to (1, 0), but t
    // moves up to reduce the violation of the upper bound
    let mut x = vec![1., 2., -1.];
    K.project(&mut x);
    assert!((x[0] - 1.5).abs() < 1e-9);
    assert!((x[1] - 1.5).abs() < 1e-9);
    assert_eq!(x[2], 0.);

    // infinite bounds do not constrain
    let mut K = BoxCone::<f64>::new(vec![f64::NEG_INFINITY], vec![f64::INFINITY]);
    let mut x = vec![-1., 7.];
    K.project(&mut x);
    assert_eq!(x, vec![0., 7.]);
}

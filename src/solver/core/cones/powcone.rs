use super::*;
use crate::algebra::*;

// -------------------------------------
// Power Cone
// -------------------------------------

const POW_CONE_MAX_ITERS: usize = 20;

/// The cone `{(x, y, z) : x^a · y^(1-a) ≥ |z|, x, y ≥ 0}` for `a ∈ (0,1)`,
/// or its dual.
pub struct PowerCone<T: FloatT = f64> {
    a: T,
    pd: PrimalOrDualCone,
    work: [T; 3],
}

impl<T> PowerCone<T>
where
    T: FloatT,
{
    /// A negative parameter selects the dual cone with exponent `-p`.
    pub fn new(p: T) -> Self {
        let pd = if p < T::zero() {
            PrimalOrDualCone::DualCone
        } else {
            PrimalOrDualCone::PrimalCone
        };
        Self {
            a: p.abs(),
            pd,
            work: [T::zero(); 3],
        }
    }
}

impl<T> Cone<T> for PowerCone<T>
where
    T: FloatT,
{
    fn numel(&self) -> usize {
        3
    }

    fn is_separable(&self) -> bool {
        false
    }

    fn project(&mut self, x: &mut [T]) {
        let a = self.a;
        match self.pd {
            PrimalOrDualCone::PrimalCone => project_pow_primal(x, a),
            PrimalOrDualCone::DualCone => {
                project_dual_moreau(x, &mut self.work, |v| project_pow_primal(v, a))
            }
        }
    }
}

fn pow_calc_x<T: FloatT>(r: T, xh: T, rh: T, a: T) -> T {
    let four: T = (4.).as_T();
    let half: T = (0.5).as_T();
    let x = half * (xh + T::sqrt(xh * xh + four * a * (rh - r) * r));
    T::max(x, (1e-12).as_T())
}

fn pow_calc_dxdr<T: FloatT>(x: T, xh: T, rh: T, r: T, a: T) -> T {
    a * (rh - r - r) / (x + x - xh)
}

fn pow_calc_f<T: FloatT>(x: T, y: T, r: T, a: T) -> T {
    T::powf(x, a) * T::powf(y, T::one() - a) - r
}

fn pow_calc_fp<T: FloatT>(x: T, y: T, dxdr: T, dydr: T, a: T) -> T {
    T::powf(x, a) * T::powf(y, T::one() - a) * (a * dxdr / x + (T::one() - a) * dydr / y) - T::one()
}

pub(crate) fn project_pow_primal<T: FloatT>(v: &mut [T], a: T) {
    let (xh, yh, rh) = (v[0], v[1], T::abs(v[2]));
    let thresh: T = CONE_THRESH.as_T();
    let one_a = T::one() - a;

    // v in K_a
    if xh >= T::zero() && yh >= T::zero() && thresh + T::powf(xh, a) * T::powf(yh, one_a) >= rh {
        return;
    }

    // -v in K_a^*
    if xh <= T::zero()
        && yh <= T::zero()
        && thresh + T::powf(-xh, a) * T::powf(-yh, one_a)
            >= rh * T::powf(a, a) * T::powf(one_a, one_a)
    {
        v.fill(T::zero());
        return;
    }

    let tol: T = CONE_TOL.as_T();
    let (mut x, mut y) = (T::zero(), T::zero());
    let mut r = rh * (0.5).as_T();
    for _ in 0..POW_CONE_MAX_ITERS {
        x = pow_calc_x(r, xh, rh, a);
        y = pow_calc_x(r, yh, rh, one_a);
        let f = pow_calc_f(x, y, r, a);
        if T::abs(f) < tol {
            break;
        }
        let dxdr = pow_calc_dxdr(x, xh, rh, r, a);
        let dydr = pow_calc_dxdr(y, yh, rh, r, one_a);
        let fp = pow_calc_fp(x, y, dxdr, dydr, a);
        r = T::min(T::max(r - f / fp, T::zero()), rh);
    }

    v[0] = x;
    v[1] = y;
    v[2] = if v[2] < T::zero() { -r } else { r };
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_pow_projection() {
        let mut K = PowerCone::<f64>::new(0.5);

        // inside: sqrt(4*1) = 2 ≥ |1|
        let mut v = vec![4., 1., -1.];
        K.project(&mut v);
        assert_eq!(v, vec![4., 1., -1.]);

        // outside, lands on the boundary x^a y^(1-a) = |z|
        let mut v = vec![1., 1., 3.];
        K.project(&mut v);
        let lhs = f64::sqrt(v[0] * v[1]);
        assert!((lhs - v[2].abs()).abs() < 1e-5);
        assert!(v[2] > 0.);
    }

    #[test]
    fn test_dual_pow_moreau() {
        // x = Π_K(x) - Π_K*(-x)
        let x = vec![0.3, -0.2, 1.0];
        let mut p = x.clone();
        PowerCone::<f64>::new(0.3).project(&mut p);
        let mut d = x.clone();
        d.negate();
        PowerCone::<f64>::new(-0.3).project(&mut d);

        let mut sum = p.clone();
        sum.axpby(-1., &d, 1.);
        assert!(sum.norm_inf_diff(&x) < 1e-6);
        assert!(p.dot(&d).abs() < 1e-5);
    }
}

use super::*;
use crate::algebra::*;

// -------------------------------------
// Exponential Cone
// -------------------------------------

const EXP_CONE_MAX_ITERS: usize = 100;

/// The closure of `{(r, s, t) : s·exp(r/s) ≤ t, s > 0}`, or its dual.
pub struct ExponentialCone<T: FloatT = f64> {
    pd: PrimalOrDualCone,
    work: [T; 3],
}

impl<T> ExponentialCone<T>
where
    T: FloatT,
{
    pub fn new(pd: PrimalOrDualCone) -> Self {
        Self {
            pd,
            work: [T::zero(); 3],
        }
    }
}

impl<T> Cone<T> for ExponentialCone<T>
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
        match self.pd {
            PrimalOrDualCone::PrimalCone => project_exp_primal(x),
            PrimalOrDualCone::DualCone => project_dual_moreau(x, &mut self.work, project_exp_primal),
        }
    }
}

// Newton iteration for the one dimensional root in the
// optimality conditions for a fixed dual variable ρ
fn exp_newton_one_d<T: FloatT>(rho: T, y_hat: T, z_hat: T, w: T) -> T {
    let tol: T = CONE_TOL.as_T();
    let mut t = T::max(w - z_hat, T::max(-z_hat, tol));

    for _ in 0..EXP_CONE_MAX_ITERS {
        let t_prev = t;
        let f = t * (t + z_hat) / rho / rho - y_hat / rho + T::ln(t / rho) + T::one();
        let fp = (t + t + z_hat) / rho / rho + T::recip(t);
        t -= f / fp;

        if t <= -z_hat {
            t = -z_hat;
            break;
        } else if t <= T::zero() {
            t = T::zero();
            break;
        } else if T::abs(t - t_prev) < tol || T::sqrt(f * f / fp) < tol {
            break;
        }
    }
    t + z_hat
}

fn exp_solve_for_x_with_rho<T: FloatT>(v: &[T], x: &mut [T; 3], rho: T, w: T) {
    x[2] = exp_newton_one_d(rho, v[1], v[2], w);
    x[1] = (x[2] - v[2]) * x[2] / rho;
    x[0] = v[0] - rho;
}

fn exp_calc_grad<T: FloatT>(v: &[T], x: &mut [T; 3], rho: T, w: T) -> T {
    exp_solve_for_x_with_rho(v, x, rho, w);
    if x[1] <= (1e-12).as_T() {
        x[0]
    } else {
        x[0] + x[1] * T::ln(x[1] / x[2])
    }
}

fn exp_get_rho_ub<T: FloatT>(v: &[T], x: &mut [T; 3]) -> (T, T) {
    let mut lb = T::zero();
    let mut ub: T = (0.125).as_T();
    for _ in 0..EXP_CONE_MAX_ITERS {
        if exp_calc_grad(v, x, ub, v[1]) <= T::zero() {
            break;
        }
        lb = ub;
        ub = ub + ub;
    }
    (lb, ub)
}

pub(crate) fn project_exp_primal<T: FloatT>(v: &mut [T]) {
    let (r, s, t) = (v[0], v[1], v[2]);
    let thresh: T = CONE_THRESH.as_T();

    // v in cl(K_exp)
    if (s > T::zero() && s * T::exp(r / s) - t <= thresh)
        || (r <= T::zero() && s == T::zero() && t >= T::zero())
    {
        return;
    }

    // -v in K_exp^*
    if (r > T::zero() && r * T::exp(s / r) + T::E() * t <= thresh)
        || (r == T::zero() && s <= T::zero() && t <= T::zero())
    {
        v.fill(T::zero());
        return;
    }

    // analytic solution
    if r < T::zero() && s < T::zero() {
        v[1] = T::zero();
        v[2] = T::max(t, T::zero());
        return;
    }

    // bisection on the dual variable
    let mut x = [T::zero(); 3];
    let (mut lb, mut ub) = exp_get_rho_ub(v, &mut x);
    let tol: T = CONE_TOL.as_T();
    for _ in 0..EXP_CONE_MAX_ITERS {
        let rho = (lb + ub) * (0.5).as_T();
        let w = x[1];
        let g = exp_calc_grad(v, &mut x, rho, w);
        if g > T::zero() {
            lb = rho;
        } else {
            ub = rho;
        }
        if ub - lb < tol {
            break;
        }
    }
    v.copy_from_slice(&x);
}

#[cfg(test)]
mod test {
    use super::*;

    fn in_exp_cone(v: &[f64], tol: f64) -> bool {
        let (r, s, t) = (v[0], v[1], v[2]);
        (s > 0. && s * f64::exp(r / s) <= t + tol) || (r <= tol && s.abs() <= tol && t >= -tol)
    }

    #[test]
    fn test_exp_projection_cases() {
        let mut K = ExponentialCone::<f64>::new(PrimalOrDualCone::PrimalCone);

        // interior point is unchanged
        let mut v = vec![0., 1., 2.];
        K.project(&mut v);
        assert_eq!(v, vec![0., 1., 2.]);

        // analytic case r < 0, s < 0
        let mut v = vec![-1., -1., 3.];
        K.project(&mut v);
        assert_eq!(v, vec![-1., 0., 3.]);

        // generic case lands on the boundary and is idempotent
        let mut v = vec![1., 1., 1.];
        K.project(&mut v);
        assert!(in_exp_cone(&v, 1e-6));
        let w = v.clone();
        K.project(&mut v);
        assert!(v.norm_inf_diff(&w) < 1e-6);
    }

    #[test]
    fn test_exp_moreau() {
        // x = Π_K(x) + Π_K°(x) with Π_K(x) ⟂ Π_K°(x)
        let x = vec![1.5, -0.3, 0.2];
        let mut p = x.clone();
        let mut Kp = ExponentialCone::<f64>::new(PrimalOrDualCone::PrimalCone);
        Kp.project(&mut p);

        let mut d = x.clone();
        d.negate();
        let mut Kd = ExponentialCone::<f64>::new(PrimalOrDualCone::DualCone);
        Kd.project(&mut d);
        // Π_K°(x) = -Π_K*(-x)
        d.negate();

        let mut sum = p.clone();
        sum.axpby(1., &d, 1.);
        assert!(sum.norm_inf_diff(&x) < 1e-6);
        assert!(p.dot(&d).abs() < 1e-5);
    }
}

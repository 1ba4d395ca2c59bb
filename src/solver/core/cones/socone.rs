use super::Cone;
use crate::algebra::*;
use core::marker::PhantomData;

// -------------------------------------
// Second order Cone
// -------------------------------------

/// The cone `{(t, x) : ‖x‖ ≤ t}`
pub struct SecondOrderCone<T: FloatT = f64> {
    dim: usize,
    phantom: PhantomData<T>,
}

impl<T> SecondOrderCone<T>
where
    T: FloatT,
{
    pub fn new(dim: usize) -> Self {
        assert!(dim >= 1);
        Self {
            dim,
            phantom: PhantomData,
        }
    }
}

impl<T> Cone<T> for SecondOrderCone<T>
where
    T: FloatT,
{
    fn numel(&self) -> usize {
        self.dim
    }

    fn is_separable(&self) -> bool {
        false
    }

    fn project(&mut self, x: &mut [T]) {
        let t = x[0];
        let nx = x[1..].norm();

        if nx <= t {
            // already in the cone
        } else if nx <= -t {
            x.fill(T::zero());
        } else {
            let half: T = (0.5).as_T();
            let alpha = half * (nx + t);
            x[0] = alpha;
            x[1..].scale(alpha / nx);
        }
    }
}

#[test]
fn test_soc_projection() {
    let mut K = SecondOrderCone::<f64>::new(3);

    let mut inside = vec![5., 3., 4.];
    K.project(&mut inside);
    assert_eq!(inside, vec![5., 3., 4.]);

    let mut polar = vec![-5., 3., 4.];
    K.project(&mut polar);
    assert_eq!(polar, vec![0., 0., 0.]);

    let mut outside = vec![0., 3., 4.];
    K.project(&mut outside);
    assert!((outside[0] - 2.5).abs() < 1e-15);
    assert!((outside[1..].norm() - 2.5).abs() < 1e-14);

    // dimension one is the nonnegative ray
    let mut K1 = SecondOrderCone::<f64>::new(1);
    let mut v = vec![-1.];
    K1.project(&mut v);
    assert_eq!(v, vec![0.]);
}

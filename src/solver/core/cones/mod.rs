#![allow(non_snake_case)]

use crate::algebra::FloatT;
use enum_dispatch::*;

//primitive cone types
mod boxcone;
mod expcone;
mod nonnegativecone;
mod powcone;
mod psdtrianglecone;
mod socone;
mod zerocone;

//the collection of cones making up a problem
mod coneset;

//flatten all cone implementations to appear in this module
pub use boxcone::*;
pub use coneset::*;
pub use expcone::*;
pub use nonnegativecone::*;
pub use powcone::*;
pub use psdtrianglecone::*;
pub use socone::*;
pub use zerocone::*;

// tolerances shared by the iterative projections
pub(crate) const CONE_TOL: f64 = 1e-8;
pub(crate) const CONE_THRESH: f64 = 1e-8;

// marker for primal / dual distinctions
#[derive(PartialEq, Eq, Clone, Debug, Copy)]
pub enum PrimalOrDualCone {
    PrimalCone,
    DualCone,
}

#[enum_dispatch]
pub trait Cone<T>
where
    T: FloatT,
{
    /// number of slack entries covered by this cone
    fn numel(&self) -> usize;

    /// true if the cone is a product of one dimensional cones, so that
    /// data scaling may differ between its rows
    fn is_separable(&self) -> bool;

    /// Euclidean projection of `x` onto the cone, in place
    fn project(&mut self, x: &mut [T]);
}

/// Enum wrapper over every supported cone, used for static dispatch
#[enum_dispatch(Cone<T>)]
pub enum SupportedCone<T>
where
    T: FloatT,
{
    ZeroCone(ZeroCone<T>),
    NonnegativeCone(NonnegativeCone<T>),
    BoxCone(BoxCone<T>),
    SecondOrderCone(SecondOrderCone<T>),
    PsdTriangleCone(PsdTriangleCone<T>),
    ExponentialCone(ExponentialCone<T>),
    PowerCone(PowerCone<T>),
}

// Projection onto the dual cone through the Moreau decomposition
// x = Π_K(x) - Π_K*(-x), so that Π_K*(x) = x + Π_K(-x).
pub(crate) fn project_dual_moreau<T: FloatT>(x: &mut [T], work: &mut [T], proj: impl FnOnce(&mut [T])) {
    for (w, &xi) in work.iter_mut().zip(x.iter()) {
        *w = -xi;
    }
    proj(work);
    for (xi, &w) in x.iter_mut().zip(work.iter()) {
        *xi += w;
    }
}

//! Solver core: cone projections, linear system backends and the
//! operator splitting iteration.

pub(crate) mod accel;
pub(crate) mod admm;
pub mod cones;
pub mod linsys;
pub(crate) mod residuals;

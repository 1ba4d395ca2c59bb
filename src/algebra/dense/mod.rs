// Small dense kernels used by the PSD cone projection and the
// acceleration least-squares step.  All matrices are square and
// stored column major.
//
// Symmetric eigendecompositions go through LAPACK ?syevr when the
// "sdp" feature is enabled, and through cyclic Jacobi sweeps otherwise.

mod eigen;
pub use eigen::*;
mod lu;
pub use lu::*;

cfg_if::cfg_if! {
    if #[cfg(feature = "sdp")] {
        mod lapack;
        pub use lapack::*;
    } else {
        mod jacobi;
    }
}

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Status of the solver at termination
#[derive(PartialEq, Eq, Clone, Debug, Copy, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SolverStatus {
    /// The solver has not run, or stopped before any termination check.
    #[default]
    Unfinished,
    /// Solver terminated with a solution.
    Solved,
    /// Solver terminated with a solution (reduced accuracy).
    SolvedInaccurate,
    /// Iteration limit reached before a solution or certificate was found.
    MaxIterations,
    /// Time limit reached before a solution or certificate was found.
    MaxTime,
    /// Problem is dual infeasible.  The solution is a certificate.
    Unbounded,
    /// Problem is primal infeasible.  The solution is a certificate.
    Infeasible,
    /// Neither a solution nor a certificate could be identified.
    Indeterminate,
    /// Solver terminated with an error.
    Failed,
    /// Problem is dual infeasible (reduced accuracy).
    UnboundedInaccurate,
    /// Problem is primal infeasible (reduced accuracy).
    InfeasibleInaccurate,
}

impl SolverStatus {
    /// integer status code reported to callers
    pub fn code(&self) -> i32 {
        match self {
            SolverStatus::Solved => 1,
            SolverStatus::SolvedInaccurate => 2,
            SolverStatus::MaxIterations => 3,
            SolverStatus::MaxTime => 4,
            SolverStatus::Unfinished => 0,
            SolverStatus::Unbounded => -1,
            SolverStatus::Infeasible => -2,
            SolverStatus::Indeterminate => -3,
            SolverStatus::Failed => -4,
            SolverStatus::UnboundedInaccurate => -6,
            SolverStatus::InfeasibleInaccurate => -7,
        }
    }

    /// status name reported to callers
    pub fn name(&self) -> &'static str {
        match self {
            SolverStatus::Solved => "solved",
            SolverStatus::SolvedInaccurate => "solved (inaccurate)",
            SolverStatus::MaxIterations => "iteration limit",
            SolverStatus::MaxTime => "time limit",
            SolverStatus::Unfinished => "unfinished",
            SolverStatus::Unbounded => "unbounded",
            SolverStatus::Infeasible => "infeasible",
            SolverStatus::Indeterminate => "indeterminate",
            SolverStatus::Failed => "failed",
            SolverStatus::UnboundedInaccurate => "unbounded (inaccurate)",
            SolverStatus::InfeasibleInaccurate => "infeasible (inaccurate)",
        }
    }

    pub(crate) fn is_infeasible(&self) -> bool {
        matches!(
            *self,
            SolverStatus::Infeasible | SolverStatus::InfeasibleInaccurate
        )
    }

    pub(crate) fn is_unbounded(&self) -> bool {
        matches!(
            *self,
            SolverStatus::Unbounded | SolverStatus::UnboundedInaccurate
        )
    }
}

impl std::fmt::Display for SolverStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[test]
fn test_status_codes() {
    assert_eq!(SolverStatus::default().code(), 0);
    assert_eq!(SolverStatus::MaxIterations.code(), 3);
    assert_eq!(SolverStatus::InfeasibleInaccurate.code(), -7);
    assert_eq!(SolverStatus::Solved.to_string(), "solved");
}

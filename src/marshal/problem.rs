use super::errors::try_copy;
use super::{float_vector, Buffer, ConeSpec, Diagnostic, InterfaceError, SparseMatrixView, Value};
use crate::algebra::CscMatrix;
use crate::solver::ProblemData;

/// A validated problem, still referring to caller memory where possible.
///
/// Built from a data dict with keys `m`, `n`, `Ax`, `Ai`, `Ap`, `b`, `c`
/// and optionally `Px`, `Pi`, `Pp`, together with a cone dict.
#[derive(Debug)]
pub struct ProblemDescriptor<'a> {
    pub a: SparseMatrixView<'a>,
    pub p: Option<SparseMatrixView<'a>>,
    pub b: Buffer<'a, f64>,
    pub c: Buffer<'a, f64>,
    pub cone: ConeSpec<'a>,
}

fn dim_field(data: &Value, key: &str) -> Result<i64, InterfaceError> {
    let v = data.field(key);
    v.as_int()
        .ok_or_else(|| InterfaceError::type_err(key, format!("int, found {}", v.kind_name())))
}

impl<'a> ProblemDescriptor<'a> {
    pub fn parse(
        data: &'a Value<'_>,
        cone: &'a Value<'_>,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<Self, InterfaceError> {
        if data.as_dict().is_none() {
            return Err(InterfaceError::type_err(
                "data",
                format!("a dict, found {}", data.kind_name()),
            ));
        }
        let m = dim_field(data, "m")?;
        let n = dim_field(data, "n")?;

        let a = SparseMatrixView::new(
            "A",
            m,
            n,
            data.field("Ax"),
            data.field("Ai"),
            data.field("Ap"),
        )?;
        let (m, n) = a.shape();

        let p = match (data.get("Px"), data.get("Pi"), data.get("Pp")) {
            (None, None, None) => None,
            (Some(px), Some(pi), Some(pp)) => {
                Some(SparseMatrixView::new("P", n as i64, n as i64, px, pi, pp)?)
            }
            _ => {
                return Err(InterfaceError::shape(
                    "P",
                    "Px, Pi and Pp must be supplied together",
                ))
            }
        };

        let b = float_vector(data.field("b"), "b")?;
        if b.len() != m {
            return Err(InterfaceError::shape(
                "b",
                format!("expected length {} to match A, found {}", m, b.len()),
            ));
        }
        let c = float_vector(data.field("c"), "c")?;
        if c.len() != n {
            return Err(InterfaceError::shape(
                "c",
                format!("expected length {} to match A, found {}", n, c.len()),
            ));
        }

        let cone = ConeSpec::parse(cone, diagnostics)?;
        if cone.total_dim() != m {
            return Err(InterfaceError::shape(
                "cone",
                format!(
                    "cone dimensions sum to {} but A has {} rows",
                    cone.total_dim(),
                    m
                ),
            ));
        }

        Ok(ProblemDescriptor { a, p, b, c, cone })
    }

    pub fn m(&self) -> usize {
        self.a.m
    }

    pub fn n(&self) -> usize {
        self.a.n
    }

    /// Copy into solver owned storage.  `P` is reduced to its upper
    /// triangle.
    pub fn to_problem_data(&self) -> Result<ProblemData, InterfaceError> {
        let n = self.n();
        let P = match &self.p {
            Some(p) => p.to_csc()?.to_triu(),
            None => CscMatrix::spalloc(n, n, 0),
        };
        Ok(ProblemData {
            P,
            A: self.a.to_csc()?,
            b: try_copy(&self.b)?,
            c: try_copy(&self.c)?,
            cones: self.cone.clone().into_owned(),
        })
    }
}

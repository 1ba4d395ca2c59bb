use super::{Array, Buffer, Diagnostic, InterfaceError, Value};

/// Parsed cone description.
///
/// Slack entries are ordered zero, linear, box, second order,
/// semidefinite, primal exponential, dual exponential, power.
#[derive(Debug, Clone)]
pub struct ConeSpec<'a> {
    /// zero cone size (`z`, plus the legacy `f`)
    pub zero: usize,
    /// nonnegative orthant size (`l`)
    pub linear: usize,
    /// box cone lower bounds (`bl`)
    pub box_lower: Buffer<'a, f64>,
    /// box cone upper bounds (`bu`)
    pub box_upper: Buffer<'a, f64>,
    /// second order cone block sizes (`q`)
    pub soc: Buffer<'a, usize>,
    /// semidefinite block sizes (`s`), as matrix side length
    pub psd: Buffer<'a, usize>,
    /// primal exponential cone count (`ep`)
    pub exp_primal: usize,
    /// dual exponential cone count (`ed`)
    pub exp_dual: usize,
    /// power cone parameters (`p`), negative for dual power cones
    pub power: Buffer<'a, f64>,
}

impl Default for ConeSpec<'_> {
    fn default() -> Self {
        ConeSpec {
            zero: 0,
            linear: 0,
            box_lower: Buffer::Owned(vec![]),
            box_upper: Buffer::Owned(vec![]),
            soc: Buffer::Owned(vec![]),
            psd: Buffer::Owned(vec![]),
            exp_primal: 0,
            exp_dual: 0,
            power: Buffer::Owned(vec![]),
        }
    }
}

/// stored length of a `k x k` semidefinite block, `None` on overflow
pub fn psd_triangle_dim(k: usize) -> Option<usize> {
    k.checked_add(1)?.checked_mul(k).map(|v| v / 2)
}

impl<'s> ConeSpec<'s> {
    /// Parse a cone dictionary.  Fields are read in a fixed order and the
    /// first malformed one is reported.  A deprecation notice for the
    /// legacy `f` field is pushed to `diagnostics`.
    pub fn parse(cone: &'s Value<'_>, diagnostics: &mut Vec<Diagnostic>) -> Result<Self, InterfaceError> {
        if cone.as_dict().is_none() {
            return Err(InterfaceError::type_err(
                "cone",
                format!("a dict, found {}", cone.kind_name()),
            ));
        }

        let legacy_f = count_field(cone, "f")?;
        let mut zero = count_field(cone, "z")?;
        if legacy_f > 0 {
            Diagnostic::DeprecatedConeField {
                field: "f",
                merged_into: "z",
                value: legacy_f,
            }
            .emit(diagnostics);
            zero = zero.checked_add(legacy_f).ok_or_else(too_large)?;
        }
        let linear = count_field(cone, "l")?;

        let box_upper = param_field(cone, "bu")?;
        let box_lower = param_field(cone, "bl")?;
        if box_upper.len() != box_lower.len() {
            return Err(InterfaceError::cone(
                "box cone",
                format!(
                    "bu has length {} but bl has length {}",
                    box_upper.len(),
                    box_lower.len()
                ),
            ));
        }

        let soc = size_field(cone, "q")?;
        let psd = size_field(cone, "s")?;

        let power = param_field(cone, "p")?;
        if let Some(p) = power.iter().find(|&&p| !(-1.0..=1.0).contains(&p) || p == 0.0) {
            return Err(InterfaceError::cone(
                "p",
                format!("power cone parameter {p} must be non-zero and lie in [-1, 1]"),
            ));
        }

        let exp_primal = count_field(cone, "ep")?;
        let exp_dual = count_field(cone, "ed")?;

        let spec = ConeSpec {
            zero,
            linear,
            box_lower,
            box_upper,
            soc,
            psd,
            exp_primal,
            exp_dual,
            power,
        };
        spec.checked_total_dim().ok_or_else(too_large)?;
        Ok(spec)
    }

    /// box cone dimension, counting the extra `t` coordinate
    pub fn box_dim(&self) -> usize {
        if self.box_lower.is_empty() {
            0
        } else {
            self.box_lower.len() + 1
        }
    }

    /// total slack dimension described by the cone.  Saturates at
    /// `usize::MAX`, which [`parse`](Self::parse) never produces.
    pub fn total_dim(&self) -> usize {
        self.checked_total_dim().unwrap_or(usize::MAX)
    }

    /// total slack dimension, `None` if it does not fit in a `usize`
    pub fn checked_total_dim(&self) -> Option<usize> {
        let mut dim = self.zero.checked_add(self.linear)?.checked_add(self.box_dim())?;
        for &q in self.soc.iter() {
            dim = dim.checked_add(q)?;
        }
        for &k in self.psd.iter() {
            dim = dim.checked_add(psd_triangle_dim(k)?)?;
        }
        let n3 = self
            .exp_primal
            .checked_add(self.exp_dual)?
            .checked_add(self.power.len())?;
        dim.checked_add(n3.checked_mul(3)?)
    }

    /// Consecutive block lengths for data normalization.  The first entry
    /// covers the zero and linear cones, which may be scaled per row.
    /// Every later block must be scaled uniformly.
    pub fn block_boundaries(&self) -> Vec<usize> {
        let mut out = vec![self.zero + self.linear];
        if self.box_dim() > 0 {
            out.push(self.box_dim());
        }
        out.extend(self.soc.iter().copied());
        out.extend(self.psd.iter().map(|&k| psd_triangle_dim(k).unwrap_or(usize::MAX)));
        let n3 = self.exp_primal + self.exp_dual + self.power.len();
        out.extend(std::iter::repeat(3).take(n3));
        out
    }

    /// Detach from caller memory
    pub fn into_owned(self) -> ConeSpec<'static> {
        ConeSpec {
            zero: self.zero,
            linear: self.linear,
            box_lower: Buffer::Owned(self.box_lower.into_owned()),
            box_upper: Buffer::Owned(self.box_upper.into_owned()),
            soc: Buffer::Owned(self.soc.into_owned()),
            psd: Buffer::Owned(self.psd.into_owned()),
            exp_primal: self.exp_primal,
            exp_dual: self.exp_dual,
            power: Buffer::Owned(self.power.into_owned()),
        }
    }
}

// -------------------------------------
// per-shape field readers
// -------------------------------------

/// The shapes a cone field may take in the caller's dict
enum FieldInput<'s, 'a> {
    Absent,
    Scalar(&'s Value<'a>),
    List(&'s [Value<'a>]),
    Array(&'s Array<'a>),
}

impl<'s, 'a> FieldInput<'s, 'a> {
    fn classify(cone: &'s Value<'a>, field: &str) -> Self {
        match cone.get(field) {
            None => FieldInput::Absent,
            Some(Value::List(items)) => FieldInput::List(items),
            Some(Value::Array(a)) => FieldInput::Array(a),
            Some(v) => FieldInput::Scalar(v),
        }
    }
}

fn too_large() -> InterfaceError {
    InterfaceError::cone("cone", "total cone dimension overflows the index type")
}

fn nonneg_int(v: &Value, field: &str) -> Result<usize, InterfaceError> {
    let i = v.as_int().ok_or_else(|| {
        InterfaceError::cone(field, format!("expected an integer, found {}", v.kind_name()))
    })?;
    usize::try_from(i).map_err(|_| InterfaceError::cone(field, format!("negative size {i}")))
}

fn float_param(v: &Value, field: &str) -> Result<f64, InterfaceError> {
    v.as_float().ok_or_else(|| {
        InterfaceError::cone(field, format!("expected a number, found {}", v.kind_name()))
    })
}

/// scalar count fields: `f`, `z`, `l`, `ep`, `ed`
fn count_field(cone: &Value, field: &str) -> Result<usize, InterfaceError> {
    match FieldInput::classify(cone, field) {
        FieldInput::Absent => Ok(0),
        FieldInput::Scalar(v) => nonneg_int(v, field),
        _ => Err(InterfaceError::cone(field, "expected a scalar integer count")),
    }
}

/// block size fields: `q`, `s`
fn size_field<'s>(cone: &'s Value, field: &str) -> Result<Buffer<'s, usize>, InterfaceError> {
    match FieldInput::classify(cone, field) {
        FieldInput::Absent => Ok(Buffer::Owned(vec![])),
        FieldInput::Scalar(v) => Ok(Buffer::Owned(vec![nonneg_int(v, field)?])),
        FieldInput::List(items) => items
            .iter()
            .map(|v| nonneg_int(v, field))
            .collect::<Result<Vec<_>, _>>()
            .map(Buffer::Owned),
        FieldInput::Array(a) => {
            if !a.kind().is_integer() {
                return Err(InterfaceError::cone(field, "expected an integer array"));
            }
            a.as_index(field)
                .map_err(|e| InterfaceError::cone(field, e.to_string()))
        }
    }
}

/// float parameter fields: `bu`, `bl`, `p`
fn param_field<'s>(cone: &'s Value, field: &str) -> Result<Buffer<'s, f64>, InterfaceError> {
    match FieldInput::classify(cone, field) {
        FieldInput::Absent => Ok(Buffer::Owned(vec![])),
        FieldInput::Scalar(v) => Ok(Buffer::Owned(vec![float_param(v, field)?])),
        FieldInput::List(items) => items
            .iter()
            .map(|v| float_param(v, field))
            .collect::<Result<Vec<_>, _>>()
            .map(Buffer::Owned),
        FieldInput::Array(a) => a
            .as_f64(field)
            .map_err(|e| InterfaceError::cone(field, e.to_string())),
    }
}

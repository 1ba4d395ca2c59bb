use super::errors::try_zeros;
use super::{float_vector, Diagnostic, InterfaceError, Value, WarmStartError};

/// Initial primal, dual and slack vectors for a solve.
///
/// Each vector is zero-initialized and then overwritten by the caller's
/// vector if one was supplied and has the right shape.  A supplied vector
/// that does not fit leaves its buffer at zero and is reported as a
/// [`Diagnostic::WarmStart`].
#[derive(Debug, Clone)]
pub struct WarmStartStore {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub s: Vec<f64>,
    supplied: [bool; 3],
}

impl WarmStartStore {
    /// Read warm start vectors from a dict with optional keys `x`, `y`
    /// and `s`.  `Value::None` supplies nothing.
    pub fn load(
        warm: &Value,
        n: usize,
        m: usize,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<Self, InterfaceError> {
        if !(warm.is_none() || warm.as_dict().is_some()) {
            return Err(InterfaceError::type_err(
                "warm_start",
                format!("a dict, found {}", warm.kind_name()),
            ));
        }
        let (x, sx) = load_vector(warm.get("x"), "x", n, diagnostics)?;
        let (y, sy) = load_vector(warm.get("y"), "y", m, diagnostics)?;
        let (s, ss) = load_vector(warm.get("s"), "s", m, diagnostics)?;
        Ok(WarmStartStore {
            x,
            y,
            s,
            supplied: [sx, sy, ss],
        })
    }

    /// Build from individually supplied vectors.
    pub fn from_parts(
        x: Option<&Value>,
        y: Option<&Value>,
        s: Option<&Value>,
        n: usize,
        m: usize,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<Self, InterfaceError> {
        let (x, sx) = load_vector(nonempty(x), "x", n, diagnostics)?;
        let (y, sy) = load_vector(nonempty(y), "y", m, diagnostics)?;
        let (s, ss) = load_vector(nonempty(s), "s", m, diagnostics)?;
        Ok(WarmStartStore {
            x,
            y,
            s,
            supplied: [sx, sy, ss],
        })
    }

    /// True if the caller supplied the named vector, whether or not
    /// it was usable.
    pub fn was_supplied(&self, name: &str) -> bool {
        match name {
            "x" => self.supplied[0],
            "y" => self.supplied[1],
            "s" => self.supplied[2],
            _ => false,
        }
    }
}

// an explicit None counts as not supplied
fn nonempty<'v, 'a>(v: Option<&'v Value<'a>>) -> Option<&'v Value<'a>> {
    v.filter(|v| !v.is_none())
}

fn check_vector(v: &Value, name: &'static str, len: usize) -> Result<Vec<f64>, WarmStartError> {
    let buf = float_vector(v, name).map_err(|e| WarmStartError {
        name,
        reason: e.to_string(),
    })?;
    if buf.len() != len {
        return Err(WarmStartError {
            name,
            reason: format!("expected length {}, found {}", len, buf.len()),
        });
    }
    Ok(buf.into_owned())
}

fn load_vector(
    supplied: Option<&Value>,
    name: &'static str,
    len: usize,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<(Vec<f64>, bool), InterfaceError> {
    let mut out = try_zeros(len)?;
    let Some(v) = supplied else {
        return Ok((out, false));
    };
    match check_vector(v, name, len) {
        Ok(values) => out.copy_from_slice(&values),
        Err(e) => Diagnostic::WarmStart(e).emit(diagnostics),
    }
    Ok((out, true))
}

use super::{Buffer, InterfaceError};
use std::collections::BTreeMap;

/// Element type of an [`Array`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    F64,
    F32,
    I64,
    I32,
    Usize,
}

impl ElementKind {
    pub fn is_float(&self) -> bool {
        matches!(self, ElementKind::F64 | ElementKind::F32)
    }
    pub fn is_integer(&self) -> bool {
        !self.is_float()
    }
}

/// Typed storage behind an [`Array`]
#[derive(Debug, Clone)]
pub enum ArrayData<'a> {
    F64(Buffer<'a, f64>),
    F32(Buffer<'a, f32>),
    I64(Buffer<'a, i64>),
    I32(Buffer<'a, i32>),
    Usize(Buffer<'a, usize>),
}

impl ArrayData<'_> {
    fn raw_len(&self) -> usize {
        match self {
            ArrayData::F64(b) => b.len(),
            ArrayData::F32(b) => b.len(),
            ArrayData::I64(b) => b.len(),
            ArrayData::I32(b) => b.len(),
            ArrayData::Usize(b) => b.len(),
        }
    }
}

/// An n-dimensional numeric array, as handed over by a caller.
///
/// Elements are read at offsets `0, stride, 2*stride, ...` of the
/// underlying data, so a column of a row-major matrix or a reversed
/// view can be passed without copying.
#[derive(Debug, Clone)]
pub struct Array<'a> {
    data: ArrayData<'a>,
    shape: Vec<usize>,
    stride: usize,
}

macro_rules! array_constructors {
    ($($ty:ty => $variant:ident),+) => {
        $(
            impl<'a> From<&'a [$ty]> for Array<'a> {
                fn from(s: &'a [$ty]) -> Self {
                    Array::contiguous(ArrayData::$variant(Buffer::Borrowed(s)))
                }
            }
            impl From<Vec<$ty>> for Array<'static> {
                fn from(v: Vec<$ty>) -> Self {
                    Array::contiguous(ArrayData::$variant(Buffer::Owned(v)))
                }
            }
        )+
    };
}
array_constructors!(f64 => F64, f32 => F32, i64 => I64, i32 => I32, usize => Usize);

impl<'a> Array<'a> {
    fn contiguous(data: ArrayData<'a>) -> Self {
        let len = data.raw_len();
        Array {
            data,
            shape: vec![len],
            stride: 1,
        }
    }

    /// Build an array with an explicit shape and element stride.  Fails
    /// if the data is too short to hold every addressed element.
    pub fn with_layout(
        data: ArrayData<'a>,
        shape: Vec<usize>,
        stride: usize,
    ) -> Result<Self, InterfaceError> {
        let len: usize = shape.iter().product();
        let needed = if len == 0 {
            0
        } else {
            (len - 1).saturating_mul(stride).saturating_add(1)
        };
        if stride == 0 || needed > data.raw_len() {
            return Err(InterfaceError::shape(
                "array",
                format!(
                    "shape {:?} with stride {} exceeds {} stored elements",
                    shape,
                    stride,
                    data.raw_len()
                ),
            ));
        }
        Ok(Array {
            data,
            shape,
            stride,
        })
    }

    pub fn kind(&self) -> ElementKind {
        match self.data {
            ArrayData::F64(_) => ElementKind::F64,
            ArrayData::F32(_) => ElementKind::F32,
            ArrayData::I64(_) => ElementKind::I64,
            ArrayData::I32(_) => ElementKind::I32,
            ArrayData::Usize(_) => ElementKind::Usize,
        }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// number of addressed elements
    pub fn len(&self) -> usize {
        self.shape.iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_contiguous(&self) -> bool {
        self.stride == 1
    }

    pub fn data(&self) -> &ArrayData<'a> {
        &self.data
    }

    fn require_1d(&self, name: &str) -> Result<(), InterfaceError> {
        if self.ndim() != 1 {
            return Err(InterfaceError::shape(
                name,
                format!("expected a one-dimensional array, found {} dimensions", self.ndim()),
            ));
        }
        Ok(())
    }

    /// View as a one-dimensional `f64` buffer, aliasing the storage when it
    /// is contiguous `f64` and converting otherwise.
    pub fn as_f64(&self, name: &str) -> Result<Buffer<'_, f64>, InterfaceError> {
        self.require_1d(name)?;
        let (len, stride) = (self.len(), self.stride);

        let out = match &self.data {
            ArrayData::F64(b) if stride == 1 => Buffer::Borrowed(&b[..len]),
            ArrayData::F64(b) => Buffer::Owned(gather(b.as_slice(), len, stride, |&x| x)),
            ArrayData::F32(b) => Buffer::Owned(gather(b.as_slice(), len, stride, |&x| x as f64)),
            _ => return Err(InterfaceError::type_err(name, "floating point elements")),
        };
        Ok(out)
    }

    /// View as a one-dimensional index buffer.  Contiguous `usize` data is
    /// aliased.  Signed data is converted, and a negative entry is a
    /// shape error since it can never address a valid row or column.
    pub fn as_index(&self, name: &str) -> Result<Buffer<'_, usize>, InterfaceError> {
        self.require_1d(name)?;
        let (len, stride) = (self.len(), self.stride);

        let out = match &self.data {
            ArrayData::Usize(b) if stride == 1 => Buffer::Borrowed(&b[..len]),
            ArrayData::Usize(b) => Buffer::Owned(gather(b.as_slice(), len, stride, |&x| x)),
            ArrayData::I64(b) => Buffer::Owned(convert_signed(name, b.as_slice(), len, stride)?),
            ArrayData::I32(b) => Buffer::Owned(convert_signed(name, b.as_slice(), len, stride)?),
            _ => return Err(InterfaceError::type_err(name, "integer elements")),
        };
        Ok(out)
    }
}

fn gather<S, T>(src: &[S], len: usize, stride: usize, f: impl Fn(&S) -> T) -> Vec<T> {
    src.iter().step_by(stride).take(len).map(f).collect()
}

fn convert_signed<S>(
    name: &str,
    src: &[S],
    len: usize,
    stride: usize,
) -> Result<Vec<usize>, InterfaceError>
where
    S: Copy + TryInto<usize> + std::fmt::Display,
{
    src.iter()
        .step_by(stride)
        .take(len)
        .map(|&x| {
            x.try_into()
                .map_err(|_| InterfaceError::shape(name, format!("negative index {x}")))
        })
        .collect()
}

static NONE: Value<'static> = Value::None;

/// Dynamically typed caller data.
///
/// This is the common currency of the marshaling layer: problem data,
/// cone dictionaries, settings and warm starts all arrive as `Value`s and
/// results are returned as a `Value::Dict`.
#[derive(Debug, Clone, Default)]
pub enum Value<'a> {
    #[default]
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value<'a>>),
    Dict(BTreeMap<String, Value<'a>>),
    Array(Array<'a>),
}

impl<'a> Value<'a> {
    /// Build a dictionary from key/value pairs
    pub fn dict<K, I>(items: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value<'a>)>,
    {
        Value::Dict(items.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// short description of the variant, used in error messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::None => "None",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::Dict(_) => "dict",
            Value::Array(_) => "array",
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    pub fn as_dict(&self) -> Option<&BTreeMap<String, Value<'a>>> {
        match self {
            Value::Dict(d) => Some(d),
            _ => None,
        }
    }

    /// Dictionary lookup.  A key that maps to `None` counts as absent.
    pub fn get(&self, key: &str) -> Option<&Value<'a>> {
        self.as_dict()?.get(key).filter(|v| !v.is_none())
    }

    /// Dictionary lookup returning `Value::None` for absent keys.
    pub fn field(&self, key: &str) -> &Value<'a> {
        self.get(key).unwrap_or(&NONE)
    }

    pub fn as_array(&self) -> Option<&Array<'a>> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Integral scalar.  Booleans are not accepted.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric scalar, accepting both ints and floats.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

/// Read a dense float vector from an array or a list of numbers.
pub fn float_vector<'s>(value: &'s Value, name: &str) -> Result<Buffer<'s, f64>, InterfaceError> {
    match value {
        Value::Array(a) => a.as_f64(name),
        Value::List(items) => items
            .iter()
            .map(|v| match v {
                Value::List(_) | Value::Array(_) => Err(InterfaceError::shape(
                    name,
                    "expected a one-dimensional sequence",
                )),
                _ => v
                    .as_float()
                    .ok_or_else(|| InterfaceError::type_err(name, "numeric elements")),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Buffer::Owned),
        _ => Err(InterfaceError::type_err(
            name,
            format!("a float array or list, found {}", value.kind_name()),
        )),
    }
}

/// Read a dense index vector from an array or a list of integers.
pub fn index_vector<'s>(value: &'s Value, name: &str) -> Result<Buffer<'s, usize>, InterfaceError> {
    match value {
        Value::Array(a) => a.as_index(name),
        Value::List(items) => items
            .iter()
            .map(|v| match v {
                Value::Int(i) => usize::try_from(*i)
                    .map_err(|_| InterfaceError::shape(name, format!("negative index {i}"))),
                Value::List(_) | Value::Array(_) => Err(InterfaceError::shape(
                    name,
                    "expected a one-dimensional sequence",
                )),
                _ => Err(InterfaceError::type_err(name, "integer elements")),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Buffer::Owned),
        _ => Err(InterfaceError::type_err(
            name,
            format!("an integer array or list, found {}", value.kind_name()),
        )),
    }
}

impl From<bool> for Value<'_> {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}
impl From<i64> for Value<'_> {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}
impl From<i32> for Value<'_> {
    fn from(i: i32) -> Self {
        Value::Int(i as i64)
    }
}
impl From<f64> for Value<'_> {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}
impl From<&str> for Value<'_> {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}
impl From<String> for Value<'_> {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}
impl<'a> From<Array<'a>> for Value<'a> {
    fn from(a: Array<'a>) -> Self {
        Value::Array(a)
    }
}
impl<'a> From<Vec<Value<'a>>> for Value<'a> {
    fn from(v: Vec<Value<'a>>) -> Self {
        Value::List(v)
    }
}
impl<'a> From<&'a [f64]> for Value<'a> {
    fn from(s: &'a [f64]) -> Self {
        Value::Array(Array::from(s))
    }
}
impl From<Vec<f64>> for Value<'static> {
    fn from(v: Vec<f64>) -> Self {
        Value::Array(Array::from(v))
    }
}
impl<'a> From<&'a [usize]> for Value<'a> {
    fn from(s: &'a [usize]) -> Self {
        Value::Array(Array::from(s))
    }
}
impl From<Vec<usize>> for Value<'static> {
    fn from(v: Vec<usize>) -> Self {
        Value::Array(Array::from(v))
    }
}
impl<'a, T: Into<Value<'a>>> From<Option<T>> for Value<'a> {
    fn from(o: Option<T>) -> Self {
        o.map_or(Value::None, Into::into)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::marshal::Ownership;

    #[test]
    fn test_f64_alias_and_convert() {
        let data = vec![1.0, 2.0, 3.0];
        let a = Array::from(&data[..]);
        let buf = a.as_f64("b").unwrap();
        assert_eq!(buf.ownership(), Ownership::Borrowed);
        assert_eq!(buf.as_ptr(), data.as_ptr());

        let a32 = Array::from(vec![1.0f32, 2.5]);
        let buf = a32.as_f64("b").unwrap();
        assert_eq!(buf.ownership(), Ownership::Owned);
        assert_eq!(&*buf, &[1.0, 2.5]);

        let ints = Array::from(vec![1i64, 2]);
        assert!(matches!(ints.as_f64("b"), Err(InterfaceError::Type { .. })));
    }

    #[test]
    fn test_strided_gather() {
        let data = [1.0, -1.0, 2.0, -1.0, 3.0];
        let a = Array::with_layout(ArrayData::F64(Buffer::Borrowed(&data)), vec![3], 2).unwrap();
        assert!(!a.is_contiguous());
        let buf = a.as_f64("x").unwrap();
        assert_eq!(buf.ownership(), Ownership::Owned);
        assert_eq!(&*buf, &[1.0, 2.0, 3.0]);

        let too_long = Array::with_layout(ArrayData::F64(Buffer::Borrowed(&data)), vec![4], 2);
        assert!(matches!(too_long, Err(InterfaceError::Shape { .. })));
    }

    #[test]
    fn test_index_conversion() {
        let a = Array::from(vec![0i32, 2, 5]);
        assert_eq!(&*a.as_index("Ai").unwrap(), &[0, 2, 5]);

        let neg = Array::from(vec![0i64, -1]);
        assert!(matches!(neg.as_index("Ai"), Err(InterfaceError::Shape { .. })));

        let floats = Array::from(vec![0.0]);
        assert!(matches!(floats.as_index("Ai"), Err(InterfaceError::Type { .. })));

        let two_d = Array::with_layout(ArrayData::Usize(Buffer::Owned(vec![0; 4])), vec![2, 2], 1)
            .unwrap();
        assert!(matches!(two_d.as_index("Ai"), Err(InterfaceError::Shape { .. })));
    }

    #[test]
    fn test_lists() {
        let v = Value::List(vec![1.into(), 2.5.into()]);
        assert_eq!(&*float_vector(&v, "c").unwrap(), &[1.0, 2.5]);

        let bad = Value::List(vec![true.into()]);
        assert!(matches!(float_vector(&bad, "c"), Err(InterfaceError::Type { .. })));

        let nested = Value::List(vec![Value::List(vec![])]);
        assert!(matches!(float_vector(&nested, "c"), Err(InterfaceError::Shape { .. })));

        let idx = Value::List(vec![0.into(), 3.into()]);
        assert_eq!(&*index_vector(&idx, "Ap").unwrap(), &[0, 3]);
    }

    #[test]
    fn test_dict_get_skips_none() {
        let d = Value::dict([("a", Value::Int(1)), ("b", Value::None)]);
        assert_eq!(d.get("a").and_then(Value::as_int), Some(1));
        assert!(d.get("b").is_none());
        assert!(d.get("c").is_none());
    }
}

use std::ops::Deref;

/// Whether a [`Buffer`] aliases caller memory or owns a converted copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    Borrowed,
    Owned,
}

/// A contiguous slice of caller data, tagged with its ownership.
///
/// Borrowed buffers alias the caller's memory for the lifetime `'a`;
/// owned buffers hold a copy produced by type conversion or gathering
/// from a strided source.  Either way the single release path is `Drop`.
#[derive(Debug, Clone)]
pub enum Buffer<'a, T> {
    Borrowed(&'a [T]),
    Owned(Vec<T>),
}

impl<'a, T> Buffer<'a, T> {
    pub fn ownership(&self) -> Ownership {
        match self {
            Buffer::Borrowed(_) => Ownership::Borrowed,
            Buffer::Owned(_) => Ownership::Owned,
        }
    }

    pub fn as_slice(&self) -> &[T] {
        match self {
            Buffer::Borrowed(s) => s,
            Buffer::Owned(v) => v,
        }
    }
}

impl<'a, T: Clone> Buffer<'a, T> {
    /// Detach from caller memory, copying if currently borrowed.
    pub fn into_owned(self) -> Vec<T> {
        match self {
            Buffer::Borrowed(s) => s.to_vec(),
            Buffer::Owned(v) => v,
        }
    }
}

impl<'a, T> Deref for Buffer<'a, T> {
    type Target = [T];
    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<'a, T> From<&'a [T]> for Buffer<'a, T> {
    fn from(s: &'a [T]) -> Self {
        Buffer::Borrowed(s)
    }
}

impl<T> From<Vec<T>> for Buffer<'static, T> {
    fn from(v: Vec<T>) -> Self {
        Buffer::Owned(v)
    }
}

#[test]
fn test_buffer_ownership() {
    let data = vec![1.0, 2.0];
    let b: Buffer<f64> = Buffer::from(&data[..]);
    assert_eq!(b.ownership(), Ownership::Borrowed);
    assert_eq!(b.len(), 2);
    let v = b.into_owned();
    assert_eq!(v, data);

    let o: Buffer<f64> = Buffer::from(vec![3.0]);
    assert_eq!(o.ownership(), Ownership::Owned);
    assert_eq!(&*o, &[3.0]);
}

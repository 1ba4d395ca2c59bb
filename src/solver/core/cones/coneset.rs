use super::*;
use crate::marshal::ConeSpec;
use std::ops::Range;

// -------------------------------------
// collection of cones for a problem
// -------------------------------------

/// The product cone for a problem, with the slack range of each block.
pub struct ConeSet<T: FloatT = f64> {
    cones: Vec<SupportedCone<T>>,
    rng_cones: Vec<Range<usize>>,
    numel: usize,
}

impl ConeSet<f64> {
    /// Build the cones in slack order: zero, linear, box, second order,
    /// semidefinite, primal exponential, dual exponential, power.
    pub fn from_spec(spec: &ConeSpec) -> Self {
        let mut cones: Vec<SupportedCone<f64>> = Vec::new();

        if spec.zero > 0 {
            cones.push(ZeroCone::new(spec.zero).into());
        }
        if spec.linear > 0 {
            cones.push(NonnegativeCone::new(spec.linear).into());
        }
        if spec.box_dim() > 0 {
            cones.push(BoxCone::new(spec.box_lower.to_vec(), spec.box_upper.to_vec()).into());
        }
        for &q in spec.soc.iter().filter(|&&q| q > 0) {
            cones.push(SecondOrderCone::new(q).into());
        }
        for &k in spec.psd.iter().filter(|&&k| k > 0) {
            cones.push(PsdTriangleCone::new(k).into());
        }
        for _ in 0..spec.exp_primal {
            cones.push(ExponentialCone::new(PrimalOrDualCone::PrimalCone).into());
        }
        for _ in 0..spec.exp_dual {
            cones.push(ExponentialCone::new(PrimalOrDualCone::DualCone).into());
        }
        for &p in spec.power.iter() {
            cones.push(PowerCone::new(p).into());
        }

        Self::new(cones)
    }
}

impl<T> ConeSet<T>
where
    T: FloatT,
{
    pub fn new(cones: Vec<SupportedCone<T>>) -> Self {
        let mut rng_cones = Vec::with_capacity(cones.len());
        let mut start = 0;
        for cone in cones.iter() {
            let stop = start + cone.numel();
            rng_cones.push(start..stop);
            start = stop;
        }
        Self {
            cones,
            rng_cones,
            numel: start,
        }
    }

    pub fn numel(&self) -> usize {
        self.numel
    }

    pub fn len(&self) -> usize {
        self.cones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cones.is_empty()
    }

    /// Project each block of `s` onto its cone
    pub fn project(&mut self, s: &mut [T]) {
        assert_eq!(s.len(), self.numel);
        for (cone, rng) in self.cones.iter_mut().zip(self.rng_cones.iter()) {
            cone.project(&mut s[rng.clone()]);
        }
    }

    /// Slack ranges of the blocks that must be scaled uniformly
    pub fn nonseparable_ranges(&self) -> impl Iterator<Item = &Range<usize>> {
        self.cones
            .iter()
            .zip(self.rng_cones.iter())
            .filter(|(c, _)| !c.is_separable())
            .map(|(_, r)| r)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::marshal::Value;

    #[test]
    fn test_coneset_from_spec() {
        let cone = Value::dict([
            ("z", 1.into()),
            ("l", 2.into()),
            ("q", Value::List(vec![3.into(), 0.into()])),
            ("ep", 1.into()),
            ("p", Value::List(vec![(-0.5).into()])),
        ]);
        let mut diags = vec![];
        let spec = ConeSpec::parse(&cone, &mut diags).unwrap();
        let mut K = ConeSet::from_spec(&spec);

        assert_eq!(K.numel(), spec.total_dim());
        assert_eq!(K.len(), 5);
        assert_eq!(K.nonseparable_ranges().count(), 3);

        let mut s = vec![1., -1., 2., 0., 3., 4., 0., 1., 2., 1., 1., 0.];
        K.project(&mut s);
        assert_eq!(s[0], 0.);
        assert_eq!(&s[1..3], &[0., 2.]);
        assert!((s[3] - 2.5).abs() < 1e-12);
    }
}

use crate::ConicError as Error;
use crate::dd::zero::ZeroSet;

/// Illegal supports: a ray whose support covers any listed coordinate set is dropped.
///
/// Supports only grow under the non-negative combinations the engine forms, so a dropped ray
/// can never be an ancestor of a legal one.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SupportFilter {
    illegal: Vec<ZeroSet>,
    max_coordinate: Option<usize>,
}

impl SupportFilter {
    /// Each inner list is a set of coordinates that may not all be non-zero at once.
    pub fn new<I, S>(illegal: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = S>,
        S: IntoIterator<Item = usize>,
    {
        let mut sets = Vec::new();
        let mut max_coordinate: Option<usize> = None;
        for (index, coords) in illegal.into_iter().enumerate() {
            let set: ZeroSet = coords.into_iter().collect();
            if set.is_empty() {
                return Err(Error::InvalidArgument(format!(
                    "illegal support {index} is empty and would reject every ray"
                )));
            }
            if let Some(top) = set.iter().last() {
                max_coordinate = Some(max_coordinate.map_or(top, |m| m.max(top)));
            }
            sets.push(set);
        }
        Ok(Self {
            illegal: sets,
            max_coordinate,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.illegal.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.illegal.is_empty()
    }

    pub(crate) fn check_dimension(&self, dimension: usize) -> Result<(), Error> {
        match self.max_coordinate {
            Some(top) if top >= dimension => Err(Error::InvalidArgument(format!(
                "illegal support names coordinate {top} but the cone has dimension {dimension}"
            ))),
            _ => Ok(()),
        }
    }

    /// `true` when a ray with this zero-set keeps at least one coordinate of every illegal
    /// set at zero.
    #[inline]
    pub fn allows(&self, zero_set: &ZeroSet) -> bool {
        self.illegal.iter().all(|set| !set.is_disjoint(zero_set))
    }
}

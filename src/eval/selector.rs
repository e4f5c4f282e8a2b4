use crate::eval::distributor::BucketDistributor;
use crate::model::flag::{Flag, Version};
use crate::user::UserContext;
use std::sync::Arc;

/// Picks the [`Version`] of a flag a user context falls into.
///
/// Versions split the bucket range in declaration order: with percentages
/// `[70, 20, 10]` the first version owns buckets 1-70, the second 71-90 and the
/// third 91-100. Buckets past the cumulative sum select nothing.
pub struct VersionSelector {
    distributor: Arc<dyn BucketDistributor>,
}

impl VersionSelector {
    /// Creates a new [`VersionSelector`] bucketing with `distributor`.
    pub fn new(distributor: Arc<dyn BucketDistributor>) -> Self {
        Self { distributor }
    }

    /// Returns the version selected for `ctx`, or [`None`] when the bucket lies past
    /// every version boundary (callers fall back to [`crate::DEFAULT_VERSION`]).
    pub fn select(&self, flag: &Flag, ctx: &UserContext) -> Option<Version> {
        let value = ctx.attribute(&flag.distribution_attribute);
        let bucket = self.distributor.distribute(&flag.name, value);

        let mut previous: u32 = 0;
        for version in flag.versions.iter() {
            let upper = previous.saturating_add(version.distribution_percentage);
            if bucket <= upper {
                return Some(version.clone());
            }
            previous = upper;
        }
        None
    }
}

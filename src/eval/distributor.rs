use crate::utils::murmur3_32;
use crate::value::AttributeValue;

/// Maps a flag and an attribute value to a bucket in `1..=100`.
///
/// Implementations must be deterministic: the same inputs always land in the same
/// bucket, otherwise callers would flip in and out of a rollout between requests.
pub trait BucketDistributor: Sync + Send {
    /// Returns the bucket of `value` for the flag named `flag_name`.
    fn distribute(&self, flag_name: &str, value: Option<&AttributeValue>) -> u32;
}

/// The default [`BucketDistributor`], based on 32-bit MurmurHash3.
///
/// Hashes `"{flag_name}:{value}"` (an absent value hashes as the empty string)
/// and reduces the hash to `hash % 100 + 1`.
///
/// # Examples
///
/// ```rust
/// use featurit::{AttributeValue, BucketDistributor, MurmurBucketDistributor};
///
/// let distributor = MurmurBucketDistributor::new();
/// let bucket = distributor.distribute("Feat", Some(&AttributeValue::from("1234")));
///
/// assert!((1..=100).contains(&bucket));
/// assert_eq!(bucket, distributor.distribute("Feat", Some(&AttributeValue::from("1234"))));
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct MurmurBucketDistributor {}

impl MurmurBucketDistributor {
    /// Creates a new [`MurmurBucketDistributor`].
    pub fn new() -> Self {
        Self {}
    }
}

impl BucketDistributor for MurmurBucketDistributor {
    fn distribute(&self, flag_name: &str, value: Option<&AttributeValue>) -> u32 {
        let key = match value {
            Some(val) => format!("{flag_name}:{val}"),
            None => format!("{flag_name}:"),
        };
        murmur3_32(key.as_bytes(), 0) % 100 + 1
    }
}

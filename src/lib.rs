//! FeaturIT SDK for Rust.

#![warn(missing_docs)]

#[macro_use]
mod macros;
mod analytics;
mod builder;
mod cache;
mod client;
mod constants;
mod errors;
mod eval;
mod fetch;
mod model;
mod modes;
mod options;
mod user;
mod utils;
mod value;

pub use cache::{disk::DiskCache, memory::InMemoryCache, CacheEntry, FlagCache};
pub use client::Client;
pub use constants::{
    ANALYTICS_KEY, BACKUP_KEY, DEFAULT_VERSION, FEATURE_FLAGS_KEY, PKG_VERSION,
};
pub use errors::{ClientError, ErrorKind};

pub use eval::distributor::{BucketDistributor, MurmurBucketDistributor};
pub use eval::evaluator::{eval_number, eval_string};
pub use eval::segmentation::SegmentationService;
pub use eval::selector::VersionSelector;

pub use model::enums::{NumberOperator, StringOperator};
pub use model::flag::{Flag, FlagCatalogue, NumberRule, Segment, StringRule, Version};

pub use builder::ClientBuilder;
pub use modes::PollingMode;

pub use user::{UserContext, UserContextProvider, IP_ADDRESS, SESSION_ID, USER_ID};
pub use value::AttributeValue;

use crate::model::enums::{NumberOperator, StringOperator};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Flags keyed by name, either as fetched or after resolution.
pub type FlagCatalogue = HashMap<String, Flag>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("JSON parsing failed. ({0})")]
    Parse(String),
    #[error("JSON serialization failed. ({0})")]
    Serialize(String),
}

/// Describes a feature flag.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Flag {
    /// Unique name of the flag.
    pub name: String,
    /// Base state. An inactive flag stays inactive whatever its segments say.
    pub active: bool,
    /// The user context attribute that places callers into versions.
    #[serde(default)]
    pub distribution_attribute: String,
    /// The list of segments (where there is a logical OR relation between the items).
    #[serde(default)]
    pub segments: Vec<Segment>,
    /// The list of versions, splitting the 1-100 bucket range in declaration order.
    #[serde(default)]
    pub versions: Vec<Version>,
    /// The version picked for the current user context. Only set on resolved flags.
    #[serde(default)]
    pub selected_version: Option<Version>,
}

/// Describes a segment of the user base a flag is rolled out to.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Segment {
    /// The user context attribute that feeds the rollout bucket.
    pub rollout_attribute: String,
    /// Share of buckets (0-100, inclusive) that pass the rollout gate.
    pub rollout_percentage: u32,
    /// Text rules; all of them must pass.
    #[serde(default)]
    pub string_rules: Vec<StringRule>,
    /// Numeric rules; all of them must pass.
    #[serde(default)]
    pub number_rules: Vec<NumberRule>,
}

/// Describes a rule comparing a user context attribute to a text value.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StringRule {
    /// The user context attribute the rule reads.
    pub attribute: String,
    /// The comparison applied between the attribute and `value`.
    pub operator: StringOperator,
    /// The comparison value.
    pub value: String,
}

/// Describes a rule comparing a user context attribute to a numeric value.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NumberRule {
    /// The user context attribute the rule reads.
    pub attribute: String,
    /// The comparison applied between the attribute and `value`.
    pub operator: NumberOperator,
    /// The comparison value.
    pub value: f64,
}

/// Describes a variant of a flag.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Version {
    /// Name reported by [`crate::Client::version`].
    pub name: String,
    /// Width of the bucket range (0-100) this version owns.
    pub distribution_percentage: u32,
}

#[derive(Deserialize)]
struct ApiResponse {
    data: FlagCatalogue,
}

pub fn catalogue_from_response(body: &str) -> Result<FlagCatalogue, Error> {
    match serde_json::from_str::<ApiResponse>(body) {
        Ok(response) => Ok(response.data),
        Err(err) => Err(Error::Parse(err.to_string())),
    }
}

pub fn catalogue_from_json(json: &str) -> Result<FlagCatalogue, Error> {
    serde_json::from_str::<FlagCatalogue>(json).map_err(|err| Error::Parse(err.to_string()))
}

pub fn catalogue_to_json(catalogue: &FlagCatalogue) -> Result<String, Error> {
    serde_json::to_string(catalogue).map_err(|err| Error::Serialize(err.to_string()))
}

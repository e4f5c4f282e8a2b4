use crate::model::enums::NumberOperator::{self, *};
use crate::model::enums::StringOperator::{self, *};
use crate::model::flag::{NumberRule, StringRule};
use crate::user::UserContext;
use log::{log_enabled, trace};

/// Compares a text attribute to a text comparison value.
///
/// An absent attribute is passed as the empty string. `CONTAINS`, `STARTS_WITH`
/// and `ENDS_WITH` never match an empty attribute, `IS_CONTAINED_IN` never matches
/// an empty comparison value. Unknown operators never match.
///
/// # Examples
///
/// ```rust
/// use featurit::{eval_string, StringOperator};
///
/// assert!(eval_string("info@featurit.com", &StringOperator::EndsWith, "@featurit.com"));
/// assert!(!eval_string("", &StringOperator::StartsWith, ""));
/// ```
pub fn eval_string(left: &str, operator: &StringOperator, right: &str) -> bool {
    match operator {
        Equals => left == right,
        NotEquals => left != right,
        Contains => !left.is_empty() && left.contains(right),
        IsContainedIn => !right.is_empty() && right.contains(left),
        StartsWith => !left.is_empty() && left.starts_with(right),
        EndsWith => !left.is_empty() && left.ends_with(right),
        StringOperator::Unknown(_) => false,
    }
}

/// Compares a numeric attribute to a numeric comparison value.
///
/// An absent attribute fails every operator except `NOT_EQUAL`. Unknown
/// operators never match.
///
/// # Examples
///
/// ```rust
/// use featurit::{eval_number, NumberOperator};
///
/// assert!(eval_number(Some(-2.0), &NumberOperator::GreaterThan, -3.0));
/// assert!(eval_number(None, &NumberOperator::NotEqual, 5.0));
/// ```
pub fn eval_number(left: Option<f64>, operator: &NumberOperator, right: f64) -> bool {
    let left = match left {
        Some(left) => left,
        None => return *operator == NotEqual,
    };
    match operator {
        LessThan => left < right,
        LessEqualThan => left <= right,
        Equal => left == right,
        NotEqual => left != right,
        GreaterEqualThan => left >= right,
        GreaterThan => left > right,
        NumberOperator::Unknown(_) => false,
    }
}

pub(crate) fn eval_string_rule(rule: &StringRule, ctx: &UserContext) -> bool {
    let attr = ctx.attribute(&rule.attribute).map(|v| v.to_string());
    let left = attr.as_deref().unwrap_or_default();
    let matched = eval_string(left, &rule.operator, &rule.value);
    if log_enabled!(log::Level::Trace) {
        trace!("{} {} '{}' ({left}) => {matched}", rule.attribute, rule.operator, rule.value);
    }
    matched
}

pub(crate) fn eval_number_rule(rule: &NumberRule, ctx: &UserContext) -> bool {
    let left = ctx.attribute(&rule.attribute).and_then(|v| v.as_number());
    let matched = eval_number(left, &rule.operator, rule.value);
    if log_enabled!(log::Level::Trace) {
        trace!("{} {} {} ({left:?}) => {matched}", rule.attribute, rule.operator, rule.value);
    }
    matched
}

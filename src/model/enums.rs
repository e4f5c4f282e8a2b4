operator_enum! {
    /// Comparison operator of a [`crate::StringRule`].
    StringOperator {
        /// The attribute equals the comparison value.
        Equals => "EQUALS",
        /// The attribute differs from the comparison value.
        NotEquals => "NOT_EQUALS",
        /// The attribute contains the comparison value as a substring.
        Contains => "CONTAINS",
        /// The attribute is a substring of the comparison value.
        IsContainedIn => "IS_CONTAINED_IN",
        /// The attribute starts with the comparison value.
        StartsWith => "STARTS_WITH",
        /// The attribute ends with the comparison value.
        EndsWith => "ENDS_WITH",
    }
}

operator_enum! {
    /// Comparison operator of a [`crate::NumberRule`].
    NumberOperator {
        /// The attribute is less than the comparison value.
        LessThan => "LESS_THAN",
        /// The attribute is less than or equal to the comparison value.
        LessEqualThan => "LESS_EQUAL_THAN",
        /// The attribute equals the comparison value.
        Equal => "EQUAL",
        /// The attribute differs from the comparison value.
        NotEqual => "NOT_EQUAL",
        /// The attribute is greater than or equal to the comparison value.
        GreaterEqualThan => "GREATER_EQUAL_THAN",
        /// The attribute is greater than the comparison value.
        GreaterThan => "GREATER_THAN",
    }
}

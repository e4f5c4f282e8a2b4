use crate::value::AttributeValue;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt::{Display, Formatter};

/// Attribute name of the user identifier.
pub const USER_ID: &str = "userId";
/// Attribute name of the session identifier.
pub const SESSION_ID: &str = "sessionId";
/// Attribute name of the caller's IP address.
pub const IP_ADDRESS: &str = "ipAddress";

/// Describes the caller that feature flags are resolved for.
///
/// Carries three well-known attributes ([`USER_ID`], [`SESSION_ID`], [`IP_ADDRESS`])
/// and any number of custom attributes. Segment rules and the version and rollout
/// distributions read attributes by name through [`UserContext::attribute`].
///
/// # Examples:
///
/// ```rust
/// use featurit::UserContext;
///
/// let ctx = UserContext::new()
///     .user_id("1234")
///     .ip_address("192.168.1.1")
///     .custom("email", "info@featurit.com")
///     .custom("age", 36);
///
/// assert_eq!(ctx.get_user_id(), Some("1234"));
/// assert_eq!(ctx.attribute("email").unwrap().as_str(), Some("info@featurit.com"));
/// ```
#[derive(Serialize, Clone, Debug, Default, PartialEq)]
pub struct UserContext {
    attributes: HashMap<String, AttributeValue>,
}

impl UserContext {
    /// Initializes an empty [`UserContext`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Identifier of the user.
    pub fn user_id(mut self, user_id: &str) -> Self {
        self.attributes.insert(USER_ID.to_owned(), user_id.into());
        self
    }

    /// Identifier of the user's session.
    pub fn session_id(mut self, session_id: &str) -> Self {
        self.attributes
            .insert(SESSION_ID.to_owned(), session_id.into());
        self
    }

    /// IP address the request came from.
    pub fn ip_address(mut self, ip_address: &str) -> Self {
        self.attributes
            .insert(IP_ADDRESS.to_owned(), ip_address.into());
        self
    }

    /// Custom attribute for segment rules (e.g. email, plan, age).
    ///
    /// The well-known names are reserved; setting them here has no effect.
    ///
    /// # Examples:
    ///
    /// ```rust
    /// use featurit::UserContext;
    ///
    /// let ctx = UserContext::new()
    ///     .custom("userId", "ignored")
    ///     .custom("role", "admin");
    ///
    /// assert!(ctx.get_user_id().is_none());
    /// assert!(ctx.has_custom_attribute("role"));
    /// ```
    pub fn custom<T: Into<AttributeValue>>(mut self, name: &str, value: T) -> Self {
        if is_well_known(name) {
            return self;
        }
        self.attributes.insert(name.to_owned(), value.into());
        self
    }

    /// Returns the user identifier, if set.
    pub fn get_user_id(&self) -> Option<&str> {
        self.well_known(USER_ID)
    }

    /// Returns the session identifier, if set.
    pub fn get_session_id(&self) -> Option<&str> {
        self.well_known(SESSION_ID)
    }

    /// Returns the IP address, if set.
    pub fn get_ip_address(&self) -> Option<&str> {
        self.well_known(IP_ADDRESS)
    }

    /// Returns the custom attribute `name`. Well-known names always yield [`None`].
    pub fn custom_attribute(&self, name: &str) -> Option<&AttributeValue> {
        if is_well_known(name) {
            return None;
        }
        self.attributes.get(name)
    }

    /// True when the custom attribute `name` is present.
    pub fn has_custom_attribute(&self, name: &str) -> bool {
        self.custom_attribute(name).is_some()
    }

    /// Returns every custom attribute.
    pub fn custom_attributes(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
        self.attributes
            .iter()
            .filter(|(k, _)| !is_well_known(k))
            .map(|(k, v)| (k.as_str(), v))
    }

    /// Looks up any attribute by name, well-known or custom.
    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }

    fn well_known(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).and_then(AttributeValue::as_str)
    }
}

fn is_well_known(name: &str) -> bool {
    name == USER_ID || name == SESSION_ID || name == IP_ADDRESS
}

impl Display for UserContext {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match serde_json::to_string(self) {
            Ok(str) => write!(f, "{str}"),
            Err(_) => f.write_str("<invalid user context>"),
        }
    }
}

/// Supplies the [`UserContext`] flags are resolved against.
///
/// Implement it to derive the context from request-scoped state. A plain
/// [`UserContext`] is a provider that always returns itself.
pub trait UserContextProvider: Sync + Send {
    /// Returns the context for the next resolution pass.
    fn user_context(&self) -> UserContext;
}

impl UserContextProvider for UserContext {
    fn user_context(&self) -> UserContext {
        self.clone()
    }
}

#[cfg(test)]
mod user_tests {
    use crate::{AttributeValue, UserContext, IP_ADDRESS, USER_ID};

    #[test]
    fn well_known_attributes() {
        let ctx = UserContext::new()
            .user_id("1234")
            .session_id("1357")
            .ip_address("127.0.0.1");

        assert_eq!(ctx.get_user_id(), Some("1234"));
        assert_eq!(ctx.get_session_id(), Some("1357"));
        assert_eq!(ctx.get_ip_address(), Some("127.0.0.1"));
        assert_eq!(
            ctx.attribute(IP_ADDRESS),
            Some(&AttributeValue::from("127.0.0.1"))
        );
    }

    #[test]
    fn custom_cannot_shadow_well_known() {
        let ctx = UserContext::new().user_id("1").custom(USER_ID, "2");

        assert_eq!(ctx.get_user_id(), Some("1"));
        assert!(ctx.custom_attribute(USER_ID).is_none());
        assert_eq!(ctx.custom_attributes().count(), 0);
    }

    #[test]
    fn custom_lookup() {
        let ctx = UserContext::new()
            .custom("city", "Barcelona")
            .custom("age", 30);

        assert_eq!(ctx.attribute("city").unwrap().as_str(), Some("Barcelona"));
        assert_eq!(ctx.attribute("age").unwrap().as_number(), Some(30.0));
        assert!(ctx.attribute("missing").is_none());
        assert!(!ctx.has_custom_attribute("missing"));
    }
}

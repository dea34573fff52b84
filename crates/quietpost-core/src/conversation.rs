//! Conversation identifiers.

use std::fmt;

/// Identifier of a direct conversation between two users.
///
/// Both participants must compute the same id, so [`ConversationId::between`]
/// sorts the two user ids before joining them. The id names the cache entry
/// for derived keys and is the password input of the legacy scheme.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConversationId(String);

impl ConversationId {
    /// Separator between the two sorted user ids.
    pub const SEPARATOR: &'static str = "_";

    /// Id of the conversation between `user_a` and `user_b`.
    ///
    /// Symmetric: `between(a, b) == between(b, a)`.
    pub fn between(user_a: &str, user_b: &str) -> Self {
        let (low, high) = if user_a <= user_b { (user_a, user_b) } else { (user_b, user_a) };
        Self(format!("{low}{}{high}", Self::SEPARATOR))
    }

    /// Wrap an id computed elsewhere (received from a server, stored).
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Id as text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConversationId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ConversationId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl AsRef<str> for ConversationId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

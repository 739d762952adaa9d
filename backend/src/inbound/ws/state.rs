//! Shared WebSocket adapter state.
//!
//! The adapter depends on the list query port for view checks and on the
//! topic subscription port for fan-out bindings; neither is constructed here.

use std::sync::Arc;

use url::{Origin, Url};

use crate::domain::ports::{ListQuery, TopicSubscriptions};

/// Browser origins permitted to open a live connection.
#[derive(Debug, Clone, Default)]
pub struct AllowedOrigins(Vec<Origin>);

impl AllowedOrigins {
    /// Parse a list of origin URLs such as `https://lists.example.com`.
    ///
    /// # Examples
    /// ```
    /// use synclist::inbound::ws::state::AllowedOrigins;
    /// use url::Url;
    ///
    /// let origins = AllowedOrigins::parse(["https://lists.example.com"]).unwrap();
    /// assert!(origins.is_allowed(&Url::parse("https://lists.example.com").unwrap()));
    /// assert!(!origins.is_allowed(&Url::parse("http://lists.example.com").unwrap()));
    /// ```
    pub fn parse<I, S>(origins: I) -> Result<Self, url::ParseError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        origins
            .into_iter()
            .map(|raw| Url::parse(raw.as_ref()).map(|url| url.origin()))
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }

    /// Whether `origin` matches one entry by scheme, host and port.
    pub fn is_allowed(&self, origin: &Url) -> bool {
        let origin = origin.origin();
        origin.is_tuple() && self.0.contains(&origin)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Dependency bundle for WebSocket handlers and sessions.
#[derive(Clone)]
pub struct WsState {
    pub lists: Arc<dyn ListQuery>,
    pub topics: Arc<dyn TopicSubscriptions>,
    pub origins: AllowedOrigins,
    pub outbox_capacity: usize,
}

impl WsState {
    /// Construct state from explicit port implementations.
    pub fn new(
        lists: Arc<dyn ListQuery>,
        topics: Arc<dyn TopicSubscriptions>,
        origins: AllowedOrigins,
        outbox_capacity: usize,
    ) -> Self {
        Self {
            lists,
            topics,
            origins,
            outbox_capacity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("http://localhost:3000", true)]
    #[case("http://localhost:3000/some/path", true)]
    #[case("http://localhost:4000", false)]
    #[case("https://localhost:3000", false)]
    #[case("https://lists.example.com", true)]
    #[case("https://lists.example.com:443", true)]
    #[case("https://lists.example.com.evil.test", false)]
    #[case("https://chat.lists.example.com", false)]
    fn matches_exact_origins(#[case] candidate: &str, #[case] expected: bool) {
        let origins = AllowedOrigins::parse(["http://localhost:3000", "https://lists.example.com"])
            .expect("origins parse");
        let url = Url::parse(candidate).expect("candidate parses");
        assert_eq!(origins.is_allowed(&url), expected);
    }

    #[rstest]
    fn rejects_opaque_origins() {
        let origins = AllowedOrigins::parse(["file:///tmp/app"]).expect("file url parses");
        let url = Url::parse("file:///tmp/app").expect("file url parses");
        assert!(!origins.is_allowed(&url));
    }

    #[rstest]
    fn reports_unparsable_entries() {
        assert!(AllowedOrigins::parse(["not a url"]).is_err());
    }
}

//! Name-keyed dispatch for `/api/<method>` requests.

use std::collections::HashMap;

/// An API method the watch keeper answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RestAction {
    /// Current system name, id and URL.
    System,
    /// Long poll for the next system change.
    Poll,
}

impl RestAction {
    /// Every action, in registration order.
    pub const ALL: [Self; 2] = [Self::System, Self::Poll];

    /// The lower-case method name used in request paths.
    pub const fn name(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Poll => "poll",
        }
    }
}

/// Lookup table from lower-case method name to [`RestAction`].
///
/// Built once at startup and shared read-only by every request.
#[derive(Debug, Clone)]
pub struct DispatchTable {
    actions: HashMap<&'static str, RestAction>,
}

impl DispatchTable {
    /// Build the table from [`RestAction::ALL`].
    pub fn new() -> Self {
        let actions = RestAction::ALL
            .into_iter()
            .map(|action| (action.name(), action))
            .collect();
        Self { actions }
    }

    /// Find the action for a request path.
    ///
    /// The path is split on `/` and the third segment (after the empty
    /// leading segment and `api`) is lower-cased and looked up. Paths
    /// with fewer segments, or unknown names, yield `None`.
    pub fn resolve(&self, path: &str) -> Option<RestAction> {
        let method = path.split('/').nth(2)?.to_lowercase();
        self.actions.get(method.as_str()).copied()
    }

    /// Registered method names.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.actions.keys().copied()
    }
}

impl Default for DispatchTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_names_are_case_insensitive() {
        let table = DispatchTable::new();
        assert_eq!(table.resolve("/api/system"), Some(RestAction::System));
        assert_eq!(table.resolve("/api/SYSTEM"), Some(RestAction::System));
        assert_eq!(table.resolve("/api/Poll"), Some(RestAction::Poll));
    }

    #[test]
    fn extra_segments_are_ignored() {
        let table = DispatchTable::new();
        assert_eq!(table.resolve("/api/system/extra"), Some(RestAction::System));
    }

    #[test]
    fn short_or_unknown_paths_do_not_resolve() {
        let table = DispatchTable::new();
        assert_eq!(table.resolve("/api"), None);
        assert_eq!(table.resolve("/api/"), None);
        assert_eq!(table.resolve("/api/nothing"), None);
        assert_eq!(table.resolve(""), None);
    }

    #[test]
    fn table_holds_every_action() {
        let mut names: Vec<_> = DispatchTable::new().names().collect();
        names.sort_unstable();
        assert_eq!(names, ["poll", "system"]);
    }
}

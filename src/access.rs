//! The caller identity a query runs under.

use ahash::AHashSet;

/// Identity of the caller, resolved once per request by the session layer.
///
/// `group_ids` holds every group the user transitively belongs to. The
/// everyone pseudo-group is not listed for authenticated callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessContext {
    user_id: String,
    anonymous: bool,
    group_ids: Vec<String>,
}

impl AccessContext {
    /// An authenticated caller and their transitive groups.
    ///
    /// Duplicate group ids are dropped, first occurrence wins.
    pub fn new<S, I, G>(user_id: S, group_ids: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = G>,
        G: Into<String>,
    {
        let mut seen = AHashSet::new();
        let group_ids = group_ids
            .into_iter()
            .map(Into::into)
            .filter(|g: &String| seen.insert(g.clone()))
            .collect();
        AccessContext {
            user_id: user_id.into(),
            anonymous: false,
            group_ids,
        }
    }

    /// An unauthenticated caller.
    pub fn anonymous<S: Into<String>>(anonymous_principal: S) -> Self {
        AccessContext {
            user_id: anonymous_principal.into(),
            anonymous: true,
            group_ids: Vec::new(),
        }
    }

    /// Get the user id.
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Whether the caller is unauthenticated.
    pub fn is_anonymous(&self) -> bool {
        self.anonymous
    }

    /// Get the transitive group ids.
    pub fn group_ids(&self) -> &[String] {
        &self.group_ids
    }

    /// Whether the caller is the given superuser principal.
    pub fn is_admin(&self, admin_principal: &str) -> bool {
        !self.anonymous && self.user_id == admin_principal
    }

    /// Principals that grant this caller read access, own id first.
    ///
    /// `everyone` is appended for authenticated callers so that store-side
    /// reader checks treat world-readable items as readable.
    pub fn principals<'a>(&'a self, everyone: &'a str) -> Vec<&'a str> {
        let mut principals = Vec::with_capacity(self.group_ids.len() + 2);
        principals.push(self.user_id.as_str());
        if !self.anonymous {
            principals.extend(
                self.group_ids
                    .iter()
                    .map(String::as_str)
                    .filter(|g| *g != everyone),
            );
            principals.push(everyone);
        }
        principals
    }
}

//! Routing configuration: which routes need a login, which need premium
//! access, and what title to show.

use serde::{Deserialize, Serialize};

use crate::{LOGIN_PATH, SUBSCRIPTION_PATH};

/// Metadata attached to a route definition
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteMeta {
    #[serde(default)]
    pub requires_auth: bool,
    #[serde(default)]
    pub requires_premium: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Access requirements of a navigation target
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteRequirement {
    pub requires_auth: bool,
    pub requires_premium: bool,
}

impl RouteRequirement {
    fn merge(self, other: Self) -> Self {
        Self {
            requires_auth: self.requires_auth || other.requires_auth,
            requires_premium: self.requires_premium || other.requires_premium,
        }
    }
}

impl From<&RouteMeta> for RouteRequirement {
    fn from(meta: &RouteMeta) -> Self {
        Self {
            requires_auth: meta.requires_auth,
            requires_premium: meta.requires_premium,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub path: String,
    pub name: String,
    pub meta: RouteMeta,
}

impl Route {
    pub fn new(path: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            meta: RouteMeta::default(),
        }
    }

    pub fn requires_auth(mut self) -> Self {
        self.meta.requires_auth = true;
        self
    }

    /// Premium routes always require a login as well
    pub fn requires_premium(mut self) -> Self {
        self.meta.requires_auth = true;
        self.meta.requires_premium = true;
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.meta.title = Some(title.into());
        self
    }

    /// Does `path` (already normalized) point at this route or one of its
    /// nested children
    fn matches(&self, path: &str) -> bool {
        let own = self.path.trim_end_matches('/');
        if own.is_empty() {
            // The root route would otherwise be a parent of everything
            return path == "/";
        }
        path.strip_prefix(own)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    }
}

/// A concrete navigation target after matching it against a [`RouteTable`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteMatch {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub requirement: RouteRequirement,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl RouteMatch {
    /// A target with explicit requirements, not backed by any route table
    pub fn new(path: impl Into<String>, requirement: RouteRequirement) -> Self {
        Self {
            path: path.into(),
            name: None,
            requirement,
            title: None,
        }
    }

    pub fn with_title(self, title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..self
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    pub fn new(routes: Vec<Route>) -> Self {
        Self { routes }
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// All route records matching `path`, the most specific one last
    pub fn matched(&self, path: &str) -> Vec<&Route> {
        let path = normalize_path(path);
        let mut matched: Vec<_> = self.routes.iter().filter(|r| r.matches(&path)).collect();
        matched.sort_by_key(|r| r.path.trim_end_matches('/').len());
        matched
    }

    /// Match `path` against the table
    ///
    /// Requirements of all matching records (a parent and its nested
    /// children) are combined, so a child can not opt out of a requirement of
    /// its parent. The title comes from the most specific record defining one.
    /// A path matching nothing has no requirements.
    pub fn resolve(&self, path: &str) -> RouteMatch {
        let matched = self.matched(path);

        let requirement = matched
            .iter()
            .map(|r| RouteRequirement::from(&r.meta))
            .fold(RouteRequirement::default(), RouteRequirement::merge);

        RouteMatch {
            path: normalize_path(path),
            name: matched.last().map(|r| r.name.clone()),
            requirement,
            title: matched.iter().rev().find_map(|r| r.meta.title.clone()),
        }
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new(vec![
            Route::new(LOGIN_PATH, "login").title("로그인 | 밀리의 서재"),
            Route::new("/signup", "signup").title("회원가입 | 밀리의 서재"),
            Route::new("/library", "library")
                .requires_auth()
                .title("서재 | 밀리의 서재"),
            Route::new(SUBSCRIPTION_PATH, "subscription")
                .requires_auth()
                .title("구독 | 밀리의 서재"),
            Route::new("/reader", "reader")
                .requires_premium()
                .title("바로 읽기 | 밀리의 서재"),
            Route::new("/vocabulary", "vocabulary")
                .requires_premium()
                .title("단어장 | 밀리의 서재"),
        ])
    }
}

/// Drop query and fragment, and any trailing slash (except for the root)
fn normalize_path(path: &str) -> String {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_owned()
    } else if trimmed.starts_with('/') {
        trimmed.to_owned()
    } else {
        format!("/{trimmed}")
    }
}

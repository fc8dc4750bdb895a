//! Route metadata and the before-each navigation guard
//!
//! Every CLI command is mapped to one of these routes and checked before it
//! runs, so "needs login" and "only when logged out" live in one place.

use std::fmt;

use crate::session::AuthStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Home,
    Dashboard,
    About,
    BlogList,
    BlogDetail(i64),
    BlogEdit(i64),
    BlogAdd,
    BlogSearch,
    Login,
    Register,
}

/// Result of running the guard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Proceed,
    Redirect(Route),
}

impl Route {
    /// Match a path. The fixed `/blog/add` and `/blog/search` win over `/blog/:id`.
    pub fn parse(path: &str) -> Option<Route> {
        let trimmed = path.trim_end_matches('/');
        let segments: Vec<&str> = trimmed.split('/').filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            [] => Some(Route::Home),
            ["dashboard"] => Some(Route::Dashboard),
            ["about"] => Some(Route::About),
            ["blogs"] => Some(Route::BlogList),
            ["blog", "add"] => Some(Route::BlogAdd),
            ["blog", "search"] => Some(Route::BlogSearch),
            ["blog", id] => id.parse().ok().map(Route::BlogDetail),
            ["blog", id, "edit"] => id.parse().ok().map(Route::BlogEdit),
            ["login"] => Some(Route::Login),
            ["register"] => Some(Route::Register),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Route::Home => "home",
            Route::Dashboard => "dashboard",
            Route::About => "about",
            Route::BlogList => "blog-list",
            Route::BlogDetail(_) => "blog-detail",
            Route::BlogEdit(_) => "blog-edit-standalone",
            Route::BlogAdd => "blog-add",
            Route::BlogSearch => "blog-search",
            Route::Login => "login",
            Route::Register => "register",
        }
    }

    pub fn requires_auth(&self) -> bool {
        matches!(
            self,
            Route::Home | Route::Dashboard | Route::BlogEdit(_) | Route::BlogAdd | Route::BlogSearch
        )
    }

    /// Pages that make no sense once logged in
    pub fn hide_for_auth(&self) -> bool {
        matches!(self, Route::Login | Route::Register)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Home => write!(f, "/"),
            Route::Dashboard => write!(f, "/dashboard"),
            Route::About => write!(f, "/about"),
            Route::BlogList => write!(f, "/blogs"),
            Route::BlogDetail(id) => write!(f, "/blog/{}", id),
            Route::BlogEdit(id) => write!(f, "/blog/{}/edit", id),
            Route::BlogAdd => write!(f, "/blog/add"),
            Route::BlogSearch => write!(f, "/blog/search"),
            Route::Login => write!(f, "/login"),
            Route::Register => write!(f, "/register"),
        }
    }
}

/// Refresh auth state from storage, then decide whether `to` may be entered
pub fn before_each(to: &Route, auth: &mut AuthStore) -> Navigation {
    auth.init_auth();

    if to.requires_auth() && !auth.is_authenticated() {
        return Navigation::Redirect(Route::Login);
    }
    if to.hide_for_auth() && auth.is_authenticated() {
        return Navigation::Redirect(Route::Home);
    }
    Navigation::Proceed
}

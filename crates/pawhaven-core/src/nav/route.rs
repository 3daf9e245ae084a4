use std::fmt;

use tracing::debug;

use crate::auth::RouteGuard;

/// Pages of the shelter app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    Login,
    Register,
    AddPet,
    PetDetail(String),
    Favorites,
    Settings,
}

impl Route {
    /// Match a path against the route table. Query strings, fragments and a
    /// trailing slash are ignored.
    pub fn parse(path: &str) -> Option<Self> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            [] => Some(Route::Home),
            ["login"] => Some(Route::Login),
            ["register"] => Some(Route::Register),
            ["pet", "add"] => Some(Route::AddPet),
            ["pet", id] => Some(Route::PetDetail((*id).to_string())),
            ["favorites"] => Some(Route::Favorites),
            ["setting"] => Some(Route::Settings),
            _ => None,
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Home => "/".to_string(),
            Route::Login => "/login".to_string(),
            Route::Register => "/register".to_string(),
            Route::AddPet => "/pet/add".to_string(),
            Route::PetDetail(id) => format!("/pet/{}", id),
            Route::Favorites => "/favorites".to_string(),
            Route::Settings => "/setting".to_string(),
        }
    }

    /// Whether the page sits behind the route guard.
    pub fn is_protected(&self) -> bool {
        matches!(self, Route::AddPet | Route::Favorites | Route::Settings)
    }

    pub fn title(&self) -> &'static str {
        match self {
            Route::Home => "Home",
            Route::Login => "Login",
            Route::Register => "Sign Up",
            Route::AddPet => "Add Pet",
            Route::PetDetail(_) => "Pet Detail",
            Route::Favorites => "Favorites",
            Route::Settings => "Settings",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// What the view layer should do with a requested path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Render(Route),
    /// Soft, in-app replacement of the requested view.
    Redirect(Route),
    NotFound,
}

/// Resolves paths, substituting protected pages with a redirect to the
/// root when the guard refuses.
#[derive(Clone)]
pub struct Router {
    guard: RouteGuard,
}

impl Router {
    pub fn new(guard: RouteGuard) -> Self {
        Self { guard }
    }

    pub fn resolve(&self, path: &str) -> Navigation {
        let Some(route) = Route::parse(path) else {
            debug!(path, "No route matches");
            return Navigation::NotFound;
        };

        if route.is_protected() && !self.guard.can_access() {
            debug!(path, "Guard refused protected route");
            return Navigation::Redirect(Route::Home);
        }

        Navigation::Render(route)
    }
}

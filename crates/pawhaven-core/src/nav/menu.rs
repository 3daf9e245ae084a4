use crate::auth::{AuthPhase, AuthState};

use super::Route;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuItem {
    Link(Route),
    Logout,
}

/// Right-hand side of the navigation bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderMenu {
    /// Session still loading; nothing is shown until it settles.
    Hidden,
    Account {
        email: Option<String>,
        items: Vec<MenuItem>,
    },
    LoginButton,
    /// Guest already on the login or sign-up page.
    Empty,
}

impl HeaderMenu {
    pub fn for_state(state: &AuthState, current: &Route) -> Self {
        match state.phase() {
            AuthPhase::Loading => HeaderMenu::Hidden,
            AuthPhase::Authenticated => {
                let user = state.user();
                let mut items = Vec::with_capacity(4);
                if user.is_some_and(|u| u.is_staff()) {
                    items.push(MenuItem::Link(Route::AddPet));
                }
                items.push(MenuItem::Link(Route::Favorites));
                items.push(MenuItem::Link(Route::Settings));
                items.push(MenuItem::Logout);

                HeaderMenu::Account {
                    email: user
                        .map(|u| u.email.clone())
                        .filter(|email| !email.is_empty()),
                    items,
                }
            }
            AuthPhase::Anonymous => match current {
                Route::Login | Route::Register => HeaderMenu::Empty,
                _ => HeaderMenu::LoginButton,
            },
        }
    }
}

//! Role-based gate in front of protected views and actions.
//!
//! The guard is a pure function of the allowed roles and a snapshot of the
//! session. It holds no state and decides again on every call.

use crate::models::{Role, User};

/// Where unauthenticated callers are sent
pub const LOGIN_ENTRY: &str = "/login";

const ACCESS_DENIED: &str = "Access denied: you do not have permission to view this page";

/// What the guard can see of the session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthSnapshot {
    pub loading: bool,
    pub user: Option<User>,
}

impl AuthSnapshot {
    pub fn loading() -> Self {
        Self {
            loading: true,
            user: None,
        }
    }

    pub fn signed_out() -> Self {
        Self::default()
    }

    pub fn signed_in(user: User) -> Self {
        Self {
            loading: false,
            user: Some(user),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Session still being restored; no decision yet
    Loading,
    /// No session; send to the login entry point
    Unauthenticated,
    /// Signed in with a role outside the allowed set
    Forbidden,
    Authorized,
}

pub fn evaluate(allowed: &[Role], snapshot: &AuthSnapshot) -> Access {
    if snapshot.loading {
        return Access::Loading;
    }

    match &snapshot.user {
        None => Access::Unauthenticated,
        Some(user) if allowed.contains(&user.role) => Access::Authorized,
        Some(_) => Access::Forbidden,
    }
}

/// Outcome of rendering through a guard
#[derive(Debug, Clone, PartialEq)]
pub enum Rendered<T> {
    Loading,
    Redirect(&'static str),
    Denied(String),
    Content(T),
}

impl<T> Rendered<T> {
    pub fn content(self) -> Option<T> {
        match self {
            Rendered::Content(value) => Some(value),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Guard {
    allowed: Vec<Role>,
    fallback: Option<String>,
}

impl Guard {
    pub fn new(allowed: impl IntoIterator<Item = Role>) -> Self {
        Self {
            allowed: allowed.into_iter().collect(),
            fallback: None,
        }
    }

    pub fn admin() -> Self {
        Self::new([Role::Admin])
    }

    /// Any signed-in role
    pub fn authenticated() -> Self {
        Self::new([Role::Admin, Role::User])
    }

    /// Replaces the default access-denied message
    pub fn with_fallback(mut self, fallback: impl Into<String>) -> Self {
        self.fallback = Some(fallback.into());
        self
    }

    pub fn allowed(&self) -> &[Role] {
        &self.allowed
    }

    pub fn check(&self, snapshot: &AuthSnapshot) -> Access {
        evaluate(&self.allowed, snapshot)
    }

    /// Runs `content` only when the snapshot is authorized
    pub fn render<T>(&self, snapshot: &AuthSnapshot, content: impl FnOnce(&User) -> T) -> Rendered<T> {
        match (self.check(snapshot), &snapshot.user) {
            (Access::Authorized, Some(user)) => Rendered::Content(content(user)),
            (Access::Loading, _) => Rendered::Loading,
            (Access::Forbidden, _) => {
                Rendered::Denied(self.fallback.clone().unwrap_or_else(|| ACCESS_DENIED.to_string()))
            }
            _ => Rendered::Redirect(LOGIN_ENTRY),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn user(role: Role) -> User {
        User {
            id: "1".into(),
            username: "ana".into(),
            role,
            email: None,
        }
    }

    #[test]
    fn loading_makes_no_decision() {
        assert_eq!(evaluate(&[Role::Admin], &AuthSnapshot::loading()), Access::Loading);

        let still_loading = AuthSnapshot {
            loading: true,
            user: Some(user(Role::User)),
        };
        assert_eq!(evaluate(&[Role::Admin], &still_loading), Access::Loading);
    }

    #[test]
    fn signed_out_is_unauthenticated() {
        assert_eq!(evaluate(&[Role::User], &AuthSnapshot::signed_out()), Access::Unauthenticated);
    }

    #[test]
    fn role_outside_allowed_set_is_forbidden() {
        let snapshot = AuthSnapshot::signed_in(user(Role::User));
        assert_eq!(evaluate(&[Role::Admin], &snapshot), Access::Forbidden);
        assert_eq!(evaluate(&[Role::Admin, Role::User], &snapshot), Access::Authorized);
        assert_eq!(evaluate(&[], &snapshot), Access::Forbidden);
    }

    #[test]
    fn user_session_on_admin_page_renders_access_denied() {
        let ran = Cell::new(false);
        let rendered = Guard::admin().render(&AuthSnapshot::signed_in(user(Role::User)), |_| {
            ran.set(true);
            "admin dashboard"
        });

        assert!(matches!(rendered, Rendered::Denied(_)));
        assert!(!ran.get());
    }

    #[test]
    fn caller_fallback_replaces_default_message() {
        let rendered = Guard::admin()
            .with_fallback("Admins only")
            .render(&AuthSnapshot::signed_in(user(Role::User)), |_| ());
        assert_eq!(rendered, Rendered::Denied("Admins only".into()));
    }

    #[test]
    fn signed_out_redirects_to_login() {
        let rendered = Guard::authenticated().render(&AuthSnapshot::signed_out(), |_| ());
        assert_eq!(rendered, Rendered::Redirect(LOGIN_ENTRY));
    }

    #[test]
    fn authorized_renders_content_with_user() {
        let rendered = Guard::admin().render(&AuthSnapshot::signed_in(user(Role::Admin)), |u| u.username.clone());
        assert_eq!(rendered.content().as_deref(), Some("ana"));
    }
}

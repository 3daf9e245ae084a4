//! Account sign-up.
//!
//! Registration issues no token: a new account still has to log in, so
//! nothing here touches the token store or the session manager.

use thiserror::Error;
use tracing::{info, warn};

use crate::api::{ApiClient, RegisterReply, RegisterRequest, GENERIC_ERROR_MESSAGE};
use crate::models::{Role, UserProfile};
use crate::notify::{Notice, Notifier};

/// Shown after a successful sign-up.
pub const REGISTERED_MESSAGE: &str = "Sign up success, please login and meet your pet.";

/// Minimum password length
const MIN_PASSWORD_LENGTH: usize = 8;

/// Characters that satisfy the "special character" password rule
const PASSWORD_SPECIALS: &str = "!@#$%^&*";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Email,
    Password,
    ConfirmPassword,
    StaffCode,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    #[error("Please enter your email.")]
    MissingEmail,

    #[error("Please enter correct email.")]
    MalformedEmail,

    #[error("Please enter your password.")]
    MissingPassword,

    #[error("Password must contain 8 characters, one uppercase, one lowercase, one number and one special character.")]
    WeakPassword,

    #[error("Passwords must match.")]
    PasswordMismatch,

    #[error("Please enter staff code if you are a staff.")]
    MissingStaffCode,
}

impl FormError {
    pub fn field(&self) -> Field {
        match self {
            FormError::MissingEmail | FormError::MalformedEmail => Field::Email,
            FormError::MissingPassword | FormError::WeakPassword => Field::Password,
            FormError::PasswordMismatch => Field::ConfirmPassword,
            FormError::MissingStaffCode => Field::StaffCode,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RegistrationForm {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub as_staff: bool,
    pub staff_code: Option<String>,
}

impl RegistrationForm {
    /// Check the form, returning every problem found. Empty means valid.
    pub fn validate(&self) -> Vec<FormError> {
        let mut errors = Vec::new();

        let email = self.email.trim();
        if email.is_empty() {
            errors.push(FormError::MissingEmail);
        } else if !looks_like_email(email) {
            errors.push(FormError::MalformedEmail);
        }

        let password = self.password.trim();
        if password.is_empty() {
            errors.push(FormError::MissingPassword);
        } else if !is_strong_password(password) {
            errors.push(FormError::WeakPassword);
        }

        if self.confirm_password.trim() != password {
            errors.push(FormError::PasswordMismatch);
        }

        if self.as_staff && self.staff_code().is_none() {
            errors.push(FormError::MissingStaffCode);
        }

        errors
    }

    pub fn role(&self) -> Role {
        if self.as_staff {
            Role::Staff
        } else {
            Role::User
        }
    }

    fn staff_code(&self) -> Option<&str> {
        self.staff_code
            .as_deref()
            .map(str::trim)
            .filter(|code| !code.is_empty())
    }

    fn to_request(&self) -> RegisterRequest {
        RegisterRequest {
            email: self.email.trim().to_string(),
            password: self.password.trim().to_string(),
            role: self.role(),
            staff_code: if self.as_staff {
                self.staff_code().map(str::to_string)
            } else {
                None
            },
        }
    }
}

fn looks_like_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !email.chars().any(char::is_whitespace)
        && domain
            .rsplit_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !host.contains('@'))
}

fn is_strong_password(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LENGTH
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| PASSWORD_SPECIALS.contains(c))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationOutcome {
    /// The form failed validation; the backend was not contacted.
    Invalid(Vec<FormError>),
    Registered(UserProfile),
    Rejected,
}

/// Validate the form, then create the account.
pub async fn register(
    api: &ApiClient,
    notifier: &dyn Notifier,
    form: &RegistrationForm,
) -> RegistrationOutcome {
    let errors = form.validate();
    if !errors.is_empty() {
        return RegistrationOutcome::Invalid(errors);
    }

    match api.register(&form.to_request()).await {
        Ok(RegisterReply { user: Some(record) }) => {
            let profile = UserProfile::from(record);
            info!(email = %profile.email, role = ?profile.role, "Account registered");
            notifier.notify(Notice::success(REGISTERED_MESSAGE));
            RegistrationOutcome::Registered(profile)
        }
        Ok(RegisterReply { user: None }) => {
            warn!("Registration reply lacked a user");
            notifier.notify(Notice::error(GENERIC_ERROR_MESSAGE));
            RegistrationOutcome::Rejected
        }
        Err(e) => {
            warn!(error = %e, "Registration failed");
            notifier.notify(Notice::error(e.user_message()));
            RegistrationOutcome::Rejected
        }
    }
}

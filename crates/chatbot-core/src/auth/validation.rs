//! Signup form validation.
//!
//! Field-level checks that need no storage access. The username uniqueness
//! check lives in [`super::service::AuthService::signup`].

use chatbot_types::user::{SignupErrors, SignupForm, USERNAME_MAX_LEN};

/// Minimum accepted password length.
pub const MIN_PASSWORD_LEN: usize = 8;

pub const MSG_REQUIRED: &str = "This field is required.";
pub const MSG_USERNAME_INVALID: &str = "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.";
pub const MSG_USERNAME_TAKEN: &str = "A user with that username already exists.";
pub const MSG_PASSWORD_MISMATCH: &str = "The two password fields didn\u{2019}t match.";
pub const MSG_PASSWORD_COMMON: &str = "This password is too common.";
pub const MSG_PASSWORD_NUMERIC: &str = "This password is entirely numeric.";
pub const MSG_PASSWORD_SIMILAR: &str = "The password is too similar to the username.";

// Lowercased.
const COMMON_PASSWORDS: &[&str] = &[
    "password", "password1", "password123", "12345678", "123456789", "1234567890",
    "qwertyuiop", "qwerty123", "iloveyou", "sunshine", "princess", "football",
    "baseball", "welcome1", "letmein1", "abc12345", "admin123", "trustno1",
    "passw0rd", "superman", "whatever", "starwars", "11111111", "00000000",
    "dragon123", "monkey123", "master123", "qwertyui", "asdfghjk", "zxcvbnm1",
];

/// Validate a signup form, returning every problem found.
///
/// Passwords are only strength-checked once both entries match, and the
/// errors are reported against `password2`.
pub fn validate_signup(form: &SignupForm) -> SignupErrors {
    let mut errors = SignupErrors::new();
    let username = form.username.trim();

    if username.is_empty() {
        errors.add("username", MSG_REQUIRED);
    } else {
        let len = username.chars().count();
        if len > USERNAME_MAX_LEN {
            errors.add(
                "username",
                format!("Ensure this value has at most {USERNAME_MAX_LEN} characters (it has {len})."),
            );
        }
        if !is_valid_username(username) {
            errors.add("username", MSG_USERNAME_INVALID);
        }
    }

    if form.password1.is_empty() {
        errors.add("password1", MSG_REQUIRED);
    }
    if form.password2.is_empty() {
        errors.add("password2", MSG_REQUIRED);
    }

    if !form.password1.is_empty() && !form.password2.is_empty() {
        if form.password1 != form.password2 {
            errors.add("password2", MSG_PASSWORD_MISMATCH);
        } else {
            for message in password_strength_errors(&form.password2, username) {
                errors.add("password2", message);
            }
        }
    }

    errors
}

/// Letters, digits and `@ . + - _` only.
pub fn is_valid_username(username: &str) -> bool {
    !username.is_empty()
        && username
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
}

/// Strength problems with a password, in a stable order.
pub fn password_strength_errors(password: &str, username: &str) -> Vec<String> {
    let mut problems = Vec::new();

    if password.chars().count() < MIN_PASSWORD_LEN {
        problems.push(format!(
            "This password is too short. It must contain at least {MIN_PASSWORD_LEN} characters."
        ));
    }

    let lowered = password.to_lowercase();
    if COMMON_PASSWORDS.contains(&lowered.as_str()) {
        problems.push(MSG_PASSWORD_COMMON.to_string());
    }

    if password.chars().all(|c| c.is_ascii_digit()) {
        problems.push(MSG_PASSWORD_NUMERIC.to_string());
    }

    if is_too_similar(&lowered, &username.to_lowercase()) {
        problems.push(MSG_PASSWORD_SIMILAR.to_string());
    }

    problems
}

fn is_too_similar(password: &str, username: &str) -> bool {
    // Very short usernames would match too many passwords.
    if username.chars().count() < 3 {
        return false;
    }
    password.contains(username) || username.contains(password)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(username: &str, p1: &str, p2: &str) -> SignupForm {
        SignupForm {
            username: username.to_string(),
            password1: p1.to_string(),
            password2: p2.to_string(),
        }
    }

    #[test]
    fn test_valid_form_has_no_errors() {
        let errors = validate_signup(&form("alice", "correct-horse-42", "correct-horse-42"));
        assert!(errors.is_empty(), "unexpected errors: {errors}");
    }

    #[test]
    fn test_missing_fields_are_required() {
        let errors = validate_signup(&form("", "", ""));
        assert_eq!(errors.field("username"), [MSG_REQUIRED]);
        assert_eq!(errors.field("password1"), [MSG_REQUIRED]);
        assert_eq!(errors.field("password2"), [MSG_REQUIRED]);
    }

    #[test]
    fn test_username_characters() {
        assert!(is_valid_username("bob.smith+chat@example-1_x"));
        assert!(is_valid_username("zoë"));
        assert!(!is_valid_username("bob smith"));
        assert!(!is_valid_username("bob/smith"));

        let errors = validate_signup(&form("bad name", "correct-horse-42", "correct-horse-42"));
        assert_eq!(errors.field("username"), [MSG_USERNAME_INVALID]);
    }

    #[test]
    fn test_username_too_long() {
        let long = "a".repeat(151);
        let errors = validate_signup(&form(&long, "correct-horse-42", "correct-horse-42"));
        assert_eq!(
            errors.field("username"),
            ["Ensure this value has at most 150 characters (it has 151)."]
        );
    }

    #[test]
    fn test_password_mismatch_skips_strength_checks() {
        let errors = validate_signup(&form("alice", "short", "other"));
        assert_eq!(errors.field("password2"), [MSG_PASSWORD_MISMATCH]);
    }

    #[test]
    fn test_short_numeric_common_password() {
        let errors = validate_signup(&form("alice", "1234567", "1234567"));
        let messages = errors.field("password2");
        assert!(messages.iter().any(|m| m.starts_with("This password is too short.")));
        assert!(messages.iter().any(|m| m == MSG_PASSWORD_NUMERIC));

        let errors = validate_signup(&form("alice", "Password123", "Password123"));
        assert_eq!(errors.field("password2"), [MSG_PASSWORD_COMMON]);
    }

    #[test]
    fn test_password_similar_to_username() {
        let errors = validate_signup(&form("marvin", "Marvin2024!", "Marvin2024!"));
        assert_eq!(errors.field("password2"), [MSG_PASSWORD_SIMILAR]);

        // Two-character usernames are ignored by the similarity check.
        let errors = validate_signup(&form("jo", "jo-and-friends-9", "jo-and-friends-9"));
        assert!(errors.is_empty());
    }
}

//! Accounts and the request bodies of the auth endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::defaults::{AVATAR_LEN, DEFAULT_DEPARTMENT, MIN_NAME_LEN, MIN_PASSWORD_LEN};
use crate::{Error, Result};

/// A registered account as returned to clients. Never carries the hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_id: Option<String>,
    pub department: String,
    #[serde(default)]
    pub avatar: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A user row together with its bcrypt hash, for credential checks.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    pub password_hash: String,
}

/// Validated, normalized account fields ready to insert.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub student_id: Option<String>,
    pub department: String,
    pub avatar: String,
}

/// Normalized profile changes. `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    /// `Some(None)` clears the student id.
    pub student_id: Option<Option<String>>,
    pub department: Option<String>,
    pub avatar: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.student_id.is_none()
            && self.department.is_none()
            && self.avatar.is_none()
    }
}

/// Initials shown in place of a profile picture.
pub fn avatar_for(name: &str) -> String {
    name.chars().take(AVATAR_LEN).collect::<String>().to_uppercase()
}

/// Lowercase and trim an email address.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

// =============================================================================
// REQUEST BODIES
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
}

/// Signup input after validation; the password is still plaintext.
#[derive(Debug, Clone)]
pub struct ValidatedSignup {
    pub email: String,
    pub password: String,
    pub name: String,
    pub student_id: Option<String>,
    pub department: String,
}

impl ValidatedSignup {
    pub fn into_new_user(self, password_hash: String) -> NewUser {
        NewUser {
            avatar: avatar_for(&self.name),
            email: self.email,
            password_hash,
            name: self.name,
            student_id: self.student_id,
            department: self.department,
        }
    }
}

impl SignupRequest {
    /// Check and normalize the signup fields.
    pub fn validate(&self) -> Result<ValidatedSignup> {
        let (email, password) = match (self.email.as_deref(), self.password.as_deref()) {
            (Some(e), Some(p)) if !e.is_empty() && !p.is_empty() => (e, p),
            _ => {
                return Err(Error::InvalidInput(
                    "Email and password are required".to_string(),
                ))
            }
        };

        let email = normalize_email(email);
        if !email.contains('@') {
            return Err(Error::InvalidInput(
                "Please enter a valid email address".to_string(),
            ));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(Error::InvalidInput(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }

        let name = non_blank(self.name.as_deref())
            .filter(|n| n.chars().count() >= MIN_NAME_LEN)
            .ok_or_else(|| {
                Error::InvalidInput(format!(
                    "Name is required and must be at least {} characters",
                    MIN_NAME_LEN
                ))
            })?;

        Ok(ValidatedSignup {
            email,
            password: password.to_string(),
            name,
            student_id: non_blank(self.student_id.as_deref()),
            department: non_blank(self.department.as_deref())
                .unwrap_or_else(|| DEFAULT_DEPARTMENT.to_string()),
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl LoginRequest {
    /// Returns the normalized email and the password.
    pub fn validate(&self) -> Result<(String, String)> {
        match (self.email.as_deref(), self.password.as_deref()) {
            (Some(e), Some(p)) if !e.is_empty() && !p.is_empty() => {
                Ok((normalize_email(e), p.to_string()))
            }
            _ => Err(Error::InvalidInput(
                "Email and password are required".to_string(),
            )),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdateRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
}

impl ProfileUpdateRequest {
    /// Blank name is ignored, blank student id clears it, blank department
    /// resets it. A new name recomputes the avatar.
    pub fn normalize(&self) -> ProfileUpdate {
        let name = non_blank(self.name.as_deref());
        let avatar = name.as_deref().map(avatar_for);
        ProfileUpdate {
            student_id: self.student_id.as_deref().map(|s| non_blank(Some(s))),
            department: self.department.as_deref().map(|d| {
                non_blank(Some(d)).unwrap_or_else(|| DEFAULT_DEPARTMENT.to_string())
            }),
            name,
            avatar,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signup(email: &str, password: &str, name: &str) -> SignupRequest {
        SignupRequest {
            email: Some(email.to_string()),
            password: Some(password.to_string()),
            name: Some(name.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_avatar_takes_two_uppercased_chars() {
        assert_eq!(avatar_for("Demo Student"), "DE");
        assert_eq!(avatar_for("jo"), "JO");
        assert_eq!(avatar_for("é"), "É");
    }

    #[test]
    fn test_signup_normalizes_email() {
        let v = signup("  A@B.com ", "abcdef", "Jo").validate().unwrap();
        assert_eq!(v.email, "a@b.com");
        assert_eq!(v.department, DEFAULT_DEPARTMENT);
        assert!(v.student_id.is_none());
    }

    #[test]
    fn test_signup_rejects_short_password() {
        let err = signup("a@b.com", "abcde", "Jo").validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid input: Password must be at least 6 characters"
        );
    }

    #[test]
    fn test_signup_rejects_email_without_at() {
        assert!(signup("ab.com", "abcdef", "Jo").validate().is_err());
    }

    #[test]
    fn test_signup_rejects_short_or_blank_name() {
        assert!(signup("a@b.com", "abcdef", " J ").validate().is_err());
        assert!(signup("a@b.com", "abcdef", "   ").validate().is_err());
    }

    #[test]
    fn test_signup_requires_email_and_password() {
        let req = SignupRequest {
            email: Some("a@b.com".to_string()),
            ..Default::default()
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_blank_optional_fields_normalize() {
        let mut req = signup("a@b.com", "abcdef", "Jo");
        req.student_id = Some("  ".to_string());
        req.department = Some(" ".to_string());
        let v = req.validate().unwrap();
        assert!(v.student_id.is_none());
        assert_eq!(v.department, DEFAULT_DEPARTMENT);
        assert_eq!(v.into_new_user("hash".to_string()).avatar, "JO");
    }

    #[test]
    fn test_profile_update_recomputes_avatar() {
        let update = ProfileUpdateRequest {
            name: Some(" maya ".to_string()),
            ..Default::default()
        }
        .normalize();
        assert_eq!(update.name.as_deref(), Some("maya"));
        assert_eq!(update.avatar.as_deref(), Some("MA"));
        assert!(update.student_id.is_none());
    }

    #[test]
    fn test_profile_update_blank_values() {
        let update = ProfileUpdateRequest {
            name: Some("  ".to_string()),
            student_id: Some("".to_string()),
            department: Some(" ".to_string()),
        }
        .normalize();
        assert!(update.name.is_none());
        assert!(update.avatar.is_none());
        assert_eq!(update.student_id, Some(None));
        assert_eq!(update.department.as_deref(), Some(DEFAULT_DEPARTMENT));
    }

    #[test]
    fn test_empty_profile_update() {
        assert!(ProfileUpdateRequest::default().normalize().is_empty());
    }

    #[test]
    fn test_user_json_omits_missing_student_id() {
        let user = User {
            id: Uuid::nil(),
            email: "a@b.com".to_string(),
            name: "Jo".to_string(),
            student_id: None,
            department: DEFAULT_DEPARTMENT.to_string(),
            avatar: Some("JO".to_string()),
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("studentId").is_none());
        assert!(json.get("passwordHash").is_none());
        assert_eq!(json["avatar"], "JO");
    }
}

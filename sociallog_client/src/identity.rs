use serde_json::Value;

use crate::models::User;

const ID_KEYS: &[&str] = &["UserID", "id", "sub", "Email", "email"];
const NAME_KEYS: &[&str] = &["Name", "FullName", "name", "Email", "email"];
const EMAIL_KEYS: &[&str] = &["Email", "email"];
const AVATAR_KEYS: &[&str] = &["Picture", "picture", "avatarUrl", "Avatar", "ImageURL", "PhotoURL"];
const EMPLOYEE_CODE_KEYS: &[&str] = &["EmployeeCode", "employee_code"];

/// Collapses the identity provider's inconsistent field casings into one
/// profile. Total: every field has a fixed key precedence and a fallback
/// default, so any verify payload maps to some `User`.
pub fn user_from_verify_payload(user: &Value, employee: Option<&Value>) -> User {
    User {
        id: pick(user, ID_KEYS).unwrap_or("unknown").to_string(),
        name: pick(user, NAME_KEYS).unwrap_or("User").to_string(),
        email: pick(user, EMAIL_KEYS).unwrap_or_default().to_string(),
        avatar_url: pick(user, AVATAR_KEYS).map(str::to_string),
        employee_code: employee
            .and_then(|value| pick(value, EMPLOYEE_CODE_KEYS))
            .map(str::to_string),
    }
}

fn pick<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter().find_map(|key| {
        value
            .get(*key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn prefers_canonical_casings() {
        let user = json!({
            "UserID": "u-1",
            "id": "ignored",
            "Name": "Somchai",
            "name": "ignored",
            "Email": "somchai@x.com",
            "Picture": "https://img.example.com/p.png",
        });
        let employee = json!({ "EmployeeCode": "E01", "employee_code": "ignored" });
        let mapped = user_from_verify_payload(&user, Some(&employee));
        assert_eq!(mapped.id, "u-1");
        assert_eq!(mapped.name, "Somchai");
        assert_eq!(mapped.email, "somchai@x.com");
        assert_eq!(mapped.avatar_url.as_deref(), Some("https://img.example.com/p.png"));
        assert_eq!(mapped.employee_code.as_deref(), Some("E01"));
    }

    #[test]
    fn falls_through_lowercase_and_sub() {
        let user = json!({
            "sub": "google-sub",
            "email": "a@x.com",
            "PhotoURL": "https://img.example.com/a.png",
        });
        let employee = json!({ "employee_code": "E02" });
        let mapped = user_from_verify_payload(&user, Some(&employee));
        assert_eq!(mapped.id, "google-sub");
        // No name field at all: email stands in before the final default.
        assert_eq!(mapped.name, "a@x.com");
        assert_eq!(mapped.avatar_url.as_deref(), Some("https://img.example.com/a.png"));
        assert_eq!(mapped.employee_code.as_deref(), Some("E02"));
    }

    #[test]
    fn empty_payload_hits_defaults() {
        let mapped = user_from_verify_payload(&json!({}), None);
        assert_eq!(mapped.id, "unknown");
        assert_eq!(mapped.name, "User");
        assert_eq!(mapped.email, "");
        assert_eq!(mapped.avatar_url, None);
        assert_eq!(mapped.employee_code, None);
    }

    #[test]
    fn empty_strings_do_not_shadow_later_keys() {
        let user = json!({ "Name": "", "name": "fallback" });
        let mapped = user_from_verify_payload(&user, None);
        assert_eq!(mapped.name, "fallback");
    }
}

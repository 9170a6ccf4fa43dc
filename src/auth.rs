// src/auth.rs

use std::collections::HashMap;

use once_cell::sync::Lazy;
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::error::{AppError, Result};
use crate::model::{shifts_for_department, MANAGEABLE_UNITS};

// --- Identity registry ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    DepartmentHead,
}

/// Sentinel department membership for administrators.
pub const ALL_DEPARTMENTS: &str = "all";

#[derive(Debug, Clone)]
pub struct User {
    pub username: String,
    pub password_digest: String,
    pub role: Role,
    pub department: String,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Default principals. Cleartext passwords are digested once at startup;
/// only the digests are kept in memory.
const DEFAULT_RAW_USERS: [(&str, &str, Role, &str); 4] = [
    ("admin", "Admin@1371", Role::Admin, ALL_DEPARTMENTS),
    (
        "technicaloffice",
        "Technicaloffice@3668",
        Role::DepartmentHead,
        "دفتر فنی",
    ),
    (
        "hr",
        "Hr@9610",
        Role::DepartmentHead,
        "سرمایه های انسانی",
    ),
    (
        "production",
        "Production@1427",
        Role::DepartmentHead,
        "تولید",
    ),
];

/// Department-head memberships whose unit expansion is configured rather than
/// derived from the department's own shift table.
const SPECIAL_EXPANSIONS: [(&str, &[&str]); 2] = [
    (
        // Technical engineering supervisor spans several departments.
        "فنی مهندسی",
        &[
            "تراشکاری - شیفتی",
            "دفتر فنی - ثابت",
            "برق - ثابت",
            "برق - شیفتی",
            "مکانیک - ثابت",
            "مکانیک - شیفتی",
            "نت - ثابت",
            "تأسیسات - ثابت",
            "تأسیسات - شیفتی",
            "رؤسا و سرپرستان فنی مهندسی - ثابت",
        ],
    ),
    (
        // Human resources also allocates for managers and heads.
        "سرمایه های انسانی",
        &[
            "سرمایه های انسانی - ثابت",
            "سرمایه های انسانی - شیفتی",
            "مدیران و رؤسا - ثابت",
        ],
    ),
];

static USERS: Lazy<HashMap<String, User>> = Lazy::new(|| {
    DEFAULT_RAW_USERS
        .iter()
        .map(|(username, password, role, department)| {
            (
                username.to_string(),
                User {
                    username: username.to_string(),
                    password_digest: hash_password(password),
                    role: *role,
                    department: department.to_string(),
                },
            )
        })
        .collect()
});

/// SHA-256 digest of the cleartext, hex-encoded lowercase.
pub fn hash_password(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

// Both sides are fixed-length hex digests, so this runs in time independent
// of where they differ.
fn digests_match(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes().zip(b.bytes()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Checks the supplied credentials against the registry. Unknown usernames
/// and wrong passwords are indistinguishable to the caller.
pub fn authenticate(username: &str, password: &str) -> Result<User> {
    let user = USERS.get(username).ok_or(AppError::AuthFailed)?;
    if digests_match(&user.password_digest, &hash_password(password)) {
        Ok(user.clone())
    } else {
        Err(AppError::AuthFailed)
    }
}

/// Unit identifiers the principal may select, lexicographically sorted.
pub fn accessible_units(user: &User) -> Vec<String> {
    if user.is_admin() {
        return MANAGEABLE_UNITS.clone();
    }

    let mut units: Vec<String> = if let Some((_, expansion)) = SPECIAL_EXPANSIONS
        .iter()
        .find(|(dept, _)| *dept == user.department)
    {
        expansion.iter().map(|u| u.to_string()).collect()
    } else if let Some(shifts) = shifts_for_department(&user.department) {
        shifts
            .iter()
            .map(|shift| format!("{} - {}", user.department, shift))
            .collect()
    } else {
        warn!(
            "Department '{}' for user '{}' has no shift table entry",
            user.department, user.username
        );
        Vec::new()
    };
    units.sort();
    units
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::is_manageable_unit;

    #[test]
    fn valid_credentials_authenticate() {
        let user = authenticate("production", "Production@1427").unwrap();
        assert_eq!(user.role, Role::DepartmentHead);
        assert_eq!(user.department, "تولید");
    }

    #[test]
    fn unknown_user_and_bad_password_are_indistinguishable() {
        let unknown = authenticate("nobody", "whatever").unwrap_err();
        let wrong = authenticate("production", "wrong").unwrap_err();
        assert_eq!(unknown.to_string(), wrong.to_string());
    }

    #[test]
    fn admin_sees_the_full_manageable_set() {
        let admin = authenticate("admin", "Admin@1371").unwrap();
        let units = accessible_units(&admin);
        assert_eq!(units, *MANAGEABLE_UNITS);
        let mut sorted = units.clone();
        sorted.sort();
        assert_eq!(units, sorted);
    }

    #[test]
    fn department_head_sees_own_shift_expansion() {
        let head = authenticate("production", "Production@1427").unwrap();
        let units = accessible_units(&head);
        assert_eq!(units, vec!["تولید - ثابت", "تولید - شیفتی"]);
        assert!(units.iter().all(|u| is_manageable_unit(u)));
    }

    #[test]
    fn human_resources_expansion_includes_managers_unit() {
        let hr = authenticate("hr", "Hr@9610").unwrap();
        let units = accessible_units(&hr);
        assert!(units.contains(&"مدیران و رؤسا - ثابت".to_string()));
        assert!(units.contains(&"سرمایه های انسانی - شیفتی".to_string()));
        assert_eq!(units.len(), 3);
    }

    #[test]
    fn digest_is_lowercase_hex_sha256() {
        let digest = hash_password("Admin@1371");
        assert_eq!(digest.len(), 64);
        assert_eq!(digest, digest.to_lowercase());
    }
}

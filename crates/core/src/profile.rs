use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::validate::{self, ValidationError};

/// Branch codes offered on the registration form.
pub const BRANCHES: [&str; 14] = [
    "CSE", "IT", "ECE", "EEE", "MECH", "CIVIL", "AERO", "AUTO", "BME", "CHEM", "IOT", "AI", "DS",
    "CSBS",
];

pub const MIN_SEMESTER: u8 = 1;
pub const MAX_SEMESTER: u8 = 8;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Student,
    Teacher,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Teacher => "teacher",
            Self::Admin => "admin",
        }
    }
}

/// Profile kept by the identity provider for a registered user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
    pub email: String,
    pub admission_no: String,
    pub branch: String,
    pub semester: u8,
    #[serde(default)]
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub last_login_at: DateTime<Utc>,
    #[serde(default)]
    pub login_count: u64,
}

impl UserProfile {
    /// Record a successful sign-in.
    pub fn touch_login(&mut self, at: DateTime<Utc>) {
        self.last_login_at = at;
        self.login_count += 1;
    }
}

/// Input to registration (and to anonymous-identity upgrade).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub admission_no: String,
    pub branch: String,
    pub semester: u8,
}

impl Registration {
    /// Local validation; nothing leaves the process until this passes.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate::require("name", &self.name)?;
        if !validate::is_valid_email(&self.email) {
            return Err(ValidationError::InvalidEmail {
                email: self.email.clone(),
            });
        }
        validate::validate_password(&self.password)?;
        validate::require("admission_no", &self.admission_no)?;
        if !BRANCHES.contains(&self.branch.as_str()) {
            return Err(ValidationError::UnknownBranch {
                branch: self.branch.clone(),
            });
        }
        if !(MIN_SEMESTER..=MAX_SEMESTER).contains(&self.semester) {
            return Err(ValidationError::InvalidSemester {
                semester: self.semester,
            });
        }
        Ok(())
    }

    /// Profile for a freshly registered user.
    pub fn into_profile(self, now: DateTime<Utc>) -> UserProfile {
        UserProfile {
            name: self.name,
            email: self.email,
            admission_no: self.admission_no,
            branch: self.branch,
            semester: self.semester,
            role: Role::Student,
            created_at: now,
            last_login_at: now,
            login_count: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    fn registration() -> Registration {
        Registration {
            name: "Jane Smith".to_string(),
            email: "jane@example.edu".to_string(),
            password: "hunter22".to_string(),
            admission_no: "21CSE042".to_string(),
            branch: "CSE".to_string(),
            semester: 5,
        }
    }

    #[test]
    fn valid_registration_passes() {
        assert!(registration().validate().is_ok());
    }

    #[test]
    fn each_field_is_checked() {
        let mut r = registration();
        r.email = "not-an-email".to_string();
        assert!(matches!(
            r.validate(),
            Err(ValidationError::InvalidEmail { .. })
        ));

        let mut r = registration();
        r.password = "short".to_string();
        assert_eq!(r.validate(), Err(ValidationError::PasswordTooShort));

        let mut r = registration();
        r.branch = "MAGIC".to_string();
        assert!(matches!(
            r.validate(),
            Err(ValidationError::UnknownBranch { .. })
        ));

        let mut r = registration();
        r.semester = 9;
        assert_eq!(
            r.validate(),
            Err(ValidationError::InvalidSemester { semester: 9 })
        );

        let mut r = registration();
        r.admission_no = String::new();
        assert!(matches!(
            r.validate(),
            Err(ValidationError::MissingField { field: "admission_no" })
        ));
    }

    #[test]
    fn new_profile_counts_first_login() {
        let now = testing::timestamp(0);
        let profile = registration().into_profile(now);
        assert_eq!(profile.login_count, 1);
        assert_eq!(profile.role, Role::Student);
        assert_eq!(profile.created_at, now);
    }

    #[test]
    fn touch_login_bumps_counters() {
        let mut profile = registration().into_profile(testing::timestamp(0));
        let later = testing::timestamp(3600);
        profile.touch_login(later);
        assert_eq!(profile.login_count, 2);
        assert_eq!(profile.last_login_at, later);
    }
}

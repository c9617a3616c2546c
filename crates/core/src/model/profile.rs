use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::UserId;

/// Profile row kept by the identity backend, keyed on the user id.
///
/// Name and email columns are stored `NOT NULL DEFAULT ''`; an empty string
/// means the field was never filled in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: UserId,
    pub first_name: String,
    pub full_name: String,
    pub email: String,
    pub date_of_birth: Option<String>,
}

impl Profile {
    #[must_use]
    pub fn empty(user_id: UserId) -> Self {
        Self {
            user_id,
            first_name: String::new(),
            full_name: String::new(),
            email: String::new(),
            date_of_birth: None,
        }
    }

    /// Preferred display name: explicit first name, else the first token of
    /// the full name.
    #[must_use]
    pub fn display_first_name(&self) -> Option<&str> {
        let first = self.first_name.trim();
        if !first.is_empty() {
            return Some(first);
        }
        self.full_name.split_whitespace().next()
    }
}

/// Which form field a signup validation error belongs to, for inline display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignupField {
    Name,
    Email,
    Password,
    DateOfBirth,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SignupError {
    #[error("Enter your first and last name.")]
    Name,

    #[error("Enter a valid email address.")]
    Email,

    #[error("Password must be >6 characters and include a special character.")]
    Password,

    #[error("Use MM/DD/YYYY and a real calendar date.")]
    DateOfBirth,
}

impl SignupError {
    #[must_use]
    pub fn field(&self) -> SignupField {
        match self {
            SignupError::Name => SignupField::Name,
            SignupError::Email => SignupField::Email,
            SignupError::Password => SignupField::Password,
            SignupError::DateOfBirth => SignupField::DateOfBirth,
        }
    }
}

/// Raw signup input, validated client-side before anything reaches the
/// backend. Invalid fields block submission entirely.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignupForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub date_of_birth: String,
}

impl SignupForm {
    /// Validates every field and collects all failures at once, so the form
    /// can show each inline error in a single pass.
    ///
    /// # Errors
    ///
    /// Returns one `SignupError` per invalid field.
    pub fn validate(&self) -> Result<(), Vec<SignupError>> {
        let mut errors = Vec::new();
        if !name_is_valid(&self.name) {
            errors.push(SignupError::Name);
        }
        if !email_is_valid(&self.email) {
            errors.push(SignupError::Email);
        }
        if !password_is_valid(&self.password) {
            errors.push(SignupError::Password);
        }
        if !dob_is_valid(&self.date_of_birth) {
            errors.push(SignupError::DateOfBirth);
        }
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Requires at least first + last name: alphabetic words joined by a single
/// space, hyphen, or apostrophe.
#[must_use]
pub fn name_is_valid(name: &str) -> bool {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return false;
    }
    let mut words = 0usize;
    let mut prev_was_sep = true;
    for c in trimmed.chars() {
        if c.is_ascii_alphabetic() {
            if prev_was_sep {
                words += 1;
            }
            prev_was_sep = false;
        } else if matches!(c, ' ' | '-' | '\'') {
            if prev_was_sep {
                return false; // double separator or leading separator
            }
            prev_was_sep = true;
        } else {
            return false;
        }
    }
    words >= 2 && !prev_was_sep
}

/// Shape check only: `local@domain.tld` with no whitespace.
#[must_use]
pub fn email_is_valid(email: &str) -> bool {
    let trimmed = email.trim();
    let Some((local, domain)) = trimmed.split_once('@') else {
        return false;
    };
    let part_ok = |s: &str| !s.is_empty() && !s.chars().any(|c| c.is_whitespace() || c == '@');
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };
    part_ok(local) && part_ok(host) && part_ok(tld)
}

/// More than six characters and at least one non-alphanumeric.
#[must_use]
pub fn password_is_valid(password: &str) -> bool {
    password.len() > 6 && password.chars().any(|c| !c.is_ascii_alphanumeric())
}

/// `MM/DD/YYYY`, a real calendar date, year strictly between 1900 and 2100.
#[must_use]
pub fn dob_is_valid(dob: &str) -> bool {
    let bytes = dob.as_bytes();
    if bytes.len() != 10 || bytes[2] != b'/' || bytes[5] != b'/' {
        return false;
    }
    let digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    let (mm, dd, yyyy) = (&dob[0..2], &dob[3..5], &dob[6..10]);
    if !digits(mm) || !digits(dd) || !digits(yyyy) {
        return false;
    }
    let (Ok(month), Ok(day), Ok(year)) = (mm.parse::<u32>(), dd.parse::<u32>(), yyyy.parse::<i32>())
    else {
        return false;
    };
    if !(1901..=2099).contains(&year) {
        return false;
    }
    chrono::NaiveDate::from_ymd_opt(year, month, day).is_some()
}

/// Progressively formats digit input into `MM/DD/YYYY` while typing.
///
/// Non-digits are stripped, input is capped at eight digits, and slashes
/// appear as soon as a group is complete.
#[must_use]
pub fn format_dob(value: &str) -> String {
    let digits: String = value.chars().filter(char::is_ascii_digit).take(8).collect();
    match digits.len() {
        0..=2 => digits,
        3..=4 => format!("{}/{}", &digits[0..2], &digits[2..]),
        _ => format!("{}/{}/{}", &digits[0..2], &digits[2..4], &digits[4..]),
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn name_requires_first_and_last() {
        assert!(name_is_valid("Joe Longo"));
        assert!(name_is_valid("Mary-Jane O'Brien"));
        assert!(!name_is_valid("Joe"));
        assert!(!name_is_valid("Joe  Longo")); // double space
        assert!(name_is_valid("Joe Longo ")); // trailing space trims away
        assert!(!name_is_valid("Joe L0ngo"));
    }

    #[test]
    fn email_shape() {
        assert!(email_is_valid("tech@example.com"));
        assert!(email_is_valid(" tech@mail.example.co "));
        assert!(!email_is_valid("tech@example"));
        assert!(!email_is_valid("tech example.com"));
        assert!(!email_is_valid("@example.com"));
        assert!(!email_is_valid("tech@.com"));
    }

    #[test]
    fn password_needs_length_and_special() {
        assert!(password_is_valid("secret7!"));
        assert!(!password_is_valid("short!"));
        assert!(!password_is_valid("longbutplain"));
    }

    #[test]
    fn dob_requires_real_dates() {
        assert!(dob_is_valid("02/29/2024")); // leap year
        assert!(!dob_is_valid("02/29/2023"));
        assert!(!dob_is_valid("13/01/2000"));
        assert!(!dob_is_valid("1/1/2000"));
        assert!(!dob_is_valid("01/01/1900"));
        assert!(!dob_is_valid("01/01/2100"));
        assert!(dob_is_valid("01/01/1901"));
    }

    #[test]
    fn dob_formats_progressively() {
        assert_eq!(format_dob("0"), "0");
        assert_eq!(format_dob("02"), "02");
        assert_eq!(format_dob("021"), "02/1");
        assert_eq!(format_dob("0214"), "02/14");
        assert_eq!(format_dob("02141"), "02/14/1");
        assert_eq!(format_dob("02141999"), "02/14/1999");
        assert_eq!(format_dob("02/14/1999"), "02/14/1999");
        assert_eq!(format_dob("021419995555"), "02/14/1999");
        assert_eq!(format_dob("ab"), "");
    }

    #[test]
    fn validate_collects_all_field_errors() {
        let form = SignupForm {
            name: "Joe".into(),
            email: "bad".into(),
            password: "weak".into(),
            date_of_birth: "99/99/9999".into(),
        };
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.len(), 4);
        assert_eq!(errors[0].field(), SignupField::Name);
    }

    #[test]
    fn valid_form_passes() {
        let form = SignupForm {
            name: "Joe Longo".into(),
            email: "joe@longo.com".into(),
            password: "cleaner#1".into(),
            date_of_birth: "03/05/1988".into(),
        };
        assert!(form.validate().is_ok());
    }

    #[test]
    fn display_name_falls_back_to_full_name_token() {
        let mut profile = Profile::empty(UserId::new(Uuid::from_u128(1)));
        assert_eq!(profile.display_first_name(), None);

        profile.full_name = "Joe Longo".into();
        assert_eq!(profile.display_first_name(), Some("Joe"));

        profile.first_name = "Joseph".into();
        assert_eq!(profile.display_first_name(), Some("Joseph"));

        // Whitespace-only first name counts as unset.
        profile.first_name = "  ".into();
        assert_eq!(profile.display_first_name(), Some("Joe"));
    }
}

/*!
 * Database entity models and DTOs.
 *
 * These structures map directly to database tables and provide
 * type-safe access to persisted data. Query shapes (`StudentFilter`) and
 * write payloads (`StudentRecord`, `NewComment`) are kept apart so each call
 * only carries the fields it uses.
 */

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// Grade point average stored with two fractional digits.
///
/// Held as hundredths so comparisons and equality are exact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Gpa(i64);

impl Gpa {
    /// The "no threshold" value
    pub const ZERO: Gpa = Gpa(0);

    /// Upper bound of the usual 4-point scale
    pub const MAX: Gpa = Gpa(400);

    /// Build from a count of hundredths (e.g. 345 is 3.45)
    pub const fn from_hundredths(hundredths: i64) -> Self {
        Self(hundredths)
    }

    /// The value in hundredths
    pub const fn hundredths(self) -> i64 {
        self.0
    }

    /// Whether this is the default zero value
    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Lossy conversion for display and serialization
    pub fn as_f64(self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl fmt::Display for Gpa {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

impl FromStr for Gpa {
    type Err = anyhow::Error;

    /// Parses decimal text such as `3`, `3.5` or `3.45`; more than two
    /// fractional digits is rejected rather than rounded.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        let (whole, fraction) = digits.split_once('.').unwrap_or((digits, ""));

        let valid = |part: &str| part.chars().all(|c| c.is_ascii_digit());
        if whole.is_empty() && fraction.is_empty()
            || !valid(whole)
            || !valid(fraction)
            || fraction.len() > 2
        {
            return Err(anyhow::anyhow!("Invalid GPA: {}", s));
        }

        let whole: i64 = if whole.is_empty() { 0 } else { whole.parse()? };
        let fraction: i64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<i64>()? * 10,
            _ => fraction.parse()?,
        };
        let value = whole
            .checked_mul(100)
            .and_then(|v| v.checked_add(fraction))
            .ok_or_else(|| anyhow::anyhow!("Invalid GPA: {}", s))?;

        Ok(Self(if negative { -value } else { value }))
    }
}

impl TryFrom<f64> for Gpa {
    type Error = String;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if !value.is_finite() {
            return Err(format!("Invalid GPA: {}", value));
        }
        Ok(Self((value * 100.0).round() as i64))
    }
}

impl From<Gpa> for f64 {
    fn from(gpa: Gpa) -> Self {
        gpa.as_f64()
    }
}

/// Student profile with its comments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    /// Database ID
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub expected_graduation: NaiveDate,
    /// Free-text major, empty when undeclared
    pub major: String,
    pub gpa: Gpa,
    /// Optimistic concurrency token, bumped on every update
    pub version: i64,
    /// Newest first; empty unless loaded through a by-id lookup
    #[serde(default)]
    pub comments: Vec<Comment>,
}

impl Student {
    /// Graduation date as shown to recruiters, e.g. "May 2024"
    pub fn graduation_formatted(&self) -> String {
        self.expected_graduation.format("%B %Y").to_string()
    }

    /// "First Last"
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Editable payload for this student, carrying the current version
    pub fn to_record(&self) -> StudentRecord {
        StudentRecord {
            id: self.id,
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            expected_graduation: self.expected_graduation,
            major: self.major.clone(),
            gpa: self.gpa,
            version: self.version,
        }
    }
}

/// Author of a comment, resolved from the users table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentAuthor {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
}

impl CommentAuthor {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Recruiter comment on a student
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    /// Database ID
    pub id: i64,
    /// Owning student
    pub student_id: i64,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub author: CommentAuthor,
}

/// Search fields for listing students.
///
/// Empty strings count as "not set" and a zero GPA threshold disables the
/// GPA filter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudentFilter {
    /// Case-insensitive substring of the first name
    #[serde(default)]
    pub first_name: Option<String>,
    /// Exact major
    #[serde(default)]
    pub major: Option<String>,
    /// Students must have a GPA strictly above this
    #[serde(default)]
    pub minimum_gpa: Gpa,
}

impl StudentFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_first_name(mut self, first_name: impl Into<String>) -> Self {
        self.first_name = Some(first_name.into());
        self
    }

    pub fn with_major(mut self, major: impl Into<String>) -> Self {
        self.major = Some(major.into());
        self
    }

    pub fn with_minimum_gpa(mut self, minimum_gpa: Gpa) -> Self {
        self.minimum_gpa = minimum_gpa;
        self
    }

    /// First-name search term, if one is set
    pub fn first_name_term(&self) -> Option<&str> {
        self.first_name.as_deref().filter(|s| !s.is_empty())
    }

    /// Major to match exactly, if one is set
    pub fn major_term(&self) -> Option<&str> {
        self.major.as_deref().filter(|s| !s.is_empty())
    }

    /// GPA threshold, if one is set
    pub fn gpa_threshold(&self) -> Option<Gpa> {
        (!self.minimum_gpa.is_zero()).then_some(self.minimum_gpa)
    }

    /// Whether no filter is active
    pub fn is_empty(&self) -> bool {
        self.first_name_term().is_none() && self.major_term().is_none() && self.gpa_threshold().is_none()
    }

    /// Whether the given student passes every active filter
    pub fn matches(&self, student: &Student) -> bool {
        if let Some(term) = self.first_name_term() {
            if !student
                .first_name
                .to_lowercase()
                .contains(&term.to_lowercase())
            {
                return false;
            }
        }

        if let Some(major) = self.major_term() {
            if student.major != major {
                return false;
            }
        }

        if let Some(threshold) = self.gpa_threshold() {
            if student.gpa <= threshold {
                return false;
            }
        }

        true
    }
}

/// Full student payload for inserts and updates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentRecord {
    /// Ignored on insert
    #[serde(default)]
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub expected_graduation: NaiveDate,
    #[serde(default)]
    pub major: String,
    #[serde(default)]
    pub gpa: Gpa,
    /// Version the caller last saw; ignored on insert
    #[serde(default)]
    pub version: i64,
}

impl StudentRecord {
    /// Create a new student record (without database ID)
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            id: 0, // Will be assigned by database
            first_name: first_name.into(),
            last_name: last_name.into(),
            expected_graduation: NaiveDate::default(),
            major: String::new(),
            gpa: Gpa::ZERO,
            version: 0,
        }
    }

    pub fn with_major(mut self, major: impl Into<String>) -> Self {
        self.major = major.into();
        self
    }

    pub fn with_gpa(mut self, gpa: Gpa) -> Self {
        self.gpa = gpa;
        self
    }

    pub fn graduating(mut self, expected_graduation: NaiveDate) -> Self {
        self.expected_graduation = expected_graduation;
        self
    }
}

/// Result of a list call: matches plus the selector data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentListing {
    /// Matching students in id order, comments not loaded
    pub students: Vec<Student>,
    /// Every distinct non-empty major in the store, alphabetical
    pub majors: Vec<String>,
    /// The filter that produced this listing
    pub filter: StudentFilter,
}

/// Payload for adding a comment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewComment {
    pub student_id: i64,
    pub text: String,
    pub created_at: DateTime<Utc>,
    /// Authoring user
    pub author_id: i64,
}

impl NewComment {
    pub fn new(student_id: i64, author_id: i64, text: impl Into<String>) -> Self {
        Self {
            student_id,
            text: text.into(),
            created_at: Utc::now(),
            author_id,
        }
    }

    pub fn at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }
}

/// Recruiter account attributes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Database ID
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub company_title: String,
}

impl User {
    /// Create a new user (without database ID)
    pub fn new(
        email: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        Self {
            id: 0, // Will be assigned by database
            email: email.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            company_name: String::new(),
            company_title: String::new(),
        }
    }

    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Password credential linked to a user by id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserCredential {
    pub user_id: i64,
    /// Hex SHA-256 of salt followed by password
    pub password_hash: String,
    pub salt: String,
    pub created_at: DateTime<Utc>,
}

impl UserCredential {
    /// Salted SHA256 of a password, hex encoded
    pub fn hash_password(salt: &str, password: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(salt.as_bytes());
        hasher.update(password.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Whether `password` hashes to the stored value
    pub fn matches(&self, password: &str) -> bool {
        Self::hash_password(&self.salt, password) == self.password_hash
    }
}

/*!
 * Initial data for an empty store.
 *
 * `initialize` is idempotent: recruiter accounts are created only when the
 * users table is empty and the student dataset is loaded only when the
 * students table is empty. Running it against a populated store changes
 * nothing. Guarding against running it more than once per deployment is
 * left to `scripts/init-db.sh`.
 */

use chrono::NaiveDate;
use log::{debug, info};
use serde::Deserialize;
use std::io::Read;

use crate::app_config::SeedConfig;
use crate::database::models::{Gpa, StudentRecord, User};
use crate::database::Repository;
use crate::errors::AppError;

/// Dataset used when no CSV path is configured
const BUNDLED_STUDENTS: &str = include_str!("../data/students.csv");

/// Date layouts accepted in the `ExpectedGraduation` column
const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%m/%d/%Y"];

/// What a seeding run inserted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub users_created: usize,
    pub students_created: usize,
}

impl SeedReport {
    /// Whether the run found both tables already populated
    pub fn is_noop(&self) -> bool {
        self.users_created == 0 && self.students_created == 0
    }
}

impl std::fmt::Display for SeedReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} user(s) and {} student(s) created",
            self.users_created, self.students_created
        )
    }
}

/// One line of the student dataset. The leading `Id` column is not read;
/// the store assigns ids.
#[derive(Debug, Deserialize)]
struct StudentRow {
    #[serde(rename = "FirstName")]
    first_name: String,
    #[serde(rename = "LastName")]
    last_name: String,
    #[serde(rename = "ExpectedGraduation")]
    expected_graduation: String,
    #[serde(rename = "Major", default)]
    major: String,
    #[serde(rename = "GPA")]
    gpa: String,
}

impl StudentRow {
    fn into_record(self, line: u64) -> Result<StudentRecord, AppError> {
        let expected_graduation = parse_graduation(&self.expected_graduation).ok_or_else(|| {
            AppError::Seed(format!(
                "line {}: unrecognised date '{}'",
                line, self.expected_graduation
            ))
        })?;
        let gpa: Gpa = self
            .gpa
            .parse()
            .map_err(|e| AppError::Seed(format!("line {}: {}", line, e)))?;

        Ok(StudentRecord::new(self.first_name.trim(), self.last_name.trim())
            .with_major(self.major.trim())
            .with_gpa(gpa)
            .graduating(expected_graduation))
    }
}

/// Parse a graduation date in any accepted layout
pub fn parse_graduation(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
}

/// Read student records from CSV with a header row
pub fn parse_students<R: Read>(reader: R) -> Result<Vec<StudentRecord>, AppError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();

    let mut records = Vec::new();
    for result in csv_reader.records() {
        let raw = result?;
        let line = raw.position().map(|p| p.line()).unwrap_or_default();
        let row: StudentRow = raw.deserialize(Some(&headers))?;
        records.push(row.into_record(line)?);
    }

    Ok(records)
}

/// Load the configured dataset, or the bundled one
pub fn load_students(config: &SeedConfig) -> Result<Vec<StudentRecord>, AppError> {
    match &config.students_csv {
        Some(path) => {
            debug!("Reading seed students from {}", path.display());
            let file = std::fs::File::open(path).map_err(|e| {
                AppError::File(format!("Failed to open {}: {}", path.display(), e))
            })?;
            parse_students(file)
        }
        None => parse_students(BUNDLED_STUDENTS.as_bytes()),
    }
}

/// Seed users and students into empty tables
pub async fn initialize(repo: &Repository, config: &SeedConfig) -> Result<SeedReport, AppError> {
    let mut report = SeedReport::default();

    if repo.count_users().await? == 0 {
        for (user, password) in seed_users(config) {
            repo.insert_user(&user, &password).await?;
            report.users_created += 1;
        }
    } else {
        debug!("Users already present, skipping user seed");
    }

    if repo.count_students().await? == 0 {
        let records = load_students(config)?;
        report.students_created = repo.insert_students(records).await?;
    } else {
        debug!("Students already present, skipping student seed");
    }

    info!("Seeding finished: {}", report);
    Ok(report)
}

/// Configured seed accounts as user records paired with their passwords
fn seed_users(config: &SeedConfig) -> Vec<(User, String)> {
    config
        .users
        .iter()
        .map(|seed| {
            let mut user = User::new(seed.email.trim(), &seed.first_name, &seed.last_name);
            user.company_name = seed.company_name.clone();
            user.company_title = seed.company_title.clone();
            (user, seed.password.clone())
        })
        .collect()
}

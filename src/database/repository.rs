/*!
 * Repository layer for database operations.
 *
 * This module provides a high-level API for all database operations,
 * abstracting away the SQL details and providing type-safe access.
 * `StudentRepository` is the seam the controller talks to; `Repository`
 * is its SQLite implementation and also carries the user/credential
 * operations used by seeding and comment authorship.
 */

use async_trait::async_trait;
use chrono::Utc;
use log::{debug, info, warn};
use rusqlite::{Connection, OptionalExtension, params, params_from_iter, types::Value};
use uuid::Uuid;

use super::connection::DatabaseConnection;
use super::models::{
    Comment, CommentAuthor, Gpa, NewComment, Student, StudentFilter, StudentListing,
    StudentRecord, User, UserCredential,
};
use crate::errors::RepositoryError;

/// Result type for repository operations
pub type RepoResult<T> = std::result::Result<T, RepositoryError>;

/// Operations the application performs on student records.
///
/// Reads report a missing record as `None`; lookup-then-act writes report it
/// as `RepositoryError::NotFound`, except `update_student` which treats both
/// a missing record and a lost optimistic-concurrency race as a no-op.
#[async_trait]
pub trait StudentRepository: Send + Sync {
    /// List students matching the filter, plus every major in the store
    async fn list_students(&self, filter: &StudentFilter) -> RepoResult<StudentListing>;

    /// Fetch one student with comments loaded newest first
    async fn get_student_by_id(&self, id: i64) -> RepoResult<Option<Student>>;

    /// Persist a new student; the record's id and version are ignored
    async fn insert_student(&self, record: &StudentRecord) -> RepoResult<Student>;

    /// Overwrite a student's fields if `record.version` is still current.
    ///
    /// Returns the record with its new version on success. When the student
    /// is gone, or was changed by someone else since `record.version`, the
    /// input is returned unchanged and nothing is written.
    async fn update_student(&self, record: &StudentRecord) -> RepoResult<StudentRecord>;

    /// Remove a student and all of its comments in one transaction
    async fn delete_student(&self, id: i64) -> RepoResult<()>;

    /// Add a comment to an existing student
    async fn insert_comment(&self, comment: &NewComment) -> RepoResult<Comment>;

    /// Remove a comment; returns false if there was nothing to remove
    async fn delete_comment(&self, id: i64) -> RepoResult<bool>;

    /// Whether a student with this id exists
    async fn student_exists(&self, id: i64) -> RepoResult<bool>;
}

/// How an optimistic update ended
#[derive(Debug, Clone, PartialEq)]
enum UpdateOutcome {
    Updated(StudentRecord),
    Missing,
    Conflict { current_version: i64 },
}

/// Repository for database operations
#[derive(Clone)]
pub struct Repository {
    /// Database connection
    db: DatabaseConnection,
}

const STUDENT_COLUMNS: &str =
    "id, first_name, last_name, expected_graduation, major, gpa_hundredths, version";

impl Repository {
    /// Create a new repository with the given database connection
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Create a repository with the default database location
    pub fn new_default() -> anyhow::Result<Self> {
        let db = DatabaseConnection::new_default()?;
        Ok(Self::new(db))
    }

    /// Create a repository over the database at `path` (`:memory:` allowed)
    pub fn open<P: AsRef<std::path::Path>>(path: P) -> anyhow::Result<Self> {
        let db = DatabaseConnection::open(path)?;
        Ok(Self::new(db))
    }

    /// Create a repository with an in-memory database (for testing)
    pub fn new_in_memory() -> anyhow::Result<Self> {
        let db = DatabaseConnection::new_in_memory()?;
        Ok(Self::new(db))
    }

    /// The underlying connection
    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    // =========================================================================
    // Row mapping
    // =========================================================================

    fn parse_student_row(row: &rusqlite::Row) -> rusqlite::Result<Student> {
        Ok(Student {
            id: row.get(0)?,
            first_name: row.get(1)?,
            last_name: row.get(2)?,
            expected_graduation: row.get(3)?,
            major: row.get(4)?,
            gpa: Gpa::from_hundredths(row.get(5)?),
            version: row.get(6)?,
            comments: Vec::new(),
        })
    }

    fn parse_user_row(row: &rusqlite::Row) -> rusqlite::Result<User> {
        Ok(User {
            id: row.get(0)?,
            email: row.get(1)?,
            first_name: row.get(2)?,
            last_name: row.get(3)?,
            company_name: row.get(4)?,
            company_title: row.get(5)?,
        })
    }

    fn student_exists_sync(conn: &Connection, id: i64) -> rusqlite::Result<bool> {
        conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM students WHERE id = ?1)",
            [id],
            |row| row.get(0),
        )
    }

    fn find_author_sync(conn: &Connection, user_id: i64) -> rusqlite::Result<Option<CommentAuthor>> {
        conn.query_row(
            "SELECT id, first_name, last_name FROM users WHERE id = ?1",
            [user_id],
            |row| {
                Ok(CommentAuthor {
                    id: row.get(0)?,
                    first_name: row.get(1)?,
                    last_name: row.get(2)?,
                })
            },
        )
        .optional()
    }

    /// Load a student and its comments (synchronous version for use within transactions)
    fn get_student_sync(conn: &Connection, id: i64) -> rusqlite::Result<Option<Student>> {
        let student = conn
            .query_row(
                &format!("SELECT {} FROM students WHERE id = ?1", STUDENT_COLUMNS),
                [id],
                Self::parse_student_row,
            )
            .optional()?;

        let Some(mut student) = student else {
            return Ok(None);
        };

        let mut stmt = conn.prepare(
            r#"
            SELECT c.id, c.student_id, c.text, c.created_at,
                   u.id, u.first_name, u.last_name
            FROM comments c
            INNER JOIN users u ON u.id = c.author_id
            WHERE c.student_id = ?1
            ORDER BY c.created_at DESC, c.id DESC
            "#,
        )?;

        student.comments = stmt
            .query_map([id], |row| {
                Ok(Comment {
                    id: row.get(0)?,
                    student_id: row.get(1)?,
                    text: row.get(2)?,
                    created_at: row.get(3)?,
                    author: CommentAuthor {
                        id: row.get(4)?,
                        first_name: row.get(5)?,
                        last_name: row.get(6)?,
                    },
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(Some(student))
    }

    // =========================================================================
    // Student Operations
    // =========================================================================

    async fn try_update_student(&self, record: &StudentRecord) -> RepoResult<UpdateOutcome> {
        let record = record.clone();

        let outcome = self
            .db
            .transaction_async(move |tx| {
                let changed = tx.execute(
                    r#"
                    UPDATE students
                    SET first_name = ?1, last_name = ?2, expected_graduation = ?3,
                        major = ?4, gpa_hundredths = ?5, version = version + 1
                    WHERE id = ?6 AND version = ?7
                    "#,
                    params![
                        record.first_name,
                        record.last_name,
                        record.expected_graduation,
                        record.major,
                        record.gpa.hundredths(),
                        record.id,
                        record.version,
                    ],
                )?;

                if changed == 1 {
                    return Ok(UpdateOutcome::Updated(StudentRecord {
                        version: record.version + 1,
                        ..record
                    }));
                }

                // Nothing matched: either the row is gone or its version moved on
                let current_version: Option<i64> = tx
                    .query_row(
                        "SELECT version FROM students WHERE id = ?1",
                        [record.id],
                        |row| row.get(0),
                    )
                    .optional()?;

                Ok(match current_version {
                    Some(current_version) => UpdateOutcome::Conflict { current_version },
                    None => UpdateOutcome::Missing,
                })
            })
            .await?;

        Ok(outcome)
    }

    /// Number of students in the store
    pub async fn count_students(&self) -> RepoResult<i64> {
        let count = self
            .db
            .execute_async(|conn| {
                Ok(conn.query_row("SELECT COUNT(*) FROM students", [], |row| row.get(0))?)
            })
            .await?;
        Ok(count)
    }

    /// Insert many students in one transaction (used for seeding)
    pub async fn insert_students(&self, records: Vec<StudentRecord>) -> RepoResult<usize> {
        let inserted = self
            .db
            .transaction_async(move |tx| {
                let mut stmt = tx.prepare(
                    r#"
                    INSERT INTO students (first_name, last_name, expected_graduation, major, gpa_hundredths, version)
                    VALUES (?1, ?2, ?3, ?4, ?5, 1)
                    "#,
                )?;
                for record in &records {
                    stmt.execute(params![
                        record.first_name,
                        record.last_name,
                        record.expected_graduation,
                        record.major,
                        record.gpa.hundredths(),
                    ])?;
                }
                Ok(records.len())
            })
            .await?;
        Ok(inserted)
    }

    // =========================================================================
    // User Operations
    // =========================================================================

    /// Create a user and its credential record
    pub async fn insert_user(&self, user: &User, password: &str) -> RepoResult<User> {
        let user = user.clone();
        let salt = Uuid::new_v4().simple().to_string();
        let password_hash = UserCredential::hash_password(&salt, password);
        let created_at = Utc::now();

        let saved = self
            .db
            .transaction_async(move |tx| {
                tx.execute(
                    r#"
                    INSERT INTO users (email, first_name, last_name, company_name, company_title)
                    VALUES (?1, ?2, ?3, ?4, ?5)
                    "#,
                    params![
                        user.email,
                        user.first_name,
                        user.last_name,
                        user.company_name,
                        user.company_title,
                    ],
                )?;
                let id = tx.last_insert_rowid();

                tx.execute(
                    r#"
                    INSERT INTO user_credentials (user_id, password_hash, salt, created_at)
                    VALUES (?1, ?2, ?3, ?4)
                    "#,
                    params![id, password_hash, salt, created_at],
                )?;

                Ok(User { id, ..user })
            })
            .await?;

        debug!("Created user {} ({})", saved.id, saved.email);
        Ok(saved)
    }

    /// Look a user up by email, ignoring case
    pub async fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let email = email.trim().to_string();

        let user = self
            .db
            .execute_async(move |conn| {
                Ok(conn
                    .query_row(
                        r#"
                        SELECT id, email, first_name, last_name, company_name, company_title
                        FROM users WHERE email = ?1
                        "#,
                        [&email],
                        Self::parse_user_row,
                    )
                    .optional()?)
            })
            .await?;
        Ok(user)
    }

    /// Return the user if the password matches their stored credential
    pub async fn verify_credentials(&self, email: &str, password: &str) -> RepoResult<Option<User>> {
        let email = email.trim().to_string();
        let password = password.to_string();

        let user = self
            .db
            .execute_async(move |conn| {
                let found = conn
                    .query_row(
                        r#"
                        SELECT u.id, u.email, u.first_name, u.last_name, u.company_name, u.company_title,
                               c.user_id, c.password_hash, c.salt, c.created_at
                        FROM users u
                        INNER JOIN user_credentials c ON c.user_id = u.id
                        WHERE u.email = ?1
                        "#,
                        [&email],
                        |row| {
                            let credential = UserCredential {
                                user_id: row.get(6)?,
                                password_hash: row.get(7)?,
                                salt: row.get(8)?,
                                created_at: row.get(9)?,
                            };
                            Ok((Self::parse_user_row(row)?, credential))
                        },
                    )
                    .optional()?;

                Ok(found.and_then(|(user, credential)| {
                    credential.matches(&password).then_some(user)
                }))
            })
            .await?;
        Ok(user)
    }

    /// Number of users in the store
    pub async fn count_users(&self) -> RepoResult<i64> {
        let count = self
            .db
            .execute_async(|conn| {
                Ok(conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?)
            })
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl StudentRepository for Repository {
    async fn list_students(&self, filter: &StudentFilter) -> RepoResult<StudentListing> {
        let filter = filter.clone();

        let listing = self
            .db
            .execute_async(move |conn| {
                let mut clauses: Vec<&str> = Vec::new();
                let mut values: Vec<Value> = Vec::new();

                if let Some(major) = filter.major_term() {
                    values.push(Value::Text(major.to_string()));
                    clauses.push("major = ?");
                }
                if let Some(threshold) = filter.gpa_threshold() {
                    values.push(Value::Integer(threshold.hundredths()));
                    clauses.push("gpa_hundredths > ?");
                }

                let where_clause = if clauses.is_empty() {
                    String::new()
                } else {
                    format!("WHERE {}", clauses.join(" AND "))
                };

                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM students {} ORDER BY id",
                    STUDENT_COLUMNS, where_clause
                ))?;

                // SQLite's LIKE only folds ASCII, so the name match runs here
                let students: Vec<Student> = stmt
                    .query_map(params_from_iter(values), Self::parse_student_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?
                    .into_iter()
                    .filter(|student| filter.matches(student))
                    .collect();

                let mut stmt = conn.prepare(
                    r#"
                    SELECT MIN(major) FROM students
                    WHERE major <> ''
                    GROUP BY major COLLATE NOCASE
                    ORDER BY 1 COLLATE NOCASE
                    "#,
                )?;
                let majors = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<rusqlite::Result<Vec<String>>>()?;

                Ok(StudentListing {
                    students,
                    majors,
                    filter,
                })
            })
            .await?;

        debug!(
            "Listed {} student(s) across {} major(s)",
            listing.students.len(),
            listing.majors.len()
        );
        Ok(listing)
    }

    async fn get_student_by_id(&self, id: i64) -> RepoResult<Option<Student>> {
        let student = self
            .db
            .execute_async(move |conn| Ok(Self::get_student_sync(conn, id)?))
            .await?;
        Ok(student)
    }

    async fn insert_student(&self, record: &StudentRecord) -> RepoResult<Student> {
        let record = record.clone();

        let student = self
            .db
            .execute_async(move |conn| {
                conn.execute(
                    r#"
                    INSERT INTO students (first_name, last_name, expected_graduation, major, gpa_hundredths, version)
                    VALUES (?1, ?2, ?3, ?4, ?5, 1)
                    "#,
                    params![
                        record.first_name,
                        record.last_name,
                        record.expected_graduation,
                        record.major,
                        record.gpa.hundredths(),
                    ],
                )?;

                Ok(Student {
                    id: conn.last_insert_rowid(),
                    first_name: record.first_name,
                    last_name: record.last_name,
                    expected_graduation: record.expected_graduation,
                    major: record.major,
                    gpa: record.gpa,
                    version: 1,
                    comments: Vec::new(),
                })
            })
            .await?;

        debug!("Inserted student {}", student.id);
        Ok(student)
    }

    async fn update_student(&self, record: &StudentRecord) -> RepoResult<StudentRecord> {
        match self.try_update_student(record).await? {
            UpdateOutcome::Updated(updated) => {
                debug!("Updated student {} to version {}", updated.id, updated.version);
                Ok(updated)
            }
            UpdateOutcome::Missing => {
                debug!("Student {} no longer exists, update skipped", record.id);
                Ok(record.clone())
            }
            UpdateOutcome::Conflict { current_version } => {
                warn!(
                    "Student {} changed concurrently (expected v{}, found v{}), update skipped",
                    record.id, record.version, current_version
                );
                Ok(record.clone())
            }
        }
    }

    async fn delete_student(&self, id: i64) -> RepoResult<()> {
        let removed_comments = self
            .db
            .transaction_async(move |tx| {
                if !Self::student_exists_sync(tx, id)? {
                    return Err(RepositoryError::not_found("student", id).into());
                }

                let removed = tx.execute("DELETE FROM comments WHERE student_id = ?1", [id])?;
                tx.execute("DELETE FROM students WHERE id = ?1", [id])?;
                Ok(removed)
            })
            .await?;

        info!(
            "Deleted student {} and {} comment(s)",
            id, removed_comments
        );
        Ok(())
    }

    async fn insert_comment(&self, comment: &NewComment) -> RepoResult<Comment> {
        let comment = comment.clone();

        let saved = self
            .db
            .transaction_async(move |tx| {
                if !Self::student_exists_sync(tx, comment.student_id)? {
                    return Err(RepositoryError::not_found("student", comment.student_id).into());
                }
                let author = Self::find_author_sync(tx, comment.author_id)?
                    .ok_or_else(|| RepositoryError::not_found("user", comment.author_id))?;

                tx.execute(
                    r#"
                    INSERT INTO comments (student_id, author_id, text, created_at)
                    VALUES (?1, ?2, ?3, ?4)
                    "#,
                    params![
                        comment.student_id,
                        comment.author_id,
                        comment.text,
                        comment.created_at,
                    ],
                )?;

                Ok(Comment {
                    id: tx.last_insert_rowid(),
                    student_id: comment.student_id,
                    text: comment.text,
                    created_at: comment.created_at,
                    author,
                })
            })
            .await?;

        debug!("Added comment {} to student {}", saved.id, saved.student_id);
        Ok(saved)
    }

    async fn delete_comment(&self, id: i64) -> RepoResult<bool> {
        let removed = self
            .db
            .execute_async(move |conn| {
                Ok(conn.execute("DELETE FROM comments WHERE id = ?1", [id])?)
            })
            .await?;

        if removed == 0 {
            debug!("Comment {} not found, nothing to delete", id);
        }
        Ok(removed > 0)
    }

    async fn student_exists(&self, id: i64) -> RepoResult<bool> {
        let exists = self
            .db
            .execute_async(move |conn| Ok(Self::student_exists_sync(conn, id)?))
            .await?;
        Ok(exists)
    }
}

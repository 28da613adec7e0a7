/*!
 * Database module for persistent storage of student profiles.
 *
 * This module provides SQLite-based persistence for:
 * - Student profiles with optimistic concurrency versions
 * - Recruiter comments attached to students
 * - Recruiter accounts and their password credentials
 */

pub mod schema;
pub mod connection;
pub mod repository;
pub mod models;

// Re-export main types
pub use connection::{DatabaseConnection, DatabaseStats};
pub use repository::{RepoResult, Repository, StudentRepository};

/*!
 * # NextStep - Student Recruiting Records
 *
 * A Rust library for managing student profiles that recruiters browse,
 * filter, edit and comment on.
 *
 * ## Features
 *
 * - Filter students by first name, major and minimum GPA
 * - Recruiter comments on each profile, newest first
 * - Optimistic concurrency on profile edits
 * - Idempotent seeding from a bundled or configured CSV dataset
 * - SQLite storage with versioned schema
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `database`: SQLite persistence:
 *   - `database::connection`: Connection ownership and scoped access
 *   - `database::schema`: Table definitions and migrations
 *   - `database::repository`: The `StudentRepository` trait and its implementation
 *   - `database::models`: Stored entities and query shapes
 * - `seed`: Initial users and students for an empty store
 * - `validation`: Form checks run before the store is touched
 * - `app_controller`: Recruiter-facing actions on student profiles
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod database;
pub mod errors;
pub mod seed;
pub mod validation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::StudentsController;
pub use database::{Repository, StudentRepository};
pub use database::models::{Comment, Gpa, Student, StudentFilter, StudentListing, StudentRecord, User};
pub use errors::{AppError, RepositoryError, ValidationError};

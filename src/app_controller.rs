use log::{debug, info};

use crate::database::models::{
    Comment, NewComment, Student, StudentFilter, StudentListing, StudentRecord, User,
};
use crate::database::StudentRepository;
use crate::errors::{AppError, RepositoryError};
use crate::validation;

// @module: Application controller for student records

/// Actions a signed-in recruiter can take on student profiles.
///
/// Each action validates its input, then hands off to the repository. A
/// rejected form returns `AppError::Validation` without touching the store.
pub struct StudentsController<R: StudentRepository> {
    // @field: Backing store
    repository: R,
}

impl<R: StudentRepository> StudentsController<R> {
    // @method: Create a controller over the given repository
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    /// The repository this controller writes to
    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Students matching the filter, with the majors for the filter picker
    pub async fn index(&self, filter: &StudentFilter) -> Result<StudentListing, AppError> {
        Ok(self.repository.list_students(filter).await?)
    }

    /// One student with comments
    pub async fn details(&self, id: i64) -> Result<Student, AppError> {
        self.repository
            .get_student_by_id(id)
            .await?
            .ok_or_else(|| RepositoryError::not_found("student", id).into())
    }

    /// Validate and store a new student
    pub async fn create(&self, record: &StudentRecord) -> Result<Student, AppError> {
        validation::validate_student(record)?;

        let student = self.repository.insert_student(record).await?;
        info!("Created student {} ({})", student.id, student.full_name());
        Ok(student)
    }

    /// Validate and apply an edit to student `id`.
    ///
    /// The id in the route must match the record's id. The returned record
    /// carries the new version when the edit was applied, or is the input
    /// unchanged when the student was deleted or edited by someone else in
    /// the meantime.
    pub async fn edit(&self, id: i64, record: &StudentRecord) -> Result<StudentRecord, AppError> {
        if id != record.id {
            debug!("Edit route id {} does not match record id {}", id, record.id);
            return Err(RepositoryError::not_found("student", id).into());
        }

        validation::validate_student(record)?;

        Ok(self.repository.update_student(record).await?)
    }

    /// Delete a student and its comments
    pub async fn delete(&self, id: i64) -> Result<(), AppError> {
        self.repository.delete_student(id).await?;
        Ok(())
    }

    /// Add a comment to a student, stamped now and attributed to `author`
    pub async fn add_comment(
        &self,
        student_id: i64,
        text: &str,
        author: &User,
    ) -> Result<Comment, AppError> {
        validation::validate_comment(text)?;

        let comment = NewComment::new(student_id, author.id, text);
        let saved = self.repository.insert_comment(&comment).await?;
        info!(
            "{} commented on student {}",
            saved.author.display_name(),
            student_id
        );
        Ok(saved)
    }

    /// Remove a comment; false if it was already gone
    pub async fn delete_comment(&self, comment_id: i64) -> Result<bool, AppError> {
        Ok(self.repository.delete_comment(comment_id).await?)
    }
}

/*!
 * Integration tests for the SQLite student repository
 */

use chrono::{Duration, TimeZone, Utc};
use nextstep::database::models::NewComment;
use nextstep::{RepositoryError, StudentFilter, StudentRepository};

use crate::common;

#[tokio::test]
async fn test_insertStudent_thenGetById_shouldReturnSameFields() {
    let repo = common::test_repository();
    let record = common::student_record("Test", "Insert");

    let inserted = repo.insert_student(&record).await.unwrap();
    let fetched = repo.get_student_by_id(inserted.id).await.unwrap().unwrap();

    assert_eq!(fetched.first_name, record.first_name);
    assert_eq!(fetched.last_name, "Insert");
    assert_eq!(fetched.expected_graduation, record.expected_graduation);
    assert_eq!(fetched.major, record.major);
    assert_eq!(fetched.gpa, record.gpa);
    assert!(fetched.comments.is_empty());
}

#[tokio::test]
async fn test_updateStudent_thenGetById_shouldShowNewLastName() {
    let repo = common::test_repository();
    let student = repo
        .insert_student(&common::student_record("Test", "Update"))
        .await
        .unwrap();

    let mut record = student.to_record();
    record.last_name = "Update_Update".to_string();
    repo.update_student(&record).await.unwrap();

    let fetched = repo.get_student_by_id(student.id).await.unwrap().unwrap();
    assert_eq!(fetched.last_name, "Update_Update");
}

#[tokio::test]
async fn test_updateStudent_withUnknownId_shouldReturnPayloadAndCreateNothing() {
    let repo = common::test_repository();
    let mut record = common::student_record("Ghost", "Student");
    record.id = 500;
    record.version = 1;

    let returned = repo.update_student(&record).await.unwrap();

    assert_eq!(returned, record);
    assert_eq!(repo.count_students().await.unwrap(), 0);
    assert!(repo.get_student_by_id(500).await.unwrap().is_none());
}

#[tokio::test]
async fn test_concurrentEdits_secondWriterShouldBeNoOp() {
    let repo = common::test_repository();
    let student = repo
        .insert_student(&common::student_record("Race", "Condition"))
        .await
        .unwrap();

    // Both recruiters opened the edit form at version 1
    let mut first = student.to_record();
    first.major = "Finance".to_string();
    let mut second = student.to_record();
    second.major = "Nursing".to_string();

    let (a, b) = tokio::join!(repo.update_student(&first), repo.update_student(&second));
    let (a, b) = (a.unwrap(), b.unwrap());

    // Exactly one edit is applied
    assert_eq!([a.version, b.version].iter().filter(|v| **v == 2).count(), 1);
    let fetched = repo.get_student_by_id(student.id).await.unwrap().unwrap();
    assert_eq!(fetched.version, 2);
    assert!(fetched.major == "Finance" || fetched.major == "Nursing");
}

#[tokio::test]
async fn test_deleteStudent_thenGetById_shouldReturnNone() {
    let repo = common::test_repository();
    let student = repo
        .insert_student(&common::student_record("Test", "Delete"))
        .await
        .unwrap();

    repo.delete_student(student.id).await.unwrap();

    assert!(repo.get_student_by_id(student.id).await.unwrap().is_none());
    assert!(!repo.student_exists(student.id).await.unwrap());
}

#[tokio::test]
async fn test_deleteStudent_withComments_shouldRemoveThemToo() {
    let repo = common::test_repository();
    let author = common::insert_recruiter(&repo).await;
    let keep = repo.insert_student(&common::student_record("Keep", "Me")).await.unwrap();
    let removed = repo.insert_student(&common::student_record("Drop", "Me")).await.unwrap();
    for text in ["first", "second"] {
        repo.insert_comment(&NewComment::new(removed.id, author.id, text)).await.unwrap();
    }
    repo.insert_comment(&NewComment::new(keep.id, author.id, "stays")).await.unwrap();

    repo.delete_student(removed.id).await.unwrap();

    let stats = repo.connection().stats().unwrap();
    assert_eq!(stats.comment_count, 1);
    assert_eq!(stats.student_count, 1);
    let kept = repo.get_student_by_id(keep.id).await.unwrap().unwrap();
    assert_eq!(kept.comments.len(), 1);
}

#[tokio::test]
async fn test_deleteStudent_withUnknownId_shouldBeNotFound() {
    let repo = common::test_repository();
    let err = repo.delete_student(-1).await.unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound { entity: "student", .. }));
}

#[tokio::test]
async fn test_getStudentById_withUnknownId_shouldReturnNone() {
    let repo = common::test_repository();
    assert!(repo.get_student_by_id(-1).await.unwrap().is_none());
}

#[tokio::test]
async fn test_listStudents_byFirstName_shouldReturnAllThreeInIdOrder() {
    let repo = common::test_repository();
    let seeded = common::insert_test_students(&repo).await;
    repo.insert_student(&common::student_record("Other", "Person")).await.unwrap();

    let listing = repo
        .list_students(&StudentFilter::new().with_first_name("Test"))
        .await
        .unwrap();

    let ids: Vec<i64> = listing.students.iter().map(|s| s.id).collect();
    let expected: Vec<i64> = seeded.iter().map(|s| s.id).collect();
    assert_eq!(ids, expected);
    assert!(listing.students.iter().all(|s| s.first_name.to_lowercase().contains("test")));
}

#[tokio::test]
async fn test_listStudents_withGpaThreshold_shouldBeExclusive() {
    let repo = common::test_repository();
    for (name, value) in [("Low", "2.99"), ("Edge", "3.00"), ("High", "3.01")] {
        repo.insert_student(&common::student_record(name, "X").with_gpa(common::gpa(value)))
            .await
            .unwrap();
    }

    let filtered = repo
        .list_students(&StudentFilter::new().with_minimum_gpa(common::gpa("3.00")))
        .await
        .unwrap();
    let names: Vec<&str> = filtered.students.iter().map(|s| s.first_name.as_str()).collect();
    assert_eq!(names, vec!["High"]);

    let unfiltered = repo
        .list_students(&StudentFilter::new().with_minimum_gpa(common::gpa("0")))
        .await
        .unwrap();
    assert_eq!(unfiltered.students.len(), 3);
}

#[tokio::test]
async fn test_listStudents_withEmptyStrings_shouldNotFilter() {
    let repo = common::test_repository();
    common::insert_test_students(&repo).await;

    let listing = repo
        .list_students(&StudentFilter::new().with_first_name("").with_major(""))
        .await
        .unwrap();

    assert_eq!(listing.students.len(), 3);
    assert_eq!(listing.majors, vec!["Computer Science".to_string()]);
}

#[tokio::test]
async fn test_insertComment_thenDelete_shouldLeaveNoComments() {
    let repo = common::test_repository();
    let author = common::insert_recruiter(&repo).await;
    let student = repo
        .insert_student(&common::student_record("Test", "Comment"))
        .await
        .unwrap();

    let comment = repo
        .insert_comment(&NewComment::new(student.id, author.id, "Test"))
        .await
        .unwrap();
    let with_comment = repo.get_student_by_id(student.id).await.unwrap().unwrap();
    assert_eq!(with_comment.comments.len(), 1);
    assert_eq!(with_comment.comments[0].text, "Test");
    assert_eq!(with_comment.comments[0].created_at, comment.created_at);

    assert!(repo.delete_comment(comment.id).await.unwrap());

    let without = repo.get_student_by_id(student.id).await.unwrap().unwrap();
    assert!(without.comments.is_empty());
}

#[tokio::test]
async fn test_comments_withSameTimestamp_shouldFallBackToIdOrder() {
    let repo = common::test_repository();
    let author = common::insert_recruiter(&repo).await;
    let student = repo.insert_student(&common::student_record("Tie", "Break")).await.unwrap();
    let at = Utc.with_ymd_and_hms(2024, 1, 10, 12, 0, 0).unwrap();

    let older = repo
        .insert_comment(&NewComment::new(student.id, author.id, "a").at(at))
        .await
        .unwrap();
    let newer = repo
        .insert_comment(&NewComment::new(student.id, author.id, "b").at(at))
        .await
        .unwrap();
    let earliest = repo
        .insert_comment(
            &NewComment::new(student.id, author.id, "c").at(at - Duration::days(1)),
        )
        .await
        .unwrap();

    let fetched = repo.get_student_by_id(student.id).await.unwrap().unwrap();
    let ids: Vec<i64> = fetched.comments.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![newer.id, older.id, earliest.id]);
}

#[tokio::test]
async fn test_userLookup_shouldIgnoreEmailCase() {
    let repo = common::test_repository();
    let user = common::insert_recruiter(&repo).await;

    let found = repo.find_user_by_email("tannerh@TEST.com").await.unwrap();
    assert_eq!(found, Some(user.clone()));
    assert_eq!(found.unwrap().company_name, "Acme");

    assert!(repo.find_user_by_email("nobody@test.com").await.unwrap().is_none());
}

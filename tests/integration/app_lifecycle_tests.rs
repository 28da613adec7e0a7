/*!
 * Integration tests for application lifecycle
 */

use anyhow::Result;
use nextstep::app_config::Config;
use nextstep::database::connection::DatabaseConnection;
use nextstep::{seed, Repository, StudentFilter, StudentsController};

use crate::common;

fn open_repository(config: &Config) -> Result<Repository> {
    let path = config.database.resolved_path()?;
    Ok(Repository::new(DatabaseConnection::open(path)?))
}

/// Seed, edit and comment through the controller, then reopen the file
#[test]
fn test_lifecycle_onDiskStore_shouldPersistAcrossReopen() -> Result<()> {
    common::init_test_logging();
    let temp_dir = common::create_temp_dir()?;
    let mut config = Config::default();
    config.database.path = temp_dir.path().join("data").join("nextstep.db").display().to_string();

    let (student_id, comment_text) = tokio_test::block_on(async {
        let repo = open_repository(&config)?;
        seed::initialize(&repo, &config.seed).await?;

        let seed_user = &config.seed.users[0];
        let author = repo
            .verify_credentials(&seed_user.email, &seed_user.password)
            .await?
            .expect("seed user should sign in");

        let controller = StudentsController::new(repo);
        let created = controller.create(&common::student_record("Life", "Cycle")).await?;

        let mut record = created.to_record();
        record.major = "Data Science".to_string();
        let saved = controller.edit(created.id, &record).await?;
        assert_eq!(saved.version, 2);

        let comment = controller.add_comment(created.id, "Strong portfolio", &author).await?;
        Ok::<_, anyhow::Error>((created.id, comment.text))
    })?;

    // A fresh connection sees everything written above
    tokio_test::block_on(async {
        let controller = StudentsController::new(open_repository(&config)?);
        let student = controller.details(student_id).await?;

        assert_eq!(student.major, "Data Science");
        assert_eq!(student.version, 2);
        assert_eq!(student.comments.len(), 1);
        assert_eq!(student.comments[0].text, comment_text);
        assert_eq!(student.comments[0].author.display_name(), "Demo Recruiter");

        let listing = controller
            .index(&StudentFilter::new().with_major("Data Science"))
            .await?;
        assert_eq!(listing.students.len(), 1);
        assert!(listing.majors.contains(&"Data Science".to_string()));

        // Reseeding a populated store is a no-op
        let report = seed::initialize(controller.repository(), &config.seed).await?;
        assert!(report.is_noop());

        controller.delete(student_id).await?;
        assert!(controller.details(student_id).await.unwrap_err().is_not_found());
        Ok::<_, anyhow::Error>(())
    })?;

    Ok(())
}

#[test]
fn test_lifecycle_memoryPath_shouldOpenEmptyStore() -> Result<()> {
    let mut config = Config::default();
    config.database.path = ":memory:".to_string();

    let repo = open_repository(&config)?;
    let stats = repo.connection().stats()?;

    assert_eq!(repo.connection().path().to_string_lossy(), ":memory:");
    assert_eq!(stats.student_count, 0);
    assert_eq!(stats.file_size_bytes, 0);
    Ok(())
}

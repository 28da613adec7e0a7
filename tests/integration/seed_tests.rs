/*!
 * Integration tests for seeding an empty store
 */

use nextstep::app_config::SeedConfig;
use nextstep::seed::{self, SeedReport};
use nextstep::{AppError, StudentFilter, StudentRepository};

use crate::common;

#[tokio::test]
async fn test_initialize_onEmptyStore_shouldSeedUsersAndStudents() {
    let repo = common::test_repository();
    let config = SeedConfig::default();

    let report = seed::initialize(&repo, &config).await.unwrap();

    assert_eq!(report.users_created, config.users.len());
    assert!(report.students_created > 0);
    assert_eq!(repo.count_students().await.unwrap() as usize, report.students_created);

    let listing = repo.list_students(&StudentFilter::new()).await.unwrap();
    assert!(listing.students.iter().all(|s| s.version == 1));
    assert!(!listing.majors.is_empty());
}

#[tokio::test]
async fn test_initialize_runTwice_shouldInsertOnce() {
    let repo = common::test_repository();
    let config = SeedConfig::default();

    let first = seed::initialize(&repo, &config).await.unwrap();
    let students_after_first = repo.count_students().await.unwrap();

    let second = seed::initialize(&repo, &config).await.unwrap();

    assert!(!first.is_noop());
    assert_eq!(second, SeedReport::default());
    assert!(second.is_noop());
    assert_eq!(repo.count_students().await.unwrap(), students_after_first);
    assert_eq!(repo.count_users().await.unwrap() as usize, config.users.len());
}

#[tokio::test]
async fn test_initialize_seedUser_shouldBeAbleToSignIn() {
    let repo = common::test_repository();
    let config = SeedConfig::default();
    seed::initialize(&repo, &config).await.unwrap();

    let seed_user = &config.users[0];
    let user = repo
        .verify_credentials(&seed_user.email, &seed_user.password)
        .await
        .unwrap()
        .expect("seed user should sign in");

    assert_eq!(user.company_title, seed_user.company_title);
    assert!(repo
        .verify_credentials(&seed_user.email, "wrong password")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_initialize_withConfiguredCsv_shouldLoadThatFile() {
    let dir = common::create_temp_dir().unwrap();
    let csv = common::create_test_file(
        dir.path(),
        "students.csv",
        "Id,FirstName,LastName,ExpectedGraduation,Major,GPA\n\
         1,Test,LAST_NAME_1,5/15/2025,Math,3.10\n\
         2,Test,LAST_NAME_2,2025-12-20,Math,3.20\n\
         3,Test,LAST_NAME_3,5/15/2026,Biology,3.30\n",
    )
    .unwrap();
    let config = SeedConfig {
        students_csv: Some(csv),
        users: Vec::new(),
    };
    let repo = common::test_repository();

    let report = seed::initialize(&repo, &config).await.unwrap();

    assert_eq!(report.students_created, 3);
    assert_eq!(report.users_created, 0);
    let listing = repo
        .list_students(&StudentFilter::new().with_first_name("Test"))
        .await
        .unwrap();
    let last_names: Vec<&str> = listing.students.iter().map(|s| s.last_name.as_str()).collect();
    assert_eq!(last_names, vec!["LAST_NAME_1", "LAST_NAME_2", "LAST_NAME_3"]);
    assert_eq!(listing.majors, vec!["Biology".to_string(), "Math".to_string()]);
}

#[tokio::test]
async fn test_initialize_withMissingCsv_shouldFailWithoutInsertingStudents() {
    let dir = common::create_temp_dir().unwrap();
    let config = SeedConfig {
        students_csv: Some(dir.path().join("missing.csv")),
        users: Vec::new(),
    };
    let repo = common::test_repository();

    let err = seed::initialize(&repo, &config).await.unwrap_err();

    assert!(matches!(err, AppError::File(_)));
    assert_eq!(repo.count_students().await.unwrap(), 0);
}

#[tokio::test]
async fn test_initialize_withBadRow_shouldInsertNothing() {
    let dir = common::create_temp_dir().unwrap();
    let csv = common::create_test_file(
        dir.path(),
        "students.csv",
        "Id,FirstName,LastName,ExpectedGraduation,Major,GPA\n\
         1,Good,Row,5/15/2025,Math,3.10\n\
         2,Bad,Row,5/15/2025,Math,three\n",
    )
    .unwrap();
    let config = SeedConfig {
        students_csv: Some(csv),
        users: Vec::new(),
    };
    let repo = common::test_repository();

    assert!(seed::initialize(&repo, &config).await.is_err());
    assert_eq!(repo.count_students().await.unwrap(), 0);
}

use std::str::FromStr;

use storage::repository::{
    DeviceCache, ProgressPatch, ProgressRepository, ProfileRepository,
};
use storage::sqlite::SqliteRepository;
use training_core::model::{
    AnswerSheet, ModuleKey, ModuleStatus, Profile, UserId,
};
use training_core::time::fixed_now;

fn user() -> UserId {
    UserId::from_str("3e9c2f54-96a1-4c7b-8d22-5f0b61a7e901").expect("uuid")
}

fn key(raw: &str) -> ModuleKey {
    ModuleKey::new(raw).expect("key")
}

#[tokio::test]
async fn sqlite_roundtrip_persists_progress_and_answers() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_roundtrip?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let answers: AnswerSheet = [(0, 2), (1, 1), (3, 0)].into_iter().collect();
    let patch = ProgressPatch {
        percent: Some(50),
        status: Some(ModuleStatus::InProgress),
        time_spent: Some(340),
        quiz_score: Some(57),
        attempts: Some(1),
        answers: Some(answers.clone()),
        ..ProgressPatch::default()
    };
    repo.upsert(user(), &key("residential"), &patch)
        .await
        .expect("upsert");

    let record = repo
        .fetch(user(), &key("residential"))
        .await
        .expect("fetch")
        .expect("row exists");
    assert_eq!(record.percent, 50);
    assert_eq!(record.status, ModuleStatus::InProgress);
    assert_eq!(record.quiz_score, Some(57));
    assert_eq!(record.answers, answers);
    assert_eq!(record.completed_at, None);

    let progress = record.into_progress().expect("valid row");
    assert_eq!(progress.percent(), 50);
    assert_eq!(progress.attempts(), 1);
}

#[tokio::test]
async fn sqlite_merge_upsert_leaves_omitted_fields_alone() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_merge?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let duct = key("duct");
    let first = ProgressPatch {
        percent: Some(90),
        status: Some(ModuleStatus::ReadyForQuiz),
        time_spent: Some(600),
        ..ProgressPatch::default()
    };
    repo.upsert(user(), &duct, &first).await.expect("first upsert");

    // A score-only patch must not clobber percent or status.
    let second = ProgressPatch {
        quiz_score: Some(86),
        attempts: Some(1),
        ..ProgressPatch::default()
    };
    repo.upsert(user(), &duct, &second).await.expect("second upsert");

    let record = repo.fetch(user(), &duct).await.expect("fetch").expect("row");
    assert_eq!(record.percent, 90);
    assert_eq!(record.status, ModuleStatus::ReadyForQuiz);
    assert_eq!(record.time_spent, 600);
    assert_eq!(record.quiz_score, Some(86));
    assert_eq!(record.attempts, 1);
}

#[tokio::test]
async fn sqlite_first_upsert_defaults_unspecified_columns() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_defaults?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    // An attempts-only patch on a fresh row still yields a well-formed row.
    let patch = ProgressPatch {
        attempts: Some(1),
        ..ProgressPatch::default()
    };
    repo.upsert(user(), &key("safety"), &patch).await.expect("upsert");

    let record = repo
        .fetch(user(), &key("safety"))
        .await
        .expect("fetch")
        .expect("row");
    assert_eq!(record.percent, 0);
    assert_eq!(record.status, ModuleStatus::NotStarted);
    assert_eq!(record.attempts, 1);
    assert!(record.answers.is_empty());
}

#[tokio::test]
async fn sqlite_fetch_many_returns_only_existing_rows() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_many?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let patch = ProgressPatch {
        percent: Some(100),
        status: Some(ModuleStatus::Complete),
        completed_at: Some(fixed_now()),
        ..ProgressPatch::default()
    };
    repo.upsert(user(), &key("rugs"), &patch).await.expect("upsert");

    let keys = vec![key("residential"), key("rugs"), key("stairs")];
    let rows = repo.fetch_many(user(), &keys).await.expect("fetch_many");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].module_key, key("rugs"));
    assert_eq!(rows[0].completed_at, Some(fixed_now()));
}

#[tokio::test]
async fn sqlite_profile_and_cache_roundtrip() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_profile?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let profile = Profile {
        user_id: user(),
        first_name: "Dana".into(),
        full_name: "Dana Mercer".into(),
        email: "dana@example.com".into(),
        date_of_birth: Some("04/12/1991".into()),
    };
    repo.upsert_profile(&profile).await.expect("upsert profile");
    let fetched = repo
        .fetch_profile(user())
        .await
        .expect("fetch profile")
        .expect("profile exists");
    assert_eq!(fetched, profile);

    let blob = serde_json::json!({"first_name": "Dana", "email": "dana@example.com"});
    repo.set("cached_identity", &blob).await.expect("cache set");
    assert_eq!(repo.get("cached_identity").await.expect("cache get"), Some(blob));
    repo.remove("cached_identity").await.expect("cache remove");
    assert_eq!(repo.get("cached_identity").await.expect("cache get"), None);
}

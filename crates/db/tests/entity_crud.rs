//! Integration tests for the repository layer against a real database:
//! - Unique and check constraints
//! - Owner scoping on update/delete
//! - Partial updates, including the nullable completed_at patch
//! - Project deletion orphaning its tasks

use sqlx::PgPool;
use taskdeck_core::types::DbId;
use taskdeck_db::models::project::{CreateProject, UpdateProject};
use taskdeck_db::models::task::{CreateTask, UpdateTask};
use taskdeck_db::repositories::{ProjectRepo, TaskRepo, UserRepo};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn new_user(pool: &PgPool, email: &str) -> DbId {
    UserRepo::create(pool, email, "$argon2id$test-hash")
        .await
        .expect("user creation should succeed")
        .id
}

fn new_project(name: &str) -> CreateProject {
    CreateProject {
        name: name.to_string(),
        color: None,
    }
}

fn new_task(title: &str) -> CreateTask {
    CreateTask {
        title: title.to_string(),
        notes: None,
        project_id: None,
        priority: None,
        due_date: None,
    }
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn duplicate_email_rejected(pool: PgPool) {
    new_user(&pool, "ada@example.com").await;

    let result = UserRepo::create(&pool, "ada@example.com", "$argon2id$other").await;
    let err = result.expect_err("duplicate email must fail");

    match err {
        sqlx::Error::Database(db_err) => {
            assert_eq!(db_err.constraint(), Some("uq_users_email"));
        }
        other => panic!("expected a database error, got {other:?}"),
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn find_by_email_and_id(pool: PgPool) {
    let id = new_user(&pool, "grace@example.com").await;

    let by_email = UserRepo::find_by_email(&pool, "grace@example.com")
        .await
        .unwrap()
        .expect("user should exist");
    assert_eq!(by_email.id, id);

    let by_id = UserRepo::find_by_id(&pool, id).await.unwrap();
    assert!(by_id.is_some());

    assert!(UserRepo::find_by_email(&pool, "nobody@example.com")
        .await
        .unwrap()
        .is_none());
}

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn project_create_defaults_color(pool: PgPool) {
    let owner = new_user(&pool, "ada@example.com").await;

    let project = ProjectRepo::create(&pool, owner, &new_project("Inbox"))
        .await
        .unwrap();
    assert_eq!(project.color, "#64748b");
    assert!(!project.archived);

    let custom = ProjectRepo::create(
        &pool,
        owner,
        &CreateProject {
            name: "Work".into(),
            color: Some("#ff0000".into()),
        },
    )
    .await
    .unwrap();
    assert_eq!(custom.color, "#ff0000");
}

#[sqlx::test(migrations = "./migrations")]
async fn project_listing_excludes_archived_by_default(pool: PgPool) {
    let owner = new_user(&pool, "ada@example.com").await;

    let keep = ProjectRepo::create(&pool, owner, &new_project("Active"))
        .await
        .unwrap();
    let archive = ProjectRepo::create(&pool, owner, &new_project("Old"))
        .await
        .unwrap();

    ProjectRepo::update(
        &pool,
        archive.id,
        owner,
        &UpdateProject {
            archived: Some(true),
            ..Default::default()
        },
    )
    .await
    .unwrap()
    .expect("update should find the project");

    let visible = ProjectRepo::list(&pool, owner, false).await.unwrap();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].id, keep.id);

    let all = ProjectRepo::list(&pool, owner, true).await.unwrap();
    assert_eq!(all.len(), 2);
}

#[sqlx::test(migrations = "./migrations")]
async fn project_update_is_owner_scoped(pool: PgPool) {
    let owner = new_user(&pool, "ada@example.com").await;
    let stranger = new_user(&pool, "mallory@example.com").await;

    let project = ProjectRepo::create(&pool, owner, &new_project("Private"))
        .await
        .unwrap();

    let patch = UpdateProject {
        name: Some("Taken over".into()),
        ..Default::default()
    };
    let result = ProjectRepo::update(&pool, project.id, stranger, &patch)
        .await
        .unwrap();
    assert!(result.is_none(), "stranger must not update the project");

    assert!(!ProjectRepo::delete(&pool, project.id, stranger).await.unwrap());
    assert!(ProjectRepo::delete(&pool, project.id, owner).await.unwrap());
}

#[sqlx::test(migrations = "./migrations")]
async fn exists_active_rejects_archived_and_foreign(pool: PgPool) {
    let owner = new_user(&pool, "ada@example.com").await;
    let stranger = new_user(&pool, "mallory@example.com").await;

    let project = ProjectRepo::create(&pool, owner, &new_project("Work"))
        .await
        .unwrap();

    assert!(ProjectRepo::exists_active(&pool, project.id, owner)
        .await
        .unwrap());
    assert!(!ProjectRepo::exists_active(&pool, project.id, stranger)
        .await
        .unwrap());

    ProjectRepo::update(
        &pool,
        project.id,
        owner,
        &UpdateProject {
            archived: Some(true),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    assert!(!ProjectRepo::exists_active(&pool, project.id, owner)
        .await
        .unwrap());
}

#[sqlx::test(migrations = "./migrations")]
async fn deleting_project_orphans_tasks(pool: PgPool) {
    let owner = new_user(&pool, "ada@example.com").await;
    let project = ProjectRepo::create(&pool, owner, &new_project("Doomed"))
        .await
        .unwrap();

    let task = TaskRepo::create(
        &pool,
        owner,
        &CreateTask {
            project_id: Some(project.id),
            ..new_task("Survivor")
        },
    )
    .await
    .unwrap();
    assert_eq!(task.project_id, Some(project.id));

    assert!(ProjectRepo::delete(&pool, project.id, owner).await.unwrap());

    let survivor = TaskRepo::find_by_id(&pool, task.id, owner)
        .await
        .unwrap()
        .expect("task must survive project deletion");
    assert_eq!(survivor.project_id, None);
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn task_create_applies_defaults(pool: PgPool) {
    let owner = new_user(&pool, "ada@example.com").await;

    let task = TaskRepo::create(&pool, owner, &new_task("Write tests"))
        .await
        .unwrap();

    assert_eq!(task.notes, "");
    assert_eq!(task.priority, 2);
    assert_eq!(task.due_date, None);
    assert_eq!(task.completed_at, None);
    assert_eq!(task.project_id, None);
}

#[sqlx::test(migrations = "./migrations")]
async fn task_partial_update_leaves_other_fields(pool: PgPool) {
    let owner = new_user(&pool, "ada@example.com").await;
    let task = TaskRepo::create(
        &pool,
        owner,
        &CreateTask {
            notes: Some("original notes".into()),
            ..new_task("Original")
        },
    )
    .await
    .unwrap();

    let patch = UpdateTask {
        title: Some("Renamed".into()),
        ..Default::default()
    };
    let updated = TaskRepo::update(&pool, task.id, owner, &patch)
        .await
        .unwrap()
        .expect("task should exist");

    assert_eq!(updated.title, "Renamed");
    assert_eq!(updated.notes, "original notes");
    assert_eq!(updated.priority, task.priority);
    assert!(updated.updated_at >= task.updated_at);
}

#[sqlx::test(migrations = "./migrations")]
async fn task_completed_at_patch_distinguishes_null_from_absent(pool: PgPool) {
    let owner = new_user(&pool, "ada@example.com").await;
    let task = TaskRepo::create(&pool, owner, &new_task("Toggle me"))
        .await
        .unwrap();

    // Set via explicit timestamp.
    let now = chrono::Utc::now();
    let patch = UpdateTask {
        completed_at: Some(Some(now)),
        ..Default::default()
    };
    let updated = TaskRepo::update(&pool, task.id, owner, &patch)
        .await
        .unwrap()
        .unwrap();
    assert!(updated.completed_at.is_some());

    // Absent field keeps the value.
    let patch = UpdateTask {
        notes: Some("still complete".into()),
        ..Default::default()
    };
    let updated = TaskRepo::update(&pool, task.id, owner, &patch)
        .await
        .unwrap()
        .unwrap();
    assert!(updated.completed_at.is_some());

    // Explicit null clears it.
    let patch = UpdateTask {
        completed_at: Some(None),
        ..Default::default()
    };
    let updated = TaskRepo::update(&pool, task.id, owner, &patch)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.completed_at, None);
}

#[sqlx::test(migrations = "./migrations")]
async fn task_set_completion_toggles_only_completion(pool: PgPool) {
    let owner = new_user(&pool, "ada@example.com").await;
    let task = TaskRepo::create(&pool, owner, &new_task("Finish report"))
        .await
        .unwrap();

    let done = TaskRepo::set_completion(&pool, task.id, owner, Some(chrono::Utc::now()))
        .await
        .unwrap()
        .expect("task should exist");
    assert!(done.completed_at.is_some());
    assert_eq!(done.title, task.title);

    let reopened = TaskRepo::set_completion(&pool, task.id, owner, None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reopened.completed_at, None);
}

#[sqlx::test(migrations = "./migrations")]
async fn task_access_is_owner_scoped(pool: PgPool) {
    let owner = new_user(&pool, "ada@example.com").await;
    let stranger = new_user(&pool, "mallory@example.com").await;

    let task = TaskRepo::create(&pool, owner, &new_task("Secret"))
        .await
        .unwrap();

    assert!(TaskRepo::find_by_id(&pool, task.id, stranger)
        .await
        .unwrap()
        .is_none());
    assert!(TaskRepo::set_completion(&pool, task.id, stranger, None)
        .await
        .unwrap()
        .is_none());
    assert!(!TaskRepo::delete(&pool, task.id, stranger).await.unwrap());

    // The owner still can.
    assert!(TaskRepo::delete(&pool, task.id, owner).await.unwrap());
    assert!(!TaskRepo::delete(&pool, task.id, owner).await.unwrap());
}

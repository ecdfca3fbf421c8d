#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use chrono::{DateTime, Utc};

use k12_tutor_backend::config::EngineConfig;
use k12_tutor_backend::db::operations::{classes, content, Assignment, ClassRecord, KnowledgePoint, Question};
use k12_tutor_backend::db::config::{DbConfig, SqliteJournalMode};
use k12_tutor_backend::db::Database;
use k12_tutor_backend::services::ledger::{self, RecordAttemptInput};
use k12_tutor_backend::state::AppState;
use k12_tutor_backend::{create_app, seed};

pub const SUBJECT: &str = "math";
pub const GRADE: &str = "5";

/// (id, title) of the seeded math points.
pub const POINTS: &[(&str, &str)] = &[
    ("kp-fractions", "Fractions"),
    ("kp-decimals", "Decimals"),
    ("kp-geometry", "Geometry"),
];

pub const QUESTIONS_PER_POINT: usize = 3;

pub async fn test_db() -> Arc<Database> {
    Arc::new(Database::in_memory().await.expect("in-memory store"))
}

/// File-backed WAL store with a real connection pool. Keep the returned dir alive for the test.
pub async fn disk_db(max_connections: u32) -> (tempfile::TempDir, Arc<Database>) {
    let dir = tempfile::tempdir().expect("temp dir");
    let config = DbConfig {
        path: dir.path().join("tutor.db"),
        max_connections,
        journal_mode: SqliteJournalMode::Wal,
        busy_timeout: std::time::Duration::from_secs(10),
        foreign_keys: false,
    };
    let db = Database::connect(&config).await.expect("on-disk store");
    (dir, Arc::new(db))
}

pub fn question_id(point_id: &str, n: usize) -> String {
    format!("{point_id}-q{n}")
}

pub async fn seed_content(db: &Database) {
    for (id, title) in POINTS {
        content::upsert_knowledge_point(
            db.pool(),
            &KnowledgePoint {
                id: id.to_string(),
                subject: SUBJECT.to_string(),
                grade: Some(GRADE.to_string()),
                title: title.to_string(),
            },
        )
        .await
        .expect("seed knowledge point");

        for n in 1..=QUESTIONS_PER_POINT {
            content::upsert_question(
                db.pool(),
                &Question {
                    id: question_id(id, n),
                    subject: SUBJECT.to_string(),
                    grade: GRADE.to_string(),
                    knowledge_point_id: id.to_string(),
                    stem: format!("{title} question {n}"),
                    answer: "42".to_string(),
                    active: true,
                },
            )
            .await
            .expect("seed question");
        }
    }
}

pub async fn answer(db: &Database, user_id: &str, point_id: &str, n: usize, correct: bool) {
    ledger::record(
        db,
        RecordAttemptInput {
            user_id: user_id.to_string(),
            question_id: question_id(point_id, n),
            knowledge_point_id: point_id.to_string(),
            correct,
            ..RecordAttemptInput::default()
        },
    )
    .await
    .expect("record attempt");
}

pub async fn seed_class(db: &Database, teacher_id: &str, class_id: &str, students: &[&str]) {
    classes::upsert_class(
        db.pool(),
        &ClassRecord {
            id: class_id.to_string(),
            teacher_id: teacher_id.to_string(),
            name: format!("Class {class_id}"),
        },
    )
    .await
    .expect("seed class");

    for student in students {
        classes::add_class_member(db.pool(), class_id, student)
            .await
            .expect("seed member");
    }
}

pub async fn seed_assignment(db: &Database, class_id: &str, id: &str, due_at: Option<DateTime<Utc>>) {
    classes::upsert_assignment(
        db.pool(),
        &Assignment {
            id: id.to_string(),
            class_id: class_id.to_string(),
            title: format!("Homework {id}"),
            due_at,
        },
    )
    .await
    .expect("seed assignment");
}

pub async fn create_test_app(db: Arc<Database>) -> Router {
    seed::seed_default_tasks(&db).await;
    create_app(AppState::new(db, EngineConfig::default()))
}

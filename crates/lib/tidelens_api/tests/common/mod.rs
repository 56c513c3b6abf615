//! Shared test support: ephemeral PostgreSQL and a mock mailer.

#![allow(dead_code)]

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use sqlx::PgPool;
use tidelens_core::db::LocalDbManager;
use tidelens_core::mail::{MailError, Mailer};

/// A captured outbound email.
#[derive(Debug, Clone)]
pub struct SentEmail {
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

/// In-memory mailer. Set `fail` to simulate a relay outage.
#[derive(Default)]
pub struct MockMailer {
    pub fail: AtomicBool,
    pub sent: Mutex<Vec<SentEmail>>,
}

impl MockMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: AtomicBool::new(true),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().unwrap().clone()
    }

    /// Pull the token out of a reset email body (`<code>TOKEN</code>`).
    pub fn extract_code_tag(body: &str) -> Option<String> {
        let start = body.find("<code>")? + "<code>".len();
        let end = body[start..].find("</code>")? + start;
        Some(body[start..end].to_string())
    }
}

#[async_trait]
impl Mailer for MockMailer {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<(), MailError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(MailError::Transport("mock relay failure".into()));
        }
        self.sent.lock().unwrap().push(SentEmail {
            to: to.to_string(),
            subject: subject.to_string(),
            html_body: html_body.to_string(),
        });
        Ok(())
    }
}

/// An ephemeral PostgreSQL with migrations applied.
pub struct TestDb {
    pub db: LocalDbManager,
    pub pool: PgPool,
}

impl TestDb {
    pub async fn stop(mut self) {
        self.pool.close().await;
        let _ = self.db.stop().await;
    }
}

/// Start an ephemeral PostgreSQL and run the migrations. Returns None
/// (test skips) where no local PostgreSQL toolchain is available.
pub async fn start_pg() -> Option<TestDb> {
    let mut db = match LocalDbManager::ephemeral().await {
        Ok(db) => db,
        Err(e) => {
            eprintln!("skipping: ephemeral PostgreSQL unavailable: {e}");
            return None;
        }
    };
    if let Err(e) = db.setup().await {
        eprintln!("skipping: initdb failed: {e}");
        return None;
    }
    if let Err(e) = db.start().await {
        eprintln!("skipping: pg_ctl start failed: {e}");
        return None;
    }

    let pool = PgPool::connect(&db.connection_url())
        .await
        .expect("connect to ephemeral PG");
    tidelens_api::migrate(&pool).await.expect("run migrations");

    Some(TestDb { db, pool })
}

/// Insert a user with a bcrypt-hashed password, returning the user ID.
pub async fn seed_user(pool: &PgPool, email: &str, password: Option<&str>) -> String {
    let hash = password.map(|p| {
        tidelens_core::auth::password::hash_password(p).expect("hash password")
    });
    tidelens_core::auth::queries::create_user(pool, email, Some("Test User"), hash.as_deref())
        .await
        .expect("create user")
}

use std::sync::Arc;

use tracing::{info, warn};

use crate::{
    auth::jwt::JwtKeys,
    comments::repo::CommentRepo,
    config::AppConfig,
    db::PgStore,
    mailer::{LogMailer, Mailer, SmtpMailer},
    memory::MemoryStore,
    posts::repo::PostRepo,
    users::repo::UserRepo,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub jwt: JwtKeys,
    pub users: Arc<dyn UserRepo>,
    pub posts: Arc<dyn PostRepo>,
    pub comments: Arc<dyn CommentRepo>,
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let mailer: Arc<dyn Mailer> = match &config.mail {
            Some(mail) => {
                info!(host = %mail.host, port = mail.port, "using SMTP mailer");
                Arc::new(SmtpMailer::new(mail)?)
            }
            None => {
                warn!("SMTP_HOST not set; reset emails will only be logged");
                Arc::new(LogMailer)
            }
        };

        let state = match config.database_url.clone() {
            Some(url) => {
                let store = PgStore::connect(&url).await?;
                store.migrate().await?;
                info!("connected to PostgreSQL");
                let store = Arc::new(store);
                Self::from_parts(config, store.clone(), store.clone(), store, mailer)
            }
            None => {
                warn!("DATABASE_URL not set; using in-memory store, data is lost on restart");
                let store = Arc::new(MemoryStore::new());
                Self::from_parts(config, store.clone(), store.clone(), store, mailer)
            }
        };
        Ok(state)
    }

    pub fn from_parts(
        config: AppConfig,
        users: Arc<dyn UserRepo>,
        posts: Arc<dyn PostRepo>,
        comments: Arc<dyn CommentRepo>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            jwt: JwtKeys::new(&config.jwt),
            config: Arc::new(config),
            users,
            posts,
            comments,
            mailer,
        }
    }
}

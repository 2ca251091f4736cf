use std::sync::Arc;

use axum::extract::FromRef;

use crate::{comments::CommentService, config::Config, mailer::Mailer, store::Repository};

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn Repository>,
    pub config: Config,
    pub comments: CommentService,
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    /// Wires the comment service to the same repository, using the
    /// configured delete policy.
    pub fn new(repo: Arc<dyn Repository>, config: Config, mailer: Arc<dyn Mailer>) -> Self {
        let comments = CommentService::new(repo.clone(), config.comment_delete_policy);
        Self {
            repo,
            config,
            comments,
            mailer,
        }
    }
}

impl FromRef<AppState> for Arc<dyn Repository> {
    fn from_ref(state: &AppState) -> Self {
        state.repo.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for CommentService {
    fn from_ref(state: &AppState) -> Self {
        state.comments.clone()
    }
}

impl FromRef<AppState> for Arc<dyn Mailer> {
    fn from_ref(state: &AppState) -> Self {
        state.mailer.clone()
    }
}

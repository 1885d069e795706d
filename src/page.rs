//! The article collection and the remote-then-local mutation flow.
//!
//! Every remote operation produces a [`Completion`]. Applying it to the
//! [`NewsPage`] is the only way the collection changes. When the backend
//! fails, the completion carries [`Synced::Local`] and the page degrades to
//! in-memory state with a notice instead of reporting an error.

use chrono::Utc;
use tracing::{info, warn};

use crate::api::NewsBackend;
use crate::error::ApiError;
use crate::form::Submission;
use crate::model::{sample_articles, Article, ArticleId, ArticlePatch, ImageFile, NewArticle};

/// Whether the server answered or the page must fall back to local state.
#[derive(Debug)]
pub enum Synced<T, L = T> {
    Remote(T),
    Local { value: L, cause: ApiError },
}

impl<T, L> Synced<T, L> {
    pub fn is_remote(&self) -> bool {
        matches!(self, Synced::Remote(_))
    }
}

#[derive(Debug)]
pub enum Completion {
    Loaded(Synced<Vec<Article>>),
    Created(Synced<Article>),
    Updated {
        id: ArticleId,
        outcome: Synced<Article, ArticlePatch>,
    },
    Deleted {
        id: ArticleId,
        outcome: Synced<()>,
    },
}

/// Proof that the user confirmed a deletion. Only [`NewsPage::confirm_delete`] makes one.
#[derive(Debug, PartialEq, Eq)]
pub struct DeleteRequest {
    id: ArticleId,
}

impl DeleteRequest {
    pub fn id(&self) -> &ArticleId {
        &self.id
    }
}

pub async fn fetch_articles<B: NewsBackend>(backend: &B) -> Completion {
    Completion::Loaded(match backend.fetch_all().await {
        Ok(articles) => Synced::Remote(articles),
        Err(cause) => Synced::Local {
            value: sample_articles(),
            cause,
        },
    })
}

pub async fn create_article<B: NewsBackend>(backend: &B, article: NewArticle) -> Completion {
    Completion::Created(match backend.create(&article).await {
        Ok(created) => Synced::Remote(created),
        Err(cause) => Synced::Local {
            value: local_article(article),
            cause,
        },
    })
}

pub async fn update_article<B: NewsBackend>(
    backend: &B,
    id: ArticleId,
    patch: ArticlePatch,
) -> Completion {
    let outcome = match backend.update(&id, &patch).await {
        Ok(updated) => Synced::Remote(updated),
        Err(cause) => Synced::Local {
            value: patch,
            cause,
        },
    };
    Completion::Updated { id, outcome }
}

pub async fn delete_article<B: NewsBackend>(backend: &B, request: DeleteRequest) -> Completion {
    let outcome = match backend.delete(&request.id).await {
        Ok(()) => Synced::Remote(()),
        Err(cause) => Synced::Local { value: (), cause },
    };
    Completion::Deleted {
        id: request.id,
        outcome,
    }
}

/// Route a form submission to create or update.
pub async fn submit<B: NewsBackend>(backend: &B, submission: Submission) -> Completion {
    match submission {
        Submission::Create(article) => create_article(backend, article).await,
        Submission::Update { id, patch } => update_article(backend, id, patch).await,
    }
}

fn local_article(article: NewArticle) -> Article {
    let now = Utc::now();
    Article {
        id: ArticleId::new(now.timestamp_millis().to_string()),
        title: article.title,
        description: article.description,
        images: article.files.iter().map(ImageFile::local_reference).collect(),
        created_at: now,
    }
}

#[derive(Debug)]
pub struct NewsPage {
    articles: Vec<Article>,
    loading: bool,
    notice: Option<String>,
    status: String,
    editing: Option<ArticleId>,
    pending_delete: Option<ArticleId>,
}

impl Default for NewsPage {
    fn default() -> Self {
        Self::new()
    }
}

impl NewsPage {
    pub fn new() -> Self {
        Self {
            articles: vec![],
            loading: true,
            notice: None,
            status: "Loading news…".to_string(),
            editing: None,
            pending_delete: None,
        }
    }

    pub fn articles(&self) -> &[Article] {
        &self.articles
    }

    pub fn get(&self, id: &ArticleId) -> Option<&Article> {
        self.articles.iter().find(|a| &a.id == id)
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Dismissible banner, set when the page fell back to local state.
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    /// Transient one-line acknowledgement.
    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }

    pub fn editing(&self) -> Option<&ArticleId> {
        self.editing.as_ref()
    }

    pub fn begin_load(&mut self) {
        self.loading = true;
        self.status = "Loading news…".to_string();
    }

    pub fn start_edit(&mut self, id: &ArticleId) -> Option<&Article> {
        let article = self.articles.iter().find(|a| &a.id == id)?;
        self.editing = Some(article.id.clone());
        Some(article)
    }

    pub fn cancel_edit(&mut self) {
        self.editing = None;
    }

    pub fn pending_delete(&self) -> Option<&Article> {
        self.get(self.pending_delete.as_ref()?)
    }

    /// First step of a delete: ask for confirmation. Returns `false` for unknown ids.
    pub fn request_delete(&mut self, id: &ArticleId) -> bool {
        if self.get(id).is_none() {
            return false;
        }
        self.pending_delete = Some(id.clone());
        true
    }

    pub fn confirm_delete(&mut self) -> Option<DeleteRequest> {
        self.pending_delete.take().map(|id| DeleteRequest { id })
    }

    /// The user said no. Nothing changes.
    pub fn decline_delete(&mut self) {
        self.pending_delete = None;
    }

    pub fn apply(&mut self, completion: Completion) {
        match completion {
            Completion::Loaded(outcome) => {
                self.loading = false;
                match outcome {
                    Synced::Remote(articles) => {
                        info!(count = articles.len(), "loaded articles");
                        self.articles = articles;
                        self.notice = None;
                    }
                    Synced::Local { value, cause } => {
                        warn!(error = %cause, "load failed, using sample articles");
                        self.articles = value;
                        self.notice = Some(format!(
                            "Could not reach the news server ({cause}). Showing demo data."
                        ));
                    }
                }
                if let Some(id) = &self.editing {
                    if self.get(id).is_none() {
                        self.editing = None;
                    }
                }
                self.status = format!("Loaded {} articles", self.articles.len());
            }
            Completion::Created(outcome) => {
                let article = match outcome {
                    Synced::Remote(article) => {
                        info!(id = %article.id, "article created");
                        article
                    }
                    Synced::Local { mut value, cause } => {
                        warn!(error = %cause, "create failed, keeping article locally");
                        value.id = self.unique_id(value.id);
                        self.notice = Some(format!(
                            "Server unavailable ({cause}). News saved locally only (demo mode)."
                        ));
                        value
                    }
                };
                self.articles.retain(|a| a.id != article.id);
                self.articles.insert(0, article);
                self.status = "News added successfully!".to_string();
            }
            Completion::Updated { id, outcome } => {
                self.editing = None;
                let Some(slot) = self.articles.iter_mut().find(|a| a.id == id) else {
                    warn!(%id, "updated article is no longer in the collection");
                    self.notice =
                        Some("This news item no longer exists. Changes were not applied.".to_string());
                    self.status = "Update discarded".to_string();
                    return;
                };
                match outcome {
                    Synced::Remote(mut article) => {
                        info!(%id, "article updated");
                        // The slot keeps its id so the collection stays unique.
                        article.id = id;
                        *slot = article;
                    }
                    Synced::Local { value, cause } => {
                        warn!(%id, error = %cause, "update failed, patching locally");
                        slot.title = value.title;
                        slot.description = value.description;
                        slot.images = value.images;
                        self.notice = Some(format!(
                            "Server unavailable ({cause}). Changes saved locally only (demo mode)."
                        ));
                    }
                }
                self.status = "News updated successfully!".to_string();
            }
            Completion::Deleted { id, outcome } => {
                self.status = match outcome {
                    Synced::Remote(()) => {
                        info!(%id, "article deleted");
                        "News deleted successfully!".to_string()
                    }
                    Synced::Local { cause, .. } => {
                        warn!(%id, error = %cause, "delete failed, removing locally");
                        self.notice = Some(format!(
                            "Server unavailable ({cause}). News removed locally only."
                        ));
                        "News removed".to_string()
                    }
                };
                self.articles.retain(|a| a.id != id);
                if self.editing.as_ref() == Some(&id) {
                    self.editing = None;
                }
            }
        }
    }

    pub async fn load<B: NewsBackend>(&mut self, backend: &B) {
        self.begin_load();
        self.apply(fetch_articles(backend).await);
    }

    pub async fn create<B: NewsBackend>(&mut self, backend: &B, article: NewArticle) {
        self.apply(create_article(backend, article).await);
    }

    pub async fn update<B: NewsBackend>(&mut self, backend: &B, id: ArticleId, patch: ArticlePatch) {
        self.apply(update_article(backend, id, patch).await);
    }

    pub async fn delete<B: NewsBackend>(&mut self, backend: &B, request: DeleteRequest) {
        self.apply(delete_article(backend, request).await);
    }

    fn unique_id(&self, id: ArticleId) -> ArticleId {
        if self.get(&id).is_none() {
            return id;
        }
        let mut n: i64 = id.as_str().parse().unwrap_or_else(|_| Utc::now().timestamp_millis());
        loop {
            n += 1;
            let candidate = ArticleId::new(n.to_string());
            if self.get(&candidate).is_none() {
                return candidate;
            }
        }
    }
}

use std::future::Future;

use tracing::debug;

use crate::error::FormError;
use crate::model::{Article, ArticleId, ArticlePatch, ImageFile, NewArticle};
use crate::preview::PreviewBatch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Title,
    Description,
}

/// One image slot of the draft. Images seeded from a saved article have no file.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftImage {
    pub preview: String,
    pub file: Option<ImageFile>,
}

/// A preview build the caller should run, tagged with its generation.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewRequest {
    pub generation: u64,
    pub files: Vec<ImageFile>,
}

/// Normalized payload handed to the page once the draft validates.
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    Create(NewArticle),
    Update { id: ArticleId, patch: ArticlePatch },
}

#[derive(Debug, Default)]
pub struct NewsForm {
    title: String,
    description: String,
    images: Vec<DraftImage>,
    editing: Option<ArticleId>,
    busy: bool,
    generation: u64,
    previews_pending: bool,
}

impl NewsForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn field(&self, field: Field) -> &str {
        match field {
            Field::Title => &self.title,
            Field::Description => &self.description,
        }
    }

    pub fn images(&self) -> &[DraftImage] {
        &self.images
    }

    pub fn previews(&self) -> impl Iterator<Item = &str> {
        self.images.iter().map(|i| i.preview.as_str())
    }

    pub fn editing(&self) -> Option<&ArticleId> {
        self.editing.as_ref()
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn previews_pending(&self) -> bool {
        self.previews_pending
    }

    /// Start editing `article`, or go back to an empty create draft.
    pub fn seed(&mut self, article: Option<&Article>) {
        self.clear();
        if let Some(article) = article {
            self.title = article.title.clone();
            self.description = article.description.clone();
            self.images = article
                .images
                .iter()
                .map(|url| DraftImage {
                    preview: url.clone(),
                    file: None,
                })
                .collect();
            self.editing = Some(article.id.clone());
        }
    }

    pub fn update_field(&mut self, field: Field, value: String) {
        match field {
            Field::Title => self.title = value,
            Field::Description => self.description = value,
        }
    }

    /// Replace the picked files. Previews are swapped in by [`Self::apply_previews`].
    pub fn select_images(&mut self, files: Vec<ImageFile>) -> PreviewRequest {
        self.generation += 1;
        self.previews_pending = true;
        PreviewRequest {
            generation: self.generation,
            files,
        }
    }

    /// Install a finished preview batch. Returns `false` for a stale generation.
    pub fn apply_previews(&mut self, generation: u64, batch: PreviewBatch) -> bool {
        if generation != self.generation {
            debug!(generation, current = self.generation, "dropping stale previews");
            return false;
        }
        self.previews_pending = false;
        self.images = batch
            .ready
            .into_iter()
            .map(|p| DraftImage {
                preview: p.preview,
                file: Some(p.file),
            })
            .collect();
        true
    }

    /// Out-of-range indices are ignored.
    pub fn remove_image(&mut self, index: usize) -> bool {
        if index >= self.images.len() {
            return false;
        }
        self.images.remove(index);
        true
    }

    /// Validate the draft and mark the form busy.
    pub fn begin_submit(&mut self) -> Result<Submission, FormError> {
        if self.busy {
            return Err(FormError::Busy);
        }
        let title = self.title.trim();
        let description = self.description.trim();
        if title.is_empty() || description.is_empty() {
            return Err(FormError::MissingFields {
                title: title.is_empty(),
                description: description.is_empty(),
            });
        }
        if self.previews_pending {
            return Err(FormError::PreviewsPending);
        }

        let submission = match &self.editing {
            Some(id) => Submission::Update {
                id: id.clone(),
                patch: ArticlePatch {
                    title: title.to_string(),
                    description: description.to_string(),
                    images: self.images.iter().map(|i| i.preview.clone()).collect(),
                },
            },
            None => Submission::Create(NewArticle {
                title: title.to_string(),
                description: description.to_string(),
                files: self.images.iter().filter_map(|i| i.file.clone()).collect(),
            }),
        };
        self.busy = true;
        Ok(submission)
    }

    /// Called once the submit callback has completed.
    pub fn finish_submit<E>(&mut self, outcome: Result<(), E>) {
        self.busy = false;
        if outcome.is_ok() && self.editing.is_none() {
            self.clear();
        }
    }

    pub async fn submit_with<F, Fut, E>(&mut self, on_submit: F) -> Result<Result<(), E>, FormError>
    where
        F: FnOnce(Submission) -> Fut,
        Fut: Future<Output = Result<(), E>>,
    {
        let submission = self.begin_submit()?;
        let outcome = on_submit(submission).await;
        self.finish_submit(outcome.as_ref().map(|_| ()));
        Ok(outcome)
    }

    /// Throw the draft away. Returns the id whose edit just ended, if any.
    pub fn cancel(&mut self) -> Option<ArticleId> {
        let ended = self.editing.take();
        self.clear();
        ended
    }

    fn clear(&mut self) {
        self.title.clear();
        self.description.clear();
        self.images.clear();
        self.editing = None;
        self.previews_pending = false;
        // bump so in-flight preview batches for the old draft are ignored
        self.generation += 1;
    }
}

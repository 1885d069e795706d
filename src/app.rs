use std::collections::HashSet;

use crate::form::{Field, NewsForm, PreviewRequest, Submission};
use crate::input::{Action, InputMode};
use crate::model::{parse_image_paths, Article};
use crate::page::{Completion, DeleteRequest, NewsPage};
use crate::preview::PreviewBatch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    List,
    Title,
    Description,
    Images,
}

impl Focus {
    fn next(self) -> Self {
        match self {
            Focus::List => Focus::Title,
            Focus::Title => Focus::Description,
            Focus::Description => Focus::Images,
            Focus::Images => Focus::List,
        }
    }
}

/// Work the event loop has to start on behalf of the app.
#[derive(Debug)]
pub enum Effect {
    Load,
    Submit(Submission),
    Delete(DeleteRequest),
    BuildPreviews(PreviewRequest),
    OpenImage(String),
    ProbeImages(Vec<String>),
    Quit,
}

/// Results coming back from background tasks.
#[derive(Debug)]
pub enum AppEvent {
    Completed(Completion),
    Previews { generation: u64, batch: PreviewBatch },
    ImageChecked { url: String, available: bool },
}

#[derive(Debug)]
pub struct App {
    pub page: NewsPage,
    pub form: NewsForm,
    pub focus: Focus,
    pub selected: usize,
    pub image_cursor: usize,
    /// Raw text of the image picker field.
    pub picker: String,
    pub broken_images: HashSet<String>,
    probed: HashSet<String>,
    pub tick: usize,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    pub fn new() -> Self {
        Self {
            page: NewsPage::new(),
            form: NewsForm::new(),
            focus: Focus::List,
            selected: 0,
            image_cursor: 0,
            picker: String::new(),
            broken_images: HashSet::new(),
            probed: HashSet::new(),
            tick: 0,
        }
    }

    pub fn input_mode(&self) -> InputMode {
        if self.page.pending_delete().is_some() {
            InputMode::Confirm
        } else if self.focus == Focus::List {
            InputMode::Browse
        } else {
            InputMode::Form
        }
    }

    pub fn selected_article(&self) -> Option<&Article> {
        self.page.articles().get(self.selected)
    }

    pub fn handle(&mut self, action: Action) -> Option<Effect> {
        match self.input_mode() {
            InputMode::Confirm => self.handle_confirm(action),
            InputMode::Browse => self.handle_browse(action),
            InputMode::Form => self.handle_form(action),
        }
    }

    fn handle_confirm(&mut self, action: Action) -> Option<Effect> {
        match action {
            Action::Confirm => {
                let request = self.page.confirm_delete()?;
                self.page.set_status("Deleting…");
                Some(Effect::Delete(request))
            }
            Action::Decline => {
                self.page.decline_delete();
                None
            }
            _ => None,
        }
    }

    fn handle_browse(&mut self, action: Action) -> Option<Effect> {
        match action {
            Action::Quit => return Some(Effect::Quit),
            Action::Down => self.move_down(),
            Action::Up => self.move_up(),
            Action::Reload => {
                if !self.page.is_loading() {
                    self.page.begin_load();
                    return Some(Effect::Load);
                }
            }
            Action::NewArticle => {
                if self.form.editing().is_some() && !self.form.is_busy() {
                    self.form.cancel();
                    self.page.cancel_edit();
                    self.picker.clear();
                }
                self.focus = Focus::Title;
            }
            Action::Edit => self.start_edit(),
            Action::Delete => {
                if let Some(id) = self.selected_article().map(|a| a.id.clone()) {
                    self.page.request_delete(&id);
                }
            }
            Action::OpenImage => {
                let url = self.selected_article()?.primary_image()?.to_string();
                return Some(Effect::OpenImage(url));
            }
            Action::DismissNotice => self.page.dismiss_notice(),
            Action::NextField => self.focus = Focus::Title,
            _ => {}
        }
        None
    }

    fn handle_form(&mut self, action: Action) -> Option<Effect> {
        match action {
            Action::Char(c) => self.type_char(c),
            Action::Backspace => self.backspace(),
            Action::Enter => match self.focus {
                Focus::Title => self.focus = Focus::Description,
                Focus::Description => self.type_char('\n'),
                Focus::Images => return self.select_images(),
                Focus::List => {}
            },
            Action::NextField => self.focus = self.focus.next(),
            Action::Up if self.focus == Focus::Images => {
                self.image_cursor = self.image_cursor.saturating_sub(1);
            }
            Action::Down if self.focus == Focus::Images => {
                let last = self.form.images().len().saturating_sub(1);
                self.image_cursor = (self.image_cursor + 1).min(last);
            }
            Action::RemoveImage if self.focus == Focus::Images => {
                if self.form.remove_image(self.image_cursor) {
                    let last = self.form.images().len().saturating_sub(1);
                    self.image_cursor = self.image_cursor.min(last);
                }
            }
            Action::Submit => match self.form.begin_submit() {
                Ok(submission) => {
                    self.page.set_status("Submitting…");
                    return Some(Effect::Submit(submission));
                }
                Err(err) => self.page.set_status(err.to_string()),
            },
            Action::Cancel => {
                if self.form.is_busy() {
                    return None;
                }
                let ended = self.form.cancel();
                self.picker.clear();
                self.image_cursor = 0;
                self.focus = Focus::List;
                if ended.is_some() {
                    self.page.cancel_edit();
                    self.page.set_status("Edit cancelled");
                }
            }
            _ => {}
        }
        None
    }

    /// Fold a background result into the state.
    pub fn on_event(&mut self, event: AppEvent) -> Option<Effect> {
        match event {
            AppEvent::Completed(completion) => {
                let from_form = matches!(
                    completion,
                    Completion::Created(_) | Completion::Updated { .. }
                );
                let deleted = match &completion {
                    Completion::Deleted { id, .. } => Some(id.clone()),
                    _ => None,
                };
                let created = matches!(completion, Completion::Created(_));

                self.page.apply(completion);

                if from_form {
                    self.form.finish_submit::<()>(Ok(()));
                    if self.form.editing().is_some() {
                        self.form.seed(None);
                    }
                    self.picker.clear();
                    self.image_cursor = 0;
                    self.focus = Focus::List;
                }
                if created {
                    self.selected = 0;
                }
                if deleted.is_some() && deleted.as_ref() == self.form.editing() {
                    self.form.cancel();
                }
                self.clamp_selection();
                self.probe_effect()
            }
            AppEvent::Previews { generation, batch } => {
                let skipped: Vec<String> = batch
                    .skipped
                    .iter()
                    .map(|s| format!("{} ({})", s.file.name(), s.reason))
                    .collect();
                let ready = batch.ready.len();
                if self.form.apply_previews(generation, batch) {
                    self.image_cursor = 0;
                    let status = if skipped.is_empty() {
                        format!("{ready} image(s) ready")
                    } else {
                        format!("{ready} image(s) ready, skipped: {}", skipped.join(", "))
                    };
                    self.page.set_status(status);
                }
                None
            }
            AppEvent::ImageChecked { url, available } => {
                if !available {
                    self.broken_images.insert(url);
                }
                None
            }
        }
    }

    fn probe_effect(&mut self) -> Option<Effect> {
        let fresh: Vec<String> = self
            .page
            .articles()
            .iter()
            .filter_map(|a| a.primary_image())
            .filter(|url| !url.is_empty() && !self.probed.contains(*url))
            .map(str::to_string)
            .collect();
        if fresh.is_empty() {
            return None;
        }
        self.probed.extend(fresh.iter().cloned());
        Some(Effect::ProbeImages(fresh))
    }

    fn start_edit(&mut self) {
        if self.form.is_busy() {
            self.page.set_status("A submission is already in progress");
            return;
        }
        let Some(id) = self.selected_article().map(|a| a.id.clone()) else {
            return;
        };
        if let Some(article) = self.page.start_edit(&id).cloned() {
            self.form.seed(Some(&article));
            self.picker.clear();
            self.image_cursor = 0;
            self.focus = Focus::Title;
            self.page.set_status(format!("Editing \"{}\"", article.title));
        }
    }

    fn select_images(&mut self) -> Option<Effect> {
        let files = parse_image_paths(&self.picker);
        if files.is_empty() {
            self.page
                .set_status("Type image paths separated by commas, then press Enter");
            return None;
        }
        self.page.set_status(format!("Reading {} image(s)…", files.len()));
        Some(Effect::BuildPreviews(self.form.select_images(files)))
    }

    fn type_char(&mut self, c: char) {
        match self.focus {
            Focus::Title | Focus::Description => {
                let field = self.text_field();
                let mut value = self.form.field(field).to_string();
                value.push(c);
                self.form.update_field(field, value);
            }
            Focus::Images => self.picker.push(c),
            Focus::List => {}
        }
    }

    fn backspace(&mut self) {
        match self.focus {
            Focus::Title | Focus::Description => {
                let field = self.text_field();
                let mut value = self.form.field(field).to_string();
                value.pop();
                self.form.update_field(field, value);
            }
            Focus::Images => {
                self.picker.pop();
            }
            Focus::List => {}
        }
    }

    fn text_field(&self) -> Field {
        if self.focus == Focus::Description {
            Field::Description
        } else {
            Field::Title
        }
    }

    fn clamp_selection(&mut self) {
        let len = self.page.articles().len();
        if self.selected >= len {
            self.selected = len.saturating_sub(1);
        }
    }

    pub fn move_down(&mut self) {
        let len = self.page.articles().len();
        if len == 0 {
            return;
        }
        self.selected = (self.selected + 1).min(len - 1);
    }

    pub fn move_up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }
}

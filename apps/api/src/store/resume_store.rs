use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{info, warn};
use uuid::Uuid;

use crate::document::{self, ContentPatch, ResumeContent};
use crate::models::resume::{NewResumeRow, ResumeRow, ResumeTemplateRow, ResumeUpdate};
use crate::remote::ResumeRemote;

use super::ResumeError;

/// Everything a résumé page renders from.
#[derive(Debug, Clone, Default)]
pub struct ResumeState {
    pub resumes: Vec<ResumeRow>,
    pub current_resume: Option<ResumeRow>,
    pub current_content: Option<ResumeContent>,
    pub templates: Vec<ResumeTemplateRow>,
    pub is_loading_resumes: bool,
    pub is_loading_current_resume: bool,
    pub is_loading_templates: bool,
    pub is_saving_resume: bool,
    pub error: Option<ResumeError>,
}

impl ResumeState {
    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(ToString::to_string)
    }
}

#[derive(Debug, Clone)]
pub struct NewResume {
    pub title: String,
    pub content: ResumeContent,
    pub template_id: Option<Uuid>,
    pub user_id: Uuid,
}

/// Local edits to the current row's own columns.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResumeDetailsPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub template_id: Option<Uuid>,
}

#[derive(Clone, Copy)]
enum Activity {
    LoadingResumes,
    LoadingCurrent,
    LoadingTemplates,
    Saving,
}

impl Activity {
    fn flag(self, state: &mut ResumeState) -> &mut bool {
        match self {
            Activity::LoadingResumes => &mut state.is_loading_resumes,
            Activity::LoadingCurrent => &mut state.is_loading_current_resume,
            Activity::LoadingTemplates => &mut state.is_loading_templates,
            Activity::Saving => &mut state.is_saving_resume,
        }
    }
}

/// Clears its activity flag when dropped, so an abandoned request never
/// leaves the page spinning.
struct Busy<'a> {
    state: &'a watch::Sender<ResumeState>,
    activity: Activity,
}

impl Drop for Busy<'_> {
    fn drop(&mut self) {
        let activity = self.activity;
        self.state.send_modify(|s| *activity.flag(s) = false);
    }
}

/// Holds the résumé list, the résumé being edited, and the template catalog.
///
/// Remote operations never return errors: failures land in
/// `ResumeState::error` and the call reports `None`/`false`/an empty list.
/// Saves are last-write-wins; there is no version check against the row.
#[derive(Clone)]
pub struct ContentStore {
    remote: Arc<dyn ResumeRemote>,
    state: Arc<watch::Sender<ResumeState>>,
}

impl ContentStore {
    pub fn new(remote: Arc<dyn ResumeRemote>) -> Self {
        let (state, _) = watch::channel(ResumeState::default());
        Self {
            remote,
            state: Arc::new(state),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ResumeState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> ResumeState {
        self.state.borrow().clone()
    }

    pub fn current_resume(&self) -> Option<ResumeRow> {
        self.state.borrow().current_resume.clone()
    }

    pub fn current_content(&self) -> Option<ResumeContent> {
        self.state.borrow().current_content.clone()
    }

    fn begin(&self, activity: Activity) -> Busy<'_> {
        self.state.send_modify(|s| {
            *activity.flag(s) = true;
            s.error = None;
        });
        Busy {
            state: &self.state,
            activity,
        }
    }

    fn fail(&self, error: ResumeError) {
        self.state.send_modify(|s| s.error = Some(error));
    }

    /// Replaces the list with the caller's résumés, newest first. On failure
    /// the list is emptied rather than left stale.
    pub async fn fetch_resumes(&self, user_id: Uuid) -> Vec<ResumeRow> {
        let _busy = self.begin(Activity::LoadingResumes);

        match self.remote.list_resumes(user_id).await {
            Ok(rows) => {
                info!("Loaded {} resume(s) for user {user_id}", rows.len());
                self.state.send_modify(|s| s.resumes = rows.clone());
                rows
            }
            Err(e) => {
                warn!("Failed to load resumes for user {user_id}: {e}");
                self.state.send_modify(|s| {
                    s.resumes.clear();
                    s.error = Some(ResumeError::LoadFailed(e.user_message()));
                });
                Vec::new()
            }
        }
    }

    /// Loads one résumé into the current slot. A missing or foreign row
    /// empties the slot and records `NotFound`.
    pub async fn fetch_resume_by_id(&self, id: Uuid) -> Option<ResumeRow> {
        let _busy = self.begin(Activity::LoadingCurrent);

        let error = match self.remote.get_resume(id).await {
            Ok(Some(row)) => {
                let content = row.parsed_content();
                if content.is_none() {
                    warn!("Resume {id} has unreadable content; editor will start empty-handed");
                }
                self.state.send_modify(|s| {
                    s.current_resume = Some(row.clone());
                    s.current_content = content;
                });
                return Some(row);
            }
            Ok(None) => {
                info!("Resume {id} not found or not accessible");
                ResumeError::NotFound
            }
            Err(e) => {
                warn!("Failed to load resume {id}: {e}");
                ResumeError::LoadFailed(e.user_message())
            }
        };

        self.state.send_modify(|s| {
            s.current_resume = None;
            s.current_content = None;
            s.error = Some(error);
        });
        None
    }

    /// Inserts a new résumé, prepends it to the list and makes it current.
    pub async fn create_resume(&self, new: NewResume) -> Option<ResumeRow> {
        let _busy = self.begin(Activity::Saving);

        let content = match document::serialize(&new.content) {
            Ok(text) => text,
            Err(e) => {
                self.fail(ResumeError::CreateFailed(e.to_string()));
                return None;
            }
        };
        let row = NewResumeRow {
            user_id: new.user_id,
            title: new.title,
            content,
            template_id: new.template_id,
        };

        match self.remote.insert_resume(&row).await {
            Ok(Some(created)) => {
                info!("Created resume {} for user {}", created.id, created.user_id);
                let content = created.parsed_content().unwrap_or(new.content);
                self.state.send_modify(|s| {
                    s.resumes.insert(0, created.clone());
                    s.current_resume = Some(created.clone());
                    s.current_content = Some(content);
                });
                Some(created)
            }
            Ok(None) => {
                warn!("Insert into resumes returned no row");
                self.fail(ResumeError::CreateFailed("no row returned".to_string()));
                None
            }
            Err(e) => {
                warn!("Failed to create resume: {e}");
                self.fail(ResumeError::CreateFailed(e.user_message()));
                None
            }
        }
    }

    /// Local merge into the current row. Returns `false` when nothing is loaded.
    pub fn update_current_details(&self, patch: ResumeDetailsPatch) -> bool {
        self.state.send_if_modified(|s| {
            let Some(resume) = s.current_resume.as_mut() else {
                return false;
            };
            if let Some(title) = patch.title {
                resume.title = title;
            }
            if let Some(template_id) = patch.template_id {
                resume.template_id = Some(template_id);
            }
            true
        })
    }

    /// Local merge into the current content. Returns `false` when nothing is
    /// loaded.
    pub fn update_current_content(&self, patch: ContentPatch) -> bool {
        self.state.send_if_modified(|s| match s.current_content.as_mut() {
            Some(content) => {
                content.merge(patch);
                true
            }
            None => false,
        })
    }

    /// Writes title and content of the current résumé back, overwriting the
    /// row unconditionally. Returns `false` without any network call when no
    /// résumé or no content is loaded.
    pub async fn save(&self) -> bool {
        let (id, title, content) = {
            let state = self.state.borrow();
            match (&state.current_resume, &state.current_content) {
                (Some(resume), Some(content)) => (resume.id, resume.title.clone(), content.clone()),
                _ => return false,
            }
        };

        let _busy = self.begin(Activity::Saving);

        let update = match document::serialize(&content) {
            Ok(text) => ResumeUpdate {
                content: text,
                title,
                updated_at: Utc::now(),
            },
            Err(e) => {
                self.fail(ResumeError::SaveFailed(e.to_string()));
                return false;
            }
        };

        match self.remote.update_resume(id, &update).await {
            Ok(Some(saved)) => {
                info!("Saved resume {id}");
                self.state.send_modify(|s| {
                    if s.current_resume.as_ref().map(|r| r.id) == Some(saved.id) {
                        if let Some(parsed) = saved.parsed_content() {
                            s.current_content = Some(parsed);
                        }
                        s.current_resume = Some(saved.clone());
                    }
                    if let Some(entry) = s.resumes.iter_mut().find(|r| r.id == saved.id) {
                        *entry = saved.clone();
                    }
                });
                true
            }
            Ok(None) => {
                warn!("Update of resume {id} returned no row");
                self.fail(ResumeError::SaveFailed("no row returned".to_string()));
                false
            }
            Err(e) => {
                warn!("Failed to save resume {id}: {e}");
                self.fail(ResumeError::SaveFailed(e.user_message()));
                false
            }
        }
    }

    /// Deletes the row, drops it from the list, and clears the current slot
    /// if it held that résumé.
    pub async fn delete_resume(&self, id: Uuid) -> bool {
        self.state.send_modify(|s| s.error = None);

        match self.remote.delete_resume(id).await {
            Ok(()) => {
                info!("Deleted resume {id}");
                self.state.send_modify(|s| {
                    s.resumes.retain(|r| r.id != id);
                    if s.current_resume.as_ref().map(|r| r.id) == Some(id) {
                        s.current_resume = None;
                        s.current_content = None;
                    }
                });
                true
            }
            Err(e) => {
                warn!("Failed to delete resume {id}: {e}");
                self.fail(ResumeError::DeleteFailed(e.user_message()));
                false
            }
        }
    }

    /// Puts an already-fetched row in the current slot.
    pub fn select_resume(&self, resume: Option<ResumeRow>) {
        let content = resume.as_ref().and_then(ResumeRow::parsed_content);
        self.state.send_modify(|s| {
            s.current_resume = resume;
            s.current_content = content;
        });
    }

    /// Forgets the current résumé so it cannot leak into the next one loaded.
    pub fn clear_current(&self) {
        self.state.send_modify(|s| {
            s.current_resume = None;
            s.current_content = None;
        });
    }

    /// Loads the template catalog in its display order.
    pub async fn fetch_templates(&self) -> Vec<ResumeTemplateRow> {
        let _busy = self.begin(Activity::LoadingTemplates);

        match self.remote.list_templates().await {
            Ok(templates) => {
                self.state.send_modify(|s| s.templates = templates.clone());
                templates
            }
            Err(e) => {
                warn!("Failed to load templates: {e}");
                self.state.send_modify(|s| {
                    s.templates.clear();
                    s.error = Some(ResumeError::TemplatesFailed(e.user_message()));
                });
                Vec::new()
            }
        }
    }
}

//! Editing session – owns the resume being edited and re-renders the live
//! page from it on demand.

use log::debug;

use crate::catalog::{template, TemplateDescriptor};
use crate::dom::Document;
use crate::model::{Education, Experience, PersonalInfo, ProfilePicture, ResumeDocument, Skill};
use crate::templates::render_page;

/// Owned editing state. Every list keeps at least one entry.
#[derive(Debug, Clone, Default)]
pub struct EditingSession {
    document: ResumeDocument,
}

impl EditingSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of an existing document, restoring the one-entry
    /// minimum on any list that arrives empty.
    pub fn from_document(mut document: ResumeDocument) -> Self {
        if document.experiences.is_empty() {
            document.experiences.push(Experience::default());
        }
        if document.educations.is_empty() {
            document.educations.push(Education::default());
        }
        if document.skills.is_empty() {
            document.skills.push(Skill::default());
        }
        Self { document }
    }

    pub fn document(&self) -> &ResumeDocument {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut ResumeDocument {
        &mut self.document
    }

    pub fn into_document(self) -> ResumeDocument {
        self.document
    }

    pub fn template(&self) -> &'static TemplateDescriptor {
        template(self.document.selected_template)
    }

    /// Switch template. Unknown ids resolve to the first template.
    pub fn select_template(&mut self, id: u32) -> &'static TemplateDescriptor {
        let t = template(id);
        self.document.selected_template = t.id;
        debug!("selected template {} ({})", t.id, t.name);
        t
    }

    pub fn personal_info_mut(&mut self) -> &mut PersonalInfo {
        &mut self.document.personal_info
    }

    pub fn set_summary(&mut self, summary: impl Into<String>) {
        self.document.summary = summary.into();
    }

    // -- experiences ---------------------------------------------------------

    pub fn add_experience(&mut self) -> &mut Experience {
        push_default(&mut self.document.experiences)
    }

    pub fn update_experience(&mut self, id: &str, f: impl FnOnce(&mut Experience)) -> bool {
        update_entry(&mut self.document.experiences, id, |e| &e.id, f)
    }

    /// Refused (returns false) for the last remaining entry.
    pub fn remove_experience(&mut self, id: &str) -> bool {
        remove_entry(&mut self.document.experiences, id, |e| &e.id)
    }

    // -- educations ----------------------------------------------------------

    pub fn add_education(&mut self) -> &mut Education {
        push_default(&mut self.document.educations)
    }

    pub fn update_education(&mut self, id: &str, f: impl FnOnce(&mut Education)) -> bool {
        update_entry(&mut self.document.educations, id, |e| &e.id, f)
    }

    pub fn remove_education(&mut self, id: &str) -> bool {
        remove_entry(&mut self.document.educations, id, |e| &e.id)
    }

    // -- skills --------------------------------------------------------------

    pub fn add_skill(&mut self) -> &mut Skill {
        push_default(&mut self.document.skills)
    }

    pub fn update_skill(&mut self, id: &str, name: impl Into<String>) -> bool {
        let name = name.into();
        update_entry(&mut self.document.skills, id, |s| &s.id, |s| s.name = name)
    }

    pub fn remove_skill(&mut self, id: &str) -> bool {
        remove_entry(&mut self.document.skills, id, |s| &s.id)
    }

    // -- photo ---------------------------------------------------------------

    /// Attach a photo. Ignored (returns false) when the current template has
    /// no photo slot.
    pub fn set_profile_picture(&mut self, picture: ProfilePicture) -> bool {
        if !self.template().supports_photo {
            debug!("template {} has no photo slot; ignoring upload", self.template().id);
            return false;
        }
        self.document.profile_picture = Some(picture);
        true
    }

    pub fn clear_profile_picture(&mut self) {
        self.document.profile_picture = None;
    }

    /// Render the live page: hidden print target plus on-screen preview.
    pub fn render_page(&self) -> Document {
        render_page(&self.document)
    }
}

fn push_default<T: Default>(list: &mut Vec<T>) -> &mut T {
    list.push(T::default());
    let last = list.len() - 1;
    &mut list[last]
}

fn update_entry<T>(
    list: &mut [T],
    id: &str,
    id_of: impl Fn(&T) -> &String,
    f: impl FnOnce(&mut T),
) -> bool {
    match list.iter_mut().find(|e| id_of(e) == id) {
        Some(entry) => {
            f(entry);
            true
        }
        None => false,
    }
}

fn remove_entry<T>(list: &mut Vec<T>, id: &str, id_of: impl Fn(&T) -> &String) -> bool {
    if list.len() <= 1 {
        return false;
    }
    let before = list.len();
    list.retain(|e| id_of(e) != id);
    list.len() != before
}

//! Resume data model – the structured input every template renders from.
//!
//! Field names serialise in camelCase so that persisted snapshots and AI
//! payloads share one shape.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generate a fresh entry identifier.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonalInfo {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub linkedin: String,
    pub github: String,
    pub website: String,
}

impl PersonalInfo {
    /// Professional network links that are present, in display order.
    pub fn links(&self) -> Vec<&'static str> {
        let mut links = Vec::new();
        if !self.linkedin.is_empty() {
            links.push("LinkedIn");
        }
        if !self.github.is_empty() {
            links.push("GitHub");
        }
        if !self.website.is_empty() {
            links.push("Website");
        }
        links
    }

    /// Email, phone and address that are present, in display order.
    pub fn contact_items(&self) -> Vec<&str> {
        [&self.email, &self.phone, &self.address]
            .into_iter()
            .filter(|s| !s.is_empty())
            .map(|s| s.as_str())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Experience {
    pub id: String,
    pub company: String,
    pub position: String,
    pub start_date: String,
    pub end_date: String,
    pub description: String,
    pub current: bool,
}

impl Default for Experience {
    fn default() -> Self {
        Self {
            id: new_id(),
            company: String::new(),
            position: String::new(),
            start_date: String::new(),
            end_date: String::new(),
            description: String::new(),
            current: false,
        }
    }
}

impl Experience {
    /// Entries with neither a position nor a company are kept in the data
    /// but never displayed.
    pub fn is_displayable(&self) -> bool {
        !self.position.is_empty() || !self.company.is_empty()
    }

    /// End date as shown on the resume: "Present" whenever `current` is set.
    pub fn display_end_date(&self) -> &str {
        if self.current {
            "Present"
        } else {
            &self.end_date
        }
    }

    pub fn date_range(&self) -> String {
        format!("{} - {}", self.start_date, self.display_end_date())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Education {
    pub id: String,
    pub school: String,
    pub degree: String,
    pub field: String,
    pub start_date: String,
    pub end_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gpa: Option<String>,
}

impl Default for Education {
    fn default() -> Self {
        Self {
            id: new_id(),
            school: String::new(),
            degree: String::new(),
            field: String::new(),
            start_date: String::new(),
            end_date: String::new(),
            gpa: None,
        }
    }
}

impl Education {
    pub fn is_displayable(&self) -> bool {
        !self.school.is_empty() || !self.degree.is_empty()
    }

    /// "<degree> in <field>", or just the degree when no field is given.
    pub fn degree_line(&self) -> String {
        if self.field.is_empty() {
            self.degree.clone()
        } else if self.degree.is_empty() {
            format!("in {}", self.field)
        } else {
            format!("{} in {}", self.degree, self.field)
        }
    }

    pub fn date_range(&self) -> String {
        format!("{} - {}", self.start_date, self.end_date)
    }

    pub fn gpa(&self) -> Option<&str> {
        self.gpa.as_deref().filter(|g| !g.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Skill {
    pub id: String,
    pub name: String,
}

impl Default for Skill {
    fn default() -> Self {
        Self {
            id: new_id(),
            name: String::new(),
        }
    }
}

impl Skill {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// An uploaded profile photo: the data URI used for display plus the raw
/// base64 payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfilePicture {
    pub url: String,
    pub base64: String,
}

impl ProfilePicture {
    pub fn from_data_uri(uri: impl Into<String>) -> Self {
        let url = uri.into();
        Self {
            base64: url.clone(),
            url,
        }
    }
}

/// The whole resume held by one editing session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeDocument {
    pub personal_info: PersonalInfo,
    pub summary: String,
    pub experiences: Vec<Experience>,
    pub educations: Vec<Education>,
    pub skills: Vec<Skill>,
    pub profile_picture: Option<ProfilePicture>,
    pub selected_template: u32,
}

impl Default for ResumeDocument {
    fn default() -> Self {
        Self {
            personal_info: PersonalInfo::default(),
            summary: String::new(),
            experiences: vec![Experience::default()],
            educations: vec![Education::default()],
            skills: vec![Skill::default()],
            profile_picture: None,
            selected_template: 1,
        }
    }
}

impl ResumeDocument {
    pub fn full_name(&self) -> &str {
        &self.personal_info.full_name
    }

    pub fn has_displayable_experience(&self) -> bool {
        self.experiences.iter().any(Experience::is_displayable)
    }

    pub fn has_displayable_education(&self) -> bool {
        self.educations.iter().any(Education::is_displayable)
    }

    pub fn has_displayable_skill(&self) -> bool {
        self.skills.iter().any(|s| !s.name.is_empty())
    }

    pub fn displayable_experiences(&self) -> impl Iterator<Item = &Experience> {
        self.experiences.iter().filter(|e| e.is_displayable())
    }

    pub fn displayable_educations(&self) -> impl Iterator<Item = &Education> {
        self.educations.iter().filter(|e| e.is_displayable())
    }

    pub fn displayable_skills(&self) -> impl Iterator<Item = &Skill> {
        self.skills.iter().filter(|s| !s.name.is_empty())
    }

    /// The "start filling out the form" placeholder shows while name, summary
    /// and every position are blank.
    pub fn shows_placeholder(&self) -> bool {
        self.personal_info.full_name.is_empty()
            && self.summary.is_empty()
            && self.experiences.iter().all(|e| e.position.is_empty())
    }

    /// Export refuses documents with no name, summary, position or school.
    pub fn is_export_empty(&self) -> bool {
        self.shows_placeholder() && self.educations.iter().all(|e| e.school.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_document_keeps_one_placeholder_per_list() {
        let doc = ResumeDocument::default();
        assert_eq!(doc.experiences.len(), 1);
        assert_eq!(doc.educations.len(), 1);
        assert_eq!(doc.skills.len(), 1);
        assert!(doc.is_export_empty());
        assert!(doc.shows_placeholder());
    }

    #[test]
    fn current_experience_reads_present() {
        let exp = Experience {
            end_date: "2021-05".into(),
            current: true,
            start_date: "2019".into(),
            ..Experience::default()
        };
        assert_eq!(exp.display_end_date(), "Present");
        assert_eq!(exp.date_range(), "2019 - Present");
    }

    #[test]
    fn degree_line_omits_empty_field() {
        let mut edu = Education {
            degree: "BSc".into(),
            ..Education::default()
        };
        assert_eq!(edu.degree_line(), "BSc");
        edu.field = "Physics".into();
        assert_eq!(edu.degree_line(), "BSc in Physics");
    }

    #[test]
    fn school_alone_makes_document_exportable() {
        let mut doc = ResumeDocument::default();
        doc.educations[0].school = "State University".into();
        assert!(!doc.is_export_empty());
        assert!(doc.shows_placeholder());
    }

    #[test]
    fn snapshot_field_names_are_camel_case() {
        let doc = ResumeDocument::default();
        let json = serde_json::to_string(&doc).unwrap();
        assert!(json.contains("\"personalInfo\""));
        assert!(json.contains("\"fullName\""));
        assert!(json.contains("\"startDate\""));
    }
}

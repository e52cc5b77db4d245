//! AI generation – asks a chain of chat-completion backends to draft resume
//! content from a free-text prompt, and merges the result into a document.
//!
//! Backends are tried in order, each under its own timeout. The first one
//! that answers with parseable JSON wins; if all fail, every reason is
//! reported together. Failures never reach the user: callers log them.

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, error, info, warn};
use reqwest::Client;
use serde::{Deserialize, Deserializer, Serialize};

use crate::config::AiConfig;
use crate::error::AiError;
use crate::model::{new_id, Education, Experience, ResumeDocument, Skill};

pub const EMPTY_PROMPT_NOTICE: &str =
    "Please enter a prompt describing your background, experience, and skills.";

pub const SYSTEM_PROMPT: &str = r#"You are an expert resume writer. Return a valid JSON object. No markdown. No conversation.
Structure:
{
  "personalInfo": { "fullName": "", "email": "", "phone": "", "address": "", "linkedin": "", "github": "" },
  "summary": "",
  "experiences": [ { "company": "", "position": "", "startDate": "", "endDate": "", "description": "", "current": false } ],
  "educations": [ { "school": "", "degree": "", "field": "", "startDate": "", "endDate": "", "gpa": "" } ],
  "skills": [ "Skill1", "Skill2" ]
}"#;

const PRESENT: &str = "Present";

/// One chat-completion model.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Name used in failure reasons.
    fn name(&self) -> &str;

    /// Return the model's raw text answer.
    async fn complete(&self, system: &str, user: &[String]) -> Result<String, AiError>;
}

// ---------------------------------------------------------------------------
// OpenRouter
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// A single model behind the OpenRouter chat-completions API.
#[derive(Clone)]
pub struct OpenRouterBackend {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenRouterBackend {
    pub fn new(client: Client, config: &AiConfig, model: impl Into<String>) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: model.into(),
        }
    }

    /// One backend per configured model, sharing an HTTP client.
    pub fn chain(config: &AiConfig) -> Result<Vec<Box<dyn CompletionBackend>>, AiError> {
        let client = Client::builder().build()?;
        Ok(config
            .models
            .iter()
            .map(|m| Box::new(Self::new(client.clone(), config, m.clone())) as Box<dyn CompletionBackend>)
            .collect())
    }
}

#[async_trait]
impl CompletionBackend for OpenRouterBackend {
    fn name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, system: &str, user: &[String]) -> Result<String, AiError> {
        let mut messages = vec![ChatMessage {
            role: "system",
            content: system,
        }];
        messages.extend(user.iter().map(|content| ChatMessage {
            role: "user",
            content,
        }));
        let body = ChatRequest {
            model: &self.model,
            messages,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .header("HTTP-Referer", "http://localhost:3000")
            .header("X-Title", "Resume Builder")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorEnvelope>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(AiError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ChatResponse = response.json().await?;
        let choice = parsed.choices.into_iter().next().ok_or(AiError::EmptyContent)?;
        // A null message body counts as an empty object.
        Ok(choice.message.content.unwrap_or_else(|| "{}".to_string()))
    }
}

// ---------------------------------------------------------------------------
// Generated payload
// ---------------------------------------------------------------------------

/// The `data` object a model answers with. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GeneratedData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub personal_info: Option<PersonalInfoPatch>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "opt_lenient_string")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experiences: Option<Vec<GeneratedExperience>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub educations: Option<Vec<GeneratedEducation>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skills: Option<Vec<GeneratedSkill>>,
}

/// Personal details to merge; absent fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonalInfoPatch {
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "opt_lenient_string")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "opt_lenient_string")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "opt_lenient_string")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "opt_lenient_string")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "opt_lenient_string")]
    pub linkedin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "opt_lenient_string")]
    pub github: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "opt_lenient_string")]
    pub website: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GeneratedExperience {
    #[serde(deserialize_with = "lenient_string")]
    pub company: String,
    #[serde(deserialize_with = "lenient_string")]
    pub position: String,
    #[serde(deserialize_with = "lenient_string")]
    pub start_date: String,
    #[serde(deserialize_with = "lenient_string")]
    pub end_date: String,
    #[serde(deserialize_with = "lenient_string")]
    pub description: String,
    #[serde(deserialize_with = "lenient_bool")]
    pub current: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GeneratedEducation {
    #[serde(deserialize_with = "lenient_string")]
    pub school: String,
    #[serde(deserialize_with = "lenient_string")]
    pub degree: String,
    #[serde(deserialize_with = "lenient_string")]
    pub field: String,
    #[serde(deserialize_with = "lenient_string")]
    pub start_date: String,
    #[serde(deserialize_with = "lenient_string")]
    pub end_date: String,
    #[serde(deserialize_with = "lenient_string")]
    pub gpa: String,
}

/// Skills arrive as bare strings; `{ "name": ... }` objects are accepted too.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GeneratedSkill {
    Name(String),
    Entry { name: String },
}

impl GeneratedSkill {
    pub fn name(&self) -> &str {
        match self {
            GeneratedSkill::Name(n) | GeneratedSkill::Entry { name: n } => n,
        }
    }
}

/// Strings, numbers and booleans all become strings; null becomes empty.
fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(match serde_json::Value::deserialize(d)? {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}

fn opt_lenient_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    lenient_string(d).map(Some)
}

fn lenient_bool<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    Ok(match serde_json::Value::deserialize(d)? {
        serde_json::Value::Bool(b) => b,
        serde_json::Value::String(s) => s.eq_ignore_ascii_case("true"),
        _ => false,
    })
}

/// Wire shape of a generation answer: `{success, data?, error?}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<GeneratedData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<Result<GeneratedData, AiError>> for GenerationResponse {
    fn from(result: Result<GeneratedData, AiError>) -> Self {
        match result {
            Ok(data) => Self {
                success: true,
                data: Some(data),
                error: None,
            },
            Err(e) => Self {
                success: false,
                data: None,
                error: Some(e.to_string()),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

/// Strip a surrounding ```json ... ``` (or bare ```) fence.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let inner = if let Some(rest) = text.strip_prefix("```") {
        let rest = match rest.get(..4) {
            Some(tag) if tag.eq_ignore_ascii_case("json") => &rest[4..],
            _ => rest,
        };
        rest.trim_start()
    } else {
        text
    };
    inner
        .strip_suffix("```")
        .map(str::trim_end)
        .unwrap_or(inner)
}

/// User messages for one request: the prompt, then the current document as
/// context when it has any content.
fn user_messages(prompt: &str, existing: &ResumeDocument) -> Vec<String> {
    let mut messages = vec![prompt.to_string()];
    if !existing.is_export_empty() {
        match serde_json::to_string(&ExistingData::from(existing)) {
            Ok(json) => messages.push(format!("Current resume data (JSON): {json}")),
            Err(e) => warn!("could not serialise existing resume data: {e}"),
        }
    }
    messages
}

/// The document fields sent to a model as context.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExistingData<'a> {
    personal_info: &'a crate::model::PersonalInfo,
    experiences: &'a [Experience],
    educations: &'a [Education],
    skills: &'a [Skill],
    summary: &'a str,
}

impl<'a> From<&'a ResumeDocument> for ExistingData<'a> {
    fn from(doc: &'a ResumeDocument) -> Self {
        Self {
            personal_info: &doc.personal_info,
            experiences: &doc.experiences,
            educations: &doc.educations,
            skills: &doc.skills,
            summary: &doc.summary,
        }
    }
}

/// Try each backend in order until one returns valid JSON.
pub async fn generate(
    backends: &[Box<dyn CompletionBackend>],
    prompt: &str,
    existing: &ResumeDocument,
    timeout: Duration,
) -> Result<GeneratedData, AiError> {
    if prompt.trim().is_empty() {
        return Err(AiError::EmptyPrompt);
    }
    let messages = user_messages(prompt, existing);
    let mut reasons = Vec::new();

    for backend in backends {
        let name = backend.name();
        info!("attempting generation with {name}");

        let answer = match tokio::time::timeout(timeout, backend.complete(SYSTEM_PROMPT, &messages)).await {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                warn!("{name} failed: {e}");
                reasons.push(format!("{name}: {e}"));
                continue;
            }
            Err(_) => {
                let e = AiError::Timeout(timeout.as_secs());
                warn!("{name} failed: {e}");
                reasons.push(format!("{name}: {e}"));
                continue;
            }
        };

        match serde_json::from_str::<GeneratedData>(strip_json_fences(&answer)) {
            Ok(data) => {
                info!("generation succeeded with {name}");
                return Ok(data);
            }
            Err(e) => {
                debug!("{name} answer did not parse: {e}");
                warn!("{name} returned invalid JSON");
                reasons.push(format!("{name}: {}", AiError::InvalidJson));
            }
        }
    }

    error!("all models failed: {reasons:?}");
    Err(AiError::AllFailed(reasons))
}

/// Merge generated content into `doc`.
///
/// Personal details merge field by field; a non-empty summary replaces the
/// old one; experience, education and skill lists are replaced wholesale
/// with fresh ids. An end date of "Present" becomes an empty end date with
/// the `current` flag set.
pub fn apply_generated(doc: &mut ResumeDocument, data: GeneratedData) {
    if let Some(patch) = data.personal_info {
        let info = &mut doc.personal_info;
        let fields = [
            (patch.full_name, &mut info.full_name),
            (patch.email, &mut info.email),
            (patch.phone, &mut info.phone),
            (patch.address, &mut info.address),
            (patch.linkedin, &mut info.linkedin),
            (patch.github, &mut info.github),
            (patch.website, &mut info.website),
        ];
        for (value, slot) in fields {
            if let Some(v) = value {
                *slot = v;
            }
        }
    }

    if let Some(summary) = data.summary.filter(|s| !s.is_empty()) {
        doc.summary = summary;
    }

    if let Some(experiences) = data.experiences {
        doc.experiences = experiences
            .into_iter()
            .map(|e| {
                let present = e.end_date == PRESENT;
                Experience {
                    id: new_id(),
                    company: e.company,
                    position: e.position,
                    start_date: e.start_date,
                    end_date: if present { String::new() } else { e.end_date },
                    description: e.description,
                    current: present || e.current,
                }
            })
            .collect();
        if doc.experiences.is_empty() {
            doc.experiences.push(Experience::default());
        }
    }

    if let Some(educations) = data.educations {
        doc.educations = educations
            .into_iter()
            .map(|e| Education {
                id: new_id(),
                school: e.school,
                degree: e.degree,
                field: e.field,
                start_date: e.start_date,
                end_date: e.end_date,
                gpa: Some(e.gpa).filter(|g| !g.is_empty()),
            })
            .collect();
        if doc.educations.is_empty() {
            doc.educations.push(Education::default());
        }
    }

    if let Some(skills) = data.skills {
        doc.skills = skills.iter().map(|s| Skill::named(s.name())).collect();
        if doc.skills.is_empty() {
            doc.skills.push(Skill::default());
        }
    }
}

/// Apply a wire response. Anything but `{success: true, data}` is logged and
/// otherwise ignored; returns whether the document changed.
pub fn apply_response(doc: &mut ResumeDocument, response: GenerationResponse) -> bool {
    match response {
        GenerationResponse {
            success: true,
            data: Some(data),
            ..
        } => {
            apply_generated(doc, data);
            true
        }
        GenerationResponse { error, .. } => {
            error!(
                "resume generation failed: {}",
                error.as_deref().unwrap_or("Invalid response from AI")
            );
            false
        }
    }
}

/// Generate and merge in one step. Failures are logged only.
pub async fn generate_into(
    doc: &mut ResumeDocument,
    backends: &[Box<dyn CompletionBackend>],
    prompt: &str,
    timeout: Duration,
) -> bool {
    let response = GenerationResponse::from(generate(backends, prompt, doc, timeout).await);
    apply_response(doc, response)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Canned {
        name: &'static str,
        answer: Result<&'static str, u16>,
        delay: Duration,
    }

    impl Canned {
        fn ok(name: &'static str, answer: &'static str) -> Box<dyn CompletionBackend> {
            Box::new(Self {
                name,
                answer: Ok(answer),
                delay: Duration::ZERO,
            })
        }

        fn status(name: &'static str, status: u16) -> Box<dyn CompletionBackend> {
            Box::new(Self {
                name,
                answer: Err(status),
                delay: Duration::ZERO,
            })
        }

        fn slow(name: &'static str) -> Box<dyn CompletionBackend> {
            Box::new(Self {
                name,
                answer: Ok("{}"),
                delay: Duration::from_secs(3600),
            })
        }
    }

    #[async_trait]
    impl CompletionBackend for Canned {
        fn name(&self) -> &str {
            self.name
        }

        async fn complete(&self, _system: &str, _user: &[String]) -> Result<String, AiError> {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            match self.answer {
                Ok(text) => Ok(text.to_string()),
                Err(status) => Err(AiError::Api {
                    status,
                    message: "upstream down".into(),
                }),
            }
        }
    }

    const GOOD: &str = r#"```json
{
  "personalInfo": { "fullName": "Alex Kim", "email": "alex@example.com" },
  "summary": "Systems engineer.",
  "experiences": [
    { "company": "Acme", "position": "Engineer", "startDate": "2020", "endDate": "Present", "description": "", "current": false }
  ],
  "educations": [ { "school": "MIT", "degree": "BSc", "field": "CS", "gpa": 3.9 } ],
  "skills": [ "Rust", "Go" ]
}
```"#;

    #[test]
    fn fences_are_stripped() {
        assert_eq!(strip_json_fences("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_json_fences("```JSON {\"a\": 1}```"), "{\"a\": 1}");
        assert_eq!(strip_json_fences("```\n{}\n```"), "{}");
        assert_eq!(strip_json_fences("  {\"a\": 1} "), "{\"a\": 1}");
    }

    #[tokio::test]
    async fn falls_through_to_the_first_valid_answer() {
        let backends = vec![
            Canned::status("a:free", 429),
            Canned::ok("b:free", "Sure! Here is your resume."),
            Canned::ok("c:free", GOOD),
        ];
        let data = generate(&backends, "I build compilers", &ResumeDocument::default(), Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(data.summary.as_deref(), Some("Systems engineer."));
        assert_eq!(data.skills.as_ref().map(Vec::len), Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn every_reason_is_reported_when_all_fail() {
        let backends = vec![
            Canned::status("a:free", 500),
            Canned::ok("b:free", "not json"),
            Canned::slow("c:free"),
        ];
        let err = generate(&backends, "x", &ResumeDocument::default(), Duration::from_secs(60))
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "All models failed. Details:\n\
             a:free: API error (status 500): upstream down\n\
             b:free: Invalid JSON\n\
             c:free: timed out after 60s"
        );
    }

    #[tokio::test]
    async fn blank_prompt_is_rejected_without_calls() {
        let backends = vec![Canned::ok("a:free", GOOD)];
        let err = generate(&backends, "  \n", &ResumeDocument::default(), Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, AiError::EmptyPrompt));
    }

    #[test]
    fn generated_content_is_merged() {
        let mut doc = ResumeDocument::default();
        doc.personal_info.phone = "555-0100".into();
        doc.summary = "old".into();
        let old_skill_id = doc.skills[0].id.clone();

        let data: GeneratedData = serde_json::from_str(strip_json_fences(GOOD)).unwrap();
        apply_generated(&mut doc, data);

        assert_eq!(doc.personal_info.full_name, "Alex Kim");
        assert_eq!(doc.personal_info.phone, "555-0100");
        assert_eq!(doc.summary, "Systems engineer.");

        let exp = &doc.experiences[0];
        assert!(exp.current);
        assert_eq!(exp.end_date, "");
        assert_eq!(exp.display_end_date(), "Present");

        assert_eq!(doc.educations[0].gpa(), Some("3.9"));
        let names: Vec<&str> = doc.skills.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Rust", "Go"]);
        assert_ne!(doc.skills[0].id, old_skill_id);
    }

    #[test]
    fn empty_summary_and_lists_keep_invariants() {
        let mut doc = ResumeDocument::default();
        doc.summary = "keep me".into();
        let data: GeneratedData =
            serde_json::from_str(r#"{"summary": "", "skills": [], "experiences": []}"#).unwrap();
        apply_generated(&mut doc, data);
        assert_eq!(doc.summary, "keep me");
        assert_eq!(doc.skills.len(), 1);
        assert_eq!(doc.experiences.len(), 1);
    }

    #[test]
    fn failed_response_leaves_document_alone() {
        let mut doc = ResumeDocument::default();
        doc.summary = "untouched".into();
        let before = doc.clone();
        let response: GenerationResponse =
            serde_json::from_str(r#"{"success": false, "error": "All models failed. Details:\nx"}"#).unwrap();
        assert!(!apply_response(&mut doc, response));
        assert_eq!(doc, before);
    }

    #[test]
    fn object_skills_are_accepted() {
        let data: GeneratedData = serde_json::from_str(r#"{"skills": [{"name": "Rust"}, "Go"]}"#).unwrap();
        let skills = data.skills.unwrap();
        let names: Vec<&str> = skills.iter().map(GeneratedSkill::name).collect();
        assert_eq!(names, vec!["Rust", "Go"]);
    }
}

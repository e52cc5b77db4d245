//! Template renderer – turns a [`ResumeDocument`] into a visual tree.
//!
//! `render` is a pure function of the document and template id. It is called
//! once per surface: the hidden, fixed-width print target consumed by export,
//! and the visible on-screen preview. Both surfaces carry identical content
//! and differ only in their container.

use crate::catalog::{template, LayoutVariant, TemplateDescriptor};
use crate::colors::ColorScheme;
use crate::dom::{el, Document, ElementNode, Tag};
use crate::model::{Education, Experience, ResumeDocument};

/// Stable id of the print target subtree.
pub const PRINT_TARGET_ID: &str = "resume-preview-print";
/// Stable id of the on-screen preview subtree.
pub const SCREEN_PREVIEW_ID: &str = "resume-preview";

pub const PLACEHOLDER_TEXT: &str = "Start filling out the form to see your resume preview here";

/// Which presentation container the content is rendered into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    Print,
    Screen,
}

/// How a layout presents the skills list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SkillStyle {
    Pills,
    Bullets,
    Inline,
}

/// Header arrangement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HeaderStyle {
    Centered,
    Banner,
    Left,
    WithPhoto,
}

/// Render the resume for one surface.
pub fn render(doc: &ResumeDocument, template_id: u32, surface: Surface) -> ElementNode {
    let t = template(template_id);
    let container = match surface {
        Surface::Print => el(Tag::Div)
            .id(PRINT_TARGET_ID)
            .class("hidden resume-print bg-white p-8")
            .style("width", "8.5in")
            .style("min-height", "11in"),
        Surface::Screen => el(Tag::Div)
            .id(SCREEN_PREVIEW_ID)
            .class("resume-screen bg-white p-8 w-full"),
    };
    container.children(content(doc, t))
}

/// Render the live page body: the hidden print target followed by the
/// visible preview, both for the document's selected template.
pub fn render_page(doc: &ResumeDocument) -> Document {
    let id = doc.selected_template;
    Document::new(vec![
        render(doc, id, Surface::Print).into(),
        render(doc, id, Surface::Screen).into(),
    ])
}

/// Wrap a live page in a standalone HTML document for browser preview.
pub fn page_html(page: &Document, title: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n\
         <script src=\"https://cdn.tailwindcss.com\"></script>\n\
         <style>\n@media print {{\n  #{SCREEN_PREVIEW_ID} {{ display: none !important; }}\n  \
         #{PRINT_TARGET_ID} {{ display: block !important; }}\n}}\n.whitespace-pre-line {{ white-space: pre-line; }}\n</style>\n\
         </head>\n{}\n</html>\n",
        page.to_html()
    )
}

// ---------------------------------------------------------------------------
// Layout variants
// ---------------------------------------------------------------------------

fn content(doc: &ResumeDocument, t: &TemplateDescriptor) -> Vec<ElementNode> {
    let colors = t.colors();
    let mut nodes: Vec<ElementNode> = Vec::new();

    match t.layout {
        LayoutVariant::Classic => {
            nodes.extend(header(doc, t, HeaderStyle::Centered));
            nodes.extend(summary_block(doc, &colors, false));
            nodes.extend(experience_block(doc, &colors, false));
            nodes.extend(education_block(doc, &colors, false));
            nodes.extend(skills_block(doc, t, SkillStyle::Pills, false));
        }
        LayoutVariant::Banner => {
            nodes.extend(header(doc, t, HeaderStyle::Banner));
            nodes.extend(summary_block(doc, &colors, true));
            nodes.extend(experience_block(doc, &colors, true));
            nodes.extend(education_block(doc, &colors, true));
            nodes.extend(skills_block(doc, t, SkillStyle::Bullets, true));
        }
        LayoutVariant::Sidebar => {
            let side = el(Tag::Div)
                .class(&format!("w-1/3 {} p-4 rounded", colors.bg_light))
                .children(header(doc, t, HeaderStyle::Left))
                .children(skills_block(doc, t, SkillStyle::Bullets, true));
            let main = el(Tag::Div)
                .class("w-2/3")
                .children(summary_block(doc, &colors, true))
                .children(experience_block(doc, &colors, true))
                .children(education_block(doc, &colors, true));
            nodes.push(el(Tag::Div).class("flex gap-6").child(side).child(main));
        }
        LayoutVariant::TwoColumn => {
            nodes.extend(header(doc, t, HeaderStyle::Centered));
            nodes.extend(summary_block(doc, &colors, false));
            let left = el(Tag::Div)
                .class("w-1/2")
                .children(experience_block(doc, &colors, false));
            let right = el(Tag::Div)
                .class("w-1/2")
                .children(education_block(doc, &colors, false))
                .children(skills_block(doc, t, SkillStyle::Inline, false));
            if !left.children.is_empty() || !right.children.is_empty() {
                nodes.push(el(Tag::Div).class("flex gap-6").child(left).child(right));
            }
        }
        LayoutVariant::Panel => {
            let rule = el(Tag::Div)
                .class(&format!("border-l-4 {} pl-6", colors.border))
                .children(header(doc, t, HeaderStyle::Left))
                .children(summary_block(doc, &colors, true))
                .children(experience_block(doc, &colors, true))
                .children(education_block(doc, &colors, true))
                .children(skills_block(doc, t, SkillStyle::Inline, true));
            if !rule.children.is_empty() {
                nodes.push(rule);
            }
        }
        LayoutVariant::Modern => {
            nodes.extend(header(doc, t, HeaderStyle::WithPhoto));
            nodes.extend(summary_block(doc, &colors, true));
            nodes.extend(experience_block(doc, &colors, true));
            nodes.extend(education_block(doc, &colors, true));
            nodes.extend(skills_block(doc, t, SkillStyle::Pills, true));
        }
    }

    if doc.shows_placeholder() {
        nodes.push(
            el(Tag::Div)
                .class("text-center py-12 text-slate-400")
                .child(el(Tag::P).text(PLACEHOLDER_TEXT)),
        );
    }
    nodes
}

// ---------------------------------------------------------------------------
// Blocks
// ---------------------------------------------------------------------------

fn header(doc: &ResumeDocument, t: &TemplateDescriptor, style: HeaderStyle) -> Option<ElementNode> {
    let info = &doc.personal_info;
    if info.full_name.is_empty() {
        return None;
    }
    let colors = t.colors();
    let centered = style == HeaderStyle::Centered;
    let justify = if centered { "justify-center" } else { "justify-start" };

    let name = el(Tag::H1)
        .class(if style == HeaderStyle::Banner {
            colors.text
        } else {
            "text-slate-900"
        })
        .class("text-3xl font-bold mb-2")
        .text(info.full_name.as_str());

    let contact = el(Tag::Div)
        .class(&format!("flex flex-wrap {justify} gap-3 text-sm text-slate-600"))
        .children(info.contact_items().into_iter().enumerate().map(|(i, item)| {
            el(Tag::Span).text(if i == 0 {
                item.to_string()
            } else {
                format!("\u{2022} {item}")
            })
        }));

    let links = info.links();
    let links_line = (!links.is_empty()).then(|| {
        el(Tag::Div)
            .class(&format!("flex flex-wrap {justify} gap-3 text-sm {} mt-2", colors.text))
            .children(links.into_iter().enumerate().map(|(i, l)| {
                el(Tag::Span).text(if i == 0 {
                    l.to_string()
                } else {
                    format!("\u{2022} {l}")
                })
            }))
    });

    let identity = el(Tag::Div)
        .class(if centered { "text-center" } else { "text-left" })
        .child(name)
        .child(contact)
        .children(links_line);

    let photo = photo(doc, t);
    let block = match style {
        HeaderStyle::Centered => el(Tag::Div)
            .class(&format!("text-center mb-6 border-b-2 {} pb-4", colors.border))
            .children(photo)
            .children(identity.children),
        HeaderStyle::Banner => el(Tag::Div)
            .class(&format!("flex items-center gap-4 {} p-6 mb-6 rounded", colors.bg_light))
            .children(photo)
            .child(identity),
        HeaderStyle::Left => el(Tag::Div)
            .class("mb-6")
            .children(photo)
            .child(identity),
        HeaderStyle::WithPhoto => el(Tag::Div)
            .class(&format!("flex items-center gap-4 mb-6 border-b {} pb-4", colors.border))
            .children(photo)
            .child(identity),
    };
    Some(block)
}

fn photo(doc: &ResumeDocument, t: &TemplateDescriptor) -> Option<ElementNode> {
    if !t.supports_photo {
        return None;
    }
    let pic = doc.profile_picture.as_ref()?;
    Some(
        el(Tag::Img)
            .class("rounded-full w-24 h-24 mb-2")
            .attr("alt", "Profile")
            .attr("src", pic.url.as_str()),
    )
}

fn section_heading(title: &str, colors: &ColorScheme, accent_text: bool) -> ElementNode {
    el(Tag::H2)
        .class(if accent_text { colors.text } else { "text-slate-900" })
        .class(&format!("text-lg font-bold mb-3 border-b {} pb-1", colors.border))
        .text(title)
}

fn summary_block(doc: &ResumeDocument, colors: &ColorScheme, accent: bool) -> Option<ElementNode> {
    if doc.summary.is_empty() {
        return None;
    }
    Some(
        el(Tag::Div)
            .class("mb-6")
            .child(section_heading("Professional Summary", colors, accent))
            .child(
                el(Tag::P)
                    .class("text-slate-700 text-sm leading-relaxed")
                    .text(doc.summary.as_str()),
            ),
    )
}

fn experience_block(doc: &ResumeDocument, colors: &ColorScheme, accent: bool) -> Option<ElementNode> {
    if !doc.has_displayable_experience() {
        return None;
    }
    Some(
        el(Tag::Div)
            .class("mb-6")
            .child(section_heading("Work Experience", colors, accent))
            .children(doc.displayable_experiences().map(experience_item)),
    )
}

fn experience_item(exp: &Experience) -> ElementNode {
    let title = el(Tag::Div)
        .child(el(Tag::H3).class("font-bold text-slate-900").text(exp.position.as_str()))
        .child(el(Tag::P).class("text-slate-700 text-sm").text(exp.company.as_str()));
    let dates = el(Tag::Span)
        .class("text-sm text-slate-600 whitespace-nowrap ml-4")
        .text(exp.date_range());
    let row = el(Tag::Div)
        .class("flex justify-between items-start mb-1")
        .child(title)
        .child(dates);

    let description = (!exp.description.is_empty()).then(|| {
        el(Tag::P)
            .class("text-slate-600 text-sm mt-1 whitespace-pre-line")
            .text(exp.description.as_str())
    });

    el(Tag::Div)
        .class("mb-4")
        .attr("data-entry", exp.id.as_str())
        .child(row)
        .children(description)
}

fn education_block(doc: &ResumeDocument, colors: &ColorScheme, accent: bool) -> Option<ElementNode> {
    if !doc.has_displayable_education() {
        return None;
    }
    Some(
        el(Tag::Div)
            .class("mb-6")
            .child(section_heading("Education", colors, accent))
            .children(doc.displayable_educations().map(education_item)),
    )
}

fn education_item(edu: &Education) -> ElementNode {
    let gpa = edu
        .gpa()
        .map(|g| el(Tag::Span).text(format!("GPA: {g}")));
    el(Tag::Div)
        .class("mb-3")
        .attr("data-entry", edu.id.as_str())
        .child(el(Tag::H3).class("font-bold text-slate-900").text(edu.degree_line()))
        .child(el(Tag::P).class("text-slate-700 text-sm").text(edu.school.as_str()))
        .child(
            el(Tag::Div)
                .class("flex justify-between text-sm text-slate-600")
                .child(el(Tag::Span).text(edu.date_range()))
                .children(gpa),
        )
}

fn skills_block(
    doc: &ResumeDocument,
    t: &TemplateDescriptor,
    style: SkillStyle,
    accent: bool,
) -> Option<ElementNode> {
    if !doc.has_displayable_skill() {
        return None;
    }
    let colors = t.colors();
    let names: Vec<&str> = doc.displayable_skills().map(|s| s.name.as_str()).collect();

    let body = match style {
        SkillStyle::Pills => el(Tag::Div).class("flex flex-wrap gap-2").children(
            names.iter().map(|name| {
                el(Tag::Span)
                    .class(t.badge_color)
                    .class("px-3 py-1 rounded text-sm font-bold whitespace-nowrap")
                    .text(*name)
            }),
        ),
        SkillStyle::Bullets => el(Tag::Ul)
            .class("text-sm text-slate-700")
            .children(names.iter().map(|name| el(Tag::Li).text(*name))),
        SkillStyle::Inline => el(Tag::P)
            .class("text-sm text-slate-700")
            .text(names.join(" \u{2022} ")),
    };

    Some(
        el(Tag::Div)
            .class("mb-6")
            .child(section_heading("Skills", &colors, accent))
            .child(body),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::TEMPLATES;
    use crate::model::{Experience, ProfilePicture, Skill};

    fn alex() -> ResumeDocument {
        let mut doc = ResumeDocument::default();
        doc.personal_info.full_name = "Alex Kim".into();
        doc.experiences[0] = Experience {
            position: "Engineer".into(),
            company: "Acme".into(),
            start_date: "2018".into(),
            end_date: "2020".into(),
            current: true,
            ..Experience::default()
        };
        doc
    }

    #[test]
    fn current_role_renders_present() {
        let tree = render(&alex(), 1, Surface::Screen);
        let text = tree.text_content();
        assert!(text.contains("Engineer"));
        assert!(text.contains("Acme"));
        assert!(text.contains("2018 - Present"));
        assert!(!text.contains("2020"));
    }

    #[test]
    fn empty_entries_are_filtered_from_display_only() {
        let mut doc = alex();
        doc.experiences.push(Experience::default());
        doc.skills.push(Skill::named("Rust"));
        let html = render(&doc, 1, Surface::Print).to_html();
        assert_eq!(doc.experiences.len(), 2);
        assert_eq!(html.matches("data-entry").count(), 1);
        assert_eq!(html.matches("Rust").count(), 1);
    }

    #[test]
    fn blank_document_shows_only_placeholder() {
        let doc = ResumeDocument::default();
        for t in TEMPLATES {
            let tree = render(&doc, t.id, Surface::Screen);
            assert_eq!(tree.text_content(), PLACEHOLDER_TEXT, "template {}", t.id);
        }
    }

    #[test]
    fn sections_gate_on_content() {
        let mut doc = ResumeDocument::default();
        doc.summary = "Builds things.".into();
        let text = render(&doc, 1, Surface::Screen).text_content();
        assert!(text.contains("Professional Summary"));
        assert!(!text.contains("Work Experience"));
        assert!(!text.contains("Education"));
        assert!(!text.contains("Skills"));
        assert!(!text.contains(PLACEHOLDER_TEXT));
    }

    #[test]
    fn both_surfaces_carry_identical_content() {
        let doc = alex();
        for t in TEMPLATES {
            let print = render(&doc, t.id, Surface::Print);
            let screen = render(&doc, t.id, Surface::Screen);
            assert_eq!(print.children, screen.children, "template {}", t.id);
            assert_ne!(print.attributes, screen.attributes);
        }
    }

    #[test]
    fn rendering_is_deterministic() {
        let doc = alex();
        assert_eq!(
            render(&doc, 4, Surface::Print).to_html(),
            render(&doc, 4, Surface::Print).to_html()
        );
    }

    #[test]
    fn photo_only_for_supporting_templates() {
        let mut doc = alex();
        doc.profile_picture = Some(ProfilePicture::from_data_uri("data:image/png;base64,AA"));
        assert!(!render(&doc, 1, Surface::Print).to_html().contains("<img"));
        assert!(render(&doc, 6, Surface::Print).to_html().contains("<img"));
    }

    #[test]
    fn page_exposes_print_target() {
        let page = render_page(&alex());
        let target = page.find_by_id(PRINT_TARGET_ID).expect("print target");
        assert!(target.has_class("hidden"));
        assert!(page.find_by_id(SCREEN_PREVIEW_ID).is_some());
        assert!(page_html(&page, "Alex Kim").contains(PRINT_TARGET_ID));
    }
}

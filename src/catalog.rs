//! Template catalog – the fixed, numbered set of resume templates.

use crate::colors::{scheme_for, ColorScheme};

/// The structural arrangement a template uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutVariant {
    /// Centered header underlined in the accent colour, skill pills.
    Classic,
    /// Left-aligned header on a light accent panel, bulleted skills.
    Banner,
    /// Accent side column carrying photo, contact details and skills.
    Sidebar,
    /// Centered header over two columns: experience | education + skills.
    TwoColumn,
    /// Left accent rule, inline delimiter-joined skills.
    Panel,
    /// Left-aligned header with a circular photo, skill pills.
    Modern,
}

/// A catalog entry. Loaded once, never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemplateDescriptor {
    pub id: u32,
    pub name: &'static str,
    pub tagline: &'static str,
    pub accent_color: &'static str,
    /// Utility tokens for skill badges (background + text).
    pub badge_color: &'static str,
    pub supports_photo: bool,
    pub layout: LayoutVariant,
}

impl TemplateDescriptor {
    pub fn colors(&self) -> ColorScheme {
        scheme_for(self.accent_color)
    }
}

pub const TEMPLATES: &[TemplateDescriptor] = &[
    TemplateDescriptor {
        id: 1,
        name: "Template 1",
        tagline: "Perfect for creative professionals & designers",
        accent_color: "purple",
        badge_color: "bg-purple-100 text-purple-700",
        supports_photo: false,
        layout: LayoutVariant::Classic,
    },
    TemplateDescriptor {
        id: 2,
        name: "Template 2",
        tagline: "Ideal for corporate executives & managers",
        accent_color: "blue",
        badge_color: "bg-blue-100 text-blue-700",
        supports_photo: true,
        layout: LayoutVariant::Banner,
    },
    TemplateDescriptor {
        id: 3,
        name: "Template 3",
        tagline: "Best for tech professionals & developers",
        accent_color: "indigo",
        badge_color: "bg-indigo-100 text-indigo-700",
        supports_photo: true,
        layout: LayoutVariant::Sidebar,
    },
    TemplateDescriptor {
        id: 4,
        name: "Template 4",
        tagline: "Great for marketing & communications",
        accent_color: "orange",
        badge_color: "bg-orange-100 text-orange-700",
        supports_photo: false,
        layout: LayoutVariant::TwoColumn,
    },
    TemplateDescriptor {
        id: 5,
        name: "Template 5",
        tagline: "Excellent for sales & business development",
        accent_color: "amber",
        badge_color: "bg-amber-100 text-amber-700",
        supports_photo: false,
        layout: LayoutVariant::Panel,
    },
    TemplateDescriptor {
        id: 6,
        name: "Template 6",
        tagline: "Versatile design for all industries",
        accent_color: "cyan",
        badge_color: "bg-cyan-100 text-cyan-700",
        supports_photo: true,
        layout: LayoutVariant::Modern,
    },
];

/// Look up a template by id; unknown ids resolve to the first template.
pub fn template(id: u32) -> &'static TemplateDescriptor {
    TEMPLATES.iter().find(|t| t.id == id).unwrap_or(&TEMPLATES[0])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn six_distinct_layouts() {
        let mut layouts: Vec<LayoutVariant> = TEMPLATES.iter().map(|t| t.layout).collect();
        layouts.dedup();
        assert_eq!(layouts.len(), 6);
    }

    #[test]
    fn unknown_id_falls_back_to_first() {
        assert_eq!(template(0).id, 1);
        assert_eq!(template(42).id, 1);
        assert_eq!(template(3).layout, LayoutVariant::Sidebar);
    }
}

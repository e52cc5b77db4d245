//! Style materialization – rewrites symbolic colour tokens on a detached
//! clone into literal inline declarations so the rasterizer sees them.

use crate::colors::{literal_for, ColorProperty};
use crate::dom::ElementNode;

/// Inline literal colours for every descendant of `clone`, in place.
///
/// Each descendant is visited once. For every class token with a known
/// literal, the matching property (`background-color`, `border-color` or
/// `color`) is appended unless the element already declares it inline.
/// Unknown tokens are skipped. Returns the number of declarations written.
pub fn materialize(clone: &mut ElementNode) -> usize {
    let mut written = 0;
    clone.for_each_descendant_mut(&mut |element| {
        written += materialize_element(element);
    });
    log::debug!("materialized {written} colour declaration(s)");
    written
}

fn materialize_element(element: &mut ElementNode) -> usize {
    let resolved: Vec<(&'static str, String)> = element
        .classes()
        .into_iter()
        .filter_map(|token| {
            let rgb = literal_for(token)?;
            Some((ColorProperty::of_token(token).css_name(), rgb.to_string()))
        })
        .collect();

    let mut written = 0;
    for (prop, value) in resolved {
        if element.has_style_property(prop) {
            continue;
        }
        element.push_style(prop, &value);
        written += 1;
    }
    written
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{el, Tag};

    fn sample() -> ElementNode {
        el(Tag::Div).class("bg-purple-100").child(
            el(Tag::Div)
                .class("border-b-2 border-purple-300")
                .child(el(Tag::H2).class("text-purple-600 font-bold").text("Experience"))
                .child(el(Tag::Span).class("bg-purple-100 text-purple-700").text("Rust")),
        )
    }

    #[test]
    fn literal_declarations_are_written_by_prefix() {
        let mut root = sample();
        let n = materialize(&mut root);
        assert_eq!(n, 4);

        let section = root.child_elements().next().unwrap();
        assert_eq!(section.inline_style(), Some("border-color: rgb(216, 180, 254)"));
        let mut kids = section.child_elements();
        assert_eq!(kids.next().unwrap().inline_style(), Some("color: rgb(147, 51, 234)"));
        assert_eq!(
            kids.next().unwrap().inline_style(),
            Some("background-color: rgb(245, 240, 255); color: rgb(126, 34, 206)")
        );
    }

    #[test]
    fn root_is_not_visited() {
        let mut root = sample();
        materialize(&mut root);
        assert_eq!(root.inline_style(), None);
    }

    #[test]
    fn second_pass_changes_nothing() {
        let mut once = sample();
        materialize(&mut once);
        let mut twice = once.clone();
        assert_eq!(materialize(&mut twice), 0);
        assert_eq!(once, twice);
    }

    #[test]
    fn existing_inline_declaration_wins() {
        let mut root = el(Tag::Div).child(
            el(Tag::P)
                .class("text-blue-600 bg-blue-100")
                .style("color", "#123456"),
        );
        materialize(&mut root);
        let p = root.child_elements().next().unwrap();
        assert!(p.inline_style().unwrap().starts_with("color: #123456"));
        assert_eq!(
            p.style_declarations().iter().filter(|(k, _)| k == "color").count(),
            1
        );
        assert!(p.has_style_property("background-color"));
    }

    #[test]
    fn unknown_tokens_are_skipped() {
        let mut root = el(Tag::Div).child(el(Tag::P).class("text-chartreuse-500 bg-nope p-4"));
        assert_eq!(materialize(&mut root), 0);
        assert_eq!(root.child_elements().next().unwrap().inline_style(), None);
    }

    #[test]
    fn original_is_untouched() {
        let original = sample();
        let mut clone = original.clone();
        materialize(&mut clone);
        assert_ne!(clone, original);
        assert_eq!(original, sample());
    }
}

//! Ready-made fragments offered by the toolbar

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use ethos_core::{tags, Fragment, FragmentNode};

use crate::error::{EditorError, Result};

/// Placeholder citation in APA style, styled as a side note
pub fn citation() -> Fragment {
    FragmentNode::element(tags::P)
        .with_style("color", "#666")
        .with_style("font-style", "italic")
        .with_style("border-left", "2px solid #ccc")
        .with_style("padding-left", "10px")
        .with_style("margin", "10px 0")
        .with_child(FragmentNode::text(
            "(Author, Year). Source: Article Title, ETHOS verified citation.",
        ))
        .into()
}

/// Superscript footnote marker `[n]`
pub fn footnote(number: usize) -> Fragment {
    FragmentNode::element(tags::SUP)
        .with_child(FragmentNode::text(format!("[{}]", number)))
        .into()
}

/// An uploaded image embedded as a `data:` URL
pub fn uploaded_image(bytes: &[u8], mime: &str) -> Result<Fragment> {
    let mime = mime.trim().to_ascii_lowercase();
    if !mime.starts_with("image/") || mime.len() == "image/".len() {
        return Err(EditorError::invalid("image type", mime));
    }
    let src = format!("data:{};base64,{}", mime, STANDARD.encode(bytes));

    Ok(FragmentNode::element(tags::IMG)
        .with_attr("src", src)
        .with_style("max-width", "100%")
        .with_style("height", "auto")
        .with_style("display", "block")
        .with_style("margin", "10px 0")
        .with_style("cursor", "pointer")
        .into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_footnote_markup() {
        let fragment = footnote(3);
        assert_eq!(
            fragment.nodes()[0],
            FragmentNode::element("sup").with_child(FragmentNode::text("[3]"))
        );
    }

    #[test]
    fn test_uploaded_image() {
        let fragment = uploaded_image(b"\x89PNG", "image/png").unwrap();
        let FragmentNode::Element { element, children } = &fragment.nodes()[0] else {
            panic!("expected an element");
        };
        assert_eq!(element.tag, "img");
        assert!(children.is_empty());
        assert_eq!(element.attr("src"), Some("data:image/png;base64,iVBORw=="));
        assert_eq!(element.style.get("max-width"), Some("100%"));
    }

    #[test]
    fn test_upload_requires_image_type() {
        assert!(uploaded_image(b"%PDF", "application/pdf").is_err());
        assert!(uploaded_image(b"", "image/").is_err());
    }
}

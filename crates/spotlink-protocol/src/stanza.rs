//! A minimal XML element tree for stanzas.
//!
//! The messaging substrate hands us parsed stanzas and takes stanzas back
//! (acknowledgments, commands). Parsing raw XML is the transport's job; what
//! the session layer needs is a small owned tree it can query:
//!
//! - attribute lookup (`from`, `id`, `type`)
//! - first-descendant search by tag name (like DOM `getElementsByTagName`)
//! - concatenated text content
//!
//! `Display` renders the element back to XML, which transports can send
//! as-is and which makes stanzas readable in logs.

use std::collections::BTreeMap;
use std::fmt;

/// The `type` attribute of an `<iq>` stanza.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IqType {
    Get,
    Set,
    Result,
    Error,
}

impl IqType {
    /// The attribute value as it appears on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Set => "set",
            Self::Result => "result",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for IqType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One XML element: a name, attributes, child elements, and direct text.
///
/// Attributes are kept in a `BTreeMap` so rendering is deterministic, which
/// keeps logged stanzas and test assertions stable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    name: String,
    attrs: BTreeMap<String, String>,
    children: Vec<Element>,
    text: String,
}

impl Element {
    /// Creates an empty element with the given tag name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Builder: sets an attribute.
    pub fn attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    /// Builder: sets an attribute only when `value` is `Some`.
    pub fn attr_opt(self, key: impl Into<String>, value: Option<&str>) -> Self {
        match value {
            Some(v) => self.attr(key, v),
            None => self,
        }
    }

    /// Builder: appends a child element.
    pub fn child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    /// Builder: sets the element's direct text.
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Builds `<iq id=… to=… type="result"/>`, the acknowledgment every
    /// inbound iq expects.
    pub fn iq_result(id: Option<&str>, to: Option<&str>) -> Self {
        Self::new("iq")
            .attr_opt("id", id)
            .attr_opt("to", to)
            .attr("type", IqType::Result.as_str())
    }

    /// Builds an error reply to `iq` carrying a stanza error `condition`
    /// (for example `feature-not-implemented`).
    pub fn iq_error(iq: &Element, condition: &str) -> Self {
        Self::new("iq")
            .attr_opt("id", iq.get_attr("id"))
            .attr_opt("to", iq.get_attr("from"))
            .attr("type", IqType::Error.as_str())
            .child(
                Element::new("error").attr("type", "cancel").child(
                    Element::new(condition)
                        .attr("xmlns", "urn:ietf:params:xml:ns:xmpp-stanzas"),
                ),
            )
    }

    /// The tag name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Looks up an attribute value.
    pub fn get_attr(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).map(String::as_str)
    }

    /// Direct children, in document order.
    pub fn children(&self) -> &[Element] {
        &self.children
    }

    /// Finds the first descendant (depth-first, document order) with the
    /// given tag name. The element itself is not considered.
    pub fn find(&self, name: &str) -> Option<&Element> {
        for child in &self.children {
            if child.name == name {
                return Some(child);
            }
            if let Some(found) = child.find(name) {
                return Some(found);
            }
        }
        None
    }

    /// Finds a direct child with the given tag name.
    pub fn find_child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Concatenated text of this element and all descendants, in document
    /// order (DOM `textContent` semantics).
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        out.push_str(&self.text);
        for child in &self.children {
            child.collect_text(out);
        }
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}", self.name)?;
        for (key, value) in &self.attrs {
            write!(f, " {}=\"{}\"", key, escape(value))?;
        }
        if self.children.is_empty() && self.text.is_empty() {
            return f.write_str("/>");
        }
        f.write_str(">")?;
        f.write_str(&escape(&self.text))?;
        for child in &self.children {
            write!(f, "{child}")?;
        }
        write!(f, "</{}>", self.name)
    }
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message_iq() -> Element {
        Element::new("iq")
            .attr("id", "abc")
            .attr("from", "room@muc.example/remote-1")
            .attr("type", "set")
            .child(
                Element::new("message")
                    .attr("type", "spotTvState")
                    .text(r#"{"view":"home"}"#),
            )
    }

    #[test]
    fn test_get_attr_present_and_missing() {
        let iq = message_iq();
        assert_eq!(iq.get_attr("id"), Some("abc"));
        assert_eq!(iq.get_attr("nope"), None);
    }

    #[test]
    fn test_find_returns_nested_descendant() {
        let root = Element::new("presence").child(
            Element::new("x").child(Element::new("isSpot").text("true")),
        );
        let found = root.find("isSpot").expect("nested element");
        assert_eq!(found.text_content(), "true");
        assert!(root.find_child("isSpot").is_none());
    }

    #[test]
    fn test_find_does_not_match_self() {
        let iq = message_iq();
        assert!(iq.find("iq").is_none());
        assert!(iq.find("message").is_some());
    }

    #[test]
    fn test_text_content_concatenates_descendants() {
        let el = Element::new("a")
            .text("1")
            .child(Element::new("b").text("2").child(Element::new("c").text("3")))
            .child(Element::new("d").text("4"));
        assert_eq!(el.text_content(), "1234");
    }

    #[test]
    fn test_iq_result_addresses_sender() {
        let ack = Element::iq_result(Some("abc"), Some("remote@x/1"));
        assert_eq!(ack.to_string(), r#"<iq id="abc" to="remote@x/1" type="result"/>"#);
    }

    #[test]
    fn test_iq_error_carries_condition() {
        let err = Element::iq_error(&message_iq(), "feature-not-implemented");
        assert_eq!(err.get_attr("type"), Some("error"));
        assert_eq!(err.get_attr("to"), Some("room@muc.example/remote-1"));
        assert!(err.find("feature-not-implemented").is_some());
    }

    #[test]
    fn test_display_escapes_text_and_attributes() {
        let el = Element::new("message")
            .attr("note", "a\"b")
            .text("<1 & 2>");
        assert_eq!(
            el.to_string(),
            r#"<message note="a&quot;b">&lt;1 &amp; 2&gt;</message>"#
        );
    }

    #[test]
    fn test_iq_type_as_str() {
        assert_eq!(IqType::Get.as_str(), "get");
        assert_eq!(IqType::Result.to_string(), "result");
    }
}

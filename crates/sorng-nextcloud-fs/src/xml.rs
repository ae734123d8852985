// ──────────────────────────────────────────────────────────────────────────────
// sorng-nextcloud-fs · xml
// ──────────────────────────────────────────────────────────────────────────────
// Minimal element tree used on both sides of the wire:
//  • building PROPFIND / SEARCH / REPORT / PROPPATCH bodies
//  • parsing multistatus replies with namespace URIs folded to fixed prefixes
//    (DAV: → d, owncloud → oc, nextcloud → nc, sabredav → s)
// ──────────────────────────────────────────────────────────────────────────────

use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::name::ResolveResult;
use quick_xml::NsReader;
use thiserror::Error;

pub const NS_DAV: &str = "DAV:";
pub const NS_OWNCLOUD: &str = "http://owncloud.org/ns";
pub const NS_NEXTCLOUD: &str = "http://nextcloud.org/ns";
pub const NS_SABRE: &str = "http://sabredav.org/ns";

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

#[derive(Debug, Error)]
pub enum XmlError {
    #[error(transparent)]
    Syntax(#[from] quick_xml::Error),
    #[error("document has no root element")]
    Empty,
}

/// One XML element with its attributes, child elements and text content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlElement {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<XmlElement>,
    pub text: String,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_attr(mut self, key: &str, value: &str) -> Self {
        self.attrs.push((key.to_string(), value.to_string()));
        self
    }

    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_children<I: IntoIterator<Item = XmlElement>>(mut self, children: I) -> Self {
        self.children.extend(children);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Declare the `d`, `oc` and `nc` prefixes on this element.
    pub fn with_dav_namespaces(self) -> Self {
        self.with_attr("xmlns:d", NS_DAV)
            .with_attr("xmlns:oc", NS_OWNCLOUD)
            .with_attr("xmlns:nc", NS_NEXTCLOUD)
    }

    pub fn push(&mut self, child: XmlElement) {
        self.children.push(child);
    }

    // ── Lookup ───────────────────────────────────────────────────────────────

    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name).map(|c| c.text.as_str())
    }

    // ── Serialisation ────────────────────────────────────────────────────────

    /// Serialise as a complete document with an XML declaration.
    pub fn to_document(&self) -> String {
        let mut out = String::from(XML_DECLARATION);
        out.push('\n');
        self.write_into(&mut out);
        out
    }

    fn write_into(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for (k, v) in &self.attrs {
            out.push(' ');
            out.push_str(k);
            out.push_str("=\"");
            out.push_str(&escape(v.as_str()));
            out.push('"');
        }
        if self.children.is_empty() && self.text.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        out.push_str(&escape(self.text.as_str()));
        for child in &self.children {
            child.write_into(out);
        }
        out.push_str("</");
        out.push_str(&self.name);
        out.push('>');
    }
}

// ── Parsing ──────────────────────────────────────────────────────────────────

fn prefix_for(namespace: &[u8]) -> Option<&'static str> {
    match namespace {
        b"DAV:" => Some("d"),
        b"http://owncloud.org/ns" => Some("oc"),
        b"http://nextcloud.org/ns" => Some("nc"),
        b"http://sabredav.org/ns" => Some("s"),
        _ => None,
    }
}

/// Parse a document into its root element.
///
/// Element names are rewritten to `prefix:local` using the fixed prefixes
/// above, whatever prefixes the server chose. Elements in other namespaces
/// keep their qualified name as written.
pub fn parse(input: &str) -> Result<XmlElement, XmlError> {
    let mut reader = NsReader::from_str(input);
    reader.config_mut().trim_text(true);
    reader.config_mut().expand_empty_elements = true;

    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;
    loop {
        let (ns, event) = reader.read_resolved_event()?;
        match event {
            Event::Start(e) => {
                let local = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                let name = match ns {
                    ResolveResult::Bound(ns) => match prefix_for(ns.as_ref()) {
                        Some(prefix) => format!("{}:{}", prefix, local),
                        None => String::from_utf8_lossy(e.name().as_ref()).into_owned(),
                    },
                    _ => String::from_utf8_lossy(e.name().as_ref()).into_owned(),
                };
                stack.push(XmlElement::new(name));
            }
            Event::End(_) => {
                if let Some(done) = stack.pop() {
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(done),
                        None => root = Some(done),
                    }
                }
            }
            Event::Text(t) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&t.unescape()?);
                }
            }
            Event::CData(c) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    root.ok_or(XmlError::Empty)
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixes_are_normalised() {
        let doc = r#"<?xml version="1.0"?>
<D:multistatus xmlns:D="DAV:" xmlns:x="http://owncloud.org/ns">
  <D:response><D:href>/a</D:href><x:fileid>7</x:fileid></D:response>
</D:multistatus>"#;
        let root = parse(doc).unwrap();
        assert_eq!(root.name, "d:multistatus");
        let resp = root.child("d:response").unwrap();
        assert_eq!(resp.child_text("d:href"), Some("/a"));
        assert_eq!(resp.child_text("oc:fileid"), Some("7"));
    }

    #[test]
    fn empty_elements_and_entities() {
        let root = parse(r#"<d:prop xmlns:d="DAV:"><d:resourcetype/><d:getetag>&quot;e1&quot;</d:getetag></d:prop>"#)
            .unwrap();
        assert_eq!(root.children.len(), 2);
        assert_eq!(root.child_text("d:resourcetype"), Some(""));
        assert_eq!(root.child_text("d:getetag"), Some("\"e1\""));
    }

    #[test]
    fn unknown_namespace_keeps_qname() {
        let root = parse(r#"<d:prop xmlns:d="DAV:" xmlns:z="urn:z"><z:thing>1</z:thing></d:prop>"#).unwrap();
        assert_eq!(root.child_text("z:thing"), Some("1"));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(parse("").is_err());
        assert!(parse("<a><b></a>").is_err());
    }

    #[test]
    fn serialises_with_declaration_and_escaping() {
        let el = XmlElement::new("d:propfind")
            .with_attr("xmlns:d", NS_DAV)
            .with_child(XmlElement::new("d:prop").with_child(XmlElement::new("d:getetag")))
            .with_child(XmlElement::new("d:literal").with_text("a<b&c"));
        assert_eq!(
            el.to_document(),
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
             <d:propfind xmlns:d=\"DAV:\"><d:prop><d:getetag/></d:prop>\
             <d:literal>a&lt;b&amp;c</d:literal></d:propfind>"
        );
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// sorng-nextcloud-fs · search
// ──────────────────────────────────────────────────────────────────────────────
// Lowers a prefix-notation search expression into a WebDAV SEARCH body.
// Pure transform, no I/O.
// ──────────────────────────────────────────────────────────────────────────────

use crate::error::{NcError, NcResult};
use crate::types::SearchToken;
use crate::xml::XmlElement;
use std::slice::Iter;

/// Properties requested by every listing and search.
pub const PROPFIND_PROPERTIES: &[&str] = &[
    "d:resourcetype",
    "d:getlastmodified",
    "d:getcontentlength",
    "d:getcontenttype",
    "d:getetag",
    "oc:size",
    "oc:id",
    "oc:fileid",
    "oc:downloadURL",
    "oc:dDC",
    "oc:permissions",
    "oc:checksums",
    "oc:share-types",
    "oc:favorite",
    "nc:is-encrypted",
    "nc:lock",
    "nc:lock-owner-displayname",
    "nc:lock-owner",
    "nc:lock-owner-type",
    "nc:lock-owner-editor",
    "nc:lock-time",
    "nc:lock-timeout",
];

/// A `d:prop` element listing `properties` as empty children.
pub fn prop_list(properties: &[&str]) -> XmlElement {
    XmlElement::new("d:prop").with_children(properties.iter().map(|p| XmlElement::new(*p)))
}

/// Build the `d:where` element for `tokens`.
///
/// Every top-level expression becomes a direct child of `d:where`; a
/// connective consumes exactly the two expressions that follow it.
pub fn build_where(tokens: &[SearchToken]) -> NcResult<XmlElement> {
    let mut where_el = XmlElement::new("d:where");
    let mut it = tokens.iter();
    while let Some(token) = it.next() {
        where_el.push(lower(token, &mut it)?);
    }
    Ok(where_el)
}

fn lower(token: &SearchToken, rest: &mut Iter<'_, SearchToken>) -> NcResult<XmlElement> {
    match token {
        SearchToken::And | SearchToken::Or => {
            let name = if *token == SearchToken::And { "d:and" } else { "d:or" };
            let left = next_operand(token, rest)?;
            let right = next_operand(token, rest)?;
            Ok(XmlElement::new(name).with_child(left).with_child(right))
        }
        SearchToken::Leaf { op, prop, value } => Ok(XmlElement::new(format!("d:{}", op.as_str()))
            .with_child(XmlElement::new("d:prop").with_child(XmlElement::new(prop.dav_name())))
            .with_child(XmlElement::new("d:literal").with_text(value.clone()))),
    }
}

fn next_operand(connective: &SearchToken, rest: &mut Iter<'_, SearchToken>) -> NcResult<XmlElement> {
    let token = rest
        .next()
        .ok_or_else(|| NcError::invalid(format!("`{}` expects two operands", connective)))?;
    lower(token, rest)
}

/// Build a complete `d:searchrequest` scoped to `/files/{user}/{path}`.
pub fn build_find_request(tokens: &[SearchToken], path: &str, user: &str) -> NcResult<XmlElement> {
    let where_el = build_where(tokens)?;
    let href = format!("/files/{}/{}", user, path.trim_start_matches('/'));
    let basic = XmlElement::new("d:basicsearch")
        .with_child(XmlElement::new("d:select").with_child(prop_list(PROPFIND_PROPERTIES)))
        .with_child(
            XmlElement::new("d:from").with_child(
                XmlElement::new("d:scope")
                    .with_child(XmlElement::new("d:href").with_text(href))
                    .with_child(XmlElement::new("d:depth").with_text("infinity")),
            ),
        )
        .with_child(where_el);
    Ok(XmlElement::new("d:searchrequest")
        .with_dav_namespaces()
        .with_child(basic))
}

/// Human-readable form of an expression, used in error descriptors.
pub fn describe(tokens: &[SearchToken]) -> String {
    tokens.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════

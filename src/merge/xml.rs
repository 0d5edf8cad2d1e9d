//! Attribute-based XML settings merge.
//!
//! Settings live as immediate children of the document root, one element
//! per entry: the tag names the primitive type and the `name`/`value`
//! attributes carry the setting. An entry's identity is the (name, tag)
//! pair, so `<bool name="x"/>` and `<int name="x"/>` are distinct.
//!
//! The target tree is authoritative for the structure and ordering of
//! pre-existing entries; fragment values are written into matching elements
//! in place, and only genuinely new pairs are appended at the end of the
//! root. The tree is re-serialized with two-space indentation.

use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use super::{MergeEngine, MergeError};

/// Merge engine for attribute-based XML settings files.
pub struct XmlMerge;

impl MergeEngine for XmlMerge {
    fn merge(&self, source: &Path, target: &Path) -> Result<(), MergeError> {
        let source_doc = parse_document(source)?;
        let mut target_doc = parse_document(target)?;

        // (name, tag) -> value over the fragment's entries. Entries drop out
        // of this map as they are matched in the target, so whatever is left
        // afterwards is exactly the set to append.
        let mut pending: IndexMap<(String, String), String> = IndexMap::new();
        for child in &source_doc.root.children {
            if let Some(name) = child.attr("name") {
                let value = child.attr("value").unwrap_or("");
                pending.insert(
                    (name.to_string(), child.tag.clone()),
                    value.to_string(),
                );
            }
        }

        for child in &mut target_doc.root.children {
            if let Some(name) = child.attr("name").map(str::to_string) {
                let key = (name, child.tag.clone());
                if let Some(value) = pending.shift_remove(&key) {
                    child.set_attr("value", &value);
                }
            }
        }

        for ((name, tag), value) in pending {
            target_doc.root.children.push(Element {
                tag,
                attributes: vec![("name".to_string(), name), ("value".to_string(), value)],
                children: Vec::new(),
                text: None,
            });
        }

        let rendered = serialize_document(&target_doc)?;
        fs::write(target, rendered)
            .map_err(|e| MergeError::Io(format!("{}: {}", target.display(), e)))
    }
}

/// One parsed element: tag, attributes in document order, nested children.
#[derive(Debug, Clone)]
struct Element {
    tag: String,
    attributes: Vec<(String, String)>,
    children: Vec<Element>,
    text: Option<String>,
}

impl Element {
    fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    fn set_attr(&mut self, name: &str, value: &str) {
        if let Some(entry) = self.attributes.iter_mut().find(|(key, _)| key == name) {
            entry.1 = value.to_string();
        } else {
            self.attributes.push((name.to_string(), value.to_string()));
        }
    }
}

/// A parsed settings document: the root element plus the declaration to
/// re-emit, when the input carried one.
struct Document {
    decl: Option<BytesDecl<'static>>,
    root: Element,
}

fn parse_document(path: &Path) -> Result<Document, MergeError> {
    let text = fs::read_to_string(path)
        .map_err(|e| MergeError::Io(format!("{}: {}", path.display(), e)))?;

    let mut reader = Reader::from_str(&text);
    reader.config_mut().trim_text_start = true;
    reader.config_mut().trim_text_end = true;

    let mut decl: Option<BytesDecl<'static>> = None;
    let mut root: Option<Element> = None;
    let mut stack: Vec<Element> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Decl(d)) => decl = Some(d.into_owned()),
            Ok(Event::Start(e)) => {
                let element = element_from(&e)?;
                stack.push(element);
            }
            Ok(Event::Empty(e)) => {
                let element = element_from(&e)?;
                attach(element, &mut stack, &mut root)?;
            }
            Ok(Event::End(_)) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| MergeError::Parse("unexpected closing tag".to_string()))?;
                attach(element, &mut stack, &mut root)?;
            }
            Ok(Event::Text(t)) => {
                let content = t
                    .unescape()
                    .map_err(|e| MergeError::Parse(e.to_string()))?;
                if !content.is_empty() {
                    if let Some(open) = stack.last_mut() {
                        open.text.get_or_insert_with(String::new).push_str(&content);
                    }
                }
            }
            Ok(Event::CData(t)) => {
                let content = String::from_utf8_lossy(&t.into_inner()).into_owned();
                if let Some(open) = stack.last_mut() {
                    open.text.get_or_insert_with(String::new).push_str(&content);
                }
            }
            // Comments, processing instructions, and DOCTYPE carry no
            // settings and are not round-tripped by the tree rewrite.
            Ok(Event::Comment(_) | Event::PI(_) | Event::DocType(_)) => {}
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(MergeError::Parse(format!("{}: {}", path.display(), e)));
            }
        }
    }

    if !stack.is_empty() {
        return Err(MergeError::Parse(format!(
            "{}: unclosed element <{}>",
            path.display(),
            stack[stack.len() - 1].tag
        )));
    }

    let root = root
        .ok_or_else(|| MergeError::Parse(format!("{}: no root element", path.display())))?;

    Ok(Document { decl, root })
}

fn element_from(e: &BytesStart<'_>) -> Result<Element, MergeError> {
    let tag = String::from_utf8_lossy(e.name().as_ref()).into_owned();

    let mut attributes = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| MergeError::Parse(err.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|err| MergeError::Parse(err.to_string()))?
            .into_owned();
        attributes.push((key, value));
    }

    Ok(Element {
        tag,
        attributes,
        children: Vec::new(),
        text: None,
    })
}

fn attach(
    element: Element,
    stack: &mut Vec<Element>,
    root: &mut Option<Element>,
) -> Result<(), MergeError> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
        Ok(())
    } else if root.is_some() {
        Err(MergeError::Parse("multiple root elements".to_string()))
    } else {
        *root = Some(element);
        Ok(())
    }
}

fn serialize_document(doc: &Document) -> Result<String, MergeError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    if let Some(decl) = &doc.decl {
        writer
            .write_event(Event::Decl(decl.clone()))
            .map_err(|e| MergeError::Io(e.to_string()))?;
    }
    write_element(&mut writer, &doc.root)?;

    let mut text = String::from_utf8(writer.into_inner())
        .map_err(|e| MergeError::Io(e.to_string()))?;
    text.push('\n');
    Ok(text)
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &Element) -> Result<(), MergeError> {
    let mut start = BytesStart::new(element.tag.as_str());
    for (key, value) in &element.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if element.children.is_empty() && element.text.is_none() {
        writer
            .write_event(Event::Empty(start))
            .map_err(|e| MergeError::Io(e.to_string()))?;
        return Ok(());
    }

    writer
        .write_event(Event::Start(start))
        .map_err(|e| MergeError::Io(e.to_string()))?;
    if let Some(content) = &element.text {
        writer
            .write_event(Event::Text(BytesText::new(content)))
            .map_err(|e| MergeError::Io(e.to_string()))?;
    }
    for child in &element.children {
        write_element(writer, child)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(element.tag.as_str())))
        .map_err(|e| MergeError::Io(e.to_string()))?;
    Ok(())
}

// plans10x/src/xml.rs

//! Generic attributed XML tree and the quick-xml adapter around it.
//!
//! Plan documents have no fixed schema, so the tree is untyped: an
//! element is an insertion-ordered map whose keys are either attribute
//! names (marked with the `@_` prefix), the `#text` key for character
//! data, or child element names. Repeated sibling elements of the same
//! name fold into a [`Value::List`], which is also how the single-vs-list
//! cardinality ambiguity of plan files is surfaced to callers.

use crate::error::Result;
use linked_hash_map::LinkedHashMap;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::io;

/// Marker prefix distinguishing attribute keys from child element keys.
pub const ATTR_PREFIX: &str = "@_";

/// Map key under which element character data is stored.
pub const TEXT_KEY: &str = "#text";

/// A generic XML tree node.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Leaf text: an attribute value or collapsed text-only element.
    Text(String),
    /// Repeated sibling elements sharing one name.
    List(Vec<Value>),
    /// An element: attributes (`@_`-prefixed keys), optional `#text`,
    /// and child elements, in document order.
    Node(LinkedHashMap<String, Value>),
}

impl Value {
    /// Create an empty element node.
    pub fn node() -> Value {
        Value::Node(LinkedHashMap::new())
    }

    /// Create a text leaf.
    pub fn text<S: Into<String>>(s: S) -> Value {
        Value::Text(s.into())
    }

    /// Borrow this value as an element map, if it is one.
    pub fn as_map(&self) -> Option<&LinkedHashMap<String, Value>> {
        match self {
            Value::Node(map) => Some(map),
            _ => None,
        }
    }

    /// Mutably borrow this value as an element map, if it is one.
    pub fn as_map_mut(&mut self) -> Option<&mut LinkedHashMap<String, Value>> {
        match self {
            Value::Node(map) => Some(map),
            _ => None,
        }
    }

    /// Borrow this value as a text leaf, if it is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Look up an attribute on this element by its plain name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.as_map()?
            .get(&attr_key(name))
            .and_then(Value::as_str)
    }

    /// Set an attribute on this element by its plain name.
    ///
    /// No-op when the value is not an element node.
    pub fn set_attr<S: Into<String>>(&mut self, name: &str, value: S) {
        if let Value::Node(map) = self {
            map.insert(attr_key(name), Value::Text(value.into()));
        }
    }

    /// Fetch a child value by key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map()?.get(key)
    }
}

/// Build the map key for an attribute name.
pub fn attr_key(name: &str) -> String {
    format!("{}{}", ATTR_PREFIX, name)
}

/// A parsed XML document: the (virtual) root map keyed by root element
/// name, plus whether the source carried an XML declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Virtual root node; its single key is the document root element.
    pub root: Value,
    /// Whether the source document had an `<?xml ...?>` declaration.
    pub declaration: bool,
}

impl Document {
    /// Create an empty document with a declaration.
    pub fn new() -> Self {
        Self {
            root: Value::node(),
            declaration: true,
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse XML text into a [`Document`].
///
/// Entities in text and attribute values are resolved, whitespace-only
/// text is dropped, and valueless (boolean) attributes are tolerated and
/// read as empty strings. Elements whose only content is text collapse
/// to a [`Value::Text`] leaf.
pub fn parse(text: &str) -> Result<Document> {
    let mut reader = Reader::from_str(text);
    reader.trim_text(true);

    let mut declaration = false;
    let mut root = LinkedHashMap::new();
    // Stack of open elements: (tag name, partially built map).
    let mut stack: Vec<(String, LinkedHashMap<String, Value>)> = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Decl(_) => declaration = true,
            Event::Start(e) => {
                stack.push((tag_name(&e), element_map(&e)?));
            }
            Event::Empty(e) => {
                let map = element_map(&e)?;
                let name = tag_name(&e);
                attach(&mut stack, &mut root, name, finish_element(map));
            }
            Event::End(_) => {
                // Mismatched end tags are rejected by the reader before
                // we get here, so the stack cannot be empty.
                if let Some((name, map)) = stack.pop() {
                    attach(&mut stack, &mut root, name, finish_element(map));
                }
            }
            Event::Text(e) => {
                let text = e.unescape()?.into_owned();
                if let Some((_, map)) = stack.last_mut() {
                    append_text(map, &text);
                }
            }
            Event::CData(e) => {
                let text = String::from_utf8_lossy(&e).into_owned();
                if let Some((_, map)) = stack.last_mut() {
                    append_text(map, &text);
                }
            }
            Event::Comment(_) | Event::PI(_) | Event::DocType(_) => {}
            Event::Eof => break,
        }
    }

    Ok(Document {
        root: Value::Node(root),
        declaration,
    })
}

/// Serialize a [`Document`] back to XML text.
///
/// Output is pretty-printed with two-space indentation; attribute values
/// and text content are entity-escaped. The XML declaration is emitted
/// only if the source document had one.
pub fn to_string(doc: &Document) -> Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    if doc.declaration {
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
    }
    if let Value::Node(root) = &doc.root {
        for (name, value) in root {
            write_value(&mut writer, name, value)?;
        }
    }

    let mut output = String::from_utf8(writer.into_inner())?;
    output.push('\n');
    Ok(output)
}

fn tag_name(e: &BytesStart) -> String {
    String::from_utf8_lossy(e.name().as_ref()).into_owned()
}

/// Build the element map for a start tag, with attributes under `@_` keys.
fn element_map(e: &BytesStart) -> Result<LinkedHashMap<String, Value>> {
    let mut map = LinkedHashMap::new();
    // html_attributes tolerates boolean (valueless) attributes, which
    // show up in hand-edited plan files.
    for attr in e.html_attributes() {
        let attr = attr?;
        let name = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        map.insert(attr_key(&name), Value::Text(value));
    }
    Ok(map)
}

/// Collapse a completed element: text-only elements become plain leaves.
fn finish_element(map: LinkedHashMap<String, Value>) -> Value {
    if map.len() == 1 {
        if let Some(Value::Text(text)) = map.get(TEXT_KEY) {
            return Value::Text(text.clone());
        }
    }
    Value::Node(map)
}

/// Insert a finished child into its parent (or the virtual root).
fn attach(
    stack: &mut [(String, LinkedHashMap<String, Value>)],
    root: &mut LinkedHashMap<String, Value>,
    name: String,
    value: Value,
) {
    let target = match stack.last_mut() {
        Some((_, map)) => map,
        None => root,
    };
    insert_child(target, name, value);
}

/// Insert a child under `name`, folding repeated names into a list.
fn insert_child(map: &mut LinkedHashMap<String, Value>, name: String, value: Value) {
    match map.get_mut(&name) {
        Some(Value::List(items)) => items.push(value),
        Some(existing) => {
            let first = std::mem::replace(existing, Value::List(Vec::new()));
            if let Value::List(items) = existing {
                items.push(first);
                items.push(value);
            }
        }
        None => {
            map.insert(name, value);
        }
    }
}

fn append_text(map: &mut LinkedHashMap<String, Value>, text: &str) {
    match map.get_mut(TEXT_KEY) {
        Some(Value::Text(existing)) => existing.push_str(text),
        _ => {
            map.insert(TEXT_KEY.to_string(), Value::Text(text.to_string()));
        }
    }
}

fn write_value<W: io::Write>(writer: &mut Writer<W>, name: &str, value: &Value) -> Result<()> {
    match value {
        Value::List(items) => {
            for item in items {
                write_value(writer, name, item)?;
            }
        }
        Value::Text(text) => {
            writer.write_event(Event::Start(BytesStart::new(name)))?;
            writer.write_event(Event::Text(BytesText::new(text)))?;
            writer.write_event(Event::End(BytesEnd::new(name)))?;
        }
        Value::Node(map) => {
            let mut start = BytesStart::new(name);
            let mut text = None;
            let mut has_children = false;
            for (key, child) in map {
                if let Some(attr_name) = key.strip_prefix(ATTR_PREFIX) {
                    if let Value::Text(v) = child {
                        start.push_attribute((attr_name, v.as_str()));
                    }
                } else if key == TEXT_KEY {
                    text = child.as_str();
                } else {
                    has_children = true;
                }
            }
            if !has_children && text.is_none() {
                writer.write_event(Event::Empty(start))?;
            } else {
                writer.write_event(Event::Start(start))?;
                if let Some(text) = text {
                    writer.write_event(Event::Text(BytesText::new(text)))?;
                }
                for (key, child) in map {
                    if !key.starts_with(ATTR_PREFIX) && key != TEXT_KEY {
                        write_value(writer, key, child)?;
                    }
                }
                writer.write_event(Event::End(BytesEnd::new(name)))?;
            }
        }
    }
    Ok(())
}

//! XML decoding for legislative web service responses.
//!
//! The service answers in SOAP-style XML. Element names are snake_cased,
//! `ArrayOf*` elements become arrays, repeated siblings collapse into an
//! array, leaves become strings (`true`/`false` become booleans) and
//! `xsi:nil` leaves become null.

use quick_xml::escape::{resolve_predefined_entity, unescape};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde_json::{Map, Value};

use crate::error::TransportError;

#[derive(Debug, Default)]
struct Element {
    name: String,
    text: String,
    nil: bool,
    children: Vec<Element>,
}

impl Element {
    fn open(start: &BytesStart<'_>, reader: &Reader<&[u8]>) -> Result<Self, TransportError> {
        let name = reader
            .decoder()
            .decode(start.local_name().as_ref())
            .map_err(malformed)?
            .into_owned();

        let nil = start.attributes().flatten().any(|attr| {
            attr.key.local_name().as_ref() == b"nil" && attr.value.as_ref() == b"true"
        });

        Ok(Self {
            name,
            nil,
            ..Self::default()
        })
    }

    fn into_value(self) -> Value {
        if self.name.starts_with("ArrayOf") {
            return Value::Array(self.children.into_iter().map(Element::into_value).collect());
        }

        if self.children.is_empty() {
            if self.nil {
                return Value::Null;
            }
            return match self.text.trim() {
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                text => Value::String(text.to_string()),
            };
        }

        let mut groups: Vec<(String, Vec<Value>)> = Vec::new();
        for child in self.children {
            let key = snake_case(&child.name);
            let value = child.into_value();
            match groups.iter_mut().find(|(name, _)| *name == key) {
                Some((_, values)) => values.push(value),
                None => groups.push((key, vec![value])),
            }
        }

        let object: Map<String, Value> = groups
            .into_iter()
            .map(|(key, mut values)| {
                let value = if values.len() == 1 {
                    values.remove(0)
                } else {
                    Value::Array(values)
                };
                (key, value)
            })
            .collect();
        Value::Object(object)
    }
}

/// Decodes an XML document into JSON.
pub fn xml_to_json(xml: &str) -> Result<Value, TransportError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event().map_err(malformed)? {
            Event::Start(start) => stack.push(Element::open(&start, &reader)?),
            Event::Empty(start) => {
                let element = Element::open(&start, &reader)?;
                attach(&mut stack, &mut root, element);
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| TransportError::Malformed("unbalanced end tag".to_string()))?;
                attach(&mut stack, &mut root, element);
            }
            Event::Text(text) => {
                let raw = reader.decoder().decode(&text).map_err(malformed)?;
                let unescaped = unescape(&raw).map_err(malformed)?;
                push_text(&mut stack, &unescaped);
            }
            Event::CData(data) => {
                let raw = reader.decoder().decode(&data).map_err(malformed)?;
                push_text(&mut stack, &raw);
            }
            Event::GeneralRef(reference) => {
                let resolved = match reference.resolve_char_ref().map_err(malformed)? {
                    Some(ch) => ch.to_string(),
                    None => {
                        let name = reader.decoder().decode(&reference).map_err(malformed)?;
                        resolve_predefined_entity(&name)
                            .map(str::to_string)
                            .unwrap_or_else(|| format!("&{name};"))
                    }
                };
                push_text(&mut stack, &resolved);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(TransportError::Malformed("unclosed element".to_string()));
    }

    let value = root
        .map(Element::into_value)
        .ok_or_else(|| TransportError::Malformed("empty document".to_string()))?;
    Ok(value)
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => *root = Some(element),
    }
}

fn push_text(stack: &mut [Element], text: &str) {
    if let Some(current) = stack.last_mut() {
        current.text.push_str(text);
    }
}

fn malformed(err: impl std::fmt::Display) -> TransportError {
    TransportError::Malformed(err.to_string())
}

/// `BillId` -> `bill_id`, `HTMLink` -> `htm_link`.
pub(crate) fn snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);

    for (i, &ch) in chars.iter().enumerate() {
        if ch.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_lower = chars.get(i + 1).is_some_and(|c| c.is_lowercase());
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_lower) {
                out.push('_');
            }
        }
        out.extend(ch.to_lowercase());
    }
    out
}

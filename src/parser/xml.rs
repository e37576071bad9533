//! Minimal XML element reader shared by the XML dialects.
//!
//! Sprite-sheet XML is flat: every record is a single element whose data lives
//! in attributes. Elements are collected in document order with their
//! attributes unescaped.

use std::collections::HashMap;
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{AtlasError, Result};

/// One XML element and its attributes.
#[derive(Debug, Clone)]
pub struct XmlElement {
    pub name: String,
    pub attrs: HashMap<String, String>,
}

impl XmlElement {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).map(String::as_str)
    }

    /// Label for error messages, e.g. `SubTexture 'Walk0001'`.
    fn label(&self) -> String {
        let name = self
            .get("name")
            .or_else(|| self.get("n"))
            .unwrap_or("<unnamed>");
        format!("{} '{}'", self.name, name)
    }

    /// Numeric attribute; accepts integer or decimal text, rounded.
    pub fn number(&self, key: &str, path: &Path) -> Result<Option<f64>> {
        match self.get(key) {
            None => Ok(None),
            Some(raw) if raw.trim().is_empty() => Ok(None),
            Some(raw) => raw.trim().parse::<f64>().map(Some).map_err(|_| {
                AtlasError::format(
                    path,
                    format!("{}: invalid {} '{}'", self.label(), key, raw),
                )
            }),
        }
    }

    pub fn opt_i32(&self, key: &str, path: &Path) -> Result<Option<i32>> {
        Ok(self.number(key, path)?.map(|v| v.round() as i32))
    }

    pub fn opt_u32(&self, key: &str, path: &Path) -> Result<Option<u32>> {
        Ok(self.number(key, path)?.map(|v| v.round().max(0.0) as u32))
    }

    pub fn require_u32(&self, key: &str, path: &Path) -> Result<u32> {
        self.opt_u32(key, path)?.ok_or_else(|| AtlasError::Format {
            path: path.to_path_buf(),
            message: format!("{}: missing required attribute '{}'", self.label(), key),
            help: None,
        })
    }

    /// Boolean attribute: `true`, `y`, `yes` or `1`.
    pub fn flag(&self, key: &str) -> bool {
        matches!(
            self.get(key).map(|v| v.trim().to_ascii_lowercase()).as_deref(),
            Some("true" | "y" | "yes" | "1")
        )
    }
}

fn element(e: &BytesStart<'_>, path: &Path) -> Result<XmlElement> {
    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let mut attrs = HashMap::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| AtlasError::format(path, format!("bad attribute in <{}>: {}", name, err)))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|err| AtlasError::format(path, format!("bad attribute value in <{}>: {}", name, err)))?
            .into_owned();
        attrs.insert(key, value);
    }
    Ok(XmlElement { name, attrs })
}

/// Read every element in document order.
pub fn read_elements(source: &str, path: &Path) -> Result<Vec<XmlElement>> {
    let mut reader = Reader::from_str(source);
    let mut elements = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => elements.push(element(&e, path)?),
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => {
                return Err(AtlasError::Format {
                    path: path.to_path_buf(),
                    message: format!(
                        "invalid XML at byte {}: {}",
                        reader.buffer_position(),
                        err
                    ),
                    help: None,
                })
            }
        }
    }

    Ok(elements)
}

/// Name of the document's root element, if it parses that far.
pub fn root_name(source: &str) -> Option<String> {
    let mut reader = Reader::from_str(source);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                return Some(String::from_utf8_lossy(e.name().as_ref()).into_owned())
            }
            Ok(Event::Eof) | Err(_) => return None,
            Ok(_) => {}
        }
    }
}

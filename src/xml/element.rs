//! Minimaler Elementbaum für Markierungs-Dokumente (nur Attribute und Kind-Elemente).

use anyhow::{bail, Context, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::fmt::Display;
use std::str::FromStr;

/// Ein XML-Element mit Attributen in Einfügereihenfolge
#[derive(Debug, Clone, PartialEq, Default)]
pub struct XmlElement {
    pub name: String,
    attributes: Vec<(String, String)>,
    children: Vec<XmlElement>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Setzt ein Attribut (ersetzt einen vorhandenen Wert).
    pub fn set_attr(&mut self, key: &str, value: impl Display) {
        let value = value.to_string();
        if let Some(entry) = self.attributes.iter_mut().find(|(k, _)| k == key) {
            entry.1 = value;
        } else {
            self.attributes.push((key.to_string(), value));
        }
    }

    pub fn with_attr(mut self, key: &str, value: impl Display) -> Self {
        self.set_attr(key, value);
        self
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Liest ein optionales Attribut; vorhandene, aber ungültige Werte sind ein Fehler.
    pub fn parse_attr<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: FromStr,
        <T as FromStr>::Err: Display,
    {
        match self.attr(key) {
            None => Ok(None),
            Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|e| {
                anyhow::anyhow!(
                    "Attribut {}='{}' in <{}> ungueltig: {}",
                    key,
                    truncate_for_error(raw),
                    self.name,
                    e
                )
            }),
        }
    }

    /// Liest ein Attribut mit Standardwert.
    pub fn attr_or<T>(&self, key: &str, default: T) -> Result<T>
    where
        T: FromStr,
        <T as FromStr>::Err: Display,
    {
        Ok(self.parse_attr(key)?.unwrap_or(default))
    }

    /// Liest ein Pflicht-Attribut.
    pub fn required<T>(&self, key: &str) -> Result<T>
    where
        T: FromStr,
        <T as FromStr>::Err: Display,
    {
        self.parse_attr(key)?
            .with_context(|| format!("Attribut {} fehlt in <{}>", key, self.name))
    }

    /// Vertauscht die Werte zweier Attribute (fehlende Attribute wandern mit).
    pub fn swap_attrs(&mut self, first: &str, second: &str) {
        for (key, _) in self.attributes.iter_mut() {
            if key == first {
                *key = second.to_string();
            } else if key == second {
                *key = first.to_string();
            }
        }
    }

    pub fn add_child(&mut self, child: XmlElement) {
        self.children.push(child);
    }

    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.add_child(child);
        self
    }

    pub fn children(&self) -> &[XmlElement] {
        &self.children
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.children.iter().filter(move |c| c.name == name)
    }

    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Parst ein Dokument und liefert das Wurzelelement.
    pub fn parse(xml_content: &str) -> Result<XmlElement> {
        let mut reader = Reader::from_str(xml_content);
        reader.config_mut().trim_text(true);

        let mut buffer = Vec::new();
        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            match reader.read_event_into(&mut buffer) {
                Ok(Event::Start(ref e)) => {
                    stack.push(element_from_start(&reader, e)?);
                }
                Ok(Event::Empty(ref e)) => {
                    let element = element_from_start(&reader, e)?;
                    match stack.last_mut() {
                        Some(parent) => parent.add_child(element),
                        None => set_root(&mut root, element)?,
                    }
                }
                Ok(Event::End(_)) => {
                    let element = stack
                        .pop()
                        .context("Schliessendes Tag ohne oeffnendes Tag")?;
                    match stack.last_mut() {
                        Some(parent) => parent.add_child(element),
                        None => set_root(&mut root, element)?,
                    }
                }
                Ok(Event::Eof) => break,
                Err(err) => return Err(err).context("Fehler beim Parsen des XML"),
                // Text, Kommentare und Deklaration tragen keine Markierungsdaten
                _ => {}
            }
            buffer.clear();
        }

        if !stack.is_empty() {
            bail!("Unvollstaendiges XML: {} offene Elemente", stack.len());
        }
        root.context("Kein Wurzelelement gefunden")
    }

    /// Schreibt das Element als eigenständiges Dokument.
    pub fn to_document_string(&self) -> String {
        let mut output = String::new();
        output.push_str("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n");
        self.write_into(&mut output, 0);
        output
    }

    /// Schreibt das Element ohne Deklaration.
    pub fn to_xml_string(&self) -> String {
        let mut output = String::new();
        self.write_into(&mut output, 0);
        output
    }

    fn write_into(&self, output: &mut String, depth: usize) {
        let indent = "    ".repeat(depth);
        output.push_str(&indent);
        output.push('<');
        output.push_str(&self.name);
        for (key, value) in &self.attributes {
            output.push_str(&format!(" {}=\"{}\"", key, escape_xml(value)));
        }
        if self.children.is_empty() {
            output.push_str(" />\n");
            return;
        }
        output.push_str(">\n");
        for child in &self.children {
            child.write_into(output, depth + 1);
        }
        output.push_str(&indent);
        output.push_str(&format!("</{}>\n", self.name));
    }
}

fn element_from_start(reader: &Reader<&[u8]>, start: &BytesStart<'_>) -> Result<XmlElement> {
    let name = start.name();
    let tag = reader.decoder().decode(name.as_ref())?;
    let mut element = XmlElement::new(tag.as_ref());
    for attr in start.attributes().with_checks(false) {
        let attr = attr?;
        let key = reader.decoder().decode(attr.key.as_ref())?.into_owned();
        let value = attr.unescape_value()?.into_owned();
        element.attributes.push((key, value));
    }
    Ok(element)
}

fn set_root(root: &mut Option<XmlElement>, element: XmlElement) -> Result<()> {
    if root.is_some() {
        bail!("Mehr als ein Wurzelelement");
    }
    *root = Some(element);
    Ok(())
}

/// Kürzt einen String für Fehlermeldungen auf max. 40 Zeichen
fn truncate_for_error(s: &str) -> &str {
    match s.char_indices().nth(40) {
        Some((index, _)) => &s[..index],
        None => s,
    }
}

fn escape_xml(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested_elements_and_attributes() {
        let xml = r#"<?xml version="1.0"?>
        <Marking V="2" Id="5">
            <L F="1" S="2"><R><S T="2" W="0.15" /></R></L>
            <P Id="7" O="0.5"/>
        </Marking>"#;

        let root = XmlElement::parse(xml).expect("Parsing fehlgeschlagen");
        assert_eq!(root.name, "Marking");
        assert_eq!(root.attr("V"), Some("2"));
        assert_eq!(root.children().len(), 2);
        let style = root
            .child("L")
            .and_then(|l| l.child("R"))
            .and_then(|r| r.child("S"))
            .expect("Stil-Element erwartet");
        assert_eq!(style.required::<f32>("W").unwrap(), 0.15);
    }

    #[test]
    fn test_write_and_reparse_escapes_values() {
        let element = XmlElement::new("T")
            .with_attr("N", "a \"quoted\" <name> & more")
            .with_child(XmlElement::new("S").with_attr("T", 1));

        let written = element.to_document_string();
        let reparsed = XmlElement::parse(&written).expect("Re-Parsing fehlgeschlagen");
        assert_eq!(reparsed, element);
    }

    #[test]
    fn test_invalid_attribute_reports_error() {
        let element = XmlElement::new("S").with_attr("W", "abc");
        let err = element.required::<f32>("W").expect_err("Fehler erwartet");
        assert!(format!("{err:#}").contains("ungueltig"));
        assert_eq!(element.attr_or::<f32>("DL", 1.5).unwrap(), 1.5);
    }

    #[test]
    fn test_swap_attrs() {
        let mut element = XmlElement::new("C").with_attr("RB", 1).with_attr("X", 3);
        element.swap_attrs("RB", "LB");
        assert_eq!(element.attr("LB"), Some("1"));
        assert_eq!(element.attr("RB"), None);
    }

    #[test]
    fn test_unclosed_document_fails() {
        assert!(XmlElement::parse("<Marking><L>").is_err());
    }
}

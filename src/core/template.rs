//! Benannte Stil-Vorlagen.

use crate::style::{Style, STYLE_ELEMENT};
use crate::xml::{XmlElement, SCHEMA_VERSION};
use anyhow::{bail, Result};
use indexmap::IndexMap;

const TEMPLATES_ELEMENT: &str = "Templates";
const TEMPLATE_ELEMENT: &str = "T";

/// Vorlagen in Einfügereihenfolge, über den Namen adressiert
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateLibrary {
    templates: IndexMap<String, Style>,
}

impl TemplateLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Legt eine Vorlage an oder ersetzt sie; liefert die alte.
    pub fn insert(&mut self, name: impl Into<String>, style: Style) -> Option<Style> {
        self.templates.insert(name.into(), style)
    }

    pub fn get(&self, name: &str) -> Option<&Style> {
        self.templates.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Style> {
        self.templates.shift_remove(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Style)> {
        self.templates.iter().map(|(name, style)| (name.as_str(), style))
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn to_xml(&self) -> XmlElement {
        let mut root = XmlElement::new(TEMPLATES_ELEMENT).with_attr("V", SCHEMA_VERSION);
        for (name, style) in &self.templates {
            root.add_child(
                XmlElement::new(TEMPLATE_ELEMENT)
                    .with_attr("N", name)
                    .with_child(style.to_xml()),
            );
        }
        root
    }

    /// Liest alle Vorlagen; unlesbare werden übersprungen und gezählt.
    pub fn from_xml(element: &XmlElement) -> Result<(Self, usize)> {
        let version: u32 = element.attr_or("V", 1)?;
        if version > SCHEMA_VERSION {
            bail!(
                "Vorlagen-Version {} wird nicht unterstuetzt (max. {})",
                version,
                SCHEMA_VERSION
            );
        }

        let mut library = Self::new();
        let mut errors = 0;
        for template in element.children_named(TEMPLATE_ELEMENT) {
            let parsed = template.required::<String>("N").and_then(|name| {
                let Some(style) = template.child(STYLE_ELEMENT) else {
                    bail!("Vorlage '{}' ohne Stil", name);
                };
                Ok((name, Style::from_xml(style, version)?))
            });
            match parsed {
                Ok((name, style)) => {
                    library.insert(name, style);
                }
                Err(e) => {
                    log::warn!("Vorlage uebersprungen: {:#}", e);
                    errors += 1;
                }
            }
        }
        Ok((library, errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::EngineOptions;
    use crate::style::StyleKind;

    #[test]
    fn test_templates_roundtrip_in_order() {
        let options = EngineOptions::default();
        let mut library = TemplateLibrary::new();
        library.insert("Mitte", Style::default_for(StyleKind::Dashed, &options));
        library.insert("Zebra", Style::default_for(StyleKind::ZebraCrosswalk, &options));

        let (parsed, errors) = TemplateLibrary::from_xml(&library.to_xml()).expect("Vorlagen lesbar");
        assert_eq!(errors, 0);
        assert_eq!(parsed, library);
        let names: Vec<&str> = parsed.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["Mitte", "Zebra"]);
    }

    #[test]
    fn test_broken_template_is_counted() {
        let root = XmlElement::new("Templates")
            .with_attr("V", 2)
            .with_child(XmlElement::new("T").with_attr("N", "leer"))
            .with_child(
                XmlElement::new("T")
                    .with_attr("N", "ok")
                    .with_child(XmlElement::new("S").with_attr("T", 1)),
            );
        let (library, errors) = TemplateLibrary::from_xml(&root).expect("Vorlagen lesbar");
        assert_eq!(errors, 1);
        assert_eq!(library.len(), 1);
    }
}

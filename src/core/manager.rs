//! Verwaltung aller Markierungen einer Karte und Lebenszyklus-Hooks des Hosts.

use super::marking::{Marking, MarkingKind};
use super::objects_map::ObjectsMap;
use super::template::TemplateLibrary;
use crate::shared::EngineOptions;
use crate::xml::{XmlElement, MARKING_ELEMENT, SCHEMA_VERSION};
use anyhow::{bail, Result};
use indexmap::IndexMap;

const MANAGER_ELEMENT: &str = "MarkingManager";

/// Ergebnis von [`MarkingManager::on_load`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub markings: usize,
    /// Markierungen, die komplett verworfen wurden
    pub failed_markings: usize,
    /// Summe der verworfenen Entities in geladenen Markierungen
    pub failed_entities: usize,
    pub templates: usize,
}

/// Knoten- und Segment-Markierungen plus Vorlagen
#[derive(Debug, Clone, Default)]
pub struct MarkingManager {
    options: EngineOptions,
    nodes: IndexMap<u32, Marking>,
    segments: IndexMap<u32, Marking>,
    pub templates: TemplateLibrary,
}

impl MarkingManager {
    pub fn new(options: EngineOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    fn table(&self, kind: MarkingKind) -> &IndexMap<u32, Marking> {
        match kind {
            MarkingKind::Node => &self.nodes,
            MarkingKind::Segment => &self.segments,
        }
    }

    fn table_mut(&mut self, kind: MarkingKind) -> &mut IndexMap<u32, Marking> {
        match kind {
            MarkingKind::Node => &mut self.nodes,
            MarkingKind::Segment => &mut self.segments,
        }
    }

    pub fn get(&self, kind: MarkingKind, id: u32) -> Option<&Marking> {
        self.table(kind).get(&id)
    }

    pub fn get_mut(&mut self, kind: MarkingKind, id: u32) -> Option<&mut Marking> {
        self.table_mut(kind).get_mut(&id)
    }

    /// Liefert die Markierung und legt sie bei Bedarf an.
    pub fn get_or_create(&mut self, kind: MarkingKind, id: u32) -> &mut Marking {
        let options = self.options.clone();
        self.table_mut(kind)
            .entry(id)
            .or_insert_with(|| Marking::with_options(kind, id, options))
    }

    pub fn remove(&mut self, kind: MarkingKind, id: u32) -> Option<Marking> {
        self.table_mut(kind).shift_remove(&id)
    }

    pub fn markings(&self) -> impl Iterator<Item = &Marking> {
        self.nodes.values().chain(self.segments.values())
    }

    pub fn len(&self) -> usize {
        self.nodes.len() + self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.segments.is_empty()
    }

    /// Speicher-Hook: alle nicht leeren Markierungen plus Vorlagen.
    pub fn on_save(&self) -> XmlElement {
        let mut root = XmlElement::new(MANAGER_ELEMENT).with_attr("V", SCHEMA_VERSION);
        if !self.templates.is_empty() {
            root.add_child(self.templates.to_xml());
        }
        for marking in self.markings().filter(|marking| !marking.is_empty()) {
            root.add_child(marking.to_xml());
        }
        log::info!("{} Markierungen gespeichert", root.children_named(MARKING_ELEMENT).count());
        root
    }

    /// Lade-Hook: Markierungen werden über `map` auf Ziel-IDs übersetzt.
    ///
    /// Eine unlesbare Markierung wird verworfen, der Rest lädt weiter.
    pub fn on_load(&mut self, element: &XmlElement, map: &ObjectsMap) -> Result<LoadReport> {
        let version: u32 = element.attr_or("V", 1)?;
        if version > SCHEMA_VERSION {
            bail!(
                "Dokument-Version {} wird nicht unterstuetzt (max. {})",
                version,
                SCHEMA_VERSION
            );
        }

        let mut report = LoadReport::default();
        if let Some(templates) = element.child("Templates") {
            let (library, errors) = TemplateLibrary::from_xml(templates)?;
            report.templates = library.len();
            report.failed_entities += errors;
            self.templates = library;
        }

        for config in element.children_named(MARKING_ELEMENT) {
            let header = config
                .required::<String>("T")
                .and_then(|kind| kind.parse::<MarkingKind>())
                .and_then(|kind| Ok((kind, config.required::<u32>("Id")?)));
            let (kind, source_id) = match header {
                Ok(header) => header,
                Err(e) => {
                    log::warn!("Markierung ohne gueltigen Kopf: {:#}", e);
                    report.failed_markings += 1;
                    continue;
                }
            };
            let Some(target_id) = map.marking(kind, source_id) else {
                log::warn!("{} {} hat kein Ziel in der Zuordnung", kind, source_id);
                report.failed_markings += 1;
                continue;
            };

            let marking = self.get_or_create(kind, target_id);
            match marking.from_xml(config, map, false) {
                Ok(decoded) => {
                    report.markings += 1;
                    report.failed_entities += decoded.errors;
                }
                Err(e) => {
                    log::warn!("{} {} nicht ladbar: {:#}", kind, target_id, e);
                    report.failed_markings += 1;
                }
            }
        }

        log::info!(
            "{} Markierungen geladen, {} verworfen, {} Entities fehlerhaft",
            report.markings,
            report.failed_markings,
            report.failed_entities
        );
        Ok(report)
    }
}

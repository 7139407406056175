//! Parser für Markierungs-Dokumente mit ID-Übersetzung.
//!
//! Dekodiert in Dokument-Reihenfolge: Punkte, Linien, Überwege, Füllungen. Jedes
//! Entity wird einzeln gelesen: ein nicht auflösbares Entity wird verworfen und
//! gezählt, der Rest lädt weiter.

use super::{XmlElement, MARKING_ELEMENT, SCHEMA_VERSION};
use crate::core::filler::MarkingFiller;
use crate::core::line::{LineRule, LineType, PointPair, RuleEdge};
use crate::core::point::PointId;
use crate::core::{Marking, MarkingKind, ObjectsMap};
use crate::shared::EngineOptions;
use crate::style::{Style, StyleGroup, STYLE_ELEMENT};
use anyhow::{bail, Context, Result};
use std::collections::{HashMap, HashSet};

#[cfg(test)]
mod tests;

/// Ergebnis eines Dekodier-Durchlaufs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeReport {
    /// Verworfene Entities
    pub errors: usize,
    pub points: usize,
    pub lines: usize,
    pub crosswalks: usize,
    pub fillers: usize,
}

/// Quell-Hash → übersetztes Punktpaar und Linienart
type LineTable = HashMap<u64, (PointPair, LineType)>;

struct Decoder<'a> {
    map: &'a ObjectsMap,
    kind: MarkingKind,
    version: u32,
}

impl Decoder<'_> {
    /// Übersetzt eine Quell-ID; legt noch keine Einfahrt an.
    fn point(&self, raw: u64) -> Result<PointId> {
        let source = PointId::from_raw(raw).with_context(|| format!("Ungueltige Punkt-ID {}", raw))?;
        self.map
            .point(self.kind, source)
            .with_context(|| format!("Punkt {} ist nicht zuordenbar", source))
    }

    fn ensure_entrances(marking: &mut Marking, points: &[PointId]) {
        for point in points {
            marking.ensure_entrance(point.entrance);
        }
    }

    fn style(&self, element: &XmlElement) -> Result<Style> {
        let style = element
            .child(STYLE_ELEMENT)
            .with_context(|| format!("<{}> ohne Stil", element.name))?;
        Style::from_xml(style, self.version)
    }

    fn grouped_style(&self, element: &XmlElement, group: StyleGroup) -> Result<Style> {
        let style = self.style(element)?;
        Marking::check_style(&style, group)?;
        Ok(style)
    }

    fn line_ref(table: &LineTable, source: u64) -> Result<u64> {
        table
            .get(&source)
            .map(|(pair, _)| pair.hash())
            .with_context(|| format!("Linie {:#018x} ist nicht aufloesbar", source))
    }

    fn decode_point(&self, marking: &mut Marking, element: &XmlElement) -> Result<()> {
        let point = self.point(element.required("Id")?)?;
        let offset = element.attr_or("O", marking.options().default_point_offset)?;
        Self::ensure_entrances(marking, &[point]);
        marking.check_point(point, point.point_type, false)?;
        marking.write_point_offset(point, offset);
        Ok(())
    }

    /// Erster Linien-Durchlauf: Identität und Art jeder Linie.
    fn decode_line_header(
        &self,
        marking: &mut Marking,
        element: &XmlElement,
    ) -> Result<(u64, PointPair, LineType)> {
        let source: u64 = element.required("Id")?;
        let a = self.point(element.required("A")?)?;
        let b = self.point(element.required("B")?)?;
        let code: u8 = element.required("T")?;
        let line_type = LineType::from_code(code).with_context(|| format!("Unbekannte Linienart {}", code))?;
        Self::ensure_entrances(marking, &[a, b]);
        Ok((source, PointPair::new(a, b), line_type))
    }

    fn decode_rules(&self, element: &XmlElement, table: &LineTable) -> Result<Vec<LineRule>> {
        let mut rules = Vec::new();
        for rule in element.children_named("R") {
            let remap = |edge: RuleEdge| -> Result<RuleEdge> {
                match edge {
                    RuleEdge::Crossing(source) => Ok(RuleEdge::Crossing(Self::line_ref(table, source)?)),
                    other => Ok(other),
                }
            };
            rules.push(LineRule {
                from: remap(rule.attr_or("F", RuleEdge::Start)?)?,
                to: remap(rule.attr_or("T", RuleEdge::End)?)?,
                style: self.style(rule)?,
            });
        }
        if rules.is_empty() {
            bail!("Linie ohne Regeln");
        }
        Ok(rules)
    }

    /// Zweiter Linien-Durchlauf. Überweglinien entstehen hier ohne Regeln, damit
    /// Schnitt-Ränder auf sie auflösbar sind; ihr Stil folgt mit `<C>`.
    fn decode_line(
        &self,
        marking: &mut Marking,
        element: &XmlElement,
        header: (PointPair, LineType),
        table: &LineTable,
    ) -> Result<()> {
        let (pair, line_type) = header;
        let rules = if line_type == LineType::Crosswalk {
            Vec::new()
        } else {
            self.decode_rules(element, table)?
        };
        marking.check_pair(pair, line_type, false)?;
        marking.insert_line(pair, line_type, rules)?;
        Ok(())
    }

    /// Liefert `false`, wenn die Überweglinie schon als Fehler gezählt wurde.
    fn decode_crosswalk(
        &self,
        marking: &mut Marking,
        element: &XmlElement,
        lines: &LineSources,
        claimed: &mut HashSet<u64>,
    ) -> Result<bool> {
        let source: u64 = element.required("Id")?;
        if lines.failed.contains(&source) {
            log::debug!("Ueberweg {:#018x} uebersprungen: Linie bereits verworfen", source);
            return Ok(false);
        }
        let Some(&(pair, line_type)) = lines.table.get(&source) else {
            bail!("Ueberweglinie {:#018x} fehlt", source);
        };
        if line_type != LineType::Crosswalk {
            bail!("Linie {:#018x} ist keine Ueberweglinie", source);
        }
        let hash = pair.hash();
        if !claimed.insert(hash) {
            bail!("Ueberweg {:#018x} ist doppelt", source);
        }
        if marking.line(hash).is_none() {
            bail!("Ueberweglinie {:#018x} fehlt", source);
        }

        let style = self.grouped_style(element, StyleGroup::Crosswalk)?;
        let mut borders = [None, None];
        for (slot, key) in borders.iter_mut().zip(["RB", "LB"]) {
            let Some(border) = element.parse_attr::<u64>(key)? else {
                continue;
            };
            let resolved = Self::line_ref(&lines.table, border)
                .ok()
                .filter(|hash| marking.line(*hash).is_some());
            match resolved {
                Some(border) => {
                    marking.check_border(border)?;
                    *slot = Some(border);
                }
                None => log::warn!(
                    "Ueberweg {:#018x}: Grenze {} {:#018x} fehlt, Standardgrenze",
                    source,
                    key,
                    border
                ),
            }
        }
        let [mut right, mut left] = borders;
        if self.map.invert {
            std::mem::swap(&mut right, &mut left);
        }

        marking.insert_crosswalk(hash, style, right, left);
        Ok(true)
    }

    fn decode_filler(&self, marking: &mut Marking, element: &XmlElement, table: &LineTable) -> Result<()> {
        let mut vertices = Vec::new();
        let mut guides = Vec::new();
        for vertex in element.children_named("V") {
            vertices.push(self.point(vertex.required("P")?)?);
            guides.push(match vertex.parse_attr::<u64>("L")? {
                Some(source) => Some(Self::line_ref(table, source)?),
                None => None,
            });
        }
        let style = self.grouped_style(element, StyleGroup::Filler)?;
        Self::ensure_entrances(marking, &vertices);
        for &point in &vertices {
            marking.check_point(point, point.point_type, false)?;
        }

        let next = marking.next_filler_id();
        let id = match element.parse_attr::<u32>("Id")? {
            Some(id) if marking.filler(id).is_none() => id,
            _ => next,
        };
        let filler = MarkingFiller::new(id, vertices, guides, style)?;
        marking.check_guides(&filler)?;
        marking.insert_filler(filler);
        Ok(())
    }
}

/// Linien-Zuordnung des Dokuments
#[derive(Default)]
struct LineSources {
    table: LineTable,
    /// Quell-IDs, deren `<L>` bereits als Fehler gezählt ist
    failed: HashSet<u64>,
}

fn tally(report: &mut DecodeReport, what: &str, result: Result<()>) -> bool {
    match result {
        Ok(()) => true,
        Err(e) => {
            log::warn!("{} verworfen: {:#}", what, e);
            report.errors += 1;
            false
        }
    }
}

impl Marking {
    /// Ersetzt den Inhalt durch das Dokument `config`.
    ///
    /// IDs werden über `map` übersetzt. Bei `is_template == false` muss die
    /// Markierungsart übereinstimmen; eine abweichende ID wird nur protokolliert.
    pub fn from_xml(&mut self, config: &XmlElement, map: &ObjectsMap, is_template: bool) -> Result<DecodeReport> {
        if config.name != MARKING_ELEMENT {
            bail!("Erwartet <{}>, gefunden <{}>", MARKING_ELEMENT, config.name);
        }
        let version: u32 = config.attr_or("V", 1)?;
        if version > SCHEMA_VERSION {
            bail!(
                "Markierungs-Version {} wird nicht unterstuetzt (max. {})",
                version,
                SCHEMA_VERSION
            );
        }
        let kind: MarkingKind = config.required::<String>("T")?.parse()?;
        if !is_template {
            if kind != self.kind() {
                bail!("Dokument beschreibt {}, Markierung ist {}", kind, self.kind());
            }
            let source_id: u32 = config.attr_or("Id", self.id())?;
            if map.marking(kind, source_id) != Some(self.id()) {
                log::warn!(
                    "{} {} wird in {} {} geladen",
                    kind,
                    source_id,
                    self.kind(),
                    self.id()
                );
            }
        }

        self.clear();
        let decoder = Decoder { map, kind, version };
        let mut report = DecodeReport::default();

        for element in config.children_named("P") {
            if tally(&mut report, "Punkt", decoder.decode_point(self, element)) {
                report.points += 1;
            }
        }

        let mut lines = LineSources::default();
        let mut headers = Vec::new();
        for element in config.children_named("L") {
            let header = decoder.decode_line_header(self, element);
            if let Ok((source, pair, line_type)) = &header {
                lines.table.insert(*source, (*pair, *line_type));
            }
            headers.push((element, header));
        }
        for (element, header) in headers {
            let result = header.and_then(|(_, pair, line_type)| {
                decoder.decode_line(self, element, (pair, line_type), &lines.table)?;
                Ok(line_type != LineType::Crosswalk)
            });
            match result {
                Ok(true) => report.lines += 1,
                Ok(false) => {}
                Err(e) => {
                    tally(&mut report, "Linie", Err(e));
                    if let Ok(Some(source)) = element.parse_attr::<u64>("Id") {
                        lines.failed.insert(source);
                    }
                }
            }
        }

        let mut claimed = HashSet::new();
        for element in config.children_named("C") {
            match decoder.decode_crosswalk(self, element, &lines, &mut claimed) {
                Ok(true) => report.crosswalks += 1,
                Ok(false) => {}
                Err(e) => {
                    tally(&mut report, "Ueberweg", Err(e));
                }
            }
        }
        // Überweglinien ohne Überweg; ein fehlgeschlagenes `<C>` ist schon gezählt
        let orphans: Vec<u64> = self
            .lines()
            .filter(|line| line.line_type == LineType::Crosswalk)
            .map(|line| line.hash())
            .filter(|hash| self.crosswalk(*hash).is_none())
            .collect();
        for hash in orphans {
            if !claimed.contains(&hash) {
                log::warn!("Ueberweglinie {:#018x} verworfen: kein <C>", hash);
                report.errors += 1;
            }
            self.discard_line(hash);
        }

        // Schnitt-Ränder auf verworfenen Linien machen die Linie selbst ungültig
        loop {
            let dangling = self.lines_with_dangling_crossings();
            if dangling.is_empty() {
                break;
            }
            for hash in dangling {
                log::warn!("Linie {:#018x} verworfen: Schnittlinie fehlt", hash);
                self.discard_line(hash);
                report.lines = report.lines.saturating_sub(1);
                report.errors += 1;
            }
        }

        for element in config.children_named("F") {
            if tally(&mut report, "Fuellung", decoder.decode_filler(self, element, &lines.table)) {
                report.fillers += 1;
            }
        }

        self.recompute();
        log::info!(
            "{} {} geladen: {} Linien, {} Ueberwege, {} Fuellungen, {} Fehler",
            self.kind(),
            self.id(),
            report.lines,
            report.crosswalks,
            report.fillers,
            report.errors
        );
        Ok(report)
    }
}

/// Liest ein eigenständiges Markierungs-Dokument in eine neue Markierung gleicher ID.
pub fn parse_marking_document(xml_content: &str, options: EngineOptions) -> Result<(Marking, DecodeReport)> {
    let root = XmlElement::parse(xml_content)?;
    let kind: MarkingKind = root
        .required::<String>("T")
        .context("Markierungsart fehlt")?
        .parse()?;
    let id: u32 = root.required("Id")?;
    let mut marking = Marking::with_options(kind, id, options);
    let report = marking.from_xml(&root, &ObjectsMap::identity(), false)?;
    Ok((marking, report))
}

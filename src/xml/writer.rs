//! Writer für Markierungs-Dokumente.

use super::{XmlElement, MARKING_ELEMENT, SCHEMA_VERSION};
use crate::core::line::LineType;
use crate::core::Marking;

impl Marking {
    /// Kodiert die Markierung als `<Marking>`-Element.
    ///
    /// Punkte erscheinen nur, wenn ihr Versatz vom Standard der Markierung
    /// abweicht. Überweglinien stehen als `<L>` ohne Regeln, ihr Stil liegt im
    /// zugehörigen `<C>`.
    pub fn to_xml(&self) -> XmlElement {
        let mut root = XmlElement::new(MARKING_ELEMENT)
            .with_attr("V", SCHEMA_VERSION)
            .with_attr("T", self.kind())
            .with_attr("Id", self.id());

        let default = self.options().default_point_offset;
        for point in self.points().filter(|point| point.offset != default) {
            root.add_child(
                XmlElement::new("P")
                    .with_attr("Id", point.id.raw())
                    .with_attr("O", point.offset),
            );
        }

        for line in self.lines() {
            let mut element = XmlElement::new("L")
                .with_attr("Id", line.hash())
                .with_attr("A", line.pair.first.raw())
                .with_attr("B", line.pair.second.raw())
                .with_attr("T", line.line_type.code());
            if line.line_type != LineType::Crosswalk {
                for rule in &line.rules {
                    element.add_child(
                        XmlElement::new("R")
                            .with_attr("F", rule.from)
                            .with_attr("T", rule.to)
                            .with_child(rule.style.to_xml()),
                    );
                }
            }
            root.add_child(element);
        }

        for crosswalk in self.crosswalks() {
            let mut element = XmlElement::new("C").with_attr("Id", crosswalk.line);
            if let Some(border) = crosswalk.right_border {
                element.set_attr("RB", border);
            }
            if let Some(border) = crosswalk.left_border {
                element.set_attr("LB", border);
            }
            element.add_child(crosswalk.style.to_xml());
            root.add_child(element);
        }

        for filler in self.fillers() {
            let mut element = XmlElement::new("F").with_attr("Id", filler.id);
            for (index, vertex) in filler.vertices.iter().enumerate() {
                let mut v = XmlElement::new("V").with_attr("P", vertex.raw());
                if let Some(guide) = filler.guides.get(index).copied().flatten() {
                    v.set_attr("L", guide);
                }
                element.add_child(v);
            }
            element.add_child(filler.style.to_xml());
            root.add_child(element);
        }

        root
    }
}

/// Schreibt eine Markierung als eigenständiges XML-Dokument.
pub fn write_marking_document(marking: &Marking) -> String {
    marking.to_xml().to_document_string()
}

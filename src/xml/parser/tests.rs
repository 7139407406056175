use super::*;
use crate::core::crosswalk::BorderSide;
use crate::core::entrance::EntranceGeometry;
use crate::core::point::PointType;
use crate::style::StyleKind;
use crate::xml::write_marking_document;
use glam::Vec3;

fn marking_with_entrances(kind: MarkingKind, id: u32, entrances: [u32; 2]) -> Marking {
    let mut marking = Marking::new(kind, id);
    marking.update_entrance(
        entrances[0],
        EntranceGeometry::uniform(Vec3::ZERO, Vec3::Z, 3, 5.0),
    );
    marking.update_entrance(
        entrances[1],
        EntranceGeometry::uniform(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z, 3, 5.0),
    );
    marking
}

fn style(kind: StyleKind) -> Style {
    Style::default_for(kind, &EngineOptions::default())
}

/// Regulär, Halt, Überweg mit rechter Grenze, Füllung mit Führung, ein Versatz.
fn populated() -> (Marking, u64, u64) {
    let mut marking = marking_with_entrances(MarkingKind::Node, 5, [1, 2]);
    let regular = marking
        .add_regular_line(PointId::entrance(1, 1), PointId::entrance(2, 2), style(StyleKind::Dashed))
        .expect("Linie erwartet");
    marking
        .add_stop_line(PointId::entrance(1, 0), PointId::entrance(1, 1), style(StyleKind::Solid))
        .expect("Haltelinie erwartet");
    marking
        .set_point_offset(PointId::entrance(1, 1), 0.25)
        .expect("Versatz erwartet");
    let crosswalk = marking
        .add_crosswalk(
            PointId::new(1, PointType::Crosswalk, 0),
            PointId::new(1, PointType::Crosswalk, 3),
            style(StyleKind::ZebraCrosswalk),
            Some(regular),
            None,
        )
        .expect("Ueberweg erwartet");
    marking
        .add_filler(
            vec![PointId::entrance(1, 1), PointId::entrance(2, 2), PointId::entrance(2, 3)],
            vec![Some(regular), None, None],
            style(StyleKind::StripeFiller),
        )
        .expect("Fuellung erwartet");
    (marking, regular, crosswalk)
}

#[test]
fn test_identity_roundtrip_is_stable() {
    let (source, _, _) = populated();
    let config = source.to_xml();

    let mut target = marking_with_entrances(MarkingKind::Node, 5, [1, 2]);
    let report = target
        .from_xml(&config, &ObjectsMap::identity(), false)
        .expect("Dekodieren erwartet");

    assert_eq!(report.errors, 0);
    assert_eq!(report.points, 1);
    assert_eq!(report.lines, 2);
    assert_eq!(report.crosswalks, 1);
    assert_eq!(report.fillers, 1);
    assert_eq!(target.line_count(), 3, "Ueberweglinie zaehlt als Linie");
    assert_eq!(write_marking_document(&target), write_marking_document(&source));
}

#[test]
fn test_segment_map_moves_entities_to_new_entrances() {
    let (source, _, _) = populated();
    let mut map = ObjectsMap::identity();
    map.add_segment(1, 10);
    map.add_segment(2, 20);

    let mut target = marking_with_entrances(MarkingKind::Node, 5, [10, 20]);
    let report = target.from_xml(&source.to_xml(), &map, false).expect("Dekodieren erwartet");
    assert_eq!(report.errors, 0);

    let regular = target
        .line_between(PointId::entrance(10, 1), PointId::entrance(20, 2))
        .map(|line| line.hash())
        .expect("Linie uebersetzt");
    let crosswalk = target.crosswalks().next().expect("Ueberweg uebersetzt");
    assert_eq!(crosswalk.right_border, Some(regular));
    assert_eq!(crosswalk.left_border, None);
    let filler = target.fillers().next().expect("Fuellung uebersetzt");
    assert_eq!(filler.guides[0], Some(regular));
    assert_eq!(
        target.point(PointId::entrance(10, 1)).map(|p| p.offset),
        Some(0.25)
    );
    assert!(target.lines().all(|line| line.trajectory.is_some()));
}

#[test]
fn test_unmapped_entrance_drops_only_affected_entities() {
    let (source, _, _) = populated();
    let mut map = ObjectsMap::identity();
    map.add_segment(1, 1);

    let mut target = marking_with_entrances(MarkingKind::Node, 5, [1, 2]);
    let report = target.from_xml(&source.to_xml(), &map, false).expect("Dekodieren erwartet");

    // Reguläre Linie und Füllung berühren Einfahrt 2
    assert_eq!(report.errors, 2);
    assert_eq!(report.lines, 1);
    assert_eq!(report.crosswalks, 1);
    assert_eq!(report.fillers, 0);
    assert_eq!(target.line_count(), 2);

    // Der Überweg verliert nur seine Grenze
    let crosswalk = target.crosswalks().next().expect("Ueberweg bleibt");
    assert_eq!(crosswalk.right_border, None);
    assert!(crosswalk.geometry.is_some());
}

#[test]
fn test_crosswalk_on_unmapped_entrance_counts_once() {
    let mut source = marking_with_entrances(MarkingKind::Node, 5, [1, 2]);
    source
        .add_crosswalk(
            PointId::new(1, PointType::Crosswalk, 0),
            PointId::new(1, PointType::Crosswalk, 2),
            style(StyleKind::ZebraCrosswalk),
            None,
            None,
        )
        .expect("Ueberweg erwartet");
    let mut map = ObjectsMap::identity();
    map.add_segment(2, 2);

    let mut target = marking_with_entrances(MarkingKind::Node, 5, [1, 2]);
    let report = target.from_xml(&source.to_xml(), &map, false).expect("Dekodieren erwartet");
    assert_eq!(report.errors, 1);
    assert_eq!(report.crosswalks, 0);
    assert!(target.is_empty());
}

#[test]
fn test_crossing_onto_crosswalk_line_roundtrips() {
    let mut source = marking_with_entrances(MarkingKind::Node, 5, [1, 2]);
    let crosswalk = source
        .add_crosswalk(
            PointId::new(1, PointType::Crosswalk, 0),
            PointId::new(1, PointType::Crosswalk, 3),
            style(StyleKind::ZebraCrosswalk),
            None,
            None,
        )
        .expect("Ueberweg erwartet");
    let line = source
        .add_regular_line(PointId::entrance(1, 1), PointId::entrance(2, 2), style(StyleKind::Solid))
        .expect("Linie erwartet");
    source
        .set_line_rules(
            line,
            vec![LineRule {
                from: RuleEdge::Crossing(crosswalk),
                to: RuleEdge::End,
                style: style(StyleKind::Dashed),
            }],
        )
        .expect("Regeln erwartet");

    let mut target = marking_with_entrances(MarkingKind::Node, 5, [1, 2]);
    let report = target
        .from_xml(&source.to_xml(), &ObjectsMap::identity(), false)
        .expect("Dekodieren erwartet");
    assert_eq!(report.errors, 0);
    assert_eq!(report.lines, 1);
    assert_eq!(report.crosswalks, 1);
    assert_eq!(target.line_count(), 2);
    assert!(target.get_dependences(crosswalk).lines.contains(&line));
    assert_eq!(write_marking_document(&target), write_marking_document(&source));
}

#[test]
fn test_crosswalk_falls_back_when_border_line_is_discarded() {
    let straight = PointPair::new(PointId::entrance(1, 1), PointId::entrance(2, 2));
    let diagonal = PointPair::new(PointId::entrance(1, 2), PointId::entrance(2, 3));
    let crossing = PointPair::new(
        PointId::new(1, PointType::Crosswalk, 0),
        PointId::new(1, PointType::Crosswalk, 3),
    );
    let line = |pair: PointPair, line_type: LineType| {
        XmlElement::new("L")
            .with_attr("Id", pair.hash())
            .with_attr("A", pair.first.raw())
            .with_attr("B", pair.second.raw())
            .with_attr("T", line_type.code())
    };

    let config = XmlElement::new(MARKING_ELEMENT)
        .with_attr("V", SCHEMA_VERSION)
        .with_attr("T", "Node")
        .with_attr("Id", 5)
        .with_child(
            line(straight, LineType::Regular).with_child(
                XmlElement::new("R")
                    .with_attr("F", RuleEdge::Crossing(diagonal.hash()))
                    .with_attr("T", RuleEdge::End)
                    .with_child(style(StyleKind::Solid).to_xml()),
            ),
        )
        // ohne Regeln: wird verworfen und reißt `straight` mit
        .with_child(line(diagonal, LineType::Regular))
        .with_child(line(crossing, LineType::Crosswalk))
        .with_child(
            XmlElement::new("C")
                .with_attr("Id", crossing.hash())
                .with_attr("RB", straight.hash())
                .with_child(style(StyleKind::ZebraCrosswalk).to_xml()),
        );

    let mut target = marking_with_entrances(MarkingKind::Node, 5, [1, 2]);
    let report = target
        .from_xml(&config, &ObjectsMap::identity(), false)
        .expect("Dekodieren erwartet");
    assert_eq!(report.errors, 2);
    assert_eq!(report.crosswalks, 1);
    let crosswalk = target.crosswalk(crossing.hash()).expect("Ueberweg bleibt");
    assert_eq!(crosswalk.right_border, None);
    assert!(crosswalk.geometry.is_some());
    assert!(target.get_dependences(straight.hash()).is_empty());
}

#[test]
fn test_failed_line_leaves_no_placeholder_entrance() {
    let pair = PointPair::new(PointId::entrance(1, 0), PointId::entrance(3, 1));
    let config = XmlElement::new(MARKING_ELEMENT)
        .with_attr("V", SCHEMA_VERSION)
        .with_attr("T", "Node")
        .with_attr("Id", 5)
        .with_child(
            XmlElement::new("L")
                .with_attr("Id", pair.hash())
                .with_attr("A", pair.first.raw())
                .with_attr("B", pair.second.raw())
                .with_attr("T", LineType::Regular.code())
                .with_child(XmlElement::new("R").with_child(style(StyleKind::Solid).to_xml())),
        );
    let mut map = ObjectsMap::identity();
    map.add_segment(1, 1);

    let mut target = Marking::new(MarkingKind::Node, 5);
    let report = target.from_xml(&config, &map, false).expect("Dekodieren erwartet");
    assert_eq!(report.errors, 1);
    assert!(target.entrance(1).is_none(), "keine Platzhalter-Einfahrt fuer Punkt A");
}

#[test]
fn test_degenerate_style_parameter_drops_the_line() {
    let pair = PointPair::new(PointId::entrance(1, 1), PointId::entrance(2, 2));
    let zigzag = XmlElement::new(STYLE_ELEMENT)
        .with_attr("T", StyleKind::ZigZag.code())
        .with_attr("W", 0.15)
        .with_attr("ST", "1e-30")
        .with_attr("O", 0.6);
    let config = XmlElement::new(MARKING_ELEMENT)
        .with_attr("V", SCHEMA_VERSION)
        .with_attr("T", "Node")
        .with_attr("Id", 5)
        .with_child(
            XmlElement::new("L")
                .with_attr("Id", pair.hash())
                .with_attr("A", pair.first.raw())
                .with_attr("B", pair.second.raw())
                .with_attr("T", LineType::Regular.code())
                .with_child(
                    XmlElement::new("R")
                        .with_attr("F", RuleEdge::Start)
                        .with_attr("T", RuleEdge::End)
                        .with_child(zigzag),
                ),
        );

    let mut target = marking_with_entrances(MarkingKind::Node, 5, [1, 2]);
    let report = target
        .from_xml(&config, &ObjectsMap::identity(), false)
        .expect("Dekodieren erwartet");
    assert_eq!(report.errors, 1);
    assert_eq!(report.lines, 0);
    assert!(target.is_empty());
}

#[test]
fn test_inverted_map_swaps_crosswalk_borders() {
    let (source, regular, crosswalk) = populated();
    let mut target = marking_with_entrances(MarkingKind::Node, 5, [1, 2]);
    target
        .from_xml(&source.to_xml(), &ObjectsMap::inverted(), false)
        .expect("Dekodieren erwartet");

    let decoded = target.crosswalk(crosswalk).expect("Ueberweg erwartet");
    assert_eq!(decoded.border(BorderSide::Left), Some(regular));
    assert_eq!(decoded.border(BorderSide::Right), None);
}

#[test]
fn test_line_crossing_a_dropped_line_is_dropped_too() {
    let straight = PointPair::new(PointId::entrance(1, 1), PointId::entrance(2, 2));
    let diagonal = PointPair::new(PointId::entrance(1, 2), PointId::entrance(2, 3));
    let line = |pair: PointPair| {
        XmlElement::new("L")
            .with_attr("Id", pair.hash())
            .with_attr("A", pair.first.raw())
            .with_attr("B", pair.second.raw())
            .with_attr("T", LineType::Regular.code())
    };
    let rule = |from: RuleEdge, to: RuleEdge| {
        XmlElement::new("R")
            .with_attr("F", from)
            .with_attr("T", to)
            .with_child(style(StyleKind::Solid).to_xml())
    };

    let config = XmlElement::new(MARKING_ELEMENT)
        .with_attr("V", SCHEMA_VERSION)
        .with_attr("T", "Node")
        .with_attr("Id", 5)
        .with_child(
            line(straight)
                .with_child(rule(RuleEdge::Start, RuleEdge::Crossing(diagonal.hash())))
                .with_child(rule(RuleEdge::Crossing(diagonal.hash()), RuleEdge::End)),
        )
        // ohne Regeln: wird verworfen
        .with_child(line(diagonal));

    let mut target = marking_with_entrances(MarkingKind::Node, 5, [1, 2]);
    let report = target
        .from_xml(&config, &ObjectsMap::identity(), false)
        .expect("Dekodieren erwartet");
    assert_eq!(report.errors, 2);
    assert_eq!(report.lines, 0);
    assert!(target.is_empty());
}

#[test]
fn test_header_checks() {
    let (source, _, _) = populated();
    let config = source.to_xml();

    let mut segment = marking_with_entrances(MarkingKind::Segment, 5, [1, 2]);
    assert!(segment.from_xml(&config, &ObjectsMap::identity(), false).is_err());
    let report = segment
        .from_xml(&config, &ObjectsMap::identity(), true)
        .expect("Vorlage ignoriert die Art");
    assert_eq!(report.errors, 0);

    let mut newer = config.clone();
    newer.set_attr("V", SCHEMA_VERSION + 1);
    let mut target = marking_with_entrances(MarkingKind::Node, 5, [1, 2]);
    assert!(target.from_xml(&newer, &ObjectsMap::identity(), false).is_err());
    assert!(target.is_empty());
}

#[test]
fn test_wrong_style_group_is_an_entity_error() {
    let (source, _, _) = populated();
    let mut config = source.to_xml();
    let mut patched = XmlElement::new(MARKING_ELEMENT);
    for (key, value) in config.attributes() {
        patched.set_attr(key, value);
    }
    for child in config.children() {
        if child.name == "C" {
            let crosswalk = XmlElement::new("C")
                .with_attr("Id", child.attr("Id").unwrap_or_default())
                .with_child(style(StyleKind::Solid).to_xml());
            patched.add_child(crosswalk);
        } else {
            patched.add_child(child.clone());
        }
    }
    config = patched;

    let mut target = marking_with_entrances(MarkingKind::Node, 5, [1, 2]);
    let report = target
        .from_xml(&config, &ObjectsMap::identity(), false)
        .expect("Dekodieren erwartet");
    assert_eq!(report.errors, 1);
    assert_eq!(report.crosswalks, 0);
}

#[test]
fn test_parse_marking_document_uses_header_identity() {
    let (source, _, _) = populated();
    let xml = write_marking_document(&source);
    let (parsed, report) =
        parse_marking_document(&xml, EngineOptions::default()).expect("Dokument lesbar");
    assert_eq!(parsed.kind(), MarkingKind::Node);
    assert_eq!(parsed.id(), 5);
    assert_eq!(report.errors, 0);
    assert_eq!(parsed.line_count(), 3);
    assert!(
        parsed.lines().all(|line| line.trajectory.is_none()),
        "ohne Einfahrts-Geometrie gibt es keine Trajektorien"
    );
}

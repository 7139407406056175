use glam::Vec3;
use markup_engine::core::PointType;
use markup_engine::style::StyleGroup;
use markup_engine::{
    parse_marking_document, write_marking_document, EngineOptions, EntranceGeometry, LineType,
    Marking, MarkingKind, ObjectsMap, PointId, Style, StyleKind, XmlElement,
};

/// Drei Einfahrten mit je drei Spuren um einen Knoten.
fn entrances(ids: [u32; 3]) -> Marking {
    let mut marking = Marking::new(MarkingKind::Node, 42);
    marking.update_entrance(ids[0], EntranceGeometry::uniform(Vec3::ZERO, Vec3::Z, 3, 3.5));
    marking.update_entrance(
        ids[1],
        EntranceGeometry::uniform(Vec3::new(0.0, 0.0, 20.0), Vec3::NEG_Z, 3, 3.5),
    );
    marking.update_entrance(
        ids[2],
        EntranceGeometry::uniform(Vec3::new(15.0, 0.0, 10.0), Vec3::NEG_X, 3, 3.5),
    );
    marking
}

fn style(kind: StyleKind) -> Style {
    Style::default_for(kind, &EngineOptions::default())
}

fn crosswalk_point(entrance: u32, index: u8) -> PointId {
    PointId::new(entrance, PointType::Crosswalk, index)
}

fn lane_point(entrance: u32, index: u8) -> PointId {
    PointId::new(entrance, PointType::Lane, index)
}

/// Jede Entity-Art einmal, mit Grenze, Führung und Versatz.
fn populated() -> Marking {
    let mut marking = entrances([1, 2, 3]);
    let straight = marking
        .add_regular_line(PointId::entrance(1, 1), PointId::entrance(2, 2), style(StyleKind::Dashed))
        .expect("Linie erwartet");
    marking
        .add_regular_line(PointId::entrance(1, 0), PointId::entrance(3, 1), style(StyleKind::Solid))
        .expect("Linie erwartet");
    marking
        .add_lane_line(lane_point(1, 0), lane_point(2, 2), style(StyleKind::Dashed))
        .expect("Spurlinie erwartet");
    marking
        .add_stop_line(PointId::entrance(1, 0), PointId::entrance(1, 3), style(StyleKind::Solid))
        .expect("Haltelinie erwartet");
    marking
        .add_normal_line(PointId::entrance(3, 0), style(StyleKind::Solid))
        .expect("Normalen-Linie erwartet");
    marking
        .add_crosswalk(
            crosswalk_point(2, 0),
            crosswalk_point(2, 3),
            style(StyleKind::ZebraCrosswalk),
            None,
            Some(straight),
        )
        .expect("Ueberweg erwartet");
    marking
        .add_filler(
            vec![PointId::entrance(1, 1), PointId::entrance(2, 2), PointId::entrance(3, 3)],
            vec![Some(straight), None, None],
            style(StyleKind::SolidFiller),
        )
        .expect("Fuellung erwartet");
    marking
        .set_point_offset(PointId::entrance(1, 1), -0.4)
        .expect("Versatz erwartet");
    marking
}

#[test]
fn test_document_roundtrip_is_stable() {
    let source = populated();
    let xml = write_marking_document(&source);
    let (parsed, report) =
        parse_marking_document(&xml, EngineOptions::default()).expect("Dokument lesbar");

    assert_eq!(report.errors, 0);
    assert_eq!(parsed.line_count(), source.line_count());
    assert_eq!(parsed.crosswalk_count(), 1);
    assert_eq!(parsed.filler_count(), 1);
    assert_eq!(write_marking_document(&parsed), xml);
}

#[test]
fn test_every_style_kind_roundtrips() {
    for kind in StyleKind::ALL {
        let mut source = entrances([1, 2, 3]);
        if StyleGroup::RegularLine.allows(kind) {
            source
                .add_regular_line(PointId::entrance(1, 1), PointId::entrance(2, 2), style(kind))
                .expect("Linie erwartet");
        } else if StyleGroup::Crosswalk.allows(kind) {
            source
                .add_crosswalk(crosswalk_point(1, 0), crosswalk_point(1, 2), style(kind), None, None)
                .expect("Ueberweg erwartet");
        } else {
            source
                .add_filler(
                    vec![PointId::entrance(1, 0), PointId::entrance(2, 1), PointId::entrance(3, 2)],
                    Vec::new(),
                    style(kind),
                )
                .expect("Fuellung erwartet");
        }

        let mut target = entrances([1, 2, 3]);
        let report = target
            .from_xml(&source.to_xml(), &ObjectsMap::identity(), false)
            .expect("Dekodieren erwartet");
        assert_eq!(report.errors, 0, "Fehler bei {:?}", kind);

        let decoded = target
            .lines()
            .filter(|line| line.line_type != LineType::Crosswalk)
            .map(|line| line.rules[0].style.clone())
            .chain(target.crosswalks().map(|c| c.style.clone()))
            .chain(target.fillers().map(|f| f.style.clone()))
            .next();
        assert_eq!(decoded, Some(style(kind)), "Stil {:?} nicht erhalten", kind);
    }
}

#[test]
fn test_remap_preserves_topology() {
    let source = populated();
    let mut map = ObjectsMap::identity();
    map.add_segment(1, 10);
    map.add_segment(2, 20);
    map.add_segment(3, 30);
    let remap = |point: PointId| PointId {
        entrance: point.entrance * 10,
        ..point
    };

    let mut target = entrances([10, 20, 30]);
    let report = target.from_xml(&source.to_xml(), &map, false).expect("Dekodieren erwartet");
    assert_eq!(report.errors, 0);
    assert_eq!(target.line_count(), source.line_count());

    for line in source.lines() {
        let mapped = target
            .line_between(remap(line.pair.first), remap(line.pair.second))
            .unwrap_or_else(|| panic!("Linie {} fehlt nach Zuordnung", line.pair));
        assert_eq!(mapped.line_type, line.line_type);
        assert_eq!(mapped.rules.len(), line.rules.len());
        assert!(mapped.trajectory.is_some(), "Trajektorie nach Zuordnung erwartet");
    }

    let border = |marking: &Marking| {
        let crosswalk = marking.crosswalks().next().expect("Ueberweg erwartet");
        let line = crosswalk.left_border.and_then(|hash| marking.line(hash)).expect("Grenze erwartet");
        line.pair
    };
    let source_border = border(&source);
    let target_border = border(&target);
    assert_eq!(target_border.first, remap(source_border.first));
    assert_eq!(target_border.second, remap(source_border.second));

    let filler = target.fillers().next().expect("Fuellung erwartet");
    let expected: Vec<PointId> = source
        .fillers()
        .flat_map(|f| f.vertices.iter().copied().map(remap))
        .collect();
    assert_eq!(filler.vertices, expected);
    assert!(filler.guides[0].is_some());
    assert_eq!(
        target.point(PointId::entrance(10, 1)).map(|p| p.offset),
        Some(-0.4)
    );
}

#[test]
fn test_unmapped_anchor_drops_exactly_one_line() {
    let mut source = entrances([1, 2, 3]);
    source
        .add_regular_line(PointId::entrance(1, 1), PointId::entrance(2, 2), style(StyleKind::Solid))
        .expect("Linie erwartet");
    source
        .add_regular_line(PointId::entrance(1, 0), PointId::entrance(3, 1), style(StyleKind::Solid))
        .expect("Linie erwartet");
    source
        .add_stop_line(PointId::entrance(2, 0), PointId::entrance(2, 3), style(StyleKind::Solid))
        .expect("Haltelinie erwartet");

    let mut map = ObjectsMap::identity();
    map.add_segment(1, 1);
    map.add_segment(2, 2);

    let mut target = entrances([1, 2, 3]);
    let report = target.from_xml(&source.to_xml(), &map, false).expect("Dekodieren erwartet");
    assert_eq!(report.errors, 1);
    assert_eq!(report.lines, 2);
    assert!(target
        .line_between(PointId::entrance(1, 0), PointId::entrance(3, 1))
        .is_none());
}

#[test]
fn test_zero_offset_survives_with_nonzero_default() {
    let options = EngineOptions {
        default_point_offset: 0.5,
        ..EngineOptions::default()
    };
    let mut source = Marking::with_options(MarkingKind::Segment, 4, options.clone());
    source.update_entrance(1, EntranceGeometry::uniform(Vec3::ZERO, Vec3::Z, 3, 3.5));
    source.update_entrance(
        2,
        EntranceGeometry::uniform(Vec3::new(0.0, 0.0, 20.0), Vec3::NEG_Z, 3, 3.5),
    );
    source
        .add_regular_line(PointId::entrance(1, 1), PointId::entrance(2, 2), style(StyleKind::Solid))
        .expect("Linie erwartet");
    source
        .set_point_offset(PointId::entrance(1, 1), 0.0)
        .expect("Versatz erwartet");

    let (parsed, report) =
        parse_marking_document(&write_marking_document(&source), options).expect("Dokument lesbar");
    assert_eq!(report.errors, 0);
    assert_eq!(report.points, 1, "nur der abweichende Punkt wird geschrieben");
    assert_eq!(parsed.point(PointId::entrance(1, 1)).map(|p| p.offset), Some(0.0));
    assert_eq!(parsed.point(PointId::entrance(2, 2)).map(|p| p.offset), Some(0.5));
}

#[test]
fn test_fixture_document_decodes() {
    let xml_content = include_str!("fixtures/simple_marking.xml");
    let (marking, report) =
        parse_marking_document(xml_content, EngineOptions::default()).expect("Fixture lesbar");

    assert_eq!(marking.kind(), MarkingKind::Segment);
    assert_eq!(marking.id(), 7);
    // Eine Linie verweist auf einen unbekannten Stil
    assert_eq!(report.errors, 1);
    assert_eq!(marking.line_count(), 3);
    assert_eq!(marking.crosswalk_count(), 1);
    assert_eq!(marking.filler_count(), 1);
    assert_eq!(
        marking.point(PointId::entrance(1, 1)).map(|p| p.offset),
        Some(0.5)
    );

    // Version-1-Farbe wird beim Schreiben in die aktuelle Form gebracht
    let normalised = XmlElement::parse(&write_marking_document(&marking)).expect("Ausgabe lesbar");
    assert_eq!(normalised.attr("V"), Some("2"));
}

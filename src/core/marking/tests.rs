use super::*;
use crate::core::entrance::EntranceGeometry;
use crate::core::line::RuleEdge;
use crate::style::{DashedLineStyle, MarkingColor, StyleKind, ZebraCrosswalkStyle};
use approx::assert_relative_eq;
use glam::Vec3;

/// Zwei gegenüberliegende Einfahrten mit je drei 5-m-Spuren, 5 m Abstand.
///
/// Einfahrt 1 liegt bei z = 0 (Normale +Z), Einfahrt 2 bei z = 5 (Normale -Z).
/// Kantenpunkte von Einfahrt 1 liegen bei x = 7.5, 2.5, -2.5, -7.5,
/// die von Einfahrt 2 bei x = -7.5, -2.5, 2.5, 7.5.
fn two_entrances() -> Marking {
    let mut marking = Marking::new(MarkingKind::Node, 100);
    marking.update_entrance(1, EntranceGeometry::uniform(Vec3::ZERO, Vec3::Z, 3, 5.0));
    marking.update_entrance(
        2,
        EntranceGeometry::uniform(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z, 3, 5.0),
    );
    marking
}

fn dashed() -> Style {
    Style::Dashed(DashedLineStyle {
        color: MarkingColor::WHITE,
        width: 0.15,
        dash_length: 0.5,
        space_length: 0.5,
    })
}

fn solid() -> Style {
    Style::default_for(StyleKind::Solid, &EngineOptions::default())
}

fn zebra(width: f32) -> Style {
    Style::ZebraCrosswalk(ZebraCrosswalkStyle {
        color: MarkingColor::WHITE,
        width,
        dash_length: 0.4,
        space_length: 0.6,
        offset_before: 0.0,
        offset_after: 0.0,
    })
}

fn crosswalk_point(entrance: u32, index: u8) -> PointId {
    PointId::new(entrance, PointType::Crosswalk, index)
}

#[test]
fn test_dashed_line_between_entrances_has_five_dashes() {
    let mut marking = two_entrances();
    let hash = marking
        .add_regular_line(PointId::entrance(1, 1), PointId::entrance(2, 2), dashed())
        .expect("Linie erwartet");

    let line = marking.line(hash).expect("Linie gespeichert");
    let trajectory = line.trajectory.as_ref().expect("Trajektorie berechnet");
    assert_relative_eq!(trajectory.length(), 5.0, epsilon = 1e-4);

    let dashes: Vec<_> = line
        .primitives
        .get(Lod::Detailed)
        .iter()
        .filter_map(MarkingPrimitive::as_dash)
        .collect();
    assert_eq!(dashes.len(), 5, "5 m mit 0.5/0.5 ergibt 5 Striche");
    for dash in dashes {
        assert_relative_eq!(dash.length(), 0.5, epsilon = 1e-3);
    }
}

#[test]
fn test_duplicate_and_invalid_lines() {
    let mut marking = two_entrances();
    let a = PointId::entrance(1, 0);
    let b = PointId::entrance(2, 3);
    let hash = marking.add_regular_line(a, b, solid()).expect("Linie erwartet");
    assert_eq!(
        marking.add_regular_line(b, a, solid()),
        Err(MarkingError::LineExists(hash))
    );
    assert!(matches!(
        marking.add_regular_line(a, PointId::entrance(2, 9), solid()),
        Err(MarkingError::PointOutOfRange { count: 4, .. })
    ));
    assert!(matches!(
        marking.add_regular_line(a, PointId::entrance(7, 0), solid()),
        Err(MarkingError::EntranceNotFound(7))
    ));
    assert!(matches!(
        marking.add_stop_line(a, b, solid()),
        Err(MarkingError::NotSameEntrance { .. })
    ));
    assert!(matches!(
        marking.add_stop_line(a, PointId::entrance(1, 3), zebra(2.0)),
        Err(MarkingError::InvalidStyle { .. })
    ));
    assert_eq!(marking.line_count(), 1);
}

#[test]
fn test_crosswalk_without_borders_gets_default_borders() {
    let mut marking = two_entrances();
    let hash = marking
        .add_crosswalk(crosswalk_point(1, 0), crosswalk_point(1, 1), zebra(2.0), None, None)
        .expect("Ueberweg erwartet");

    let crosswalk = marking.crosswalk(hash).expect("Ueberweg gespeichert");
    let geometry = crosswalk.geometry.as_ref().expect("Geometrie berechnet");
    assert_relative_eq!(geometry.right.length(), 2.0, epsilon = 1e-4);
    assert_relative_eq!(geometry.left.length(), 2.0, epsilon = 1e-4);
    assert!(!crosswalk.primitives.is_empty());
    assert_eq!(
        marking.line(hash).map(|line| line.line_type),
        Some(LineType::Crosswalk)
    );
}

#[test]
fn test_removing_border_line_falls_back_to_default() {
    let mut marking = two_entrances();
    // Schräge Linie von (7.5, 0) nach (2.5, 5)
    let border = marking
        .add_regular_line(PointId::entrance(1, 0), PointId::entrance(2, 2), solid())
        .expect("Grenzlinie erwartet");
    let crosswalk = marking
        .add_crosswalk(
            crosswalk_point(1, 0),
            crosswalk_point(1, 1),
            zebra(2.0),
            Some(border),
            None,
        )
        .expect("Ueberweg erwartet");

    let right = |marking: &Marking| {
        marking
            .crosswalk(crosswalk)
            .and_then(|c| c.geometry.as_ref())
            .map(|g| g.right.length())
            .unwrap_or_default()
    };
    assert_relative_eq!(right(&marking), 8.0f32.sqrt(), epsilon = 1e-3);

    let dependences = marking.get_dependences(border);
    assert_eq!(dependences.crosswalks, vec![crosswalk]);

    let repaired = marking.remove_line(border).expect("Entfernen erwartet");
    assert_eq!(repaired.crosswalks, vec![crosswalk]);
    assert_eq!(marking.crosswalk(crosswalk).and_then(|c| c.right_border), None);
    assert_relative_eq!(right(&marking), 2.0, epsilon = 1e-4);
}

#[test]
fn test_border_must_be_regular_line() {
    let mut marking = two_entrances();
    let stop = marking
        .add_stop_line(PointId::entrance(1, 0), PointId::entrance(1, 3), solid())
        .expect("Haltelinie erwartet");
    assert_eq!(
        marking.add_crosswalk(
            crosswalk_point(1, 0),
            crosswalk_point(1, 1),
            zebra(2.0),
            Some(stop),
            None
        ),
        Err(MarkingError::InvalidBorder(stop))
    );
    assert_eq!(marking.crosswalk_count(), 0);
    assert_eq!(marking.line_count(), 1, "keine halbe Ueberweglinie zurueckgelassen");
}

#[test]
fn test_removing_crosswalk_removes_its_line() {
    let mut marking = two_entrances();
    let hash = marking
        .add_crosswalk(crosswalk_point(1, 0), crosswalk_point(1, 1), zebra(2.0), None, None)
        .expect("Ueberweg erwartet");
    marking.remove_crosswalk(hash).expect("Entfernen erwartet");
    assert!(marking.line(hash).is_none());
    assert_eq!(marking.remove_crosswalk(hash), Err(MarkingError::CrosswalkNotFound(hash)));
}

#[test]
fn test_crossing_rule_edges_freeze_when_crossing_removed() {
    let mut marking = two_entrances();
    let main = marking
        .add_regular_line(PointId::entrance(1, 1), PointId::entrance(2, 2), solid())
        .expect("Linie erwartet");
    // Diagonale von (7.5, 0) nach (-2.5, 5) kreuzt bei z = 2.5
    let diagonal = marking
        .add_regular_line(PointId::entrance(1, 0), PointId::entrance(2, 1), solid())
        .expect("Linie erwartet");

    marking
        .set_line_rules(
            main,
            vec![
                LineRule {
                    from: RuleEdge::Start,
                    to: RuleEdge::Crossing(diagonal),
                    style: solid(),
                },
                LineRule {
                    from: RuleEdge::Crossing(diagonal),
                    to: RuleEdge::End,
                    style: dashed(),
                },
            ],
        )
        .expect("Regeln erwartet");

    let resolved = marking.line(main).map(|l| l.resolved.clone()).unwrap_or_default();
    assert_eq!(resolved.len(), 2);
    let (_, to) = resolved[0].expect("erste Regel aufgeloest");
    assert_relative_eq!(to, 0.5, epsilon = 1e-4);
    assert_eq!(marking.get_dependences(diagonal).lines, vec![main]);

    marking.remove_line(diagonal).expect("Entfernen erwartet");
    let rules = marking.line(main).map(|l| l.rules.clone()).unwrap_or_default();
    match rules[0].to {
        RuleEdge::Position(t) => assert_relative_eq!(t, 0.5, epsilon = 1e-4),
        other => panic!("eingefrorener Rand erwartet, war {:?}", other),
    }
    assert!(marking.line(main).is_some_and(|l| !l.primitives.is_empty()));
}

#[test]
fn test_crossing_must_exist() {
    let mut marking = two_entrances();
    let main = marking
        .add_regular_line(PointId::entrance(1, 1), PointId::entrance(2, 2), solid())
        .expect("Linie erwartet");
    let rule = LineRule {
        from: RuleEdge::Crossing(12345),
        to: RuleEdge::End,
        style: solid(),
    };
    assert_eq!(marking.add_rule(main, rule), Err(MarkingError::LineNotFound(12345)));
    let own = LineRule {
        from: RuleEdge::Crossing(main),
        to: RuleEdge::End,
        style: solid(),
    };
    assert_eq!(marking.add_rule(main, own), Err(MarkingError::SelfCrossing(main)));
}

#[test]
fn test_zero_rules_remove_the_line() {
    let mut marking = two_entrances();
    let hash = marking
        .add_regular_line(PointId::entrance(1, 1), PointId::entrance(2, 2), solid())
        .expect("Linie erwartet");
    marking.set_line_rules(hash, Vec::new()).expect("Leeren erwartet");
    assert_eq!(marking.line_count(), 0);
}

#[test]
fn test_normal_line_stops_at_opposite_entrance() {
    let mut marking = two_entrances();
    let hash = marking
        .add_normal_line(PointId::entrance(1, 1), solid())
        .expect("Normale erwartet");
    let length = marking
        .line(hash)
        .and_then(|l| l.trajectory.as_ref())
        .map(|t| t.length())
        .unwrap_or_default();
    assert_relative_eq!(length, 5.0, epsilon = 1e-3);
    assert!(marking.point(PointId::new(1, PointType::Normal, 1)).is_some());
}

#[test]
fn test_point_offset_recomputes_only_users() {
    let mut marking = two_entrances();
    let moved = marking
        .add_regular_line(PointId::entrance(1, 1), PointId::entrance(2, 2), solid())
        .expect("Linie erwartet");
    marking
        .add_regular_line(PointId::entrance(1, 3), PointId::entrance(2, 0), solid())
        .expect("Linie erwartet");

    let stats = marking
        .set_point_offset(PointId::entrance(1, 1), 0.5)
        .expect("Versatz erwartet");
    assert_eq!(stats.points, 1);
    assert_eq!(stats.lines, 1, "nur die betroffene Linie");
    let start = marking
        .line(moved)
        .and_then(|l| l.trajectory.as_ref())
        .map(|t| t.start_position())
        .unwrap_or_default();
    // Querachse von Einfahrt 1 zeigt nach -X
    assert_relative_eq!(start.x, 2.0, epsilon = 1e-4);
}

#[test]
fn test_reset_point_offsets_is_idempotent() {
    let mut marking = two_entrances();
    marking
        .add_regular_line(PointId::entrance(1, 1), PointId::entrance(2, 2), solid())
        .expect("Linie erwartet");
    marking
        .set_point_offset(PointId::entrance(1, 1), 0.3)
        .expect("Versatz erwartet");

    let first = marking.reset_point_offsets();
    assert_eq!(first.points, 1);
    assert_eq!(first.lines, 1);
    let second = marking.reset_point_offsets();
    assert!(second.is_empty(), "zweiter Aufruf beruehrt nichts");
}

#[test]
fn test_filler_guides_and_removal() {
    let mut marking = two_entrances();
    let guide = marking
        .add_regular_line(PointId::entrance(1, 1), PointId::entrance(2, 2), solid())
        .expect("Linie erwartet");
    let style = Style::default_for(StyleKind::SolidFiller, &EngineOptions::default());
    let vertices = vec![
        PointId::entrance(1, 0),
        PointId::entrance(1, 1),
        PointId::entrance(2, 2),
    ];

    let wrong = marking.add_filler(vertices.clone(), vec![Some(guide)], style.clone());
    assert!(matches!(wrong, Err(MarkingError::InvalidContour(_))));

    let id = marking
        .add_filler(vertices, vec![None, Some(guide)], style)
        .expect("Fuellung erwartet");
    let filler = marking.filler(id).expect("Fuellung gespeichert");
    assert_eq!(filler.contour.as_ref().map(|c| c.parts.len()), Some(3));
    assert!(!filler.primitives.is_empty());
    assert_eq!(marking.get_dependences(guide).fillers, vec![id]);

    marking.remove_line(guide).expect("Entfernen erwartet");
    assert_eq!(marking.filler(id).map(|f| f.guides[1]), Some(None));
    assert!(marking.filler(id).is_some_and(|f| f.contour.is_some()));
}

#[test]
fn test_point_dependences() {
    let mut marking = two_entrances();
    let point = PointId::entrance(1, 1);
    let line = marking
        .add_regular_line(point, PointId::entrance(2, 2), solid())
        .expect("Linie erwartet");
    let dependences = marking.get_point_dependences(point);
    assert_eq!(dependences.lines, vec![line]);
    assert!(marking.get_point_dependences(PointId::entrance(1, 3)).is_empty());
}

#[test]
fn test_update_entrance_moves_points() {
    let mut marking = two_entrances();
    let hash = marking
        .add_regular_line(PointId::entrance(1, 1), PointId::entrance(2, 2), solid())
        .expect("Linie erwartet");
    let stats = marking.update_entrance(
        1,
        EntranceGeometry::uniform(Vec3::new(0.0, 0.0, -1.0), Vec3::Z, 3, 5.0),
    );
    assert!(stats.points >= 1);
    let length = marking
        .line(hash)
        .and_then(|l| l.trajectory.as_ref())
        .map(|t| t.length())
        .unwrap_or_default();
    assert_relative_eq!(length, 6.0, epsilon = 1e-3);

    let same = marking.update_entrance(
        1,
        EntranceGeometry::uniform(Vec3::new(0.0, 0.0, -1.0), Vec3::Z, 3, 5.0),
    );
    assert!(same.is_empty(), "unveraenderte Geometrie loest nichts aus");
}

#[test]
fn test_render_reads_cache_only() {
    let mut marking = two_entrances();
    marking
        .add_regular_line(PointId::entrance(1, 1), PointId::entrance(2, 2), dashed())
        .expect("Linie erwartet");
    marking
        .add_crosswalk(crosswalk_point(1, 0), crosswalk_point(1, 1), zebra(2.0), None, None)
        .expect("Ueberweg erwartet");
    let stats_before = marking.last_stats();

    let mut primitives: Vec<MarkingPrimitive> = Vec::new();
    marking.render(Lod::Detailed, &mut primitives);
    assert!(primitives.len() > 5);
    assert_eq!(marking.last_stats(), stats_before);
}

#[test]
fn test_clear_keeps_entrances() {
    let mut marking = two_entrances();
    marking
        .add_regular_line(PointId::entrance(1, 1), PointId::entrance(2, 2), solid())
        .expect("Linie erwartet");
    marking.clear();
    assert!(marking.is_empty());
    assert_eq!(marking.point_count(), 0);
    assert_eq!(marking.entrances().count(), 2);
}

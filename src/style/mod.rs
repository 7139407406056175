//! Stil-Engine: geschlossene Menge von Stil-Arten mit einer Dispatch-Funktion.
//!
//! Jeder Stil ist ein Wert (kopierbare Vorlage) und berechnet aus Ziel-Geometrie,
//! Parametern und Detailstufe eine geordnete Liste von Render-Primitiven.

pub mod crosswalk;
pub mod dash;
pub mod filler;
pub mod line;
pub mod primitive;
pub mod scatter;

pub use crosswalk::{
    ChessBoardCrosswalkStyle, CrosswalkGeometry, DoubleZebraCrosswalkStyle, ExistentCrosswalkStyle,
    LadderCrosswalkStyle, ParallelLinesCrosswalkStyle, SolidCrosswalkStyle, ZebraCrosswalkStyle,
};
pub use filler::{
    ChevronFillerStyle, FillerContour, GridFillerStyle, PavementFillerStyle, SolidFillerStyle,
    StripeFillerStyle,
};
pub use line::{
    DashedLineStyle, DoubleDashedLineStyle, DoubleSolidLineStyle, PavementLineStyle,
    SharkTeethStyle, SolidAndDashedLineStyle, SolidLineStyle, ZigZagStyle,
};
pub use primitive::{
    Lod, LodMask, MarkingColor, MarkingDash, MarkingPolygon, MarkingPrimitive, MaterialType,
    NetworkPlacement, PrimitiveGroup, PropPlacement, TextPlacement,
};
pub use scatter::{FloatRange, NetworkStyle, ScatterStyle, TextStyle};

use crate::geometry::Trajectory;
use crate::shared::EngineOptions;
use crate::xml::XmlElement;
use anyhow::{bail, Context, Result};

/// Name des Stil-Elements im XML
pub const STYLE_ELEMENT: &str = "S";

/// Kleinste Strich- und Schrittlänge, die ein Dokument angeben darf (Meter).
pub const MIN_PATTERN_LENGTH: f32 = 0.01;
/// Obergrenze für Wiederholungen eines Musters entlang einer Kurve.
pub const MAX_PATTERN_COUNT: usize = 10_000;

/// Diskriminator einer Stil-Art (XML-Attribut `T`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StyleKind {
    Solid,
    Dashed,
    DoubleSolid,
    DoubleDashed,
    SolidAndDashed,
    SharkTeeth,
    ZigZag,
    Pavement,
    Prop,
    Tree,
    Text,
    Network,
    ExistentCrosswalk,
    ZebraCrosswalk,
    DoubleZebraCrosswalk,
    ParallelSolidLinesCrosswalk,
    ParallelDashedLinesCrosswalk,
    LadderCrosswalk,
    SolidCrosswalk,
    ChessBoardCrosswalk,
    StripeFiller,
    GridFiller,
    SolidFiller,
    ChevronFiller,
    PavementFiller,
}

impl StyleKind {
    pub const ALL: [StyleKind; 25] = [
        StyleKind::Solid,
        StyleKind::Dashed,
        StyleKind::DoubleSolid,
        StyleKind::DoubleDashed,
        StyleKind::SolidAndDashed,
        StyleKind::SharkTeeth,
        StyleKind::ZigZag,
        StyleKind::Pavement,
        StyleKind::Prop,
        StyleKind::Tree,
        StyleKind::Text,
        StyleKind::Network,
        StyleKind::ExistentCrosswalk,
        StyleKind::ZebraCrosswalk,
        StyleKind::DoubleZebraCrosswalk,
        StyleKind::ParallelSolidLinesCrosswalk,
        StyleKind::ParallelDashedLinesCrosswalk,
        StyleKind::LadderCrosswalk,
        StyleKind::SolidCrosswalk,
        StyleKind::ChessBoardCrosswalk,
        StyleKind::StripeFiller,
        StyleKind::GridFiller,
        StyleKind::SolidFiller,
        StyleKind::ChevronFiller,
        StyleKind::PavementFiller,
    ];

    pub fn code(self) -> u32 {
        match self {
            StyleKind::Solid => 1,
            StyleKind::Dashed => 2,
            StyleKind::DoubleSolid => 3,
            StyleKind::DoubleDashed => 4,
            StyleKind::SolidAndDashed => 5,
            StyleKind::SharkTeeth => 6,
            StyleKind::ZigZag => 7,
            StyleKind::Pavement => 8,
            StyleKind::Prop => 9,
            StyleKind::Tree => 10,
            StyleKind::Text => 11,
            StyleKind::Network => 12,
            StyleKind::ExistentCrosswalk => 100,
            StyleKind::ZebraCrosswalk => 101,
            StyleKind::DoubleZebraCrosswalk => 102,
            StyleKind::ParallelSolidLinesCrosswalk => 103,
            StyleKind::ParallelDashedLinesCrosswalk => 104,
            StyleKind::LadderCrosswalk => 105,
            StyleKind::SolidCrosswalk => 106,
            StyleKind::ChessBoardCrosswalk => 107,
            StyleKind::StripeFiller => 200,
            StyleKind::GridFiller => 201,
            StyleKind::SolidFiller => 202,
            StyleKind::ChevronFiller => 203,
            StyleKind::PavementFiller => 204,
        }
    }

    pub fn from_code(code: u32) -> Option<StyleKind> {
        Self::ALL.into_iter().find(|kind| kind.code() == code)
    }

    /// Props, Bäume und Texte erscheinen nur im Nahbereich.
    pub fn lod_mask(self) -> LodMask {
        match self {
            StyleKind::Prop | StyleKind::Tree | StyleKind::Text => LodMask::DETAILED,
            _ => LodMask::ALL,
        }
    }
}

/// Gruppe zulässiger Stil-Arten für eine Entity-Art
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleGroup {
    /// Reguläre, Normalen- und Spurlinien
    RegularLine,
    StopLine,
    Crosswalk,
    Filler,
}

impl StyleGroup {
    pub fn allows(self, kind: StyleKind) -> bool {
        use StyleKind::*;
        match self {
            StyleGroup::RegularLine => kind.code() < 100,
            StyleGroup::StopLine => matches!(
                kind,
                Solid | Dashed | DoubleSolid | DoubleDashed | SolidAndDashed | SharkTeeth | Pavement
            ),
            StyleGroup::Crosswalk => (100..200).contains(&kind.code()),
            StyleGroup::Filler => kind.code() >= 200,
        }
    }
}

/// Eingaben, die nicht zum Stil selbst gehören
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalculateContext {
    /// Seed für gestreute Objekte (aus Entity-Identität und Regel-Index)
    pub seed: u64,
    /// Radiant
    pub solid_max_angle: f32,
    pub solid_max_length: f32,
    pub prop_auto_step: f32,
    pub tree_auto_step: f32,
}

impl CalculateContext {
    pub fn from_options(options: &EngineOptions, seed: u64) -> Self {
        Self {
            seed,
            solid_max_angle: options.solid_max_angle.to_radians(),
            solid_max_length: options.solid_max_length,
            prop_auto_step: options.prop_auto_step,
            tree_auto_step: options.tree_auto_step,
        }
    }
}

impl Default for CalculateContext {
    fn default() -> Self {
        Self::from_options(&EngineOptions::default(), 0)
    }
}

/// Geometrie, auf die ein Stil angewendet wird
#[derive(Debug, Clone, Copy)]
pub enum StyleTarget<'a> {
    Line {
        trajectory: &'a Trajectory,
        borders: &'a [Trajectory],
    },
    Crosswalk(&'a CrosswalkGeometry),
    Filler(&'a FillerContour),
}

/// Stil mit den Parametern seiner Art
#[derive(Debug, Clone, PartialEq)]
pub enum Style {
    Solid(SolidLineStyle),
    Dashed(DashedLineStyle),
    DoubleSolid(DoubleSolidLineStyle),
    DoubleDashed(DoubleDashedLineStyle),
    SolidAndDashed(SolidAndDashedLineStyle),
    SharkTeeth(SharkTeethStyle),
    ZigZag(ZigZagStyle),
    Pavement(PavementLineStyle),
    Prop(ScatterStyle),
    Tree(ScatterStyle),
    Text(TextStyle),
    Network(NetworkStyle),
    ExistentCrosswalk(ExistentCrosswalkStyle),
    ZebraCrosswalk(ZebraCrosswalkStyle),
    DoubleZebraCrosswalk(DoubleZebraCrosswalkStyle),
    ParallelSolidLinesCrosswalk(ParallelLinesCrosswalkStyle),
    ParallelDashedLinesCrosswalk(ParallelLinesCrosswalkStyle),
    LadderCrosswalk(LadderCrosswalkStyle),
    SolidCrosswalk(SolidCrosswalkStyle),
    ChessBoardCrosswalk(ChessBoardCrosswalkStyle),
    StripeFiller(StripeFillerStyle),
    GridFiller(GridFillerStyle),
    SolidFiller(SolidFillerStyle),
    ChevronFiller(ChevronFillerStyle),
    PavementFiller(PavementFillerStyle),
}

impl Style {
    pub fn kind(&self) -> StyleKind {
        match self {
            Style::Solid(_) => StyleKind::Solid,
            Style::Dashed(_) => StyleKind::Dashed,
            Style::DoubleSolid(_) => StyleKind::DoubleSolid,
            Style::DoubleDashed(_) => StyleKind::DoubleDashed,
            Style::SolidAndDashed(_) => StyleKind::SolidAndDashed,
            Style::SharkTeeth(_) => StyleKind::SharkTeeth,
            Style::ZigZag(_) => StyleKind::ZigZag,
            Style::Pavement(_) => StyleKind::Pavement,
            Style::Prop(_) => StyleKind::Prop,
            Style::Tree(_) => StyleKind::Tree,
            Style::Text(_) => StyleKind::Text,
            Style::Network(_) => StyleKind::Network,
            Style::ExistentCrosswalk(_) => StyleKind::ExistentCrosswalk,
            Style::ZebraCrosswalk(_) => StyleKind::ZebraCrosswalk,
            Style::DoubleZebraCrosswalk(_) => StyleKind::DoubleZebraCrosswalk,
            Style::ParallelSolidLinesCrosswalk(_) => StyleKind::ParallelSolidLinesCrosswalk,
            Style::ParallelDashedLinesCrosswalk(_) => StyleKind::ParallelDashedLinesCrosswalk,
            Style::LadderCrosswalk(_) => StyleKind::LadderCrosswalk,
            Style::SolidCrosswalk(_) => StyleKind::SolidCrosswalk,
            Style::ChessBoardCrosswalk(_) => StyleKind::ChessBoardCrosswalk,
            Style::StripeFiller(_) => StyleKind::StripeFiller,
            Style::GridFiller(_) => StyleKind::GridFiller,
            Style::SolidFiller(_) => StyleKind::SolidFiller,
            Style::ChevronFiller(_) => StyleKind::ChevronFiller,
            Style::PavementFiller(_) => StyleKind::PavementFiller,
        }
    }

    pub fn lod_mask(&self) -> LodMask {
        self.kind().lod_mask()
    }

    /// Gesamtbreite eines Überweg-Stils quer zur Fahrbahn.
    pub fn total_width(&self) -> Option<f32> {
        match self {
            Style::ExistentCrosswalk(s) => Some(s.total_width()),
            Style::ZebraCrosswalk(s) => Some(s.total_width()),
            Style::DoubleZebraCrosswalk(s) => Some(s.total_width()),
            Style::ParallelSolidLinesCrosswalk(s) | Style::ParallelDashedLinesCrosswalk(s) => {
                Some(s.total_width())
            }
            Style::LadderCrosswalk(s) => Some(s.total_width()),
            Style::SolidCrosswalk(s) => Some(s.total_width()),
            Style::ChessBoardCrosswalk(s) => Some(s.total_width()),
            _ => None,
        }
    }

    /// Berechnet die Primitive für eine Detailstufe.
    ///
    /// Leer, wenn die Detailstufe nicht unterstützt wird oder das Ziel nicht zur Art passt.
    pub fn calculate(&self, target: StyleTarget<'_>, lod: Lod, ctx: &CalculateContext) -> Vec<MarkingPrimitive> {
        if !self.lod_mask().contains(lod) {
            return Vec::new();
        }
        match (self, target) {
            (Style::Solid(s), StyleTarget::Line { trajectory, borders }) => {
                s.calculate(trajectory, borders, ctx)
            }
            (Style::Dashed(s), StyleTarget::Line { trajectory, borders }) => {
                s.calculate(trajectory, borders)
            }
            (Style::DoubleSolid(s), StyleTarget::Line { trajectory, borders }) => {
                s.calculate(trajectory, borders, ctx)
            }
            (Style::DoubleDashed(s), StyleTarget::Line { trajectory, borders }) => {
                s.calculate(trajectory, borders)
            }
            (Style::SolidAndDashed(s), StyleTarget::Line { trajectory, borders }) => {
                s.calculate(trajectory, borders, ctx)
            }
            (Style::SharkTeeth(s), StyleTarget::Line { trajectory, borders }) => {
                s.calculate(trajectory, borders)
            }
            (Style::ZigZag(s), StyleTarget::Line { trajectory, borders }) => {
                s.calculate(trajectory, borders)
            }
            (Style::Pavement(s), StyleTarget::Line { trajectory, borders }) => {
                s.calculate(trajectory, borders, ctx)
            }
            (Style::Prop(s), StyleTarget::Line { trajectory, .. }) => {
                s.calculate(trajectory, ctx.prop_auto_step, ctx)
            }
            (Style::Tree(s), StyleTarget::Line { trajectory, .. }) => {
                s.calculate(trajectory, ctx.tree_auto_step, ctx)
            }
            (Style::Text(s), StyleTarget::Line { trajectory, .. }) => s.calculate(trajectory),
            (Style::Network(s), StyleTarget::Line { trajectory, .. }) => s.calculate(trajectory),

            (Style::ExistentCrosswalk(_), StyleTarget::Crosswalk(_)) => Vec::new(),
            (Style::ZebraCrosswalk(s), StyleTarget::Crosswalk(geometry)) => s.calculate(geometry),
            (Style::DoubleZebraCrosswalk(s), StyleTarget::Crosswalk(geometry)) => {
                s.calculate(geometry)
            }
            (
                Style::ParallelSolidLinesCrosswalk(s) | Style::ParallelDashedLinesCrosswalk(s),
                StyleTarget::Crosswalk(geometry),
            ) => s.calculate(geometry, ctx),
            (Style::LadderCrosswalk(s), StyleTarget::Crosswalk(geometry)) => {
                s.calculate(geometry, ctx)
            }
            (Style::SolidCrosswalk(s), StyleTarget::Crosswalk(geometry)) => s.calculate(geometry),
            (Style::ChessBoardCrosswalk(s), StyleTarget::Crosswalk(geometry)) => {
                s.calculate(geometry)
            }

            (Style::StripeFiller(s), StyleTarget::Filler(contour)) => s.calculate(contour, ctx),
            (Style::GridFiller(s), StyleTarget::Filler(contour)) => s.calculate(contour, ctx),
            (Style::SolidFiller(s), StyleTarget::Filler(contour)) => s.calculate(contour, ctx),
            (Style::ChevronFiller(s), StyleTarget::Filler(contour)) => s.calculate(contour, ctx),
            (Style::PavementFiller(s), StyleTarget::Filler(contour)) => s.calculate(contour, ctx),

            (style, _) => {
                log::debug!("Stil {:?} passt nicht zum Ziel, keine Primitive", style.kind());
                Vec::new()
            }
        }
    }

    /// Standard-Stil einer Art mit Werten aus den Optionen.
    pub fn default_for(kind: StyleKind, options: &EngineOptions) -> Style {
        let color = options.line_color;
        let width = options.line_width;
        match kind {
            StyleKind::Solid => Style::Solid(SolidLineStyle { color, width }),
            StyleKind::Dashed => Style::Dashed(DashedLineStyle {
                color,
                width,
                dash_length: options.dash_length,
                space_length: options.space_length,
            }),
            StyleKind::DoubleSolid => Style::DoubleSolid(DoubleSolidLineStyle {
                color,
                second_color: color,
                width,
                offset: options.double_offset,
            }),
            StyleKind::DoubleDashed => Style::DoubleDashed(DoubleDashedLineStyle {
                color,
                second_color: color,
                width,
                offset: options.double_offset,
                dash_length: options.dash_length,
                space_length: options.space_length,
            }),
            StyleKind::SolidAndDashed => Style::SolidAndDashed(SolidAndDashedLineStyle {
                color,
                second_color: color,
                width,
                offset: options.double_offset,
                dash_length: options.dash_length,
                space_length: options.space_length,
                invert: false,
            }),
            StyleKind::SharkTeeth => Style::SharkTeeth(SharkTeethStyle {
                color,
                base: options.shark_teeth_base,
                height: options.shark_teeth_height,
                space: options.shark_teeth_space,
                invert: false,
            }),
            StyleKind::ZigZag => Style::ZigZag(ZigZagStyle {
                color,
                width,
                step: options.zigzag_step,
                offset: options.zigzag_offset,
                invert: false,
            }),
            StyleKind::Pavement => Style::Pavement(PavementLineStyle {
                width: options.pavement_width,
                elevation: options.pavement_elevation,
            }),
            StyleKind::Prop => Style::Prop(ScatterStyle::new("")),
            StyleKind::Tree => Style::Tree(ScatterStyle::new("")),
            StyleKind::Text => Style::Text(TextStyle {
                color,
                ..TextStyle::new("")
            }),
            StyleKind::Network => Style::Network(NetworkStyle {
                repeat_distance: options.network_repeat_distance,
                ..NetworkStyle::new("")
            }),
            StyleKind::ExistentCrosswalk => Style::ExistentCrosswalk(ExistentCrosswalkStyle {
                width: options.crosswalk_width,
            }),
            StyleKind::ZebraCrosswalk => Style::ZebraCrosswalk(ZebraCrosswalkStyle {
                color,
                width: options.crosswalk_width,
                dash_length: options.crosswalk_dash_length,
                space_length: options.crosswalk_space_length,
                offset_before: 0.0,
                offset_after: 0.0,
            }),
            StyleKind::DoubleZebraCrosswalk => {
                Style::DoubleZebraCrosswalk(DoubleZebraCrosswalkStyle {
                    color,
                    second_color: color,
                    width: options.crosswalk_width,
                    dash_length: options.crosswalk_dash_length,
                    space_length: options.crosswalk_space_length,
                    offset_before: 0.0,
                    offset_after: 0.0,
                    offset_between: options.crosswalk_space_length,
                })
            }
            StyleKind::ParallelSolidLinesCrosswalk | StyleKind::ParallelDashedLinesCrosswalk => {
                let style = ParallelLinesCrosswalkStyle {
                    color,
                    second_color: color,
                    width: options.crosswalk_width,
                    line_width: options.crosswalk_line_width,
                    offset_before: 0.0,
                    offset_after: 0.0,
                    dashes: None,
                };
                if kind == StyleKind::ParallelSolidLinesCrosswalk {
                    Style::ParallelSolidLinesCrosswalk(style)
                } else {
                    Style::ParallelDashedLinesCrosswalk(ParallelLinesCrosswalkStyle {
                        dashes: Some((options.dash_length, options.space_length)),
                        ..style
                    })
                }
            }
            StyleKind::LadderCrosswalk => Style::LadderCrosswalk(LadderCrosswalkStyle {
                color,
                width: options.crosswalk_width,
                dash_length: options.crosswalk_dash_length,
                space_length: options.crosswalk_space_length,
                line_width: options.crosswalk_line_width,
                offset_before: 0.0,
                offset_after: 0.0,
            }),
            StyleKind::SolidCrosswalk => Style::SolidCrosswalk(SolidCrosswalkStyle {
                color,
                width: options.crosswalk_width,
                offset_before: 0.0,
                offset_after: 0.0,
            }),
            StyleKind::ChessBoardCrosswalk => Style::ChessBoardCrosswalk(ChessBoardCrosswalkStyle {
                color,
                square_side: options.crosswalk_width * 0.5,
                line_count: 2,
                offset_before: 0.0,
                offset_after: 0.0,
                invert: false,
            }),
            StyleKind::StripeFiller => Style::StripeFiller(StripeFillerStyle {
                color,
                width,
                step: options.filler_step,
                angle: options.filler_angle,
                offset: 0.0,
            }),
            StyleKind::GridFiller => Style::GridFiller(GridFillerStyle {
                color,
                width,
                step: options.filler_step,
                angle: options.filler_angle,
                offset: 0.0,
            }),
            StyleKind::SolidFiller => Style::SolidFiller(SolidFillerStyle { color, offset: 0.0 }),
            StyleKind::ChevronFiller => Style::ChevronFiller(ChevronFillerStyle {
                color,
                width,
                step: options.filler_step,
                angle: options.filler_angle,
                offset: 0.0,
                invert: false,
            }),
            StyleKind::PavementFiller => Style::PavementFiller(PavementFillerStyle {
                elevation: options.pavement_elevation,
                offset: 0.0,
            }),
        }
    }

    /// `<S T="..." .../>` mit den Parametern der Art.
    pub fn to_xml(&self) -> XmlElement {
        let mut element = XmlElement::new(STYLE_ELEMENT);
        element.set_attr("T", self.kind().code());
        match self {
            Style::Solid(s) => s.write_xml(&mut element),
            Style::Dashed(s) => s.write_xml(&mut element),
            Style::DoubleSolid(s) => s.write_xml(&mut element),
            Style::DoubleDashed(s) => s.write_xml(&mut element),
            Style::SolidAndDashed(s) => s.write_xml(&mut element),
            Style::SharkTeeth(s) => s.write_xml(&mut element),
            Style::ZigZag(s) => s.write_xml(&mut element),
            Style::Pavement(s) => s.write_xml(&mut element),
            Style::Prop(s) | Style::Tree(s) => s.write_xml(&mut element),
            Style::Text(s) => s.write_xml(&mut element),
            Style::Network(s) => s.write_xml(&mut element),
            Style::ExistentCrosswalk(s) => s.write_xml(&mut element),
            Style::ZebraCrosswalk(s) => s.write_xml(&mut element),
            Style::DoubleZebraCrosswalk(s) => s.write_xml(&mut element),
            Style::ParallelSolidLinesCrosswalk(s) | Style::ParallelDashedLinesCrosswalk(s) => {
                s.write_xml(&mut element)
            }
            Style::LadderCrosswalk(s) => s.write_xml(&mut element),
            Style::SolidCrosswalk(s) => s.write_xml(&mut element),
            Style::ChessBoardCrosswalk(s) => s.write_xml(&mut element),
            Style::StripeFiller(s) => s.write_xml(&mut element),
            Style::GridFiller(s) => s.write_xml(&mut element),
            Style::SolidFiller(s) => s.write_xml(&mut element),
            Style::ChevronFiller(s) => s.write_xml(&mut element),
            Style::PavementFiller(s) => s.write_xml(&mut element),
        }
        element
    }

    /// Liest zuerst den Diskriminator, dann die Felder der Art.
    pub fn from_xml(element: &XmlElement, version: u32) -> Result<Style> {
        let code: u32 = element.required("T")?;
        let kind = StyleKind::from_code(code)
            .with_context(|| format!("Unbekannte Stil-Art T={}", code))?;
        let style = match kind {
            StyleKind::Solid => Style::Solid(SolidLineStyle::read_xml(element, version)?),
            StyleKind::Dashed => Style::Dashed(DashedLineStyle::read_xml(element, version)?),
            StyleKind::DoubleSolid => {
                Style::DoubleSolid(DoubleSolidLineStyle::read_xml(element, version)?)
            }
            StyleKind::DoubleDashed => {
                Style::DoubleDashed(DoubleDashedLineStyle::read_xml(element, version)?)
            }
            StyleKind::SolidAndDashed => {
                Style::SolidAndDashed(SolidAndDashedLineStyle::read_xml(element, version)?)
            }
            StyleKind::SharkTeeth => Style::SharkTeeth(SharkTeethStyle::read_xml(element, version)?),
            StyleKind::ZigZag => Style::ZigZag(ZigZagStyle::read_xml(element, version)?),
            StyleKind::Pavement => Style::Pavement(PavementLineStyle::read_xml(element, version)?),
            StyleKind::Prop => Style::Prop(ScatterStyle::read_xml(element, version)?),
            StyleKind::Tree => Style::Tree(ScatterStyle::read_xml(element, version)?),
            StyleKind::Text => Style::Text(TextStyle::read_xml(element, version)?),
            StyleKind::Network => Style::Network(NetworkStyle::read_xml(element, version)?),
            StyleKind::ExistentCrosswalk => {
                Style::ExistentCrosswalk(ExistentCrosswalkStyle::read_xml(element, version)?)
            }
            StyleKind::ZebraCrosswalk => {
                Style::ZebraCrosswalk(ZebraCrosswalkStyle::read_xml(element, version)?)
            }
            StyleKind::DoubleZebraCrosswalk => {
                Style::DoubleZebraCrosswalk(DoubleZebraCrosswalkStyle::read_xml(element, version)?)
            }
            StyleKind::ParallelSolidLinesCrosswalk => Style::ParallelSolidLinesCrosswalk(
                ParallelLinesCrosswalkStyle::read_xml(element, version, false)?,
            ),
            StyleKind::ParallelDashedLinesCrosswalk => Style::ParallelDashedLinesCrosswalk(
                ParallelLinesCrosswalkStyle::read_xml(element, version, true)?,
            ),
            StyleKind::LadderCrosswalk => {
                Style::LadderCrosswalk(LadderCrosswalkStyle::read_xml(element, version)?)
            }
            StyleKind::SolidCrosswalk => {
                Style::SolidCrosswalk(SolidCrosswalkStyle::read_xml(element, version)?)
            }
            StyleKind::ChessBoardCrosswalk => {
                Style::ChessBoardCrosswalk(ChessBoardCrosswalkStyle::read_xml(element, version)?)
            }
            StyleKind::StripeFiller => {
                Style::StripeFiller(StripeFillerStyle::read_xml(element, version)?)
            }
            StyleKind::GridFiller => Style::GridFiller(GridFillerStyle::read_xml(element, version)?),
            StyleKind::SolidFiller => {
                Style::SolidFiller(SolidFillerStyle::read_xml(element, version)?)
            }
            StyleKind::ChevronFiller => {
                Style::ChevronFiller(ChevronFillerStyle::read_xml(element, version)?)
            }
            StyleKind::PavementFiller => {
                Style::PavementFiller(PavementFillerStyle::read_xml(element, version)?)
            }
        };
        Ok(style)
    }
}

/// Farbe lesen; Schema-Version 1 speichert gepackte RGBA-Ganzzahlen.
pub(crate) fn read_color(
    element: &XmlElement,
    key: &str,
    version: u32,
    default: MarkingColor,
) -> Result<MarkingColor> {
    if version < 2 {
        return Ok(element
            .parse_attr::<u32>(key)?
            .map(MarkingColor::from_packed)
            .unwrap_or(default));
    }
    element.attr_or(key, default)
}

/// Flag als `0`/`1`.
pub(crate) fn read_flag(element: &XmlElement, key: &str) -> Result<bool> {
    Ok(element.attr_or::<u8>(key, 0)? != 0)
}

/// Musterlänge lesen; Werte unter `min` oder nicht endliche Werte sind Fehler.
pub(crate) fn read_pattern_length(element: &XmlElement, key: &str, default: f32, min: f32) -> Result<f32> {
    let value: f32 = element.attr_or(key, default)?;
    if !value.is_finite() || value < min {
        bail!(
            "Attribut {}={} in <{}> unter Minimum {}",
            key,
            value,
            element.name,
            min
        );
    }
    Ok(value)
}

/// Wiederholungen aus einem Quotienten, abgeschnitten auf [`MAX_PATTERN_COUNT`].
pub(crate) fn pattern_count(value: f32) -> usize {
    if value.is_finite() && value > 0.0 {
        (value as usize).min(MAX_PATTERN_COUNT)
    } else {
        0
    }
}

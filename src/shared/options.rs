//! Zentrale Konfiguration der Markierungs-Engine.
//!
//! `EngineOptions` enthält alle zur Laufzeit änderbaren Werte.
//! Die `const`-Werte bleiben als Fallback/Default erhalten.

use crate::style::MarkingColor;
use serde::{Deserialize, Serialize};

// ── Linien ──────────────────────────────────────────────────────────

/// Standard-Linienbreite (Meter).
pub const LINE_WIDTH: f32 = 0.15;
/// Standard-Strichlänge gestrichelter Linien.
pub const DASH_LENGTH: f32 = 1.5;
/// Standard-Lückenlänge gestrichelter Linien.
pub const SPACE_LENGTH: f32 = 1.5;
/// Abstand zwischen den Linien einer Doppellinie.
pub const DOUBLE_OFFSET: f32 = 0.15;
/// Breite von Haltelinien.
pub const STOP_LINE_WIDTH: f32 = 0.3;
/// Länge einer Normalen-Linie, wenn sie keine andere Einfahrt trifft.
pub const NORMAL_LINE_LENGTH: f32 = 10.0;

// ── Sonderlinien ────────────────────────────────────────────────────

/// Basis eines Haifischzahns.
pub const SHARK_TEETH_BASE: f32 = 0.5;
/// Höhe eines Haifischzahns.
pub const SHARK_TEETH_HEIGHT: f32 = 0.6;
/// Lücke zwischen Haifischzähnen.
pub const SHARK_TEETH_SPACE: f32 = 0.2;
/// Schrittweite einer Zickzack-Linie.
pub const ZIGZAG_STEP: f32 = 2.0;
/// Auslenkung einer Zickzack-Linie.
pub const ZIGZAG_OFFSET: f32 = 0.6;
/// Höhe erhöhter Flächen (Bordstein).
pub const PAVEMENT_ELEVATION: f32 = 0.3;
/// Breite erhöhter Linien.
pub const PAVEMENT_WIDTH: f32 = 1.0;

// ── Fußgängerüberwege ──────────────────────────────────────────────

/// Breite eines Überwegs quer zur Fahrbahn.
pub const CROSSWALK_WIDTH: f32 = 2.0;
/// Balkenbreite eines Zebrastreifens.
pub const CROSSWALK_DASH_LENGTH: f32 = 0.4;
/// Lücke zwischen Zebra-Balken.
pub const CROSSWALK_SPACE_LENGTH: f32 = 0.6;
/// Linienbreite paralleler Überweg-Linien.
pub const CROSSWALK_LINE_WIDTH: f32 = 0.15;

// ── Füllungen ───────────────────────────────────────────────────────

/// Streifenabstand von Füllungen.
pub const FILLER_STEP: f32 = 1.0;
/// Streifenwinkel von Füllungen (Grad).
pub const FILLER_ANGLE: f32 = 45.0;

// ── Berechnung ──────────────────────────────────────────────────────

/// Maximale Richtungsänderung eines durchgezogenen Teilstücks (Grad).
pub const SOLID_MAX_ANGLE: f32 = 5.0;
/// Maximale Länge eines durchgezogenen Teilstücks.
pub const SOLID_MAX_LENGTH: f32 = 10.0;
/// Automatischer Abstand gestreuter Props (bei Skalierung 1).
pub const PROP_AUTO_STEP: f32 = 5.0;
/// Automatischer Abstand gestreuter Bäume (bei Skalierung 1).
pub const TREE_AUTO_STEP: f32 = 10.0;
/// Wiederholungsabstand von Netz-Segmenten.
pub const NETWORK_REPEAT_DISTANCE: f32 = 64.0;

/// Alle zur Laufzeit änderbaren Engine-Optionen.
/// Wird als `markup_engine.toml` neben der Binary gespeichert.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineOptions {
    // ── Linien ──────────────────────────────────────────────────
    /// Standard-Farbe neuer Stile
    pub line_color: MarkingColor,
    /// Linienbreite in Metern
    pub line_width: f32,
    /// Strichlänge gestrichelter Linien
    pub dash_length: f32,
    /// Lückenlänge gestrichelter Linien
    pub space_length: f32,
    /// Abstand der Doppellinien
    pub double_offset: f32,
    /// Breite von Haltelinien
    pub stop_line_width: f32,
    /// Länge einer Normalen-Linie ohne Gegen-Einfahrt
    pub normal_line_length: f32,

    // ── Sonderlinien ─────────────────────────────────────────────
    pub shark_teeth_base: f32,
    pub shark_teeth_height: f32,
    pub shark_teeth_space: f32,
    pub zigzag_step: f32,
    pub zigzag_offset: f32,
    pub pavement_elevation: f32,
    pub pavement_width: f32,

    // ── Überwege ─────────────────────────────────────────────────
    pub crosswalk_width: f32,
    pub crosswalk_dash_length: f32,
    pub crosswalk_space_length: f32,
    pub crosswalk_line_width: f32,

    // ── Füllungen ────────────────────────────────────────────────
    pub filler_step: f32,
    /// Streifenwinkel in Grad
    pub filler_angle: f32,

    // ── Berechnung ───────────────────────────────────────────────
    /// Maximale Richtungsänderung pro durchgezogenem Teilstück (Grad)
    pub solid_max_angle: f32,
    /// Maximale Länge pro durchgezogenem Teilstück
    pub solid_max_length: f32,
    /// Automatischer Prop-Abstand, wenn kein Schritt gesetzt ist
    pub prop_auto_step: f32,
    /// Automatischer Baum-Abstand, wenn kein Schritt gesetzt ist
    pub tree_auto_step: f32,
    /// Wiederholungsabstand neuer Netz-Stile
    #[serde(default = "default_network_repeat_distance")]
    pub network_repeat_distance: f32,
    /// Versatz, auf den `reset_point_offsets` alle Punkte setzt
    #[serde(default)]
    pub default_point_offset: f32,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            line_color: MarkingColor::WHITE,
            line_width: LINE_WIDTH,
            dash_length: DASH_LENGTH,
            space_length: SPACE_LENGTH,
            double_offset: DOUBLE_OFFSET,
            stop_line_width: STOP_LINE_WIDTH,
            normal_line_length: NORMAL_LINE_LENGTH,

            shark_teeth_base: SHARK_TEETH_BASE,
            shark_teeth_height: SHARK_TEETH_HEIGHT,
            shark_teeth_space: SHARK_TEETH_SPACE,
            zigzag_step: ZIGZAG_STEP,
            zigzag_offset: ZIGZAG_OFFSET,
            pavement_elevation: PAVEMENT_ELEVATION,
            pavement_width: PAVEMENT_WIDTH,

            crosswalk_width: CROSSWALK_WIDTH,
            crosswalk_dash_length: CROSSWALK_DASH_LENGTH,
            crosswalk_space_length: CROSSWALK_SPACE_LENGTH,
            crosswalk_line_width: CROSSWALK_LINE_WIDTH,

            filler_step: FILLER_STEP,
            filler_angle: FILLER_ANGLE,

            solid_max_angle: SOLID_MAX_ANGLE,
            solid_max_length: SOLID_MAX_LENGTH,
            prop_auto_step: PROP_AUTO_STEP,
            tree_auto_step: TREE_AUTO_STEP,
            network_repeat_distance: NETWORK_REPEAT_DISTANCE,
            default_point_offset: 0.0,
        }
    }
}

/// Serde-Default für `network_repeat_distance` (Abwärtskompatibilität).
fn default_network_repeat_distance() -> f32 {
    NETWORK_REPEAT_DISTANCE
}

impl EngineOptions {
    /// Lädt Optionen aus einer TOML-Datei. Bei Fehler: Standardwerte.
    pub fn load_from_file(path: &std::path::Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(opts) => {
                    log::info!("Optionen geladen aus: {}", path.display());
                    opts
                }
                Err(e) => {
                    log::warn!("Optionen-Datei fehlerhaft, verwende Standardwerte: {}", e);
                    Self::default()
                }
            },
            Err(_) => {
                log::info!("Keine Optionen-Datei gefunden, verwende Standardwerte");
                Self::default()
            }
        }
    }

    /// Speichert Optionen als TOML-Datei.
    pub fn save_to_file(&self, path: &std::path::Path) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        log::info!("Optionen gespeichert nach: {}", path.display());
        Ok(())
    }

    /// Ermittelt den Pfad zur Optionen-Datei neben der Binary.
    pub fn config_path() -> std::path::PathBuf {
        std::env::current_exe()
            .unwrap_or_else(|_| std::path::PathBuf::from("markup_engine"))
            .parent()
            .unwrap_or_else(|| std::path::Path::new("."))
            .join("markup_engine.toml")
    }
}

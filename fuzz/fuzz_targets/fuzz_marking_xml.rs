#![no_main]

use libfuzzer_sys::fuzz_target;
use markup_engine::{parse_marking_document, write_marking_document, EngineOptions};

fuzz_target!(|data: &[u8]| {
    let Ok(xml) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok((marking, _)) = parse_marking_document(xml, EngineOptions::default()) {
        // Eigene Ausgabe muss wieder lesbar sein
        let written = write_marking_document(&marking);
        let _ = parse_marking_document(&written, EngineOptions::default());
    }
});

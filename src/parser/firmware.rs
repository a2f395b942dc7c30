//! Firmware dialect parser for Arduino-style sketches.
//!
//! No grammar is available for this dialect; a heuristic line scanner
//! recognizes the two fixed entry points (`void setup()` / `void loop()`)
//! and generic `void <name>(...)` declarations, recording the line number of
//! each match. Declarations spanning multiple lines are not recognized; that
//! is a documented limitation of the scanner, not something to paper over.

use super::{Dialect, FileStructure, FunctionInfo, ParseError, StructuralParser};

/// Firmware dialect parser.
pub struct FirmwareParser;

impl StructuralParser for FirmwareParser {
    fn dialect(&self) -> Dialect {
        Dialect::Firmware
    }

    fn parse(&self, rel_path: &str, source: &str) -> Result<FileStructure, ParseError> {
        let mut structure = FileStructure::new(rel_path, Dialect::Firmware);

        for (idx, raw) in source.lines().enumerate() {
            let line = raw.trim();
            let lineno = idx + 1;

            if line.starts_with("void setup()") {
                structure
                    .functions
                    .insert("setup".to_string(), FunctionInfo { line: lineno });
            } else if line.starts_with("void loop()") {
                structure
                    .functions
                    .insert("loop".to_string(), FunctionInfo { line: lineno });
            } else if let Some(rest) = line.strip_prefix("void ") {
                if !line.contains('(') || !line.contains(')') {
                    continue;
                }
                let name = rest.split('(').next().unwrap_or("").trim();
                if !name.is_empty() && name != "setup" && name != "loop" {
                    structure
                        .functions
                        .insert(name.to_string(), FunctionInfo { line: lineno });
                }
            }
        }

        Ok(structure)
    }
}

/// Create a new Firmware parser.
pub fn new_parser() -> Box<dyn StructuralParser> {
    Box::new(FirmwareParser)
}

/// Register the Firmware parser for the .ino extension.
pub fn register() {
    super::register("ino", new_parser);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_points_and_custom_functions() {
        let source = r#"void setup() {
  pinMode(13, OUTPUT);
}

void loop() {
  blinkOnce();
}

void blinkOnce() {
  digitalWrite(13, HIGH);
}
"#;
        let structure = FirmwareParser.parse("blink.ino", source).unwrap();

        assert_eq!(structure.dialect, Dialect::Firmware);
        assert_eq!(structure.functions["setup"].line, 1);
        assert_eq!(structure.functions["loop"].line, 5);
        assert_eq!(structure.functions["blinkOnce"].line, 9);
        assert!(structure.classes.is_empty());
        assert!(structure.imports.is_empty());
    }

    #[test]
    fn test_multiline_declaration_not_recognized() {
        let source = "void longName(\n    int arg) {\n}\n";
        let structure = FirmwareParser.parse("multi.ino", source).unwrap();
        // The opening line has no closing paren, so the scanner skips it.
        assert!(structure.functions.is_empty());
    }

    #[test]
    fn test_indented_declaration_still_found() {
        let source = "  void helper(int x) {\n  }\n";
        let structure = FirmwareParser.parse("helper.ino", source).unwrap();
        assert_eq!(structure.functions["helper"].line, 1);
    }

    #[test]
    fn test_never_fails() {
        assert!(FirmwareParser.parse("noise.ino", "@@ not C at all {{{").is_ok());
    }
}

//! Line-matching rules for netlog lines.
//!
//! Rules run in a fixed order and the first one that matches consumes
//! the line:
//!
//! 1. system entry -- `System:<id>(<name>`
//! 2. docking start -- `Dock Permission Received on`
//! 3. commander identity -- a colon-delimited `FindBestIsland` line
//!
//! Lines that begin with `<` are XML fragments dumped by the client and
//! never match anything. A line that carries a rule's marker but fails
//! its structural check falls through to the next rule.

use regex::Regex;

/// Lines starting with this character are markup noise.
pub const MARKUP_DELIMITER: char = '<';

const SYSTEM_MARKER: &str = "System:";
const SYSTEM_PATTERN: &str = r"System:(\d+)\(([^)]+)";
const DOCKING_MARKER: &str = "Dock Permission Received on";
const COMMANDER_MARKER: &str = "FindBestIsland";

/// Colon-separated field holding the commander name. The `{hh:mm:ss}`
/// timestamp prefix accounts for the first three fields.
const COMMANDER_FIELD: usize = 3;
const COMMANDER_MIN_FIELDS: usize = 5;

/// The rule that consumed a line, with whatever it extracted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineMatch {
    /// A star-system line with the client's numeric id and the name.
    System {
        /// Client-side system id.
        id: i64,
        /// System display name.
        name: String,
    },
    /// Docking permission was granted.
    DockingStarted,
    /// The commander's display name.
    Commander {
        /// Commander display name.
        name: String,
    },
}

/// Compiled rule set.
#[derive(Debug, Clone)]
pub struct LineRules {
    system: Regex,
}

impl LineRules {
    /// Compile the rule patterns.
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            system: Regex::new(SYSTEM_PATTERN)?,
        })
    }

    /// Run `line` through the rules and return the first match.
    pub fn classify(&self, line: &str) -> Option<LineMatch> {
        if line.starts_with(MARKUP_DELIMITER) {
            return None;
        }
        self.match_system(line)
            .or_else(|| match_docking(line))
            .or_else(|| match_commander(line))
    }

    fn match_system(&self, line: &str) -> Option<LineMatch> {
        if !line.contains(SYSTEM_MARKER) {
            return None;
        }
        let caps = self.system.captures(line)?;
        let id = caps.get(1)?.as_str().parse::<i64>().ok()?;
        let name = caps.get(2)?.as_str().to_owned();
        Some(LineMatch::System { id, name })
    }
}

fn match_docking(line: &str) -> Option<LineMatch> {
    line.contains(DOCKING_MARKER)
        .then_some(LineMatch::DockingStarted)
}

fn match_commander(line: &str) -> Option<LineMatch> {
    if !line.contains(COMMANDER_MARKER) {
        return None;
    }
    let fields: Vec<&str> = line.split(':').collect();
    if fields.len() < COMMANDER_MIN_FIELDS {
        return None;
    }
    let name = fields.get(COMMANDER_FIELD)?;
    Some(LineMatch::Commander {
        name: (*name).to_owned(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn rules() -> LineRules {
        LineRules::new().unwrap()
    }

    #[test]
    fn system_line_extracts_id_and_name() {
        let line = "{21:28:17} System:29(Shinrarta Dezhra) Body:1 Pos:(-25.3,11.2,40.1) Supercruise";
        assert_eq!(
            rules().classify(line),
            Some(LineMatch::System {
                id: 29,
                name: String::from("Shinrarta Dezhra"),
            })
        );
    }

    #[test]
    fn docking_line_matches() {
        let line = "{20:12:09} Dock Permission Received on channel 7 for station Jameson Memorial";
        assert_eq!(rules().classify(line), Some(LineMatch::DockingStarted));
    }

    #[test]
    fn commander_name_comes_from_fourth_field() {
        let line = "{18:48:51} FindBestIsland:Jameson:0:3:Sol";
        assert_eq!(
            rules().classify(line),
            Some(LineMatch::Commander {
                name: String::from("Jameson"),
            })
        );
    }

    #[test]
    fn short_commander_line_is_ignored() {
        assert_eq!(rules().classify("{18:48:51} FindBestIsland:Jameson"), None);
    }

    #[test]
    fn markup_lines_never_match() {
        assert_eq!(rules().classify("<data>System:29(Shinrarta Dezhra)</data>"), None);
    }

    #[test]
    fn system_marker_without_pattern_falls_through() {
        let line = "{20:12:09} System: unknown Dock Permission Received on channel 2";
        assert_eq!(rules().classify(line), Some(LineMatch::DockingStarted));
    }

    #[test]
    fn oversized_system_id_is_not_a_match() {
        let line = "{20:12:09} System:99999999999999999999999(Sol)";
        assert_eq!(rules().classify(line), None);
    }

    #[test]
    fn system_rule_wins_over_later_rules() {
        let line = "{20:12:09} System:5(Lave) FindBestIsland:Jameson:0:3";
        assert!(matches!(
            rules().classify(line),
            Some(LineMatch::System { id: 5, .. })
        ));
    }

    #[test]
    fn unrelated_line_is_ignored() {
        assert_eq!(rules().classify("{20:12:09} Socket connected"), None);
    }
}

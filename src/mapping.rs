// Source Mapping Table
//
// Side channel built during one emission pass: which output line came from
// which authored statement. Write-once - the emitter appends entries in
// output order, then hands the table to the caller. Lookups work both ways
// because optimization can make one source statement produce zero or many
// output lines.

use crate::ir::SourceLoc;
use indexmap::IndexMap;
use serde::Serialize;

pub const FORMAT_VERSION: u32 = 1;

/// One output-line-to-source association.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MappingEntry {
    pub output_line: u32,
    pub file: String,
    pub line: u32,
    pub column: u32,
    pub symbol: Option<String>,
    pub snippet: Option<String>,
}

/// Ordered mapping from output lines back to source locations.
#[derive(Debug, Clone, Default)]
pub struct MappingTable {
    game: String,
    output_name: String,
    entries: Vec<MappingEntry>,
    /// (file, line) -> output lines, in emission order.
    by_source: IndexMap<(String, u32), Vec<u32>>,
}

impl MappingTable {
    pub fn new(game: &str, output_name: &str) -> MappingTable {
        MappingTable {
            game: game.to_string(),
            output_name: output_name.to_string(),
            entries: Vec::new(),
            by_source: IndexMap::new(),
        }
    }

    /// Append an entry. Output lines only grow; the emitter calls this in
    /// line order.
    pub fn record(&mut self, output_line: u32, loc: &SourceLoc) {
        debug_assert!(
            self.entries
                .last()
                .map_or(true, |last| last.output_line <= output_line),
            "mapping entries must be recorded in output-line order"
        );
        self.entries.push(MappingEntry {
            output_line,
            file: loc.file.clone(),
            line: loc.line,
            column: loc.column,
            symbol: loc.symbol.clone(),
            snippet: loc.snippet.clone(),
        });
        self.by_source
            .entry((loc.file.clone(), loc.line))
            .or_default()
            .push(output_line);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[MappingEntry] {
        &self.entries
    }

    /// Source location that produced an output line, if any.
    pub fn lookup_output_line(&self, output_line: u32) -> Option<&MappingEntry> {
        self.entries
            .binary_search_by_key(&output_line, |e| e.output_line)
            .ok()
            .map(|idx| &self.entries[idx])
    }

    /// All output lines produced by one source line (possibly none or many).
    pub fn lookup_source(&self, file: &str, line: u32) -> &[u32] {
        self.by_source
            .get(&(file.to_string(), line))
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Serialize to the line-oriented key-value format downstream tooling
    /// reads. Deterministic: entry order is emission order.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("format-version: {}\n", FORMAT_VERSION));
        out.push_str(&format!("game: {}\n", escape(&self.game)));
        out.push_str(&format!("output: {}\n", escape(&self.output_name)));
        out.push_str(&format!("entries: {}\n", self.entries.len()));
        for (n, entry) in self.entries.iter().enumerate() {
            out.push_str(&format!("entry.{}.output-line: {}\n", n, entry.output_line));
            out.push_str(&format!("entry.{}.file: {}\n", n, escape(&entry.file)));
            out.push_str(&format!("entry.{}.line: {}\n", n, entry.line));
            out.push_str(&format!("entry.{}.column: {}\n", n, entry.column));
            if let Some(symbol) = &entry.symbol {
                out.push_str(&format!("entry.{}.symbol: {}\n", n, escape(symbol)));
            }
            if let Some(snippet) = &entry.snippet {
                out.push_str(&format!("entry.{}.snippet: {}\n", n, escape(snippet)));
            }
        }
        out
    }
}

/// Escape control characters so every field stays on its own line.
fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\x{:02x}", c as u32)),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(file: &str, line: u32, column: u32) -> SourceLoc {
        SourceLoc::new(file, line, column)
    }

    #[test]
    fn lookup_both_directions() {
        let mut table = MappingTable::new("demo", "demo.vcs");
        table.record(10, &loc("game.toml", 3, 1));
        table.record(11, &loc("game.toml", 3, 1));
        table.record(20, &loc("game.toml", 7, 5));

        assert_eq!(table.lookup_output_line(11).unwrap().line, 3);
        assert!(table.lookup_output_line(12).is_none());
        assert_eq!(table.lookup_source("game.toml", 3), &[10, 11]);
        assert_eq!(table.lookup_source("game.toml", 7), &[20]);
        assert!(table.lookup_source("game.toml", 99).is_empty());
    }

    #[test]
    fn text_format_carries_header_and_entries() {
        let mut table = MappingTable::new("demo", "demo.vcs");
        table.record(4, &loc("main.gm", 2, 1).with_symbol("player_x"));
        let text = table.to_text();
        assert!(text.starts_with("format-version: 1\n"));
        assert!(text.contains("game: demo\n"));
        assert!(text.contains("output: demo.vcs\n"));
        assert!(text.contains("entries: 1\n"));
        assert!(text.contains("entry.0.output-line: 4\n"));
        assert!(text.contains("entry.0.symbol: player_x\n"));
    }

    #[test]
    fn control_characters_are_escaped() {
        let mut table = MappingTable::new("de\nmo", "out.vcs");
        table.record(1, &loc("a\tb.gm", 1, 1).with_snippet("x = 1\ny = 2"));
        let text = table.to_text();
        assert!(text.contains("game: de\\nmo\n"));
        assert!(text.contains("entry.0.file: a\\tb.gm\n"));
        assert!(text.contains("entry.0.snippet: x = 1\\ny = 2\n"));
    }
}

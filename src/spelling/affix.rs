//! Hunspell-style affix rules (`.aff`) and word lists (`.dic`).
//!
//! Only the parts that decide which word forms are valid, and which
//! replacements to try first when suggesting, are interpreted:
//!
//! - `FLAG` (single character, `UTF-8`, `long` and `num` flag encodings)
//! - `PFX` / `SFX` classes with strip, append and condition
//! - `REP` replacement table
//!
//! Continuation flags on affixes (`ed/XY`) and morphological fields are
//! accepted but ignored, so two-level affixation is not generated.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use log::{debug, warn};
use regex::Regex;

use crate::error::{Result, TiffinError};

/// How flags are encoded after the `/` in dictionary entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlagMode {
    /// One character per flag (the Hunspell default).
    #[default]
    Char,
    /// Two characters per flag.
    Long,
    /// Comma separated decimal numbers.
    Numeric,
}

impl FlagMode {
    /// Split a flag string into individual flags.
    pub fn split(&self, flags: &str) -> Vec<String> {
        match self {
            FlagMode::Char => flags.chars().map(String::from).collect(),
            FlagMode::Long => {
                let chars: Vec<char> = flags.chars().collect();
                chars.chunks(2).map(|pair| pair.iter().collect()).collect()
            }
            FlagMode::Numeric => flags
                .split(',')
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .map(String::from)
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AffixKind {
    Prefix,
    Suffix,
}

#[derive(Debug, Clone)]
struct AffixEntry {
    strip: String,
    append: String,
    condition: Option<Regex>,
}

impl AffixEntry {
    fn apply(&self, kind: AffixKind, word: &str) -> Option<String> {
        if let Some(condition) = &self.condition
            && !condition.is_match(word)
        {
            return None;
        }

        match kind {
            AffixKind::Suffix => {
                let stem = word.strip_suffix(self.strip.as_str())?;
                Some(format!("{stem}{}", self.append))
            }
            AffixKind::Prefix => {
                let stem = word.strip_prefix(self.strip.as_str())?;
                Some(format!("{}{stem}", self.append))
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
struct AffixClass {
    cross_product: bool,
    entries: Vec<AffixEntry>,
}

/// Parsed affix file.
#[derive(Debug, Clone, Default)]
pub struct AffixRules {
    flag_mode: FlagMode,
    prefixes: HashMap<String, AffixClass>,
    suffixes: HashMap<String, AffixClass>,
    replacements: Vec<(String, String)>,
    try_chars: String,
}

impl AffixRules {
    /// Load an affix file from disk.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            TiffinError::configuration(format!(
                "cannot read affix file {}: {e}",
                path.display()
            ))
        })?;
        Self::parse(&content)
    }

    /// Parse affix file content.
    pub fn parse(content: &str) -> Result<Self> {
        let mut rules = AffixRules::default();

        for (line_no, raw) in content.lines().enumerate() {
            let line = raw.split('#').next().unwrap_or("").trim();
            let fields: Vec<&str> = line.split_whitespace().collect();
            let Some(&directive) = fields.first() else {
                continue;
            };

            match directive {
                "FLAG" => {
                    rules.flag_mode = match fields.get(1).copied() {
                        Some("long") => FlagMode::Long,
                        Some("num") => FlagMode::Numeric,
                        _ => FlagMode::Char,
                    };
                }
                "PFX" | "SFX" => {
                    let kind = if directive == "PFX" {
                        AffixKind::Prefix
                    } else {
                        AffixKind::Suffix
                    };
                    rules.parse_affix_line(kind, &fields, line_no + 1)?;
                }
                "TRY" => {
                    if let Some(chars) = fields.get(1) {
                        rules.try_chars = chars.to_string();
                    }
                }
                "REP" => {
                    // "REP <count>" announces the table
                    if fields.len() >= 3 {
                        let from = fields[1].replace('_', " ");
                        let to = fields[2].replace('_', " ");
                        rules.replacements.push((
                            from.trim_matches(|c| c == '^' || c == '$').to_string(),
                            to,
                        ));
                    }
                }
                other => debug!("ignoring affix directive {other} on line {}", line_no + 1),
            }
        }

        Ok(rules)
    }

    fn parse_affix_line(&mut self, kind: AffixKind, fields: &[&str], line_no: usize) -> Result<()> {
        if fields.len() < 4 {
            return Err(TiffinError::configuration(format!(
                "malformed affix rule on line {line_no}"
            )));
        }

        let flag = fields[1].to_string();
        let classes = match kind {
            AffixKind::Prefix => &mut self.prefixes,
            AffixKind::Suffix => &mut self.suffixes,
        };

        let is_header = fields.len() == 4
            && matches!(fields[2], "Y" | "N")
            && fields[3].parse::<usize>().is_ok();
        if is_header {
            let class = classes.entry(flag).or_default();
            class.cross_product = fields[2] == "Y";
            return Ok(());
        }

        let strip = if fields[2] == "0" { "" } else { fields[2] };
        let append = fields[3].split('/').next().unwrap_or("");
        let append = if append == "0" { "" } else { append };
        let condition = fields.get(4).copied().unwrap_or(".");

        let condition = if condition == "." {
            None
        } else {
            let anchored = match kind {
                AffixKind::Prefix => format!("^(?:{condition})"),
                AffixKind::Suffix => format!("(?:{condition})$"),
            };
            match Regex::new(&anchored) {
                Ok(regex) => Some(regex),
                Err(e) => {
                    warn!("skipping affix rule on line {line_no}: bad condition {condition}: {e}");
                    return Ok(());
                }
            }
        };

        classes.entry(flag).or_default().entries.push(AffixEntry {
            strip: strip.to_string(),
            append: append.to_string(),
            condition,
        });
        Ok(())
    }

    /// Characters the affix file suggests trying in edits, most frequent first.
    pub fn try_chars(&self) -> &str {
        &self.try_chars
    }

    /// The flag encoding declared by the affix file.
    pub fn flag_mode(&self) -> FlagMode {
        self.flag_mode
    }

    /// The `REP` table, in file order.
    pub fn replacements(&self) -> &[(String, String)] {
        &self.replacements
    }

    /// Generate every valid form of `word` given its dictionary flags.
    ///
    /// The bare word is always the first form. Prefixes combine with
    /// suffixes when both classes allow cross products.
    pub fn expand(&self, word: &str, flags: &str) -> Vec<String> {
        let mut forms = vec![word.to_string()];
        if flags.is_empty() {
            return forms;
        }

        let flags = self.flag_mode.split(flags);
        let mut cross_suffixed = Vec::new();

        for flag in &flags {
            if let Some(class) = self.suffixes.get(flag) {
                for entry in &class.entries {
                    if let Some(form) = entry.apply(AffixKind::Suffix, word) {
                        if class.cross_product {
                            cross_suffixed.push(form.clone());
                        }
                        forms.push(form);
                    }
                }
            }
        }

        for flag in &flags {
            if let Some(class) = self.prefixes.get(flag) {
                for entry in &class.entries {
                    if let Some(form) = entry.apply(AffixKind::Prefix, word) {
                        forms.push(form);
                    }
                    if class.cross_product {
                        forms.extend(
                            cross_suffixed
                                .iter()
                                .filter_map(|s| entry.apply(AffixKind::Prefix, s)),
                        );
                    }
                }
            }
        }

        forms
    }
}

/// Parse `.dic` content into `(word, flags)` pairs.
///
/// The optional leading entry count is skipped, as are morphological fields.
pub fn parse_dic(content: &str) -> Vec<(String, String)> {
    let mut lines = content.lines().peekable();
    if let Some(first) = lines.peek()
        && first.trim().parse::<usize>().is_ok()
    {
        lines.next();
    }

    lines
        .filter_map(|line| {
            let entry = line.split_whitespace().next()?;
            let (word, flags) = match entry.rsplit_once('/') {
                Some((word, flags)) if !word.ends_with('\\') => (word, flags),
                _ => (entry, ""),
            };
            let word = word.replace("\\/", "/");
            (!word.is_empty()).then(|| (word, flags.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const AFF: &str = "\
SET UTF-8
TRY esianrtolcdugmphbyfvkwz
REP 2
REP f ph
REP ph f

PFX A Y 1
PFX A   0     re         .

SFX D Y 3
SFX D   0     d          e
SFX D   y     ied        [^aeiou]y
SFX D   0     ed         [^ey]

SFX S Y 2
SFX S   y     ies        [^aeiou]y
SFX S   0     s          [^y]
";

    #[test]
    fn test_suffix_expansion() {
        let rules = AffixRules::parse(AFF).unwrap();

        let forms = rules.expand("order", "D");
        assert_eq!(forms, vec!["order", "ordered"]);

        let forms = rules.expand("fry", "D");
        assert_eq!(forms, vec!["fry", "fried"]);

        let forms = rules.expand("bake", "D");
        assert_eq!(forms, vec!["bake", "baked"]);
    }

    #[test]
    fn test_cross_product() {
        let rules = AffixRules::parse(AFF).unwrap();
        let forms = rules.expand("heat", "DA");

        assert!(forms.contains(&"heat".to_string()));
        assert!(forms.contains(&"heated".to_string()));
        assert!(forms.contains(&"reheat".to_string()));
        assert!(forms.contains(&"reheated".to_string()));
    }

    #[test]
    fn test_replacement_table() {
        let rules = AffixRules::parse(AFF).unwrap();
        assert_eq!(
            rules.replacements(),
            &[
                ("f".to_string(), "ph".to_string()),
                ("ph".to_string(), "f".to_string())
            ]
        );
        assert_eq!(rules.try_chars(), "esianrtolcdugmphbyfvkwz");
    }

    #[test]
    fn test_flag_modes() {
        assert_eq!(FlagMode::Char.split("AB"), vec!["A", "B"]);
        assert_eq!(FlagMode::Long.split("AaBb"), vec!["Aa", "Bb"]);
        assert_eq!(FlagMode::Numeric.split("101,7"), vec!["101", "7"]);

        let rules = AffixRules::parse("FLAG long\n").unwrap();
        assert_eq!(rules.flag_mode(), FlagMode::Long);
    }

    #[test]
    fn test_parse_dic() {
        let entries = parse_dic("3\nhello/S\ndosa\norder/DS po:verb\n");
        assert_eq!(
            entries,
            vec![
                ("hello".to_string(), "S".to_string()),
                ("dosa".to_string(), String::new()),
                ("order".to_string(), "DS".to_string()),
            ]
        );
    }
}

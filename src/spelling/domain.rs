//! Restaurant vocabulary merged into the base dictionary.
//!
//! These words are absent from general English dictionaries, so without
//! them the corrector would rewrite "idli" or "paneer" into the nearest
//! English word and the classifier would learn from mangled text.

use std::fs;
use std::path::Path;

use crate::error::Result;

/// Built-in food and restaurant terms.
pub const DOMAIN_WORDS: &[&str] = &[
    "achari", "adai", "aloo", "andhra", "bajji", "balchao", "batata", "benne", "bhara", "bhel",
    "bhuna", "bhutta", "bonjour", "boti", "bournvita", "chaat", "chai", "chana", "chettinad",
    "chilli", "chingri", "corn", "dahi", "dal", "dhokla", "dosa", "dosas", "fanta", "galouti",
    "gassi", "goan", "gobi", "gosht", "hara", "hariyali", "hola", "horlicks", "hyderabadi",
    "idli", "idlies", "indian", "jain", "jhinga", "kakori", "kanchipuram", "kerala", "khaman",
    "kodi", "kolhapuri", "koliwada", "konju", "kosha", "kura", "kuzhambu", "laal", "maas",
    "malabar", "malai", "mallige", "manchurian", "mangsho", "masala", "medu", "mirchi", "moilee",
    "moong", "mudda", "mysore", "namaskar", "namaste", "neer", "nonvegiterian", "pakora",
    "paneer", "pani", "papad", "papdi", "patia", "pav", "pesarattu", "podi", "poha",
    "pollichathu", "puri", "pyaza", "ragi", "rava", "roasted", "rogan", "royallu", "saag",
    "sabudana", "sada", "samabar", "sambar", "sanna", "schezwan", "seekh", "sev", "shami",
    "sukka", "tata", "thatte", "tikka", "tikki", "uttappam", "vada", "varutharaccha",
    "vegiterian", "vepudu", "vindaloo", "zup",
];

/// Read a supplementary word list, one word per line.
///
/// Blank lines and lines starting with `#` are skipped.
pub fn load_word_list<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_lowercase)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_builtin_words_are_lowercase() {
        assert!(DOMAIN_WORDS.iter().all(|w| *w == w.to_lowercase()));
        assert!(DOMAIN_WORDS.contains(&"idli"));
        assert!(DOMAIN_WORDS.contains(&"paneer"));
    }

    #[test]
    fn test_load_word_list() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "# house specials").unwrap();
        writeln!(file, "Kothu").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "  appam  ").unwrap();
        file.flush().unwrap();

        let words = load_word_list(file.path()).unwrap();
        assert_eq!(words, vec!["kothu", "appam"]);
    }
}

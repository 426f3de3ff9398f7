use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use super::CharFilter;

/// Supported Unicode normalization forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizationForm {
    NFC,
    NFD,
    NFKC,
    NFKD,
}

/// A char filter that performs Unicode normalization.
///
/// With `strip_diacritics` the text is decomposed and combining marks are
/// dropped, so "crème brûlée" and "creme brulee" featurize identically.
pub struct UnicodeNormalizationCharFilter {
    form: NormalizationForm,
    strip_diacritics: bool,
}

impl UnicodeNormalizationCharFilter {
    pub fn new(form: NormalizationForm) -> Self {
        Self {
            form,
            strip_diacritics: false,
        }
    }

    /// Compatibility-decompose and remove combining marks.
    pub fn strip_diacritics() -> Self {
        Self {
            form: NormalizationForm::NFKD,
            strip_diacritics: true,
        }
    }
}

impl CharFilter for UnicodeNormalizationCharFilter {
    fn filter(&self, input: &str) -> String {
        let normalized: String = match self.form {
            NormalizationForm::NFC => input.nfc().collect(),
            NormalizationForm::NFD => input.nfd().collect(),
            NormalizationForm::NFKC => input.nfkc().collect(),
            NormalizationForm::NFKD => input.nfkd().collect(),
        };

        if self.strip_diacritics {
            normalized.chars().filter(|c| !is_combining_mark(*c)).collect()
        } else {
            normalized
        }
    }

    fn name(&self) -> &'static str {
        "unicode_normalization"
    }
}

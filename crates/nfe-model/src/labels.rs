//! Class-index to tax-category labels.

use std::collections::BTreeMap;

/// Label returned for every row when the classifier artifact cannot be loaded.
pub const MODEL_ERROR_LABEL: &str = "ERRO_MODELO";

/// Label returned for every row when batch inference fails.
pub const PREDICTION_ERROR_LABEL: &str = "ERRO_PREDICAO";

/// Static lookup from model class index to a human-readable label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelTable {
    labels: BTreeMap<usize, String>,
}

impl LabelTable {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (usize, S)>,
        S: Into<String>,
    {
        Self {
            labels: entries
                .into_iter()
                .map(|(idx, label)| (idx, label.into()))
                .collect(),
        }
    }

    /// The five ICMS tax categories the classifier was trained on.
    pub fn tax_categories() -> Self {
        Self::new([
            (0, "0 -> ICMS ANT"),
            (1, "1 -> ICMS ANTEF"),
            (2, "2 -> ICMS DIFAL"),
            (3, "3 -> ICMS ST"),
            (4, "4 -> ICMS STDIF"),
        ])
    }

    /// Label for a class index; unknown indices get `Classe_<index>`.
    pub fn label_for(&self, index: usize) -> String {
        self.labels
            .get(&index)
            .cloned()
            .unwrap_or_else(|| format!("Classe_{index}"))
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl Default for LabelTable {
    fn default() -> Self {
        Self::tax_categories()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tax_categories_cover_five_classes() {
        let table = LabelTable::tax_categories();
        assert_eq!(table.len(), 5);
        assert_eq!(table.label_for(0), "0 -> ICMS ANT");
        assert_eq!(table.label_for(4), "4 -> ICMS STDIF");
    }

    #[test]
    fn unknown_index_falls_back() {
        let table = LabelTable::tax_categories();
        assert_eq!(table.label_for(5), "Classe_5");
        assert_eq!(LabelTable::new::<_, String>([]).label_for(0), "Classe_0");
    }
}

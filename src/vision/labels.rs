//! Class id to label mapping

use std::collections::BTreeMap;

const DEFAULT_LABELS: [&str; 10] = [
    "Lee Sin",
    "Elise",
    "Graves",
    "Nidalee",
    "Viego",
    "Kha'Zix",
    "Rek'Sai",
    "Hecarim",
    "Jarvan IV",
    "Vi",
];

/// Names for the classes a model was trained on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelTable {
    names: BTreeMap<u32, String>,
}

impl LabelTable {
    pub fn new(names: impl IntoIterator<Item = (u32, String)>) -> Self {
        Self {
            names: names.into_iter().collect(),
        }
    }

    /// Label for a class id; unknown ids render as `Unknown(<id>)`
    pub fn label(&self, class_id: u32) -> String {
        self.names
            .get(&class_id)
            .cloned()
            .unwrap_or_else(|| format!("Unknown({})", class_id))
    }

    /// All known labels, ordered by class id
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.values().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for LabelTable {
    fn default() -> Self {
        Self::new(
            DEFAULT_LABELS
                .iter()
                .enumerate()
                .map(|(id, name)| (id as u32, (*name).to_string())),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_labels() {
        let labels = LabelTable::default();

        assert_eq!(labels.len(), 10);
        assert_eq!(labels.label(0), "Lee Sin");
        assert_eq!(labels.label(9), "Vi");
        assert_eq!(labels.label(42), "Unknown(42)");
    }

    #[test]
    fn test_names_in_id_order() {
        let labels = LabelTable::new([(5, "b".to_string()), (1, "a".to_string())]);
        let names: Vec<&str> = labels.names().collect();

        assert_eq!(names, ["a", "b"]);
    }
}

//! Field Catalog
//!
//! Typed, read-only view over the configuration table. Every row names a
//! field and carries either a literal value (Static) or a prompt template
//! (AiDirective); the third column decides which.

use auditfill_sdk::types::CellValue;
use indexmap::IndexMap;

/// Marker that flags a row's generated-label column as an AI directive
pub const AI_LABEL_MARKER: &str = "{{IA:";

/// Company name field used by the base prompt template
pub const COMPANY_FIELD: &str = "EMPRESA";

/// Tax identifier field used by the base prompt template
pub const TAX_ID_FIELD: &str = "RUC";

/// How a field is resolved inside templates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Literal value substituted verbatim
    Static,

    /// Prompt template sent to the generation backend
    AiDirective,
}

/// One decoded configuration row: (field name, value-or-prompt, generated label)
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigRow {
    pub name: String,
    pub value: CellValue,
    pub label: String,
}

impl ConfigRow {
    pub fn new(name: impl Into<String>, value: CellValue, label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value,
            label: label.into(),
        }
    }
}

/// A classified configuration field
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDefinition {
    pub name: String,
    pub kind: FieldKind,
    /// Literal value for Static fields, prompt template for AiDirective fields
    pub raw_value: CellValue,
}

impl FieldDefinition {
    /// The value rendered as template text
    pub fn text(&self) -> String {
        self.raw_value.to_string()
    }
}

/// Classify a row by its generated-label column
pub fn classify(label: &str) -> FieldKind {
    if label.trim().starts_with(AI_LABEL_MARKER) {
        FieldKind::AiDirective
    } else {
        FieldKind::Static
    }
}

/// Name → field mapping built once per run
///
/// Insertion order is preserved. A duplicate name replaces the earlier
/// definition in place (last write wins, first position kept).
#[derive(Debug, Clone, Default)]
pub struct FieldCatalog {
    fields: IndexMap<String, FieldDefinition>,
}

impl FieldCatalog {
    /// Build the catalog from decoded configuration rows.
    ///
    /// Rows whose trimmed name is empty are skipped.
    pub fn from_rows<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = ConfigRow>,
    {
        let mut fields = IndexMap::new();

        for row in rows {
            let name = row.name.trim();
            if name.is_empty() {
                continue;
            }

            let kind = classify(&row.label);
            let definition = FieldDefinition {
                name: name.to_string(),
                kind,
                raw_value: row.value,
            };

            if let Some(previous) = fields.insert(name.to_string(), definition) {
                tracing::debug!("Field '{}' redefined; keeping last value", previous.name);
            }
        }

        Self { fields }
    }

    pub fn get(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.get(name)
    }

    /// Literal value of a Static field
    pub fn static_value(&self, name: &str) -> Option<&CellValue> {
        self.fields
            .get(name)
            .filter(|f| f.kind == FieldKind::Static)
            .map(|f| &f.raw_value)
    }

    /// Static value as text; `None` if the field is absent or not Static
    pub fn static_text(&self, name: &str) -> Option<String> {
        self.static_value(name).map(|v| v.to_string())
    }

    /// Static value as trimmed text, `None` when absent or blank
    pub fn non_blank(&self, name: &str) -> Option<String> {
        self.static_value(name)
            .filter(|v| !v.is_blank())
            .map(|v| v.to_string().trim().to_string())
    }

    /// Prompt template of an AiDirective field
    pub fn ai_prompt(&self, name: &str) -> Option<String> {
        self.fields
            .get(name)
            .filter(|f| f.kind == FieldKind::AiDirective)
            .map(FieldDefinition::text)
    }

    pub fn statics(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.fields.values().filter(|f| f.kind == FieldKind::Static)
    }

    pub fn ai_directives(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.fields
            .values()
            .filter(|f| f.kind == FieldKind::AiDirective)
    }

    /// Values of the standards under audit, in catalog order
    ///
    /// A Static field counts when its name contains `NORMA` (any case), does
    /// not end in `_RESUMEN`, and its value is not blank. Duplicated values
    /// are kept.
    pub fn audited_standards(&self) -> Vec<String> {
        self.statics()
            .filter(|f| {
                let upper = f.name.to_uppercase();
                upper.contains("NORMA") && !upper.ends_with("_RESUMEN")
            })
            .filter(|f| !f.raw_value.is_blank())
            .map(FieldDefinition::text)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn static_count(&self) -> usize {
        self.statics().count()
    }

    pub fn ai_count(&self) -> usize {
        self.ai_directives().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    fn catalog(rows: &[(&str, &str, &str)]) -> FieldCatalog {
        FieldCatalog::from_rows(
            rows.iter()
                .map(|(n, v, l)| ConfigRow::new(*n, text(v), *l)),
        )
    }

    #[test]
    fn test_classification_by_label() {
        let cat = catalog(&[
            ("EMPRESA", "Acme", "{{EMPRESA}}"),
            ("RESUMEN", "Resume la auditoría", "  {{IA:RESUMEN}}"),
            ("OTRO", "x", "IA:OTRO"),
        ]);

        assert_eq!(cat.get("EMPRESA").unwrap().kind, FieldKind::Static);
        assert_eq!(cat.get("RESUMEN").unwrap().kind, FieldKind::AiDirective);
        assert_eq!(cat.get("OTRO").unwrap().kind, FieldKind::Static);
        assert_eq!(cat.ai_prompt("RESUMEN").unwrap(), "Resume la auditoría");
        assert!(cat.static_value("RESUMEN").is_none());
    }

    #[test]
    fn test_blank_names_skipped() {
        let cat = catalog(&[("", "x", ""), ("   ", "y", ""), ("RUC", "123", "")]);
        assert_eq!(cat.len(), 1);
    }

    #[test]
    fn test_duplicate_last_write_wins() {
        let cat = catalog(&[
            ("NORMA1", "ISO 9001", ""),
            ("RUC", "1", ""),
            ("NORMA1", "ISO 14001", ""),
        ]);

        assert_eq!(cat.len(), 2);
        assert_eq!(cat.static_text("NORMA1").unwrap(), "ISO 14001");
        // First position is kept
        assert_eq!(cat.statics().next().unwrap().name, "NORMA1");
    }

    #[test]
    fn test_audited_standards() {
        let cat = catalog(&[
            ("NORMA1", "ISO 9001:2015", ""),
            ("NORMA_RESUMEN", "9001 y 45001", ""),
            ("norma2", "ISO 45001:2018", ""),
            ("NORMA3", "", ""),
            ("NORMA4", "ISO 9001:2015", ""),
            ("NORMA_IA", "prompt", "{{IA:NORMA_IA}}"),
            ("EMPRESA", "Acme", ""),
        ]);

        assert_eq!(
            cat.audited_standards(),
            vec!["ISO 9001:2015", "ISO 45001:2018", "ISO 9001:2015"]
        );
    }

    #[test]
    fn test_numeric_values_stringified() {
        let cat = FieldCatalog::from_rows(vec![ConfigRow::new(
            "RUC",
            CellValue::Number(20123456789.0),
            "",
        )]);
        assert_eq!(cat.static_text("RUC").unwrap(), "20123456789");
    }

    #[test]
    fn test_counts() {
        let cat = catalog(&[
            ("A", "1", ""),
            ("B", "p", "{{IA:B}}"),
            ("C", "p", "{{IA:C}}"),
        ]);
        assert_eq!(cat.static_count(), 1);
        assert_eq!(cat.ai_count(), 2);
    }
}

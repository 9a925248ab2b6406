//! JSON workbooks
//!
//! Stand-in for spreadsheet files, used for spreadsheet templates, the
//! configuration table and company context documents:
//!
//! ```json
//! {"sheets": [{"name": "Datos", "rows": [["CAMPO", "VALOR", "CAMPO_GENERADO"]]}]}
//! ```
//!
//! Strings become `Text`, numbers `Number`, null `Blank`, anything else
//! `Other`.

use crate::catalog::ConfigRow;
use auditfill_sdk::{CellValue, EngineError, TemplateDocument, TemplateKind};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
struct RawWorkbook {
    sheets: Vec<RawSheet>,
}

#[derive(Debug, Serialize, Deserialize)]
struct RawSheet {
    name: String,
    #[serde(default)]
    rows: Vec<Vec<serde_json::Value>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Vec<CellValue>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Workbook {
    sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn parse(bytes: &[u8]) -> Result<Self, EngineError> {
        let raw: RawWorkbook = serde_json::from_slice(bytes)
            .map_err(|e| EngineError::Document(format!("Invalid workbook: {}", e)))?;

        let sheets = raw
            .sheets
            .into_iter()
            .map(|sheet| Sheet {
                name: sheet.name,
                rows: sheet
                    .rows
                    .iter()
                    .map(|row| row.iter().map(CellValue::from).collect())
                    .collect(),
            })
            .collect();

        Ok(Self { sheets })
    }

    /// Plain-text rendering: a `--- Hoja: <name> ---` header per sheet and
    /// one `" | "`-joined line per non-empty row
    pub fn flatten_text(&self) -> String {
        let mut text = String::new();

        for sheet in &self.sheets {
            text.push_str(&format!("\n--- Hoja: {} ---\n", sheet.name));
            for row in &sheet.rows {
                let values: Vec<String> = row
                    .iter()
                    .filter(|cell| **cell != CellValue::Blank)
                    .map(|cell| cell.to_string())
                    .collect();
                if !values.is_empty() {
                    text.push_str(&values.join(" | "));
                    text.push('\n');
                }
            }
        }

        text.trim().to_string()
    }

    /// Decode the configuration table: first sheet, header row skipped,
    /// columns (name, value-or-prompt, generated label)
    pub fn config_rows(&self) -> Result<Vec<ConfigRow>, EngineError> {
        let sheet = self.sheets.first().ok_or_else(|| {
            EngineError::ConfigTableInvalid("workbook has no sheets".to_string())
        })?;

        let rows = sheet
            .rows
            .iter()
            .skip(1)
            .filter_map(|row| {
                let name = row.first()?.to_string().trim().to_string();
                if name.is_empty() {
                    return None;
                }
                let value = row.get(1).cloned().unwrap_or(CellValue::Blank);
                let label = row
                    .get(2)
                    .map(|cell| cell.to_string().trim().to_string())
                    .unwrap_or_default();
                Some(ConfigRow::new(name, value, label))
            })
            .collect();

        Ok(rows)
    }
}

impl TemplateDocument for Workbook {
    fn kind(&self) -> TemplateKind {
        TemplateKind::Spreadsheet
    }

    fn text_nodes_mut(&mut self) -> Vec<&mut String> {
        self.sheets
            .iter_mut()
            .flat_map(|sheet| sheet.rows.iter_mut())
            .flat_map(|row| row.iter_mut())
            .filter_map(CellValue::as_text_mut)
            .collect()
    }

    fn node_count(&self) -> usize {
        self.sheets
            .iter()
            .flat_map(|sheet| sheet.rows.iter())
            .flat_map(|row| row.iter())
            .filter(|cell| cell.as_text().is_some())
            .count()
    }

    fn to_bytes(&self) -> Result<Vec<u8>, EngineError> {
        let raw = RawWorkbook {
            sheets: self
                .sheets
                .iter()
                .map(|sheet| RawSheet {
                    name: sheet.name.clone(),
                    rows: sheet
                        .rows
                        .iter()
                        .map(|row| row.iter().map(serde_json::Value::from).collect())
                        .collect(),
                })
                .collect(),
        };

        serde_json::to_vec_pretty(&raw)
            .map_err(|e| EngineError::Document(format!("Failed to serialize workbook: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::FieldKind;
    use crate::catalog::FieldCatalog;

    const TABLE: &str = r#"{"sheets": [
        {"name": "Datos", "rows": [
            ["CAMPO", "VALOR", "CAMPO_GENERADO"],
            ["EMPRESA", "Acme SAC", "{{EMPRESA}}"],
            ["RUC", 20100000001, "{{RUC}}"],
            [null, "orphan", ""],
            ["RESUMEN", "Summarize the audit", "{{IA:RESUMEN}}"],
            ["NORMA3"]
        ]},
        {"name": "Ignored", "rows": [["X", "Y", ""]]}
    ]}"#;

    #[test]
    fn test_config_rows() {
        let workbook = Workbook::parse(TABLE.as_bytes()).unwrap();
        let rows = workbook.config_rows().unwrap();

        assert_eq!(rows.len(), 4);
        assert_eq!(rows[1].value, CellValue::Number(20100000001.0));
        assert_eq!(rows[3].name, "NORMA3");
        assert_eq!(rows[3].value, CellValue::Blank);

        let catalog = FieldCatalog::from_rows(rows);
        assert_eq!(catalog.get("RESUMEN").unwrap().kind, FieldKind::AiDirective);
        assert_eq!(catalog.static_text("RUC").as_deref(), Some("20100000001"));
        assert!(catalog.get("X").is_none());
    }

    #[test]
    fn test_empty_workbook_is_invalid_table() {
        let workbook = Workbook::parse(br#"{"sheets": []}"#).unwrap();
        assert!(matches!(
            workbook.config_rows(),
            Err(EngineError::ConfigTableInvalid(_))
        ));
    }

    #[test]
    fn test_only_text_cells_are_nodes() {
        let mut workbook = Workbook::parse(
            br#"{"sheets": [{"name": "S", "rows": [["{{EMPRESA}}", 3, null, true]]}]}"#,
        )
        .unwrap();
        assert_eq!(workbook.node_count(), 1);

        for node in workbook.text_nodes_mut() {
            *node = "Acme".to_string();
        }
        let saved: serde_json::Value =
            serde_json::from_slice(&workbook.to_bytes().unwrap()).unwrap();
        assert_eq!(
            saved,
            serde_json::json!({"sheets": [{"name": "S", "rows": [["Acme", 3.0, null, true]]}]})
        );
    }

    #[test]
    fn test_flatten_text() {
        let workbook = Workbook::parse(
            br#"{"sheets": [{"name": "Personal", "rows": [["Ana", null, "Jefa"], [null], [5]]}]}"#,
        )
        .unwrap();
        assert_eq!(workbook.flatten_text(), "--- Hoja: Personal ---\nAna | Jefa\n5");
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            Workbook::parse(b"not json"),
            Err(EngineError::Document(_))
        ));
    }
}

//! Context Assembler
//!
//! Builds the single system context prepended to every AI prompt of a run.
//! The context is a base template followed by optional sections in a fixed
//! order; a section only appears when its source fields carry data.

use crate::catalog::{FieldCatalog, COMPANY_FIELD, TAX_ID_FIELD};
use std::fmt;
use std::path::Path;
use tracing::{debug, warn};

/// Built-in base template. `{NORMAS_AUDITADAS}`, `{EMPRESA}` and `{RUC}` are
/// replaced literally.
pub const DEFAULT_BASE_TEMPLATE: &str = "
You are an expert auditor of ISO management systems.

AUDITED STANDARDS: {NORMAS_AUDITADAS}
COMPANY: {EMPRESA}
RUC: {RUC}

Generate professional, specific content for audits.
";

const STANDARDS_TOKEN: &str = "{NORMAS_AUDITADAS}";
const COMPANY_TOKEN: &str = "{EMPRESA}";
const TAX_ID_TOKEN: &str = "{RUC}";

const NO_STANDARDS: &str = "Not specified";
const NO_COMPANY: &str = "Not specified";
const NO_TAX_ID: &str = "Not specified";

const RULE: &str = "═══════════════════════════════════════════════════════════════════════";

/// Field name prefixes rendered by dedicated sections
const SECTION_PREFIXES: &[&str] = &[
    "DOC_",
    "NORMA",
    "PROCESO_",
    "SERVICIO_",
    "RESPONSABLE_PROC",
    "NOMBRE_RESP",
    "TIPOPROC",
    "CANTPROC",
    "CLAUSULA",
    "FC_",
    "FUNCION_CUMPLIMIENTO",
];

const SCOPE_FIELD: &str = "ALCANCE";
const COMPLIANCE_OFFICER_FIELD: &str = "FUNCION_CUMPLIMIENTO";
const ANTI_BRIBERY_STANDARD: &str = "37001";
const SECONDARY_SERVICES: std::ops::RangeInclusive<u32> = 2..=6;

/// The assembled system context of one run
///
/// Built once and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemContext(String);

impl SystemContext {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for SystemContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub struct ContextAssembler {
    base_template: String,
}

impl Default for ContextAssembler {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_TEMPLATE)
    }
}

impl ContextAssembler {
    pub fn new(base_template: impl Into<String>) -> Self {
        Self {
            base_template: base_template.into(),
        }
    }

    /// Use the template at `prompt_file`, falling back to the built-in one
    /// when no file is configured or it cannot be read.
    pub fn from_prompt_file(prompt_file: Option<&Path>) -> Self {
        let Some(path) = prompt_file else {
            return Self::default();
        };

        match std::fs::read_to_string(path) {
            Ok(template) => {
                debug!("Loaded base prompt template from {:?}", path);
                Self::new(template)
            }
            Err(e) => {
                warn!(
                    "Prompt file {:?} unreadable ({}), using built-in template",
                    path, e
                );
                Self::default()
            }
        }
    }

    /// Assemble the system context for a run.
    ///
    /// Sections, in order: base template, document catalog, scope, process
    /// roster, compliance function, service focus, remaining company fields,
    /// external company context.
    pub fn assemble(
        &self,
        standards: &[String],
        catalog: &FieldCatalog,
        external_context: Option<&str>,
    ) -> SystemContext {
        let mut context = self.render_base(standards, catalog);

        let sections = [
            document_catalog_section(catalog),
            scope_section(catalog),
            roster_section(catalog),
            compliance_section(standards, catalog),
            focus_service_section(catalog),
            company_fields_section(catalog),
            external_section(external_context),
        ];

        for section in sections.into_iter().flatten() {
            context.push_str(&section);
        }

        SystemContext(context)
    }

    fn render_base(&self, standards: &[String], catalog: &FieldCatalog) -> String {
        let standards_text = if standards.is_empty() {
            NO_STANDARDS.to_string()
        } else {
            standards.join("\n   - ")
        };

        let company = catalog
            .static_text(COMPANY_FIELD)
            .unwrap_or_else(|| NO_COMPANY.to_string());
        let tax_id = catalog
            .static_text(TAX_ID_FIELD)
            .unwrap_or_else(|| NO_TAX_ID.to_string());

        self.base_template
            .replace(STANDARDS_TOKEN, &standards_text)
            .replace(COMPANY_TOKEN, &company)
            .replace(TAX_ID_TOKEN, &tax_id)
    }
}

fn banner(title: &str) -> String {
    format!("\n\n{RULE}\n{title}\n{RULE}\n")
}

fn document_catalog_section(catalog: &FieldCatalog) -> Option<String> {
    let documents: Vec<String> = catalog
        .statics()
        .filter(|f| f.name.starts_with("DOC_"))
        .filter(|f| !f.raw_value.is_blank())
        .map(|f| f.text().trim().to_string())
        .collect();

    if documents.is_empty() {
        return None;
    }

    let mut section = banner("MANAGEMENT SYSTEM DOCUMENTS (cite them by their exact name):");
    for (i, document) in documents.iter().enumerate() {
        section.push_str(&format!("{}. {}\n", i + 1, document));
    }
    Some(section)
}

fn scope_section(catalog: &FieldCatalog) -> Option<String> {
    let scope = catalog.non_blank(SCOPE_FIELD)?;
    let mut section = banner("AUDIT SCOPE:");
    section.push_str(&scope);
    section.push('\n');
    Some(section)
}

fn roster_section(catalog: &FieldCatalog) -> Option<String> {
    let mut lines = Vec::new();

    // Probe PROCESO_1, PROCESO_2, ... until the first missing index
    let mut n = 1u32;
    while catalog.get(&format!("PROCESO_{n}")).is_some() {
        if let Some(process) = catalog.non_blank(&format!("PROCESO_{n}")) {
            lines.push(format!("{n}. {process}"));

            let details = [
                ("Responsible role", format!("RESPONSABLE_PROC_{n}")),
                ("Responsible person", format!("NOMBRE_RESP_{n}")),
                ("Process type", format!("TIPOPROC_{n}")),
                ("Headcount", format!("CANTPROC_{n}")),
            ];
            for (label, field) in details {
                if let Some(value) = catalog.non_blank(&field) {
                    lines.push(format!("   {label}: {value}"));
                }
            }
        }
        n += 1;
    }

    if lines.is_empty() {
        return None;
    }

    let mut section = banner("AUDITED PROCESSES AND PERSONNEL:");
    section.push_str(&lines.join("\n"));
    section.push('\n');
    Some(section)
}

fn compliance_section(standards: &[String], catalog: &FieldCatalog) -> Option<String> {
    if !standards.iter().any(|s| s.contains(ANTI_BRIBERY_STANDARD)) {
        return None;
    }
    let officer = catalog.non_blank(COMPLIANCE_OFFICER_FIELD)?;

    let mut section = banner("ANTI-BRIBERY COMPLIANCE FUNCTION (ISO 37001):");
    section.push_str(&format!("Compliance officer: {officer}\n"));

    for field in catalog.statics().filter(|f| f.name.starts_with("FC_")) {
        if let Some(value) = catalog.non_blank(&field.name) {
            section.push_str(&format!("{}: {}\n", field.name, value));
        }
    }
    Some(section)
}

/// Only rendered when the primary service is set; secondary services alone
/// add nothing
fn focus_service_section(catalog: &FieldCatalog) -> Option<String> {
    let primary = catalog.non_blank("SERVICIO_1")?;
    let secondary: Vec<String> = SECONDARY_SERVICES
        .filter_map(|n| catalog.non_blank(&format!("SERVICIO_{n}")))
        .collect();

    let mut section = banner("AUDITED SERVICE / PROJECT (PRIMARY FOCUS):");
    section.push_str("All evidence and sampling must focus on:\n");
    section.push_str(&format!("👉 {primary}\n"));
    if !secondary.is_empty() {
        section.push_str("Other services of the company:\n");
        for service in secondary {
            section.push_str(&format!("   - {service}\n"));
        }
    }
    Some(section)
}

fn is_section_field(name: &str) -> bool {
    name == SCOPE_FIELD || SECTION_PREFIXES.iter().any(|p| name.starts_with(p))
}

fn company_fields_section(catalog: &FieldCatalog) -> Option<String> {
    let mut fields: Vec<(&str, String)> = catalog
        .statics()
        .filter(|f| !is_section_field(&f.name))
        .filter(|f| !f.raw_value.is_blank())
        .map(|f| (f.name.as_str(), f.text().trim().to_string()))
        .collect();

    if fields.is_empty() {
        return None;
    }
    fields.sort_by(|a, b| a.0.cmp(b.0));

    let mut section = banner("COMPANY DATA:");
    for (name, value) in fields {
        section.push_str(&format!("{name}: {value}\n"));
    }
    Some(section)
}

fn external_section(external_context: Option<&str>) -> Option<String> {
    let text = external_context.map(str::trim).filter(|t| !t.is_empty())?;
    let mut section = banner("ADDITIONAL COMPANY INFORMATION (use it to produce realistic content):");
    section.push('\n');
    section.push_str(text);
    section.push('\n');
    Some(section)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ConfigRow;
    use auditfill_sdk::types::CellValue;

    fn catalog(rows: &[(&str, &str)]) -> FieldCatalog {
        FieldCatalog::from_rows(
            rows.iter()
                .map(|(n, v)| ConfigRow::new(*n, CellValue::Text(v.to_string()), "")),
        )
    }

    fn assemble(rows: &[(&str, &str)]) -> String {
        let cat = catalog(rows);
        let standards = cat.audited_standards();
        ContextAssembler::default()
            .assemble(&standards, &cat, None)
            .to_string()
    }

    #[test]
    fn test_base_template_defaults() {
        let context = assemble(&[]);
        assert!(context.contains("AUDITED STANDARDS: Not specified"));
        assert!(context.contains("COMPANY: Not specified"));
        assert!(context.contains("RUC: Not specified"));
        assert!(!context.contains(RULE));
    }

    #[test]
    fn test_standards_are_bulleted() {
        let context = assemble(&[
            ("NORMA1", "ISO 9001:2015"),
            ("NORMA2", "ISO 45001:2018"),
            ("EMPRESA", "Acme"),
            ("RUC", "20123456789"),
        ]);
        assert!(context.contains("AUDITED STANDARDS: ISO 9001:2015\n   - ISO 45001:2018"));
        assert!(context.contains("COMPANY: Acme"));
        assert!(context.contains("RUC: 20123456789"));
    }

    #[test]
    fn test_compliance_requires_standard_and_officer() {
        let without_officer = assemble(&[
            ("NORMA1", "ISO 37001:2016"),
            ("FUNCION_CUMPLIMIENTO", "  "),
        ]);
        assert!(!without_officer.contains("COMPLIANCE FUNCTION"));

        let with_officer = assemble(&[
            ("NORMA1", "ISO 37001:2016"),
            ("FUNCION_CUMPLIMIENTO", "Jane Doe"),
            ("FC_CORREO", "jane@acme.test"),
        ]);
        assert!(with_officer.contains("COMPLIANCE FUNCTION"));
        assert!(with_officer.contains("Compliance officer: Jane Doe"));
        assert!(with_officer.contains("FC_CORREO: jane@acme.test"));

        let other_standard = assemble(&[
            ("NORMA1", "ISO 9001:2015"),
            ("FUNCION_CUMPLIMIENTO", "Jane Doe"),
        ]);
        assert!(!other_standard.contains("COMPLIANCE FUNCTION"));
    }

    #[test]
    fn test_roster_probe_stops_at_first_gap() {
        let context = assemble(&[
            ("PROCESO_1", "Compras"),
            ("RESPONSABLE_PROC_1", "Jefe de compras"),
            ("CANTPROC_1", "4"),
            ("PROCESO_2", ""),
            ("PROCESO_3", "Ventas"),
            ("PROCESO_5", "Unreachable"),
        ]);
        assert!(context.contains("1. Compras\n   Responsible role: Jefe de compras\n   Headcount: 4"));
        assert!(context.contains("3. Ventas"));
        assert!(!context.contains("Unreachable"));
    }

    #[test]
    fn test_sections_in_fixed_order() {
        let context = assemble(&[
            ("ZONA", "Lima"),
            ("SERVICIO_1", "Mantenimiento"),
            ("ALCANCE", "Todo el SIG"),
            ("DOC_MANUAL", "Manual SIG v3"),
            ("PROCESO_1", "Compras"),
        ]);

        let positions: Vec<usize> = [
            "Manual SIG v3",
            "AUDIT SCOPE",
            "AUDITED PROCESSES",
            "PRIMARY FOCUS",
            "ZONA: Lima",
        ]
        .iter()
        .map(|needle| context.find(needle).unwrap())
        .collect();

        let mut sorted = positions.clone();
        sorted.sort_unstable();
        assert_eq!(positions, sorted);
    }

    #[test]
    fn test_focus_service_requires_primary() {
        let secondary_only = assemble(&[("SERVICIO_2", "Limpieza"), ("SERVICIO_1", " ")]);
        assert!(!secondary_only.contains("PRIMARY FOCUS"));
        assert!(!secondary_only.contains("Limpieza"));

        let both = assemble(&[("SERVICIO_1", "Mantenimiento"), ("SERVICIO_3", "Limpieza")]);
        assert!(both.contains("PRIMARY FOCUS"));
        assert!(both.contains("👉 Mantenimiento\nOther services of the company:\n   - Limpieza\n"));
    }

    #[test]
    fn test_company_fields_exclude_section_fields() {
        let context = assemble(&[
            ("ZONA", "Lima"),
            ("DIRECCION", "Av. Siempre Viva 123"),
            ("DOC_MANUAL", "Manual"),
            ("CLAUSULA_4", "Contexto"),
            ("ALCANCE", "Todo"),
            ("VACIO", ""),
        ]);

        let data = &context[context.find("COMPANY DATA:").unwrap()..];
        assert!(data.contains("DIRECCION: Av. Siempre Viva 123\nZONA: Lima"));
        assert!(!data.contains("DOC_MANUAL"));
        assert!(!data.contains("CLAUSULA_4"));
        assert!(!data.contains("ALCANCE"));
        assert!(!data.contains("VACIO"));
    }

    #[test]
    fn test_external_context_is_last() {
        let cat = catalog(&[("ZONA", "Lima")]);
        let context = ContextAssembler::default().assemble(&[], &cat, Some("Organigrama"));
        let text = context.as_str();
        assert!(text.trim_end().ends_with("Organigrama"));
        assert!(text.find("ZONA: Lima").unwrap() < text.find("Organigrama").unwrap());
    }

    #[test]
    fn test_missing_prompt_file_falls_back() {
        let assembler =
            ContextAssembler::from_prompt_file(Some(Path::new("/nonexistent/auditfill/prompt.txt")));
        let context = assembler.assemble(&[], &FieldCatalog::default(), None);
        assert!(context.as_str().contains("expert auditor"));
    }
}

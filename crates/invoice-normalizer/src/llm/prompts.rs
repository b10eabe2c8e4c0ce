//! Prompt templates for LLM interactions.

use crate::schema::FieldSpec;

/// System prompt for mapping requests.
pub fn mapping_system_prompt() -> &'static str {
    "You are an assistant that maps client spreadsheet columns to a standard export invoice format. \
     You answer with JSON only."
}

/// System prompt for unit requests.
pub fn unit_system_prompt() -> &'static str {
    "You are an assistant that determines the customs unit of measure based on HS codes."
}

/// Build a prompt asking which unassigned headers feed which missing fields.
pub fn mapping_prompt(headers: &[String], fields: &[&FieldSpec]) -> String {
    let header_list = headers
        .iter()
        .map(|h| format!("  - \"{}\"", h))
        .collect::<Vec<_>>()
        .join("\n");

    let field_list = fields
        .iter()
        .map(|f| {
            if f.aliases.is_empty() {
                format!("  - {} ({})", f.name, f.field_type)
            } else {
                format!(
                    "  - {} ({}), also written as: {}",
                    f.name,
                    f.field_type,
                    f.aliases.join(", ")
                )
            }
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"A client invoice spreadsheet has these columns that could not be matched automatically:
{}

The standard invoice still needs these fields:
{}

Different customers use different names for the same data. Pair each column with the
standard field it most likely holds. Leave out columns that match nothing. Use each
column and each field at most once.

Respond with a JSON array:
[
  {{"header": "source column", "field": "standard field", "confidence": 0.0-1.0}}
]"#,
        header_list, field_list
    )
}

/// Build a prompt asking for the customs unit of an HS code.
pub fn unit_prompt(hs_code: &str) -> String {
    format!(
        "Given the HS Code: {}, determine the appropriate Customs Unit of Measure \
         (e.g., Dozen (DOZ), Number (NUM), Kilogram (KG)).\n\n\
         Provide only the unit abbreviation (e.g., DOZ, NUM).",
        hs_code
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldType;

    #[test]
    fn test_mapping_prompt_lists_headers_and_fields() {
        let field = FieldSpec::new("Total Amount", FieldType::Currency).with_aliases(["Amount US$"]);
        let prompt = mapping_prompt(&["Valeur".to_string()], &[&field]);

        assert!(prompt.contains("\"Valeur\""));
        assert!(prompt.contains("Total Amount (currency), also written as: Amount US$"));
    }
}

//! JSON output format implementation

use serde_json::json;

use super::SchemaEmitter;
use crate::schema::StructRecord;

/// One pretty-printed JSON object per struct
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonEmitter;

impl SchemaEmitter for JsonEmitter {
    fn extension(&self) -> &'static str {
        "json"
    }

    fn render(&self, record: &StructRecord) -> String {
        let value = json!({
            "name": record.name,
            "fields": record.fields,
            "fixed_size": record.fixed_size(),
        });
        serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldKind;

    #[test]
    fn test_render_json() {
        let record = StructRecord {
            name: "tb_Quest".to_string(),
            fields: vec![FieldKind::UInt32, FieldKind::UInt8],
        };
        let value: serde_json::Value = serde_json::from_str(&JsonEmitter.render(&record)).unwrap();

        assert_eq!(value["name"], "tb_Quest");
        assert_eq!(value["fields"], json!(["uint32", "uint8"]));
        assert_eq!(value["fixed_size"], 5);
    }

    #[test]
    fn test_fixed_size_null_with_strings() {
        let record = StructRecord {
            name: "tb_Text".to_string(),
            fields: vec![FieldKind::String],
        };
        let value: serde_json::Value = serde_json::from_str(&JsonEmitter.render(&record)).unwrap();
        assert!(value["fixed_size"].is_null());
    }
}

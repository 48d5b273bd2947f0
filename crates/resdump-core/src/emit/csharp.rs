//! C# class output, one auto-property per field.

use super::SchemaEmitter;
use crate::schema::{FieldKind, StructRecord};

pub const DEFAULT_NAMESPACE: &str = "Common.Resources.Tables.Definitions";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CSharpEmitter {
    namespace: String,
}

impl CSharpEmitter {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    pub fn type_name(kind: FieldKind) -> &'static str {
        match kind {
            FieldKind::UInt8 => "byte",
            FieldKind::Int16 => "short",
            FieldKind::UInt16 => "ushort",
            FieldKind::Int32 => "int",
            FieldKind::UInt32 => "uint",
            FieldKind::Single => "float",
            FieldKind::String => "string",
        }
    }
}

impl Default for CSharpEmitter {
    fn default() -> Self {
        Self::new(DEFAULT_NAMESPACE)
    }
}

impl SchemaEmitter for CSharpEmitter {
    fn extension(&self) -> &'static str {
        "cs"
    }

    fn render(&self, record: &StructRecord) -> String {
        let properties: String = record
            .fields
            .iter()
            .enumerate()
            .map(|(i, kind)| {
                format!(
                    "        public {} Unk{} {{ get; set; }}\n",
                    Self::type_name(*kind),
                    i
                )
            })
            .collect();

        format!(
            "namespace {}\n{{\n    public class {}\n    {{\n{}    }}\n}}",
            self.namespace, record.name, properties
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_class() {
        let record = StructRecord {
            name: "tb_Item".to_string(),
            fields: vec![
                FieldKind::UInt8,
                FieldKind::Int16,
                FieldKind::UInt16,
                FieldKind::Int32,
                FieldKind::UInt32,
                FieldKind::Single,
                FieldKind::String,
            ],
        };

        let expected = "\
namespace Common.Resources.Tables.Definitions
{
    public class tb_Item
    {
        public byte Unk0 { get; set; }
        public short Unk1 { get; set; }
        public ushort Unk2 { get; set; }
        public int Unk3 { get; set; }
        public uint Unk4 { get; set; }
        public float Unk5 { get; set; }
        public string Unk6 { get; set; }
    }
}";
        assert_eq!(CSharpEmitter::default().render(&record), expected);
    }

    #[test]
    fn test_custom_namespace_and_empty_struct() {
        let record = StructRecord::new("tb_Empty");
        let rendered = CSharpEmitter::new("Game.Tables").render(&record);
        assert_eq!(
            rendered,
            "namespace Game.Tables\n{\n    public class tb_Empty\n    {\n    }\n}"
        );
    }
}

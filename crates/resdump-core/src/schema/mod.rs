//! Recovered struct definitions.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// Primitive field types the reader functions can produce
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumIter,
    EnumString,
    IntoStaticStr,
    Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FieldKind {
    #[strum(serialize = "uint8")]
    #[serde(rename = "uint8")]
    UInt8,
    #[strum(serialize = "int16")]
    #[serde(rename = "int16")]
    Int16,
    #[strum(serialize = "uint16")]
    #[serde(rename = "uint16")]
    UInt16,
    #[strum(serialize = "int32")]
    #[serde(rename = "int32")]
    Int32,
    #[strum(serialize = "uint32")]
    #[serde(rename = "uint32")]
    UInt32,
    Single,
    String,
}

impl FieldKind {
    /// Size of the value as stored in the resource file; strings are variable
    pub fn byte_size(&self) -> Option<usize> {
        match self {
            Self::UInt8 => Some(1),
            Self::Int16 | Self::UInt16 => Some(2),
            Self::Int32 | Self::UInt32 | Self::Single => Some(4),
            Self::String => None,
        }
    }

    pub fn name(&self) -> &'static str {
        self.into()
    }
}

/// One struct recovered from the instruction stream.
///
/// `fields` is in call order, which is the order the fields are stored in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructRecord {
    pub name: String,
    pub fields: Vec<FieldKind>,
}

impl StructRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Fixed part of the record size, or `None` if any field is a string
    pub fn fixed_size(&self) -> Option<usize> {
        self.fields.iter().map(FieldKind::byte_size).sum()
    }
}

/// Ordered, append-only log of sealed structs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaModel {
    records: Vec<StructRecord>,
}

impl SchemaModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, record: StructRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&StructRecord> {
        self.records.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, StructRecord> {
        self.records.iter()
    }

    pub fn into_records(self) -> Vec<StructRecord> {
        self.records
    }
}

impl<'a> IntoIterator for &'a SchemaModel {
    type Item = &'a StructRecord;
    type IntoIter = std::slice::Iter<'a, StructRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_kind_names() {
        assert_eq!(FieldKind::UInt8.name(), "uint8");
        assert_eq!(FieldKind::Single.to_string(), "single");
        assert_eq!("uint16".parse::<FieldKind>().unwrap(), FieldKind::UInt16);
        assert_eq!(serde_json::to_string(&FieldKind::Int32).unwrap(), "\"int32\"");
        assert_eq!(serde_json::to_string(&FieldKind::String).unwrap(), "\"string\"");
    }

    #[test]
    fn test_fixed_size() {
        let mut record = StructRecord::new("tb_Item");
        record.fields = vec![FieldKind::UInt32, FieldKind::UInt8, FieldKind::Int16];
        assert_eq!(record.fixed_size(), Some(7));

        record.fields.push(FieldKind::String);
        assert_eq!(record.fixed_size(), None);
    }

    #[test]
    fn test_model_preserves_insertion_order() {
        let mut model = SchemaModel::new();
        assert!(model.is_empty());
        model.push(StructRecord::new("B"));
        model.push(StructRecord::new("A"));
        model.push(StructRecord::new("B"));

        let names: Vec<&str> = model.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["B", "A", "B"]);
        assert_eq!(model.len(), 3);
        assert_eq!(model.get(1).map(|r| r.name.as_str()), Some("A"));
    }

    #[test]
    fn test_model_serializes_as_list() {
        let mut model = SchemaModel::new();
        let mut record = StructRecord::new("tb_Skill");
        record.fields = vec![FieldKind::UInt8, FieldKind::Single];
        model.push(record);

        let json = serde_json::to_string(&model).unwrap();
        assert_eq!(json, r#"[{"name":"tb_Skill","fields":["uint8","single"]}]"#);
    }
}

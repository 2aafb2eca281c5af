// Minimal tuple and schema value types consumed by the heap access method
// and the statistics layer. Query-side value semantics live elsewhere.

use std::fmt;
use byteorder::{ByteOrder, LittleEndian};

use crate::common::types::PageId;

/// Serialized width of a text field payload, excluding the length prefix.
pub const STRING_LEN: usize = 128;

/// Possible field types for values in a tuple
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Int,
    Text,
}

impl FieldType {
    /// On-page width of a field of this type.
    pub fn byte_len(self) -> usize {
        match self {
            FieldType::Int => 4,
            FieldType::Text => 4 + STRING_LEN,
        }
    }
}

/// A single field value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field {
    Int(i32),
    Text(String),
}

impl Field {
    pub fn field_type(&self) -> FieldType {
        match self {
            Field::Int(_) => FieldType::Int,
            Field::Text(_) => FieldType::Text,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Int(v) => write!(f, "{}", v),
            Field::Text(s) => write!(f, "\"{}\"", s),
        }
    }
}

/// Comparison operators used by selectivity estimation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

/// Ordered list of field types describing one table's tuples. All tuples of
/// a table serialize to the same number of bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    fields: Vec<FieldType>,
}

impl Schema {
    pub fn new(fields: Vec<FieldType>) -> Self {
        Self { fields }
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    pub fn field_type(&self, index: usize) -> FieldType {
        self.fields[index]
    }

    /// Serialized width of one tuple under this schema.
    pub fn tuple_size(&self) -> usize {
        self.fields.iter().map(|f| f.byte_len()).sum()
    }

    /// Whether `tuple` can be stored under this schema: arity and field
    /// types match, and text payloads fit their fixed slot.
    pub fn matches(&self, tuple: &Tuple) -> bool {
        if tuple.values.len() != self.fields.len() {
            return false;
        }
        self.fields.iter().zip(tuple.values.iter()).all(|(ft, v)| {
            v.field_type() == *ft
                && match v {
                    Field::Text(s) => s.len() <= STRING_LEN,
                    Field::Int(_) => true,
                }
        })
    }
}

/// Identity of a stored tuple: the page holding it and the slot within that
/// page. Set on insert, consumed by delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordId {
    pub page_id: PageId,
    pub slot: usize,
}

/// A tuple: field values plus the record id of its stored location, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tuple {
    values: Vec<Field>,
    record_id: Option<RecordId>,
}

impl Tuple {
    pub fn new(values: Vec<Field>) -> Self {
        Self {
            values,
            record_id: None,
        }
    }

    pub fn field(&self, index: usize) -> &Field {
        &self.values[index]
    }

    pub fn values(&self) -> &[Field] {
        &self.values
    }

    pub fn record_id(&self) -> Option<RecordId> {
        self.record_id
    }

    pub fn set_record_id(&mut self, rid: Option<RecordId>) {
        self.record_id = rid;
    }

    /// Serialize to the fixed on-page representation. The caller is expected
    /// to have checked `schema.matches` first.
    pub fn to_bytes(&self, schema: &Schema) -> Vec<u8> {
        let mut bytes = vec![0u8; schema.tuple_size()];
        let mut offset = 0;
        for value in &self.values {
            match value {
                Field::Int(v) => {
                    LittleEndian::write_i32(&mut bytes[offset..offset + 4], *v);
                }
                Field::Text(s) => {
                    let payload = s.as_bytes();
                    let len = payload.len().min(STRING_LEN);
                    LittleEndian::write_u32(&mut bytes[offset..offset + 4], len as u32);
                    bytes[offset + 4..offset + 4 + len].copy_from_slice(&payload[..len]);
                }
            }
            offset += value.field_type().byte_len();
        }
        bytes
    }

    /// Decode a tuple from its fixed on-page representation.
    pub fn from_bytes(schema: &Schema, bytes: &[u8]) -> Self {
        let mut values = Vec::with_capacity(schema.field_count());
        let mut offset = 0;
        for i in 0..schema.field_count() {
            let field_type = schema.field_type(i);
            match field_type {
                FieldType::Int => {
                    values.push(Field::Int(LittleEndian::read_i32(&bytes[offset..offset + 4])));
                }
                FieldType::Text => {
                    let len = LittleEndian::read_u32(&bytes[offset..offset + 4]) as usize;
                    let len = len.min(STRING_LEN);
                    let raw = &bytes[offset + 4..offset + 4 + len];
                    values.push(Field::Text(String::from_utf8_lossy(raw).into_owned()));
                }
            }
            offset += field_type.byte_len();
        }
        Self {
            values,
            record_id: None,
        }
    }
}

//! Response messages and their assembly into complete responses.

use super::metadata::{FailureMetadata, SuccessMetadata};
use super::signature;
use crate::bolt::error::{BoltError, BoltErrorKind, BoltResult};
use crate::packstream::{
    FieldReader, FieldWriter, PackStreamResult, PackStreamStructure, StructureDecode,
    StructureEncode, Value,
};

// ==================== Wire messages ====================

/// One row of a result stream.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub fields: Vec<Value>,
}

impl PackStreamStructure for Record {
    const SIGNATURE: u8 = signature::RECORD;
}

impl StructureEncode for Record {
    fn encode_fields(&self, fields: &mut FieldWriter) -> PackStreamResult<()> {
        fields.write_value(Value::List(self.fields.clone()));
        Ok(())
    }
}

impl StructureDecode for Record {
    const FIELD_COUNT: usize = 1;

    fn decode_fields(fields: &mut FieldReader) -> PackStreamResult<Self> {
        Ok(Self {
            fields: fields.read_value()?.into_list()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Success {
    pub metadata: SuccessMetadata,
}

impl PackStreamStructure for Success {
    const SIGNATURE: u8 = signature::SUCCESS;
}

impl StructureEncode for Success {
    fn encode_fields(&self, fields: &mut FieldWriter) -> PackStreamResult<()> {
        fields.write(&self.metadata)
    }
}

impl StructureDecode for Success {
    const FIELD_COUNT: usize = 1;

    fn decode_fields(fields: &mut FieldReader) -> PackStreamResult<Self> {
        Ok(Self {
            metadata: fields.read()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Failure {
    pub metadata: FailureMetadata,
}

impl PackStreamStructure for Failure {
    const SIGNATURE: u8 = signature::FAILURE;
}

impl StructureEncode for Failure {
    fn encode_fields(&self, fields: &mut FieldWriter) -> PackStreamResult<()> {
        fields.write(&self.metadata)
    }
}

impl StructureDecode for Failure {
    const FIELD_COUNT: usize = 1;

    fn decode_fields(fields: &mut FieldReader) -> PackStreamResult<Self> {
        Ok(Self {
            metadata: fields.read()?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ignored;

impl PackStreamStructure for Ignored {
    const SIGNATURE: u8 = signature::IGNORED;
}

impl StructureEncode for Ignored {
    fn encode_fields(&self, _fields: &mut FieldWriter) -> PackStreamResult<()> {
        Ok(())
    }
}

impl StructureDecode for Ignored {
    const FIELD_COUNT: usize = 0;

    fn decode_fields(_fields: &mut FieldReader) -> PackStreamResult<Self> {
        Ok(Ignored)
    }
}

// ==================== Complete responses ====================

/// The message that ends a response.
#[derive(Debug, Clone, PartialEq)]
pub enum Summary {
    Success(SuccessMetadata),
    Failure(FailureMetadata),
    Ignored,
}

impl Summary {
    pub fn has_more(&self) -> bool {
        matches!(self, Summary::Success(metadata) if metadata.has_more())
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Summary::Success(_))
    }

    pub fn qid(&self) -> Option<i64> {
        match self {
            Summary::Success(metadata) => metadata.qid,
            _ => None,
        }
    }
}

/// Zero or more records followed by exactly one summary.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub records: Vec<Vec<Value>>,
    pub summary: Summary,
}

impl Response {
    pub fn into_metadata(self) -> BoltResult<SuccessMetadata> {
        self.into_records_and_metadata().map(|(_, metadata)| metadata)
    }

    pub fn into_records_and_metadata(self) -> BoltResult<(Vec<Vec<Value>>, SuccessMetadata)> {
        match self.summary {
            Summary::Success(metadata) => Ok((self.records, metadata)),
            Summary::Failure(FailureMetadata { code, message }) => {
                Err(BoltError::new(BoltErrorKind::Failed { code, message }))
            }
            Summary::Ignored => Err(BoltError::new(BoltErrorKind::Ignored)),
        }
    }
}

/// Groups decoded response messages into complete responses.
#[derive(Debug, Default)]
pub struct ResponseAssembler {
    records: Vec<Vec<Value>>,
}

impl ResponseAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes one decoded message. Returns the complete response once a
    /// summary arrives; the record buffer is empty afterwards.
    pub fn push(&mut self, message: Value) -> BoltResult<Option<Response>> {
        let structure = match message {
            Value::Structure(structure) => structure,
            other => {
                return Err(BoltError::with_detail(
                    BoltErrorKind::NotValidResponse,
                    format!("expected a structure, found {}", other.type_name()),
                ))
            }
        };

        let summary = match structure.signature {
            signature::RECORD => {
                self.records.push(Record::from_structure(structure)?.fields);
                return Ok(None);
            }
            signature::SUCCESS => Summary::Success(Success::from_structure(structure)?.metadata),
            signature::FAILURE => Summary::Failure(Failure::from_structure(structure)?.metadata),
            signature::IGNORED => {
                Ignored::from_structure(structure)?;
                Summary::Ignored
            }
            other => {
                return Err(BoltError::with_detail(
                    BoltErrorKind::NotValidResponse,
                    format!("unknown response signature 0x{:02X}", other),
                ))
            }
        };

        Ok(Some(Response {
            records: std::mem::take(&mut self.records),
            summary,
        }))
    }

    pub fn buffered_records(&self) -> usize {
        self.records.len()
    }
}

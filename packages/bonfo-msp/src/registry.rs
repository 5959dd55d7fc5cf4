//! Mapping from message codes to versioned payload schemas.

use alloc::{collections::BTreeMap, vec::Vec};
use core::fmt;
use thiserror::Error;

use crate::{
    decode::DecodeError,
    field::{Field, Record, WireType},
    schemas,
    version::ProtocolVersion,
};

/// The operations a message schema supports.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Capability {
    ReadOnly,
    WriteOnly,
    ReadWrite,
}

impl Capability {
    pub const fn allows(self, access: Access) -> bool {
        matches!(
            (self, access),
            (Capability::ReadWrite, _)
                | (Capability::ReadOnly, Access::Read)
                | (Capability::WriteOnly, Access::Write)
        )
    }
}

/// An operation requested against a schema.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Access {
    Read,
    Write,
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Access::Read => "read",
            Access::Write => "write",
        })
    }
}

/// A logical field group: the fields it carries and the codes used to read and write it.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Schema {
    pub name: &'static str,
    pub get_code: Option<u16>,
    pub set_code: Option<u16>,
    pub fields: &'static [Field],
}

impl Schema {
    pub const fn read_only(name: &'static str, code: u16, fields: &'static [Field]) -> Self {
        Self {
            name,
            get_code: Some(code),
            set_code: None,
            fields,
        }
    }

    pub const fn write_only(name: &'static str, code: u16, fields: &'static [Field]) -> Self {
        Self {
            name,
            get_code: None,
            set_code: Some(code),
            fields,
        }
    }

    pub const fn read_write(
        name: &'static str,
        get_code: u16,
        set_code: u16,
        fields: &'static [Field],
    ) -> Self {
        Self {
            name,
            get_code: Some(get_code),
            set_code: Some(set_code),
            fields,
        }
    }

    pub const fn capability(&self) -> Capability {
        match (self.get_code, self.set_code) {
            (Some(_), Some(_)) => Capability::ReadWrite,
            (None, Some(_)) => Capability::WriteOnly,
            _ => Capability::ReadOnly,
        }
    }

    /// Returns the code that performs `access` on this schema.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Direction`] if the schema does not support `access`.
    pub fn code_for(&self, access: Access) -> Result<u16, RegistryError> {
        match access {
            Access::Read => self.get_code,
            Access::Write => self.set_code,
        }
        .ok_or(RegistryError::Direction {
            schema: self.name,
            access,
            capability: self.capability(),
        })
    }

    /// Decodes `payload` as seen from a device speaking `version`.
    ///
    /// Fields introduced after `version` consume nothing and take their
    /// default. Bytes after the last known field are ignored.
    pub fn decode(&self, mut payload: &[u8], version: ProtocolVersion) -> Result<Record, RegistryError> {
        let mut record = Record::new();

        for field in self.fields {
            let value = if field.is_present(version) {
                field.decode(&mut payload)?
            } else {
                field.default_value()
            };
            record.set(field.name, value);
        }

        Ok(record)
    }

    /// Encodes `record` for a device speaking `version`.
    ///
    /// Fields introduced after `version` are left out even when the record
    /// holds a value for them. Fields missing from the record are sent as
    /// their default.
    pub fn encode(&self, record: &Record, version: ProtocolVersion) -> Result<Vec<u8>, RegistryError> {
        let mut out = Vec::new();

        for field in self.fields.iter().filter(|f| f.is_present(version)) {
            match record.get(field.name) {
                Some(value) => field.encode(value, &mut out)?,
                None => field.encode(&field.default_value(), &mut out)?,
            }
        }

        Ok(out)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("No schema is registered for message code {0}.")]
    UnknownCode(u16),

    #[error("Message code {0} is already registered.")]
    DuplicateCode(u16),

    #[error("Schema `{schema}` is {capability:?} and cannot be used for a {access}.")]
    Direction {
        schema: &'static str,
        access: Access,
        capability: Capability,
    },

    #[error("Field `{field}` holds a value that cannot be encoded as {expected:?}.")]
    TypeMismatch {
        field: &'static str,
        expected: WireType,
    },

    #[error("Field `{field}` is {len} bytes long, which exceeds its maximum of {max}.")]
    ValueTooLarge {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("Field `{field}` holds {len} items but its wire type requires {expected}.")]
    LengthMismatch {
        field: &'static str,
        len: usize,
        expected: usize,
    },

    #[error("Value {value} is out of range for field `{field}`.")]
    OutOfRange { field: &'static str, value: u32 },

    #[error("Record has no usable value for field `{0}`.")]
    MissingField(&'static str),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Lookup table from message code to [`Schema`].
///
/// Both the get and set code of a schema resolve to it, so a reply to either
/// can be decoded.
#[derive(Debug, Default, Clone)]
pub struct Registry {
    schemas: BTreeMap<u16, &'static Schema>,
}

impl Registry {
    /// Creates an empty registry.
    pub const fn new() -> Self {
        Self {
            schemas: BTreeMap::new(),
        }
    }

    /// Creates a registry holding every schema declared in [`schemas`].
    pub fn standard() -> Self {
        let mut registry = Self::new();
        for schema in schemas::ALL {
            registry.register(schema);
        }
        registry
    }

    /// Registers a schema under its get and set codes.
    ///
    /// # Panics
    ///
    /// Panics if either code is already registered. Use [`Registry::try_register`]
    /// for schemas that are not known at compile time.
    pub fn register(&mut self, schema: &'static Schema) {
        if let Err(err) = self.try_register(schema) {
            panic!("{err}");
        }
    }

    /// Registers a schema under its get and set codes.
    ///
    /// Nothing is registered if either code is taken.
    pub fn try_register(&mut self, schema: &'static Schema) -> Result<(), RegistryError> {
        let codes = [schema.get_code, schema.set_code];

        for code in codes.into_iter().flatten() {
            if self.schemas.contains_key(&code) {
                return Err(RegistryError::DuplicateCode(code));
            }
        }
        for code in codes.into_iter().flatten() {
            self.schemas.insert(code, schema);
        }

        Ok(())
    }

    pub fn schema(&self, code: u16) -> Result<&'static Schema, RegistryError> {
        self.schemas
            .get(&code)
            .copied()
            .ok_or(RegistryError::UnknownCode(code))
    }

    /// The capability of the schema registered under `code`.
    pub fn direction(&self, code: u16) -> Result<Capability, RegistryError> {
        Ok(self.schema(code)?.capability())
    }

    pub fn decode(
        &self,
        code: u16,
        payload: &[u8],
        version: ProtocolVersion,
    ) -> Result<Record, RegistryError> {
        self.schema(code)?.decode(payload, version)
    }

    pub fn encode(
        &self,
        code: u16,
        record: &Record,
        version: ProtocolVersion,
    ) -> Result<Vec<u8>, RegistryError> {
        self.schema(code)?.encode(record, version)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

// rust/stream-core/src/tape/mod.rs

//! Position tapes for checkpointing iteration state.
//!
//! A [`Tape`] is a sequential log of tagged primitive values. A data source
//! records the minimum state it needs to resume into a tape, and reloads it
//! later by reading the same values back in the same order. Reads are typed:
//! asking for an integer where a string was recorded, or reading past the last
//! value, fails with `TapeMismatch` instead of coercing.
//!
//! # Example
//!
//! ```
//! use stream_core::tape::Tape;
//!
//! let mut tape = Tape::new();
//! tape.record(42_i64);
//! tape.record("lf".to_string());
//!
//! tape.rewind();
//! assert_eq!(tape.read::<i64>().unwrap(), 42);
//! assert_eq!(tape.read::<String>().unwrap(), "lf");
//! assert!(tape.read::<i64>().is_err());
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{Result, RuntimeError};

/// A single value stored on a tape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TapeValue {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
}

impl TapeValue {
    /// Name of the value kind, used in mismatch errors.
    pub fn kind(&self) -> &'static str {
        match self {
            TapeValue::Bool(_) => "bool",
            TapeValue::Int(_) => "int",
            TapeValue::UInt(_) => "uint",
            TapeValue::Float(_) => "float",
            TapeValue::String(_) => "string",
            TapeValue::Bytes(_) => "bytes",
        }
    }
}

/// Types that can be recorded on and read back from a [`Tape`].
pub trait TapeData: Sized {
    /// Kind name matching [`TapeValue::kind`].
    const KIND: &'static str;

    fn into_value(self) -> TapeValue;

    /// Returns the value back unchanged if it is not of this kind.
    fn from_value(value: TapeValue) -> std::result::Result<Self, TapeValue>;
}

macro_rules! impl_tape_data {
    ($ty:ty, $variant:ident, $kind:literal) => {
        impl TapeData for $ty {
            const KIND: &'static str = $kind;

            fn into_value(self) -> TapeValue {
                TapeValue::$variant(self)
            }

            fn from_value(value: TapeValue) -> std::result::Result<Self, TapeValue> {
                match value {
                    TapeValue::$variant(v) => Ok(v),
                    other => Err(other),
                }
            }
        }
    };
}

impl_tape_data!(bool, Bool, "bool");
impl_tape_data!(i64, Int, "int");
impl_tape_data!(u64, UInt, "uint");
impl_tape_data!(f64, Float, "float");
impl_tape_data!(String, String, "string");
impl_tape_data!(Vec<u8>, Bytes, "bytes");

/// Sequential, typed value log used to record and reload positions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tape {
    values: Vec<TapeValue>,
    #[serde(skip)]
    cursor: usize,
}

impl Tape {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a value.
    pub fn record<T: TapeData>(&mut self, value: T) {
        self.values.push(value.into_value());
    }

    /// Reads the next value, which must be of type `T`.
    ///
    /// # Errors
    ///
    /// Returns `TapeMismatch` if the tape is exhausted or the next value has
    /// a different kind. The cursor does not advance on failure.
    pub fn read<T: TapeData>(&mut self) -> Result<T> {
        let index = self.cursor;
        let value = self
            .values
            .get(index)
            .cloned()
            .ok_or_else(|| RuntimeError::tape_mismatch(index, T::KIND, "end of tape"))?;

        let value = T::from_value(value)
            .map_err(|other| RuntimeError::tape_mismatch(index, T::KIND, other.kind()))?;

        self.cursor += 1;
        Ok(value)
    }

    /// Moves the read cursor back to the first value.
    pub fn rewind(&mut self) {
        self.cursor = 0;
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of values not yet read.
    pub fn remaining(&self) -> usize {
        self.values.len() - self.cursor
    }

    pub fn values(&self) -> &[TapeValue] {
        &self.values
    }

    /// Serializes the recorded values. The read cursor is not persisted.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| RuntimeError::serialization(format!("failed to encode tape: {e}")))
    }

    /// Restores a tape written by [`to_bytes`](Self::to_bytes), positioned at
    /// its first value.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        bincode::deserialize(data)
            .map_err(|e| RuntimeError::serialization(format!("failed to decode tape: {e}")))
    }
}

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::scalar::{layout_size, ScalarType};

/// An addressable, typed device variable.
///
/// Identity is the register id: two registers with the same id compare
/// equal regardless of their layouts.
#[derive(Debug, Clone)]
pub struct Register {
    pub name: String,
    pub id: u8,
    /// Field layout of values the device reports for this register.
    pub read_types: Vec<ScalarType>,
    /// Field layout of values the host may write.
    pub write_types: Vec<ScalarType>,
}

impl Register {
    pub fn new(
        name: impl Into<String>,
        id: u8,
        read_types: Vec<ScalarType>,
        write_types: Vec<ScalarType>,
    ) -> Self {
        Self {
            name: name.into(),
            id,
            read_types,
            write_types,
        }
    }

    pub fn read_size(&self) -> usize {
        layout_size(&self.read_types)
    }

    pub fn write_size(&self) -> usize {
        layout_size(&self.write_types)
    }

    pub fn is_readable(&self) -> bool {
        !self.read_types.is_empty()
    }

    pub fn is_writable(&self) -> bool {
        !self.write_types.is_empty()
    }

    /// Name without the `REG_` prefix.
    pub fn short_name(&self) -> &str {
        self.name.strip_prefix("REG_").unwrap_or(&self.name)
    }

    /// Same register id with a different outbound layout.
    ///
    /// Used for registers whose write payload length depends on the call,
    /// such as the telemetry register list.
    pub fn with_write_types(&self, write_types: Vec<ScalarType>) -> Arc<Register> {
        Arc::new(Register {
            write_types,
            ..self.clone()
        })
    }
}

impl PartialEq for Register {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Register {}

impl Hash for Register {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Normalise a register name to its canonical `REG_UPPER` form.
pub fn canonical_name(name: &str) -> String {
    let upper = name.trim().to_ascii_uppercase();
    if upper.starts_with("REG_") {
        upper
    } else {
        format!("REG_{upper}")
    }
}

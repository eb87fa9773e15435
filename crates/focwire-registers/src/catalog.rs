use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, OnceLock};

use tracing::{debug, warn};

use crate::builtin::BUILTIN_REGISTERS;
use crate::error::{RegisterError, Result};
use crate::register::{canonical_name, Register};
use crate::scalar::ScalarType;

/// Id- and name-keyed table of known registers.
///
/// Built once, extended with [`Catalog::add`] before use, then shared
/// read-only as `Arc<Catalog>`. There is no removal.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    by_id: BTreeMap<u8, Arc<Register>>,
    by_name: HashMap<String, u8>,
}

/// Any of the ways callers name a register.
///
/// [`Catalog::parse`] is the only place these are resolved.
#[derive(Debug, Clone)]
pub enum RegisterRef {
    Register(Arc<Register>),
    Id(u8),
    Name(String),
}

impl Catalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a catalog holding the firmware's standard registers.
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        for (name, id, read, write) in BUILTIN_REGISTERS {
            let read = ScalarType::parse_tags(read).unwrap_or_default();
            let write = ScalarType::parse_tags(write).unwrap_or_default();
            catalog.insert(Register::new(*name, *id, read, write));
        }
        catalog
    }

    /// Process-wide catalog of built-in registers.
    ///
    /// Applications that declare custom registers build their own catalog
    /// with [`Catalog::builtin`] and [`Catalog::add`] instead.
    pub fn global() -> Arc<Catalog> {
        static GLOBAL: OnceLock<Arc<Catalog>> = OnceLock::new();
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(Catalog::builtin())))
    }

    /// Declare a new register.
    ///
    /// Fails without modifying the catalog if either the id or the
    /// (canonicalised) name already exists.
    pub fn add(
        &mut self,
        name: &str,
        id: u8,
        read_types: Vec<ScalarType>,
        write_types: Vec<ScalarType>,
    ) -> Result<Arc<Register>> {
        let name = canonical_name(name);
        if let Some(existing_id) = self.by_name.get(&name) {
            return Err(RegisterError::DuplicateRegistration {
                existing: name.clone(),
                name,
                id: *existing_id,
            });
        }
        if let Some(existing) = self.by_id.get(&id) {
            return Err(RegisterError::DuplicateRegistration {
                name,
                id,
                existing: existing.name.clone(),
            });
        }

        debug!(register = %name, id, "registering custom register");
        Ok(self.insert(Register::new(name, id, read_types, write_types)))
    }

    /// Declare a new register from tag strings such as `"f"` or `"if"`.
    pub fn add_tags(&mut self, name: &str, id: u8, read: &str, write: &str) -> Result<Arc<Register>> {
        let read_types = ScalarType::parse_tags(read)?;
        let write_types = ScalarType::parse_tags(write)?;
        self.add(name, id, read_types, write_types)
    }

    fn insert(&mut self, register: Register) -> Arc<Register> {
        let register = Arc::new(register);
        self.by_name.insert(register.name.clone(), register.id);
        self.by_id.insert(register.id, Arc::clone(&register));
        register
    }

    pub fn lookup_by_id(&self, id: u8) -> Option<Arc<Register>> {
        let found = self.by_id.get(&id).cloned();
        if found.is_none() {
            warn!(id = format_args!("0x{id:02X}"), "unknown register id");
        }
        found
    }

    /// Case-insensitive lookup; the `REG_` prefix is optional.
    pub fn lookup_by_name(&self, name: &str) -> Option<Arc<Register>> {
        self.by_name
            .get(&canonical_name(name))
            .and_then(|id| self.by_id.get(id))
            .cloned()
    }

    /// Resolve any register reference to the catalog's canonical entry.
    ///
    /// Strings are tried as `0x..` hex, then decimal, then as a name.
    pub fn parse(&self, reference: impl Into<RegisterRef>) -> Result<Arc<Register>> {
        match reference.into() {
            RegisterRef::Register(register) => Ok(register),
            RegisterRef::Id(id) => self
                .lookup_by_id(id)
                .ok_or_else(|| RegisterError::UnknownRegister(format!("0x{id:02X}"))),
            RegisterRef::Name(token) => self.parse_token(&token),
        }
    }

    fn parse_token(&self, token: &str) -> Result<Arc<Register>> {
        let token = token.trim();
        let unknown = || RegisterError::UnknownRegister(token.to_string());

        let numeric = if let Some(hex) = token
            .strip_prefix("0x")
            .or_else(|| token.strip_prefix("0X"))
        {
            Some(u8::from_str_radix(hex, 16).map_err(|_| unknown())?)
        } else if !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit()) {
            Some(token.parse::<u8>().map_err(|_| unknown())?)
        } else {
            None
        };

        match numeric {
            Some(id) => self.lookup_by_id(id).ok_or_else(unknown),
            None => self.lookup_by_name(token).ok_or_else(unknown),
        }
    }

    pub fn contains_id(&self, id: u8) -> bool {
        self.by_id.contains_key(&id)
    }

    /// Registers in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Register>> {
        self.by_id.values()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

impl From<Arc<Register>> for RegisterRef {
    fn from(register: Arc<Register>) -> Self {
        RegisterRef::Register(register)
    }
}

impl From<&Arc<Register>> for RegisterRef {
    fn from(register: &Arc<Register>) -> Self {
        RegisterRef::Register(Arc::clone(register))
    }
}

impl From<u8> for RegisterRef {
    fn from(id: u8) -> Self {
        RegisterRef::Id(id)
    }
}

impl From<&str> for RegisterRef {
    fn from(token: &str) -> Self {
        RegisterRef::Name(token.to_string())
    }
}

impl From<String> for RegisterRef {
    fn from(token: String) -> Self {
        RegisterRef::Name(token)
    }
}

impl fmt::Display for RegisterRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegisterRef::Register(register) => write!(f, "{register}"),
            RegisterRef::Id(id) => write!(f, "0x{id:02X}"),
            RegisterRef::Name(name) => f.write_str(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin;

    #[test]
    fn builtin_table_is_consistent() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.len(), BUILTIN_REGISTERS.len());

        let target = catalog.lookup_by_id(builtin::TARGET).unwrap();
        assert_eq!(target.name, "REG_TARGET");
        assert_eq!(target.read_types, vec![ScalarType::Float32]);
        assert_eq!(target.write_types, vec![ScalarType::Float32]);

        let position = catalog.lookup_by_name("position").unwrap();
        assert_eq!(position.read_size(), 8);
    }

    #[test]
    fn lookup_by_name_is_case_insensitive_and_prefix_optional() {
        let catalog = Catalog::builtin();
        for name in ["REG_VELOCITY", "reg_velocity", "VELOCITY", "Velocity"] {
            assert_eq!(
                catalog.lookup_by_name(name).unwrap().id,
                builtin::VELOCITY,
                "{name}"
            );
        }
        assert!(catalog.lookup_by_name("REG_NOPE").is_none());
    }

    #[test]
    fn parse_accepts_every_reference_form() {
        let catalog = Catalog::builtin();
        let target = catalog.lookup_by_id(builtin::TARGET).unwrap();

        assert_eq!(catalog.parse(&target).unwrap().id, 0x08);
        assert_eq!(catalog.parse(0x08u8).unwrap().id, 0x08);
        assert_eq!(catalog.parse("0x08").unwrap().id, 0x08);
        assert_eq!(catalog.parse("8").unwrap().id, 0x08);
        assert_eq!(catalog.parse("target").unwrap().id, 0x08);
        assert_eq!(catalog.parse("REG_TARGET").unwrap().id, 0x08);
    }

    #[test]
    fn parse_rejects_unknown_references() {
        let catalog = Catalog::builtin();
        assert!(matches!(
            catalog.parse(0xEEu8),
            Err(RegisterError::UnknownRegister(_))
        ));
        assert!(matches!(
            catalog.parse("300"),
            Err(RegisterError::UnknownRegister(_))
        ));
        assert!(matches!(
            catalog.parse("0xZZ"),
            Err(RegisterError::UnknownRegister(_))
        ));
        assert!(matches!(
            catalog.parse("bogus"),
            Err(RegisterError::UnknownRegister(_))
        ));
    }

    #[test]
    fn add_custom_register() {
        let mut catalog = Catalog::builtin();
        let reg = catalog
            .add("REG_TEMPERATURE", 0xE0, vec![ScalarType::Float32], vec![])
            .unwrap();

        assert_eq!(reg.id, 0xE0);
        assert_eq!(catalog.parse("temperature").unwrap().id, 0xE0);
        assert_eq!(catalog.parse(0xE0u8).unwrap().name, "REG_TEMPERATURE");
    }

    #[test]
    fn add_duplicate_name_fails_and_leaves_catalog_unchanged() {
        let mut catalog = Catalog::builtin();
        catalog
            .add("REG_X", 0xE0, vec![ScalarType::Float32], vec![])
            .unwrap();
        let before = catalog.len();

        let err = catalog
            .add("REG_X", 0xE0, vec![ScalarType::Float32], vec![])
            .unwrap_err();

        assert!(matches!(err, RegisterError::DuplicateRegistration { .. }));
        assert_eq!(catalog.len(), before);
        assert_eq!(
            catalog.iter().filter(|r| r.name == "REG_X").count(),
            1
        );
    }

    #[test]
    fn add_duplicate_id_fails() {
        let mut catalog = Catalog::builtin();
        let err = catalog
            .add("REG_SHADOW_TARGET", builtin::TARGET, vec![], vec![])
            .unwrap_err();

        match err {
            RegisterError::DuplicateRegistration { existing, id, .. } => {
                assert_eq!(existing, "REG_TARGET");
                assert_eq!(id, builtin::TARGET);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(catalog.lookup_by_name("SHADOW_TARGET").is_none());
    }

    #[test]
    fn add_name_collision_ignores_prefix_and_case() {
        let mut catalog = Catalog::builtin();
        assert!(catalog.add("target", 0xE5, vec![], vec![]).is_err());
    }

    #[test]
    fn add_tags_parses_layouts() {
        let mut catalog = Catalog::new();
        let reg = catalog.add_tags("REG_TREND", 0xE2, "ffff", "").unwrap();
        assert_eq!(reg.read_size(), 16);
        assert!(catalog.add_tags("REG_BAD", 0xE3, "q", "").is_err());
        assert!(!catalog.contains_id(0xE3));
    }

    #[test]
    fn global_catalog_is_shared() {
        let a = Catalog::global();
        let b = Catalog::global();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(a.contains_id(builtin::MOTOR_ADDRESS));
    }

    #[test]
    fn iteration_is_id_ordered() {
        let catalog = Catalog::builtin();
        let ids: Vec<u8> = catalog.iter().map(|r| r.id).collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        assert_eq!(ids, sorted);
    }
}

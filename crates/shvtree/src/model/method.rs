//! Methods exposed by tree nodes.

use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;

use crate::error::MethodError;
use crate::model::Named;
use crate::types::TypeRef;

/// Names of methods every SHV node provides implicitly.
pub const RESERVED_METHODS: [&str; 3] = ["ls", "dir", "lsmod"];

bitflags! {
    /// Method flags and hints.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MethodFlags: u32 {
        const NOT_CALLABLE = 1;
        const GETTER = 2;
        const SETTER = 4;
        const LARGE_RESULT_HINT = 8;
        const NOT_IDEMPOTENT = 16;
        const USER_ID_REQUIRED = 32;
        const IS_UPDATABLE = 64;
    }
}

impl MethodFlags {
    /// Parses a single flag name, ignoring case.
    pub fn parse_name(name: &str) -> Option<Self> {
        Self::from_name(&name.to_uppercase())
    }
}

/// Minimal access level required to call a method.
///
/// Levels are ordered; a client with a higher level can call everything a
/// lower one can.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[repr(u8)]
pub enum Access {
    Browse = 1,
    Read = 8,
    Write = 16,
    #[default]
    Command = 24,
    Config = 32,
    Service = 40,
    SuperService = 48,
    Devel = 56,
    Admin = 63,
}

impl Access {
    pub const ALL: [Access; 9] = [
        Access::Browse,
        Access::Read,
        Access::Write,
        Access::Command,
        Access::Config,
        Access::Service,
        Access::SuperService,
        Access::Devel,
        Access::Admin,
    ];

    pub fn level(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            Access::Browse => "browse",
            Access::Read => "read",
            Access::Write => "write",
            Access::Command => "command",
            Access::Config => "config",
            Access::Service => "service",
            Access::SuperService => "superService",
            Access::Devel => "devel",
            Access::Admin => "admin",
        }
    }

    /// Abbreviation used on the wire.
    pub fn short_name(self) -> &'static str {
        match self {
            Access::Browse => "bws",
            Access::Read => "rd",
            Access::Write => "wr",
            Access::Command => "cmd",
            Access::Config => "cfg",
            Access::Service => "srv",
            Access::SuperService => "ssrv",
            Access::Devel => "dev",
            Access::Admin => "su",
        }
    }
}

impl FromStr for Access {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Access::ALL
            .into_iter()
            .find(|a| a.name() == s || a.short_name() == s)
            .ok_or_else(|| format!("Invalid access level: {s}"))
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Method of a node.
#[derive(Debug, Clone, PartialEq)]
pub struct Method {
    name: String,
    pub param: TypeRef,
    pub result: TypeRef,
    pub flags: MethodFlags,
    pub access: Access,
    pub description: String,
}

impl Method {
    /// Creates a method taking and returning Null, callable with
    /// [`Access::Command`].
    pub fn new(name: impl Into<String>) -> Result<Self, MethodError> {
        let name = name.into();
        if RESERVED_METHODS.contains(&name.as_str()) {
            return Err(MethodError::ReservedName(name));
        }
        Ok(Self::unchecked(name, TypeRef::NULL, TypeRef::NULL))
    }

    fn unchecked(name: impl Into<String>, param: TypeRef, result: TypeRef) -> Self {
        Self {
            name: name.into(),
            param,
            result,
            flags: MethodFlags::empty(),
            access: Access::default(),
            description: String::new(),
        }
    }

    /// Standard property getter.
    pub fn getter(ty: TypeRef) -> Self {
        Self {
            flags: MethodFlags::GETTER,
            access: Access::Read,
            ..Self::unchecked("get", TypeRef::GET_PARAM, ty)
        }
    }

    /// Standard property setter.
    pub fn setter(ty: TypeRef) -> Self {
        Self {
            flags: MethodFlags::SETTER,
            access: Access::Write,
            ..Self::unchecked("set", ty, TypeRef::NULL)
        }
    }

    /// Signal carrying a value of the type. Signals can't be called.
    pub fn signal(name: impl Into<String>, ty: TypeRef) -> Result<Self, MethodError> {
        Ok(Self {
            flags: MethodFlags::NOT_CALLABLE,
            access: Access::Read,
            result: ty,
            ..Self::new(name)?
        })
    }

    /// Standard property change signal.
    pub fn change(ty: TypeRef) -> Self {
        Self {
            flags: MethodFlags::NOT_CALLABLE,
            access: Access::Read,
            ..Self::unchecked("chng", TypeRef::NULL, ty)
        }
    }

    pub fn with_param(mut self, param: TypeRef) -> Self {
        self.param = param;
        self
    }

    pub fn with_result(mut self, result: TypeRef) -> Self {
        self.result = result;
        self
    }

    pub fn with_flags(mut self, flags: MethodFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_access(mut self, access: Access) -> Self {
        self.access = access;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_signal(&self) -> bool {
        self.flags.contains(MethodFlags::NOT_CALLABLE)
    }
}

impl Named for Method {
    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_names() {
        for name in RESERVED_METHODS {
            assert_eq!(
                Method::new(name),
                Err(MethodError::ReservedName(name.to_string()))
            );
        }
        let method = Method::new("reset").unwrap();
        assert_eq!(method.param, TypeRef::NULL);
        assert_eq!(method.result, TypeRef::NULL);
        assert_eq!(method.access, Access::Command);
        assert!(method.flags.is_empty());
    }

    #[test]
    fn test_property_methods() {
        let get = Method::getter(TypeRef::INT);
        assert_eq!(get.name(), "get");
        assert_eq!(get.param, TypeRef::GET_PARAM);
        assert_eq!(get.result, TypeRef::INT);
        assert_eq!(get.flags, MethodFlags::GETTER);
        assert_eq!(get.access, Access::Read);

        let set = Method::setter(TypeRef::INT);
        assert_eq!(set.param, TypeRef::INT);
        assert_eq!(set.result, TypeRef::NULL);
        assert_eq!(set.access, Access::Write);

        let chng = Method::change(TypeRef::INT);
        assert_eq!(chng.name(), "chng");
        assert!(chng.is_signal());
        assert_eq!(chng.result, TypeRef::INT);
        assert_eq!(chng.param, TypeRef::NULL);
    }

    #[test]
    fn test_signal() {
        let sig = Method::signal("fchng", TypeRef::STRING).unwrap();
        assert!(sig.is_signal());
        assert_eq!(sig.param, TypeRef::NULL);
        assert_eq!(sig.result, TypeRef::STRING);
        assert_eq!(sig.access, Access::Read);
        assert_eq!(
            Method::signal("dir", TypeRef::STRING),
            Err(MethodError::ReservedName("dir".to_string()))
        );
    }

    #[test]
    fn test_access_parse_and_order() {
        assert_eq!("browse".parse(), Ok(Access::Browse));
        assert_eq!("bws".parse(), Ok(Access::Browse));
        assert_eq!("superService".parse(), Ok(Access::SuperService));
        assert_eq!("su".parse(), Ok(Access::Admin));
        assert!("root".parse::<Access>().is_err());
        assert!(Access::Browse < Access::Read);
        assert!(Access::Command < Access::Devel);
        assert_eq!(Access::Admin.level(), 63);
        for access in Access::ALL {
            assert_eq!(access.name().parse(), Ok(access));
            assert_eq!(access.short_name().parse(), Ok(access));
        }
    }

    #[test]
    fn test_flag_names() {
        assert_eq!(MethodFlags::parse_name("getter"), Some(MethodFlags::GETTER));
        assert_eq!(
            MethodFlags::parse_name("large_result_hint"),
            Some(MethodFlags::LARGE_RESULT_HINT)
        );
        assert_eq!(MethodFlags::parse_name("fast"), None);
        assert_eq!(
            (MethodFlags::GETTER | MethodFlags::SETTER).bits(),
            6
        );
    }
}

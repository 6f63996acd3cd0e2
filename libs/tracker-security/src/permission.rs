use std::fmt;
use std::str::FromStr;

use crate::error::DecodeError;

/// An action a principal may be allowed to perform.
///
/// Variants are ordered by declaration and map to a stable code (`0..`),
/// which is what gets persisted. Never reorder or reuse codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Permission {
    TicketRead = 0,
    TicketWrite = 1,
    TicketCreate = 2,
    TicketComment = 3,
    TicketAssign = 4,
    ProjectCreate = 5,
    ProjectWrite = 6,
    ProjectAdmin = 7,
}

impl Permission {
    /// Every permission, in code order.
    pub const ALL: [Permission; 8] = [
        Permission::TicketRead,
        Permission::TicketWrite,
        Permission::TicketCreate,
        Permission::TicketComment,
        Permission::TicketAssign,
        Permission::ProjectCreate,
        Permission::ProjectWrite,
        Permission::ProjectAdmin,
    ];

    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Map a stored code back to a permission.
    ///
    /// # Errors
    /// Returns `DecodeError::PermissionCode` for codes outside the declared range.
    pub fn from_code(code: u8) -> Result<Self, DecodeError> {
        Self::ALL
            .get(usize::from(code))
            .copied()
            .ok_or(DecodeError::PermissionCode(i64::from(code)))
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Permission::TicketRead => "ticket_read",
            Permission::TicketWrite => "ticket_write",
            Permission::TicketCreate => "ticket_create",
            Permission::TicketComment => "ticket_comment",
            Permission::TicketAssign => "ticket_assign",
            Permission::ProjectCreate => "project_create",
            Permission::ProjectWrite => "project_write",
            Permission::ProjectAdmin => "project_admin",
        }
    }
}

impl TryFrom<i32> for Permission {
    type Error = DecodeError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        let small = u8::try_from(code).map_err(|_| DecodeError::PermissionCode(i64::from(code)))?;
        Self::from_code(small)
    }
}

impl From<Permission> for i32 {
    fn from(p: Permission) -> Self {
        i32::from(p.code())
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| DecodeError::PermissionName(s.to_owned()))
    }
}

impl serde::Serialize for Permission {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> serde::Deserialize<'de> for Permission {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip_in_declaration_order() {
        for (i, p) in Permission::ALL.iter().enumerate() {
            assert_eq!(usize::from(p.code()), i);
            assert_eq!(Permission::from_code(p.code()).unwrap(), *p);
        }
        assert!(Permission::ALL.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn out_of_range_code_fails_to_decode() {
        assert_eq!(
            Permission::from_code(8).unwrap_err(),
            DecodeError::PermissionCode(8)
        );
        assert_eq!(
            Permission::try_from(-1).unwrap_err(),
            DecodeError::PermissionCode(-1)
        );
        assert_eq!(
            Permission::try_from(300).unwrap_err(),
            DecodeError::PermissionCode(300)
        );
    }

    #[test]
    fn names_round_trip() {
        for p in Permission::ALL {
            assert_eq!(p.to_string().parse::<Permission>().unwrap(), p);
        }
        assert!(matches!(
            "ticket_delete".parse::<Permission>(),
            Err(DecodeError::PermissionName(_))
        ));
    }

    #[test]
    fn serde_uses_snake_case_names() {
        let json = serde_json::to_string(&Permission::TicketComment).unwrap();
        assert_eq!(json, r#""ticket_comment""#);
        let back: Permission = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Permission::TicketComment);
        assert!(serde_json::from_str::<Permission>(r#""nope""#).is_err());
    }
}

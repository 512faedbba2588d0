use serde::{Deserialize, Serialize};

/// Account roles, stored as their integer value. Ordered by privilege.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    None = 1,
    Viewer = 2,
    User = 3,
    Member = 4,
    Moderator = 5,
    Admin = 6,
}

impl Role {
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            1 => Some(Role::None),
            2 => Some(Role::Viewer),
            3 => Some(Role::User),
            4 => Some(Role::Member),
            5 => Some(Role::Moderator),
            6 => Some(Role::Admin),
            _ => None,
        }
    }

    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_values() {
        assert_eq!(Role::Admin.as_i32(), 6);
        assert_eq!(Role::from_i32(3), Some(Role::User));
        assert_eq!(Role::from_i32(0), None);
        assert!(Role::Admin > Role::Moderator);
        assert_eq!(serde_json::to_string(&Role::Moderator).unwrap(), "\"moderator\"");
    }
}

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Volunteer,
    President,
    FinanceDirector,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Volunteer => "volunteer",
            Role::President => "president",
            Role::FinanceDirector => "finance_director",
        }
    }

    /// Team role shown for leadership accounts, which carry no team role of their own.
    pub fn display_title(&self) -> Option<&'static str> {
        match self {
            Role::Volunteer => None,
            Role::President => Some("President"),
            Role::FinanceDirector => Some("Finance Director"),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "volunteer" => Ok(Role::Volunteer),
            "president" => Ok(Role::President),
            "finance_director" => Ok(Role::FinanceDirector),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

/// A member of the sales team. Tickets record the volunteer who sold them in `created_by`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Volunteer {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub role: Role,
    pub team_role: Option<String>,
    pub cleared_amount: Decimal,
}

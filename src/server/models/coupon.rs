use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// Single-use incentive token backed by a keypair. Each `if_*` flag
/// transitions false -> true exactly once and is never reset.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Coupon {
    pub addr: String,
    #[serde(skip_serializing)]
    #[sqlx(rename = "priv")]
    pub priv_key: String,
    pub owner: Option<String>,
    pub if_used: bool,
    pub if_voted: bool,
    pub if_reviewed: bool,
    pub vote: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Vote direction, persisted on the coupon so a conflicting second vote
/// can report what the first one was.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteDirection {
    Up,
    Down,
}

impl VoteDirection {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "up" => Some(Self::Up),
            "down" => Some(Self::Down),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vote_direction_accepts_only_up_or_down() {
        assert_eq!(VoteDirection::parse("up"), Some(VoteDirection::Up));
        assert_eq!(VoteDirection::parse("down"), Some(VoteDirection::Down));
        assert_eq!(VoteDirection::parse("UP"), None);
        assert_eq!(VoteDirection::parse("sideways"), None);
    }
}

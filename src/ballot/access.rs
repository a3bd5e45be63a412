//! Access gate: the two caller predicates checked before any guarded call.

use super::error::{BallotError, BallotResult};
use super::voters::VoterRegistry;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Verified identity of a caller, opaque to the ballot.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Principal(pub String);

impl Principal {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Principal {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Fails with `NotAdministrator` unless `caller` is the ballot's administrator.
pub fn require_administrator(administrator: &Principal, caller: &Principal) -> BallotResult<()> {
    if caller != administrator {
        return Err(BallotError::NotAdministrator);
    }
    Ok(())
}

/// Fails with `NotVoter` unless `caller` has a registered voter record.
pub fn require_registered_voter(voters: &VoterRegistry, caller: &Principal) -> BallotResult<()> {
    if !voters.is_registered(caller) {
        return Err(BallotError::NotVoter);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_administrator() {
        let admin = Principal::from("owner");
        assert!(require_administrator(&admin, &Principal::from("owner")).is_ok());
        assert_eq!(
            require_administrator(&admin, &Principal::from("voter1")),
            Err(BallotError::NotAdministrator)
        );
    }

    #[test]
    fn test_require_registered_voter() {
        let mut voters = VoterRegistry::new();
        let voter = Principal::from("voter1");
        voters.register(&voter).unwrap();

        assert!(require_registered_voter(&voters, &voter).is_ok());
        assert_eq!(
            require_registered_voter(&voters, &Principal::from("owner")),
            Err(BallotError::NotVoter)
        );
    }

    #[test]
    fn test_administrator_is_not_implicitly_a_voter() {
        let voters = VoterRegistry::new();
        let admin = Principal::from("owner");
        assert!(require_administrator(&admin, &admin).is_ok());
        assert_eq!(
            require_registered_voter(&voters, &admin),
            Err(BallotError::NotVoter)
        );
    }
}

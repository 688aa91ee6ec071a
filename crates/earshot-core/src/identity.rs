//! Local identity and role convention.
//!
//! The single-advertiser star topology is negotiated purely by display name:
//! the designated advertiser carries a marker prefix on its name, and
//! discoverers only treat endpoints carrying that marker as candidates. This
//! keeps role assignment out of band (users agree on who hosts) at the cost
//! of trusting names, which matches the trust already delegated to the
//! transport's pairing.

use crate::role::Role;

/// Display-name prefix that marks the designated advertiser.
pub const ADVERTISER_TAG: &str = "1-";

/// Local identity: display name plus the advertiser-marker convention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    display_name: String,
    advertiser_tag: String,
}

impl Identity {
    /// Identity with the default advertiser marker.
    pub fn new(display_name: impl Into<String>) -> Self {
        Self { display_name: display_name.into(), advertiser_tag: ADVERTISER_TAG.to_owned() }
    }

    /// Identity with a custom advertiser marker.
    pub fn with_tag(display_name: impl Into<String>, advertiser_tag: impl Into<String>) -> Self {
        Self { display_name: display_name.into(), advertiser_tag: advertiser_tag.into() }
    }

    /// Name this node advertises or requests connections under.
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// True when the local name carries the advertiser marker.
    #[must_use]
    pub fn is_advertiser(&self) -> bool {
        self.display_name.starts_with(&self.advertiser_tag)
    }

    /// Role this identity starts a session in.
    #[must_use]
    pub fn initial_role(&self) -> Role {
        if self.is_advertiser() { Role::Advertising } else { Role::Discovering }
    }

    /// True when a remote display name qualifies as a connection candidate.
    #[must_use]
    pub fn expects_peer(&self, display_name: &str) -> bool {
        display_name.starts_with(&self.advertiser_tag)
    }
}

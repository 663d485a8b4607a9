//! Permission bitfield (C1) — named capability bits and the primitive operations
//! the rest of the engine composes. No resolution logic lives here; that is C2
//! (`ids_core::resolver`), which operates on values of this type.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// A fixed-width (64-bit) set of named capabilities.
    ///
    /// Carried internally as an opaque value; persisted as a decimal string
    /// (see [`to_decimal`]/[`from_decimal`]) so a future widening of the bitfield
    /// does not require a storage migration.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct Permissions: i64 {
        const VIEW_CHANNEL      = 1 << 0;
        const SEND_MESSAGES     = 1 << 1;
        const DELETE_MESSAGES   = 1 << 2;
        const EDIT_MESSAGES     = 1 << 3;
        const MANAGE_CHANNELS   = 1 << 4;
        const MANAGE_ROLES      = 1 << 5;
        const MANAGE_SERVER     = 1 << 6;
        const BAN_MEMBERS       = 1 << 7;
        const KICK_MEMBERS      = 1 << 8;
        const MENTION_EVERYONE  = 1 << 9;
        const ATTACH_FILES      = 1 << 10;
        const CREATE_INVITES    = 1 << 11;
        const ADMINISTRATOR     = 1 << 12;
        const MANAGE_MESSAGES   = 1 << 13;
        const EDIT_OWN_MESSAGES = 1 << 14;
        const VIEW_AUDIT_LOG    = 1 << 15;
    }
}

impl Permissions {
    /// `DEFAULT` bits granted to a plain member with no role overrides.
    pub fn default_bits() -> Self {
        Self::VIEW_CHANNEL
            | Self::SEND_MESSAGES
            | Self::ATTACH_FILES
            | Self::CREATE_INVITES
            | Self::EDIT_OWN_MESSAGES
    }

    pub fn is_admin(&self) -> bool {
        self.contains(Self::ADMINISTRATOR)
    }

    pub fn has(&self, bit: Self) -> bool {
        self.contains(bit)
    }

    pub fn has_all(&self, bits: Self) -> bool {
        self.contains(bits)
    }

    /// Decimal-string storage form (forward-compatible with a wider bitfield).
    pub fn to_decimal(self) -> String {
        (self.bits() as u64).to_string()
    }

    pub fn from_decimal(s: &str) -> Result<Self, std::num::ParseIntError> {
        let raw: u64 = s.parse()?;
        Ok(Self::from_bits_truncate(raw as i64))
    }
}

impl Default for Permissions {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_bits_contains_view_and_send() {
        let d = Permissions::default_bits();
        assert!(d.has(Permissions::VIEW_CHANNEL));
        assert!(d.has(Permissions::SEND_MESSAGES));
        assert!(!d.has(Permissions::BAN_MEMBERS));
    }

    #[test]
    fn decimal_round_trips() {
        let p = Permissions::VIEW_CHANNEL | Permissions::MANAGE_ROLES;
        let s = p.to_decimal();
        assert_eq!(Permissions::from_decimal(&s).unwrap(), p);
    }

    #[test]
    fn administrator_has_reports_true_for_any_bit() {
        // `has` only checks containment, not the admin bypass — that is C2's job.
        let admin = Permissions::ADMINISTRATOR;
        assert!(!admin.has(Permissions::SEND_MESSAGES));
        assert!(admin.is_admin());
    }
}

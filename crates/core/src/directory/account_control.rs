//! `userAccountControl` flag bits.
//!
//! See <https://docs.microsoft.com/en-us/troubleshoot/windows-server/identity/useraccountcontrol-manipulate-account-properties>.

/// Named bits of the `userAccountControl` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum AccountControlFlag {
    Script = 0x0001,
    AccountDisable = 0x0002,
    HomedirRequired = 0x0008,
    Lockout = 0x0010,
    PasswdNotReqd = 0x0020,
    PasswdCantChange = 0x0040,
    EncryptedTextPwdAllowed = 0x0080,
    TempDuplicateAccount = 0x0100,
    NormalAccount = 0x0200,
    InterdomainTrustAccount = 0x0800,
    WorkstationTrustAccount = 0x1000,
    ServerTrustAccount = 0x2000,
    DontExpirePassword = 0x1_0000,
    MnsLogonAccount = 0x2_0000,
    SmartcardRequired = 0x4_0000,
    TrustedForDelegation = 0x8_0000,
    NotDelegated = 0x10_0000,
    UseDesKeyOnly = 0x20_0000,
    DontReqPreauth = 0x40_0000,
    PasswordExpired = 0x80_0000,
    TrustedToAuthForDelegation = 0x100_0000,
    PartialSecretsAccount = 0x400_0000,
}

impl AccountControlFlag {
    pub const fn bits(self) -> u32 {
        self as u32
    }
}

/// A `userAccountControl` value. An absent attribute reads as no bits set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccountControl(u32);

impl AccountControl {
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Interpret a raw attribute integer. Only the low 32 bits are meaningful.
    pub fn from_attribute(value: Option<i64>) -> Self {
        Self(value.map(|v| v as u32).unwrap_or(0))
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    /// `true` iff `(value & flag) != 0`.
    pub const fn contains(self, flag: AccountControlFlag) -> bool {
        self.0 & flag.bits() != 0
    }

    pub const fn is_enabled(self) -> bool {
        !self.contains(AccountControlFlag::AccountDisable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normal_account_is_enabled() {
        let uac = AccountControl::from_bits(512);
        assert!(uac.is_enabled());
        assert!(uac.contains(AccountControlFlag::NormalAccount));
        assert!(!uac.contains(AccountControlFlag::DontReqPreauth));
    }

    #[test]
    fn test_disabled_account() {
        let uac = AccountControl::from_bits(0x202);
        assert!(!uac.is_enabled());
    }

    #[test]
    fn test_contains_is_pure() {
        let flags = [
            AccountControlFlag::PasswdNotReqd,
            AccountControlFlag::TrustedForDelegation,
            AccountControlFlag::DontExpirePassword,
            AccountControlFlag::NotDelegated,
        ];
        for bits in [0u32, 0x20, 0x1_0220, 0x8_1000, u32::MAX] {
            let uac = AccountControl::from_bits(bits);
            for flag in flags {
                assert_eq!(uac.contains(flag), bits & flag.bits() != 0);
                assert_eq!(uac.contains(flag), uac.contains(flag));
            }
        }
    }

    #[test]
    fn test_absent_attribute_has_no_bits() {
        let uac = AccountControl::from_attribute(None);
        assert_eq!(uac.bits(), 0);
        assert!(uac.is_enabled());
    }
}

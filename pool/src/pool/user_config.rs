use soroban_sdk::{Address, Env};

use crate::storage;

/// The collateral and borrowing flags of a user, packed as two bits per reserve index.
///
/// Bit `2 * index` is set if the user is borrowing the reserve, and bit `2 * index + 1` is set
/// if the user is using the reserve as collateral.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct UserConfiguration {
    pub data: u128,
}

impl UserConfiguration {
    pub fn new(data: u128) -> UserConfiguration {
        UserConfiguration { data }
    }

    /// Load the flags of a user from the ledger
    pub fn load(e: &Env, user: &Address) -> UserConfiguration {
        UserConfiguration::new(storage::get_user_config(e, user))
    }

    /// Write the flags of a user to the ledger
    pub fn store(&self, e: &Env, user: &Address) {
        storage::set_user_config(e, user, &self.data);
    }

    /// Checks if the user is borrowing or using as collateral the reserve at `res_index`
    pub fn is_using_reserve(&self, res_index: u32) -> bool {
        (self.data >> (res_index * 2)) & 0b11 != 0
    }

    /// Checks if the user is borrowing the reserve at `res_index`
    pub fn is_borrowing(&self, res_index: u32) -> bool {
        (self.data >> (res_index * 2)) & 0b01 != 0
    }

    /// Checks if the user is using the reserve at `res_index` as collateral
    pub fn is_collateral(&self, res_index: u32) -> bool {
        (self.data >> (res_index * 2)) & 0b10 != 0
    }

    /// Checks if the user is borrowing any reserve
    pub fn is_borrowing_any(&self) -> bool {
        self.data & BORROWING_MASK != 0
    }

    /// Checks if the user has no flags set
    pub fn is_empty(&self) -> bool {
        self.data == 0
    }

    /// Set the borrowing flag for the reserve at `res_index`
    pub fn set_borrowing(&mut self, res_index: u32, borrowing: bool) {
        let res_borrow_bit = 1u128 << (res_index * 2);
        if borrowing {
            self.data |= res_borrow_bit;
        } else {
            self.data &= !res_borrow_bit;
        }
    }

    /// Set the collateral flag for the reserve at `res_index`
    pub fn set_collateral(&mut self, res_index: u32, collateral: bool) {
        let res_collateral_bit = 1u128 << (res_index * 2 + 1);
        if collateral {
            self.data |= res_collateral_bit;
        } else {
            self.data &= !res_collateral_bit;
        }
    }
}

// every even bit
const BORROWING_MASK: u128 = 0x5555_5555_5555_5555_5555_5555_5555_5555;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_config_not_using() {
        let user_config = UserConfiguration::new(0xFFFF_FFFF_FFFF_FFFF_FFFF_FFFF_FFFF_FCFF);
        let res_index = 4;

        assert!(!user_config.is_using_reserve(res_index));
        assert!(!user_config.is_collateral(res_index));
        assert!(!user_config.is_borrowing(res_index));
    }

    #[test]
    fn test_user_config_using_all() {
        let user_config = UserConfiguration::new(0x0003_0000_0000_0000);
        let res_index = 24;

        assert!(user_config.is_using_reserve(res_index));
        assert!(user_config.is_collateral(res_index));
        assert!(user_config.is_borrowing(res_index));
    }

    #[test]
    fn test_user_config_only_collateral_last_reserve() {
        let user_config = UserConfiguration::new(0x8000_0000_0000_0000_0000_0000_0000_0000);
        let res_index = 63;

        assert!(user_config.is_using_reserve(res_index));
        assert!(user_config.is_collateral(res_index));
        assert!(!user_config.is_borrowing(res_index));
        assert!(!user_config.is_borrowing_any());
    }

    #[test]
    fn test_user_config_only_borrowing() {
        let user_config = UserConfiguration::new(0x0000_0000_0000_0001);
        let res_index = 0;

        assert!(user_config.is_using_reserve(res_index));
        assert!(!user_config.is_collateral(res_index));
        assert!(user_config.is_borrowing(res_index));
        assert!(user_config.is_borrowing_any());
    }

    #[test]
    fn test_set_and_clear_flags() {
        let mut user_config = UserConfiguration::default();
        assert!(user_config.is_empty());

        user_config.set_collateral(2, true);
        assert_eq!(user_config.data, 0x20);
        user_config.set_borrowing(5, true);
        assert_eq!(user_config.data, 0x420);
        user_config.set_borrowing(40, true);
        assert_eq!(user_config.data, 0x1_0000_0000_0000_0000_0420);

        user_config.set_collateral(2, false);
        user_config.set_borrowing(40, false);
        assert_eq!(user_config.data, 0x400);

        // clearing an unset flag is a no-op
        user_config.set_collateral(5, false);
        assert_eq!(user_config.data, 0x400);
    }
}

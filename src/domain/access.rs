//! Admin capability shared by both contracts.
//!
//! Admins are permanent: there is no removal operation.

use crate::domain::address::Address;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AdminRoles {
    admins: BTreeSet<Address>,
}

impl AdminRoles {
    pub fn with_admins<I: IntoIterator<Item = Address>>(admins: I) -> Self {
        Self {
            admins: admins.into_iter().filter(|a| !a.is_zero()).collect(),
        }
    }

    pub fn is_admin(&self, address: &Address) -> bool {
        self.admins.contains(address)
    }

    /// Returns false if the address already held the role.
    pub fn grant(&mut self, address: Address) -> bool {
        self.admins.insert(address)
    }

    pub fn admins(&self) -> impl Iterator<Item = &Address> {
        self.admins.iter()
    }
}

//! Subject directory: the student registry contract.
//!
//! Subjects are keyed by address and enumerated in registration order. They are
//! never deleted; `deactivate` is the only removal mechanism. Every mutating
//! operation checks all of its preconditions before touching state, so a failed
//! call leaves the directory unchanged.

use crate::domain::access::AdminRoles;
use crate::domain::address::Address;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use utoipa::ToSchema;

/// Largest page `list_range` will return.
pub const MAX_PAGE_SIZE: u64 = 100;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("caller {0} is not a directory admin")]
    Unauthorized(Address),
    #[error("invalid subject address {0}")]
    InvalidAddress(Address),
    #[error("subject {0} is already registered")]
    AlreadyRegistered(Address),
    #[error("subject {0} is not registered")]
    NotRegistered(Address),
    #[error("subject {address} is already {}", state_name(.active))]
    AlreadyInState { address: Address, active: bool },
    #[error("subject {0} not found")]
    NotFound(Address),
    #[error("invalid range: start {start}, count {count} (count must be 1..={max})", max = MAX_PAGE_SIZE)]
    InvalidRange { start: i64, count: i64 },
    #[error("field `{0}` must not be empty")]
    EmptyField(&'static str),
    #[error("{0} is already a directory admin")]
    AlreadyAdmin(Address),
}

/// Mutable profile fields of a subject.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubjectProfile {
    pub name: String,
    pub surname: String,
    #[serde(default)]
    pub second_surname: String,
    pub studies: String,
}

impl SubjectProfile {
    fn validate(&self) -> Result<(), DirectoryError> {
        if self.name.trim().is_empty() {
            return Err(DirectoryError::EmptyField("name"));
        }
        if self.surname.trim().is_empty() {
            return Err(DirectoryError::EmptyField("surname"));
        }
        if self.studies.trim().is_empty() {
            return Err(DirectoryError::EmptyField("studies"));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    #[schema(value_type = String)]
    pub address: Address,
    pub name: String,
    pub surname: String,
    pub second_surname: String,
    pub studies: String,
    pub active: bool,
    /// Unix seconds of the block that registered the subject.
    pub registered_at: i64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubjectPage {
    pub subjects: Vec<Subject>,
    pub total_count: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", rename_all = "PascalCase")]
pub enum DirectoryEvent {
    SubjectRegistered { address: Address, registered_by: Address },
    SubjectUpdated { address: Address, updated_by: Address },
    SubjectDeactivated { address: Address },
    SubjectReactivated { address: Address },
    DirectoryAdminAdded { admin: Address, added_by: Address },
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubjectDirectory {
    admins: AdminRoles,
    subjects: BTreeMap<Address, Subject>,
    /// Registration order, stable for pagination.
    order: Vec<Address>,
}

impl SubjectDirectory {
    pub fn new(admins: AdminRoles) -> Self {
        Self {
            admins,
            subjects: BTreeMap::new(),
            order: Vec::new(),
        }
    }

    fn only_admin(&self, caller: &Address) -> Result<(), DirectoryError> {
        if self.admins.is_admin(caller) {
            Ok(())
        } else {
            Err(DirectoryError::Unauthorized(*caller))
        }
    }

    pub fn is_admin(&self, address: &Address) -> bool {
        self.admins.is_admin(address)
    }

    pub fn admins(&self) -> &AdminRoles {
        &self.admins
    }

    pub fn add_admin(
        &mut self,
        caller: Address,
        admin: Address,
    ) -> Result<DirectoryEvent, DirectoryError> {
        self.only_admin(&caller)?;
        if admin.is_zero() {
            return Err(DirectoryError::InvalidAddress(admin));
        }
        if !self.admins.grant(admin) {
            return Err(DirectoryError::AlreadyAdmin(admin));
        }
        Ok(DirectoryEvent::DirectoryAdminAdded {
            admin,
            added_by: caller,
        })
    }

    pub fn register(
        &mut self,
        caller: Address,
        address: Address,
        profile: SubjectProfile,
        now: i64,
    ) -> Result<DirectoryEvent, DirectoryError> {
        self.only_admin(&caller)?;
        if address.is_zero() {
            return Err(DirectoryError::InvalidAddress(address));
        }
        if self.subjects.contains_key(&address) {
            return Err(DirectoryError::AlreadyRegistered(address));
        }
        profile.validate()?;

        let SubjectProfile {
            name,
            surname,
            second_surname,
            studies,
        } = profile;
        self.subjects.insert(
            address,
            Subject {
                address,
                name,
                surname,
                second_surname,
                studies,
                active: true,
                registered_at: now,
            },
        );
        self.order.push(address);

        Ok(DirectoryEvent::SubjectRegistered {
            address,
            registered_by: caller,
        })
    }

    pub fn update(
        &mut self,
        caller: Address,
        address: Address,
        profile: SubjectProfile,
    ) -> Result<DirectoryEvent, DirectoryError> {
        self.only_admin(&caller)?;
        profile.validate()?;
        let subject = self
            .subjects
            .get_mut(&address)
            .ok_or(DirectoryError::NotRegistered(address))?;

        subject.name = profile.name;
        subject.surname = profile.surname;
        subject.second_surname = profile.second_surname;
        subject.studies = profile.studies;

        Ok(DirectoryEvent::SubjectUpdated {
            address,
            updated_by: caller,
        })
    }

    pub fn deactivate(
        &mut self,
        caller: Address,
        address: Address,
    ) -> Result<DirectoryEvent, DirectoryError> {
        self.set_active(caller, address, false)?;
        Ok(DirectoryEvent::SubjectDeactivated { address })
    }

    pub fn reactivate(
        &mut self,
        caller: Address,
        address: Address,
    ) -> Result<DirectoryEvent, DirectoryError> {
        self.set_active(caller, address, true)?;
        Ok(DirectoryEvent::SubjectReactivated { address })
    }

    fn set_active(
        &mut self,
        caller: Address,
        address: Address,
        active: bool,
    ) -> Result<(), DirectoryError> {
        self.only_admin(&caller)?;
        let subject = self
            .subjects
            .get_mut(&address)
            .ok_or(DirectoryError::NotRegistered(address))?;
        if subject.active == active {
            return Err(DirectoryError::AlreadyInState { address, active });
        }
        subject.active = active;
        Ok(())
    }

    pub fn get(&self, address: &Address) -> Result<&Subject, DirectoryError> {
        self.subjects
            .get(address)
            .ok_or(DirectoryError::NotFound(*address))
    }

    pub fn is_registered(&self, address: &Address) -> bool {
        self.subjects.contains_key(address)
    }

    /// Total registered subjects, inactive ones included.
    pub fn count(&self) -> u64 {
        self.order.len() as u64
    }

    /// Up to `count` addresses starting at `start`, in registration order.
    pub fn list_range(&self, start: i64, count: i64) -> Result<Vec<Address>, DirectoryError> {
        check_range(start, count)?;
        let start = start as usize;
        if start >= self.order.len() {
            return Ok(Vec::new());
        }
        let end = start.saturating_add(count as usize).min(self.order.len());
        Ok(self.order[start..end].to_vec())
    }

    pub fn list_all_paginated(&self, start: i64, count: i64) -> Result<SubjectPage, DirectoryError> {
        check_range(start, count)?;
        let total_count = self.count();
        if start as u64 >= total_count {
            return Ok(SubjectPage {
                subjects: Vec::new(),
                total_count,
            });
        }
        let subjects = self
            .list_range(start, count)?
            .iter()
            .map(|address| self.get(address).cloned())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(SubjectPage {
            subjects,
            total_count,
        })
    }
}

fn state_name(active: &bool) -> &'static str {
    if *active {
        "active"
    } else {
        "inactive"
    }
}

pub fn check_range(start: i64, count: i64) -> Result<(), DirectoryError> {
    if start < 0 || count < 1 || count as u64 > MAX_PAGE_SIZE {
        return Err(DirectoryError::InvalidRange { start, count });
    }
    Ok(())
}

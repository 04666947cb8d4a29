//! Contract registry and handles.
//!
//! [`ContractRegistry::bind`] turns (ABI, address) descriptors into callable
//! [`ContractHandle`]s against a ready [`ChainConnection`]. Binding is
//! all-or-nothing; a partial registry never exists. Each handle stays tied to
//! the connection generation it was bound against: once the connection is
//! replaced or closed, calls through the old handle fail with
//! [`StaleHandleError`] instead of silently reaching a different chain state.
//! Re-binding after a reconnect is an explicit caller step.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use serde_json::Value;

use crate::core::chain::{ChainConnection, ConnectionInner, RpcSession};
use crate::core::error::{BindingError, ContractCallError, StaleHandleError};
use crate::models::ContractDescriptor;

/// A callable binding of one contract to a specific live connection.
#[derive(Clone, Debug)]
pub struct ContractHandle {
    descriptor: ContractDescriptor,
    conn: Weak<RefCell<ConnectionInner>>,
    generation: u64,
}

impl ContractHandle {
    pub fn descriptor(&self) -> &ContractDescriptor {
        &self.descriptor
    }

    pub fn logical_name(&self) -> &str {
        &self.descriptor.logical_name
    }

    /// Check whether the bound connection is still the live one.
    pub fn is_usable(&self) -> bool {
        self.session().is_ok()
    }

    /// Execute a contract call through the bound connection.
    ///
    /// Fails with [`StaleHandleError`] when the bound connection has been
    /// closed or replaced since binding; the call is never re-routed.
    pub async fn call(&self, method: &str, args: Vec<Value>) -> Result<Value, ContractCallError> {
        let session = self.session()?;
        Ok(session.contract_call(&self.descriptor, method, args).await?)
    }

    fn session(&self) -> Result<Rc<dyn RpcSession>, StaleHandleError> {
        let stale = || StaleHandleError {
            contract: self.descriptor.logical_name.clone(),
        };
        let inner = self.conn.upgrade().ok_or_else(stale)?;
        let inner = inner.borrow();
        if inner.generation != self.generation || !inner.status.is_ready() {
            return Err(stale());
        }
        inner.session.clone().ok_or_else(stale)
    }
}

/// Mapping of logical contract names to handles, bound in one step.
#[derive(Debug)]
pub struct ContractRegistry {
    handles: HashMap<String, ContractHandle>,
    generation: u64,
}

impl ContractRegistry {
    /// Bind all descriptors against a ready connection.
    ///
    /// Fails fast when the connection is not ready or any descriptor address
    /// is implausible; no handle is exposed in that case.
    pub fn bind(
        connection: &ChainConnection,
        descriptors: &[ContractDescriptor],
    ) -> Result<Self, BindingError> {
        let (conn, generation) = {
            let inner = connection.state();
            let borrowed = inner.borrow();
            if !borrowed.status.is_ready() {
                return Err(BindingError::NotReady {
                    status: borrowed.status.label(),
                });
            }
            (Rc::downgrade(inner), borrowed.generation)
        };

        // validate everything before binding anything
        for descriptor in descriptors {
            if !plausible_address(&descriptor.address) {
                return Err(BindingError::BadAddress {
                    name: descriptor.logical_name.clone(),
                });
            }
        }

        let handles = descriptors
            .iter()
            .map(|descriptor| {
                (
                    descriptor.logical_name.clone(),
                    ContractHandle {
                        descriptor: descriptor.clone(),
                        conn: conn.clone(),
                        generation,
                    },
                )
            })
            .collect();

        Ok(Self {
            handles,
            generation,
        })
    }

    pub fn get(&self, logical_name: &str) -> Option<&ContractHandle> {
        self.handles.get(logical_name)
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Connection generation this registry was bound against.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.handles.keys().map(String::as_str)
    }
}

fn plausible_address(address: &str) -> bool {
    address.len() >= 32 && address.chars().all(|c| c.is_ascii_alphanumeric())
}

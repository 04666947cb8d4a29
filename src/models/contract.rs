/// One contract's binding input: logical name, ABI metadata, on-chain address.
///
/// Immutable configuration supplied by [`crate::config::configured_contracts`];
/// the ABI blob is consumed opaquely by the RPC layer.
#[derive(Clone, Debug, PartialEq)]
pub struct ContractDescriptor {
    pub logical_name: String,
    pub abi_schema: serde_json::Value,
    pub address: String,
}

impl ContractDescriptor {
    pub fn new(
        logical_name: impl Into<String>,
        abi_schema: serde_json::Value,
        address: impl Into<String>,
    ) -> Self {
        Self {
            logical_name: logical_name.into(),
            abi_schema,
            address: address.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_fields() {
        let descriptor = ContractDescriptor::new(
            "erc721",
            serde_json::json!({"spec": {}}),
            "5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY",
        );
        assert_eq!(descriptor.logical_name, "erc721");
        assert!(descriptor.address.starts_with('5'));
    }
}

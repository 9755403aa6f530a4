use alloy_sol_types::sol;

sol! {
    /// Payload of an L1-initiated transaction as passed to the rollup bridge
    /// contract. `data` is the deposit's keystore address, or the RLP field
    /// list of a withdraw or update.
    #[derive(Debug, PartialEq, Eq)]
    struct L1InitiatedTransaction {
        uint8 txType;
        bytes data;
    }
}

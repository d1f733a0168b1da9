use alloy_sol_types::sol;

sol! {
    contract GnosisSafe {
        function nonce() external view returns (uint256);
        function enableModule(address module) external;
    }
}

sol! {
    contract MultiSendCallOnly {
        /// `transactions` is the packed concatenation of
        /// operation (1) | to (20) | value (32) | data length (32) | data
        function multiSend(bytes transactions) external payable;
    }
}

sol! {
    /// EIP-712 message signed by Safe owners.
    struct SafeTx {
        address to;
        uint256 value;
        bytes data;
        uint8 operation;
        uint256 safeTxGas;
        uint256 baseGas;
        uint256 gasPrice;
        address gasToken;
        address refundReceiver;
        uint256 nonce;
    }
}

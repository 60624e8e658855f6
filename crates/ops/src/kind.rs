use std::{fmt, str::FromStr};

use arbitrary::Arbitrary;
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

/// Type discriminant of an operation.  The hint strings are stable on the
/// wire and in the processor registry.
#[derive(
    Copy,
    Clone,
    Debug,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
    Arbitrary,
    BorshSerialize,
    BorshDeserialize,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    CreateAccount,
    Transfer,
    UpdateKey,
    Mint,
    RegisterCurrency,
    UpdateCurrency,
    CreateContractAccount,
    Withdraw,
    UpdateOperator,
    UpdateRecipient,
    UpdateHandler,
    SuffrageCandidate,
    SuffrageJoin,
    SuffrageDisjoin,
    SuffrageExpel,
}

impl OperationKind {
    pub const ALL: [OperationKind; 15] = [
        OperationKind::CreateAccount,
        OperationKind::Transfer,
        OperationKind::UpdateKey,
        OperationKind::Mint,
        OperationKind::RegisterCurrency,
        OperationKind::UpdateCurrency,
        OperationKind::CreateContractAccount,
        OperationKind::Withdraw,
        OperationKind::UpdateOperator,
        OperationKind::UpdateRecipient,
        OperationKind::UpdateHandler,
        OperationKind::SuffrageCandidate,
        OperationKind::SuffrageJoin,
        OperationKind::SuffrageDisjoin,
        OperationKind::SuffrageExpel,
    ];

    pub fn hint(&self) -> &'static str {
        match self {
            OperationKind::CreateAccount => "mitum-currency-create-account-operation-v0.0.1",
            OperationKind::Transfer => "mitum-currency-transfer-operation-v0.0.1",
            OperationKind::UpdateKey => "mitum-currency-update-key-operation-v0.0.1",
            OperationKind::Mint => "mitum-currency-mint-operation-v0.0.1",
            OperationKind::RegisterCurrency => "mitum-currency-register-currency-operation-v0.0.1",
            OperationKind::UpdateCurrency => "mitum-currency-update-currency-operation-v0.0.1",
            OperationKind::CreateContractAccount => {
                "mitum-extension-create-contract-account-operation-v0.0.1"
            }
            OperationKind::Withdraw => "mitum-extension-withdraw-operation-v0.0.1",
            OperationKind::UpdateOperator => "mitum-extension-update-operator-operation-v0.0.1",
            OperationKind::UpdateRecipient => "mitum-extension-update-recipient-operation-v0.0.1",
            OperationKind::UpdateHandler => "mitum-extension-update-handler-operation-v0.0.1",
            OperationKind::SuffrageCandidate => "suffrage-candidate-operation-v0.0.1",
            OperationKind::SuffrageJoin => "suffrage-join-operation-v0.0.1",
            OperationKind::SuffrageDisjoin => "suffrage-disjoin-operation-v0.0.1",
            OperationKind::SuffrageExpel => "suffrage-expel-operation-v0.0.1",
        }
    }

    pub fn from_hint(hint: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.hint() == hint)
    }

    /// Node operations are signed by consensus node keys, each sign naming
    /// the node it comes from.
    pub fn is_node_operation(&self) -> bool {
        matches!(
            self,
            OperationKind::Mint
                | OperationKind::RegisterCurrency
                | OperationKind::UpdateCurrency
                | OperationKind::SuffrageCandidate
                | OperationKind::SuffrageJoin
                | OperationKind::SuffrageDisjoin
                | OperationKind::SuffrageExpel
        )
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.hint())
    }
}

impl FromStr for OperationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hint(s).ok_or_else(|| format!("unknown operation hint {s}"))
    }
}

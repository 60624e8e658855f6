//! Hash-identified statements of intent.

use arbitrary::{Arbitrary, Unstructured};
use borsh::{BorshDeserialize, BorshSerialize};
use ledger_primitives::{hash, prelude::*};
use serde::{Deserialize, Serialize};

use crate::{errors::FactError, facts::*, kind::OperationKind, MAX_TOKEN_LEN};

/// Payload of a fact, one variant per operation kind.
#[derive(
    Clone,
    Debug,
    Eq,
    PartialEq,
    Arbitrary,
    BorshSerialize,
    BorshDeserialize,
    Serialize,
    Deserialize,
)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FactBody {
    CreateAccount(CreateAccountFact),
    Transfer(TransferFact),
    UpdateKey(UpdateKeyFact),
    Mint(MintFact),
    RegisterCurrency(RegisterCurrencyFact),
    UpdateCurrency(UpdateCurrencyFact),
    CreateContractAccount(CreateContractAccountFact),
    Withdraw(WithdrawFact),
    UpdateOperator(UpdateContractListFact),
    UpdateRecipient(UpdateContractListFact),
    UpdateHandler(UpdateContractListFact),
    SuffrageCandidate(SuffrageCandidateFact),
    SuffrageJoin(SuffrageJoinFact),
    SuffrageDisjoin(SuffrageDisjoinFact),
    SuffrageExpel(SuffrageExpelFact),
}

impl FactBody {
    pub fn kind(&self) -> OperationKind {
        match self {
            FactBody::CreateAccount(_) => OperationKind::CreateAccount,
            FactBody::Transfer(_) => OperationKind::Transfer,
            FactBody::UpdateKey(_) => OperationKind::UpdateKey,
            FactBody::Mint(_) => OperationKind::Mint,
            FactBody::RegisterCurrency(_) => OperationKind::RegisterCurrency,
            FactBody::UpdateCurrency(_) => OperationKind::UpdateCurrency,
            FactBody::CreateContractAccount(_) => OperationKind::CreateContractAccount,
            FactBody::Withdraw(_) => OperationKind::Withdraw,
            FactBody::UpdateOperator(_) => OperationKind::UpdateOperator,
            FactBody::UpdateRecipient(_) => OperationKind::UpdateRecipient,
            FactBody::UpdateHandler(_) => OperationKind::UpdateHandler,
            FactBody::SuffrageCandidate(_) => OperationKind::SuffrageCandidate,
            FactBody::SuffrageJoin(_) => OperationKind::SuffrageJoin,
            FactBody::SuffrageDisjoin(_) => OperationKind::SuffrageDisjoin,
            FactBody::SuffrageExpel(_) => OperationKind::SuffrageExpel,
        }
    }

    pub fn is_valid(&self) -> Result<(), FactError> {
        match self {
            FactBody::CreateAccount(f) => f.is_valid(),
            FactBody::Transfer(f) => f.is_valid(),
            FactBody::UpdateKey(f) => f.is_valid(),
            FactBody::Mint(f) => f.is_valid(),
            FactBody::RegisterCurrency(f) => f.is_valid(),
            FactBody::UpdateCurrency(f) => f.is_valid(),
            FactBody::CreateContractAccount(f) => f.is_valid(),
            FactBody::Withdraw(f) => f.is_valid(),
            FactBody::UpdateOperator(f)
            | FactBody::UpdateRecipient(f)
            | FactBody::UpdateHandler(f) => f.is_valid(),
            FactBody::SuffrageCandidate(f) => f.is_valid(),
            FactBody::SuffrageJoin(f) => f.is_valid(),
            FactBody::SuffrageDisjoin(f) => f.is_valid(),
            FactBody::SuffrageExpel(f) => f.is_valid(),
        }
    }
}

/// Immutable, hash-identified fact.  The hash covers the token and the body.
#[derive(Clone, Debug, Eq, PartialEq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct Fact {
    hash: Buf32,

    /// Freshness value making otherwise equal facts distinct.
    #[serde(with = "hex::serde")]
    token: Vec<u8>,

    body: FactBody,
}

/// Canonical byte form the hash is computed over.
#[derive(BorshSerialize)]
struct FactPreimage<'a> {
    token: &'a [u8],
    body: &'a FactBody,
}

impl Fact {
    pub fn new(token: Vec<u8>, body: FactBody) -> Self {
        let hash = compute_hash(&token, &body);
        Self { hash, token, body }
    }

    pub fn hash(&self) -> &Buf32 {
        &self.hash
    }

    pub fn token(&self) -> &[u8] {
        &self.token
    }

    pub fn body(&self) -> &FactBody {
        &self.body
    }

    pub fn kind(&self) -> OperationKind {
        self.body.kind()
    }

    /// Canonical bytes of the fact, which the hash is computed over.
    pub fn bytes(&self) -> Vec<u8> {
        borsh::to_vec(&FactPreimage {
            token: &self.token,
            body: &self.body,
        })
        .unwrap_or_default()
    }

    /// Recomputes the hash and checks the payload on its own.
    pub fn is_valid(&self) -> Result<(), FactError> {
        let found = compute_hash(&self.token, &self.body);
        if found != self.hash {
            return Err(FactError::HashMismatch {
                expected: self.hash,
                found,
            });
        }

        if self.token.is_empty() {
            return Err(FactError::EmptyToken);
        }

        if self.token.len() > MAX_TOKEN_LEN {
            return Err(FactError::TokenTooLong(self.token.len()));
        }

        self.body.is_valid()
    }
}

fn compute_hash(token: &[u8], body: &FactBody) -> Buf32 {
    hash::compute_borsh_hash(&FactPreimage { token, body })
}

impl<'a> Arbitrary<'a> for Fact {
    fn arbitrary(u: &mut Unstructured<'a>) -> arbitrary::Result<Self> {
        let token: [u8; 8] = u.arbitrary()?;
        let body = FactBody::arbitrary(u)?;
        Ok(Fact::new(token.to_vec(), body))
    }
}

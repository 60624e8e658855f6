//! Maps operation kinds to processor constructors.  Built once at startup
//! and shared by every block.

use std::collections::BTreeMap;

use ledger_ops::OperationKind;

use crate::{
    errors::ExecError,
    processor::Processor,
    processors::{
        ContractListProcessor, CreateAccountProcessor, CreateContractAccountProcessor,
        MintProcessor, RegisterCurrencyProcessor, SuffrageCandidateProcessor,
        SuffrageDisjoinProcessor, SuffrageExpelProcessor, SuffrageJoinProcessor,
        TransferProcessor, UpdateCurrencyProcessor, UpdateKeyProcessor, WithdrawProcessor,
    },
};

pub type ProcessorFactory = fn() -> Box<dyn Processor>;

#[derive(Clone, Debug, Default)]
pub struct ProcessorRegistry {
    factories: BTreeMap<OperationKind, ProcessorFactory>,
}

impl ProcessorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with a processor for every operation kind.
    pub fn with_defaults() -> Result<Self, ExecError> {
        let mut reg = Self::new();
        reg.register(OperationKind::CreateAccount, CreateAccountProcessor::new_boxed)?;
        reg.register(OperationKind::Transfer, TransferProcessor::new_boxed)?;
        reg.register(OperationKind::UpdateKey, UpdateKeyProcessor::new_boxed)?;
        reg.register(OperationKind::Mint, MintProcessor::new_boxed)?;
        reg.register(OperationKind::RegisterCurrency, RegisterCurrencyProcessor::new_boxed)?;
        reg.register(OperationKind::UpdateCurrency, UpdateCurrencyProcessor::new_boxed)?;
        reg.register(
            OperationKind::CreateContractAccount,
            CreateContractAccountProcessor::new_boxed,
        )?;
        reg.register(OperationKind::Withdraw, WithdrawProcessor::new_boxed)?;
        reg.register(OperationKind::UpdateOperator, ContractListProcessor::new_operators)?;
        reg.register(OperationKind::UpdateRecipient, ContractListProcessor::new_recipients)?;
        reg.register(OperationKind::UpdateHandler, ContractListProcessor::new_handlers)?;
        reg.register(OperationKind::SuffrageCandidate, SuffrageCandidateProcessor::new_boxed)?;
        reg.register(OperationKind::SuffrageJoin, SuffrageJoinProcessor::new_boxed)?;
        reg.register(OperationKind::SuffrageDisjoin, SuffrageDisjoinProcessor::new_boxed)?;
        reg.register(OperationKind::SuffrageExpel, SuffrageExpelProcessor::new_boxed)?;
        Ok(reg)
    }

    pub fn register(
        &mut self,
        kind: OperationKind,
        factory: ProcessorFactory,
    ) -> Result<(), ExecError> {
        if self.factories.contains_key(&kind) {
            return Err(ExecError::DuplicateRegistration(kind));
        }

        self.factories.insert(kind, factory);
        Ok(())
    }

    pub fn get(&self, kind: OperationKind) -> Option<ProcessorFactory> {
        self.factories.get(&kind).copied()
    }

    pub fn contains(&self, kind: OperationKind) -> bool {
        self.factories.contains_key(&kind)
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

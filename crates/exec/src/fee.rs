//! Fee engine: what a set of amounts costs under each currency's policy.

use std::collections::BTreeMap;

use ledger_primitives::prelude::*;
use ledger_state::prelude::*;

use crate::{
    errors::{reject, ProcResult, ReasonError},
    helpers::{existing_design, get_balance},
};

/// Cost of moving some quantity of one currency.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FeeRequirement {
    amount: Big,
    fee: Big,
    receiver: Option<Address>,
    policy: CurrencyPolicy,
}

impl FeeRequirement {
    /// Sum of the amounts being moved.
    pub fn amount(&self) -> Big {
        self.amount
    }

    pub fn fee(&self) -> Big {
        self.fee
    }

    /// Amount plus fee, which the payer must hold.
    pub fn total(&self) -> ProcResult<Big> {
        checked_add(self.amount, self.fee)
    }

    pub fn receiver(&self) -> Option<&Address> {
        self.receiver.as_ref()
    }

    pub fn policy(&self) -> &CurrencyPolicy {
        &self.policy
    }
}

pub type RequiredFees = BTreeMap<CurrencyId, FeeRequirement>;

pub(crate) fn checked_add(a: Big, b: Big) -> ProcResult<Big> {
    match a.checked_add(b) {
        Some(v) => Ok(v),
        None => reject(ReasonError::InvalidOperation("amount overflow".to_owned())),
    }
}

/// Computes the fee for moving `amount` of `cid`.  Pass zero for operations
/// that only pay the base fee.
pub fn calculate_fee(
    acc: &dyn StateAccessor,
    cid: &CurrencyId,
    amount: Big,
) -> ProcResult<FeeRequirement> {
    let design = existing_design(acc, cid)?;
    let policy = design.policy().clone();
    let receiver = policy.feeer().receiver().cloned();

    if let Some(r) = &receiver {
        if get_balance(acc, r, cid)?.is_none() {
            return reject(ReasonError::FeeReceiverNotFound(r.clone(), cid.clone()));
        }
    }

    Ok(FeeRequirement {
        amount,
        fee: policy.feeer().fee(amount),
        receiver,
        policy,
    })
}

/// Accumulates, per currency, the amounts and the fees of every item.  Each
/// amount is charged its own fee.
pub fn calculate_items_fee<'a>(
    acc: &dyn StateAccessor,
    amounts: impl IntoIterator<Item = &'a Amount>,
) -> ProcResult<RequiredFees> {
    let mut required = RequiredFees::new();
    for am in amounts {
        let cid = am.currency();
        match required.get_mut(cid) {
            Some(req) => {
                req.amount = checked_add(req.amount, am.big())?;
                let fee = req.policy.feeer().fee(am.big());
                req.fee = checked_add(req.fee, fee)?;
            }
            None => {
                let req = calculate_fee(acc, cid, am.big())?;
                required.insert(cid.clone(), req);
            }
        }
    }

    Ok(required)
}

/// Checks that `holder` has at least amount plus fee of every currency,
/// returning the balances it read.  A holder that receives its own fees only
/// needs the amount.
pub fn check_enough_balance(
    holder: &Address,
    required: &RequiredFees,
    acc: &dyn StateAccessor,
) -> ProcResult<BTreeMap<CurrencyId, Amount>> {
    let mut balances = BTreeMap::new();
    for (cid, req) in required {
        let need = if req.receiver() == Some(holder) {
            req.amount()
        } else {
            req.total()?
        };
        let have = get_balance(acc, holder, cid)?
            .map(|a| a.big())
            .unwrap_or(Big::ZERO);

        if have < need {
            return reject(ReasonError::InsufficientBalance {
                address: holder.clone(),
                currency: cid.clone(),
                need,
                have,
            });
        }

        balances.insert(cid.clone(), Amount::new(cid.clone(), have));
    }

    Ok(balances)
}

#[cfg(test)]
mod tests {
    use ledger_test_utils::{
        genesis::{fixed_fee_policy, nil_fee_policy, GenesisBuilder},
        keys::{amount, currency, TestAccount},
    };

    use super::*;
    use crate::errors::ProcError;

    fn ratio_policy(receiver: &Address) -> CurrencyPolicy {
        CurrencyPolicy::new(
            Big::ZERO,
            Big::ZERO,
            Feeer::Ratio {
                receiver: receiver.clone(),
                ratio_ppm: 10_000,
                min: Big::from(2),
                max: Big::from(50),
            },
        )
    }

    #[test]
    fn test_items_fee_accumulates_per_currency() {
        let gen = TestAccount::new(1);
        let fee_recv = TestAccount::new(2);
        let acc = GenesisBuilder::new()
            .currency(&currency("CUR"), &gen.address, 1000, fixed_fee_policy(&fee_recv.address, 3))
            .balance(&fee_recv.address, amount("CUR", 0))
            .currency(&currency("DOL"), &gen.address, 1000, ratio_policy(&fee_recv.address))
            .balance(&fee_recv.address, amount("DOL", 0))
            .build();

        let items = [amount("CUR", 10), amount("DOL", 1000), amount("CUR", 5), amount("DOL", 10)];
        let req = calculate_items_fee(&acc, &items).unwrap();

        let cur = &req[&currency("CUR")];
        assert_eq!(cur.amount(), Big::from(15));
        assert_eq!(cur.fee(), Big::from(6));
        assert_eq!(cur.total().unwrap(), Big::from(21));
        assert_eq!(cur.receiver(), Some(&fee_recv.address));

        // 1% of 1000 is 10, 1% of 10 clamps up to the minimum of 2.
        let dol = &req[&currency("DOL")];
        assert_eq!(dol.fee(), Big::from(12));
    }

    #[test]
    fn test_items_fee_unknown_currency() {
        let acc = GenesisBuilder::new().build();
        assert!(matches!(
            calculate_items_fee(&acc, &[amount("CUR", 1)]),
            Err(ProcError::Reason(ReasonError::CurrencyNotFound(_)))
        ));
    }

    #[test]
    fn test_items_fee_missing_fee_receiver() {
        let gen = TestAccount::new(1);
        let fee_recv = TestAccount::new(2);
        let acc = GenesisBuilder::new()
            .currency(&currency("CUR"), &gen.address, 1000, fixed_fee_policy(&fee_recv.address, 3))
            .build();

        assert!(matches!(
            calculate_items_fee(&acc, &[amount("CUR", 1)]),
            Err(ProcError::Reason(ReasonError::FeeReceiverNotFound(..)))
        ));
    }

    #[test]
    fn test_check_enough_balance() {
        let gen = TestAccount::new(1);
        let acc = GenesisBuilder::new()
            .currency(&currency("CUR"), &gen.address, 100, nil_fee_policy())
            .build();

        let req = calculate_items_fee(&acc, &[amount("CUR", 100)]).unwrap();
        let bals = check_enough_balance(&gen.address, &req, &acc).unwrap();
        assert_eq!(bals[&currency("CUR")], amount("CUR", 100));

        let req = calculate_items_fee(&acc, &[amount("CUR", 101)]).unwrap();
        assert!(matches!(
            check_enough_balance(&gen.address, &req, &acc),
            Err(ProcError::Reason(ReasonError::InsufficientBalance { .. }))
        ));

        let other = TestAccount::new(9);
        assert!(check_enough_balance(&other.address, &req, &acc).is_err());
    }
}

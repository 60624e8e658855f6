//! Net balance settlement for one operation.
//!
//! Processors record every credit and debit an operation causes, including
//! fees, and this works out the net change per balance key.  An address
//! paying a fee to itself nets out naturally, and every key ends up with at
//! most one add or deduct value.

use std::collections::BTreeMap;

use ledger_primitives::prelude::*;
use ledger_state::prelude::*;

use crate::{
    errors::{reject, ProcResult, ReasonError},
    fee::{checked_add, FeeRequirement},
    helpers::{existing_design, get_balance},
};

#[derive(Clone, Debug, Default, Eq, PartialEq)]
struct Delta {
    credit: Big,
    debit: Big,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct BalanceDeltas {
    deltas: BTreeMap<(Address, CurrencyId), Delta>,
}

impl BalanceDeltas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.deltas.is_empty()
    }

    fn entry(&mut self, addr: &Address, cid: &CurrencyId) -> &mut Delta {
        self.deltas
            .entry((addr.clone(), cid.clone()))
            .or_default()
    }

    pub fn credit(&mut self, addr: &Address, amount: &Amount) -> ProcResult<()> {
        let d = self.entry(addr, amount.currency());
        d.credit = checked_add(d.credit, amount.big())?;
        Ok(())
    }

    pub fn debit(&mut self, addr: &Address, amount: &Amount) -> ProcResult<()> {
        let d = self.entry(addr, amount.currency());
        d.debit = checked_add(d.debit, amount.big())?;
        Ok(())
    }

    /// Moves the fee of `req` from `payer` to the fee receiver.
    pub fn pay_fee(
        &mut self,
        payer: &Address,
        cid: &CurrencyId,
        req: &FeeRequirement,
    ) -> ProcResult<()> {
        if req.fee().is_zero() {
            return Ok(());
        }

        let fee = Amount::new(cid.clone(), req.fee());
        self.debit(payer, &fee)?;
        if let Some(r) = req.receiver() {
            self.credit(r, &fee)?;
        }

        Ok(())
    }

    /// Checks that every net debit leaves at least the currency's minimum
    /// balance behind, measured against the snapshot.
    pub fn check_sufficient(&self, acc: &dyn StateAccessor) -> ProcResult<()> {
        let mut min_balances: BTreeMap<&CurrencyId, Big> = BTreeMap::new();

        for ((addr, cid), d) in &self.deltas {
            if d.debit <= d.credit {
                continue;
            }

            let min = match min_balances.get(cid) {
                Some(m) => *m,
                None => {
                    let m = existing_design(acc, cid)?.policy().min_balance();
                    min_balances.insert(cid, m);
                    m
                }
            };

            let need = checked_add(d.debit.saturating_sub(d.credit), min)?;
            let have = get_balance(acc, addr, cid)?
                .map(|a| a.big())
                .unwrap_or(Big::ZERO);

            if have < need {
                return reject(ReasonError::InsufficientBalance {
                    address: addr.clone(),
                    currency: cid.clone(),
                    need,
                    have,
                });
            }
        }

        Ok(())
    }

    /// Converts the net changes into merge values, skipping keys that net
    /// out to zero.
    pub fn into_merge_values(self) -> Vec<StateMergeValue> {
        let mut out = Vec::with_capacity(self.deltas.len());
        for ((addr, cid), d) in self.deltas {
            if d.credit > d.debit {
                let a = Amount::new(cid, d.credit.saturating_sub(d.debit));
                out.push(StateMergeValue::add_balance(&addr, a));
            } else if d.debit > d.credit {
                let a = Amount::new(cid, d.debit.saturating_sub(d.credit));
                out.push(StateMergeValue::deduct_balance(&addr, a));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use ledger_test_utils::{
        genesis::{fixed_fee_policy, nil_fee_policy, GenesisBuilder},
        keys::{amount, currency, TestAccount},
    };
    use proptest::prelude::*;

    use super::*;
    use crate::{errors::ProcError, fee::calculate_items_fee};

    fn settle(
        sender_bal: u64,
        amount_v: u64,
        fee_v: u64,
        self_receiver: bool,
    ) -> (MemStateAccessor, Address, Address, Address, ProcResult<Vec<StateMergeValue>>) {
        let sender = TestAccount::new(1).address;
        let target = TestAccount::new(2).address;
        let fee_recv = if self_receiver {
            sender.clone()
        } else {
            TestAccount::new(3).address
        };
        let cid = currency("CUR");

        let policy = if fee_v == 0 {
            nil_fee_policy()
        } else {
            fixed_fee_policy(&fee_recv, fee_v)
        };

        let mut gb = GenesisBuilder::new().currency(&cid, &sender, sender_bal, policy);
        if !self_receiver {
            gb = gb.balance(&fee_recv, amount("CUR", 0));
        }
        let acc = gb.build();

        let res = (|| -> ProcResult<Vec<StateMergeValue>> {
            let am = amount("CUR", amount_v);
            let req = calculate_items_fee(&acc, [&am])?;
            let mut deltas = BalanceDeltas::new();
            deltas.debit(&sender, &am)?;
            deltas.credit(&target, &am)?;
            deltas.pay_fee(&sender, &cid, &req[&cid])?;
            deltas.check_sufficient(&acc)?;
            Ok(deltas.into_merge_values())
        })();

        (acc, sender, target, fee_recv, res)
    }

    fn apply(acc: &MemStateAccessor, values: Vec<StateMergeValue>) -> MemStateAccessor {
        let mut sess = StateMergeSession::new(acc, 1);
        sess.merge(Buf32::zero(), values).unwrap();
        let mut out = acc.clone();
        out.apply(sess.finish().unwrap());
        out
    }

    fn bal(acc: &MemStateAccessor, addr: &Address) -> u128 {
        acc.get(&StateKey::balance(addr, &currency("CUR")))
            .and_then(|s| s.value().as_balance().cloned())
            .map(|a| a.big().to_string().parse().unwrap())
            .unwrap_or(0)
    }

    #[test]
    fn test_self_fee_receiver_nets_to_one_deduction() {
        let (_, sender, _, _, res) = settle(100, 10, 3, true);
        let values = res.unwrap();

        let sender_values: Vec<_> = values
            .iter()
            .filter(|v| v.key() == &StateKey::balance(&sender, &currency("CUR")))
            .collect();
        assert_eq!(sender_values.len(), 1);
        assert_eq!(
            sender_values[0].op(),
            &MergeOp::DeductBalance(amount("CUR", 10))
        );
    }

    #[test]
    fn test_insufficient_counts_fee() {
        let (_, _, _, _, res) = settle(12, 10, 3, false);
        assert!(matches!(
            res,
            Err(ProcError::Reason(ReasonError::InsufficientBalance { .. }))
        ));

        let (_, _, _, _, res) = settle(12, 10, 3, true);
        assert!(res.is_ok());
    }

    proptest! {
        #[test]
        fn prop_settlement_conserves(
            sender_bal in 0u64..10_000,
            amount_v in 1u64..5_000,
            fee_v in 0u64..100,
            self_receiver in any::<bool>(),
        ) {
            let (acc, sender, target, fee_recv, res) =
                settle(sender_bal, amount_v, fee_v, self_receiver);

            let paid_fee = if self_receiver { 0 } else { fee_v };
            let need = amount_v + paid_fee;

            match res {
                Err(_) => prop_assert!(sender_bal < need),
                Ok(values) => {
                    prop_assert!(sender_bal >= need);
                    let after = apply(&acc, values);

                    prop_assert_eq!(bal(&after, &sender), (sender_bal - need) as u128);
                    prop_assert_eq!(bal(&after, &target), amount_v as u128);
                    if !self_receiver {
                        prop_assert_eq!(bal(&after, &fee_recv), fee_v as u128);
                    }

                    let before_total = sender_bal as u128;
                    let after_total = bal(&after, &sender)
                        + bal(&after, &target)
                        + if self_receiver { 0 } else { bal(&after, &fee_recv) };
                    prop_assert_eq!(before_total, after_total);
                }
            }
        }
    }
}

//! Validator set changes.
//!
//! All four processors claim their target in the block's
//! [`SuffrageContext`] during pre-processing, so that a disjoin and an expel
//! of the same node, or two joins of the same candidate, can't both land in
//! one block.

use ledger_ops::{
    facts::{SuffrageCandidateFact, SuffrageDisjoinFact, SuffrageExpelFact, SuffrageJoinFact},
    FactBody, Operation, OperationKind,
};
use ledger_primitives::prelude::*;
use ledger_state::prelude::*;

use crate::{
    errors::{reject, ProcResult, ReasonError},
    helpers::{check_node_signs_excluding, get_candidates, get_suffrage, signed_with},
    processor::{mismatched, ProcContext, Processor},
    session::{SuffrageContext, SuffrageSlot},
};

fn check_unclaimed(
    suffrage: &SuffrageContext,
    slot: SuffrageSlot,
    addr: &Address,
    op: &Operation,
) -> ProcResult<()> {
    if !suffrage.is_claimed_by_other(slot, addr, op.hash()) {
        return Ok(());
    }

    match slot {
        SuffrageSlot::Removal => reject(ReasonError::AlreadyWithdrawn(addr.clone())),
        SuffrageSlot::Candidate => reject(ReasonError::CandidateExists(addr.clone())),
        SuffrageSlot::Join => reject(ReasonError::Duplicated(format!("join of {addr}"))),
    }
}

/// Registers a node as a candidate for joining.
#[derive(Debug, Default, Eq, PartialEq)]
pub struct SuffrageCandidateProcessor {
    candidate: Option<SuffrageCandidate>,
}

impl SuffrageCandidateProcessor {
    pub fn new_boxed() -> Box<dyn Processor> {
        Box::<Self>::default()
    }

    fn fact<'o>(&self, op: &'o Operation) -> ProcResult<&'o SuffrageCandidateFact> {
        match op.fact().body() {
            FactBody::SuffrageCandidate(f) => Ok(f),
            _ => Err(mismatched(op, self.kind())),
        }
    }

    fn check(
        &mut self,
        op: &Operation,
        ctx: &ProcContext<'_>,
        acc: &dyn StateAccessor,
    ) -> ProcResult<()> {
        let fact = self.fact(op)?;

        if !signed_with(op, &fact.public_key) {
            return reject(ReasonError::SignerMismatch(fact.address.clone()));
        }

        if get_suffrage(acc)?.exists(&fact.address) {
            return reject(ReasonError::AlreadySuffrageMember(fact.address.clone()));
        }

        let live = get_candidates(acc)?
            .get(&fact.address)
            .is_some_and(|c| !c.is_expired(ctx.height));
        if live {
            return reject(ReasonError::CandidateExists(fact.address.clone()));
        }

        check_unclaimed(ctx.suffrage, SuffrageSlot::Candidate, &fact.address, op)?;

        self.candidate = Some(SuffrageCandidate::new(
            fact.address.clone(),
            fact.public_key,
            ctx.height + 1,
            ctx.height.saturating_add(ctx.params.candidate_lifespan),
        ));
        Ok(())
    }
}

impl Processor for SuffrageCandidateProcessor {
    fn kind(&self) -> OperationKind {
        OperationKind::SuffrageCandidate
    }

    fn pre_process(
        &mut self,
        op: &Operation,
        ctx: &mut ProcContext<'_>,
        acc: &dyn StateAccessor,
    ) -> ProcResult<()> {
        self.check(op, ctx, acc)?;
        let fact = self.fact(op)?;
        ctx.suffrage
            .claim(SuffrageSlot::Candidate, &fact.address, *op.hash());
        Ok(())
    }

    fn process(
        &mut self,
        op: &Operation,
        ctx: &mut ProcContext<'_>,
        acc: &dyn StateAccessor,
    ) -> ProcResult<Vec<StateMergeValue>> {
        self.check(op, ctx, acc)?;
        let fact = self.fact(op)?;

        let Some(cand) = self.candidate.take() else {
            return reject(ReasonError::CandidateNotFound(fact.address.clone()));
        };

        Ok(vec![StateMergeValue::candidate_add(cand)])
    }

    fn reset(&mut self) {
        self.candidate = None;
    }
}

/// Turns a registered candidate into a suffrage member.
#[derive(Debug, Default, Eq, PartialEq)]
pub struct SuffrageJoinProcessor {
    node: Option<SuffrageNode>,
}

impl SuffrageJoinProcessor {
    pub fn new_boxed() -> Box<dyn Processor> {
        Box::<Self>::default()
    }

    fn fact<'o>(&self, op: &'o Operation) -> ProcResult<&'o SuffrageJoinFact> {
        match op.fact().body() {
            FactBody::SuffrageJoin(f) => Ok(f),
            _ => Err(mismatched(op, self.kind())),
        }
    }

    fn check(
        &mut self,
        op: &Operation,
        ctx: &ProcContext<'_>,
        acc: &dyn StateAccessor,
    ) -> ProcResult<()> {
        let fact = self.fact(op)?;

        if get_suffrage(acc)?.exists(&fact.candidate) {
            return reject(ReasonError::AlreadySuffrageMember(fact.candidate.clone()));
        }

        let candidates = get_candidates(acc)?;
        let Some(cand) = candidates
            .get(&fact.candidate)
            .filter(|c| !c.is_expired(ctx.height))
        else {
            return reject(ReasonError::CandidateNotFound(fact.candidate.clone()));
        };

        if cand.start() != fact.start {
            return reject(ReasonError::StartMismatch {
                expected: cand.start(),
                found: fact.start,
            });
        }

        if !signed_with(op, cand.public_key()) {
            return reject(ReasonError::SignerMismatch(fact.candidate.clone()));
        }

        check_unclaimed(ctx.suffrage, SuffrageSlot::Join, &fact.candidate, op)?;

        self.node = Some(SuffrageNode::new(
            cand.address().clone(),
            *cand.public_key(),
            cand.start(),
        ));
        Ok(())
    }
}

impl Processor for SuffrageJoinProcessor {
    fn kind(&self) -> OperationKind {
        OperationKind::SuffrageJoin
    }

    fn pre_process(
        &mut self,
        op: &Operation,
        ctx: &mut ProcContext<'_>,
        acc: &dyn StateAccessor,
    ) -> ProcResult<()> {
        self.check(op, ctx, acc)?;
        let fact = self.fact(op)?;
        ctx.suffrage
            .claim(SuffrageSlot::Join, &fact.candidate, *op.hash());
        Ok(())
    }

    fn process(
        &mut self,
        op: &Operation,
        ctx: &mut ProcContext<'_>,
        acc: &dyn StateAccessor,
    ) -> ProcResult<Vec<StateMergeValue>> {
        self.check(op, ctx, acc)?;
        let fact = self.fact(op)?;

        let Some(node) = self.node.take() else {
            return reject(ReasonError::CandidateNotFound(fact.candidate.clone()));
        };

        Ok(vec![
            StateMergeValue::suffrage_join(node),
            StateMergeValue::candidate_remove(fact.candidate.clone()),
        ])
    }

    fn reset(&mut self) {
        self.node = None;
    }
}

/// A member leaving the suffrage on its own.
#[derive(Debug, Default, Eq, PartialEq)]
pub struct SuffrageDisjoinProcessor;

impl SuffrageDisjoinProcessor {
    pub fn new_boxed() -> Box<dyn Processor> {
        Box::new(Self)
    }

    fn fact<'o>(&self, op: &'o Operation) -> ProcResult<&'o SuffrageDisjoinFact> {
        match op.fact().body() {
            FactBody::SuffrageDisjoin(f) => Ok(f),
            _ => Err(mismatched(op, self.kind())),
        }
    }

    fn check(
        &self,
        op: &Operation,
        ctx: &ProcContext<'_>,
        acc: &dyn StateAccessor,
    ) -> ProcResult<()> {
        let fact = self.fact(op)?;

        let nodes = get_suffrage(acc)?;
        let Some(node) = nodes.get(&fact.node) else {
            return reject(ReasonError::NotSuffrageMember(fact.node.clone()));
        };

        if node.start() != fact.start {
            return reject(ReasonError::StartMismatch {
                expected: node.start(),
                found: fact.start,
            });
        }

        if !signed_with(op, node.public_key()) {
            return reject(ReasonError::SignerMismatch(fact.node.clone()));
        }

        check_unclaimed(ctx.suffrage, SuffrageSlot::Removal, &fact.node, op)
    }
}

impl Processor for SuffrageDisjoinProcessor {
    fn kind(&self) -> OperationKind {
        OperationKind::SuffrageDisjoin
    }

    fn pre_process(
        &mut self,
        op: &Operation,
        ctx: &mut ProcContext<'_>,
        acc: &dyn StateAccessor,
    ) -> ProcResult<()> {
        self.check(op, ctx, acc)?;
        let fact = self.fact(op)?;
        ctx.suffrage
            .claim(SuffrageSlot::Removal, &fact.node, *op.hash());
        Ok(())
    }

    fn process(
        &mut self,
        op: &Operation,
        ctx: &mut ProcContext<'_>,
        acc: &dyn StateAccessor,
    ) -> ProcResult<Vec<StateMergeValue>> {
        self.check(op, ctx, acc)?;
        let fact = self.fact(op)?;
        Ok(vec![StateMergeValue::suffrage_remove(fact.node.clone())])
    }

    fn reset(&mut self) {}
}

/// Removal of a member by the rest of the suffrage.
#[derive(Debug, Default, Eq, PartialEq)]
pub struct SuffrageExpelProcessor;

impl SuffrageExpelProcessor {
    pub fn new_boxed() -> Box<dyn Processor> {
        Box::new(Self)
    }

    fn fact<'o>(&self, op: &'o Operation) -> ProcResult<&'o SuffrageExpelFact> {
        match op.fact().body() {
            FactBody::SuffrageExpel(f) => Ok(f),
            _ => Err(mismatched(op, self.kind())),
        }
    }

    fn check(
        &self,
        op: &Operation,
        ctx: &ProcContext<'_>,
        acc: &dyn StateAccessor,
    ) -> ProcResult<()> {
        let fact = self.fact(op)?;

        if !fact.in_window(ctx.height) {
            return reject(ReasonError::OutsideExpelWindow(
                ctx.height, fact.start, fact.end,
            ));
        }

        if !get_suffrage(acc)?.exists(&fact.node) {
            return reject(ReasonError::NotSuffrageMember(fact.node.clone()));
        }

        check_node_signs_excluding(acc, op, ctx.params, &fact.node)?;
        check_unclaimed(ctx.suffrage, SuffrageSlot::Removal, &fact.node, op)
    }
}

impl Processor for SuffrageExpelProcessor {
    fn kind(&self) -> OperationKind {
        OperationKind::SuffrageExpel
    }

    fn pre_process(
        &mut self,
        op: &Operation,
        ctx: &mut ProcContext<'_>,
        acc: &dyn StateAccessor,
    ) -> ProcResult<()> {
        self.check(op, ctx, acc)?;
        let fact = self.fact(op)?;
        ctx.suffrage
            .claim(SuffrageSlot::Removal, &fact.node, *op.hash());
        Ok(())
    }

    fn process(
        &mut self,
        op: &Operation,
        ctx: &mut ProcContext<'_>,
        acc: &dyn StateAccessor,
    ) -> ProcResult<Vec<StateMergeValue>> {
        self.check(op, ctx, acc)?;
        let fact = self.fact(op)?;
        Ok(vec![StateMergeValue::suffrage_remove(fact.node.clone())])
    }

    fn reset(&mut self) {}
}

#[cfg(test)]
mod tests {
    use ledger_test_utils::{
        genesis::GenesisBuilder,
        keys::TestNode,
        ops::sign_node_op,
    };

    use super::*;
    use crate::processors::test_support::{apply, params, reason, run};

    fn nodes(n: u8) -> Vec<TestNode> {
        (0..n).map(TestNode::new).collect()
    }

    fn suffrage(acc: &MemStateAccessor) -> SuffrageNodes {
        acc.get(&StateKey::suffrage())
            .and_then(|s| s.value().as_suffrage().cloned())
            .unwrap_or_default()
    }

    fn candidates(acc: &MemStateAccessor) -> SuffrageCandidates {
        acc.get(&StateKey::suffrage_candidate())
            .and_then(|s| s.value().as_suffrage_candidates().cloned())
            .unwrap_or_default()
    }

    /// Pre-processes then processes `op` against a context shared with
    /// other calls.
    fn run_shared(
        p: &mut dyn Processor,
        op: &Operation,
        acc: &dyn StateAccessor,
        height: Height,
        suffrage: &mut SuffrageContext,
    ) -> ProcResult<Vec<StateMergeValue>> {
        let params = params();
        let mut ctx = ProcContext {
            params: &params,
            height,
            workers: None,
            suffrage,
        };
        p.pre_process(op, &mut ctx, acc)?;
        p.process(op, &mut ctx, acc)
    }

    #[test]
    fn test_candidate_then_join() {
        let members = nodes(3);
        let newcomer = TestNode::new(10);
        let acc = GenesisBuilder::new().suffrage(&members).build();

        let op = sign_node_op(
            &params().network_id,
            FactBody::SuffrageCandidate(SuffrageCandidateFact {
                address: newcomer.address.clone(),
                public_key: newcomer.public_key,
            }),
            &[&newcomer],
        );
        let mut p = SuffrageCandidateProcessor::default();
        let acc = apply(&acc, run(&mut p, &op, &acc, 10).unwrap());

        let cand = candidates(&acc).get(&newcomer.address).cloned().unwrap();
        assert_eq!(cand.start(), 11);
        assert_eq!(cand.deadline(), 10 + params().candidate_lifespan);

        let op = sign_node_op(
            &params().network_id,
            FactBody::SuffrageJoin(SuffrageJoinFact {
                candidate: newcomer.address.clone(),
                start: 11,
            }),
            &[&newcomer],
        );
        let mut p = SuffrageJoinProcessor::default();
        let acc = apply(&acc, run(&mut p, &op, &acc, 12).unwrap());

        let node = suffrage(&acc).get(&newcomer.address).cloned().unwrap();
        assert_eq!(node.start(), 11);
        assert_eq!(node.public_key(), &newcomer.public_key);
        assert!(candidates(&acc).get(&newcomer.address).is_none());
    }

    #[test]
    fn test_candidate_already_member() {
        let members = nodes(2);
        let acc = GenesisBuilder::new().suffrage(&members).build();
        let op = sign_node_op(
            &params().network_id,
            FactBody::SuffrageCandidate(SuffrageCandidateFact {
                address: members[0].address.clone(),
                public_key: members[0].public_key,
            }),
            &[&members[0]],
        );

        let mut p = SuffrageCandidateProcessor::default();
        assert_eq!(
            reason(run(&mut p, &op, &acc, 3)),
            ReasonError::AlreadySuffrageMember(members[0].address.clone())
        );
    }

    #[test]
    fn test_join_start_and_signer_checked() {
        let newcomer = TestNode::new(10);
        let stranger = TestNode::new(11);
        let acc = GenesisBuilder::new()
            .suffrage(&nodes(1))
            .candidates(vec![SuffrageCandidate::new(
                newcomer.address.clone(),
                newcomer.public_key,
                5,
                100,
            )])
            .build();

        let join = |start, signer: &TestNode| {
            sign_node_op(
                &params().network_id,
                FactBody::SuffrageJoin(SuffrageJoinFact {
                    candidate: newcomer.address.clone(),
                    start,
                }),
                &[signer],
            )
        };

        let mut p = SuffrageJoinProcessor::default();
        assert_eq!(
            reason(run(&mut p, &join(6, &newcomer), &acc, 7)),
            ReasonError::StartMismatch {
                expected: 5,
                found: 6
            }
        );
        assert_eq!(
            reason(run(&mut p, &join(5, &stranger), &acc, 7)),
            ReasonError::SignerMismatch(newcomer.address.clone())
        );
        assert_eq!(
            reason(run(&mut p, &join(5, &newcomer), &acc, 101)),
            ReasonError::CandidateNotFound(newcomer.address.clone())
        );
    }

    #[test]
    fn test_disjoin_then_expel_same_block() {
        let members = nodes(4);
        let target = &members[3];
        let acc = GenesisBuilder::new().suffrage(&members).build();

        let disjoin = sign_node_op(
            &params().network_id,
            FactBody::SuffrageDisjoin(SuffrageDisjoinFact {
                node: target.address.clone(),
                start: 0,
            }),
            &[target],
        );
        let expel = sign_node_op(
            &params().network_id,
            FactBody::SuffrageExpel(SuffrageExpelFact {
                node: target.address.clone(),
                start: 0,
                end: 10,
            }),
            &[&members[0], &members[1], &members[2]],
        );

        let mut block = SuffrageContext::default();
        let values = run_shared(
            &mut SuffrageDisjoinProcessor,
            &disjoin,
            &acc,
            5,
            &mut block,
        )
        .unwrap();
        assert_eq!(
            reason(run_shared(
                &mut SuffrageExpelProcessor,
                &expel,
                &acc,
                5,
                &mut block
            )),
            ReasonError::AlreadyWithdrawn(target.address.clone())
        );

        let after = apply(&acc, values);
        assert_eq!(suffrage(&after).len(), 3);
        assert!(!suffrage(&after).exists(&target.address));
    }

    #[test]
    fn test_expel_threshold_excludes_target() {
        let members = nodes(4);
        let target = &members[3];
        let acc = GenesisBuilder::new().suffrage(&members).build();

        // The target's own sign doesn't count, 2 of the other 3 isn't enough.
        let op = sign_node_op(
            &params().network_id,
            FactBody::SuffrageExpel(SuffrageExpelFact {
                node: target.address.clone(),
                start: 0,
                end: 10,
            }),
            &[&members[0], &members[1], target],
        );
        assert_eq!(
            reason(run(&mut SuffrageExpelProcessor, &op, &acc, 5)),
            ReasonError::InvalidNodeSigns { got: 2, need: 3 }
        );
    }

    #[test]
    fn test_expel_outside_window() {
        let members = nodes(3);
        let acc = GenesisBuilder::new().suffrage(&members).build();
        let op = sign_node_op(
            &params().network_id,
            FactBody::SuffrageExpel(SuffrageExpelFact {
                node: members[2].address.clone(),
                start: 10,
                end: 20,
            }),
            &[&members[0], &members[1]],
        );

        assert_eq!(
            reason(run(&mut SuffrageExpelProcessor, &op, &acc, 21)),
            ReasonError::OutsideExpelWindow(21, 10, 20)
        );
    }

    #[test]
    fn test_disjoin_unknown_node() {
        let acc = GenesisBuilder::new().suffrage(&nodes(2)).build();
        let outsider = TestNode::new(50);
        let op = sign_node_op(
            &params().network_id,
            FactBody::SuffrageDisjoin(SuffrageDisjoinFact {
                node: outsider.address.clone(),
                start: 0,
            }),
            &[&outsider],
        );

        assert_eq!(
            reason(run(&mut SuffrageDisjoinProcessor, &op, &acc, 2)),
            ReasonError::NotSuffrageMember(outsider.address)
        );
    }
}

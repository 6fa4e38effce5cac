//! Multi-endpoint failover over a set of beacon nodes.
//!
//! The proposal pipeline and registration scheduler each see a single
//! aggregate response per call; this crate is the thing that decides how
//! many real beacon nodes that response is actually backed by.

use eth2::BeaconNodeClient;
use std::future::Future;
use std::sync::Arc;
use strum::Display;
use tracing::{debug, warn};

/// Distinguishes submission calls that should reach every configured beacon
/// node (so that the artifact propagates through as much of the network as
/// possible) from read calls that only need one good answer.
///
/// The spec leaves "submit to every endpoint or only the currently-selected
/// one" to this client's policy; this crate's choice is to broadcast every
/// submission topic and treat it as successful if any one node accepts it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ApiTopic {
    Blocks,
    BlindedBlocks,
    Registrations,
    ProposalPreparations,
}

#[derive(Debug)]
pub struct Error<E> {
    pub errors: Vec<(usize, E)>,
}

impl<E: std::fmt::Display> std::fmt::Display for Error<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "all {} candidate(s) failed:", self.errors.len())?;
        for (i, e) in &self.errors {
            write!(f, " [{i}] {e};")?;
        }
        Ok(())
    }
}

impl<E: std::fmt::Debug + std::fmt::Display> std::error::Error for Error<E> {}

/// A set of beacon-node clients tried in configured order.
pub struct BeaconNodeFallback<C> {
    candidates: Vec<Arc<C>>,
}

impl<C> Clone for BeaconNodeFallback<C> {
    fn clone(&self) -> Self {
        Self {
            candidates: self.candidates.clone(),
        }
    }
}

impl<C: BeaconNodeClient> BeaconNodeFallback<C> {
    pub fn new(candidates: Vec<Arc<C>>) -> Self {
        Self { candidates }
    }

    pub fn num_candidates(&self) -> usize {
        self.candidates.len()
    }

    /// Tries each candidate in order, returning the first success. If every
    /// candidate fails, returns an aggregate error carrying each failure.
    pub async fn first_success<'a, F, O, Fut, E>(&'a self, func: F) -> Result<O, Error<E>>
    where
        F: Fn(&'a C) -> Fut,
        Fut: Future<Output = Result<O, E>>,
        E: std::fmt::Display,
    {
        let mut errors = Vec::new();
        for (i, candidate) in self.candidates.iter().enumerate() {
            match func(candidate).await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    warn!(candidate = i, error = %e, "beacon node candidate failed");
                    errors.push((i, e));
                }
            }
        }
        Err(Error { errors })
    }

    /// Broadcasts to every candidate, succeeding if at least one accepts.
    /// Used for submission topics, where propagating through more of the
    /// network is strictly better than picking a single endpoint.
    pub async fn request<'a, F, Fut, E>(&'a self, topic: ApiTopic, func: F) -> Result<(), Error<E>>
    where
        F: Fn(&'a C) -> Fut,
        Fut: Future<Output = Result<(), E>>,
        E: std::fmt::Display,
    {
        let mut errors = Vec::new();
        let mut any_ok = false;
        for (i, candidate) in self.candidates.iter().enumerate() {
            match func(candidate).await {
                Ok(()) => any_ok = true,
                Err(e) => {
                    debug!(candidate = i, %topic, error = %e, "candidate rejected submission");
                    errors.push((i, e));
                }
            }
        }
        if any_ok {
            Ok(())
        } else {
            Err(Error { errors })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eth2::types::{GetBlockResponse, ProposalPreparationData, ProposerDutiesResponse};
    use eth2::{BeaconNodeClient, Error};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use types::{Epoch, Graffiti, SignatureBytes, SignedValidatorRegistrationData, SignedVersionedProposal, Slot};

    /// Fails on every call except `proposer_duties`, which succeeds after
    /// `fail_until` prior candidates in the list have failed.
    struct MockNode {
        should_fail: bool,
        calls: AtomicUsize,
    }

    impl BeaconNodeClient for MockNode {
        async fn proposer_duties(&self, _epoch: Epoch) -> Result<ProposerDutiesResponse, Error> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.should_fail {
                Err(Error::TransportError("mock failure".into()))
            } else {
                Ok(ProposerDutiesResponse {
                    dependent_root: Default::default(),
                    data: Some(vec![]),
                })
            }
        }

        async fn get_block(
            &self,
            _slot: Slot,
            _graffiti: Graffiti,
            _randao_reveal: SignatureBytes,
        ) -> Result<GetBlockResponse, Error> {
            unimplemented!("not exercised by these tests")
        }

        async fn submit_block(&self, _proposal: &SignedVersionedProposal) -> Result<(), Error> {
            if self.should_fail {
                Err(Error::TransportError("mock failure".into()))
            } else {
                Ok(())
            }
        }

        async fn submit_blinded_block(&self, _proposal: &SignedVersionedProposal) -> Result<(), Error> {
            self.submit_block(_proposal).await
        }

        async fn submit_validator_registrations(
            &self,
            _registrations: &[SignedValidatorRegistrationData],
        ) -> Result<(), Error> {
            if self.should_fail {
                Err(Error::TransportError("mock failure".into()))
            } else {
                Ok(())
            }
        }

        async fn submit_proposal_preparations(
            &self,
            _preparations: &[ProposalPreparationData],
        ) -> Result<(), Error> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn first_success_skips_failing_candidates() {
        let fallback = BeaconNodeFallback::new(vec![
            Arc::new(MockNode {
                should_fail: true,
                calls: AtomicUsize::new(0),
            }),
            Arc::new(MockNode {
                should_fail: false,
                calls: AtomicUsize::new(0),
            }),
        ]);

        let result = fallback
            .first_success(|node| node.proposer_duties(Epoch::new(1)))
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn first_success_returns_aggregate_error_when_all_fail() {
        let fallback = BeaconNodeFallback::new(vec![
            Arc::new(MockNode {
                should_fail: true,
                calls: AtomicUsize::new(0),
            }),
            Arc::new(MockNode {
                should_fail: true,
                calls: AtomicUsize::new(0),
            }),
        ]);

        let result = fallback
            .first_success(|node| node.proposer_duties(Epoch::new(1)))
            .await;
        assert_eq!(result.unwrap_err().errors.len(), 2);
    }

    #[tokio::test]
    async fn request_broadcasts_and_succeeds_if_any_node_accepts() {
        let fallback = BeaconNodeFallback::new(vec![
            Arc::new(MockNode {
                should_fail: true,
                calls: AtomicUsize::new(0),
            }),
            Arc::new(MockNode {
                should_fail: false,
                calls: AtomicUsize::new(0),
            }),
        ]);

        let regs: Vec<SignedValidatorRegistrationData> = vec![];
        let result = fallback
            .request(ApiTopic::Registrations, |node| {
                node.submit_validator_registrations(&regs)
            })
            .await;
        assert!(result.is_ok());
    }
}

// src/api/sequential.rs
//! Sequential orchestration: spaces in order, objects in page order, one
//! request at a time.

use super::fetcher::{fetch_object, FetchTarget};
use super::pagination::ObjectIds;
use super::types::FetchOutcome;
use super::{ApiContext, Transport};
use crate::types::SpaceId;
use std::sync::Arc;

/// Lazy sequence of fetch outcomes over every resolved space.
///
/// Object failures are yielded and iteration goes on, unless the failure is
/// an authentication or transport error, which ends the sequence. A listing
/// failure is yielded as a `Failed` outcome without an object id and also
/// ends the sequence.
pub struct SequentialOutcomes {
    transport: Arc<dyn Transport>,
    ctx: ApiContext,
    spaces: std::vec::IntoIter<(SpaceId, String)>,
    current: Option<(String, ObjectIds)>,
    done: bool,
}

impl SequentialOutcomes {
    pub fn new(
        transport: Arc<dyn Transport>,
        ctx: ApiContext,
        spaces: Vec<(SpaceId, String)>,
    ) -> Self {
        Self {
            transport,
            ctx,
            spaces: spaces.into_iter(),
            current: None,
            done: false,
        }
    }
}

impl Iterator for SequentialOutcomes {
    type Item = FetchOutcome;

    fn next(&mut self) -> Option<FetchOutcome> {
        while !self.done {
            let Some((space_name, ids)) = self.current.as_mut() else {
                let (space_id, space_name) = self.spaces.next()?;
                log::debug!("Loading space {} ({})", space_name, space_id);
                let ids = ObjectIds::new(self.transport.clone(), self.ctx.clone(), space_id);
                self.current = Some((space_name, ids));
                continue;
            };

            match ids.next() {
                Some(Ok(object_id)) => {
                    let target = FetchTarget {
                        space_id: ids.space_id(),
                        space_name,
                        object_id: &object_id,
                    };
                    let outcome = fetch_object(self.transport.as_ref(), &self.ctx, target);
                    if outcome.ends_run() {
                        log::debug!("Stopping after fatal failure on {}", object_id);
                        self.done = true;
                    }
                    return Some(outcome);
                }
                Some(Err(error)) => {
                    self.done = true;
                    return Some(FetchOutcome::Failed {
                        space_id: ids.space_id().clone(),
                        object_id: None,
                        error,
                    });
                }
                None => self.current = None,
            }
        }
        None
    }
}

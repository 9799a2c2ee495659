//! Repeated extraction filtered by a trigger

use prefill_core::{Bindings, PathEvaluator};

use crate::field::{ExtractionContext, SequencePayload};

/// Populate a sequence from every node `path` selects under `node`.
///
/// Each candidate is extracted into a fresh clone of the prototype; clones the
/// trigger rejects are dropped. `bindings` apply to candidate selection and
/// to the clones' own paths. Returns the number of accepted clones.
pub(crate) fn populate<E: PathEvaluator>(
    payload: &mut SequencePayload,
    name: &str,
    path: &str,
    ctx: &ExtractionContext<'_, E>,
    node: E::Node,
    bindings: &Bindings,
) -> usize {
    let candidates = ctx.evaluator.locate_all_bound(node, path, bindings);
    payload.examined = candidates.len();

    for candidate in candidates {
        let mut clone = payload.prototype.fresh_clone();
        clone.extract(ctx, candidate, bindings);

        let accepted = match &payload.trigger {
            Some(trigger) => {
                let accepted = trigger.accept(&clone);
                if accepted {
                    trigger.contribute(&clone, &mut payload.side_channel);
                }
                accepted
            }
            None => true,
        };

        if accepted {
            payload.accepted.push(clone);
        }
    }

    tracing::debug!(
        "Sequence '{}': accepted {} of {} candidates",
        name,
        payload.accepted.len(),
        payload.examined
    );
    payload.accepted.len()
}

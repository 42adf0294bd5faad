//! Resolve which funnel a request was sampled under.

use std::collections::BTreeSet;

use crate::error::{ExtrapolationError, ExtrapolationResult};
use crate::model::{ActionRequest, FilterOp, FilterValue};

/// Extract the single funnel id referenced by `request`'s filters on
/// `funnel_id_field`.
///
/// Both `equals` and single-valued `in` filters count. Repeating the same id
/// is fine; no id, two different ids, or a value that cannot name a funnel
/// (a bool, a fractional number) is
/// [`ExtrapolationError::FunnelNotResolvable`].
pub fn ensure_funnel_id(
    request: &ActionRequest,
    funnel_id_field: &str,
) -> ExtrapolationResult<String> {
    let mut ids = BTreeSet::new();
    for filter in request.filters().iter().filter(|f| f.field == funnel_id_field) {
        match &filter.op {
            FilterOp::Equals { value } => {
                ids.insert(identifier(value, funnel_id_field)?);
            }
            FilterOp::In { values } if values.len() == 1 => {
                ids.insert(identifier(&values[0], funnel_id_field)?);
            }
            other => {
                return Err(ExtrapolationError::FunnelNotResolvable(format!(
                    "`{funnel_id_field}` filter uses `{}`, expected `equals`",
                    other.name()
                )));
            }
        }
    }

    let mut ids = ids.into_iter();
    match (ids.next(), ids.next()) {
        (Some(id), None) => Ok(id),
        (None, _) => Err(ExtrapolationError::FunnelNotResolvable(format!(
            "{} request carries no `{funnel_id_field}` filter",
            request.kind()
        ))),
        (Some(first), Some(second)) => Err(ExtrapolationError::FunnelNotResolvable(format!(
            "{} request references several funnels ({first}, {second}, ...)",
            request.kind()
        ))),
    }
}

fn identifier(value: &FilterValue, funnel_id_field: &str) -> ExtrapolationResult<String> {
    value.as_identifier().ok_or_else(|| {
        ExtrapolationError::FunnelNotResolvable(format!(
            "`{funnel_id_field}` filter value {value} is not a funnel id"
        ))
    })
}

//! The clock edge.

use chipdef::PrimitiveKind;

use crate::instance::{Body, Instance};

/// Copies the latched value of every edge-triggered instance, at every
/// depth, into its scalar value and `OUT` pin.
///
/// Returns the number of flip-flops committed.
pub(crate) fn commit_latches(instances: &mut [Instance]) -> usize {
    let mut committed = 0;
    for instance in instances.iter_mut() {
        match instance.body {
            Body::Primitive(PrimitiveKind::Dff) => {
                let next = instance.next_value;
                instance.drive(next);
                committed += 1;
            }
            Body::Composite(ref mut internals) => {
                committed += commit_latches(&mut internals.components);
            }
            Body::Primitive(_) | Body::Unknown => (),
        }
    }
    committed
}

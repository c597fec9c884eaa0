use crate::component::ComponentStatus;
use crate::error::TypeError;

/// What caused a lifecycle transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusTrigger {
    /// An explicit administrative status update.
    Administrative { target: ComponentStatus },
    /// A Critical-severity quality report, which forces `Damaged`.
    CriticalReport,
}

/// The lifecycle state machine.
///
/// Administrative edges:
/// `Active -> {Inactive, Replaced, Damaged}`,
/// `Damaged -> {Replaced, Active}` (post-repair),
/// `Inactive -> {Active, Replaced}`.
/// `Replaced` is terminal in practice, but transitions out of it are not
/// blocked. A transition to the current status is rejected so that every
/// audit entry records a real change.
///
/// A Critical report forces `Damaged` regardless of prior state; when the
/// component is already `Damaged` the result equals the input and callers
/// treat it as a no-op.
///
/// This function must be invoked inside the same atomic unit as whatever
/// write it justifies (report insert or status update), never on a stale
/// read.
pub fn next_status(
    current: ComponentStatus,
    trigger: StatusTrigger,
) -> Result<ComponentStatus, TypeError> {
    match trigger {
        StatusTrigger::CriticalReport => Ok(ComponentStatus::Damaged),
        StatusTrigger::Administrative { target } => {
            if target == current {
                return Err(TypeError::InvalidTransition {
                    from: current,
                    to: target,
                });
            }
            if current == ComponentStatus::Replaced || admin_targets(current).contains(&target) {
                Ok(target)
            } else {
                Err(TypeError::InvalidTransition {
                    from: current,
                    to: target,
                })
            }
        }
    }
}

/// Administrative transitions expected from a given status.
pub fn admin_targets(current: ComponentStatus) -> &'static [ComponentStatus] {
    match current {
        ComponentStatus::Active => &[
            ComponentStatus::Inactive,
            ComponentStatus::Replaced,
            ComponentStatus::Damaged,
        ],
        ComponentStatus::Damaged => &[ComponentStatus::Replaced, ComponentStatus::Active],
        ComponentStatus::Inactive => &[ComponentStatus::Active, ComponentStatus::Replaced],
        ComponentStatus::Replaced => &[],
    }
}

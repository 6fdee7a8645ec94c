use super::{
    click_center, disabled, select, semantic_activation, ActionExecutor, ActionReport,
    ExecutionContext, Step,
};
use crate::errors::ExecutionError;
use crate::platforms::AccessibilityProvider;
use crate::roles;
use crate::types::Target;
use crate::validator::{self, Expectation};
use tracing::debug;

/// Executes targets from embedded web content.
///
/// Those elements are recreated constantly, so a failed validation falls
/// back to clicking the cached frame instead of giving up, and every
/// semantic path ends with a synthetic click.
pub struct VolatileExecutor;

impl<P: AccessibilityProvider> ActionExecutor<P> for VolatileExecutor {
    fn execute(
        &self,
        context: &ExecutionContext<'_, P>,
        target: &Target<P::Element>,
    ) -> Result<ActionReport, ExecutionError> {
        if !target.is_enabled {
            return Err(disabled(&target.title));
        }

        let mut valid_roles: Vec<&str> = roles::VOLATILE_EQUIVALENT_ROLES.to_vec();
        if !valid_roles.contains(&target.role.as_str()) {
            valid_roles.push(&target.role);
        }
        let expectation = Expectation {
            title: &target.title,
            valid_roles: &valid_roles,
            validate_title: true,
            mode: context.config.match_mode,
            title_depth: target.title_depth,
        };

        let Some(element) = validator::validate(context.provider, &target.element, &expectation)
        else {
            debug!(title = %target.title, "element changed, clicking its last known frame");
            return click_center(context.input, target.cached_frame, target.coordinate_system)
                .map_err(|e| {
                    ExecutionError::ElementInvalid(format!(
                        "'{}' is gone and could not be clicked: {e}",
                        target.title
                    ))
                });
        };

        let policy = roles::policy(element.role(), target.subrole.as_deref());
        if policy.is_row_like() {
            // The click follows the selection write even when the write succeeds.
            let selected = select(context.provider, &element)?;
            if target.cached_frame.is_some_and(|f| f.is_usable()) {
                return click_center(context.input, target.cached_frame, target.coordinate_system);
            }
            return match selected {
                Step::Done(report) => Ok(report),
                Step::Next => Err(ExecutionError::ActionFailed(format!(
                    "'{}' refused selection and has no frame to click",
                    target.title
                ))),
            };
        }

        match semantic_activation(context, target, &element) {
            Ok(Step::Done(report)) => Ok(report),
            Ok(Step::Next) | Err(ExecutionError::ActionFailed(_)) => {
                debug!(title = %target.title, "semantic strategies failed, clicking");
                click_center(context.input, target.cached_frame, target.coordinate_system)
            }
            Err(e) => Err(e),
        }
    }
}

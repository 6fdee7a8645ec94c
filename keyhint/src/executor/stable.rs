use super::{
    disabled, semantic_activation, ActionExecutor, ActionReport, ExecutionContext, Step,
};
use crate::errors::ExecutionError;
use crate::platforms::AccessibilityProvider;
use crate::types::Target;
use crate::validator::{self, Expectation};
use tracing::debug;

/// Executes targets from native-style trees. Never synthesizes input.
pub struct StableExecutor;

impl<P: AccessibilityProvider> ActionExecutor<P> for StableExecutor {
    fn execute(
        &self,
        context: &ExecutionContext<'_, P>,
        target: &Target<P::Element>,
    ) -> Result<ActionReport, ExecutionError> {
        if !target.is_enabled {
            return Err(disabled(&target.title));
        }

        let valid_roles = [target.role.as_str()];
        let expectation = Expectation {
            title: &target.title,
            valid_roles: &valid_roles,
            validate_title: true,
            mode: context.config.match_mode,
            title_depth: target.title_depth,
        };
        let Some(element) = validator::validate(context.provider, &target.element, &expectation)
        else {
            return Err(ExecutionError::ElementInvalid(format!(
                "'{}' no longer matches its {}",
                target.title, target.role
            )));
        };

        match semantic_activation(context, target, &element)? {
            Step::Done(report) => Ok(report),
            Step::Next => {
                debug!(title = %target.title, "every semantic strategy refused");
                Err(ExecutionError::ActionFailed(format!(
                    "no action activated '{}'",
                    target.title
                )))
            }
        }
    }
}

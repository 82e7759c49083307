use std::sync::Arc;

use crate::error::CapabilityError;
use crate::target::{Target, TargetMatch};
use crate::types::{Context, MatchField, PaneId};

/// Decides which target, if any, applies to a pane.
///
/// Implemented for plain closures so a custom strategy can be passed straight
/// to [`EngineConfig::with_matcher`](crate::config::EngineConfig::with_matcher).
pub trait Matcher: Send + Sync {
    fn find(&self, pane: PaneId, context: &Context, targets: &[Arc<Target>]) -> Result<Option<Arc<Target>>, CapabilityError>;
}

impl<F> Matcher for F
where
    F: Fn(PaneId, &Context, &[Arc<Target>]) -> Result<Option<Arc<Target>>, CapabilityError> + Send + Sync,
{
    fn find(&self, pane: PaneId, context: &Context, targets: &[Arc<Target>]) -> Result<Option<Arc<Target>>, CapabilityError> {
        self(pane, context, targets)
    }
}

/// Test one target against a pane. Patterns are lowercased and searched as
/// plain substrings of each field; an empty pattern matches nothing.
pub fn target_matches(target: &Target, pane: PaneId, context: &Context, fields: &[MatchField]) -> Result<bool, CapabilityError> {
    match &target.matcher {
        TargetMatch::Predicate(predicate) => predicate(pane, context),
        TargetMatch::Patterns(patterns) => {
            let fields = target.fields.as_deref().unwrap_or(fields);
            Ok(patterns.iter()
                .map(|p| p.to_lowercase())
                .filter(|p| !p.is_empty())
                .any(|p| fields.iter().any(|&f| context.field(f).contains(p.as_str()))))
        }
    }
}

/// First enabled target in list order that matches. A failing predicate
/// counts as no match for that target only.
pub fn find_target(pane: PaneId, context: &Context, targets: &[Arc<Target>], fields: &[MatchField], log: bool) -> Option<Arc<Target>> {
    for target in targets.iter().filter(|t| t.enabled) {
        match target_matches(target, pane, context, fields) {
            Ok(true) => return Some(Arc::clone(target)),
            Ok(false) => {}
            Err(e) => {
                if log { log::error!("target '{}' predicate failed on pane {}: {}", target.name, pane, e); }
            }
        }
    }
    None
}

/// The built-in strategy: ordered pattern and predicate matching.
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    pub fields: Vec<MatchField>,
    pub log: bool,
}

impl Matcher for PatternMatcher {
    fn find(&self, pane: PaneId, context: &Context, targets: &[Arc<Target>]) -> Result<Option<Arc<Target>>, CapabilityError> {
        Ok(find_target(pane, context, targets, &self.fields, self.log))
    }
}

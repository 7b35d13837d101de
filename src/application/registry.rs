//! Registry of stub rules.
//!
//! Rules are grouped per method. Within a method, the most recently added
//! rule whose matcher accepts an invocation wins.

use crate::application::ports::Storage;
use crate::domain::{
    action::StubAction,
    invocation::{Invocation, MethodName},
    matcher::CallMatcher,
};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Identifier of a stub rule, unique within its registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleId(u64);

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A matcher plus the actions answering matching calls.
///
/// Each matching call consumes the next action; the last one repeats.
#[derive(Debug)]
pub struct StubRule {
    id: RuleId,
    matcher: CallMatcher,
    actions: Vec<StubAction>,
    cursor: usize,
}

impl StubRule {
    fn new(id: RuleId, matcher: CallMatcher, actions: Vec<StubAction>) -> Self {
        Self {
            id,
            matcher,
            actions,
            cursor: 0,
        }
    }

    /// The rule identifier.
    pub fn id(&self) -> RuleId {
        self.id
    }

    /// The calls this rule answers.
    pub fn matcher(&self) -> &CallMatcher {
        &self.matcher
    }

    /// Number of consecutive actions configured.
    pub fn action_count(&self) -> usize {
        self.actions.len()
    }

    fn next_action(&mut self) -> Option<StubAction> {
        let action = self.actions.get(self.cursor).cloned();
        if self.cursor + 1 < self.actions.len() {
            self.cursor += 1;
        }
        action
    }
}

/// All rules registered for one method, oldest first.
#[derive(Debug, Default)]
pub struct StubSet {
    rules: Vec<StubRule>,
}

impl StubSet {
    /// Rules in registration order.
    pub fn rules(&self) -> &[StubRule] {
        &self.rules
    }
}

/// Registry managing all stub rules of one double.
///
/// This type is generic over the storage implementation, allowing different
/// storage backends to be used. Doubles use `Arc<ShardedStorage>`.
#[derive(Debug, Clone)]
pub struct StubRegistry<S>
where
    S: Storage<MethodName, StubSet> + Clone,
{
    storage: S,
    next_rule: Arc<AtomicU64>,
}

impl<S> StubRegistry<S>
where
    S: Storage<MethodName, StubSet> + Clone,
{
    /// Create a registry over `storage`.
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            next_rule: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Register a rule. It takes precedence over earlier rules for the same
    /// method.
    ///
    /// An empty action list registers nothing useful; callers always pass at
    /// least one action.
    pub fn add_rule(&self, matcher: CallMatcher, actions: Vec<StubAction>) -> RuleId {
        let id = RuleId(self.next_rule.fetch_add(1, Ordering::Relaxed));
        self.storage.with_entry_mut(
            matcher.method(),
            StubSet::default,
            |set| set.rules.push(StubRule::new(id, matcher, actions)),
        );
        id
    }

    /// Append a consecutive action to an existing rule.
    ///
    /// # Returns
    /// `false` if no rule with that id exists for `method`
    pub fn append_action(&self, method: MethodName, id: RuleId, action: StubAction) -> bool {
        self.storage
            .with_existing_mut(&method, |set| {
                match set.rules.iter_mut().find(|rule| rule.id == id) {
                    Some(rule) => {
                        rule.actions.push(action);
                        true
                    }
                    None => false,
                }
            })
            .unwrap_or(false)
    }

    /// Find the action answering `invocation`, advancing consecutive actions.
    pub fn resolve(&self, invocation: &Invocation) -> Option<(RuleId, StubAction)> {
        self.storage
            .with_existing_mut(&invocation.method(), |set| {
                set.rules
                    .iter_mut()
                    .rev()
                    .find(|rule| rule.matcher.matches(invocation))
                    .and_then(|rule| rule.next_action().map(|action| (rule.id, action)))
            })
            .flatten()
    }

    /// Total number of rules across all methods.
    pub fn rule_count(&self) -> usize {
        let mut count = 0;
        self.storage.for_each(|_, set| count += set.rules.len());
        count
    }

    /// Check if no rule is registered.
    pub fn is_empty(&self) -> bool {
        self.rule_count() == 0
    }

    /// Iterate over all rules with a callback.
    pub fn for_each_rule<F>(&self, mut f: F)
    where
        F: FnMut(&StubRule),
    {
        self.storage.for_each(|_, set| set.rules.iter().for_each(&mut f));
    }
}

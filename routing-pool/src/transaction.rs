//! Transactions accepted by a configuration feature.

use crate::action::{
    ActionFactory, ActivateAction, AddAction, DeactivateAction, MultiConfigurationAction,
    RemoveAction,
};
use crate::state::RoutingKey;

#[derive(Debug, Clone)]
pub enum Transaction<C> {
    PoolCommand(PoolCommand),
    RoutingChange(RoutingChange<C>),
}

impl<C> From<PoolCommand> for Transaction<C> {
    fn from(command: PoolCommand) -> Self {
        Transaction::PoolCommand(command)
    }
}

impl<C> From<RoutingChange<C>> for Transaction<C> {
    fn from(change: RoutingChange<C>) -> Self {
        Transaction::RoutingChange(change)
    }
}

/// Commands acting on the pool as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolCommand {
    Sleep,
    WakeUp,
    Shutdown,
}

impl PoolCommand {
    pub fn action(&self) -> MultiConfigurationAction {
        match self {
            Self::Sleep => MultiConfigurationAction::Sleep,
            Self::WakeUp => MultiConfigurationAction::WakeUp,
            Self::Shutdown => MultiConfigurationAction::Shutdown,
        }
    }
}

/// An ordered batch of commands applied as one unit.
#[derive(Debug, Clone)]
pub struct RoutingChange<C> {
    pub descriptor: TransitionDescriptor<C>,
    pub changeset: Vec<RoutingCommand<C>>,
}

impl<C> RoutingChange<C> {
    pub fn new(descriptor: TransitionDescriptor<C>, changeset: Vec<RoutingCommand<C>>) -> Self {
        Self {
            descriptor,
            changeset,
        }
    }

    /// A change that never reverses or continues another one.
    pub fn untracked(changeset: Vec<RoutingCommand<C>>) -> Self {
        Self {
            descriptor: TransitionDescriptor::none(),
            changeset,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutingCommand<C> {
    Add(C),
    Remove(C),
    Activate(C),
    Deactivate(C),
}

impl<C: RoutingKey> RoutingCommand<C> {
    pub fn routing(&self) -> &C {
        match self {
            Self::Add(c) | Self::Remove(c) | Self::Activate(c) | Self::Deactivate(c) => c,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Add(_) => "add",
            Self::Remove(_) => "remove",
            Self::Activate(_) => "activate",
            Self::Deactivate(_) => "deactivate",
        }
    }

    pub fn action_factory(&self) -> ActionFactory<C> {
        match self {
            Self::Add(_) => AddAction::<C>::create,
            Self::Remove(_) => RemoveAction::<C>::create,
            Self::Activate(_) => ActivateAction::<C>::create,
            Self::Deactivate(_) => DeactivateAction::<C>::create,
        }
    }
}

/// Whether `routing` enters or leaves the pool within `commands`.
pub fn added_or_removed<C: RoutingKey>(commands: &[RoutingCommand<C>], routing: &C) -> bool {
    commands.iter().any(|command| {
        matches!(command, RoutingCommand::Add(_) | RoutingCommand::Remove(_))
            && command.routing() == routing
    })
}

/// Identity of a transaction's transition, used to detect when a new
/// transaction undoes or extends one that is still animating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionDescriptor<C> {
    pub from: Vec<C>,
    pub to: Vec<C>,
}

impl<C> TransitionDescriptor<C> {
    pub fn new(from: Vec<C>, to: Vec<C>) -> Self {
        Self { from, to }
    }

    pub fn none() -> Self {
        Self {
            from: Vec::new(),
            to: Vec::new(),
        }
    }

    pub fn is_none(&self) -> bool {
        self.from.is_empty() && self.to.is_empty()
    }
}

impl<C: PartialEq + Clone> TransitionDescriptor<C> {
    pub fn reversed(&self) -> Self {
        Self {
            from: self.to.clone(),
            to: self.from.clone(),
        }
    }

    pub fn is_reverse_of(&self, other: &Self) -> bool {
        !self.is_none() && !other.is_none() && self.from == other.to && self.to == other.from
    }

    pub fn is_continuation_of(&self, other: &Self) -> bool {
        !self.is_none() && !other.is_none() && !self.is_reverse_of(other) && self.from == other.to
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(from: &[&'static str], to: &[&'static str]) -> TransitionDescriptor<&'static str> {
        TransitionDescriptor::new(from.to_vec(), to.to_vec())
    }

    #[test]
    fn reverse_swaps_endpoints() {
        let push = descriptor(&["a"], &["a", "b"]);
        let pop = descriptor(&["a", "b"], &["a"]);

        assert!(pop.is_reverse_of(&push));
        assert!(push.is_reverse_of(&pop));
        assert_eq!(push.reversed(), pop);
        assert!(!pop.is_continuation_of(&push));
    }

    #[test]
    fn continuation_starts_where_other_ends() {
        let first = descriptor(&["a"], &["a", "b"]);
        let second = descriptor(&["a", "b"], &["a", "b", "c"]);

        assert!(second.is_continuation_of(&first));
        assert!(!second.is_reverse_of(&first));
        assert!(!first.is_continuation_of(&second));
    }

    #[test]
    fn none_never_matches() {
        let none = TransitionDescriptor::<&str>::none();
        let other = descriptor(&["a"], &["b"]);

        assert!(!none.is_reverse_of(&none));
        assert!(!none.is_continuation_of(&none));
        assert!(!none.is_reverse_of(&other));
        assert!(!other.is_continuation_of(&none));
    }

    #[test]
    fn added_or_removed_only_counts_membership_changes() {
        let commands = vec![
            RoutingCommand::Add("a"),
            RoutingCommand::Activate("a"),
            RoutingCommand::Deactivate("b"),
            RoutingCommand::Remove("c"),
        ];

        assert!(added_or_removed(&commands, &"a"));
        assert!(!added_or_removed(&commands, &"b"));
        assert!(added_or_removed(&commands, &"c"));
    }

    #[test]
    fn pool_commands_map_to_multi_actions() {
        assert_eq!(PoolCommand::Sleep.action(), MultiConfigurationAction::Sleep);
        assert_eq!(PoolCommand::WakeUp.action(), MultiConfigurationAction::WakeUp);
        assert_eq!(PoolCommand::Shutdown.action(), MultiConfigurationAction::Shutdown);
    }
}

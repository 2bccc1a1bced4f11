//! Composite nodes: flow control over an ordered set of children.

mod parallel;
mod random_selector;
mod reactive_selector;
mod reactive_sequence;
mod selector;
mod sequence;

pub use parallel::ParallelNode;
pub use random_selector::RandomSelectorNode;
pub use reactive_selector::ReactiveSelectorNode;
pub use reactive_sequence::ReactiveSequenceNode;
pub use selector::SelectorNode;
pub use sequence::SequenceNode;

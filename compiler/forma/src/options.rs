//! Equipping configuration.

use std::str::FromStr;

use forma_ir::{BehaviorKind, Behaviors, ParseBehaviorError};

/// Which behaviors an [`Equipper`](crate::Equipper) synthesizes.
///
/// Defaults to Construct, Display and Equality; Iteration and Hashing are
/// opt-in.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Options {
    pub behaviors: Behaviors,
}

impl Options {
    pub fn new(behaviors: Behaviors) -> Self {
        Options { behaviors }
    }

    #[must_use]
    pub fn with(mut self, kind: BehaviorKind) -> Self {
        self.behaviors.insert(kind.flag());
        self
    }

    #[must_use]
    pub fn without(mut self, kind: BehaviorKind) -> Self {
        self.behaviors.remove(kind.flag());
        self
    }

    pub fn enables(&self, kind: BehaviorKind) -> bool {
        self.behaviors.enables(kind)
    }
}

/// Parses a behavior list such as `"default,iter"` or `"construct,eq"`.
impl FromStr for Options {
    type Err = ParseBehaviorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Options::new)
    }
}

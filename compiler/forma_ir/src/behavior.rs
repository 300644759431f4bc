//! Behaviors a record type can be equipped with.

use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;

/// One synthesizable behavior. Each kind has exactly one template.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, PartialOrd, Ord)]
pub enum BehaviorKind {
    /// Positional construction, assigning each value to its field.
    Construct,
    /// `TypeName(field=repr, ...)` display form.
    Display,
    /// Same-type field-wise equality, NotApplicable across types.
    Equality,
    /// Yields field values in order.
    Iteration,
    /// Order-sensitive hash over field values.
    Hashing,
}

impl BehaviorKind {
    /// All kinds, in synthesis order.
    pub const ALL: [BehaviorKind; 5] = [
        BehaviorKind::Construct,
        BehaviorKind::Display,
        BehaviorKind::Equality,
        BehaviorKind::Iteration,
        BehaviorKind::Hashing,
    ];

    /// Function name used by this behavior's template.
    pub const fn method_name(self) -> &'static str {
        match self {
            BehaviorKind::Construct => "construct",
            BehaviorKind::Display => "display",
            BehaviorKind::Equality => "eq",
            BehaviorKind::Iteration => "iter",
            BehaviorKind::Hashing => "hash",
        }
    }

    /// Look up a kind by its method name (or a few common aliases).
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "construct" | "init" => Some(BehaviorKind::Construct),
            "display" | "repr" => Some(BehaviorKind::Display),
            "eq" | "equality" => Some(BehaviorKind::Equality),
            "iter" | "iteration" => Some(BehaviorKind::Iteration),
            "hash" | "hashing" => Some(BehaviorKind::Hashing),
            _ => None,
        }
    }

    /// The single-bit set for this kind.
    pub const fn flag(self) -> Behaviors {
        match self {
            BehaviorKind::Construct => Behaviors::CONSTRUCT,
            BehaviorKind::Display => Behaviors::DISPLAY,
            BehaviorKind::Equality => Behaviors::EQUALITY,
            BehaviorKind::Iteration => Behaviors::ITERATION,
            BehaviorKind::Hashing => Behaviors::HASHING,
        }
    }
}

impl fmt::Display for BehaviorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.method_name())
    }
}

bitflags! {
    /// Enable set over `BehaviorKind`.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
    pub struct Behaviors: u8 {
        const CONSTRUCT = 1 << 0;
        const DISPLAY = 1 << 1;
        const EQUALITY = 1 << 2;
        const ITERATION = 1 << 3;
        const HASHING = 1 << 4;
    }
}

impl Behaviors {
    /// Construct, Display and Equality. Iteration and Hashing are opt-in.
    pub const DEFAULT: Behaviors = Behaviors::CONSTRUCT
        .union(Behaviors::DISPLAY)
        .union(Behaviors::EQUALITY);

    /// Whether `kind` is enabled.
    #[inline]
    pub fn enables(self, kind: BehaviorKind) -> bool {
        self.contains(kind.flag())
    }

    /// Enabled kinds, in synthesis order.
    pub fn kinds(self) -> impl Iterator<Item = BehaviorKind> {
        BehaviorKind::ALL
            .into_iter()
            .filter(move |kind| self.enables(*kind))
    }
}

impl Default for Behaviors {
    fn default() -> Self {
        Behaviors::DEFAULT
    }
}

/// Unknown entry in a behavior list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseBehaviorError(pub String);

impl fmt::Display for ParseBehaviorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown behavior `{}`", self.0)
    }
}

impl std::error::Error for ParseBehaviorError {}

impl FromStr for Behaviors {
    type Err = ParseBehaviorError;

    /// Parse a comma-separated list such as `"construct,display,eq,hash"`.
    /// `"all"`, `"none"` and `"default"` are accepted as whole-set shorthands.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut set = Behaviors::empty();
        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            set |= match part {
                "all" => Behaviors::all(),
                "none" => Behaviors::empty(),
                "default" => Behaviors::DEFAULT,
                other => BehaviorKind::from_name(other)
                    .ok_or_else(|| ParseBehaviorError(other.to_owned()))?
                    .flag(),
            };
        }
        Ok(set)
    }
}

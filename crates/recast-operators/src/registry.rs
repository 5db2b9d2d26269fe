//! Operator names and their constructors.

use std::fmt;

use serde_json::Value;

use crate::compute::Compute;
use crate::fields::{Coalesce, If, Lookup, Set};
use crate::filter::Filter;
use crate::flatten::Flatten;
use crate::format::Format;
use crate::group::{Group, Summarize};
use crate::mask::Mask;
use crate::project::{Exclude, Rename, Select};
use crate::sequence::{AddIndex, Distinct, Limit, Reverse, Skip};
use crate::sort::Sort;
use crate::text::{Concat, Pad, Split, Truncate};
use crate::traits::{OpError, Operator};
use crate::unwind::Unwind;

/// Every operator a pipeline step may name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorKind {
    Filter,
    Select,
    Exclude,
    Rename,
    Sort,
    Format,
    Limit,
    Skip,
    Reverse,
    Distinct,
    Flatten,
    Compute,
    Concat,
    Split,
    Lookup,
    Group,
    Summarize,
    Truncate,
    Pad,
    Mask,
    Unwind,
    AddIndex,
    Coalesce,
    If,
    Set,
}

impl OperatorKind {
    pub const ALL: [OperatorKind; 25] = [
        OperatorKind::Filter,
        OperatorKind::Select,
        OperatorKind::Exclude,
        OperatorKind::Rename,
        OperatorKind::Sort,
        OperatorKind::Format,
        OperatorKind::Limit,
        OperatorKind::Skip,
        OperatorKind::Reverse,
        OperatorKind::Distinct,
        OperatorKind::Flatten,
        OperatorKind::Compute,
        OperatorKind::Concat,
        OperatorKind::Split,
        OperatorKind::Lookup,
        OperatorKind::Group,
        OperatorKind::Summarize,
        OperatorKind::Truncate,
        OperatorKind::Pad,
        OperatorKind::Mask,
        OperatorKind::Unwind,
        OperatorKind::AddIndex,
        OperatorKind::Coalesce,
        OperatorKind::If,
        OperatorKind::Set,
    ];

    /// Look up a step key. `add_index` is accepted for `addIndex`.
    pub fn from_name(name: &str) -> Option<Self> {
        if name == "add_index" {
            return Some(OperatorKind::AddIndex);
        }
        Self::ALL.into_iter().find(|k| k.as_str() == name)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OperatorKind::Filter => "filter",
            OperatorKind::Select => "select",
            OperatorKind::Exclude => "exclude",
            OperatorKind::Rename => "rename",
            OperatorKind::Sort => "sort",
            OperatorKind::Format => "format",
            OperatorKind::Limit => "limit",
            OperatorKind::Skip => "skip",
            OperatorKind::Reverse => "reverse",
            OperatorKind::Distinct => "distinct",
            OperatorKind::Flatten => "flatten",
            OperatorKind::Compute => "compute",
            OperatorKind::Concat => "concat",
            OperatorKind::Split => "split",
            OperatorKind::Lookup => "lookup",
            OperatorKind::Group => "group",
            OperatorKind::Summarize => "summarize",
            OperatorKind::Truncate => "truncate",
            OperatorKind::Pad => "pad",
            OperatorKind::Mask => "mask",
            OperatorKind::Unwind => "unwind",
            OperatorKind::AddIndex => "addIndex",
            OperatorKind::Coalesce => "coalesce",
            OperatorKind::If => "if",
            OperatorKind::Set => "set",
        }
    }

    /// Only these change record order or count, and only on a sequence.
    pub fn requires_sequence(self) -> bool {
        matches!(
            self,
            OperatorKind::Filter
                | OperatorKind::Sort
                | OperatorKind::Limit
                | OperatorKind::Skip
                | OperatorKind::Reverse
                | OperatorKind::Distinct
                | OperatorKind::Group
                | OperatorKind::Summarize
                | OperatorKind::Unwind
                | OperatorKind::AddIndex
        )
    }

    /// Normalise `config` and build the operator.
    pub fn build(self, config: &Value) -> Result<Box<dyn Operator>, OpError> {
        Ok(match self {
            OperatorKind::Filter => Box::new(Filter::from_config(config)?),
            OperatorKind::Select => Box::new(Select::from_config(config)?),
            OperatorKind::Exclude => Box::new(Exclude::from_config(config)?),
            OperatorKind::Rename => Box::new(Rename::from_config(config)?),
            OperatorKind::Sort => Box::new(Sort::from_config(config)?),
            OperatorKind::Format => Box::new(Format::from_config(config)?),
            OperatorKind::Limit => Box::new(Limit::from_config(config)?),
            OperatorKind::Skip => Box::new(Skip::from_config(config)?),
            OperatorKind::Reverse => Box::new(Reverse),
            OperatorKind::Distinct => Box::new(Distinct::from_config(config)?),
            OperatorKind::Flatten => Box::new(Flatten::from_config(config)?),
            OperatorKind::Compute => Box::new(Compute::from_config(config)?),
            OperatorKind::Concat => Box::new(Concat::from_config(config)?),
            OperatorKind::Split => Box::new(Split::from_config(config)?),
            OperatorKind::Lookup => Box::new(Lookup::from_config(config)?),
            OperatorKind::Group => Box::new(Group::from_config(config)?),
            OperatorKind::Summarize => Box::new(Summarize::from_config(config)?),
            OperatorKind::Truncate => Box::new(Truncate::from_config(config)?),
            OperatorKind::Pad => Box::new(Pad::from_config(config)?),
            OperatorKind::Mask => Box::new(Mask::from_config(config)?),
            OperatorKind::Unwind => Box::new(Unwind::from_config(config)?),
            OperatorKind::AddIndex => Box::new(AddIndex::from_config(config)?),
            OperatorKind::Coalesce => Box::new(Coalesce::from_config(config)?),
            OperatorKind::If => Box::new(If::from_config(config)?),
            OperatorKind::Set => Box::new(Set::from_config(config)?),
        })
    }
}

impl fmt::Display for OperatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn names_round_trip() {
        for kind in OperatorKind::ALL {
            assert_eq!(OperatorKind::from_name(kind.as_str()), Some(kind));
        }
        assert_eq!(OperatorKind::from_name("add_index"), Some(OperatorKind::AddIndex));
        assert_eq!(OperatorKind::from_name("explode"), None);
        assert_eq!(OperatorKind::from_name("Filter"), None);
    }

    #[test]
    fn built_operator_reports_its_name() {
        let op = OperatorKind::Reverse.build(&Value::Null).unwrap();
        assert_eq!(op.name(), "reverse");
        let op = OperatorKind::AddIndex.build(&json!("row")).unwrap();
        assert_eq!(op.name(), "addIndex");
    }

    #[test]
    fn build_surfaces_config_errors() {
        assert!(OperatorKind::Select.build(&json!([])).is_err());
        assert!(OperatorKind::Filter.build(&json!("bogus")).is_err());
        assert!(OperatorKind::Limit.build(&json!(-1)).is_err());
    }
}

#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::fmt::{self, Debug, Display};

use serde::{Deserialize, Serialize};

use crate::error::TreeError;

/// Per-node payload that distinguishes plain, AVL and red-black trees.
///
/// Everything structural (linking, traversal, equality, wire conversion) is
/// shared; an annotation only decides how it is read from and written to the
/// wire record.
pub trait Annotation: Clone + Debug + PartialEq {
    /// Human readable name of the tree kind, used in error messages.
    const KIND: &'static str;

    /// Builds the annotation from the optional wire fields of one node.
    fn from_wire(balance: Option<i64>, color: Option<Color>) -> Result<Self, TreeError>;

    /// Returns the `(balance, color)` wire fields for this annotation.
    fn to_wire(&self) -> (Option<i64>, Option<Color>);
}

/// Annotation of a plain binary search tree node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Plain;

impl Annotation for Plain {
    const KIND: &'static str = "binary search tree";

    fn from_wire(_balance: Option<i64>, _color: Option<Color>) -> Result<Self, TreeError> {
        Ok(Plain)
    }

    fn to_wire(&self) -> (Option<i64>, Option<Color>) {
        (None, None)
    }
}

/// AVL balance factor: `height(left) - height(right)`.
///
/// Values of ±2 only exist transiently while an engine rebalances.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Balance(pub i8);

impl Balance {
    /// Balance of a freshly created leaf.
    pub const LEVEL: Balance = Balance(0);
}

impl Annotation for Balance {
    const KIND: &'static str = "AVL tree";

    fn from_wire(balance: Option<i64>, _color: Option<Color>) -> Result<Self, TreeError> {
        let balance =
            balance.ok_or_else(|| TreeError::invalid("Each node must have a 'balance' key"))?;
        if !(-2..=2).contains(&balance) {
            return Err(TreeError::invalid(format!(
                "The balancing factor must be in [-2, 2], got {balance}"
            )));
        }
        Ok(Balance(balance as i8))
    }

    fn to_wire(&self) -> (Option<i64>, Option<Color>) {
        (Some(i64::from(self.0)), None)
    }
}

impl Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:+}", self.0)
    }
}

/// Node color of a red-black tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Color {
    /// Red node.
    Red,
    /// Black node.
    Black,
}

impl Color {
    /// True for [`Color::Red`].
    pub fn is_red(self) -> bool {
        self == Color::Red
    }

    /// True for [`Color::Black`].
    pub fn is_black(self) -> bool {
        self == Color::Black
    }
}

impl Annotation for Color {
    const KIND: &'static str = "red-black tree";

    fn from_wire(_balance: Option<i64>, color: Option<Color>) -> Result<Self, TreeError> {
        color.ok_or_else(|| TreeError::invalid("Each node must have a 'color' key"))
    }

    fn to_wire(&self) -> (Option<i64>, Option<Color>) {
        (None, Some(*self))
    }
}

impl Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Red => write!(f, "RED"),
            Color::Black => write!(f, "BLACK"),
        }
    }
}

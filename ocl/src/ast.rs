//! Constraint expression AST.
//!
//! Trees are built by an upstream front end (or by hand in tests) and are
//! never mutated after construction.

use crate::{EvalError, EvalResult};
use mrepo_core::CollectionKind;
use std::fmt;
use std::str::FromStr;

/// A literal value written in the expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Bool(bool),
    Int(i64),
    Real(f64),
    String(String),
    /// Unlimited natural: `None` is `*`.
    UnlimitedNatural(Option<u64>),
    /// Qualified enumeration literal, `Kind::Literal`.
    Enum(String),
}

/// One part of a collection literal.
#[derive(Debug, Clone, PartialEq)]
pub enum CollectionPart {
    Item(Expr),
    /// Inclusive integer range `first..last`.
    Range(Expr, Expr),
}

/// Iterator kinds of `source->kind(v | body)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IteratorKind {
    Select,
    Reject,
    Collect,
    ForAll,
    Exists,
    Exists1,
    One,
    Any,
    IsUnique,
    SortedBy,
    Closure,
    SelectByKind,
    SelectAsKind,
    SelectByType,
}

impl IteratorKind {
    pub fn name(self) -> &'static str {
        match self {
            IteratorKind::Select => "select",
            IteratorKind::Reject => "reject",
            IteratorKind::Collect => "collect",
            IteratorKind::ForAll => "forAll",
            IteratorKind::Exists => "exists",
            IteratorKind::Exists1 => "exists1",
            IteratorKind::One => "one",
            IteratorKind::Any => "any",
            IteratorKind::IsUnique => "isUnique",
            IteratorKind::SortedBy => "sortedBy",
            IteratorKind::Closure => "closure",
            IteratorKind::SelectByKind => "selectByKind",
            IteratorKind::SelectAsKind => "selectAsKind",
            IteratorKind::SelectByType => "selectByType",
        }
    }
}

impl FromStr for IteratorKind {
    type Err = EvalError;

    fn from_str(s: &str) -> EvalResult<Self> {
        Ok(match s {
            "select" => IteratorKind::Select,
            "reject" => IteratorKind::Reject,
            "collect" => IteratorKind::Collect,
            "forAll" => IteratorKind::ForAll,
            "exists" => IteratorKind::Exists,
            "exists1" => IteratorKind::Exists1,
            "one" => IteratorKind::One,
            "any" => IteratorKind::Any,
            "isUnique" => IteratorKind::IsUnique,
            "sortedBy" => IteratorKind::SortedBy,
            "closure" => IteratorKind::Closure,
            "selectByKind" => IteratorKind::SelectByKind,
            "selectAsKind" => IteratorKind::SelectAsKind,
            "selectByType" => IteratorKind::SelectByType,
            other => return Err(EvalError::unknown_iterator(other)),
        })
    }
}

/// Type operations of `source.op(T)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeOpKind {
    OclIsKindOf,
    OclIsTypeOf,
    OclAsType,
    SelectByKind,
    SelectByType,
}

/// The type argument of a type operation.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeName {
    Static(String),
    /// Type name computed at evaluation time; must produce a string.
    Dynamic(Box<Expr>),
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfixOp {
    Add,
    Sub,
    Mul,
    Div,
    IntDiv,
    Mod,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    Xor,
    Implies,
}

impl InfixOp {
    /// Resolve a canonical operator spelling.
    pub fn from_symbol(symbol: &str) -> EvalResult<Self> {
        Ok(match symbol {
            "+" => InfixOp::Add,
            "-" => InfixOp::Sub,
            "*" => InfixOp::Mul,
            "/" => InfixOp::Div,
            "div" => InfixOp::IntDiv,
            "mod" => InfixOp::Mod,
            "=" => InfixOp::Eq,
            "<>" => InfixOp::Ne,
            "<" => InfixOp::Lt,
            "<=" => InfixOp::Le,
            ">" => InfixOp::Gt,
            ">=" => InfixOp::Ge,
            "and" => InfixOp::And,
            "or" => InfixOp::Or,
            "xor" => InfixOp::Xor,
            "implies" => InfixOp::Implies,
            other => return Err(EvalError::unknown_operator(other)),
        })
    }

    pub fn symbol(self) -> &'static str {
        match self {
            InfixOp::Add => "+",
            InfixOp::Sub => "-",
            InfixOp::Mul => "*",
            InfixOp::Div => "/",
            InfixOp::IntDiv => "div",
            InfixOp::Mod => "mod",
            InfixOp::Eq => "=",
            InfixOp::Ne => "<>",
            InfixOp::Lt => "<",
            InfixOp::Le => "<=",
            InfixOp::Gt => ">",
            InfixOp::Ge => ">=",
            InfixOp::And => "and",
            InfixOp::Or => "or",
            InfixOp::Xor => "xor",
            InfixOp::Implies => "implies",
        }
    }
}

impl fmt::Display for InfixOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixOp {
    Neg,
    Not,
}

impl PrefixOp {
    pub fn from_symbol(symbol: &str) -> EvalResult<Self> {
        match symbol {
            "-" => Ok(PrefixOp::Neg),
            "not" => Ok(PrefixOp::Not),
            other => Err(EvalError::unknown_operator(other)),
        }
    }
}

/// A constraint expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),
    CollectionLiteral {
        kind: CollectionKind,
        parts: Vec<CollectionPart>,
    },
    Variable(String),
    Property {
        source: Box<Expr>,
        name: String,
    },
    Navigation {
        source: Box<Expr>,
        name: String,
    },
    /// `source.name(args)`; a missing source calls on `self`.
    OperationCall {
        source: Option<Box<Expr>>,
        name: String,
        args: Vec<Expr>,
    },
    /// `source->name(args)`.
    ArrowCall {
        source: Box<Expr>,
        name: String,
        args: Vec<Expr>,
    },
    Iterator {
        source: Box<Expr>,
        kind: IteratorKind,
        var: String,
        body: Box<Expr>,
    },
    /// `source->iterate(iter_var; acc_var = init | body)`.
    Iterate {
        source: Box<Expr>,
        iter_var: String,
        acc_var: String,
        init: Box<Expr>,
        body: Box<Expr>,
    },
    If {
        cond: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },
    Let {
        var: String,
        value: Box<Expr>,
        body: Box<Expr>,
    },
    TypeOp {
        source: Box<Expr>,
        op: TypeOpKind,
        type_name: TypeName,
    },
    Infix {
        left: Box<Expr>,
        op: InfixOp,
        right: Box<Expr>,
    },
    Prefix {
        op: PrefixOp,
        operand: Box<Expr>,
    },
}

// Construction shorthands, mostly for hand-built trees.
impl Expr {
    pub fn null() -> Self {
        Expr::Literal(Literal::Null)
    }

    pub fn bool(b: bool) -> Self {
        Expr::Literal(Literal::Bool(b))
    }

    pub fn int(i: i64) -> Self {
        Expr::Literal(Literal::Int(i))
    }

    pub fn real(r: f64) -> Self {
        Expr::Literal(Literal::Real(r))
    }

    pub fn string(s: impl Into<String>) -> Self {
        Expr::Literal(Literal::String(s.into()))
    }

    pub fn enum_literal(qualified: impl Into<String>) -> Self {
        Expr::Literal(Literal::Enum(qualified.into()))
    }

    pub fn var(name: impl Into<String>) -> Self {
        Expr::Variable(name.into())
    }

    pub fn self_ref() -> Self {
        Expr::var("self")
    }

    /// Collection literal of single items.
    pub fn collection(kind: CollectionKind, items: Vec<Expr>) -> Self {
        Expr::CollectionLiteral {
            kind,
            parts: items.into_iter().map(CollectionPart::Item).collect(),
        }
    }

    pub fn infix(left: Expr, op: InfixOp, right: Expr) -> Self {
        Expr::Infix {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    pub fn prefix(op: PrefixOp, operand: Expr) -> Self {
        Expr::Prefix {
            op,
            operand: Box::new(operand),
        }
    }

    pub fn if_then_else(cond: Expr, then_branch: Expr, else_branch: Expr) -> Self {
        Expr::If {
            cond: Box::new(cond),
            then_branch: Box::new(then_branch),
            else_branch: Box::new(else_branch),
        }
    }

    pub fn let_in(var: impl Into<String>, value: Expr, body: Expr) -> Self {
        Expr::Let {
            var: var.into(),
            value: Box::new(value),
            body: Box::new(body),
        }
    }

    /// `self.name(args)` on a receiver-less call.
    pub fn call_on_self(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::OperationCall {
            source: None,
            name: name.into(),
            args,
        }
    }

    pub fn prop(self, name: impl Into<String>) -> Self {
        Expr::Property {
            source: Box::new(self),
            name: name.into(),
        }
    }

    pub fn nav(self, name: impl Into<String>) -> Self {
        Expr::Navigation {
            source: Box::new(self),
            name: name.into(),
        }
    }

    pub fn call(self, name: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::OperationCall {
            source: Some(Box::new(self)),
            name: name.into(),
            args,
        }
    }

    pub fn arrow(self, name: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::ArrowCall {
            source: Box::new(self),
            name: name.into(),
            args,
        }
    }

    pub fn iter(self, kind: IteratorKind, var: impl Into<String>, body: Expr) -> Self {
        Expr::Iterator {
            source: Box::new(self),
            kind,
            var: var.into(),
            body: Box::new(body),
        }
    }

    pub fn iterate(
        self,
        iter_var: impl Into<String>,
        acc_var: impl Into<String>,
        init: Expr,
        body: Expr,
    ) -> Self {
        Expr::Iterate {
            source: Box::new(self),
            iter_var: iter_var.into(),
            acc_var: acc_var.into(),
            init: Box::new(init),
            body: Box::new(body),
        }
    }

    pub fn type_op(self, op: TypeOpKind, type_name: impl Into<String>) -> Self {
        Expr::TypeOp {
            source: Box::new(self),
            op,
            type_name: TypeName::Static(type_name.into()),
        }
    }
}

//! Query AST.

use mrepo_core::Value;
use std::fmt;

/// A complete query: MATCH clauses, an optional WHERE, one RETURN.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub matches: Vec<MatchClause>,
    pub filter: Option<Expr>,
    pub ret: ReturnClause,
}

impl Query {
    /// A query with no clauses returning `*`.
    pub fn new() -> Self {
        Self {
            matches: Vec::new(),
            filter: None,
            ret: ReturnClause::all(),
        }
    }

    pub fn matching(mut self, patterns: Vec<PathPattern>) -> Self {
        self.matches.push(MatchClause::new(patterns));
        self
    }

    pub fn optional_matching(mut self, patterns: Vec<PathPattern>) -> Self {
        self.matches.push(MatchClause::optional(patterns));
        self
    }

    pub fn filter(mut self, expr: Expr) -> Self {
        self.filter = Some(expr);
        self
    }

    pub fn returning(mut self, ret: ReturnClause) -> Self {
        self.ret = ret;
        self
    }
}

impl Default for Query {
    fn default() -> Self {
        Self::new()
    }
}

/// `MATCH` or `OPTIONAL MATCH` with comma-separated path patterns.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchClause {
    pub patterns: Vec<PathPattern>,
    pub optional: bool,
}

impl MatchClause {
    pub fn new(patterns: Vec<PathPattern>) -> Self {
        Self {
            patterns,
            optional: false,
        }
    }

    pub fn optional(patterns: Vec<PathPattern>) -> Self {
        Self {
            patterns,
            optional: true,
        }
    }

    /// Every variable the clause can bind, in pattern order.
    pub fn variables(&self) -> Vec<String> {
        let mut names = Vec::new();
        for pattern in &self.patterns {
            pattern.collect_variables(&mut names);
        }
        names
    }
}

/// An ordered sequence of node, edge and nested path elements.
#[derive(Debug, Clone, PartialEq)]
pub struct PathPattern {
    pub elements: Vec<PathElement>,
    pub variable: Option<String>,
}

impl PathPattern {
    pub fn new(elements: Vec<PathElement>) -> Self {
        Self {
            elements,
            variable: None,
        }
    }

    /// A path consisting of a single node.
    pub fn node(node: NodePattern) -> Self {
        Self::new(vec![PathElement::Node(node)])
    }

    /// Bind the whole path to a variable.
    pub fn named(mut self, variable: impl Into<String>) -> Self {
        self.variable = Some(variable.into());
        self
    }

    /// Append an edge followed by a node.
    pub fn then(mut self, edge: EdgePattern, node: NodePattern) -> Self {
        self.elements.push(PathElement::Edge(edge));
        self.elements.push(PathElement::Node(node));
        self
    }

    fn collect_variables(&self, names: &mut Vec<String>) {
        for element in &self.elements {
            match element {
                PathElement::Node(node) => push_unique(names, &node.variable),
                PathElement::Edge(edge) => push_unique(names, &edge.variable),
                PathElement::Path(inner) => inner.collect_variables(names),
            }
        }
        push_unique(names, &self.variable);
    }
}

fn push_unique(names: &mut Vec<String>, name: &Option<String>) {
    if let Some(name) = name {
        if !names.contains(name) {
            names.push(name.clone());
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PathElement {
    Node(NodePattern),
    Edge(EdgePattern),
    Path(PathPattern),
}

/// `(var:LabelA|LabelB {prop: expr})`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodePattern {
    pub variable: Option<String>,
    /// Disjunctive class names; empty matches any element.
    pub labels: Vec<String>,
    pub properties: Vec<(String, Expr)>,
}

impl NodePattern {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn var(mut self, name: impl Into<String>) -> Self {
        self.variable = Some(name.into());
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.labels.push(label.into());
        self
    }

    pub fn prop(mut self, name: impl Into<String>, value: Expr) -> Self {
        self.properties.push((name.into(), value));
        self
    }
}

/// Edge direction as written in the pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// `<-[]-`
    Left,
    /// `-[]->`
    Right,
    /// `~[]~`
    Undirected,
    /// `<~[]~`
    LeftOrUndirected,
    /// `~[]~>`
    UndirectedOrRight,
    /// `<-[]->`
    LeftOrRight,
    /// `-[]-`
    Any,
}

impl Direction {
    /// Whether the edge follows links from source to target.
    pub fn follows_targets(self) -> bool {
        !matches!(self, Direction::Left)
    }

    /// Whether the edge follows links from target back to source.
    pub fn follows_sources(self) -> bool {
        !matches!(self, Direction::Right)
    }
}

/// Repetition of an edge pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantifier {
    /// Exactly `n` hops.
    Fixed(u32),
    /// Between `min` and `max` hops; no `max` means up to the configured ceiling.
    Range { min: u32, max: Option<u32> },
}

/// `-[var:assocA|assocB {prop: expr}]->` with an optional quantifier.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgePattern {
    pub variable: Option<String>,
    /// Association names; empty follows every association.
    pub labels: Vec<String>,
    pub direction: Direction,
    pub properties: Vec<(String, Expr)>,
    pub quantifier: Option<Quantifier>,
}

impl EdgePattern {
    pub fn new(direction: Direction) -> Self {
        Self {
            variable: None,
            labels: Vec::new(),
            direction,
            properties: Vec::new(),
            quantifier: None,
        }
    }

    pub fn right() -> Self {
        Self::new(Direction::Right)
    }

    pub fn left() -> Self {
        Self::new(Direction::Left)
    }

    pub fn var(mut self, name: impl Into<String>) -> Self {
        self.variable = Some(name.into());
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.labels.push(label.into());
        self
    }

    pub fn prop(mut self, name: impl Into<String>, value: Expr) -> Self {
        self.properties.push((name.into(), value));
        self
    }

    pub fn quantified(mut self, quantifier: Quantifier) -> Self {
        self.quantifier = Some(quantifier);
        self
    }
}

/// `RETURN [DISTINCT] ...`.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnClause {
    pub projection: Projection,
    pub distinct: bool,
}

impl ReturnClause {
    /// `RETURN *`.
    pub fn all() -> Self {
        Self {
            projection: Projection::All,
            distinct: false,
        }
    }

    pub fn items(items: Vec<ReturnItem>) -> Self {
        Self {
            projection: Projection::Items(items),
            distinct: false,
        }
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    All,
    Items(Vec<ReturnItem>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnItem {
    pub expr: Expr,
    pub alias: Option<String>,
}

impl ReturnItem {
    pub fn new(expr: Expr) -> Self {
        Self { expr, alias: None }
    }

    pub fn aliased(expr: Expr, alias: impl Into<String>) -> Self {
        Self {
            expr,
            alias: Some(alias.into()),
        }
    }

    /// Column name: the alias, else the expression as written.
    pub fn column_name(&self) -> String {
        match &self.alias {
            Some(alias) => alias.clone(),
            None => self.expr.to_string(),
        }
    }
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Concat,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    Xor,
    Like,
    StartsWith,
    EndsWith,
    Contains,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Pow => "^",
            BinaryOp::Concat => "||",
            BinaryOp::Eq => "=",
            BinaryOp::Ne => "<>",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "AND",
            BinaryOp::Or => "OR",
            BinaryOp::Xor => "XOR",
            BinaryOp::Like => "LIKE",
            BinaryOp::StartsWith => "STARTS WITH",
            BinaryOp::EndsWith => "ENDS WITH",
            BinaryOp::Contains => "CONTAINS",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
    Plus,
}

/// A WHERE or RETURN expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Variable(String),
    Property(Box<Expr>, String),
    Literal(Value),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Unary(UnaryOp, Box<Expr>),
    FunctionCall(String, Vec<Expr>),
    List(Vec<Expr>),
    /// `item IN list`.
    In(Box<Expr>, Box<Expr>),
    /// `expr IS [NOT] NULL`; the flag is true for `IS NOT NULL`.
    IsNull(Box<Expr>, bool),
    Case {
        operand: Option<Box<Expr>>,
        whens: Vec<(Expr, Expr)>,
        otherwise: Option<Box<Expr>>,
    },
    /// `var:LabelA|LabelB`.
    LabelCheck(String, Vec<String>),
    Exists(Box<PathPattern>),
    /// `COUNT(*)`.
    CountStar,
}

impl Expr {
    pub fn var(name: impl Into<String>) -> Self {
        Expr::Variable(name.into())
    }

    pub fn lit(value: impl Into<Value>) -> Self {
        Expr::Literal(value.into())
    }

    pub fn null() -> Self {
        Expr::Literal(Value::Null)
    }

    pub fn prop(self, name: impl Into<String>) -> Self {
        Expr::Property(Box::new(self), name.into())
    }

    pub fn binary(self, op: BinaryOp, right: Expr) -> Self {
        Expr::Binary(op, Box::new(self), Box::new(right))
    }

    pub fn unary(op: UnaryOp, operand: Expr) -> Self {
        Expr::Unary(op, Box::new(operand))
    }

    pub fn call(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::FunctionCall(name.into(), args)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Variable(name) => write!(f, "{}", name),
            Expr::Property(source, name) => write!(f, "{}.{}", source, name),
            Expr::Literal(Value::String(s)) => write!(f, "'{}'", s),
            Expr::Literal(value) => write!(f, "{}", value),
            Expr::Binary(op, left, right) => write!(f, "{} {} {}", left, op.symbol(), right),
            Expr::Unary(UnaryOp::Not, operand) => write!(f, "NOT {}", operand),
            Expr::Unary(UnaryOp::Neg, operand) => write!(f, "-{}", operand),
            Expr::Unary(UnaryOp::Plus, operand) => write!(f, "+{}", operand),
            Expr::FunctionCall(name, args) => {
                write!(f, "{}(", name)?;
                write_list(f, args)?;
                write!(f, ")")
            }
            Expr::List(items) => {
                write!(f, "[")?;
                write_list(f, items)?;
                write!(f, "]")
            }
            Expr::In(item, list) => write!(f, "{} IN {}", item, list),
            Expr::IsNull(expr, false) => write!(f, "{} IS NULL", expr),
            Expr::IsNull(expr, true) => write!(f, "{} IS NOT NULL", expr),
            Expr::Case { .. } => write!(f, "CASE"),
            Expr::LabelCheck(var, labels) => write!(f, "{}:{}", var, labels.join("|")),
            Expr::Exists(_) => write!(f, "EXISTS"),
            Expr::CountStar => write!(f, "COUNT(*)"),
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[Expr]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

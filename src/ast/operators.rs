/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    // Logical
    /// Logical or (`|`)
    Or,
    /// Logical and (`&`)
    And,

    // Equality
    /// Equal (`==`)
    Equal,
    /// Not equal (`!=`, `~=`)
    NotEqual,

    // Relational
    /// Less than (`<`)
    LessThan,
    /// Less than or equal (`<=`)
    LessEqual,
    /// Greater than (`>`)
    GreaterThan,
    /// Greater than or equal (`>=`)
    GreaterEqual,

    // Arithmetic
    /// Addition or string concatenation (`+`)
    Add,
    /// Subtraction (`-`)
    Subtract,
    /// Multiplication (`*`)
    Multiply,
    /// Division (`/`)
    Divide,
    /// Power (`^`)
    Power,
}

impl BinOp {
    /// Binding strength; larger binds tighter. Every binary operator is
    /// left-associative.
    pub fn precedence(self) -> u8 {
        match self {
            BinOp::Or => 1,
            BinOp::And => 2,
            BinOp::Equal | BinOp::NotEqual => 3,
            BinOp::LessThan | BinOp::LessEqual | BinOp::GreaterThan | BinOp::GreaterEqual => 4,
            BinOp::Add | BinOp::Subtract => 5,
            BinOp::Multiply | BinOp::Divide => 6,
            BinOp::Power => 7,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Or => "|",
            BinOp::And => "&",
            BinOp::Equal => "==",
            BinOp::NotEqual => "!=",
            BinOp::LessThan => "<",
            BinOp::LessEqual => "<=",
            BinOp::GreaterThan => ">",
            BinOp::GreaterEqual => ">=",
            BinOp::Add => "+",
            BinOp::Subtract => "-",
            BinOp::Multiply => "*",
            BinOp::Divide => "/",
            BinOp::Power => "^",
        }
    }
}

/// Prefix operators. Both bind tighter than any binary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// Arithmetic negation (`-`)
    Negate,
    /// Logical not (`!`, `~`)
    Not,
}

impl UnaryOp {
    pub const PRECEDENCE: u8 = 8;

    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Negate => "-",
            UnaryOp::Not => "!",
        }
    }
}

/// The operator or category tag of a branch node.
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    Binary(BinOp),
    Unary(UnaryOp),
    /// Function call; the children are the arguments.
    Call(String),
    /// Explicit subscript `x[_n-1]`; children are the target and the index.
    Subscript,
    /// Parenthesized name group, as in `bysort id (year):`, or a
    /// space-separated call argument.
    Group,
}

impl Op {
    /// Textual tag handed to hosts.
    pub fn tag(&self) -> &str {
        match self {
            Op::Binary(op) => op.symbol(),
            Op::Unary(op) => op.symbol(),
            Op::Call(name) => name,
            Op::Subscript => "[]",
            Op::Group => "()",
        }
    }
}

use crate::ast::{
    Block, Branch, Command, CommandOption, Datetime, EmbeddedCode, Expr, GeneralCommand, Modifier,
    Number,
};

/// Kind tag of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Number,
    Ident,
    String,
    Datetime,
    Branch,
    Modifier,
    Option,
    Command,
    EmbeddedForeign,
    Block,
}

impl NodeKind {
    pub fn name(self) -> &'static str {
        match self {
            NodeKind::Number => "number",
            NodeKind::Ident => "ident",
            NodeKind::String => "string",
            NodeKind::Datetime => "datetime",
            NodeKind::Branch => "branch",
            NodeKind::Modifier => "modifier",
            NodeKind::Option => "option",
            NodeKind::Command => "command",
            NodeKind::EmbeddedForeign => "embedded",
            NodeKind::Block => "block",
        }
    }
}

/// Borrowed view of any node in a parsed tree.
///
/// Consumers that walk the whole tree match on this one type instead of on
/// each node struct; [`to_host`](crate::output::to_host) is written this way.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeRef<'a> {
    Number(&'a Number),
    Ident(&'a str),
    String(&'a str),
    Datetime(&'a Datetime),
    Branch(&'a Branch),
    Modifier(&'a Modifier),
    Option(&'a CommandOption),
    Command(&'a GeneralCommand),
    Embedded(&'a EmbeddedCode),
    Block(&'a Block),
}

impl<'a> NodeRef<'a> {
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeRef::Number(_) => NodeKind::Number,
            NodeRef::Ident(_) => NodeKind::Ident,
            NodeRef::String(_) => NodeKind::String,
            NodeRef::Datetime(_) => NodeKind::Datetime,
            NodeRef::Branch(_) => NodeKind::Branch,
            NodeRef::Modifier(_) => NodeKind::Modifier,
            NodeRef::Option(_) => NodeKind::Option,
            NodeRef::Command(_) => NodeKind::Command,
            NodeRef::Embedded(_) => NodeKind::EmbeddedForeign,
            NodeRef::Block(_) => NodeKind::Block,
        }
    }

    /// Owned child nodes in source order; empty for leaves.
    ///
    /// For a command: modifiers, varlist items, assignment target and value,
    /// the `if` expression, then options. Range, weight and filename are
    /// payload, not children.
    pub fn children(&self) -> Vec<NodeRef<'a>> {
        match *self {
            NodeRef::Number(_)
            | NodeRef::Ident(_)
            | NodeRef::String(_)
            | NodeRef::Datetime(_)
            | NodeRef::Embedded(_) => Vec::new(),
            NodeRef::Branch(branch) => branch.children.iter().map(Expr::as_node).collect(),
            NodeRef::Modifier(modifier) => {
                let mut children: Vec<NodeRef<'a>> =
                    modifier.args.iter().map(Expr::as_node).collect();
                children.extend(modifier.options.iter().flatten().map(NodeRef::Option));
                children
            }
            NodeRef::Option(option) => {
                let mut children: Vec<NodeRef<'a>> =
                    option.args.iter().flatten().map(Expr::as_node).collect();
                children.extend(option.suboptions.iter().flatten().map(NodeRef::Option));
                children
            }
            NodeRef::Command(cmd) => {
                let mut children: Vec<NodeRef<'a>> = Vec::new();
                children.extend(cmd.modifiers.iter().flatten().map(NodeRef::Modifier));
                children.extend(cmd.varlist.iter().flatten().map(Expr::as_node));
                if let Some(assignment) = &cmd.assignment {
                    children.push(NodeRef::Ident(&assignment.target));
                    children.push(assignment.value.as_node());
                }
                children.extend(cmd.if_exp.as_ref().map(Expr::as_node));
                children.extend(cmd.options.iter().flatten().map(NodeRef::Option));
                children
            }
            NodeRef::Block(block) => {
                let mut children = vec![NodeRef::Command(&block.header)];
                children.extend(block.body.iter().map(Command::as_node));
                children
            }
        }
    }

    /// Number of nodes in the subtree rooted here, this node included.
    pub fn size(&self) -> usize {
        1 + self.children().iter().map(NodeRef::size).sum::<usize>()
    }
}

impl Expr {
    pub fn as_node(&self) -> NodeRef<'_> {
        match self {
            Expr::Number(n) => NodeRef::Number(n),
            Expr::Ident(name) => NodeRef::Ident(name),
            Expr::String(s) => NodeRef::String(s),
            Expr::Datetime(dt) => NodeRef::Datetime(dt),
            Expr::Branch(branch) => NodeRef::Branch(branch),
        }
    }
}

impl Command {
    pub fn as_node(&self) -> NodeRef<'_> {
        match self {
            Command::General(cmd) => NodeRef::Command(cmd),
            Command::Embedded(code) => NodeRef::Embedded(code),
            Command::Block(block) => NodeRef::Block(block),
        }
    }
}

use serde::{Deserialize, Serialize};

/// Built-in operations that can appear in function position of an apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Primitive {
    Return,

    MakeTuple,
    TupleGetitem,
    TupleSetitem,
    EnvSetitem,
    EnvGetitem,

    ArrayMap,
    Partial,
    Switch,

    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Neg,

    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    Not,
}

impl Primitive {
    pub fn name(&self) -> &'static str {
        match self {
            Primitive::Return => "return",
            Primitive::MakeTuple => "make_tuple",
            Primitive::TupleGetitem => "tuple_getitem",
            Primitive::TupleSetitem => "tuple_setitem",
            Primitive::EnvSetitem => "env_setitem",
            Primitive::EnvGetitem => "env_getitem",
            Primitive::ArrayMap => "array_map",
            Primitive::Partial => "partial",
            Primitive::Switch => "switch",
            Primitive::Add => "add",
            Primitive::Sub => "sub",
            Primitive::Mul => "mul",
            Primitive::Div => "div",
            Primitive::Mod => "mod",
            Primitive::Neg => "neg",
            Primitive::Eq => "eq",
            Primitive::Ne => "ne",
            Primitive::Lt => "lt",
            Primitive::Le => "le",
            Primitive::Gt => "gt",
            Primitive::Ge => "ge",
            Primitive::And => "and",
            Primitive::Or => "or",
            Primitive::Not => "not",
        }
    }

    /// Number of arguments the primitive takes, not counting the function
    /// slot. `None` for variadic primitives.
    pub fn arity(&self) -> Option<usize> {
        match self {
            Primitive::MakeTuple | Primitive::Partial | Primitive::ArrayMap => None,
            Primitive::Return | Primitive::Neg | Primitive::Not => Some(1),
            Primitive::TupleGetitem => Some(2),
            Primitive::TupleSetitem
            | Primitive::EnvSetitem
            | Primitive::EnvGetitem
            | Primitive::Switch => Some(3),
            Primitive::Add
            | Primitive::Sub
            | Primitive::Mul
            | Primitive::Div
            | Primitive::Mod
            | Primitive::Eq
            | Primitive::Ne
            | Primitive::Lt
            | Primitive::Le
            | Primitive::Gt
            | Primitive::Ge
            | Primitive::And
            | Primitive::Or => Some(2),
        }
    }

    pub fn from_name(name: &str) -> Option<Primitive> {
        ALL_PRIMITIVES.iter().copied().find(|p| p.name() == name)
    }
}

pub const ALL_PRIMITIVES: &[Primitive] = &[
    Primitive::Return,
    Primitive::MakeTuple,
    Primitive::TupleGetitem,
    Primitive::TupleSetitem,
    Primitive::EnvSetitem,
    Primitive::EnvGetitem,
    Primitive::ArrayMap,
    Primitive::Partial,
    Primitive::Switch,
    Primitive::Add,
    Primitive::Sub,
    Primitive::Mul,
    Primitive::Div,
    Primitive::Mod,
    Primitive::Neg,
    Primitive::Eq,
    Primitive::Ne,
    Primitive::Lt,
    Primitive::Le,
    Primitive::Gt,
    Primitive::Ge,
    Primitive::And,
    Primitive::Or,
    Primitive::Not,
];

impl std::fmt::Display for Primitive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

//! Abstract values: the type/value annotations the inference stage attaches
//! to every node. The optimizer only reads them (and writes them on the
//! constants it synthesizes).

use super::node::GraphId;
use super::prim::Primitive;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    Int(u8),
    UInt(u8),
    Float(u8),
    Bool,
    Str,
}

impl std::fmt::Display for ScalarType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScalarType::Int(bits) => write!(f, "i{}", bits),
            ScalarType::UInt(bits) => write!(f, "u{}", bits),
            ScalarType::Float(bits) => write!(f, "f{}", bits),
            ScalarType::Bool => write!(f, "bool"),
            ScalarType::Str => write!(f, "str"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AbstractError {
    /// Annotation for a dead placeholder standing in for a function value.
    Dead,
}

/// One possible call target of a function-typed value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FunctionRef {
    Graph(GraphId),
    Primitive(Primitive),
    /// A primitive specialized to concrete argument and output types.
    TypedPrimitive {
        prim: Primitive,
        args: Vec<AbstractValue>,
        output: Box<AbstractValue>,
    },
    /// `func` with `args` already bound in front of the call arguments.
    Partial {
        func: Box<FunctionRef>,
        args: Vec<AbstractValue>,
    },
    /// A function whose target could not be determined.
    Opaque,
}

/// The set of targets a function-typed value may resolve to. More than one
/// entry means the call site is ambiguous.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AbstractFunction {
    options: Vec<FunctionRef>,
}

impl AbstractFunction {
    pub fn new(options: Vec<FunctionRef>) -> Self {
        let mut dedup: Vec<FunctionRef> = Vec::with_capacity(options.len());
        for o in options {
            if !dedup.contains(&o) {
                dedup.push(o);
            }
        }
        AbstractFunction { options: dedup }
    }

    pub fn single(target: FunctionRef) -> Self {
        AbstractFunction { options: vec![target] }
    }

    pub fn get_unique(&self) -> Option<&FunctionRef> {
        match self.options.as_slice() {
            [only] => Some(only),
            _ => None,
        }
    }

    pub fn get_sync(&self) -> &[FunctionRef] {
        &self.options
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AbstractValue {
    Scalar(ScalarType),
    Tuple(Vec<AbstractValue>),
    Array(Box<AbstractValue>),
    Env,
    SymbolicKey,
    Nil,
    Function(AbstractFunction),
    Error(AbstractError),
}

impl AbstractValue {
    pub fn i64() -> Self {
        AbstractValue::Scalar(ScalarType::Int(64))
    }

    pub fn f32() -> Self {
        AbstractValue::Scalar(ScalarType::Float(32))
    }

    pub fn f64() -> Self {
        AbstractValue::Scalar(ScalarType::Float(64))
    }

    pub fn bool() -> Self {
        AbstractValue::Scalar(ScalarType::Bool)
    }

    pub fn graph(g: GraphId) -> Self {
        AbstractValue::Function(AbstractFunction::single(FunctionRef::Graph(g)))
    }

    pub fn prim(p: Primitive) -> Self {
        AbstractValue::Function(AbstractFunction::single(FunctionRef::Primitive(p)))
    }

    pub fn functions(targets: Vec<FunctionRef>) -> Self {
        AbstractValue::Function(AbstractFunction::new(targets))
    }

    pub fn as_function(&self) -> Option<&AbstractFunction> {
        match self {
            AbstractValue::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn is_function(&self) -> bool {
        matches!(self, AbstractValue::Function(_))
    }
}

impl std::fmt::Display for AbstractValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AbstractValue::Scalar(s) => write!(f, "{}", s),
            AbstractValue::Tuple(elems) => {
                write!(f, "(")?;
                for (i, e) in elems.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", e)?;
                }
                write!(f, ")")
            }
            AbstractValue::Array(elem) => write!(f, "[{}]", elem),
            AbstractValue::Env => write!(f, "env"),
            AbstractValue::SymbolicKey => write!(f, "symkey"),
            AbstractValue::Nil => write!(f, "nil"),
            AbstractValue::Function(func) => write!(f, "fn#{}", func.get_sync().len()),
            AbstractValue::Error(AbstractError::Dead) => write!(f, "error(dead)"),
        }
    }
}

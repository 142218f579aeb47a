pub mod absval;
pub mod builder;
pub mod manager;
pub mod node;
pub mod opt;
pub mod prim;
pub mod printer;
pub mod traverse;
pub mod value;

pub use self::absval::{AbstractError, AbstractFunction, AbstractValue, FunctionRef, ScalarType};
pub use self::builder::FunctionBuilder;
pub use self::manager::Manager;
pub use self::node::{Edge, Graph, GraphId, Node, NodeId, NodeKind};
pub use self::prim::Primitive;
pub use self::value::Value;

//! Abstract Syntax Tree definitions
//!
//! - rule expressions produced by the rule parser
//! - declarations describing document schemas

pub mod expression;
pub mod operator;
pub mod schema;

pub use expression::{Expression, RuleProgram, Statement, UnaryOperator};
pub use operator::Operator;
pub use schema::{
    BindingDeclaration, FieldDeclaration, FieldKindDeclaration, IntervalPrecision,
    RewriteDeclaration, SchemaDeclaration, TemporalRelation, TriggerDeclaration,
    VariableDeclaration,
};

//! Rule rewrite pipeline
//!
//! Order matters and is kept exactly:
//! 1. the function's own literal rewrites
//! 2. extraction of every dependency (done by the schema, which owns them)
//! 3. each variable's literal rewrites, variable by variable
//! 4. the global token table (`IF` -> `if`, `THEN` -> `{`, ...)
//! 5. `${name}` placeholders, from the parameters of all dependencies
//!
//! Rewrites are plain substring replacements, so an earlier rewrite can
//! consume the text a later one was written for.

use prefill_core::Value;
use prefill_parser::{apply_rewrites, apply_token_table, substitute_placeholders, RuleParser};

use super::{Evaluator, FunctionSpec};
use crate::error::Result;
use crate::field::Field;
use crate::options::EngineOptions;
use crate::resolver::ParameterResolver;

/// Rewrite a rule whose dependencies have already been extracted
pub fn rewrite_rule<'f, I>(spec: &FunctionSpec, dependencies: I, resolver: &ParameterResolver) -> String
where
    I: IntoIterator<Item = &'f Field>,
{
    let mut text = apply_rewrites(&spec.rule, &spec.rewrites);
    for variable in &spec.variables {
        text = apply_rewrites(&text, &variable.rewrites);
    }
    let text = apply_token_table(&text);

    let parameters = resolver.flatten_all(dependencies);
    substitute_placeholders(&text, |name| parameters.get(name).cloned())
}

/// Parse and evaluate rewritten rule text within the configured limits
pub fn evaluate_rule(text: &str, options: &EngineOptions) -> Result<Value> {
    let program = RuleParser::parse_with_depth(text, options.max_expression_depth)?;
    Evaluator::new(options.max_evaluation_steps).run(&program)
}

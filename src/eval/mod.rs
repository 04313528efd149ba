// Author: Dustin Pilgrim
// License: MIT

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::value::Value;

mod expr;

pub type FunctionImpl = Arc<dyn Fn(&[Value]) -> Result<Value, String> + Send + Sync>;

/// A named function callable from configuration expressions.
#[derive(Clone)]
pub struct Function {
    pub params: Vec<String>,
    pub description: String,
    func: FunctionImpl,
}

impl Function {
    pub fn new<F>(params: &[&str], description: impl Into<String>, func: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, String> + Send + Sync + 'static,
    {
        Self {
            params: params.iter().map(|p| p.to_string()).collect(),
            description: description.into(),
            func: Arc::new(func),
        }
    }

    /// Invoke with already-evaluated arguments; arity is checked by the caller.
    pub fn call(&self, args: &[Value]) -> Result<Value, String> {
        (self.func)(args)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("params", &self.params)
            .field("description", &self.description)
            .finish()
    }
}

/// Symbol table available while evaluating an expression.
#[derive(Debug, Clone, Default)]
pub struct EvalContext {
    pub variables: IndexMap<String, Value>,
    pub functions: IndexMap<String, Function>,
}

impl EvalContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_variable(mut self, name: impl Into<String>, value: Value) -> Self {
        self.variables.insert(name.into(), value);
        self
    }

    pub fn with_function(mut self, name: impl Into<String>, function: Function) -> Self {
        self.functions.insert(name.into(), function);
        self
    }

    /// Copy of `self` with every symbol of `other` layered on top.
    pub fn merged_with(&self, other: &EvalContext) -> EvalContext {
        let mut merged = self.clone();
        for (name, value) in &other.variables {
            merged.variables.insert(name.clone(), value.clone());
        }
        for (name, function) in &other.functions {
            merged.functions.insert(name.clone(), function.clone());
        }
        merged
    }
}

pub mod ast;
pub mod config;
pub mod decode;
pub mod diagnostics;
pub mod error;
pub mod eval;
pub mod export;
pub mod lexer;
pub mod loader;
pub mod package;
pub mod parser;
pub mod pipeline;
pub mod plugin;
pub mod spec;
pub mod stages;
pub mod utils;
pub mod value;
pub mod version;

pub use ast::{Document, Pos};
pub use config::{Provider, RequiredProvider, RootConfig, Schema, SwitchboardBlock, Variable, Variant};
pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use error::ConfigError;
pub use eval::EvalContext;
pub use pipeline::Pipeline;
pub use spec::Spec;
pub use value::{Type, Value};

pub mod ast;
pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod languages;
pub mod lexer;
pub mod matcher;
pub mod output;
pub mod parser;
pub mod registry;
pub mod stream;
pub mod value;

pub use ast::{Expr, Pattern, Position, Program, Statement, Token, TokenKind};
pub use config::{ConfigError, ConfigLoader, ConstructHandlerConfig, ParserConfig, TokenPattern};
pub use context::ParseContext;
pub use error::{ParseError, ParseErrorKind, ParseResult};
pub use languages::{LanguageConfig, LanguageRegistry};
pub use lexer::{LexError, Lexer};
pub use matcher::{match_pattern, select_arm, Bindings};
pub use output::{to_json, to_json_pretty};
pub use parser::{parse, Parser};
pub use registry::{ConstructHandler, ConstructKind, HandlerOutcome, HandlerRegistry};
pub use stream::TokenStream;
pub use value::Value;

pub mod ast;
mod lexer;
mod library;
mod parser;

pub use ast::*;
pub use lexer::{tokenize, Token, TokenKind};
pub use library::{split_script_library, ScriptSource};
pub use parser::{compile, compile_with, StartRule};

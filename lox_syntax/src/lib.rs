pub mod ast;
pub mod error;
pub mod lex;
pub mod parse;
pub mod print;
pub mod token;

use ast::Program;
use error::Reporter;
use lex::Lexer;
use parse::Parser;
use token::Token;

/// Lex `source` into tokens terminated by `EOF`, reporting lex errors.
pub fn scan(source: &str, reporter: &mut dyn Reporter) -> Vec<Token> {
    Lexer::new(source, reporter).lex_all()
}

/// Parse a token stream, reporting syntax errors. Check
/// [`Reporter::had_error`] before running the result.
pub fn parse(tokens: &[Token], reporter: &mut dyn Reporter) -> Program {
    Parser::new(tokens, reporter).parse_all()
}

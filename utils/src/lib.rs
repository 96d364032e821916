use thiserror::Error;

// Every core failure is fatal for the input being interpreted. Errors
// propagate to the driver, which either aborts the process (script mode)
// or reports and moves on to the next input (interactive mode).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("stack underflow")]
    EmptyStack,
    #[error("key not found: {0}")]
    KeyNotFound(String),
    #[error("unresolved symbol: {0}")]
    UnresolvedSymbol(String),
    #[error("lexical error at byte {offset}: {found:?}")]
    LexicalError { offset: usize, found: String },
    #[error("malformed aggregate: no bracket open")]
    MalformedAggregate,
}

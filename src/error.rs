//! Assembler errors

use std::path::PathBuf;

use thiserror::Error;

use crate::lexer::Span;

/// Errors that abort an assembly.
///
/// Every variant that comes out of the source text carries the name of the
/// input it was read from, so the binary can report it without extra context.
#[derive(Debug, Error)]
pub enum AsmError {
    /// Input could not be read or output could not be written
    #[error("cannot access '{}': {source}", .path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Code-section token that is neither a mnemonic nor a label
    #[error("{file}:{span}: unknown opcode: '{token}'")]
    IllegalOpcode {
        token: String,
        file: String,
        span: Span,
    },

    /// Bad preamble, bad pool entry, or a label naming no method
    #[error("{message}, file: {file}")]
    ConstantPool { message: String, file: String },

    /// An operand token of the wrong shape in the code section
    #[error("{file}:{span}: expected {expected}, found '{token}'")]
    InvalidOperand {
        token: String,
        expected: &'static str,
        file: String,
        span: Span,
    },

    /// Input ended while a token was still required
    #[error("unexpected end of input, expected {expected}, file: {file}")]
    UnexpectedEnd { expected: &'static str, file: String },

    /// Module header does not start with the expected magic number
    #[error("bad magic number: 0x{found:08X}")]
    BadMagic { found: u32 },

    /// Module is shorter than its fixed header
    #[error("module is shorter than its header")]
    TruncatedHeader,

    /// Structured snapshot could not be encoded or decoded
    #[error("snapshot error: {0}")]
    Snapshot(#[from] postcard::Error),
}

impl AsmError {
    pub fn constant_pool(message: impl Into<String>, file: &str) -> Self {
        AsmError::ConstantPool {
            message: message.into(),
            file: file.to_string(),
        }
    }

    pub fn file_access(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AsmError::FileAccess {
            path: path.into(),
            source,
        }
    }

    /// Process exit status for this kind of failure. Never zero.
    pub fn exit_code(&self) -> i32 {
        match self {
            AsmError::FileAccess { .. } => 2,
            AsmError::IllegalOpcode { .. } => 3,
            AsmError::ConstantPool { .. } => 4,
            AsmError::InvalidOperand { .. } | AsmError::UnexpectedEnd { .. } => 5,
            AsmError::BadMagic { .. } | AsmError::TruncatedHeader | AsmError::Snapshot(_) => 6,
        }
    }
}

/// Result type for assembler operations
pub type Result<T> = std::result::Result<T, AsmError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_pool_message_names_file() {
        let err = AsmError::constant_pool("method: 'foo' not found in constant pool", "a.asm");
        assert_eq!(
            err.to_string(),
            "method: 'foo' not found in constant pool, file: a.asm"
        );
    }

    #[test]
    fn test_illegal_opcode_message() {
        let err = AsmError::IllegalOpcode {
            token: "bogus".to_string(),
            file: "a.asm".to_string(),
            span: Span { line: 3, col: 5 },
        };
        assert_eq!(err.to_string(), "a.asm:3:5: unknown opcode: 'bogus'");
    }

    #[test]
    fn test_exit_codes_are_distinct_per_kind() {
        let io = AsmError::file_access("x", std::io::Error::other("denied"));
        let pool = AsmError::constant_pool("m", "f");
        let op = AsmError::IllegalOpcode {
            token: "t".to_string(),
            file: "f".to_string(),
            span: Span { line: 1, col: 1 },
        };
        let end = AsmError::UnexpectedEnd {
            expected: "integer operand",
            file: "f".to_string(),
        };

        let codes = [io.exit_code(), op.exit_code(), pool.exit_code(), end.exit_code()];
        assert_eq!(codes, [2, 3, 4, 5]);
    }
}

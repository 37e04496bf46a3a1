use serde::{Deserialize, Serialize};

use crate::error::{AsmError, Result};
use crate::lexer::{Lexer, Span};
use crate::opcode::{Encoding, Opcode};
use crate::pool::{ConstantPool, SymbolTable};
use crate::token::Token;

/// One emitted instruction, kept alongside the raw bytes for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    pub index: u32,
    pub opcode: Opcode,
    pub operand: Option<i32>,
}

/// The code section: wire bytes plus the instructions they came from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Code {
    pub bytes: Vec<u8>,
    pub instructions: Vec<Instruction>,
}

impl Code {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Turns the code section into instruction bytes.
///
/// A `name:` label does not emit anything. It appends the current instruction
/// index to the patch region of the method entry bound to `name`, so the pool
/// must be fully built before emission starts.
pub struct CodeEmitter<'a> {
    lexer: &'a mut Lexer,
    file: &'a str,
    pool: &'a mut ConstantPool,
    symbols: &'a SymbolTable,
    code: Code,
    /// Index of the next instruction; comments do not advance it
    index: u32,
}

impl<'a> CodeEmitter<'a> {
    pub fn new(
        lexer: &'a mut Lexer,
        file: &'a str,
        pool: &'a mut ConstantPool,
        symbols: &'a SymbolTable,
    ) -> Self {
        Self {
            lexer,
            file,
            pool,
            symbols,
            code: Code::default(),
            index: 0,
        }
    }

    pub fn emit(mut self) -> Result<Code> {
        while let Some(spanned) = self.lexer.next_token() {
            match spanned.token {
                Token::Label(name) if !name.is_empty() => self.resolve_label(&name)?,
                Token::Word(ref word) => match Opcode::from_mnemonic(word) {
                    Some(op) => self.emit_op(op)?,
                    None => return Err(self.illegal_opcode(word.clone(), spanned.span)),
                },
                _ => return Err(self.illegal_opcode(spanned.text, spanned.span)),
            }
        }

        Ok(self.code)
    }

    fn emit_op(&mut self, op: Opcode) -> Result<()> {
        let operand = match op.encoding() {
            Encoding::LineSkip => {
                self.lexer.rest_of_line();
                return Ok(());
            }
            Encoding::NoArg => None,
            Encoding::SingleInt => Some(self.expect_operand()?),
        };

        tracing::trace!(
            target: "vmasm::emit",
            index = self.index,
            op = %op,
            operand = ?operand,
            "emit"
        );

        self.code.bytes.extend(op.encode(operand.unwrap_or(0)));
        self.code.instructions.push(Instruction {
            index: self.index,
            opcode: op,
            operand,
        });
        self.index += 1;
        Ok(())
    }

    /// Records the current instruction index as a call site of `name`.
    fn resolve_label(&mut self, name: &str) -> Result<()> {
        let not_found =
            || AsmError::constant_pool(format!("method: '{}' not found in constant pool", name), self.file);

        let index = self.symbols.resolve(name).ok_or_else(not_found)?;
        let entry = self.pool.get_mut(index).ok_or_else(not_found)?;

        if !entry.record_call_site(self.index) {
            return Err(not_found());
        }

        tracing::debug!(
            target: "vmasm::emit",
            method = name,
            entry = index.0,
            site = self.index,
            "patched call site"
        );
        Ok(())
    }

    fn expect_operand(&mut self) -> Result<i32> {
        match self.lexer.next_token() {
            Some(s) => match s.token {
                Token::Integer(n) => Ok(n),
                _ => Err(AsmError::InvalidOperand {
                    token: s.text,
                    expected: "integer operand",
                    file: self.file.to_string(),
                    span: s.span,
                }),
            },
            None => Err(AsmError::UnexpectedEnd {
                expected: "integer operand",
                file: self.file.to_string(),
            }),
        }
    }

    fn illegal_opcode(&self, token: String, span: Span) -> AsmError {
        AsmError::IllegalOpcode {
            token,
            file: self.file.to_string(),
            span,
        }
    }
}

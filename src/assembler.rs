use std::path::Path;

use crate::emit::CodeEmitter;
use crate::error::{AsmError, Result};
use crate::lexer::Lexer;
use crate::module::{MAGIC_NUMBER, Module};
use crate::pool::PoolBuilder;

/// Drives one assembly: pool first, then code, then the module.
pub struct Assembler {
    magic: u32,
}

impl Default for Assembler {
    fn default() -> Self {
        Self {
            magic: MAGIC_NUMBER,
        }
    }
}

impl Assembler {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub(crate) fn with_magic(magic: u32) -> Self {
        Self { magic }
    }

    /// Assembles `source`. `file` names the input in diagnostics.
    pub fn assemble(&self, source: &str, file: &str) -> Result<Module> {
        let mut lexer = Lexer::new(source);

        let (mut pool, symbols) = PoolBuilder::new(&mut lexer, file).build()?;
        let code = CodeEmitter::new(&mut lexer, file, &mut pool, &symbols).emit()?;

        tracing::info!(
            target: "vmasm",
            file,
            pool_entries = pool.len(),
            instructions = code.instructions.len(),
            code_bytes = code.len(),
            "assembled"
        );

        Ok(Module::new(self.magic, pool, code))
    }

    /// Reads `input`, assembles it and writes the module to `output`.
    ///
    /// The output file is only created once assembly has succeeded, and it is
    /// written in one call.
    pub fn assemble_file(&self, input: &Path, output: &Path) -> Result<Module> {
        let source =
            std::fs::read_to_string(input).map_err(|e| AsmError::file_access(input, e))?;

        let module = self.assemble(&source, &input.display().to_string())?;

        std::fs::write(output, module.to_bytes()).map_err(|e| AsmError::file_access(output, e))?;

        Ok(module)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    const MAGIC: [u8; 4] = [0xCE, 0xFA, 0xBE, 0xBA];

    fn assemble(source: &str) -> Result<Module> {
        Assembler::new().assemble(source, "prog.asm")
    }

    #[test]
    fn test_scenario_single_method() {
        let module = assemble("const 1\nM \"run\" I 0 0\nrun: noop stop\n").unwrap();

        let entry = module.pool.iter().next().unwrap();
        assert_eq!(
            entry.bytes,
            vec![0x08, 0x72, 0x75, 0x6E, 0x00, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]
        );

        let mut expected = MAGIC.to_vec();
        expected.push(0x01);
        expected.extend_from_slice(&entry.bytes);
        expected.extend_from_slice(&[0x00, 0, 0, 0, 0, 0, 0, 0]);
        expected.extend_from_slice(&[0x02, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(module.to_bytes(), expected);
    }

    #[test]
    fn test_scenario_empty_pool() {
        let bytes = assemble("const 0\nstop").unwrap().to_bytes();
        assert_eq!(bytes.len(), 4 + 1 + 8);
        assert_eq!(&bytes[..4], &MAGIC);
        assert_eq!(bytes[4], 0x00);
        assert_eq!(&bytes[5..], &[0x02, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_scenario_undeclared_label() {
        match assemble("const 0\nfoo: stop") {
            Err(AsmError::ConstantPool { message, file }) => {
                assert!(message.contains("'foo'"));
                assert_eq!(file, "prog.asm");
            }
            other => panic!("expected constant pool error, got {:?}", other),
        }
    }

    #[test]
    fn test_scenario_unknown_mnemonic() {
        match assemble("const 0\nnoop bogus") {
            Err(AsmError::IllegalOpcode { token, file, .. }) => {
                assert_eq!(token, "bogus");
                assert_eq!(file, "prog.asm");
            }
            other => panic!("expected illegal opcode, got {:?}", other),
        }
    }

    #[test]
    fn test_full_program() {
        let source = r#"const 4
S "hello, world"
I 40
B 2
M "main" I 1I 0
@ entry point
main:
    sload 0
    sprint
    cload 1
    cload 2
    iadd      @ 42
    iprint
    stop
"#;
        let module = assemble(source).unwrap();
        let bytes = module.to_bytes();

        assert_eq!(bytes[4], 4);
        assert_eq!(module.code.instructions.len(), 7);
        assert_eq!(module.code.len(), 7 * 8);

        let main = module.pool.iter().nth(3).unwrap();
        assert_eq!(main.method.as_ref().unwrap().call_sites, vec![0]);
        assert_eq!(&bytes[bytes.len() - 8..], &[0x02, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_assemble_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("ok.asm");
        let output = dir.path().join("ok.bin");
        std::fs::write(&input, "const 0\nstop\n").unwrap();

        let module = Assembler::new().assemble_file(&input, &output).unwrap();
        assert_eq!(std::fs::read(&output).unwrap(), module.to_bytes());
    }

    #[test]
    fn test_missing_input_is_file_access() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.asm");
        let out = dir.path().join("never-written.bin");

        let err = Assembler::new().assemble_file(&missing, &out).unwrap_err();
        assert!(matches!(err, AsmError::FileAccess { ref path, .. } if path == &missing));
        assert!(!out.exists());
    }

    #[test]
    fn test_failed_assembly_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("bad.asm");
        let output = dir.path().join("bad.bin");
        std::fs::write(&input, "const 0\nbogus\n").unwrap();

        let err = Assembler::new().assemble_file(&input, &output).unwrap_err();
        assert_eq!(err.exit_code(), 3);
        assert!(!output.exists());
    }

    proptest! {
        #[test]
        fn prop_count_byte_matches_declaration(count in 0usize..=255) {
            let mut source = format!("const {}\n", count);
            for _ in 0..count {
                source.push_str("R\n");
            }
            let bytes = assemble(&source).unwrap().to_bytes();
            prop_assert_eq!(bytes[4] as usize, count);
            prop_assert_eq!(bytes.len(), 5 + count);
        }

        #[test]
        fn prop_comments_never_change_output(lines in proptest::collection::vec("[a-z0-9 :@]{0,20}", 0..5)) {
            let plain = assemble("const 1\nM \"f\" I 0 0\nnoop f: ipush 3 stop").unwrap();

            let mut commented = String::from("const 1\nM \"f\" I 0 0\n");
            for line in &lines {
                commented.push_str(&format!("@ {}\n", line));
            }
            commented.push_str("noop\n@ x\nf: ipush 3 @ trailing\nstop\n");

            prop_assert_eq!(assemble(&commented).unwrap(), plain);
        }
    }
}

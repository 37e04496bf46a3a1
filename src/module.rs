//! Bytecode module format
//!
//! ```text
//! offset  field
//! 0       magic number, u32 little-endian
//! 4       pool entry count, u8
//! 5..     pool entries, back to back (methods include their call sites)
//! ..      code bytes, 8 per instruction, to end of stream
//! ```
//!
//! Nothing records where a method's call-site list ends, so only the header
//! can be read back from the wire form. The postcard snapshot keeps the full
//! structure.

use std::io::{self, Read, Write};

use serde::{Deserialize, Serialize};

use crate::emit::Code;
use crate::error::{AsmError, Result};
use crate::pool::{ConstantPool, MAX_POOL_ENTRIES};

/// Magic number at the start of every module
pub const MAGIC_NUMBER: u32 = 0xBABE_FACE;

/// Magic plus count byte
pub const HEADER_LEN: usize = 5;

/// An assembled module, before serialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    pub magic: u32,
    pub pool: ConstantPool,
    pub code: Code,
}

impl Module {
    pub fn new(magic: u32, pool: ConstantPool, code: Code) -> Self {
        Self { magic, pool, code }
    }

    pub fn header(&self) -> ModuleHeader {
        ModuleHeader {
            magic: self.magic,
            pool_count: self.pool.len() as u8,
        }
    }

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        self.header().write_to(w)?;
        for entry in self.pool.iter() {
            w.write_all(&entry.bytes)?;
        }
        w.write_all(&self.code.bytes)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN + self.code.len());
        out.extend_from_slice(&self.magic.to_le_bytes());
        out.push(self.header().pool_count);
        out.extend(self.pool.to_bytes());
        out.extend_from_slice(&self.code.bytes);
        out
    }

    /// Encodes the structured module with postcard.
    pub fn to_snapshot(&self) -> Result<Vec<u8>> {
        Ok(postcard::to_allocvec(self)?)
    }

    pub fn from_snapshot(bytes: &[u8]) -> Result<Self> {
        let module: Module = postcard::from_bytes(bytes)?;
        if module.pool.len() > MAX_POOL_ENTRIES {
            return Err(AsmError::constant_pool(
                format!("snapshot holds {} pool entries", module.pool.len()),
                "<snapshot>",
            ));
        }
        Ok(module)
    }
}

/// The fixed-size prefix of a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModuleHeader {
    pub magic: u32,
    pub pool_count: u8,
}

impl ModuleHeader {
    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.magic.to_le_bytes())?;
        w.write_all(&[self.pool_count])
    }

    /// Reads a header and checks its magic against `expected_magic`.
    pub fn read_from<R: Read>(r: &mut R, expected_magic: u32) -> Result<Self> {
        let mut buf = [0u8; HEADER_LEN];
        r.read_exact(&mut buf).map_err(|_| AsmError::TruncatedHeader)?;

        let magic = u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]);
        if magic != expected_magic {
            return Err(AsmError::BadMagic { found: magic });
        }

        Ok(Self {
            magic,
            pool_count: buf[4],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::Assembler;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn assemble(source: &str) -> Module {
        Assembler::new().assemble(source, "m.asm").unwrap()
    }

    #[test]
    fn test_magic_is_little_endian() {
        let bytes = assemble("const 0").to_bytes();
        assert_eq!(bytes, vec![0xCE, 0xFA, 0xBE, 0xBA, 0x00]);
    }

    #[test]
    fn test_write_to_matches_to_bytes() {
        let module = assemble("const 2\nI 9\nM \"go\" I 0 0\ngo: ipush 1 iprint go: stop");
        let mut written = Vec::new();
        module.write_to(&mut written).unwrap();
        assert_eq!(written, module.to_bytes());
    }

    #[test]
    fn test_header_reads_back() {
        let module = assemble("const 3\nB 1\nF\nS \"x\"\nnoop");
        let bytes = module.to_bytes();
        let header = ModuleHeader::read_from(&mut bytes.as_slice(), MAGIC_NUMBER).unwrap();
        assert_eq!(header, ModuleHeader { magic: MAGIC_NUMBER, pool_count: 3 });
    }

    #[test]
    fn test_header_errors() {
        let short = [0xCE, 0xFA];
        assert!(matches!(
            ModuleHeader::read_from(&mut &short[..], MAGIC_NUMBER),
            Err(AsmError::TruncatedHeader)
        ));

        let wrong = [1, 2, 3, 4, 0];
        assert!(matches!(
            ModuleHeader::read_from(&mut &wrong[..], MAGIC_NUMBER),
            Err(AsmError::BadMagic { found: 0x0403_0201 })
        ));
    }

    #[test]
    fn test_snapshot_keeps_call_sites() {
        let module = assemble("const 1\nM \"f\" I 0 0\nf: noop f: ret");
        let restored = Module::from_snapshot(&module.to_snapshot().unwrap()).unwrap();
        assert_eq!(restored, module);
        assert_eq!(restored.to_bytes(), module.to_bytes());
    }

    proptest! {
        #[test]
        fn prop_header_roundtrip(magic in any::<u32>(), count in 0usize..=40) {
            let mut source = format!("const {}\n", count);
            for i in 0..count {
                source.push_str(&format!("I {}\n", i));
            }
            source.push_str("stop\n");

            let module = Assembler::with_magic(magic).assemble(&source, "p.asm").unwrap();
            let bytes = module.to_bytes();
            let header = ModuleHeader::read_from(&mut bytes.as_slice(), magic).unwrap();

            prop_assert_eq!(header.magic, magic);
            prop_assert_eq!(header.pool_count as usize, count);
            prop_assert_eq!(bytes.len(), HEADER_LEN + count * 5 + 8);
        }
    }
}

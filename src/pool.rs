//! # Constant pool
//!
//! The pool is an arena of independently growable byte buffers, one per
//! declared entry, in declaration order. Method entries are addressed by name
//! through the [`SymbolTable`], which stores arena indices rather than
//! references, so later label resolution can append call sites to an entry that
//! was built long before.
//!
//! ## Source form
//!
//! ```text
//! const 4
//! B 7
//! I 1000
//! S "hello world"
//! M "main" I 1I 0
//! ```
//!
//! Method signatures use `<count><tags>` for both locals and arguments, so
//! `2IB` is two values, an integer and a byte.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{AsmError, Result};
use crate::lexer::Lexer;
use crate::token::Token;
use crate::types::VmType;

/// The pool-entry count travels in a single byte.
pub const MAX_POOL_ENTRIES: usize = u8::MAX as usize;

/// Arena index of a pool entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryIndex(pub usize);

/// Decoded view of a method entry's header and patch region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodInfo {
    pub name: String,
    pub return_type: VmType,
    pub locals: Vec<VmType>,
    pub args: Vec<VmType>,
    /// Instruction indices of every label bound to this method, in source order
    pub call_sites: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolEntry {
    pub kind: VmType,
    /// Wire bytes, type code first; includes the patch region for methods
    pub bytes: Vec<u8>,
    pub method: Option<MethodInfo>,
}

impl PoolEntry {
    fn new(kind: VmType) -> Self {
        Self {
            kind,
            bytes: vec![kind.code()],
            method: None,
        }
    }

    /// Appends one call-site record to a method's patch region.
    /// Returns false for entries that are not methods.
    pub fn record_call_site(&mut self, site: u32) -> bool {
        let Some(method) = self.method.as_mut() else {
            return false;
        };
        method.call_sites.push(site);
        self.bytes.extend_from_slice(&site.to_le_bytes());
        true
    }

    /// Length of the entry without its patch region.
    pub fn header_len(&self) -> usize {
        let patched = self.method.as_ref().map_or(0, |m| m.call_sites.len() * 4);
        self.bytes.len() - patched
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstantPool {
    entries: Vec<PoolEntry>,
}

impl ConstantPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: PoolEntry) -> EntryIndex {
        self.entries.push(entry);
        EntryIndex(self.entries.len() - 1)
    }

    pub fn get(&self, index: EntryIndex) -> Option<&PoolEntry> {
        self.entries.get(index.0)
    }

    pub fn get_mut(&mut self, index: EntryIndex) -> Option<&mut PoolEntry> {
        self.entries.get_mut(index.0)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PoolEntry> {
        self.entries.iter()
    }

    /// All entries' bytes, back to back, in declaration order.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.entries
            .iter()
            .flat_map(|e| e.bytes.iter().copied())
            .collect()
    }
}

/// Method name -> owning pool entry.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    methods: HashMap<String, EntryIndex>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `name`, replacing any earlier binding. Returns the replaced index.
    pub fn bind(&mut self, name: &str, index: EntryIndex) -> Option<EntryIndex> {
        self.methods.insert(name.to_string(), index)
    }

    pub fn resolve(&self, name: &str) -> Option<EntryIndex> {
        self.methods.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

/// Strips the surrounding quotes from `"text"` and returns the inner text
/// with its wire form (`text\0`).
fn quoted_bytes(raw: &str) -> Option<(String, Vec<u8>)> {
    let inner = raw.trim().strip_prefix('"')?.strip_suffix('"')?;
    let mut bytes = inner.as_bytes().to_vec();
    bytes.push(0);
    Some((inner.to_string(), bytes))
}

/// Reads the `const N` preamble and the N entries that follow it.
pub struct PoolBuilder<'a> {
    lexer: &'a mut Lexer,
    file: &'a str,
    pool: ConstantPool,
    symbols: SymbolTable,
}

impl<'a> PoolBuilder<'a> {
    pub fn new(lexer: &'a mut Lexer, file: &'a str) -> Self {
        Self {
            lexer,
            file,
            pool: ConstantPool::new(),
            symbols: SymbolTable::new(),
        }
    }

    pub fn build(mut self) -> Result<(ConstantPool, SymbolTable)> {
        let declared = self.read_preamble()?;

        for slot in 0..declared {
            self.read_entry(slot, declared)?;
        }

        tracing::debug!(
            target: "vmasm::pool",
            entries = self.pool.len(),
            methods = self.symbols.len(),
            "constant pool built"
        );

        Ok((self.pool, self.symbols))
    }

    fn error(&self, message: impl Into<String>) -> AsmError {
        AsmError::constant_pool(message, self.file)
    }

    fn read_preamble(&mut self) -> Result<usize> {
        match self.lexer.next_token() {
            Some(s) if s.token == Token::Word("const".to_string()) => {}
            _ => return Err(self.error("no constant pool was found")),
        }

        let size = match self.lexer.next_token() {
            Some(s) => match s.token {
                Token::Integer(n) => n,
                _ => return Err(self.error("missing constant pool size")),
            },
            None => return Err(self.error("missing constant pool size")),
        };

        match usize::try_from(size) {
            Ok(n) if n <= MAX_POOL_ENTRIES => Ok(n),
            _ => Err(self.error(format!(
                "constant pool size {} is outside 0..={}",
                size, MAX_POOL_ENTRIES
            ))),
        }
    }

    fn read_entry(&mut self, slot: usize, declared: usize) -> Result<()> {
        let Some(tag) = self.lexer.next_token() else {
            return Err(self.error(format!(
                "expected {} constant pool entries, found {}",
                declared, slot
            )));
        };

        let kind = self.resolve_type(&tag.text)?;
        let mut entry = PoolEntry::new(kind);

        match kind {
            VmType::Byte => {
                let value = self.expect_integer("byte constant")?;
                entry.bytes.push(value.to_le_bytes()[0]);
            }
            VmType::Integer => {
                let value = self.expect_integer("integer constant")?;
                entry.bytes.extend_from_slice(&value.to_le_bytes());
            }
            // No value encoding exists for these yet; only the type code is written.
            VmType::Float | VmType::Long | VmType::Double | VmType::Reference => {}
            VmType::String => {
                let line = self.lexer.rest_of_line();
                let (_, bytes) = quoted_bytes(&line.text).ok_or_else(|| {
                    self.error(format!("malformed string constant '{}'", line.text.trim()))
                })?;
                entry.bytes.extend_from_slice(&bytes);
            }
            VmType::Method => {
                let method = self.read_method(&mut entry)?;
                let name = method.name.clone();
                entry.method = Some(method);

                let index = self.pool.push(entry);
                if let Some(previous) = self.symbols.bind(&name, index) {
                    tracing::warn!(
                        target: "vmasm::pool",
                        method = %name,
                        previous = previous.0,
                        current = index.0,
                        "method redefined, later labels bind to the newest entry"
                    );
                }
                tracing::debug!(target: "vmasm::pool", slot, method = %name, "method entry");
                return Ok(());
            }
        }

        tracing::debug!(target: "vmasm::pool", slot, kind = %kind, "constant entry");
        self.pool.push(entry);
        Ok(())
    }

    /// Writes the method header into `entry` and returns its decoded form.
    fn read_method(&mut self, entry: &mut PoolEntry) -> Result<MethodInfo> {
        let name_token = self
            .lexer
            .next_token()
            .ok_or_else(|| self.error("missing method name"))?;

        let (name, name_bytes) = match &name_token.token {
            Token::Quoted(raw) => quoted_bytes(raw),
            _ => None,
        }
        .ok_or_else(|| self.error(format!("malformed method name '{}'", name_token.text)))?;

        let return_token = self
            .lexer
            .next_token()
            .ok_or_else(|| self.error(format!("missing return type for method '{}'", name)))?;
        let return_type = self.resolve_type(&return_token.text)?;

        let locals = self.read_signature(&name, "locals")?;
        let args = self.read_signature(&name, "args")?;

        entry.bytes.extend_from_slice(&name_bytes);
        entry.bytes.push(return_type.code());
        entry.bytes.push(locals.len() as u8);
        entry.bytes.extend(locals.iter().map(|t| t.code()));
        entry.bytes.push(args.len() as u8);
        entry.bytes.extend(args.iter().map(|t| t.code()));

        Ok(MethodInfo {
            name,
            return_type,
            locals,
            args,
            call_sites: Vec::new(),
        })
    }

    /// Parses `<digit><tag>*`, e.g. `0` or `2IB`.
    fn read_signature(&mut self, method: &str, what: &str) -> Result<Vec<VmType>> {
        let token = self
            .lexer
            .next_token()
            .ok_or_else(|| self.error(format!("missing {} for method '{}'", what, method)))?;
        let text = token.text;

        let mut chars = text.chars();
        let count = chars
            .next()
            .and_then(|c| c.to_digit(10))
            .ok_or_else(|| {
                self.error(format!(
                    "malformed {} '{}' for method '{}'",
                    what, text, method
                ))
            })? as usize;

        let types = chars
            .map(|c| {
                VmType::from_tag_char(c).ok_or_else(|| self.error(format!("unknown type: '{}'", c)))
            })
            .collect::<Result<Vec<_>>>()?;

        if types.len() != count {
            return Err(self.error(format!(
                "{} '{}' for method '{}' declares {} types but lists {}",
                what,
                text,
                method,
                count,
                types.len()
            )));
        }

        Ok(types)
    }

    fn resolve_type(&self, tag: &str) -> Result<VmType> {
        VmType::from_tag(tag).ok_or_else(|| self.error(format!("unknown type: '{}'", tag)))
    }

    fn expect_integer(&mut self, what: &str) -> Result<i32> {
        match self.lexer.next_token() {
            Some(s) => match s.token {
                Token::Integer(n) => Ok(n),
                _ => Err(self.error(format!("expected {}, found '{}'", what, s.text))),
            },
            None => Err(self.error(format!("expected {}, found end of input", what))),
        }
    }
}

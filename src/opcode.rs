use serde::{Deserialize, Serialize};

// =============================================================================
// OPCODE - VM instruction set
// =============================================================================

/// How an opcode turns into bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// 4-byte code, then 4 zero bytes
    NoArg,
    /// 4-byte code, then one 4-byte integer operand
    SingleInt,
    /// Discards the rest of the line, emits nothing
    LineSkip,
}

/// Every instruction the VM understands. Discriminants are the wire codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Opcode {
    // special operations
    Noop = 0x00,
    Halt = 0x01,
    Stop = 0x02,
    Pop = 0x03,
    Call = 0x04,
    Ret = 0x05,

    // integer operations
    ILoad = 0x10,
    IStore = 0x11,
    IPush = 0x12,
    IAdd = 0x13,
    ISub = 0x14,
    IMult = 0x15,
    IDiv = 0x16,
    INeg = 0x17,
    IPrint = 0x18,
    IRet = 0x19,

    // string operations
    SLoad = 0x30,
    SStore = 0x31,
    SPrint = 0x32,
    SRet = 0x33,

    // constant pool operations
    CLoad = 0x50,

    /// `@`: comment to end of line
    Comment = 0xFF,
}

impl Opcode {
    pub const ALL: [Opcode; 22] = [
        Opcode::Noop,
        Opcode::Halt,
        Opcode::Stop,
        Opcode::Pop,
        Opcode::Call,
        Opcode::Ret,
        Opcode::ILoad,
        Opcode::IStore,
        Opcode::IPush,
        Opcode::IAdd,
        Opcode::ISub,
        Opcode::IMult,
        Opcode::IDiv,
        Opcode::INeg,
        Opcode::IPrint,
        Opcode::IRet,
        Opcode::SLoad,
        Opcode::SStore,
        Opcode::SPrint,
        Opcode::SRet,
        Opcode::CLoad,
        Opcode::Comment,
    ];

    pub fn from_mnemonic(mnemonic: &str) -> Option<Self> {
        Some(match mnemonic {
            "@" => Opcode::Comment,
            "noop" => Opcode::Noop,
            "halt" => Opcode::Halt,
            "stop" => Opcode::Stop,
            "pop" => Opcode::Pop,
            "call" => Opcode::Call,
            "ret" => Opcode::Ret,
            "iload" => Opcode::ILoad,
            "istore" => Opcode::IStore,
            "ipush" => Opcode::IPush,
            "iadd" => Opcode::IAdd,
            "isub" => Opcode::ISub,
            "imult" => Opcode::IMult,
            "idiv" => Opcode::IDiv,
            "ineg" => Opcode::INeg,
            "iprint" => Opcode::IPrint,
            "iret" => Opcode::IRet,
            "sload" => Opcode::SLoad,
            "sstore" => Opcode::SStore,
            "sprint" => Opcode::SPrint,
            "sret" => Opcode::SRet,
            "cload" => Opcode::CLoad,
            _ => return None,
        })
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.code() == code)
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Comment => "@",
            Opcode::Noop => "noop",
            Opcode::Halt => "halt",
            Opcode::Stop => "stop",
            Opcode::Pop => "pop",
            Opcode::Call => "call",
            Opcode::Ret => "ret",
            Opcode::ILoad => "iload",
            Opcode::IStore => "istore",
            Opcode::IPush => "ipush",
            Opcode::IAdd => "iadd",
            Opcode::ISub => "isub",
            Opcode::IMult => "imult",
            Opcode::IDiv => "idiv",
            Opcode::INeg => "ineg",
            Opcode::IPrint => "iprint",
            Opcode::IRet => "iret",
            Opcode::SLoad => "sload",
            Opcode::SStore => "sstore",
            Opcode::SPrint => "sprint",
            Opcode::SRet => "sret",
            Opcode::CLoad => "cload",
        }
    }

    pub fn encoding(self) -> Encoding {
        use Opcode::*;
        match self {
            Comment => Encoding::LineSkip,

            Halt | Call | ILoad | IStore | IPush | SLoad | SStore | CLoad => Encoding::SingleInt,

            Noop | Stop | Pop | Ret | IAdd | ISub | IMult | IDiv | INeg | IPrint | IRet
            | SPrint | SRet => Encoding::NoArg,
        }
    }

    /// Wire bytes for this instruction. `operand` is ignored for
    /// `NoArg` opcodes; `LineSkip` yields nothing.
    pub fn encode(self, operand: i32) -> Vec<u8> {
        let code = i32::from(self.code()).to_le_bytes();
        match self.encoding() {
            Encoding::LineSkip => Vec::new(),
            Encoding::NoArg => [code, 0i32.to_le_bytes()].concat(),
            Encoding::SingleInt => [code, operand.to_le_bytes()].concat(),
        }
    }
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.mnemonic())
    }
}

/// Width in bytes of every emitted instruction.
pub const INSTRUCTION_WIDTH: usize = 8;

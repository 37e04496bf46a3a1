use serde::{Deserialize, Serialize};

/// Value types known to the VM, as they appear in the constant pool.
///
/// Each type has a one-letter tag used in assembly source and a one-byte code
/// written ahead of every pool entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum VmType {
    Byte = 0x01,
    Integer = 0x02,
    Float = 0x03,
    Long = 0x04,
    Double = 0x05,
    String = 0x06,
    Reference = 0x07,
    Method = 0x08,
}

impl VmType {
    pub const ALL: [VmType; 8] = [
        VmType::Byte,
        VmType::Integer,
        VmType::Float,
        VmType::Long,
        VmType::Double,
        VmType::String,
        VmType::Reference,
        VmType::Method,
    ];

    pub fn from_tag(tag: &str) -> Option<Self> {
        Some(match tag {
            "B" => VmType::Byte,
            "I" => VmType::Integer,
            "F" => VmType::Float,
            "L" => VmType::Long,
            "D" => VmType::Double,
            "S" => VmType::String,
            "R" => VmType::Reference,
            "M" => VmType::Method,
            _ => return None,
        })
    }

    pub fn from_tag_char(tag: char) -> Option<Self> {
        let mut buf = [0u8; 4];
        Self::from_tag(tag.encode_utf8(&mut buf))
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.code() == code)
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn tag(self) -> char {
        match self {
            VmType::Byte => 'B',
            VmType::Integer => 'I',
            VmType::Float => 'F',
            VmType::Long => 'L',
            VmType::Double => 'D',
            VmType::String => 'S',
            VmType::Reference => 'R',
            VmType::Method => 'M',
        }
    }

    /// Human-readable name used in listings.
    pub fn name(self) -> &'static str {
        match self {
            VmType::Byte => "byte",
            VmType::Integer => "int",
            VmType::Float => "float",
            VmType::Long => "long",
            VmType::Double => "double",
            VmType::String => "string",
            VmType::Reference => "ref",
            VmType::Method => "method",
        }
    }

    /// Float, long, double and reference entries carry only their type code.
    pub fn has_payload(self) -> bool {
        !matches!(
            self,
            VmType::Float | VmType::Long | VmType::Double | VmType::Reference
        )
    }
}

impl std::fmt::Display for VmType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_and_code_lookup() {
        for t in VmType::ALL {
            assert_eq!(VmType::from_tag_char(t.tag()), Some(t));
            assert_eq!(VmType::from_code(t.code()), Some(t));
        }
    }

    #[test]
    fn test_codes_match_wire_format() {
        assert_eq!(VmType::Byte.code(), 1);
        assert_eq!(VmType::Integer.code(), 2);
        assert_eq!(VmType::String.code(), 6);
        assert_eq!(VmType::Method.code(), 8);
    }

    #[test]
    fn test_unknown_tags() {
        assert_eq!(VmType::from_tag("X"), None);
        assert_eq!(VmType::from_tag("i"), None);
        assert_eq!(VmType::from_tag("II"), None);
        assert_eq!(VmType::from_code(0), None);
        assert_eq!(VmType::from_code(9), None);
    }

    #[test]
    fn test_payload_free_types() {
        let bare: Vec<_> = VmType::ALL.into_iter().filter(|t| !t.has_payload()).collect();
        assert_eq!(
            bare,
            vec![VmType::Float, VmType::Long, VmType::Double, VmType::Reference]
        );
    }
}

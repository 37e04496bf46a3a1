use std::fmt::Write;

use crate::emit::Instruction;
use crate::module::Module;
use crate::pool::PoolEntry;
use crate::types::VmType;

const RULE: &str = "════════════════════════════════════════";

/// Print a listing of an assembled module
pub fn print_listing(module: &Module) {
    print!("{}", render_listing(module));
}

/// Render the constant pool and the code section as text.
pub fn render_listing(module: &Module) -> String {
    let mut out = String::new();

    section_header(
        &mut out,
        &format!("magic 0x{:08X}", module.magic),
        &format!("{} pool entries", module.pool.len()),
    );
    for (slot, entry) in module.pool.iter().enumerate() {
        let _ = writeln!(out, "{:04}  {:<8} {}", slot, entry.kind.name(), format_entry(entry));
    }
    out.push('\n');

    section_header(
        &mut out,
        "code",
        &format!("{} instructions", module.code.instructions.len()),
    );
    let call_sites = collect_call_sites(module);
    for ins in &module.code.instructions {
        if let Some(names) = call_sites.iter().find(|(site, _)| *site == ins.index) {
            let _ = writeln!(out, "      ┌── {}", names.1.join(", "));
        }
        let _ = writeln!(out, "{:04}  {}", ins.index, format_instruction(ins));
    }

    out
}

fn section_header(out: &mut String, title: &str, subtitle: &str) {
    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(out, " {}", title);
    let _ = writeln!(out, " {}", subtitle);
    let _ = writeln!(out, "{}", RULE);
}

/// (instruction index, method names labelled there), in index order
fn collect_call_sites(module: &Module) -> Vec<(u32, Vec<String>)> {
    let mut sites: Vec<(u32, Vec<String>)> = Vec::new();

    for method in module.pool.iter().filter_map(|e| e.method.as_ref()) {
        for &site in &method.call_sites {
            match sites.iter_mut().find(|(s, _)| *s == site) {
                Some((_, names)) => names.push(method.name.clone()),
                None => sites.push((site, vec![method.name.clone()])),
            }
        }
    }

    sites.sort_by_key(|(site, _)| *site);
    sites
}

fn format_instruction(ins: &Instruction) -> String {
    let name = ins.opcode.mnemonic().to_uppercase();
    match ins.operand {
        Some(operand) => format!("{:<10}  {}", name, operand),
        None => name,
    }
}

fn format_entry(entry: &PoolEntry) -> String {
    let payload = &entry.bytes[1..];

    if let Some(method) = &entry.method {
        return format!(
            "\"{}\" ({}) -> {}  locals {}  sites {:?}",
            method.name,
            format_types(&method.args),
            method.return_type,
            format_types(&method.locals),
            method.call_sites
        );
    }

    match entry.kind {
        VmType::Byte => payload.first().map(u8::to_string).unwrap_or_default(),
        VmType::Integer => match payload {
            [a, b, c, d] => i32::from_le_bytes([*a, *b, *c, *d]).to_string(),
            _ => "?".to_string(),
        },
        VmType::String => {
            let text = payload.strip_suffix(&[0]).unwrap_or(payload);
            format!("{:?}", String::from_utf8_lossy(text))
        }
        _ => "-".to_string(),
    }
}

fn format_types(types: &[VmType]) -> String {
    if types.is_empty() {
        return "-".to_string();
    }
    types
        .iter()
        .map(|t| t.name())
        .collect::<Vec<_>>()
        .join(", ")
}

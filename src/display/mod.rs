//! Text renderings for debugging and audit.
pub mod disasm;
pub mod trace;

pub use disasm::{disassemble, format_schedule};
pub use trace::format_contract;

//! Instruction set support.
//!
//! This module contains everything the pipeline knows about individual
//! instructions:
//! 1. **Decode:** `decode_instruction` mapping a raw word to an opcode
//!    record (operation id plus flag bits consumed by later stages).
//! 2. **Dispatch:** The function table the execute stage indexes by
//!    operation id.
//! 3. **Handlers:** One cell per operation, populating the EX/DC latch
//!    through a narrow context.

/// Instruction word to opcode record decoding.
pub mod decode;
/// Opcode handler cells and the dispatch table.
pub mod handlers;

pub use self::decode::{Opcode, OpcodeRecord, decode_instruction, flags};
pub use self::handlers::{ExecuteCtx, FUNCTION_TABLE, OpcodeFn};

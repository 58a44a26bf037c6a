//! Sticky error codes returned by `Z80::step`.

/// No error; `step()` completed normally.
pub const OK: i32 = 0;

/// Reserved for an invalid DAA input. The DAA algorithm implemented here
/// never produces an input this core considers invalid, so this code is
/// never raised.
pub const ERR_DAA_INVALID: i32 = -1;

/// Opcode (including a prefixed opcode) not in the supported set.
pub const ERR_INVALID_OPCODE: i32 = -2;

/// The embedder's `Bus::poll_error` returned `true` during the
/// in-progress instruction; execution was aborted mid-instruction and any
/// register mutations already performed are not rolled back.
pub const ERR_BUS: i32 = -3;

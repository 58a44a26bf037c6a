use crate::core::Bus;
use crate::cpu::z80::{IndexMode, Z80};

impl<B: Bus> Z80<B> {
    /// PUSH rr (mask 11rr0101; rr: 0=BC, 1=DE, 2=HL/IX/IY, 3=AF).
    pub(crate) fn op_push(&mut self, opcode: u8) -> u32 {
        let rp = (opcode >> 4) & 0x03;
        let val = self.get_rp_af(rp);
        self.push(val);
        if rp == 2 && self.index_mode != IndexMode::HL { 15 } else { 11 }
    }

    /// POP rr (mask 11rr0001; rr: 0=BC, 1=DE, 2=HL/IX/IY, 3=AF).
    pub(crate) fn op_pop(&mut self, opcode: u8) -> u32 {
        let rp = (opcode >> 4) & 0x03;
        let val = self.pop();
        self.set_rp_af(rp, val);
        if rp == 2 && self.index_mode != IndexMode::HL { 14 } else { 10 }
    }
}

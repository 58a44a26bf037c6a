use crate::core::Bus;
use crate::cpu::z80::{Flag, IndexMode, Z80};

impl<B: Bus> Z80<B> {
    /// Evaluate a condition code (3 bits from opcode bits 5-3).
    /// 0=NZ, 1=Z, 2=NC, 3=C, 4=PO, 5=PE, 6=P, 7=M
    pub(crate) fn eval_condition(&self, cc: u8) -> bool {
        match cc {
            0 => (self.f & Flag::Z as u8) == 0,
            1 => (self.f & Flag::Z as u8) != 0,
            2 => (self.f & Flag::C as u8) == 0,
            3 => (self.f & Flag::C as u8) != 0,
            4 => (self.f & Flag::PV as u8) == 0,
            5 => (self.f & Flag::PV as u8) != 0,
            6 => (self.f & Flag::S as u8) == 0,
            7 => (self.f & Flag::S as u8) != 0,
            _ => unreachable!(),
        }
    }

    pub(crate) fn op_jp_nn(&mut self) -> u32 {
        let addr = self.fetch_word();
        self.pc = addr;
        10
    }

    pub(crate) fn op_jp_cc_nn(&mut self, opcode: u8) -> u32 {
        let cc = (opcode >> 3) & 0x07;
        let addr = self.fetch_word();
        if self.eval_condition(cc) {
            self.pc = addr;
        }
        10
    }

    pub(crate) fn op_jr_e(&mut self) -> u32 {
        let disp = self.fetch_disp();
        self.pc = self.pc.wrapping_add(disp as i16 as u16);
        12
    }

    pub(crate) fn op_jr_cc_e(&mut self, opcode: u8) -> u32 {
        let cc = (opcode >> 3) & 0x03;
        let disp = self.fetch_disp();
        if self.eval_condition(cc) {
            self.pc = self.pc.wrapping_add(disp as i16 as u16);
            12
        } else {
            7
        }
    }

    /// JP (HL) / JP (IX) / JP (IY) — really "JP HL": load PC from the
    /// register pair, not from memory at that address.
    pub(crate) fn op_jp_hl(&mut self) -> u32 {
        self.pc = self.get_rp(2);
        if self.index_mode == IndexMode::HL { 4 } else { 8 }
    }

    pub(crate) fn op_djnz(&mut self) -> u32 {
        self.b = self.b.wrapping_sub(1);
        let disp = self.fetch_disp();
        if self.b != 0 {
            self.pc = self.pc.wrapping_add(disp as i16 as u16);
            13
        } else {
            8
        }
    }

    pub(crate) fn op_call_nn(&mut self) -> u32 {
        let addr = self.fetch_word();
        self.push(self.pc);
        self.pc = addr;
        17
    }

    pub(crate) fn op_call_cc_nn(&mut self, opcode: u8) -> u32 {
        let cc = (opcode >> 3) & 0x07;
        let addr = self.fetch_word();
        if self.eval_condition(cc) {
            self.push(self.pc);
            self.pc = addr;
            17
        } else {
            10
        }
    }

    pub(crate) fn op_ret(&mut self) -> u32 {
        self.pc = self.pop();
        10
    }

    pub(crate) fn op_ret_cc(&mut self, opcode: u8) -> u32 {
        let cc = (opcode >> 3) & 0x07;
        if self.eval_condition(cc) {
            self.pc = self.pop();
            11
        } else {
            5
        }
    }

    pub(crate) fn op_rst(&mut self, opcode: u8) -> u32 {
        let target = (opcode & 0x38) as u16;
        self.push(self.pc);
        self.pc = target;
        11
    }

    pub(crate) fn op_di(&mut self) -> u32 {
        self.iff1 = false;
        self.iff2 = false;
        4
    }

    pub(crate) fn op_ei(&mut self) -> u32 {
        self.iff1 = true;
        self.iff2 = true;
        4
    }

    pub(crate) fn op_in_a_n(&mut self) -> u32 {
        let n = self.fetch_byte();
        let addr = ((self.a as u16) << 8) | n as u16;
        self.a = self.io_rd(addr);
        11
    }

    pub(crate) fn op_out_n_a(&mut self) -> u32 {
        let n = self.fetch_byte();
        let addr = ((self.a as u16) << 8) | n as u16;
        self.io_wr(addr, self.a);
        11
    }

    // --- ED-space control flow ---

    /// RETN/RETI: pop PC, copy IFF2 into IFF1. Both opcodes behave
    /// identically from the core's standpoint (interrupt acknowledgment is
    /// out of scope, so there is no daisy-chain signal to emit for RETI).
    pub(crate) fn op_retn(&mut self) -> u32 {
        self.iff1 = self.iff2;
        self.pc = self.pop();
        14
    }

    pub(crate) fn op_im(&mut self, opcode: u8) -> u32 {
        self.im = match (opcode >> 3) & 0x03 {
            0 | 1 => 0,
            2 => 1,
            3 => 2,
            _ => unreachable!(),
        };
        8
    }
}

use crate::core::Bus;
use crate::cpu::z80::{Flag, IndexMode, Z80};

impl<B: Bus> Z80<B> {
    /// LD r, n (mask 00rrr110) / LD (HL), n / LD (IX+d), n / LD (IY+d), n.
    pub(crate) fn op_ld_r_n(&mut self, opcode: u8) -> u32 {
        let r = (opcode >> 3) & 0x07;

        if r == 6 {
            if self.index_mode == IndexMode::HL {
                let addr = self.get_hl();
                let n = self.fetch_byte();
                self.wr(addr, n);
                10
            } else {
                let addr = self.get_index_addr();
                let n = self.fetch_byte();
                self.wr(addr, n);
                19
            }
        } else {
            let n = self.fetch_byte();
            self.set_reg8(r, n);
            7
        }
    }

    /// LD r, r' (mask 01dddsss) / LD r, (HL|IX+d|IY+d) / LD (HL|IX+d|IY+d), r.
    /// `HALT` (0x76, src=dst=6) is handled by the caller before this is reached.
    pub(crate) fn op_ld_r_r(&mut self, opcode: u8) -> u32 {
        let src = opcode & 0x07;
        let dst = (opcode >> 3) & 0x07;

        if src == 6 {
            let (addr, t) = if self.index_mode == IndexMode::HL {
                (self.get_hl(), 7)
            } else {
                (self.get_index_addr(), 19)
            };
            let val = self.rd(addr);
            self.set_reg8(dst, val);
            t
        } else if dst == 6 {
            let (addr, t) = if self.index_mode == IndexMode::HL {
                (self.get_hl(), 7)
            } else {
                (self.get_index_addr(), 19)
            };
            let val = self.get_reg8(src);
            self.wr(addr, val);
            t
        } else {
            let val = self.get_reg8(src);
            self.set_reg8(dst, val);
            4
        }
    }

    /// LD rr, nn (mask 00pp0001). rr/IX/IY depending on the active prefix.
    pub(crate) fn op_ld_rr_nn(&mut self, opcode: u8) -> u32 {
        let p = (opcode >> 4) & 0x03;
        let nn = self.fetch_word();
        self.set_rp(p, nn);
        if p == 2 && self.index_mode != IndexMode::HL { 14 } else { 10 }
    }

    pub(crate) fn op_ld_a_bc(&mut self) -> u32 {
        let addr = self.get_bc();
        self.a = self.rd(addr);
        7
    }

    pub(crate) fn op_ld_a_de(&mut self) -> u32 {
        let addr = self.get_de();
        self.a = self.rd(addr);
        7
    }

    pub(crate) fn op_ld_bc_a(&mut self) -> u32 {
        let addr = self.get_bc();
        self.wr(addr, self.a);
        7
    }

    pub(crate) fn op_ld_de_a(&mut self) -> u32 {
        let addr = self.get_de();
        self.wr(addr, self.a);
        7
    }

    pub(crate) fn op_ld_a_nn(&mut self) -> u32 {
        let addr = self.fetch_word();
        self.a = self.rd(addr);
        13
    }

    pub(crate) fn op_ld_nn_a(&mut self) -> u32 {
        let addr = self.fetch_word();
        self.wr(addr, self.a);
        13
    }

    /// LD SP, HL / LD SP, IX / LD SP, IY.
    pub(crate) fn op_ld_sp_hl(&mut self) -> u32 {
        self.sp = self.get_rp(2);
        if self.index_mode == IndexMode::HL { 6 } else { 10 }
    }

    /// LD (nn), HL / LD (nn), IX / LD (nn), IY.
    pub(crate) fn op_ld_nn_hl(&mut self) -> u32 {
        let addr = self.fetch_word();
        let val = self.get_rp(2);
        self.write_word(addr, val);
        if self.index_mode == IndexMode::HL { 16 } else { 20 }
    }

    /// LD HL, (nn) / LD IX, (nn) / LD IY, (nn).
    pub(crate) fn op_ld_hl_nn_ind(&mut self) -> u32 {
        let addr = self.fetch_word();
        let val = self.read_word(addr);
        self.set_rp(2, val);
        if self.index_mode == IndexMode::HL { 16 } else { 20 }
    }

    /// EX AF, AF' — swap A and F only, never BCDEHL.
    pub(crate) fn op_ex_af_af(&mut self) -> u32 {
        self.swap_af();
        4
    }

    /// EXX — swap the entire live BCDEHL bank with its shadow.
    pub(crate) fn op_exx(&mut self) -> u32 {
        self.swap_bcdehl();
        4
    }

    /// EX DE, HL — never affected by a DD/FD prefix (there is no "EX DE,IX").
    pub(crate) fn op_ex_de_hl(&mut self) -> u32 {
        std::mem::swap(&mut self.d, &mut self.h);
        std::mem::swap(&mut self.e, &mut self.l);
        4
    }

    /// EX (SP), HL / EX (SP), IX / EX (SP), IY.
    pub(crate) fn op_ex_sp_hl(&mut self) -> u32 {
        let stacked = self.read_word(self.sp);
        let reg = self.get_rp(2);
        self.write_word(self.sp, reg);
        self.set_rp(2, stacked);
        if self.index_mode == IndexMode::HL { 19 } else { 23 }
    }

    // --- ED-space load/store ---

    pub(crate) fn op_ld_i_a(&mut self) -> u32 {
        self.i = self.a;
        9
    }

    pub(crate) fn op_ld_r_a(&mut self) -> u32 {
        self.r = self.a;
        9
    }

    /// LD A, I — S,Z from I; H=0,N=0; P/V = IFF2; C preserved; Y/X from I.
    pub(crate) fn op_ld_a_i(&mut self) -> u32 {
        self.a = self.i;
        self.load_a_special_flags();
        9
    }

    /// LD A, R — same flag rules as `LD A,I`, sourced from R.
    pub(crate) fn op_ld_a_r(&mut self) -> u32 {
        self.a = self.r;
        self.load_a_special_flags();
        9
    }

    fn load_a_special_flags(&mut self) {
        let mut f = self.f & Flag::C as u8;
        if self.a == 0 {
            f |= Flag::Z as u8;
        }
        if (self.a & 0x80) != 0 {
            f |= Flag::S as u8;
        }
        if self.iff2 {
            f |= Flag::PV as u8;
        }
        f |= self.a & (Flag::X as u8 | Flag::Y as u8);
        self.f = f;
    }

    /// LD (nn), rr (mask 01pp0011, ED-prefixed).
    pub(crate) fn op_ld_nn_rr_ed(&mut self, opcode: u8) -> u32 {
        let p = (opcode >> 4) & 0x03;
        let addr = self.fetch_word();
        let val = self.get_rp(p);
        self.write_word(addr, val);
        20
    }

    /// LD rr, (nn) (mask 01pp1011, ED-prefixed).
    pub(crate) fn op_ld_rr_nn_ed(&mut self, opcode: u8) -> u32 {
        let p = (opcode >> 4) & 0x03;
        let addr = self.fetch_word();
        let val = self.read_word(addr);
        self.set_rp(p, val);
        20
    }

    /// IN r, (C) — S,Z,P/V(parity) from input; H=0,N=0; C preserved; Y/X from
    /// input. `r == 6` (undocumented `IN F,(C)`) updates flags without
    /// storing the value anywhere.
    pub(crate) fn op_in_r_c(&mut self, opcode: u8) -> u32 {
        let r = (opcode >> 3) & 0x07;
        let addr = self.get_bc();
        let val = self.io_rd(addr);
        if r != 6 {
            self.set_reg8(r, val);
        }
        let mut f = self.f & Flag::C as u8;
        if val == 0 {
            f |= Flag::Z as u8;
        }
        if (val & 0x80) != 0 {
            f |= Flag::S as u8;
        }
        if val.count_ones() % 2 == 0 {
            f |= Flag::PV as u8;
        }
        f |= val & (Flag::X as u8 | Flag::Y as u8);
        self.f = f;
        12
    }

    /// OUT (C), r — `r == 6` outputs 0 (undocumented `OUT (C),0`).
    pub(crate) fn op_out_c_r(&mut self, opcode: u8) -> u32 {
        let r = (opcode >> 3) & 0x07;
        let addr = self.get_bc();
        let val = if r == 6 { 0 } else { self.get_reg8(r) };
        self.io_wr(addr, val);
        12
    }
}

use crate::core::Bus;
use crate::cpu::z80::{Flag, IndexMode, Z80};

impl<B: Bus> Z80<B> {
    // --- Flag helpers ---

    fn get_parity(val: u8) -> bool {
        val.count_ones() % 2 == 0
    }

    fn update_flags_logic(&mut self, result: u8, is_and: bool) {
        let mut f = 0;
        if result == 0 {
            f |= Flag::Z as u8;
        }
        if (result & 0x80) != 0 {
            f |= Flag::S as u8;
        }
        if Self::get_parity(result) {
            f |= Flag::PV as u8;
        }
        if is_and {
            f |= Flag::H as u8; // AND sets H, OR/XOR clear it
        }
        f |= result & (Flag::X as u8 | Flag::Y as u8);
        self.f = f;
    }

    fn do_add(&mut self, val: u8, carry_in: bool) {
        let a = self.a;
        let c_val = if carry_in && (self.f & Flag::C as u8) != 0 { 1u16 } else { 0 };
        let result_u16 = (a as u16) + (val as u16) + c_val;
        let result = result_u16 as u8;

        let mut f = 0;
        if result == 0 {
            f |= Flag::Z as u8;
        }
        if (result & 0x80) != 0 {
            f |= Flag::S as u8;
        }
        if ((a & 0xF) + (val & 0xF) + (c_val as u8)) > 0xF {
            f |= Flag::H as u8;
        }
        if ((a ^ result) & (val ^ result) & 0x80) != 0 {
            f |= Flag::PV as u8;
        }
        if result_u16 > 0xFF {
            f |= Flag::C as u8;
        }

        f |= result & (Flag::X as u8 | Flag::Y as u8);
        self.a = result;
        self.f = f;
    }

    fn do_sub(&mut self, val: u8, carry_in: bool) {
        let a = self.a;
        let c_val = if carry_in && (self.f & Flag::C as u8) != 0 { 1u16 } else { 0 };
        let result_i16 = (a as i16) - (val as i16) - (c_val as i16);
        let result = result_i16 as u8;

        let mut f = Flag::N as u8;
        if result == 0 {
            f |= Flag::Z as u8;
        }
        if (result & 0x80) != 0 {
            f |= Flag::S as u8;
        }
        if (a & 0xF) < ((val & 0xF) + (c_val as u8)) {
            f |= Flag::H as u8;
        }
        if ((a ^ val) & (a ^ result) & 0x80) != 0 {
            f |= Flag::PV as u8;
        }
        if result_i16 < 0 {
            f |= Flag::C as u8;
        }

        f |= result & (Flag::X as u8 | Flag::Y as u8);
        self.a = result;
        self.f = f;
    }

    fn do_cp(&mut self, val: u8) {
        let a = self.a;
        let result_i16 = (a as i16) - (val as i16);
        let result = result_i16 as u8;

        let mut f = Flag::N as u8;
        if result == 0 {
            f |= Flag::Z as u8;
        }
        if (result & 0x80) != 0 {
            f |= Flag::S as u8;
        }
        if (a & 0xF) < (val & 0xF) {
            f |= Flag::H as u8;
        }
        if ((a ^ val) & (a ^ result) & 0x80) != 0 {
            f |= Flag::PV as u8;
        }
        if result_i16 < 0 {
            f |= Flag::C as u8;
        }

        // CP copies Y/X from the operand, not the (discarded) result.
        f |= val & (Flag::X as u8 | Flag::Y as u8);
        self.f = f;
    }

    fn perform_alu_op(&mut self, op: u8, val: u8) {
        match op {
            0 => self.do_add(val, false), // ADD
            1 => self.do_add(val, true),  // ADC
            2 => self.do_sub(val, false), // SUB
            3 => self.do_sub(val, true),  // SBC
            4 => {
                self.a &= val;
                self.update_flags_logic(self.a, true);
            } // AND
            5 => {
                self.a ^= val;
                self.update_flags_logic(self.a, false);
            } // XOR
            6 => {
                self.a |= val;
                self.update_flags_logic(self.a, false);
            } // OR
            7 => self.do_cp(val), // CP
            _ => unreachable!(),
        }
    }

    fn calc_inc_flags(&mut self, val: u8) -> u8 {
        let result = val.wrapping_add(1);
        let mut f = self.f & Flag::C as u8; // C unaffected
        if result == 0 {
            f |= Flag::Z as u8;
        }
        if (result & 0x80) != 0 {
            f |= Flag::S as u8;
        }
        if (val & 0xF) == 0xF {
            f |= Flag::H as u8;
        }
        if val == 0x7F {
            f |= Flag::PV as u8;
        }
        f |= result & (Flag::X as u8 | Flag::Y as u8);
        self.f = f;
        result
    }

    fn calc_dec_flags(&mut self, val: u8) -> u8 {
        let result = val.wrapping_sub(1);
        let mut f = (self.f & Flag::C as u8) | Flag::N as u8;
        if result == 0 {
            f |= Flag::Z as u8;
        }
        if (result & 0x80) != 0 {
            f |= Flag::S as u8;
        }
        if (val & 0xF) == 0x0 {
            f |= Flag::H as u8;
        }
        if val == 0x80 {
            f |= Flag::PV as u8;
        }
        f |= result & (Flag::X as u8 | Flag::Y as u8);
        self.f = f;
        result
    }

    // --- Instructions ---

    /// ALU A, r / ALU A, (HL) / ALU A, (IX+d) / ALU A, (IY+d). Opcode mask 10xxxzzz.
    pub(crate) fn op_alu_r(&mut self, opcode: u8) -> u32 {
        let alu_op = (opcode >> 3) & 0x07;
        let r = opcode & 0x07;

        if r == 6 {
            if self.index_mode == IndexMode::HL {
                let addr = self.get_hl();
                let val = self.rd(addr);
                self.perform_alu_op(alu_op, val);
                7
            } else {
                let addr = self.get_index_addr();
                let val = self.rd(addr);
                self.perform_alu_op(alu_op, val);
                19
            }
        } else {
            let val = self.get_reg8(r);
            self.perform_alu_op(alu_op, val);
            4
        }
    }

    /// ALU A, n. Opcode mask 11xxx110.
    pub(crate) fn op_alu_n(&mut self, opcode: u8) -> u32 {
        let alu_op = (opcode >> 3) & 0x07;
        let val = self.fetch_byte();
        self.perform_alu_op(alu_op, val);
        7
    }

    /// INC/DEC r (mask 00rrr10x) / (HL) / (IX+d) / (IY+d).
    pub(crate) fn op_inc_dec_r(&mut self, opcode: u8) -> u32 {
        let r = (opcode >> 3) & 0x07;
        let is_dec = (opcode & 0x01) != 0;

        if r == 6 {
            let addr = self.get_index_addr();
            let val = self.rd(addr);
            let result = if is_dec {
                self.calc_dec_flags(val)
            } else {
                self.calc_inc_flags(val)
            };
            self.wr(addr, result);
            if self.index_mode == IndexMode::HL { 11 } else { 23 }
        } else {
            let val = self.get_reg8(r);
            let result = if is_dec {
                self.calc_dec_flags(val)
            } else {
                self.calc_inc_flags(val)
            };
            self.set_reg8(r, result);
            4
        }
    }

    /// ADD HL,rr / ADD IX,rr / ADD IY,rr (mask 00pp1001).
    pub(crate) fn op_add_hl_rr(&mut self, opcode: u8) -> u32 {
        let p = (opcode >> 4) & 0x03;
        let hl = self.get_rp(2);
        let rr = self.get_rp(p);
        let result = (hl as u32) + (rr as u32);

        let mut f = self.f & (Flag::S as u8 | Flag::Z as u8 | Flag::PV as u8);
        if ((hl & 0x0FFF) as u32 + (rr & 0x0FFF) as u32) > 0x0FFF {
            f |= Flag::H as u8;
        }
        if result > 0xFFFF {
            f |= Flag::C as u8;
        }
        let res16 = result as u16;
        f |= ((res16 >> 8) as u8) & (Flag::X as u8 | Flag::Y as u8);
        self.f = f;
        self.set_rp(2, res16);
        if self.index_mode == IndexMode::HL { 11 } else { 15 }
    }

    /// INC rr / DEC rr (mask 00pp0x11). No flags affected.
    pub(crate) fn op_inc_dec_rr(&mut self, opcode: u8) -> u32 {
        let p = (opcode >> 4) & 0x03;
        let is_dec = (opcode & 0x08) != 0;
        let val = self.get_rp(p);
        let result = if is_dec { val.wrapping_sub(1) } else { val.wrapping_add(1) };
        self.set_rp(p, result);
        if self.index_mode == IndexMode::HL || p != 2 { 6 } else { 10 }
    }

    pub(crate) fn op_rlca(&mut self) -> u32 {
        let carry = (self.a & 0x80) != 0;
        self.a = self.a.rotate_left(1);
        let mut f = self.f & (Flag::S as u8 | Flag::Z as u8 | Flag::PV as u8);
        if carry {
            f |= Flag::C as u8;
        }
        f |= self.a & (Flag::X as u8 | Flag::Y as u8);
        self.f = f;
        4
    }

    pub(crate) fn op_rrca(&mut self) -> u32 {
        let carry = (self.a & 0x01) != 0;
        self.a = self.a.rotate_right(1);
        let mut f = self.f & (Flag::S as u8 | Flag::Z as u8 | Flag::PV as u8);
        if carry {
            f |= Flag::C as u8;
        }
        f |= self.a & (Flag::X as u8 | Flag::Y as u8);
        self.f = f;
        4
    }

    pub(crate) fn op_rla(&mut self) -> u32 {
        let carry_in = (self.f & Flag::C as u8) != 0;
        let carry_out = (self.a & 0x80) != 0;
        self.a = (self.a << 1) | (carry_in as u8);
        let mut f = self.f & (Flag::S as u8 | Flag::Z as u8 | Flag::PV as u8);
        if carry_out {
            f |= Flag::C as u8;
        }
        f |= self.a & (Flag::X as u8 | Flag::Y as u8);
        self.f = f;
        4
    }

    pub(crate) fn op_rra(&mut self) -> u32 {
        let carry_in = (self.f & Flag::C as u8) != 0;
        let carry_out = (self.a & 0x01) != 0;
        self.a = (self.a >> 1) | ((carry_in as u8) << 7);
        let mut f = self.f & (Flag::S as u8 | Flag::Z as u8 | Flag::PV as u8);
        if carry_out {
            f |= Flag::C as u8;
        }
        f |= self.a & (Flag::X as u8 | Flag::Y as u8);
        self.f = f;
        4
    }

    pub(crate) fn op_daa(&mut self) -> u32 {
        let a = self.a;
        let n = (self.f & Flag::N as u8) != 0;
        let old_h = (self.f & Flag::H as u8) != 0;
        let old_c = (self.f & Flag::C as u8) != 0;
        let low = a & 0xF;

        let mut correction = 0u8;
        let mut new_c = old_c;

        if low > 9 || old_h {
            correction += 0x06;
        }
        if a > 0x99 || old_c {
            correction += 0x60;
            new_c = true;
        }

        let new_a = if n { a.wrapping_sub(correction) } else { a.wrapping_add(correction) };
        let new_h = if n { old_h && low < 6 } else { low > 9 };

        let mut f = if n { Flag::N as u8 } else { 0 };
        if new_c {
            f |= Flag::C as u8;
        }
        if new_h {
            f |= Flag::H as u8;
        }
        if new_a == 0 {
            f |= Flag::Z as u8;
        }
        if (new_a & 0x80) != 0 {
            f |= Flag::S as u8;
        }
        if Self::get_parity(new_a) {
            f |= Flag::PV as u8;
        }
        f |= new_a & (Flag::X as u8 | Flag::Y as u8);

        self.a = new_a;
        self.f = f;
        4
    }

    pub(crate) fn op_cpl(&mut self) -> u32 {
        self.a = !self.a;
        let mut f = self.f & (Flag::S as u8 | Flag::Z as u8 | Flag::PV as u8 | Flag::C as u8);
        f |= Flag::H as u8 | Flag::N as u8;
        f |= self.a & (Flag::X as u8 | Flag::Y as u8);
        self.f = f;
        4
    }

    pub(crate) fn op_scf(&mut self) -> u32 {
        let mut f = self.f & (Flag::S as u8 | Flag::Z as u8 | Flag::PV as u8);
        f |= Flag::C as u8;
        f |= self.a & (Flag::X as u8 | Flag::Y as u8);
        self.f = f;
        4
    }

    pub(crate) fn op_ccf(&mut self) -> u32 {
        let old_c = (self.f & Flag::C as u8) != 0;
        let mut f = self.f & (Flag::S as u8 | Flag::Z as u8 | Flag::PV as u8);
        if old_c {
            f |= Flag::H as u8;
        } else {
            f |= Flag::C as u8;
        }
        f |= self.a & (Flag::X as u8 | Flag::Y as u8);
        self.f = f;
        4
    }

    pub(crate) fn op_neg(&mut self) -> u32 {
        let a = self.a;
        self.a = 0;
        self.do_sub(a, false);
        8
    }

    pub(crate) fn op_sbc_hl_rr(&mut self, opcode: u8) -> u32 {
        let p = (opcode >> 4) & 0x03;
        let hl = self.get_rp(2);
        let rr = self.get_rp(p);
        let c_val = if (self.f & Flag::C as u8) != 0 { 1i32 } else { 0 };
        let result_i32 = (hl as i32) - (rr as i32) - c_val;
        let result = result_i32 as u16;

        let mut f = Flag::N as u8;
        if result == 0 {
            f |= Flag::Z as u8;
        }
        if (result & 0x8000) != 0 {
            f |= Flag::S as u8;
        }
        if ((hl & 0x0FFF) as i32) < ((rr & 0x0FFF) as i32 + c_val) {
            f |= Flag::H as u8;
        }
        if ((hl ^ rr) & (hl ^ result) & 0x8000) != 0 {
            f |= Flag::PV as u8;
        }
        if result_i32 < 0 {
            f |= Flag::C as u8;
        }
        f |= ((result >> 8) as u8) & (Flag::X as u8 | Flag::Y as u8);

        self.f = f;
        self.set_hl(result);
        15
    }

    pub(crate) fn op_adc_hl_rr(&mut self, opcode: u8) -> u32 {
        let p = (opcode >> 4) & 0x03;
        let hl = self.get_rp(2);
        let rr = self.get_rp(p);
        let c_val = if (self.f & Flag::C as u8) != 0 { 1u32 } else { 0 };
        let result_u32 = (hl as u32) + (rr as u32) + c_val;
        let result = result_u32 as u16;

        let mut f = 0;
        if result == 0 {
            f |= Flag::Z as u8;
        }
        if (result & 0x8000) != 0 {
            f |= Flag::S as u8;
        }
        if ((hl & 0x0FFF) as u32 + (rr & 0x0FFF) as u32 + c_val) > 0x0FFF {
            f |= Flag::H as u8;
        }
        if ((hl ^ result) & (rr ^ result) & 0x8000) != 0 {
            f |= Flag::PV as u8;
        }
        if result_u32 > 0xFFFF {
            f |= Flag::C as u8;
        }
        f |= ((result >> 8) as u8) & (Flag::X as u8 | Flag::Y as u8);

        self.f = f;
        self.set_hl(result);
        15
    }

    /// RRD: rotate the nibble at (HL) with A's low nibble, right.
    pub(crate) fn op_rrd(&mut self) -> u32 {
        let addr = self.get_hl();
        let mem = self.rd(addr);
        let a_lo = self.a & 0x0F;
        let new_mem = (a_lo << 4) | (mem >> 4);
        let new_a = (self.a & 0xF0) | (mem & 0x0F);
        self.wr(addr, new_mem);
        self.a = new_a;
        let carry = self.f & Flag::C as u8;
        self.update_flags_logic(self.a, false);
        self.f |= carry;
        18
    }

    /// RLD: rotate the nibble at (HL) with A's low nibble, left.
    pub(crate) fn op_rld(&mut self) -> u32 {
        let addr = self.get_hl();
        let mem = self.rd(addr);
        let a_lo = self.a & 0x0F;
        let new_mem = (mem << 4) | a_lo;
        let new_a = (self.a & 0xF0) | (mem >> 4);
        self.wr(addr, new_mem);
        self.a = new_a;
        let carry = self.f & Flag::C as u8;
        self.update_flags_logic(self.a, false);
        self.f |= carry;
        18
    }
}

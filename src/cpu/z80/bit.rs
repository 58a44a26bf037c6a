use crate::core::Bus;
use crate::cpu::z80::{Flag, Z80};
use crate::error;

impl<B: Bus> Z80<B> {
    /// CB rotate/shift. op: 0=RLC,1=RRC,2=RL,3=RR,4=SLA,5=SRA,7=SRL (6=SLL,
    /// undocumented, out of scope — callers never pass it). Returns
    /// (result, new F): S,Z,PV(parity) from result, H=0, N=0, C = bit shifted out.
    fn do_cb_rotate_shift(&self, op: u8, val: u8) -> (u8, u8) {
        let (result, carry) = match op {
            0 => {
                let c = (val >> 7) & 1;
                ((val << 1) | c, c)
            }
            1 => {
                let c = val & 1;
                ((val >> 1) | (c << 7), c)
            }
            2 => {
                let old_c = if (self.f & Flag::C as u8) != 0 { 1 } else { 0 };
                let c = (val >> 7) & 1;
                ((val << 1) | old_c, c)
            }
            3 => {
                let old_c = if (self.f & Flag::C as u8) != 0 { 0x80 } else { 0 };
                let c = val & 1;
                ((val >> 1) | old_c, c)
            }
            4 => {
                let c = (val >> 7) & 1;
                (val << 1, c)
            }
            5 => {
                let c = val & 1;
                (((val as i8) >> 1) as u8, c)
            }
            7 => {
                let c = val & 1;
                (val >> 1, c)
            }
            _ => unreachable!("do_cb_rotate_shift called with undocumented op {}", op),
        };

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
        if carry != 0 {
            f |= Flag::C as u8;
        }
        f |= result & (Flag::X as u8 | Flag::Y as u8);

        (result, f)
    }

    /// CB-prefixed table: rotate/shift, BIT/RES/SET across r and (HL).
    pub(crate) fn execute_cb(&mut self, op: u8) -> u32 {
        let xx = (op >> 6) & 0x03; // 0=rot/shift, 1=BIT, 2=RES, 3=SET
        let yyy = (op >> 3) & 0x07; // bit number or shift kind
        let zzz = op & 0x07;

        if zzz == 6 {
            let addr = self.get_hl();
            let val = self.rd(addr);
            match xx {
                1 => {
                    let tested = val & (1 << yyy);
                    let mut f = self.f & Flag::C as u8;
                    f |= Flag::H as u8;
                    if tested == 0 {
                        f |= Flag::Z as u8;
                        f |= Flag::PV as u8;
                    }
                    if yyy == 7 && tested != 0 {
                        f |= Flag::S as u8;
                    }
                    // MEMPTR is out of scope; approximate X/Y from the tested byte.
                    f |= val & (Flag::X as u8 | Flag::Y as u8);
                    self.f = f;
                    12
                }
                _ => {
                    let result = match xx {
                        0 => {
                            let (r, f) = self.do_cb_rotate_shift(yyy, val);
                            self.f = f;
                            r
                        }
                        2 => val & !(1 << yyy),
                        3 => val | (1 << yyy),
                        _ => unreachable!(),
                    };
                    self.wr(addr, result);
                    15
                }
            }
        } else {
            let val = self.get_reg8(zzz);
            match xx {
                0 => {
                    let (result, f) = self.do_cb_rotate_shift(yyy, val);
                    self.f = f;
                    self.set_reg8(zzz, result);
                }
                1 => {
                    let tested = val & (1 << yyy);
                    let mut f = self.f & Flag::C as u8;
                    f |= Flag::H as u8;
                    if tested == 0 {
                        f |= Flag::Z as u8;
                        f |= Flag::PV as u8;
                    }
                    if yyy == 7 && tested != 0 {
                        f |= Flag::S as u8;
                    }
                    f |= val & (Flag::X as u8 | Flag::Y as u8);
                    self.f = f;
                }
                2 => self.set_reg8(zzz, val & !(1 << yyy)),
                3 => self.set_reg8(zzz, val | (1 << yyy)),
                _ => unreachable!(),
            }
            8
        }
    }

    /// DD CB d op / FD CB d op (indexed bit operations) are explicitly out of
    /// scope. The displacement and sub-opcode bytes are still consumed so PC
    /// ends up where a real Z80 would leave it, then the sticky invalid-opcode
    /// error is raised.
    pub(crate) fn execute_index_cb(&mut self) -> u32 {
        let _displacement = self.fetch_byte();
        let _sub_opcode = self.fetch_byte();
        self.error = error::ERR_INVALID_OPCODE;
        23
    }
}

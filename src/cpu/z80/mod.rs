mod alu;
mod bit;
mod block;
mod branch;
mod load_store;
mod stack;

use crate::core::Bus;
use crate::cpu::state::{CpuStateTrait, Z80State};
use crate::error;

#[repr(u8)]
#[derive(Copy, Clone, Debug)]
pub enum Flag {
    C = 0x01,  // Carry
    N = 0x02,  // Add/Subtract
    PV = 0x04, // Parity/Overflow
    X = 0x08,  // Unused (copy of bit 3)
    H = 0x10,  // Half Carry
    Y = 0x20,  // Unused (copy of bit 5)
    Z = 0x40,  // Zero
    S = 0x80,  // Sign
}

/// Public register naming for `get_reg8`/`set_reg8`. `I` and `R` have no
/// shadow counterpart; passing `shadow: true` for them is a no-op and
/// simply returns/sets the live value.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Reg8 {
    A,
    B,
    C,
    D,
    E,
    F,
    H,
    L,
    I,
    R,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Reg16 {
    AF,
    BC,
    DE,
    HL,
    IX,
    IY,
    SP,
    PC,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum IndexMode {
    HL,
    IX,
    IY,
}

/// Cycle-approximate Z80 core: one `step()` call fetches, decodes and fully
/// executes one instruction (including every iteration of a repeating block
/// instruction) and returns its T-state cost.
pub struct Z80<B: Bus> {
    pub bus: B,

    // Registers
    pub(crate) a: u8,
    pub(crate) f: u8,
    pub(crate) b: u8,
    pub(crate) c: u8,
    pub(crate) d: u8,
    pub(crate) e: u8,
    pub(crate) h: u8,
    pub(crate) l: u8,
    // Shadow registers
    pub(crate) a_shadow: u8,
    pub(crate) f_shadow: u8,
    pub(crate) b_shadow: u8,
    pub(crate) c_shadow: u8,
    pub(crate) d_shadow: u8,
    pub(crate) e_shadow: u8,
    pub(crate) h_shadow: u8,
    pub(crate) l_shadow: u8,
    // Index & special registers
    pub(crate) ix: u16,
    pub(crate) iy: u16,
    pub(crate) i: u8,
    pub(crate) r: u8,
    pub(crate) sp: u16,
    pub(crate) pc: u16,

    pub(crate) iff1: bool,
    pub(crate) iff2: bool,
    pub(crate) im: u8,
    pub(crate) halted: bool,

    /// Sticky fatal-error code. Once non-zero every `step()` is a no-op
    /// returning the same code.
    pub(crate) error: i32,

    /// Prefix space selected for the instruction currently executing; reset
    /// to `HL` at the start of every `step()`.
    pub(crate) index_mode: IndexMode,
}

impl<B: Bus> Z80<B> {
    /// Construct a core bound to `bus`. All registers start zeroed and the
    /// current register bank is the main set.
    pub fn new(bus: B) -> Self {
        Self {
            bus,
            a: 0,
            f: 0,
            b: 0,
            c: 0,
            d: 0,
            e: 0,
            h: 0,
            l: 0,
            a_shadow: 0,
            f_shadow: 0,
            b_shadow: 0,
            c_shadow: 0,
            d_shadow: 0,
            e_shadow: 0,
            h_shadow: 0,
            l_shadow: 0,
            ix: 0,
            iy: 0,
            i: 0,
            r: 0,
            sp: 0,
            pc: 0,
            iff1: false,
            iff2: false,
            im: 0,
            halted: false,
            error: error::OK,
            index_mode: IndexMode::HL,
        }
    }

    /// Zero every register and latch; the bus binding is unaffected.
    pub fn reset(&mut self) {
        self.a = 0;
        self.f = 0;
        self.b = 0;
        self.c = 0;
        self.d = 0;
        self.e = 0;
        self.h = 0;
        self.l = 0;
        self.a_shadow = 0;
        self.f_shadow = 0;
        self.b_shadow = 0;
        self.c_shadow = 0;
        self.d_shadow = 0;
        self.e_shadow = 0;
        self.h_shadow = 0;
        self.l_shadow = 0;
        self.ix = 0;
        self.iy = 0;
        self.i = 0;
        self.r = 0;
        self.sp = 0;
        self.pc = 0;
        self.iff1 = false;
        self.iff2 = false;
        self.im = 0;
        self.halted = false;
        self.error = error::OK;
        self.index_mode = IndexMode::HL;
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    // --- Bus access wrappers: every memory/IO touch polls the embedder's
    // sticky user-error signal immediately afterwards. ---

    pub(crate) fn rd(&mut self, addr: u16) -> u8 {
        let v = self.bus.mem_read(addr);
        if self.bus.poll_error() {
            self.error = error::ERR_BUS;
        }
        v
    }

    pub(crate) fn wr(&mut self, addr: u16, value: u8) {
        self.bus.mem_write(addr, value);
        if self.bus.poll_error() {
            self.error = error::ERR_BUS;
        }
    }

    pub(crate) fn io_rd(&mut self, addr: u16) -> u8 {
        let v = self.bus.io_read(addr);
        if self.bus.poll_error() {
            self.error = error::ERR_BUS;
        }
        v
    }

    pub(crate) fn io_wr(&mut self, addr: u16, value: u8) {
        self.bus.io_write(addr, value);
        if self.bus.poll_error() {
            self.error = error::ERR_BUS;
        }
    }

    pub(crate) fn fetch_byte(&mut self) -> u8 {
        let v = self.rd(self.pc);
        self.pc = self.pc.wrapping_add(1);
        v
    }

    pub(crate) fn fetch_word(&mut self) -> u16 {
        let lo = self.fetch_byte();
        let hi = self.fetch_byte();
        ((hi as u16) << 8) | lo as u16
    }

    pub(crate) fn fetch_disp(&mut self) -> i8 {
        self.fetch_byte() as i8
    }

    pub(crate) fn read_word(&mut self, addr: u16) -> u16 {
        let lo = self.rd(addr);
        let hi = self.rd(addr.wrapping_add(1));
        ((hi as u16) << 8) | lo as u16
    }

    pub(crate) fn write_word(&mut self, addr: u16, value: u16) {
        self.wr(addr, value as u8);
        self.wr(addr.wrapping_add(1), (value >> 8) as u8);
    }

    pub(crate) fn refresh_r(&mut self) {
        self.r = (self.r & 0x80) | (self.r.wrapping_add(1) & 0x7F);
    }

    // --- 16-bit pair helpers on the live set ---

    pub fn get_bc(&self) -> u16 {
        ((self.b as u16) << 8) | self.c as u16
    }
    pub fn set_bc(&mut self, val: u16) {
        self.b = (val >> 8) as u8;
        self.c = val as u8;
    }

    pub fn get_de(&self) -> u16 {
        ((self.d as u16) << 8) | self.e as u16
    }
    pub fn set_de(&mut self, val: u16) {
        self.d = (val >> 8) as u8;
        self.e = val as u8;
    }

    pub fn get_hl(&self) -> u16 {
        ((self.h as u16) << 8) | self.l as u16
    }
    pub fn set_hl(&mut self, val: u16) {
        self.h = (val >> 8) as u8;
        self.l = val as u8;
    }

    pub fn get_af(&self) -> u16 {
        ((self.a as u16) << 8) | self.f as u16
    }
    pub fn set_af(&mut self, val: u16) {
        self.a = (val >> 8) as u8;
        self.f = val as u8;
    }

    /// Effective address for the operand addressed by the current prefix
    /// space: `(HL)` unprefixed, `(IX+d)`/`(IY+d)` under DD/FD (consuming
    /// the displacement byte from the instruction stream).
    pub(crate) fn get_index_addr(&mut self) -> u16 {
        match self.index_mode {
            IndexMode::HL => self.get_hl(),
            IndexMode::IX => {
                let d = self.fetch_disp();
                self.ix.wrapping_add(d as i16 as u16)
            }
            IndexMode::IY => {
                let d = self.fetch_disp();
                self.iy.wrapping_add(d as i16 as u16)
            }
        }
    }

    /// Get 16-bit register pair by index (0=BC, 1=DE, 2=HL/IX/IY, 3=SP).
    pub(crate) fn get_rp(&self, index: u8) -> u16 {
        match index {
            0 => self.get_bc(),
            1 => self.get_de(),
            2 => match self.index_mode {
                IndexMode::HL => self.get_hl(),
                IndexMode::IX => self.ix,
                IndexMode::IY => self.iy,
            },
            3 => self.sp,
            _ => unreachable!("get_rp called with index {}", index),
        }
    }

    pub(crate) fn set_rp(&mut self, index: u8, val: u16) {
        match index {
            0 => self.set_bc(val),
            1 => self.set_de(val),
            2 => match self.index_mode {
                IndexMode::HL => self.set_hl(val),
                IndexMode::IX => self.ix = val,
                IndexMode::IY => self.iy = val,
            },
            3 => self.sp = val,
            _ => unreachable!("set_rp called with index {}", index),
        }
    }

    /// Get 16-bit register pair by index for PUSH/POP (0=BC, 1=DE, 2=HL/IX/IY, 3=AF).
    pub(crate) fn get_rp_af(&self, index: u8) -> u16 {
        match index {
            0 => self.get_bc(),
            1 => self.get_de(),
            2 => match self.index_mode {
                IndexMode::HL => self.get_hl(),
                IndexMode::IX => self.ix,
                IndexMode::IY => self.iy,
            },
            3 => self.get_af(),
            _ => unreachable!("get_rp_af called with index {}", index),
        }
    }

    pub(crate) fn set_rp_af(&mut self, index: u8, val: u16) {
        match index {
            0 => self.set_bc(val),
            1 => self.set_de(val),
            2 => match self.index_mode {
                IndexMode::HL => self.set_hl(val),
                IndexMode::IX => self.ix = val,
                IndexMode::IY => self.iy = val,
            },
            3 => self.set_af(val),
            _ => unreachable!("set_rp_af called with index {}", index),
        }
    }

    /// Get 8-bit register by index (0=B,1=C,2=D,3=E,4=H,5=L,7=A). Index 6
    /// (`(HL)`/`(IX+d)`/`(IY+d)`) must be handled by the caller.
    ///
    /// Deliberately ignores `index_mode`: the undocumented IXH/IXL/IYH/IYL
    /// half-register opcodes are out of scope, so a register-direct access
    /// to the H/L slot under a DD/FD prefix still reaches plain H/L.
    pub fn get_reg8(&self, index: u8) -> u8 {
        match index {
            0 => self.b,
            1 => self.c,
            2 => self.d,
            3 => self.e,
            4 => self.h,
            5 => self.l,
            7 => self.a,
            _ => unreachable!("get_reg8 called with index {}", index),
        }
    }

    pub fn set_reg8(&mut self, index: u8, val: u8) {
        match index {
            0 => self.b = val,
            1 => self.c = val,
            2 => self.d = val,
            3 => self.e = val,
            4 => self.h = val,
            5 => self.l = val,
            7 => self.a = val,
            _ => unreachable!("set_reg8 called with index {}", index),
        }
    }

    pub fn swap_af(&mut self) {
        std::mem::swap(&mut self.a, &mut self.a_shadow);
        std::mem::swap(&mut self.f, &mut self.f_shadow);
    }

    pub fn swap_bcdehl(&mut self) {
        std::mem::swap(&mut self.b, &mut self.b_shadow);
        std::mem::swap(&mut self.c, &mut self.c_shadow);
        std::mem::swap(&mut self.d, &mut self.d_shadow);
        std::mem::swap(&mut self.e, &mut self.e_shadow);
        std::mem::swap(&mut self.h, &mut self.h_shadow);
        std::mem::swap(&mut self.l, &mut self.l_shadow);
    }

    pub fn push(&mut self, val: u16) {
        self.sp = self.sp.wrapping_sub(1);
        self.wr(self.sp, (val >> 8) as u8);
        self.sp = self.sp.wrapping_sub(1);
        self.wr(self.sp, val as u8);
    }

    pub fn pop(&mut self) -> u16 {
        let lo = self.rd(self.sp);
        self.sp = self.sp.wrapping_add(1);
        let hi = self.rd(self.sp);
        self.sp = self.sp.wrapping_add(1);
        ((hi as u16) << 8) | lo as u16
    }

    // --- Public register-file surface ---

    pub fn get_reg8_named(&self, name: Reg8, shadow: bool) -> u8 {
        match (name, shadow) {
            (Reg8::A, false) => self.a,
            (Reg8::A, true) => self.a_shadow,
            (Reg8::B, false) => self.b,
            (Reg8::B, true) => self.b_shadow,
            (Reg8::C, false) => self.c,
            (Reg8::C, true) => self.c_shadow,
            (Reg8::D, false) => self.d,
            (Reg8::D, true) => self.d_shadow,
            (Reg8::E, false) => self.e,
            (Reg8::E, true) => self.e_shadow,
            (Reg8::F, false) => self.f,
            (Reg8::F, true) => self.f_shadow,
            (Reg8::H, false) => self.h,
            (Reg8::H, true) => self.h_shadow,
            (Reg8::L, false) => self.l,
            (Reg8::L, true) => self.l_shadow,
            (Reg8::I, _) => self.i,
            (Reg8::R, _) => self.r,
        }
    }

    pub fn set_reg8_named(&mut self, name: Reg8, value: u8, shadow: bool) {
        match (name, shadow) {
            (Reg8::A, false) => self.a = value,
            (Reg8::A, true) => self.a_shadow = value,
            (Reg8::B, false) => self.b = value,
            (Reg8::B, true) => self.b_shadow = value,
            (Reg8::C, false) => self.c = value,
            (Reg8::C, true) => self.c_shadow = value,
            (Reg8::D, false) => self.d = value,
            (Reg8::D, true) => self.d_shadow = value,
            (Reg8::E, false) => self.e = value,
            (Reg8::E, true) => self.e_shadow = value,
            (Reg8::F, false) => self.f = value,
            (Reg8::F, true) => self.f_shadow = value,
            (Reg8::H, false) => self.h = value,
            (Reg8::H, true) => self.h_shadow = value,
            (Reg8::L, false) => self.l = value,
            (Reg8::L, true) => self.l_shadow = value,
            (Reg8::I, _) => self.i = value,
            (Reg8::R, _) => self.r = value,
        }
    }

    pub fn get_reg16_named(&self, name: Reg16) -> u16 {
        match name {
            Reg16::AF => self.get_af(),
            Reg16::BC => self.get_bc(),
            Reg16::DE => self.get_de(),
            Reg16::HL => self.get_hl(),
            Reg16::IX => self.ix,
            Reg16::IY => self.iy,
            Reg16::SP => self.sp,
            Reg16::PC => self.pc,
        }
    }

    pub fn set_reg16_named(&mut self, name: Reg16, value: u16) {
        match name {
            Reg16::AF => self.set_af(value),
            Reg16::BC => self.set_bc(value),
            Reg16::DE => self.set_de(value),
            Reg16::HL => self.set_hl(value),
            Reg16::IX => self.ix = value,
            Reg16::IY => self.iy = value,
            Reg16::SP => self.sp = value,
            Reg16::PC => self.pc = value,
        }
    }

    /// Fetch, decode and fully execute exactly one instruction.
    pub fn step(&mut self) -> i32 {
        if self.error != error::OK {
            return self.error;
        }
        if self.halted {
            return 4;
        }

        self.index_mode = IndexMode::HL;
        let mut opcode = self.fetch_byte();
        self.refresh_r();

        loop {
            match opcode {
                0xDD => {
                    self.index_mode = IndexMode::IX;
                    opcode = self.fetch_byte();
                    self.refresh_r();
                }
                0xFD => {
                    self.index_mode = IndexMode::IY;
                    opcode = self.fetch_byte();
                    self.refresh_r();
                }
                _ => break,
            }
        }

        let t = self.execute_instruction(opcode);

        if self.error != error::OK {
            return self.error;
        }
        t as i32
    }

    fn execute_instruction(&mut self, opcode: u8) -> u32 {
        match opcode {
            0x00 => 4, // NOP

            0x76 => {
                self.halted = true;
                4
            }

            0xCB => {
                if self.index_mode != IndexMode::HL {
                    self.execute_index_cb()
                } else {
                    let op = self.fetch_byte();
                    self.refresh_r();
                    self.execute_cb(op)
                }
            }
            0xED => {
                self.index_mode = IndexMode::HL;
                let op = self.fetch_byte();
                self.refresh_r();
                self.execute_ed(op)
            }

            // --- Load/Store ---
            0x02 => self.op_ld_bc_a(),
            0x12 => self.op_ld_de_a(),
            0x22 => self.op_ld_nn_hl(),
            0x32 => self.op_ld_nn_a(),

            0x08 => self.op_ex_af_af(),

            0x0A => self.op_ld_a_bc(),
            0x1A => self.op_ld_a_de(),
            0x2A => self.op_ld_hl_nn_ind(),
            0x3A => self.op_ld_a_nn(),

            op if (op & 0xCF) == 0x01 => self.op_ld_rr_nn(op),
            op if (op & 0xC7) == 0x06 => self.op_ld_r_n(op),
            op if (op & 0xC0) == 0x40 => self.op_ld_r_r(op),

            0xF9 => self.op_ld_sp_hl(),
            0xEB => self.op_ex_de_hl(),
            0xD9 => self.op_exx(),
            0xE3 => self.op_ex_sp_hl(),

            // --- Stack ---
            op if (op & 0xCF) == 0xC5 => self.op_push(op),
            op if (op & 0xCF) == 0xC1 => self.op_pop(op),

            // --- ALU ---
            op if (op & 0xC0) == 0x80 => self.op_alu_r(op),
            op if (op & 0xC7) == 0xC6 => self.op_alu_n(op),

            op if (op & 0xC7) == 0x04 => self.op_inc_dec_r(op),
            op if (op & 0xC7) == 0x05 => self.op_inc_dec_r(op),

            op if (op & 0xCF) == 0x09 => self.op_add_hl_rr(op),
            op if (op & 0xCF) == 0x03 => self.op_inc_dec_rr(op),
            op if (op & 0xCF) == 0x0B => self.op_inc_dec_rr(op),

            0x07 => self.op_rlca(),
            0x0F => self.op_rrca(),
            0x17 => self.op_rla(),
            0x1F => self.op_rra(),

            0x27 => self.op_daa(),
            0x2F => self.op_cpl(),
            0x37 => self.op_scf(),
            0x3F => self.op_ccf(),

            // --- Branch/Control flow ---
            0xC3 => self.op_jp_nn(),
            0xE9 => self.op_jp_hl(),
            0x18 => self.op_jr_e(),
            0x10 => self.op_djnz(),
            0xCD => self.op_call_nn(),
            0xC9 => self.op_ret(),
            0xDB => self.op_in_a_n(),
            0xD3 => self.op_out_n_a(),

            0xF3 => self.op_di(),
            0xFB => self.op_ei(),

            op if (op & 0xC7) == 0xC2 => self.op_jp_cc_nn(op),
            op if (op & 0xE7) == 0x20 => self.op_jr_cc_e(op),
            op if (op & 0xC7) == 0xC4 => self.op_call_cc_nn(op),
            op if (op & 0xC7) == 0xC0 => self.op_ret_cc(op),
            op if (op & 0xC7) == 0xC7 => self.op_rst(op),

            _ => {
                self.error = error::ERR_INVALID_OPCODE;
                4
            }
        }
    }

    /// ED-prefixed table. Undefined ED opcodes act as an 8T NOP, matching
    /// real hardware rather than raising `invalid_opcode` — Z80 software
    /// occasionally relies on this.
    fn execute_ed(&mut self, opcode: u8) -> u32 {
        match opcode {
            0x47 => self.op_ld_i_a(),
            0x4F => self.op_ld_r_a(),
            0x57 => self.op_ld_a_i(),
            0x5F => self.op_ld_a_r(),
            0x67 => self.op_rrd(),
            0x6F => self.op_rld(),

            0xA0 | 0xA8 => self.op_ldi_ldd(opcode),
            0xA1 | 0xA9 => self.op_cpi_cpd(opcode),
            0xA2 | 0xAA => self.op_ini_ind(opcode),
            0xA3 | 0xAB => self.op_outi_outd(opcode),
            0xB0 | 0xB8 => self.op_ldir_lddr(opcode),
            0xB1 | 0xB9 => self.op_cpir_cpdr(opcode),
            0xB2 | 0xBA => self.op_inir_indr(opcode),
            0xB3 | 0xBB => self.op_otir_otdr(opcode),

            op if (op & 0xC7) == 0x40 => self.op_in_r_c(op),
            op if (op & 0xC7) == 0x41 => self.op_out_c_r(op),
            op if (op & 0xCF) == 0x42 => self.op_sbc_hl_rr(op),
            op if (op & 0xCF) == 0x43 => self.op_ld_nn_rr_ed(op),
            op if (op & 0xC7) == 0x44 => self.op_neg(),
            op if (op & 0xC7) == 0x45 => self.op_retn(),
            op if (op & 0xC7) == 0x46 => self.op_im(op),
            op if (op & 0xCF) == 0x4A => self.op_adc_hl_rr(op),
            op if (op & 0xCF) == 0x4B => self.op_ld_rr_nn_ed(op),

            _ => 8,
        }
    }
}

impl<B: Bus> CpuStateTrait for Z80<B> {
    type Snapshot = Z80State;

    fn snapshot(&self) -> Z80State {
        Z80State {
            a: self.a,
            f: self.f,
            b: self.b,
            c: self.c,
            d: self.d,
            e: self.e,
            h: self.h,
            l: self.l,
            a_prime: self.a_shadow,
            f_prime: self.f_shadow,
            b_prime: self.b_shadow,
            c_prime: self.c_shadow,
            d_prime: self.d_shadow,
            e_prime: self.e_shadow,
            h_prime: self.h_shadow,
            l_prime: self.l_shadow,
            ix: self.ix,
            iy: self.iy,
            sp: self.sp,
            pc: self.pc,
            i: self.i,
            r: self.r,
            iff1: self.iff1,
            iff2: self.iff2,
            im: self.im,
            halted: self.halted,
        }
    }
}

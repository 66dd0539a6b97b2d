//! Fixed-width word arithmetic
//!
//! TinyRAM words are `W`-bit unsigned integers, with `W` anywhere from 1 to
//! 64.  They are stored in a `u64` and every result is masked back down to
//! `W` bits, so arithmetic wraps silently; overflow is only visible through
//! the flag returned alongside each result.

/// Word arithmetic for a particular word width
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Alu {
    bits: u32,
    mask: u64,
}

impl Alu {
    /// Builds an ALU for `bits`-wide words
    ///
    /// # Panics
    /// If `bits` is not in the range `1..=64`
    pub const fn new(bits: u32) -> Self {
        assert!(bits >= 1 && bits <= 64, "word width must be in 1..=64");
        let mask = if bits == 64 { u64::MAX } else { (1 << bits) - 1 };
        Self { bits, mask }
    }

    /// Word width, in bits
    #[inline]
    pub const fn bits(&self) -> u32 {
        self.bits
    }

    /// Mask with the low `W` bits set
    #[inline]
    pub const fn mask(&self) -> u64 {
        self.mask
    }

    /// Number of bytes needed to hold one word
    #[inline]
    pub const fn word_bytes(&self) -> u64 {
        (self.bits as u64).div_ceil(8)
    }

    /// Truncates a value to `W` bits
    #[inline]
    pub const fn truncate(&self, v: u64) -> u64 {
        v & self.mask
    }

    /// Interprets a word as a two's complement signed value
    #[inline]
    pub const fn signed(&self, v: u64) -> i64 {
        let shift = 64 - self.bits;
        ((v << shift) as i64) >> shift
    }

    #[inline]
    const fn msb(&self, v: u64) -> bool {
        self.bit(v, self.bits as u64 - 1)
    }

    #[inline]
    const fn bit(&self, v: u64, i: u64) -> bool {
        (v >> i) & 1 != 0
    }

    /// Addition; the flag is the carry out of bit `W - 1`
    ///
    /// ```text
    /// add ri, rj, A    ri = rj + A
    /// ```
    pub fn add(&self, a: u64, b: u64) -> (u64, bool) {
        let sum = u128::from(a) + u128::from(b);
        (self.truncate(sum as u64), sum > u128::from(self.mask))
    }

    /// Subtraction; the flag is the borrow
    pub fn sub(&self, a: u64, b: u64) -> (u64, bool) {
        (self.truncate(a.wrapping_sub(b)), a < b)
    }

    /// Low `W` bits of the unsigned product; the flag is set if the product
    /// did not fit
    pub fn mull(&self, a: u64, b: u64) -> (u64, bool) {
        let p = u128::from(a) * u128::from(b);
        (self.truncate(p as u64), p > u128::from(self.mask))
    }

    /// High `W` bits of the unsigned product; the flag is set if they are
    /// non-zero
    pub fn umulh(&self, a: u64, b: u64) -> (u64, bool) {
        let p = u128::from(a) * u128::from(b);
        let hi = self.truncate((p >> self.bits) as u64);
        (hi, hi != 0)
    }

    /// High `W` bits of the signed product; the flag is set if the product
    /// does not fit in a signed `W`-bit word
    pub fn smulh(&self, a: u64, b: u64) -> (u64, bool) {
        let p = i128::from(self.signed(a)) * i128::from(self.signed(b));
        let hi = self.truncate((p >> self.bits) as u64);
        let limit = 1i128 << (self.bits - 1);
        (hi, p < -limit || p >= limit)
    }

    /// Unsigned quotient, or `None` when dividing by zero
    pub fn udiv(&self, a: u64, b: u64) -> Option<u64> {
        a.checked_div(b).map(|q| self.truncate(q))
    }

    /// Unsigned remainder, or `None` when dividing by zero
    pub fn umod(&self, a: u64, b: u64) -> Option<u64> {
        a.checked_rem(b).map(|r| self.truncate(r))
    }

    /// Logical shift left; the flag is the last bit shifted out
    ///
    /// That is bit `W - n` of `a`.  Shifting by zero clears the flag, and
    /// shifting by more than `W` pushes out only zeros after the value
    /// itself, so the flag is clear and the result is zero.
    pub fn shl(&self, a: u64, n: u64) -> (u64, bool) {
        let w = u64::from(self.bits);
        match n {
            0 => (self.truncate(a), false),
            n if n > w => (0, false),
            n if n == w => (0, a & 1 != 0),
            n => (self.truncate(a << n), self.bit(a, w - n)),
        }
    }

    /// Logical shift right; the flag is the last bit shifted out
    ///
    /// That is bit `n - 1` of `a`, with the same edge cases as [`Alu::shl`].
    pub fn shr(&self, a: u64, n: u64) -> (u64, bool) {
        let w = u64::from(self.bits);
        match n {
            0 => (self.truncate(a), false),
            n if n > w => (0, false),
            n if n == w => (0, self.msb(a)),
            n => (self.truncate(a) >> n, self.bit(a, n - 1)),
        }
    }

    /// Bitwise and; the flag is cleared
    pub fn and(&self, a: u64, b: u64) -> (u64, bool) {
        (a & b, false)
    }

    /// Bitwise or; the flag is cleared
    pub fn or(&self, a: u64, b: u64) -> (u64, bool) {
        (self.truncate(a | b), false)
    }

    /// Bitwise exclusive or; the flag is cleared
    pub fn xor(&self, a: u64, b: u64) -> (u64, bool) {
        (self.truncate(a ^ b), false)
    }

    /// Bitwise complement; the flag is cleared
    pub fn not(&self, a: u64) -> (u64, bool) {
        (self.truncate(!a), false)
    }

    /// `a == b`
    pub fn cmpe(&self, a: u64, b: u64) -> bool {
        self.truncate(a) == self.truncate(b)
    }

    /// Unsigned `a > b`
    pub fn cmpa(&self, a: u64, b: u64) -> bool {
        self.truncate(a) > self.truncate(b)
    }

    /// Unsigned `a >= b`
    pub fn cmpae(&self, a: u64, b: u64) -> bool {
        self.truncate(a) >= self.truncate(b)
    }

    /// Signed `a > b`
    pub fn cmpg(&self, a: u64, b: u64) -> bool {
        self.signed(a) > self.signed(b)
    }

    /// Signed `a >= b`
    pub fn cmpge(&self, a: u64, b: u64) -> bool {
        self.signed(a) >= self.signed(b)
    }
}

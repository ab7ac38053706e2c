// lzw.rs
//
// Copyright (c) 2020-2026  Douglas Lau
//
//! Lempel-Ziv-Welch compression for GIF

/// Maximum code bits allowed for GIF
const MAX_BITS: u8 = 12;

/// Number of codes available at the maximum code size
const MAX_CODES: u16 = 1 << MAX_BITS;

/// Hash table size (about 80% occupancy with 4096 codes)
const HASH_SZ: usize = 5003;

/// Shift for hashing the next byte into a table slot
const HASH_SHIFT: u32 = hash_shift(HASH_SZ);

/// Largest sub-block payload staged before flushing
const STAGING_SZ: usize = 254;

/// Bit masks for retaining the valid bits of the accumulator
const MASKS: [u32; 17] = [
    0x0000, 0x0001, 0x0003, 0x0007, 0x000F, 0x001F, 0x003F, 0x007F, 0x00FF,
    0x01FF, 0x03FF, 0x07FF, 0x0FFF, 0x1FFF, 0x3FFF, 0x7FFF, 0xFFFF,
];

/// Code type
type Code = u16;

/// Calculate hash shift so that `byte << shift` stays within table range
const fn hash_shift(table_sz: usize) -> u32 {
    let mut shift = 0;
    let mut fcode = table_sz;
    while fcode < 65536 {
        fcode *= 2;
        shift += 1;
    }
    8 - shift
}

/// Largest code representable with a number of bits
fn max_code(n_bits: u8) -> Code {
    (1 << n_bits) - 1
}

/// Bit packer for LZW codes, framed as GIF sub-blocks
///
/// Codes are packed least-significant bit first.  Full bytes are staged, and
/// each full staging buffer is written out as a length-prefixed sub-block.
pub struct BitWriter<'a> {
    /// Output buffer for sub-blocks
    out: &'a mut Vec<u8>,
    /// Staged sub-block payload
    staging: Vec<u8>,
    /// Bit accumulator
    accum: u32,
    /// Number of valid bits in accumulator
    n_bits: u8,
}

impl<'a> BitWriter<'a> {
    /// Create a new bit writer
    pub fn new(out: &'a mut Vec<u8>) -> Self {
        BitWriter {
            out,
            staging: Vec::with_capacity(STAGING_SZ),
            accum: 0,
            n_bits: 0,
        }
    }

    /// Pack one code with a given width
    pub fn pack(&mut self, code: Code, width: u8) {
        self.accum &= MASKS[usize::from(self.n_bits)];
        self.accum |= u32::from(code) << self.n_bits;
        self.n_bits += width;
        while self.n_bits >= 8 {
            self.push_byte(self.accum as u8);
            self.accum >>= 8;
            self.n_bits -= 8;
        }
    }

    /// Stage one byte, flushing a full sub-block
    fn push_byte(&mut self, byte: u8) {
        self.staging.push(byte);
        if self.staging.len() >= STAGING_SZ {
            self.flush_block();
        }
    }

    /// Write staged bytes as a sub-block
    fn flush_block(&mut self) {
        if !self.staging.is_empty() {
            trace!("sub-block: {} bytes", self.staging.len());
            self.out.push(self.staging.len() as u8);
            self.out.extend_from_slice(&self.staging);
            self.staging.clear();
        }
    }

    /// Flush any partial byte and the final short sub-block
    pub fn finish(mut self) {
        while self.n_bits > 0 {
            self.push_byte(self.accum as u8);
            self.accum >>= 8;
            self.n_bits = self.n_bits.saturating_sub(8);
        }
        self.flush_block();
    }
}

/// Code dictionary, hashing (prefix code, byte) pairs to codes
struct Dictionary {
    /// Hashed keys, `None` for empty slots
    keys: Vec<Option<u32>>,
    /// Codes for each slot
    codes: Vec<Code>,
}

/// Result of a dictionary search
enum Search {
    /// Pair exists with a code
    Found(Code),
    /// Pair missing; slot where it can be inserted
    Vacant(usize),
}

impl Dictionary {
    /// Create a new empty dictionary
    fn new() -> Self {
        Dictionary {
            keys: vec![None; HASH_SZ],
            codes: vec![0; HASH_SZ],
        }
    }

    /// Clear all entries
    fn clear(&mut self) {
        self.keys.iter_mut().for_each(|k| *k = None);
    }

    /// Search for a (prefix, byte) pair
    fn search(&self, prefix: Code, byte: u8) -> Search {
        let key = (u32::from(byte) << MAX_BITS) + u32::from(prefix);
        let mut slot = (usize::from(byte) << HASH_SHIFT) ^ usize::from(prefix);
        match self.keys[slot] {
            Some(k) if k == key => return Search::Found(self.codes[slot]),
            None => return Search::Vacant(slot),
            Some(_) => (),
        }
        // secondary hash (after G. Knott)
        let disp = if slot == 0 { 1 } else { HASH_SZ - slot };
        loop {
            slot = if slot >= disp {
                slot - disp
            } else {
                slot + HASH_SZ - disp
            };
            match self.keys[slot] {
                Some(k) if k == key => return Search::Found(self.codes[slot]),
                None => return Search::Vacant(slot),
                Some(_) => (),
            }
        }
    }

    /// Insert a code into a vacant slot
    fn insert(&mut self, slot: usize, prefix: Code, byte: u8, code: Code) {
        let key = (u32::from(byte) << MAX_BITS) + u32::from(prefix);
        self.keys[slot] = Some(key);
        self.codes[slot] = code;
    }
}

/// LZW Data Compressor
pub struct Compressor {
    /// Code dictionary
    dict: Dictionary,
    /// Initial code bits (after a clear code)
    init_bits: u8,
    /// Current code bits
    n_bits: u8,
    /// Largest code for current bits
    max_code: Code,
    /// Next free dictionary code
    free_code: Code,
    /// Clear flag (reset code bits after next code)
    clear_flag: bool,
}

impl Compressor {
    /// Create a new compressor
    ///
    /// * `min_code_bits` Minimum code size; raised to 2 if lower.
    pub fn new(min_code_bits: u8) -> Self {
        let init_bits = min_code_bits.clamp(2, MAX_BITS - 1) + 1;
        let mut com = Compressor {
            dict: Dictionary::new(),
            init_bits,
            n_bits: init_bits,
            max_code: max_code(init_bits),
            free_code: 0,
            clear_flag: false,
        };
        com.free_code = com.clear_code() + 2;
        com
    }

    /// Get the minimum code size (written before the sub-blocks)
    pub fn min_code_bits(&self) -> u8 {
        self.init_bits - 1
    }

    /// Get the clear code
    fn clear_code(&self) -> Code {
        1 << (self.init_bits - 1)
    }

    /// Get the end of information code
    fn end_code(&self) -> Code {
        self.clear_code() + 1
    }

    /// Output one code, adjusting the code size as needed
    fn output(&mut self, code: Code, bw: &mut BitWriter) {
        bw.pack(code, self.n_bits);
        if self.clear_flag {
            self.n_bits = self.init_bits;
            self.max_code = max_code(self.n_bits);
            self.clear_flag = false;
        } else if self.free_code > self.max_code {
            self.n_bits += 1;
            self.max_code = if self.n_bits == MAX_BITS {
                MAX_CODES
            } else {
                max_code(self.n_bits)
            };
        }
    }

    /// Clear the dictionary, emitting a clear code
    fn clear_block(&mut self, bw: &mut BitWriter) {
        trace!("dictionary reset at {} codes", self.free_code);
        self.dict.clear();
        self.free_code = self.clear_code() + 2;
        self.clear_flag = true;
        self.output(self.clear_code(), bw);
    }

    /// Compress a buffer of indices into sub-blocks
    ///
    /// The sub-blocks are appended to `buffer`; the terminating zero-length
    /// sub-block is not included.
    pub fn compress(&mut self, indices: &[u8], buffer: &mut Vec<u8>) {
        let mut bw = BitWriter::new(buffer);
        self.output(self.clear_code(), &mut bw);
        let mut iter = indices.iter();
        if let Some(first) = iter.next() {
            let mut ent = Code::from(*first);
            for byte in iter {
                match self.dict.search(ent, *byte) {
                    Search::Found(code) => ent = code,
                    Search::Vacant(slot) => {
                        self.output(ent, &mut bw);
                        if self.free_code < MAX_CODES {
                            self.dict.insert(slot, ent, *byte, self.free_code);
                            self.free_code += 1;
                        } else {
                            self.clear_block(&mut bw);
                        }
                        ent = Code::from(*byte);
                    }
                }
            }
            self.output(ent, &mut bw);
        }
        self.output(self.end_code(), &mut bw);
        bw.finish();
    }
}

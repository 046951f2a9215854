//! # Cells
//!
//! Minimal content-cell model used for message bodies, contract code and data.
//!
//! A cell holds up to [`MAX_BITS`] bits of byte-aligned data and up to
//! [`MAX_REFS`] references to child cells. Cells are immutable once built;
//! [`CellBuilder`] produces them and [`CellSlice`] reads them back.

use crate::domain::value_objects::{Address, Coins, Hash};
use crate::errors::CellError;
use sha2::{Digest, Sha256};

/// Maximum number of data bits in one cell.
pub const MAX_BITS: usize = 1023;

/// Maximum number of child references in one cell.
pub const MAX_REFS: usize = 4;

/// Maximum nesting depth of a cell tree.
pub const MAX_DEPTH: u16 = 1024;

// =============================================================================
// CELL
// =============================================================================

/// An immutable content cell.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Cell {
    data: Vec<u8>,
    bit_len: usize,
    refs: Vec<Cell>,
}

impl Cell {
    /// The empty cell (no bits, no refs).
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Assembles a cell from raw parts without validation.
    ///
    /// Use [`Cell::validate`] before trusting a cell built this way.
    #[must_use]
    pub fn from_raw(data: Vec<u8>, bit_len: usize, refs: Vec<Cell>) -> Self {
        Self { data, bit_len, refs }
    }

    /// Data bytes.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Number of data bits.
    #[must_use]
    pub fn bit_len(&self) -> usize {
        self.bit_len
    }

    /// Child references.
    #[must_use]
    pub fn refs(&self) -> &[Cell] {
        &self.refs
    }

    /// Returns true if the cell has neither data nor refs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bit_len == 0 && self.refs.is_empty()
    }

    /// Depth of the cell tree (0 for a leaf).
    #[must_use]
    pub fn depth(&self) -> u16 {
        self.refs
            .iter()
            .map(|r| r.depth().saturating_add(1))
            .max()
            .unwrap_or(0)
    }

    /// Checks the cell and all of its descendants are well-formed content cells.
    pub fn validate(&self) -> Result<(), CellError> {
        self.validate_at(0)
    }

    fn validate_at(&self, depth: u16) -> Result<(), CellError> {
        if depth > MAX_DEPTH {
            return Err(CellError::DepthExceeded { max: MAX_DEPTH });
        }
        if self.bit_len > MAX_BITS {
            return Err(CellError::TooManyBits {
                bits: self.bit_len,
                max: MAX_BITS,
            });
        }
        if self.refs.len() > MAX_REFS {
            return Err(CellError::TooManyRefs {
                refs: self.refs.len(),
                max: MAX_REFS,
            });
        }
        if self.data.len() != self.bit_len.div_ceil(8) {
            return Err(CellError::BitLengthMismatch {
                bits: self.bit_len,
                bytes: self.data.len(),
            });
        }
        for r in &self.refs {
            r.validate_at(depth + 1)?;
        }
        Ok(())
    }

    /// Representation hash of the cell tree.
    #[must_use]
    pub fn hash(&self) -> Hash {
        let mut hasher = Sha256::new();
        // length prefixes are full width so unvalidated cells never collide
        hasher.update(u64::try_from(self.refs.len()).unwrap_or(u64::MAX).to_be_bytes());
        hasher.update(u64::try_from(self.bit_len).unwrap_or(u64::MAX).to_be_bytes());
        hasher.update(&self.data);
        for r in &self.refs {
            hasher.update(r.depth().to_be_bytes());
        }
        for r in &self.refs {
            hasher.update(r.hash().as_bytes());
        }
        Hash::new(hasher.finalize().into())
    }

    /// Starts reading the cell.
    #[must_use]
    pub fn parse(&self) -> CellSlice<'_> {
        CellSlice {
            cell: self,
            byte_pos: 0,
            ref_pos: 0,
        }
    }
}

impl std::fmt::Debug for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "x{{{}}}", hex::encode(&self.data))?;
        if !self.refs.is_empty() {
            f.debug_list().entries(&self.refs).finish()?;
        }
        Ok(())
    }
}

// =============================================================================
// BUILDER
// =============================================================================

/// Incremental cell constructor.
#[derive(Debug, Default)]
pub struct CellBuilder {
    data: Vec<u8>,
    refs: Vec<Cell>,
}

impl CellBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_room(&self, bytes: usize) -> Result<(), CellError> {
        let bits = (self.data.len() + bytes) * 8;
        if bits > MAX_BITS {
            return Err(CellError::TooManyBits {
                bits,
                max: MAX_BITS,
            });
        }
        Ok(())
    }

    /// Appends raw bytes.
    pub fn store_bytes(mut self, bytes: &[u8]) -> Result<Self, CellError> {
        self.ensure_room(bytes.len())?;
        self.data.extend_from_slice(bytes);
        Ok(self)
    }

    /// Appends an unsigned byte.
    pub fn store_u8(self, value: u8) -> Result<Self, CellError> {
        self.store_bytes(&[value])
    }

    /// Appends a boolean as one byte.
    pub fn store_bool(self, value: bool) -> Result<Self, CellError> {
        self.store_u8(u8::from(value))
    }

    /// Appends a big-endian `u32`.
    pub fn store_u32(self, value: u32) -> Result<Self, CellError> {
        self.store_bytes(&value.to_be_bytes())
    }

    /// Appends a big-endian `u64`.
    pub fn store_u64(self, value: u64) -> Result<Self, CellError> {
        self.store_bytes(&value.to_be_bytes())
    }

    /// Appends a coin amount as 32 big-endian bytes.
    pub fn store_coins(self, value: Coins) -> Result<Self, CellError> {
        let mut bytes = [0u8; 32];
        value.to_big_endian(&mut bytes);
        self.store_bytes(&bytes)
    }

    /// Appends an address as a workchain byte followed by the account id.
    pub fn store_address(self, address: &Address) -> Result<Self, CellError> {
        let workchain =
            i8::try_from(address.workchain).map_err(|_| CellError::InvalidAddress)?;
        self.store_bytes(&workchain.to_be_bytes())?
            .store_bytes(address.hash.as_bytes())
    }

    /// Appends a child reference.
    pub fn store_ref(mut self, cell: Cell) -> Result<Self, CellError> {
        if self.refs.len() >= MAX_REFS {
            return Err(CellError::TooManyRefs {
                refs: self.refs.len() + 1,
                max: MAX_REFS,
            });
        }
        self.refs.push(cell);
        Ok(self)
    }

    /// Appends a presence flag and, if present, a child reference.
    pub fn store_maybe_ref(self, cell: Option<Cell>) -> Result<Self, CellError> {
        match cell {
            Some(cell) => self.store_bool(true)?.store_ref(cell),
            None => self.store_bool(false),
        }
    }

    /// Finishes the cell.
    #[must_use]
    pub fn build(self) -> Cell {
        let bit_len = self.data.len() * 8;
        Cell {
            data: self.data,
            bit_len,
            refs: self.refs,
        }
    }
}

// =============================================================================
// SLICE
// =============================================================================

/// Sequential reader over a cell's data and refs.
#[derive(Debug, Clone)]
pub struct CellSlice<'a> {
    cell: &'a Cell,
    byte_pos: usize,
    ref_pos: usize,
}

impl<'a> CellSlice<'a> {
    /// Remaining unread data bits.
    #[must_use]
    pub fn remaining_bits(&self) -> usize {
        self.cell.bit_len.saturating_sub(self.byte_pos * 8)
    }

    /// Remaining unread refs.
    #[must_use]
    pub fn remaining_refs(&self) -> usize {
        self.cell.refs.len() - self.ref_pos
    }

    /// Reads `n` raw bytes.
    pub fn load_bytes(&mut self, n: usize) -> Result<&'a [u8], CellError> {
        let end = self.byte_pos + n;
        if end > self.cell.data.len() {
            return Err(CellError::Underflow {
                wanted: n * 8,
                left: self.remaining_bits(),
            });
        }
        let out = &self.cell.data[self.byte_pos..end];
        self.byte_pos = end;
        Ok(out)
    }

    fn load_array<const N: usize>(&mut self) -> Result<[u8; N], CellError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.load_bytes(N)?);
        Ok(out)
    }

    /// Reads an unsigned byte.
    pub fn load_u8(&mut self) -> Result<u8, CellError> {
        Ok(self.load_array::<1>()?[0])
    }

    /// Reads a one-byte boolean.
    pub fn load_bool(&mut self) -> Result<bool, CellError> {
        Ok(self.load_u8()? != 0)
    }

    /// Reads a big-endian `u32`.
    pub fn load_u32(&mut self) -> Result<u32, CellError> {
        Ok(u32::from_be_bytes(self.load_array()?))
    }

    /// Reads a big-endian `u64`.
    pub fn load_u64(&mut self) -> Result<u64, CellError> {
        Ok(u64::from_be_bytes(self.load_array()?))
    }

    /// Reads a 32-byte coin amount.
    pub fn load_coins(&mut self) -> Result<Coins, CellError> {
        Ok(Coins::from_big_endian(&self.load_array::<32>()?))
    }

    /// Reads an address written by [`CellBuilder::store_address`].
    pub fn load_address(&mut self) -> Result<Address, CellError> {
        let workchain = i8::from_be_bytes(self.load_array()?);
        let hash = Hash::new(self.load_array()?);
        Ok(Address::new(i32::from(workchain), hash))
    }

    /// Reads the next child reference.
    pub fn load_ref(&mut self) -> Result<&'a Cell, CellError> {
        let cell = self
            .cell
            .refs
            .get(self.ref_pos)
            .ok_or(CellError::RefUnderflow)?;
        self.ref_pos += 1;
        Ok(cell)
    }

    /// Reads a presence flag and, if set, the next child reference.
    pub fn load_maybe_ref(&mut self) -> Result<Option<&'a Cell>, CellError> {
        if self.load_bool()? {
            self.load_ref().map(Some)
        } else {
            Ok(None)
        }
    }
}

// =============================================================================
// STATE INIT
// =============================================================================

/// Code and initial data of a contract, used to deploy it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StateInit {
    /// Contract code.
    pub code: Cell,
    /// Initial persistent data.
    pub data: Cell,
}

impl StateInit {
    /// Creates a state init.
    #[must_use]
    pub fn new(code: Cell, data: Cell) -> Self {
        Self { code, data }
    }

    /// Packs the pair into a single cell.
    #[must_use]
    pub fn to_cell(&self) -> Cell {
        Cell::from_raw(Vec::new(), 0, vec![self.code.clone(), self.data.clone()])
    }

    /// Hash that determines the address the contract deploys to.
    #[must_use]
    pub fn hash(&self) -> Hash {
        self.to_cell().hash()
    }

    /// Address of the contract in the given workchain.
    #[must_use]
    pub fn address(&self, workchain: i32) -> Address {
        Address::new(workchain, self.hash())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_and_slice() {
        let child = CellBuilder::new().store_u8(7).unwrap().build();
        let addr = Address::new(-1, Hash::new([3u8; 32]));
        let cell = CellBuilder::new()
            .store_u32(0xDEAD_BEEF)
            .unwrap()
            .store_address(&addr)
            .unwrap()
            .store_coins(Coins::from(42u64))
            .unwrap()
            .store_maybe_ref(Some(child.clone()))
            .unwrap()
            .build();

        assert!(cell.validate().is_ok());
        let mut s = cell.parse();
        assert_eq!(s.load_u32().unwrap(), 0xDEAD_BEEF);
        assert_eq!(s.load_address().unwrap(), addr);
        assert_eq!(s.load_coins().unwrap(), Coins::from(42u64));
        assert_eq!(s.load_maybe_ref().unwrap(), Some(&child));
        assert_eq!(s.remaining_bits(), 0);
        assert!(matches!(s.load_u8(), Err(CellError::Underflow { .. })));
    }

    #[test]
    fn test_builder_overflow() {
        let res = CellBuilder::new().store_bytes(&[0u8; 128]);
        assert!(matches!(res, Err(CellError::TooManyBits { .. })));

        let mut b = CellBuilder::new();
        for _ in 0..MAX_REFS {
            b = b.store_ref(Cell::empty()).unwrap();
        }
        assert!(matches!(
            b.store_ref(Cell::empty()),
            Err(CellError::TooManyRefs { .. })
        ));
    }

    #[test]
    fn test_validate_malformed() {
        let bad = Cell::from_raw(vec![1, 2, 3], 8, vec![]);
        assert!(matches!(
            bad.validate(),
            Err(CellError::BitLengthMismatch { .. })
        ));

        let nested = Cell::from_raw(Vec::new(), 0, vec![Cell::from_raw(vec![], 2000, vec![])]);
        assert!(matches!(
            nested.validate(),
            Err(CellError::TooManyBits { .. })
        ));
    }

    #[test]
    fn test_hash_depends_on_content() {
        let a = CellBuilder::new().store_u8(1).unwrap().build();
        let b = CellBuilder::new().store_u8(2).unwrap().build();
        assert_ne!(a.hash(), b.hash());
        assert_eq!(a.hash(), a.clone().hash());
    }

    #[test]
    fn test_hash_keeps_full_bit_length() {
        let short = Cell::from_raw(vec![0xAB], 8, vec![]);
        let wrapped = Cell::from_raw(vec![0xAB], 8 + (1 << 16), vec![]);
        assert!(wrapped.validate().is_err());
        assert_ne!(short.hash(), wrapped.hash());
    }

    #[test]
    fn test_state_init_address() {
        let init = StateInit::new(
            CellBuilder::new().store_u8(1).unwrap().build(),
            Cell::empty(),
        );
        let addr = init.address(0);
        assert_eq!(addr.hash, init.hash());
        assert_eq!(addr.workchain, 0);
    }
}

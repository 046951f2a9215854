//! # Treasury Wallet
//!
//! Well-funded wallet used as the source of value in tests.
//!
//! The wallet keeps `seqno: u32` and a 32-byte key in its data. An inbound
//! external message carries the expected seqno followed by up to four order
//! refs, each describing one internal message to emit:
//!
//! ```text
//! order = address dest | coins value | bool bounce | u8 mode
//!       | maybe ^body | maybe ^state_init
//! ```
//!
//! Internal messages are accepted silently (top-ups).

use crate::adapters::executor::{
    exit_codes, Accepted, NativeContract, OutAction, ReceiveContext, Rejection,
};
use crate::domain::cell::{Cell, CellBuilder, CellSlice, StateInit, MAX_REFS};
use crate::domain::entities::{Message, MessageInfo, StackValue};
use crate::domain::value_objects::{Address, Coins, Hash};
use crate::errors::{CellError, SandboxError};
use crate::ports::inbound::{
    Contract, ContractProvider, MutationMethod, QueryMethod, QueryProvider, Sender,
    SenderArguments,
};
use crate::service::OpenedContract;
use async_trait::async_trait;

/// Marker stored as the treasury's code.
const TREASURY_CODE_TAG: &[u8] = b"qc-sandbox/treasury/v1";

/// Exit code for an external message carrying a stale seqno.
pub const SEQNO_MISMATCH: i32 = 33;

/// Code cell of the treasury wallet.
#[must_use]
pub fn treasury_code() -> Cell {
    Cell::from_raw(TREASURY_CODE_TAG.to_vec(), TREASURY_CODE_TAG.len() * 8, Vec::new())
}

fn treasury_data(seqno: u32, key: &Hash) -> Result<Cell, CellError> {
    Ok(CellBuilder::new()
        .store_u32(seqno)?
        .store_bytes(key.as_bytes())?
        .build())
}

// =============================================================================
// CONTRACT DESCRIPTOR
// =============================================================================

/// Descriptor of a treasury wallet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreasuryContract {
    address: Address,
    init: StateInit,
    key: Hash,
}

impl TreasuryContract {
    /// Wallet for `key` in `workchain`, starting at seqno 0.
    pub fn new(workchain: i32, key: Hash) -> Result<Self, CellError> {
        let init = StateInit::new(treasury_code(), treasury_data(0, &key)?);
        Ok(Self {
            address: init.address(workchain),
            init,
            key,
        })
    }

    /// Key the wallet was derived from.
    #[must_use]
    pub fn key(&self) -> Hash {
        self.key
    }
}

impl Contract for TreasuryContract {
    fn address(&self) -> Address {
        self.address
    }

    fn init(&self) -> Option<&StateInit> {
        Some(&self.init)
    }
}

// =============================================================================
// METHODS
// =============================================================================

/// Reads the wallet seqno.
#[derive(Clone, Copy, Debug, Default)]
pub struct Seqno;

#[async_trait]
impl QueryMethod<TreasuryContract> for Seqno {
    type Output = u32;

    async fn query(
        self,
        _contract: &TreasuryContract,
        provider: &dyn QueryProvider,
    ) -> Result<u32, SandboxError> {
        read_seqno(provider).await
    }
}

async fn read_seqno<P: QueryProvider + ?Sized>(provider: &P) -> Result<u32, SandboxError> {
    let result = provider.get("seqno", Vec::new()).await?;
    match result.stack.first() {
        Some(StackValue::Int(value)) => u32::try_from(*value)
            .map_err(|_| SandboxError::UnexpectedResult(format!("seqno out of range: {value}"))),
        other => Err(SandboxError::UnexpectedResult(format!(
            "seqno: expected int, got {other:?}"
        ))),
    }
}

/// Sends up to four messages from the wallet in one external message.
///
/// Returns the seqno the transfer was signed with.
#[derive(Clone, Debug)]
pub struct Transfer {
    /// Messages to emit, in order.
    pub messages: Vec<SenderArguments>,
    /// Send mode applied to every message.
    pub mode: u8,
}

impl Transfer {
    /// Transfer of a single message with the ordinary send mode.
    #[must_use]
    pub fn single(args: SenderArguments) -> Self {
        Self {
            messages: vec![args],
            mode: 0,
        }
    }

    /// Builder-style method to set the send mode
    #[must_use]
    pub fn with_mode(mut self, mode: u8) -> Self {
        self.mode = mode;
        self
    }

    fn body(&self, seqno: u32) -> Result<Cell, CellError> {
        if self.messages.len() > MAX_REFS {
            return Err(CellError::TooManyRefs {
                refs: self.messages.len(),
                max: MAX_REFS,
            });
        }
        let mut builder = CellBuilder::new().store_u32(seqno)?;
        for args in &self.messages {
            builder = builder.store_ref(encode_order(args, self.mode)?)?;
        }
        Ok(builder.build())
    }
}

#[async_trait]
impl MutationMethod<TreasuryContract> for Transfer {
    type Output = u32;

    async fn mutate(
        self,
        _contract: &TreasuryContract,
        provider: &dyn ContractProvider,
    ) -> Result<u32, SandboxError> {
        let seqno = if provider.get_state().await?.is_active() {
            read_seqno(provider).await?
        } else {
            0
        };
        provider.external(self.body(seqno)?).await?;
        Ok(seqno)
    }
}

fn encode_order(args: &SenderArguments, mode: u8) -> Result<Cell, CellError> {
    let body = (!args.body.is_empty()).then(|| args.body.clone());
    Ok(CellBuilder::new()
        .store_address(&args.to)?
        .store_coins(args.value)?
        .store_bool(args.bounce)?
        .store_u8(mode)?
        .store_maybe_ref(body)?
        .store_maybe_ref(args.init.as_ref().map(StateInit::to_cell))?
        .build())
}

fn decode_order(slice: &mut CellSlice<'_>, from: Address) -> Result<OutAction, CellError> {
    let to = slice.load_address()?;
    let value = slice.load_coins()?;
    let bounce = slice.load_bool()?;
    let mode = slice.load_u8()?;
    let body = slice.load_maybe_ref()?.cloned().unwrap_or_default();
    let init = match slice.load_maybe_ref()? {
        Some(cell) => {
            let mut init = cell.parse();
            Some(StateInit::new(init.load_ref()?.clone(), init.load_ref()?.clone()))
        }
        None => None,
    };
    Ok(OutAction::SendMessage {
        message: Message::internal(from, to, value, bounce, body).with_init(init),
        mode,
    })
}

// =============================================================================
// LOGIC
// =============================================================================

/// Native logic of the treasury wallet.
#[derive(Debug, Default, Clone, Copy)]
pub struct TreasuryLogic;

impl TreasuryLogic {
    fn load_data(data: &Cell) -> Result<(u32, Hash), CellError> {
        let mut slice = data.parse();
        let seqno = slice.load_u32()?;
        let mut key = [0u8; 32];
        key.copy_from_slice(slice.load_bytes(32)?);
        Ok((seqno, Hash::new(key)))
    }
}

fn underflow(_: CellError) -> Rejection {
    Rejection::Exit(exit_codes::CELL_UNDERFLOW)
}

impl NativeContract for TreasuryLogic {
    fn receive(&self, ctx: &ReceiveContext<'_>, data: &Cell) -> Result<Accepted, Rejection> {
        if !matches!(ctx.message.info, MessageInfo::ExternalIn { .. }) {
            return Ok(Accepted {
                data: data.clone(),
                actions: Vec::new(),
            });
        }

        let (seqno, key) = Self::load_data(data).map_err(underflow)?;
        let mut body = ctx.message.body.parse();
        if body.load_u32().map_err(underflow)? != seqno {
            return Err(Rejection::Exit(SEQNO_MISMATCH));
        }

        let mut actions = Vec::with_capacity(body.remaining_refs());
        while body.remaining_refs() > 0 {
            let order = body.load_ref().map_err(underflow)?;
            actions.push(decode_order(&mut order.parse(), ctx.address).map_err(underflow)?);
        }

        let data = treasury_data(seqno.wrapping_add(1), &key)
            .map_err(|e| Rejection::Fatal(e.to_string()))?;
        Ok(Accepted { data, actions })
    }

    fn get_method(
        &self,
        method: &str,
        _args: &[StackValue],
        data: &Cell,
        _balance: Coins,
    ) -> Result<Vec<StackValue>, i32> {
        let (seqno, key) =
            Self::load_data(data).map_err(|_| exit_codes::CELL_UNDERFLOW)?;
        match method {
            "seqno" => Ok(vec![StackValue::Int(Coins::from(seqno))]),
            "get_public_key" => Ok(vec![StackValue::Int(Coins::from_big_endian(
                key.as_bytes(),
            ))]),
            _ => Err(exit_codes::METHOD_NOT_FOUND),
        }
    }
}

// =============================================================================
// SENDER
// =============================================================================

/// Sender that routes messages through a treasury wallet.
///
/// Each `send` enqueues one external message to the wallet; the wallet emits
/// the internal message when the queue is drained.
#[derive(Clone, Debug)]
pub struct TreasurySender {
    treasury: OpenedContract<TreasuryContract>,
}

impl TreasurySender {
    /// Wraps an opened treasury.
    #[must_use]
    pub fn new(treasury: OpenedContract<TreasuryContract>) -> Self {
        Self { treasury }
    }
}

#[async_trait]
impl Sender for TreasurySender {
    fn address(&self) -> Option<Address> {
        Some(self.treasury.address())
    }

    async fn send(&self, args: SenderArguments) -> Result<(), SandboxError> {
        let provider = self.treasury.provider();
        Transfer::single(args)
            .mutate(self.treasury.contract(), &provider)
            .await
            .map(|_| ())
    }
}

impl OpenedContract<TreasuryContract> {
    /// Sender routing through this treasury.
    #[must_use]
    pub fn sender(&self) -> TreasurySender {
        TreasurySender::new(self.clone())
    }
}

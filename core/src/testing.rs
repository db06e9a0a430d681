//! Contract fixtures for tests
//!
//! A small note-holding contract assembled by hand: it creates notes,
//! reads them back, nullifies them, calls itself and enqueues a public
//! call. Balances live in [`BALANCE_SLOT`]; a note preimage is
//! `[amount, owner_x, owner_y]`.

use crate::abi::{AbiParameter, AbiType, FunctionAbi, FunctionData, FunctionType};
use crate::bytecode::{ContextItem, Instruction, Program, Reg, RegRange};
use crate::field::Fr;
use crate::hashing::{Backend, GeneratorIndex, KeccakBackend};
use crate::input::{TxContext, TxExecutionRequest};
use crate::oracle::NoteData;
use crate::simulator::{Simulator, COMPUTE_NOTE_HASH_AND_NULLIFIER_SIGNATURE};
use crate::state::{ContractState, InMemoryDataOracle};
use crate::types::{AztecAddress, EthAddress, PublicKey};
use std::sync::Arc;

pub const BALANCE_SLOT: u64 = 1;
pub const NOTE_LEN: u32 = 3;

fn r(i: u32) -> Reg {
    Reg(i)
}

fn range(start: u32, len: u32) -> RegRange {
    RegRange::new(start, len)
}

fn fields(names: &[&str]) -> Vec<AbiParameter> {
    names.iter().map(|n| AbiParameter::field(*n)).collect()
}

fn private(name: &str, params: &[&str], code: Vec<Instruction>) -> FunctionAbi {
    FunctionAbi::new(name, FunctionType::Secret, fields(params), Program::new(code))
}

fn unconstrained(name: &str, params: Vec<AbiParameter>, code: Vec<Instruction>) -> FunctionAbi {
    FunctionAbi::new(name, FunctionType::Unconstrained, params, Program::new(code))
}

/// `insert_note(amount, owner_x, owner_y)`
pub fn insert_note() -> FunctionAbi {
    private(
        "insert_note",
        &["amount", "owner_x", "owner_y"],
        vec![
            Instruction::Const { dst: r(3), value: Fr::from(BALANCE_SLOT) },
            Instruction::CreateNote { slot: r(3), preimage: range(0, 3) },
            Instruction::EmitEncryptedLog { payload: range(0, 3) },
        ],
    )
}

/// `get_then_nullify(owner_x, owner_y) -> amount`: spends the first
/// visible note and fails if there is none
pub fn get_then_nullify() -> FunctionAbi {
    private(
        "get_then_nullify",
        &["owner_x", "owner_y"],
        vec![
            Instruction::Const { dst: r(2), value: Fr::from(BALANCE_SLOT) },
            Instruction::GetNotes { dst: r(10), slot: r(2), limit: 1, note_len: NOTE_LEN },
            Instruction::Const { dst: r(4), value: Fr::ONE },
            Instruction::AssertEq { lhs: r(10), rhs: r(4) },
            Instruction::GetSecretKey { dst: r(3), owner_x: r(0), owner_y: r(1) },
            Instruction::NullifyNote { slot: r(2), nonce: r(11), preimage: range(12, 3), secret: r(3) },
            Instruction::Return { values: range(12, 1) },
        ],
    )
}

/// Creates one note and nullifies the first note it can see
pub fn insert_and_nullify() -> FunctionAbi {
    private(
        "insert_and_nullify",
        &["amount", "owner_x", "owner_y"],
        vec![
            Instruction::Const { dst: r(3), value: Fr::from(BALANCE_SLOT) },
            Instruction::CreateNote { slot: r(3), preimage: range(0, 3) },
            Instruction::GetNotes { dst: r(10), slot: r(3), limit: 1, note_len: NOTE_LEN },
            Instruction::GetSecretKey { dst: r(4), owner_x: r(1), owner_y: r(2) },
            Instruction::NullifyNote { slot: r(3), nonce: r(11), preimage: range(12, 3), secret: r(4) },
        ],
    )
}

/// Creates notes `amount` and `amount + 1`, then nullifies the first
/// `nullify` visible notes
pub fn insert_two_and_nullify(name: &str, nullify: usize) -> FunctionAbi {
    let mut code = vec![
        Instruction::Const { dst: r(3), value: Fr::from(BALANCE_SLOT) },
        Instruction::CreateNote { slot: r(3), preimage: range(0, 3) },
        Instruction::Const { dst: r(5), value: Fr::ONE },
        Instruction::Add { dst: r(6), lhs: r(0), rhs: r(5) },
        Instruction::Mov { dst: r(7), src: r(1) },
        Instruction::Mov { dst: r(8), src: r(2) },
        Instruction::CreateNote { slot: r(3), preimage: range(6, 3) },
    ];
    code.extend(nullify_visible(nullify));
    private(name, &["amount", "owner_x", "owner_y"], code)
}

/// Creates one note, then nullifies the first two visible notes
pub fn insert_and_nullify_two() -> FunctionAbi {
    let mut code = vec![
        Instruction::Const { dst: r(3), value: Fr::from(BALANCE_SLOT) },
        Instruction::CreateNote { slot: r(3), preimage: range(0, 3) },
    ];
    code.extend(nullify_visible(2));
    private("insert_and_nullify_two", &["amount", "owner_x", "owner_y"], code)
}

/// Read two notes at the balance slot (slot in r3, owner in r1/r2) and
/// nullify the first `count`
fn nullify_visible(count: usize) -> Vec<Instruction> {
    let mut code = vec![
        Instruction::GetNotes { dst: r(10), slot: r(3), limit: 2, note_len: NOTE_LEN },
        Instruction::GetSecretKey { dst: r(4), owner_x: r(1), owner_y: r(2) },
    ];
    for i in 0..count as u32 {
        let base = 11 + i * (NOTE_LEN + 1);
        code.push(Instruction::NullifyNote {
            slot: r(3),
            nonce: r(base),
            preimage: range(base + 1, NOTE_LEN),
            secret: r(4),
        });
    }
    code
}

/// `update_public(value)`, executed by the sequencer
pub fn update_public() -> FunctionAbi {
    FunctionAbi::new("update_public", FunctionType::Open, fields(&["value"]), Program::default())
}

/// Calls `insert_note` then `get_then_nullify` on itself, enqueues
/// `update_public(amount)` and logs the spent amount
pub fn nested_insert_then_nullify() -> FunctionAbi {
    private(
        "nested_insert_then_nullify",
        &["amount", "owner_x", "owner_y"],
        vec![
            Instruction::LoadContext { dst: r(4), item: ContextItem::ContractAddress },
            Instruction::PackArguments { dst: r(3), args: range(0, 3) },
            Instruction::CallPrivateFunction {
                target: r(4),
                selector: insert_note().selector(),
                args_hash: r(3),
                dst: r(20),
                return_len: 0,
            },
            Instruction::PackArguments { dst: r(5), args: range(1, 2) },
            Instruction::CallPrivateFunction {
                target: r(4),
                selector: get_then_nullify().selector(),
                args_hash: r(5),
                dst: r(21),
                return_len: 1,
            },
            Instruction::PackArguments { dst: r(6), args: range(21, 1) },
            Instruction::EnqueuePublicFunctionCall {
                target: r(4),
                selector: update_public().selector(),
                args_hash: r(6),
            },
            Instruction::EmitUnencryptedLog { payload: range(21, 1) },
            Instruction::Return { values: range(21, 1) },
        ],
    )
}

/// Calls itself until the call depth limit is hit
pub fn recurse_forever() -> FunctionAbi {
    private(
        "recurse_forever",
        &[],
        vec![
            Instruction::LoadContext { dst: r(0), item: ContextItem::ContractAddress },
            Instruction::Const { dst: r(1), value: Fr::ZERO },
            Instruction::CallPrivateFunction {
                target: r(0),
                selector: FunctionAbi::new("recurse_forever", FunctionType::Secret, vec![], Program::default())
                    .selector(),
                args_hash: r(1),
                dst: r(2),
                return_len: 0,
            },
        ],
    )
}

/// `compute_note_hash_and_nullifier(contract, nonce, slot, preimage[len])`
/// using the default derivation. With `owner_secret` the nullifier key is
/// looked up for the owner in preimage fields 1 and 2; otherwise it is
/// zero.
pub fn compute_note_hash_and_nullifier(preimage_len: u32, owner_secret: bool) -> FunctionAbi {
    let secret = if owner_secret {
        Instruction::GetSecretKey { dst: r(30), owner_x: r(4), owner_y: r(5) }
    } else {
        Instruction::Const { dst: r(30), value: Fr::ZERO }
    };
    let mut params = fields(&["contract_address", "nonce", "storage_slot"]);
    params.push(AbiParameter::new(
        "preimage",
        AbiType::Array { length: preimage_len as usize, ty: Box::new(AbiType::Field) },
    ));
    let abi = unconstrained(
        "compute_note_hash_and_nullifier",
        params,
        vec![
            Instruction::Hash { dst: r(11), index: GeneratorIndex::InnerNoteHash, inputs: range(2, 1 + preimage_len) },
            Instruction::Mov { dst: r(10), src: r(0) },
            Instruction::Hash { dst: r(21), index: GeneratorIndex::SiloedNoteHash, inputs: range(10, 2) },
            Instruction::Mov { dst: r(20), src: r(1) },
            Instruction::Hash { dst: r(31), index: GeneratorIndex::UniqueNoteHash, inputs: range(20, 2) },
            secret,
            Instruction::Hash { dst: r(41), index: GeneratorIndex::Nullifier, inputs: range(30, 2) },
            Instruction::Mov { dst: r(50), src: r(11) },
            Instruction::Mov { dst: r(51), src: r(21) },
            Instruction::Mov { dst: r(52), src: r(31) },
            Instruction::Mov { dst: r(53), src: r(41) },
            Instruction::Return { values: range(50, 4) },
        ],
    );
    debug_assert_eq!(abi.signature(), COMPUTE_NOTE_HASH_AND_NULLIFIER_SIGNATURE);
    abi
}

/// A `compute_note_hash_and_nullifier` that ignores its inputs and
/// returns `[portal, contract_address, msg_sender, 0]` from its call context
pub fn echo_call_context(preimage_len: u32) -> FunctionAbi {
    let mut params = fields(&["contract_address", "nonce", "storage_slot"]);
    params.push(AbiParameter::new(
        "preimage",
        AbiType::Array { length: preimage_len as usize, ty: Box::new(AbiType::Field) },
    ));
    unconstrained(
        "compute_note_hash_and_nullifier",
        params,
        vec![
            Instruction::LoadContext { dst: r(50), item: ContextItem::PortalContractAddress },
            Instruction::LoadContext { dst: r(51), item: ContextItem::ContractAddress },
            Instruction::LoadContext { dst: r(52), item: ContextItem::MsgSender },
            Instruction::Const { dst: r(53), value: Fr::ZERO },
            Instruction::Return { values: range(50, 4) },
        ],
    )
}

/// `balance_of(owner_x, owner_y)`: sum of the first two visible notes
pub fn balance_of() -> FunctionAbi {
    unconstrained(
        "balance_of",
        fields(&["owner_x", "owner_y"]),
        vec![
            Instruction::Const { dst: r(2), value: Fr::from(BALANCE_SLOT) },
            Instruction::GetNotes { dst: r(10), slot: r(2), limit: 2, note_len: NOTE_LEN },
            Instruction::Add { dst: r(3), lhs: r(12), rhs: r(16) },
            Instruction::Return { values: range(3, 1) },
        ],
    )
}

pub fn block_height() -> FunctionAbi {
    unconstrained(
        "block_height",
        vec![],
        vec![
            Instruction::GetBlockHeight { dst: r(0) },
            Instruction::Return { values: range(0, 1) },
        ],
    )
}

/// Unconstrained function that tries to create a note
pub fn write_in_view() -> FunctionAbi {
    unconstrained(
        "write_in_view",
        fields(&["amount"]),
        vec![
            Instruction::Const { dst: r(1), value: Fr::from(BALANCE_SLOT) },
            Instruction::CreateNote { slot: r(1), preimage: range(0, 1) },
        ],
    )
}

/// Creates a note, recomputes its unique siloed hash in bytecode and
/// proves it exists: returns `[commitment, index, path[2]]`
pub fn insert_then_prove() -> FunctionAbi {
    private(
        "insert_then_prove",
        &["amount", "owner_x", "owner_y"],
        vec![
            Instruction::Const { dst: r(3), value: Fr::from(BALANCE_SLOT) },
            Instruction::CreateNote { slot: r(3), preimage: range(0, 3) },
            Instruction::GetNotes { dst: r(10), slot: r(3), limit: 1, note_len: NOTE_LEN },
            // inner = H(slot, preimage)
            Instruction::Mov { dst: r(20), src: r(3) },
            Instruction::Mov { dst: r(21), src: r(12) },
            Instruction::Mov { dst: r(22), src: r(13) },
            Instruction::Mov { dst: r(23), src: r(14) },
            Instruction::Hash { dst: r(31), index: GeneratorIndex::InnerNoteHash, inputs: range(20, 4) },
            // siloed = H(contract, inner)
            Instruction::LoadContext { dst: r(30), item: ContextItem::ContractAddress },
            Instruction::Hash { dst: r(41), index: GeneratorIndex::SiloedNoteHash, inputs: range(30, 2) },
            // unique = H(nonce, siloed)
            Instruction::Mov { dst: r(40), src: r(11) },
            Instruction::Hash { dst: r(50), index: GeneratorIndex::UniqueNoteHash, inputs: range(40, 2) },
            Instruction::GetCommitmentWitness { dst: r(60), note_hash: r(50), path_len: 2 },
            Instruction::Return { values: range(60, 4) },
        ],
    )
}

/// `read_commitment(note_hash) -> [commitment, index, path[2]]`
pub fn read_commitment() -> FunctionAbi {
    private(
        "read_commitment",
        &["note_hash"],
        vec![
            Instruction::GetCommitmentWitness { dst: r(1), note_hash: r(0), path_len: 2 },
            Instruction::Return { values: range(1, 4) },
        ],
    )
}

/// `consume_message(msg_key) -> [index, message[2], path[2]]`; emits a
/// nullifier over the key and message so it cannot be consumed twice
pub fn consume_message() -> FunctionAbi {
    private(
        "consume_message",
        &["msg_key"],
        vec![
            Instruction::GetL1ToL2Message { dst: r(1), msg_key: r(0), message_len: 2, path_len: 2 },
            Instruction::Mov { dst: r(10), src: r(0) },
            Instruction::Mov { dst: r(11), src: r(2) },
            Instruction::Mov { dst: r(12), src: r(3) },
            Instruction::Hash { dst: r(20), index: GeneratorIndex::Nullifier, inputs: range(10, 3) },
            Instruction::EmitNullifier { nullifier: r(20) },
            Instruction::Return { values: range(1, 5) },
        ],
    )
}

/// Calls `consume_message(msg_key)` on itself
pub fn call_consume_message() -> FunctionAbi {
    private(
        "call_consume_message",
        &["msg_key"],
        vec![
            Instruction::LoadContext { dst: r(1), item: ContextItem::ContractAddress },
            Instruction::PackArguments { dst: r(2), args: range(0, 1) },
            Instruction::CallPrivateFunction {
                target: r(1),
                selector: consume_message().selector(),
                args_hash: r(2),
                dst: r(3),
                return_len: 5,
            },
            Instruction::Return { values: range(3, 5) },
        ],
    )
}

/// `public_storage_at(contract, slot)`, answered by the node
pub fn public_storage_at() -> FunctionAbi {
    unconstrained(
        "public_storage_at",
        fields(&["contract", "slot"]),
        vec![
            Instruction::GetPublicStorageAt { dst: r(2), contract: r(0), slot: r(1) },
            Instruction::Return { values: range(2, 1) },
        ],
    )
}

/// Every function of the fixture contract
pub fn contract_functions() -> Vec<FunctionAbi> {
    vec![
        insert_note(),
        get_then_nullify(),
        insert_and_nullify(),
        insert_two_and_nullify("insert_two_nullify_both", 2),
        insert_two_and_nullify("insert_two_nullify_first", 1),
        insert_and_nullify_two(),
        nested_insert_then_nullify(),
        recurse_forever(),
        update_public(),
        compute_note_hash_and_nullifier(NOTE_LEN, true),
        balance_of(),
        block_height(),
        write_in_view(),
        insert_then_prove(),
        read_commitment(),
        consume_message(),
        call_consume_message(),
        public_storage_at(),
    ]
}

/// A deployed fixture contract, its owner's keys and the oracle holding
/// them
#[derive(Clone)]
pub struct Fixture {
    pub backend: Backend,
    pub oracle: InMemoryDataOracle,
    pub contract: AztecAddress,
    pub portal: EthAddress,
    pub owner: PublicKey,
    pub secret: Fr,
}

impl Fixture {
    pub fn new() -> Self {
        let backend = KeccakBackend::shared();
        let contract = AztecAddress::from_u64(0x1234);
        let portal = EthAddress(crate::types::Address::repeat_byte(0x11));
        let owner = PublicKey::new(Fr::from(11), Fr::from(12));
        let secret = Fr::from(13);

        let mut oracle = InMemoryDataOracle::new(backend.clone());
        let mut state = ContractState::new(portal);
        for abi in contract_functions() {
            state = state.with_function(abi);
        }
        oracle.insert_contract(contract, state);
        oracle.insert_key(owner, secret);
        Self {
            backend,
            oracle,
            contract,
            portal,
            owner,
            secret,
        }
    }

    pub fn simulator(&self) -> Simulator {
        Simulator::new(Arc::new(self.oracle.clone()), self.backend.clone())
    }

    /// Note preimage owned by the fixture owner
    pub fn preimage(&self, amount: u64) -> Vec<Fr> {
        vec![Fr::from(amount), self.owner.x, self.owner.y]
    }

    /// Request calling `abi` on the fixture contract with `amount` owned
    /// by the fixture owner
    pub fn request(&self, abi: &FunctionAbi, amount: u64) -> TxExecutionRequest {
        self.request_with_args(abi, self.preimage(amount))
    }

    pub fn request_with_args(&self, abi: &FunctionAbi, args: Vec<Fr>) -> TxExecutionRequest {
        TxExecutionRequest::new(
            self.contract,
            FunctionData::from_abi(abi),
            args,
            TxContext::default(),
            &self.backend,
        )
    }

    /// Commit a note produced by an earlier transaction
    pub fn commit_note(&mut self, nonce: Fr, amount: u64) {
        self.oracle.insert_note(NoteData {
            contract_address: self.contract,
            storage_slot: Fr::from(BALANCE_SLOT),
            nonce,
            preimage: self.preimage(amount),
            siloed_nullifier: Fr::ZERO,
            index: 0,
        });
    }
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}

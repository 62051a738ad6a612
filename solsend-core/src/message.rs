//! Transfer assembly and the legacy Solana wire format.
//!
//! Only what a single System Program transfer needs is implemented: account
//! ordering, the three-byte header, compact-u16 arrays, and the signed
//! envelope. Serialization is deterministic for identical input.

use serde::Serialize;

use crate::amount::Lamports;
use crate::types::{FreshnessToken, Pubkey, Signature, SYSTEM_PROGRAM_ID};

/// System Program instruction index for `Transfer`.
const SYSTEM_TRANSFER_TAG: u32 = 2;

/// One System Program transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TransferInstruction {
    pub from: Pubkey,
    pub to: Pubkey,
    pub lamports: Lamports,
}

impl TransferInstruction {
    /// Instruction data: little-endian `u32` tag followed by little-endian `u64` lamports.
    pub fn data(&self) -> [u8; 12] {
        let mut data = [0_u8; 12];
        data[..4].copy_from_slice(&SYSTEM_TRANSFER_TAG.to_le_bytes());
        data[4..].copy_from_slice(&self.lamports.as_u64().to_le_bytes());
        data
    }
}

/// A transfer that has everything but a signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnsignedTransaction {
    pub fee_payer: Pubkey,
    pub instruction: TransferInstruction,
    pub freshness: FreshnessToken,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct AccountMeta {
    key: Pubkey,
    signer: bool,
    writable: bool,
}

/// Header plus ordered account keys of a compiled message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledAccounts {
    pub num_required_signatures: u8,
    pub num_readonly_signed: u8,
    pub num_readonly_unsigned: u8,
    pub keys: Vec<Pubkey>,
}

impl CompiledAccounts {
    fn index_of(&self, key: &Pubkey) -> u8 {
        // Keys are compiled from the same instruction, so every lookup hits.
        self.keys.iter().position(|k| k == key).unwrap_or_default() as u8
    }
}

impl UnsignedTransaction {
    pub fn new(sender: Pubkey, recipient: Pubkey, lamports: Lamports, freshness: FreshnessToken) -> Self {
        Self {
            fee_payer: sender,
            instruction: TransferInstruction {
                from: sender,
                to: recipient,
                lamports,
            },
            freshness,
        }
    }

    pub fn lamports(&self) -> Lamports {
        self.instruction.lamports
    }

    /// Order accounts as the runtime expects: fee payer first, then
    /// writable signers, readonly signers, writable and readonly non-signers.
    pub fn compile_accounts(&self) -> CompiledAccounts {
        let candidates = [
            AccountMeta { key: self.fee_payer, signer: true, writable: true },
            AccountMeta { key: self.instruction.from, signer: true, writable: true },
            AccountMeta { key: self.instruction.to, signer: false, writable: true },
            AccountMeta { key: SYSTEM_PROGRAM_ID, signer: false, writable: false },
        ];

        let mut metas: Vec<AccountMeta> = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            match metas.iter_mut().find(|m| m.key == candidate.key) {
                Some(existing) => {
                    existing.signer |= candidate.signer;
                    existing.writable |= candidate.writable;
                }
                None => metas.push(candidate),
            }
        }

        // Stable sort keeps the fee payer ahead of other writable signers.
        metas.sort_by_key(|m| match (m.signer, m.writable) {
            (true, true) => 0,
            (true, false) => 1,
            (false, true) => 2,
            (false, false) => 3,
        });

        let count = |signer: bool, writable: bool| {
            metas
                .iter()
                .filter(|m| m.signer == signer && m.writable == writable)
                .count() as u8
        };

        CompiledAccounts {
            num_required_signatures: metas.iter().filter(|m| m.signer).count() as u8,
            num_readonly_signed: count(true, false),
            num_readonly_unsigned: count(false, false),
            keys: metas.into_iter().map(|m| m.key).collect(),
        }
    }

    /// Serialized legacy message; this is what the signer signs.
    pub fn message_bytes(&self) -> Vec<u8> {
        let accounts = self.compile_accounts();
        let data = self.instruction.data();

        let mut out = Vec::with_capacity(160);
        out.push(accounts.num_required_signatures);
        out.push(accounts.num_readonly_signed);
        out.push(accounts.num_readonly_unsigned);

        encode_compact_u16(accounts.keys.len() as u16, &mut out);
        for key in &accounts.keys {
            out.extend_from_slice(key.as_bytes());
        }

        out.extend_from_slice(self.freshness.blockhash.as_bytes());

        // Single compiled instruction.
        encode_compact_u16(1, &mut out);
        out.push(accounts.index_of(&SYSTEM_PROGRAM_ID));
        encode_compact_u16(2, &mut out);
        out.push(accounts.index_of(&self.instruction.from));
        out.push(accounts.index_of(&self.instruction.to));
        encode_compact_u16(data.len() as u16, &mut out);
        out.extend_from_slice(&data);

        out
    }
}

/// A transaction carrying the fee payer's signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    unsigned: UnsignedTransaction,
    signature: Signature,
}

impl SignedTransaction {
    pub fn new(unsigned: UnsignedTransaction, signature: Signature) -> Self {
        Self { unsigned, signature }
    }

    /// The fee payer's signature doubles as the transaction id.
    pub fn signature(&self) -> Signature {
        self.signature
    }

    pub fn unsigned(&self) -> &UnsignedTransaction {
        &self.unsigned
    }

    pub fn to_wire_bytes(&self) -> Vec<u8> {
        let message = self.unsigned.message_bytes();
        let mut out = Vec::with_capacity(1 + self.signature.as_bytes().len() + message.len());
        encode_compact_u16(1, &mut out);
        out.extend_from_slice(self.signature.as_bytes());
        out.extend_from_slice(&message);
        out
    }
}

/// Append `value` using Solana's compact-u16 (7 bits per byte) encoding.
pub fn encode_compact_u16(mut value: u16, out: &mut Vec<u8>) {
    loop {
        let mut byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            return;
        }
        byte |= 0x80;
        out.push(byte);
    }
}

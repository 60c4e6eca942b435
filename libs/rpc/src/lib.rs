// @generated
// This file wires up buf-generated protobuf code
// Note: The prost files already include!() the tonic files automatically

pub mod knowledge_bank {
    include!("generated/knowledge_bank/v1/knowledge_bank.v1.rs");
    // knowledge_bank.v1.tonic.rs is auto-included by knowledge_bank.v1.rs
}

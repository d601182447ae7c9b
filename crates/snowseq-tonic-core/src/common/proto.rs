//! Generated protobuf messages and gRPC bindings for the `snowseq` package.

#![allow(clippy::all, clippy::pedantic, clippy::nursery)]

tonic::include_proto!("snowseq");

/// Encoded file descriptor set for `snowseq.proto`, used to serve gRPC
/// reflection.
pub const FILE_DESCRIPTOR_SET: &[u8] = tonic::include_file_descriptor_set!("snowseq_descriptor");

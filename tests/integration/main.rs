//! Integration tests: mock HTTP server for synchronous calls, scripted
//! connections for streams.

mod architecture;
mod doubles;
mod streaming;

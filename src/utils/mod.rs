//! # Utility Functions and Types
//!
//! This module provides common utilities used throughout the mpegio library.
//! It includes implementations for:
//!
//! - Bit-level operations over byte slices
//! - Header field extraction helpers for the codec probes
//!
//! ## Bit Operations
//!
//! The bits module provides utilities for working with bit-level data:
//!
//! ```rust
//! use mpegio::utils::BitReader;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let data = vec![0b10110011u8];
//! let mut reader = BitReader::new(&data);
//!
//! // Read specific number of bits
//! let value = reader.read_bits(3)?; // Reads first 3 bits (101)
//! assert_eq!(value, 0b101);
//! # Ok(())
//! # }
//! ```

/// Bit manipulation and bitstream reading utilities
pub mod bits;

// Re-export commonly used types
pub use bits::*;

pub mod base32;

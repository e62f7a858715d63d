// Not every utils is used in every test, so we allow dead code
#![allow(unused_imports, dead_code)]

mod localstack;
pub use localstack::*;

pub mod contracts;
pub mod deposit_security;
pub mod epochs;
pub mod keys;
pub mod manifest;
pub mod output;
pub mod shares;
pub mod util;

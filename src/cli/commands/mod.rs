pub mod migrate;
pub mod password;
pub mod storage;
pub mod user;

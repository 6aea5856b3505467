#[macro_use]
extern crate log;

mod dclib;
pub use self::dclib::*;

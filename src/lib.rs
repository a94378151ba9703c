#![no_std]
#![allow(async_fn_in_trait)]
#[cfg(feature = "std")]
extern crate std;

mod lock;
mod session;


pub mod timing;
pub mod pulse;
pub mod engine;
pub mod bus;
#[cfg(feature = "sim")]
pub mod sim;

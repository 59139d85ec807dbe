#![cfg_attr(not(test), no_std)]

pub(crate) mod fmt;

pub mod config;
pub mod io;
pub mod policy;
pub mod rail;
pub mod state;
pub mod tasks;

#![allow(dead_code)]

pub mod socket_guard;

#[cfg(unix)]
pub mod fake_steamcmd;

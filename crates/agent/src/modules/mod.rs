//! Built-in demo modules (SPEC_FULL.md §C), translated from
//! `original_source/modules/{echo,ping,faulty}_module.py`.

mod echo;
mod faulty;
mod ping;

pub use echo::EchoModule;
pub use faulty::FaultyModule;
pub use ping::PingModule;
